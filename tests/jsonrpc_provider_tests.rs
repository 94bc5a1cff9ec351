use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};
use std::time::Duration;

use blockscout_rpc::*;
use blockscout_rpc::config::ThrottleConfig;
use blockscout_rpc::provider::{FetchRequest, RetryContext, RetryFunc};
use futures::FutureExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_throttle(max_attempts: u32) -> ThrottleConfig {
    ThrottleConfig {
        max_attempts,
        slot_interval: Duration::from_millis(1),
        request_timeout: Duration::from_secs(5),
    }
}

fn mk_request(server: &MockServer) -> FetchRequest {
    FetchRequest::new(server.uri().parse().unwrap()).with_throttle(&fast_throttle(5))
}

fn mk_provider(request: FetchRequest, options: JsonRpcProviderOptions) -> JsonRpcProvider {
    mk_provider_on(request, Network::new("local", 31337), options)
}

fn mk_provider_on(request: FetchRequest, network: Network, options: JsonRpcProviderOptions) -> JsonRpcProvider {
    JsonRpcProvider::new(request, network, options).expect("provider")
}

fn counting_retry(counter: Arc<AtomicU32>, allow: bool) -> RetryFunc {
    Arc::new(move |_context: RetryContext| {
        counter.fetch_add(1, Ordering::SeqCst);
        futures::future::ready(allow).boxed()
    })
}

fn rpc_result(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

#[derive(Debug)]
struct RewritingProvider {
    inner: JsonRpcProvider,
}

impl RpcApi for RewritingProvider {
    fn core(&self) -> &JsonRpcProvider {
        &self.inner
    }

    fn get_rpc_error(&self, payload: &JsonRpcRequest, mut error: JsonRpcError) -> ProviderError {
        error.message = format!("rewritten: {}", error.message);
        provider::default_rpc_error(payload, error)
    }
}

#[tokio::test]
async fn test_send_returns_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"jsonrpc": "2.0", "method": "eth_blockNumber"})))
        .respond_with(rpc_result(json!("0x1b4")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = mk_provider(mk_request(&server), JsonRpcProviderOptions::default());
    assert_eq!(provider.get_block_number().await.unwrap(), 0x1b4);
}

#[tokio::test]
async fn test_payload_ids_increase() {
    let server = MockServer::start().await;
    let provider = mk_provider(mk_request(&server), JsonRpcProviderOptions::default());

    let first = provider.build_payload("eth_chainId", json!([]));
    let second = provider.build_payload("eth_chainId", json!([]));
    assert!(second.id > first.id);
    assert_eq!(first.jsonrpc, "2.0");
}

#[tokio::test]
async fn test_send_normalizes_rpc_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "insufficient funds for gas * price + value"}
        })))
        .mount(&server)
        .await;

    let provider = mk_provider(mk_request(&server), JsonRpcProviderOptions::default());
    let err = provider.send("eth_sendRawTransaction", json!(["0x00"])).await.unwrap_err();
    assert!(matches!(err, ProviderError::InsufficientFunds { ref method, .. } if method == "eth_sendRawTransaction"));
}

#[tokio::test]
async fn test_send_routes_errors_through_extension_point() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "method not found"}
        })))
        .mount(&server)
        .await;

    let provider = RewritingProvider {
        inner: mk_provider(mk_request(&server), JsonRpcProviderOptions::default()),
    };
    let err = provider.send("eth_newBlockFilter", json!([])).await.unwrap_err();
    assert_eq!(err.rpc_message(), Some("rewritten: method not found"));
    assert!(matches!(err, ProviderError::UnsupportedOperation { .. }));
}

#[tokio::test]
async fn test_throttled_request_is_retried_while_allowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(rpc_result(json!("0x2a")))
        .expect(1)
        .mount(&server)
        .await;

    let counter = Arc::new(AtomicU32::new(0));
    let request = mk_request(&server).with_retry_func(counting_retry(Arc::clone(&counter), true));
    let provider = mk_provider(request, JsonRpcProviderOptions::default());

    assert_eq!(provider.get_block_number().await.unwrap(), 42);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_throttled_request_fails_when_retry_refused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let counter = Arc::new(AtomicU32::new(0));
    let request = mk_request(&server).with_retry_func(counting_retry(Arc::clone(&counter), false));
    let provider = mk_provider(request, JsonRpcProviderOptions::default());

    let err = provider.get_block_number().await.unwrap_err();
    assert!(matches!(err, ProviderError::Throttled { attempts: 1, .. }));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_throttled_request_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let request = FetchRequest::new(server.uri().parse().unwrap()).with_throttle(&fast_throttle(3));
    let provider = mk_provider(request, JsonRpcProviderOptions::default());

    let err = provider.send("eth_gasPrice", json!([])).await.unwrap_err();
    assert!(matches!(err, ProviderError::Throttled { attempts: 3, .. }));
}

#[tokio::test]
async fn test_server_error_is_bad_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let provider = mk_provider(mk_request(&server), JsonRpcProviderOptions::default());
    let err = provider.send("eth_gasPrice", json!([])).await.unwrap_err();
    assert!(matches!(err, ProviderError::BadResponse { status: 500, .. }));
}

#[tokio::test]
async fn test_network_is_detected_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_chainId"})))
        .respond_with(rpc_result(json!("0x2105")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = mk_provider_on(
        mk_request(&server),
        Network::new("base", 8453),
        JsonRpcProviderOptions::default(),
    );
    assert_eq!(provider.get_network().await.unwrap(), Network::new("base", 8453));
    // Second lookup is served from the cache
    assert_eq!(provider.get_network().await.unwrap().chain_id, 8453);
}

#[tokio::test]
async fn test_static_network_skips_detection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(rpc_result(json!("0x1")))
        .expect(0)
        .mount(&server)
        .await;

    let options = JsonRpcProviderOptions {
        static_network: Some(Network::new("gnosis", 100)),
        ..Default::default()
    };
    let provider = mk_provider(mk_request(&server), options);
    assert_eq!(provider.get_network().await.unwrap(), Network::new("gnosis", 100));
}

#[tokio::test]
async fn test_detected_chain_mismatch_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_chainId"})))
        .respond_with(rpc_result(json!("0x1")))
        .mount(&server)
        .await;

    let provider = mk_provider_on(
        mk_request(&server),
        Network::new("gnosis", 100),
        JsonRpcProviderOptions::default(),
    );
    let err = provider.get_network().await.unwrap_err();
    assert!(matches!(err, ProviderError::UnsupportedOperation { ref method, .. } if method == "eth_chainId"));
    assert_eq!(provider.known_network(), None);
}

#[tokio::test]
async fn test_derive_for_chain_detects_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_chainId"})))
        .respond_with(rpc_result(json!("0x89")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = mk_provider(mk_request(&server), JsonRpcProviderOptions::default());
    let derived = provider.get_provider(137);

    assert_eq!(derived.core().network(), &Network::new("matic", 137));
    assert_eq!(derived.core().options().static_network, None);
    assert_eq!(derived.core().request().url(), provider.request().url());
    assert_eq!(derived.get_network().await.unwrap(), Network::new("matic", 137));
}

#[tokio::test]
async fn test_derive_for_chain_reports_endpoint_serving_other_chain() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_chainId"})))
        .respond_with(rpc_result(json!("0x1")))
        .mount(&server)
        .await;

    let options = JsonRpcProviderOptions {
        static_network: Some(Network::new("mainnet", 1)),
        ..Default::default()
    };
    let provider = mk_provider_on(mk_request(&server), Network::new("mainnet", 1), options);
    let bnb = provider.get_provider(56);

    assert_eq!(bnb.core().network(), &Network::new("bnb", 56));
    let err = bnb.get_network().await.unwrap_err();
    assert!(matches!(err, ProviderError::UnsupportedOperation { ref method, .. } if method == "eth_chainId"));
}

#[test]
fn test_redacted_url_drops_api_key() {
    let request = FetchRequest::new("https://eth.blockscout.com/api/eth-rpc?apikey=secret".parse().unwrap());
    let provider = mk_provider(request, JsonRpcProviderOptions::default());
    assert_eq!(provider.redacted_url(), "https://eth.blockscout.com/api/eth-rpc");
}
