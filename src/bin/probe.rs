use std::time::Instant;

use blockscout_rpc::{BlockscoutProvider, Networkish, RpcApi};
use serde::Serialize;
use serde_json::json;

#[derive(Serialize, Clone)]
struct Sample { ms: f64, ok: bool }

fn now_ms(start: Instant) -> f64 { start.elapsed().as_secs_f64() * 1000.0 }

fn stats(samples: &[Sample]) -> serde_json::Value {
    let count = samples.len();
    let success = samples.iter().filter(|s| s.ok).count();
    let mut ok_vals: Vec<f64> = samples.iter().filter(|s| s.ok).map(|s| s.ms).collect();
    if ok_vals.is_empty() {
        return json!({"mean": null, "median": null, "p95": null, "count": count, "success": success});
    }
    ok_vals.sort_by(|a, b| a.total_cmp(b));
    let mean = ok_vals.iter().sum::<f64>() / ok_vals.len() as f64;
    let median = if ok_vals.len() % 2 == 1 {
        ok_vals[ok_vals.len() / 2]
    } else {
        (ok_vals[ok_vals.len() / 2 - 1] + ok_vals[ok_vals.len() / 2]) / 2.0
    };
    let p95_idx = ((ok_vals.len() as f64) * 0.95).floor() as usize;
    let p95 = ok_vals[p95_idx.min(ok_vals.len() - 1)];
    json!({"mean": mean, "median": median, "p95": p95, "count": count, "success": success})
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let network = std::env::var("NETWORK").unwrap_or_else(|_| "mainnet".to_string());
    let iterations: usize = std::env::var("ITERS").ok().and_then(|v| v.parse().ok()).unwrap_or(5);
    let api_key = std::env::var("BLOCKSCOUT_API_KEY").ok();

    println!("[probe] network={network} iterations={iterations}");

    let provider = BlockscoutProvider::new(Some(Networkish::from(network.as_str())), api_key.as_deref())?;
    if provider.is_community_resource() {
        println!("[probe] using the shared community key, expect throttling");
    }

    let mut block_samples = Vec::with_capacity(iterations);
    let mut gas_samples = Vec::with_capacity(iterations);
    let mut last_block = None;

    for _ in 0..iterations {
        let t0 = Instant::now();
        let block = provider.get_block_number().await;
        block_samples.push(Sample { ms: now_ms(t0), ok: block.is_ok() });
        match block {
            Ok(number) => last_block = Some(number),
            Err(e) => eprintln!("eth_blockNumber failed: {e}"),
        }

        let t1 = Instant::now();
        let gas = provider.send("eth_gasPrice", json!([])).await;
        gas_samples.push(Sample { ms: now_ms(t1), ok: gas.is_ok() });
    }

    let out = json!({
        "network": provider.core().network(),
        "iterations": iterations,
        "community": provider.is_community_resource(),
        "last_block": last_block,
        "block": stats(&block_samples),
        "gas": stats(&gas_samples),
    });

    println!("JSON_RESULT {}", serde_json::to_string(&out)?);
    Ok(())
}
