//! Print the download queue in one round trip using system.multicall
//!
//! Run with: ARIA2_RPC_URI=http://localhost:6800/jsonrpc cargo run --example queue_summary

use ariarpc::client::{ClientBuilder, GlobalStat, Multicall, StatusInfo};
use ariarpc::core::methods;
use serde_json::json;

const KEYS: [&str; 4] = ["gid", "status", "completedLength", "totalLength"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let client = ClientBuilder::from_env().build().await?;

    let batch = Multicall::new()
        .add(methods::GET_GLOBAL_STAT, vec![])
        .add(methods::TELL_ACTIVE, vec![json!(KEYS)])
        .add(methods::TELL_WAITING, vec![json!(0), json!(100), json!(KEYS)]);
    let results = client.multicall(batch).await?;

    let stat: GlobalStat = results.get(0)?;
    println!(
        "{} active, {} waiting, {} stopped, {} B/s down",
        stat.num_active, stat.num_waiting, stat.num_stopped, stat.download_speed
    );

    for index in 1..results.len() {
        let downloads: Vec<StatusInfo> = results.get(index)?;
        for d in downloads {
            println!("{}  {:<8} {}/{}", d.gid, d.status, d.completed_length, d.total_length);
        }
    }

    client.close().await?;
    Ok(())
}
