use std::process::ExitCode;

use prediction_store::{ConnectionOptions, PredictionStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(id), Some(data)) = (args.next(), args.next()) else {
        eprintln!("usage: prediction-store <id> <json-object>");
        return Ok(ExitCode::from(2));
    };

    let data: serde_json::Value = serde_json::from_str(&data)?;

    let store = PredictionStore::connect(&ConnectionOptions::from_env()).await?;
    let result = store.store_data(&id.into(), &data).await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
