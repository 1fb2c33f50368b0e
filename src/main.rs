mod config;
mod error;
mod exporter;
mod normalizer;
mod rds_inventory_client;
mod schema;

use anyhow::Context as _;
use chrono::Local;
use lambda_runtime::{handler_fn, Context, Error};
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::ExportConfig;
use crate::exporter::run_export;

const RUNTIME_API_VAR: &str = "AWS_LAMBDA_RUNTIME_API";

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        // CloudWatch adds its own timestamp.
        .with_target(false)
        .without_time()
        .init();

    if std::env::var_os(RUNTIME_API_VAR).is_some() {
        lambda_runtime::run(handler_fn(report_handler)).await?;
    } else {
        report().await?;
    }
    Ok(())
}

/// The event and context are ignored; every invocation exports all regions.
async fn report_handler(_: Value, _: Context) -> Result<(), Error> {
    report().await
}

async fn report() -> Result<(), Error> {
    run_report().await.map_err(|error| {
        error!("An error occurred: {:#}", error);
        error.into()
    })
}

async fn run_report() -> anyhow::Result<()> {
    let config = ExportConfig::from_env().context("Failed to load export configuration")?;
    let path = run_export(&config, Local::now())
        .await
        .context("Failed to export RDS insights")?;
    info!(
        "Completed checking and exporting RDS insights to {} for {} regions.",
        path.display(),
        config.regions.len()
    );
    Ok(())
}
