use anyhow::Context;
use copysync_cli::args::USAGE;
use copysync_cli::{init_tracing, parse_args, AwsCliSync, ReplicateError, RunSummary, UsageError};
use copysync_core::{RunConfig, ToolConfig};
use copysync_storage::S3Storage;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match parse_args(std::env::args_os()) {
        Ok(config) => config,
        Err(UsageError::Help(text)) => {
            println!("{}", text);
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            tracing::error!(error = %err, "Incorrect input");
            tracing::info!("Syntax: {}", USAGE);
            return ExitCode::from(err.exit_code());
        }
    };

    tracing::info!(
        manifest_bucket = %config.manifest_bucket,
        manifest_key = %config.manifest_key,
        has_header = config.has_header,
        delete_destination = config.delete_destination,
        "Received arguments"
    );

    match execute(&config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<ReplicateError>()
                .map(ReplicateError::exit_code)
                .unwrap_or(copysync_cli::error::EXIT_RUNTIME_FAILURE);
            let line = err.downcast_ref::<ReplicateError>().and_then(ReplicateError::line);
            let message = format!("{:#}", err);
            tracing::error!(error = %message, line = ?line, exit_code = code, "Run failed");
            ExitCode::from(code)
        }
    }
}

async fn execute(config: &RunConfig) -> anyhow::Result<RunSummary> {
    let tool_config = ToolConfig::from_env()
        .map_err(ReplicateError::from)
        .context("Failed to load tool configuration")?;

    let store = S3Storage::new(tool_config.region.clone(), tool_config.endpoint_url.clone())
        .await
        .map_err(ReplicateError::StorageInit)
        .context("Failed to create S3 client")?
        .with_multipart_part_size(tool_config.multipart_part_size);

    let sync_tool = AwsCliSync::new(tool_config.sync_program);

    let summary = copysync_cli::run(config, Arc::new(store), Arc::new(sync_tool)).await?;
    Ok(summary)
}
