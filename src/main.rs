//! Binary entry point for the AWS resource driver.

use std::io::{self, Write};
use std::net::{Ipv4Addr, SocketAddr};
use std::process;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use aws_resource_driver::{
    AwsProvisionerFactory, ConfigError, DatabaseConfig, DriverConfig, FakeProvisionerFactory,
    MetadataStore, PostgresStore, ProvisionerFactory, ProvisioningOrchestrator, StoreError, http,
    telemetry,
};

mod cli;

use cli::{Cli, ServeCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("metadata store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to bind port {port}: {source}")]
    Bind { port: u16, source: io::Error },
    #[error("server error: {0}")]
    Serve(io::Error),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli {
        Cli::Serve(command) => run_server(&command).await,
    }
}

async fn run_server(command: &ServeCommand) -> Result<(), CliError> {
    let config = apply_overrides(DriverConfig::load_without_cli_args()?, command);
    config.validate()?;
    let database = DatabaseConfig::load_without_cli_args()?;
    database.validate()?;

    telemetry::init(&config.log_filter);

    let store = PostgresStore::connect(&database).await?;
    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| CliError::Bind {
            port: config.port,
            source,
        })?;
    info!(
        port = config.port,
        fake_aws = config.use_fake_aws_client,
        timeout_limit = config.timeout_limit,
        "driver listening"
    );

    if config.use_fake_aws_client {
        serve(store, FakeProvisionerFactory, listener).await
    } else {
        let factory = AwsProvisionerFactory::new(config.readiness_budget());
        serve(store, factory, listener).await
    }
}

fn apply_overrides(mut config: DriverConfig, command: &ServeCommand) -> DriverConfig {
    if let Some(port) = command.port {
        config.port = port;
    }
    config.use_fake_aws_client |= command.fake_aws;
    config
}

async fn serve<S, F>(store: S, factory: F, listener: TcpListener) -> Result<(), CliError>
where
    S: MetadataStore + 'static,
    F: ProvisionerFactory + 'static,
{
    let orchestrator = Arc::new(ProvisioningOrchestrator::new(store, factory));
    axum::serve(listener, http::router(orchestrator))
        .await
        .map_err(CliError::Serve)
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
