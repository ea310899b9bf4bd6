//! Command-line interface definitions for the `aws-resource-driver` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `aws-resource-driver` binary.
#[derive(Debug, Parser)]
#[command(
    name = "aws-resource-driver",
    about = "Provision S3 buckets and ElastiCache clusters over the driver protocol",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Run the HTTP server.
    #[command(name = "serve", about = "Run the HTTP server")]
    Serve(ServeCommand),
}

/// Arguments for the `aws-resource-driver serve` subcommand.
#[derive(Debug, Default, Parser)]
pub(crate) struct ServeCommand {
    /// Listen on this port instead of the configured `DRIVER_PORT`.
    #[arg(long, value_name = "PORT")]
    pub(crate) port: Option<u16>,
    /// Use the side-effect free provisioning client.
    ///
    /// Requests are still recorded in the metadata store, but no cloud API
    /// is called.
    #[arg(long)]
    pub(crate) fake_aws: bool,
}
