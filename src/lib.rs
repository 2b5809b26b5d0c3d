pub mod cli;
pub mod config;
pub mod docker_client;
pub mod error;
pub mod host_ip;
pub mod render;
pub mod server;
pub mod types;
pub mod view;

use clap::Parser;
use cli::serve as _serve;
pub use cli::CLI;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

pub async fn run() -> ExitCode {
    let cli = CLI::parse();
    let filter = match cli.verbose {
        0 => "warn,see_containers=info",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match _serve(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
