use crate::config::Config;
use crate::server;
use clap::Parser;
use clap::builder::FalseyValueParser;
use std::path::PathBuf;
use tracing::error;

#[derive(Parser, Debug, Clone)]
#[command(name = "see-containers", version, about = "Web dashboard for the local Docker engine")]
pub struct CLI {
    #[arg(short, long, env = "PORT", help = "Port to listen on [default: 8080]")]
    pub port: Option<u16>,
    #[arg(short, long, env = "BIND", help = "Address to bind [default: 0.0.0.0]")]
    pub bind: Option<String>,
    #[arg(
        short,
        long,
        env = "DOCKER_SOCKET",
        help = "Docker engine socket [default: /var/run/docker.sock]"
    )]
    pub socket_path: Option<String>,
    #[arg(
        long,
        env = "DOCKER_HOST",
        help = "Docker engine as unix:///path, used when no socket path is set"
    )]
    pub docker_host: Option<String>,
    #[arg(long, env = "HOST_IP", help = "Host address used in container URLs")]
    pub host_ip: Option<String>,
    #[arg(
        long,
        env = "RUNNING_IN_DOCKER",
        value_parser = FalseyValueParser::new(),
        help = "The dashboard itself runs in a container; resolve host.docker.internal"
    )]
    pub running_in_docker: bool,
    #[arg(
        long,
        env = "RUNNING_ONLY",
        value_parser = FalseyValueParser::new(),
        help = "Only list running containers"
    )]
    pub running_only: bool,
    #[arg(
        short,
        long,
        env = "TEMPLATE_PATH",
        help = "HTML layout with a {{ containers }} slot, read on every request"
    )]
    pub template: Option<PathBuf>,
    #[arg(
        long,
        env = "REQUEST_TIMEOUT_SECS",
        help = "Per-request timeout in seconds [default: 30]"
    )]
    pub request_timeout_secs: Option<u64>,
    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase verbosity (-v, -vv, etc.)")]
    pub verbose: u8,
    #[arg(
        short = 'e',
        long = "env-file",
        default_value = ".env",
        help = "Path to .env file"
    )]
    pub env_file: String,
}

// Main application logic
pub async fn serve(cli: CLI) -> Result<(), Box<dyn std::error::Error>> {
    let config = match Config::from_env_and_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            println!();
            Config::show_configuration_help();
            return Err(e.into());
        }
    };

    server::serve(config).await.map_err(|e| {
        error!("server failed: {}", e);
        e
    })?;
    Ok(())
}
