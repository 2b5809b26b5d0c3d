use crate::cli::CLI;
use crate::error::ConfigError;
use crate::host_ip::{DEFAULT_HOST_ALIAS, HostIpConfig};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/docker.sock";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen: SocketAddr,
    pub socket_path: String,
    pub host_ip: HostIpConfig,
    /// List stopped containers too (`all=true`).
    pub include_stopped: bool,
    /// Layout file read per request; the built-in layout when unset.
    pub template: Option<PathBuf>,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            socket_path: DEFAULT_SOCKET_PATH.to_string(),
            host_ip: HostIpConfig::default(),
            include_stopped: true,
            template: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Parse a `.env` style file. A missing or unreadable file yields no values.
pub fn read_env_file(path: &Path) -> HashMap<String, String> {
    let mut env_vars = HashMap::new();
    let Ok(env_content) = std::fs::read_to_string(path) else {
        return env_vars;
    };
    for line in env_content.lines() {
        let line = line.trim();
        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            env_vars.insert(key.trim().to_string(), value.to_string());
        }
    }
    env_vars
}

// Same rule as clap's FalseyValueParser, so a flag reads alike from the
// process environment and from the .env file.
fn truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "f" | "no" | "n" | "off"
    )
}

impl Config {
    /// Priority: CLI flag (or process environment) > .env file > default.
    pub fn from_env_and_cli(cli: &CLI) -> Result<Self, ConfigError> {
        let env_vars = read_env_file(Path::new(&cli.env_file));

        let port = match (cli.port, env_vars.get("PORT")) {
            (Some(port), _) => port,
            (None, Some(raw)) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            (None, None) => DEFAULT_PORT,
        };

        let bind = cli
            .bind
            .clone()
            .or_else(|| env_vars.get("BIND").cloned())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_ip = bind
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidBind(bind.clone()))?;

        let socket_path = match cli
            .socket_path
            .clone()
            .or_else(|| env_vars.get("DOCKER_SOCKET").cloned())
        {
            Some(path) => path,
            None => match cli
                .docker_host
                .clone()
                .or_else(|| env_vars.get("DOCKER_HOST").cloned())
                .filter(|host| !host.is_empty())
            {
                Some(host) => host
                    .strip_prefix("unix://")
                    .map(str::to_string)
                    .ok_or_else(|| ConfigError::UnsupportedDockerHost(host.clone()))?,
                None => DEFAULT_SOCKET_PATH.to_string(),
            },
        };
        let socket_path = socket_path
            .strip_prefix("unix://")
            .map(str::to_string)
            .unwrap_or(socket_path);

        let override_ip = cli
            .host_ip
            .clone()
            .or_else(|| env_vars.get("HOST_IP").cloned())
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                raw.parse::<Ipv4Addr>()
                    .map_err(|_| ConfigError::InvalidHostIp(raw))
            })
            .transpose()?;

        let running_in_docker = cli.running_in_docker
            || env_vars
                .get("RUNNING_IN_DOCKER")
                .is_some_and(|v| truthy(v));

        let running_only =
            cli.running_only || env_vars.get("RUNNING_ONLY").is_some_and(|v| truthy(v));

        let template = cli
            .template
            .clone()
            .or_else(|| env_vars.get("TEMPLATE_PATH").map(PathBuf::from));

        let timeout_secs = match (cli.request_timeout_secs, env_vars.get("REQUEST_TIMEOUT_SECS")) {
            (Some(secs), _) => secs,
            (None, Some(raw)) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidTimeout)?,
            (None, None) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Config {
            listen: SocketAddr::new(bind_ip, port),
            socket_path,
            host_ip: HostIpConfig {
                override_ip,
                running_in_docker,
                host_alias: DEFAULT_HOST_ALIAS.to_string(),
            },
            include_stopped: !running_only,
            template,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn show_configuration_help() {
        println!("Configuration options:");
        println!("  1. Command line flags (or the matching environment variables):");
        println!(
            "     ./see-containers --port 8080 --socket-path /var/run/docker.sock --host-ip 192.168.1.20 --template ./web/templates/index.html --env-file .env"
        );
        println!();
        println!("  2. Create a .env file (or use --env-file to specify a different file):");
        println!("     PORT=8080");
        println!("     BIND=0.0.0.0");
        println!("     DOCKER_SOCKET=/var/run/docker.sock");
        println!("     DOCKER_HOST=unix:///var/run/docker.sock  (used when DOCKER_SOCKET is unset)");
        println!("     HOST_IP=192.168.1.20");
        println!("     RUNNING_IN_DOCKER=true");
        println!("     RUNNING_ONLY=false");
        println!("     TEMPLATE_PATH=./web/templates/index.html");
        println!("     REQUEST_TIMEOUT_SECS=30");
        println!();
        println!("Command line flags take precedence over .env file values.");
    }
}
