use see_containers::CLI;
use see_containers::config::{Config, DEFAULT_SOCKET_PATH};
use std::fs::File;
use std::io::Write;
use std::net::Ipv4Addr;
use std::time::Duration;
use tempfile::tempdir;

fn cli(env_file: &str) -> CLI {
    CLI {
        port: None,
        bind: None,
        socket_path: None,
        docker_host: None,
        host_ip: None,
        running_in_docker: false,
        running_only: false,
        template: None,
        request_timeout_secs: None,
        verbose: 0,
        env_file: env_file.to_string(),
    }
}

#[test]
fn test_cli_precedence_over_env() {
    let temp_dir = tempdir().unwrap();
    let env_path = temp_dir.path().join("test_cli_precedence.env");
    let mut file = File::create(&env_path).unwrap();
    writeln!(file, "PORT=9000").unwrap();
    writeln!(file, "HOST_IP=10.0.0.7").unwrap();
    writeln!(
        file,
        "DOCKER_SOCKET={}/env_socket.sock",
        temp_dir.path().display()
    )
    .unwrap();
    writeln!(file, "REQUEST_TIMEOUT_SECS=5").unwrap();

    let cli_socket = temp_dir.path().join("cli_socket.sock").display().to_string();
    let cli = CLI {
        port: Some(9100),
        socket_path: Some(cli_socket.clone()),
        host_ip: Some("192.168.1.20".to_string()),
        request_timeout_secs: Some(12),
        ..cli(&env_path.display().to_string())
    };

    let config = Config::from_env_and_cli(&cli).unwrap();
    assert_eq!(config.listen.port(), 9100);
    assert_eq!(config.socket_path, cli_socket);
    assert_eq!(config.host_ip.override_ip, Some(Ipv4Addr::new(192, 168, 1, 20)));
    assert_eq!(config.request_timeout, Duration::from_secs(12));
}

#[test]
fn test_env_used_when_cli_missing() {
    let temp_dir = tempdir().unwrap();
    let env_path = temp_dir.path().join("test_env_used.env");
    let template_path = temp_dir.path().join("layout.html");
    let mut file = File::create(&env_path).unwrap();
    writeln!(file, "PORT=9000").unwrap();
    writeln!(file, "BIND=127.0.0.1").unwrap();
    writeln!(file, "HOST_IP=10.0.0.7").unwrap();
    writeln!(file, "DOCKER_SOCKET=unix:///run/user/1000/docker.sock").unwrap();
    writeln!(file, "RUNNING_IN_DOCKER=true").unwrap();
    writeln!(file, "RUNNING_ONLY=1").unwrap();
    writeln!(file, "TEMPLATE_PATH={}", template_path.display()).unwrap();

    let config = Config::from_env_and_cli(&cli(&env_path.display().to_string())).unwrap();
    assert_eq!(config.listen.to_string(), "127.0.0.1:9000");
    assert_eq!(config.socket_path, "/run/user/1000/docker.sock");
    assert_eq!(config.host_ip.override_ip, Some(Ipv4Addr::new(10, 0, 0, 7)));
    assert!(config.host_ip.running_in_docker);
    assert!(!config.include_stopped);
    assert_eq!(config.template.as_deref(), Some(template_path.as_path()));
}

#[test]
fn test_default_used_when_none_set() {
    let temp_dir = tempdir().unwrap();
    let env_path = temp_dir.path().join("test_default.env");
    File::create(&env_path).unwrap(); // empty .env

    let config = Config::from_env_and_cli(&cli(&env_path.display().to_string())).unwrap();
    assert_eq!(config.listen.to_string(), "0.0.0.0:8080");
    assert_eq!(config.socket_path, DEFAULT_SOCKET_PATH);
    assert_eq!(config.host_ip.override_ip, None);
    assert!(!config.host_ip.running_in_docker);
    assert_eq!(config.host_ip.host_alias, "host.docker.internal");
    assert!(config.include_stopped);
    assert!(config.template.is_none());
    assert_eq!(config.request_timeout, Duration::from_secs(30));
}

#[test]
fn test_missing_env_file_uses_defaults() {
    let config = Config::from_env_and_cli(&cli("/nonexistent/see-containers.env")).unwrap();
    assert_eq!(config.listen.port(), 8080);
}

#[test]
fn test_invalid_values_rejected() {
    let temp_dir = tempdir().unwrap();
    for (line, expected) in [
        ("PORT=eighty", "invalid port 'eighty'"),
        ("BIND=localhost:80", "invalid bind address 'localhost:80'"),
        ("HOST_IP=fe80::1", "invalid host IP override 'fe80::1'"),
        ("REQUEST_TIMEOUT_SECS=0", "request timeout must be at least one second"),
    ] {
        let env_path = temp_dir.path().join("invalid.env");
        std::fs::write(&env_path, format!("{}\n", line)).unwrap();
        let err = Config::from_env_and_cli(&cli(&env_path.display().to_string())).unwrap_err();
        assert!(
            err.to_string().starts_with(expected),
            "{} gave '{}'",
            line,
            err
        );
    }
}

#[test]
fn test_docker_host_fallback() {
    let temp_dir = tempdir().unwrap();
    let env_path = temp_dir.path().join("docker_host.env");
    std::fs::write(&env_path, "DOCKER_HOST=unix:///run/podman/podman.sock\n").unwrap();

    let config = Config::from_env_and_cli(&cli(&env_path.display().to_string())).unwrap();
    assert_eq!(config.socket_path, "/run/podman/podman.sock");

    let with_socket = CLI {
        socket_path: Some("/tmp/engine.sock".to_string()),
        ..cli(&env_path.display().to_string())
    };
    let config = Config::from_env_and_cli(&with_socket).unwrap();
    assert_eq!(config.socket_path, "/tmp/engine.sock");
}

#[test]
fn test_tcp_docker_host_rejected() {
    let temp_dir = tempdir().unwrap();
    let env_path = temp_dir.path().join("tcp.env");
    std::fs::write(&env_path, "DOCKER_HOST=tcp://10.0.0.5:2375\n").unwrap();

    let err = Config::from_env_and_cli(&cli(&env_path.display().to_string())).unwrap_err();
    assert!(err.to_string().contains("tcp://10.0.0.5:2375"));
}
