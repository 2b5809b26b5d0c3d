use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::docker_client::DockerClient;
use crate::error::AppError;
use crate::host_ip::resolve_host_ip;
use crate::render::{load_layout, render_page};
use crate::view::{build_views, running_first};

/// State shared by all requests. Nothing in it is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub docker: Arc<DockerClient>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(docker: DockerClient, config: Config) -> Self {
        Self {
            docker: Arc::new(docker),
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_containers))
        .route("/containers/{id}/start", post(start_container))
        .route("/containers/{id}/stop", post(stop_container))
        .route("/containers/{id}/logs", get(container_logs))
        .layer(middleware::from_fn_with_state(state.clone(), request_timeout))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

pub async fn serve(config: Config) -> std::io::Result<()> {
    let mut docker = DockerClient::new(config.socket_path.clone());
    info!("using Docker engine at {}", docker.socket_path());
    docker.negotiate_version().await;

    let listener = TcpListener::bind(config.listen).await?;
    info!("server starting at {}", listener.local_addr()?);

    let state = AppState::new(docker, config);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn list_containers(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let containers = state
        .docker
        .list_containers(state.config.include_stopped)
        .await?;
    debug!("engine reported {} containers", containers.len());

    let host_ip = resolve_host_ip(&state.config.host_ip).await;
    let mut views = build_views(containers, &host_ip)?;
    running_first(&mut views);

    let layout = load_layout(state.config.template.as_deref()).await?;
    Ok(Html(render_page(&views, &layout)?))
}

async fn start_container(Path(id): Path<String>) -> Result<(), AppError> {
    debug!("start requested for {}", id);
    Err(AppError::NotImplemented("starting containers"))
}

async fn stop_container(Path(id): Path<String>) -> Result<(), AppError> {
    debug!("stop requested for {}", id);
    Err(AppError::NotImplemented("stopping containers"))
}

async fn container_logs(Path(id): Path<String>) -> Result<(), AppError> {
    debug!("logs requested for {}", id);
    Err(AppError::NotImplemented("container logs"))
}

async fn request_timeout(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limit = state.config.request_timeout;
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!("request exceeded {:?}", limit);
            (StatusCode::SERVICE_UNAVAILABLE, "Request timed out").into_response()
        }
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} {} {}ms",
        method,
        uri,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
