use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error("invalid bind address '{0}'")]
    InvalidBind(String),

    #[error("invalid host IP override '{0}', expected an IPv4 address")]
    InvalidHostIp(String),

    #[error("unsupported DOCKER_HOST '{0}', only unix:// sockets are supported")]
    UnsupportedDockerHost(String),

    #[error("request timeout must be at least one second")]
    InvalidTimeout,
}

#[derive(Debug, Error)]
pub enum DockerError {
    #[error("cannot connect to the Docker engine at {path}: {source}")]
    Connect {
        path: String,
        source: std::io::Error,
    },

    #[error("I/O error talking to the Docker engine: {0}")]
    Io(#[from] std::io::Error),

    #[error("Docker engine answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response from the Docker engine: {0}")]
    Malformed(String),

    #[error("cannot decode Docker engine response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("container {id} has an invalid creation time {created}")]
    InvalidTimestamp { id: String, created: i64 },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot load layout {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("layout {} has no {{{{ containers }}}} slot", .path.display())]
    MissingSlot { path: PathBuf },

    #[error("cannot format page: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Failure of a dashboard request. Converted into a plain-text response;
/// the cause is logged once, at conversion.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Docker(#[from] DockerError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Docker(_) | AppError::View(_) | AppError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            AppError::Docker(DockerError::Connect { .. }) => "Cannot reach the container engine",
            AppError::Docker(_) => "Error listing containers",
            AppError::View(_) => "Error reading container data",
            AppError::Render(RenderError::Load { .. } | RenderError::MissingSlot { .. }) => {
                "Error loading template"
            }
            AppError::Render(RenderError::Format(_)) => "Error rendering template",
            AppError::NotImplemented(_) => "Not implemented",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if !matches!(self, AppError::NotImplemented(_)) {
            error!("request failed: {}", self);
        }
        (status, self.public_message()).into_response()
    }
}
