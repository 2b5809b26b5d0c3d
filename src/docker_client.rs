use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, info, warn};

use crate::error::DockerError;
use crate::types::{ContainerSummary, EngineMessage, VersionInfo};

/// Client for the Docker engine API over its Unix socket.
///
/// The client is created once per process. Every call opens its own
/// connection with `Connection: close`; the stream is dropped when the call
/// returns, on success and on error alike.
#[derive(Debug, Clone)]
pub struct DockerClient {
    socket_path: String,
    api_prefix: String,
}

#[derive(Debug, PartialEq, Eq)]
struct HttpResponse {
    status: u16,
    body: Vec<u8>,
}

impl DockerClient {
    pub fn new(socket_path: impl Into<String>) -> Self {
        Self {
            socket_path: socket_path.into(),
            api_prefix: String::new(),
        }
    }

    pub fn socket_path(&self) -> &str {
        &self.socket_path
    }

    /// API version in use, `None` until negotiation succeeded.
    pub fn api_version(&self) -> Option<&str> {
        self.api_prefix.strip_prefix("/v")
    }

    /// Ask the engine for its API version and pin later calls to it.
    /// Failure is not fatal: calls then go to the unversioned paths.
    pub async fn negotiate_version(&mut self) {
        match self.get_json::<VersionInfo>("/version").await {
            Ok(version) => {
                info!(
                    "Docker engine {} speaks API {}",
                    version.version, version.api_version
                );
                self.api_prefix = format!("/v{}", version.api_version);
            }
            Err(e) => warn!("API version negotiation failed, using default: {}", e),
        }
    }

    pub async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, DockerError> {
        let endpoint = if all {
            "/containers/json?all=true"
        } else {
            "/containers/json"
        };
        self.get_json(endpoint).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<T, DockerError> {
        let response = self.api_call(endpoint).await?;
        if !(200..300).contains(&response.status) {
            return Err(DockerError::Status {
                status: response.status,
                message: engine_message(&response.body),
            });
        }
        Ok(serde_json::from_slice(&response.body)?)
    }

    async fn api_call(&self, endpoint: &str) -> Result<HttpResponse, DockerError> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|source| DockerError::Connect {
                path: self.socket_path.clone(),
                source,
            })?;
        let path = format!("{}{}", self.api_prefix, endpoint);
        debug!("GET {} via {}", path, self.socket_path);
        self.send_request(stream, &path).await
    }

    async fn send_request(
        &self,
        mut stream: UnixStream,
        path: &str,
    ) -> Result<HttpResponse, DockerError> {
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nAccept: application/json\r\nConnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await?;

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await?;
        parse_response(&raw)
    }
}

fn engine_message(body: &[u8]) -> String {
    match serde_json::from_slice::<EngineMessage>(body) {
        Ok(m) => m.message,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn parse_response(raw: &[u8]) -> Result<HttpResponse, DockerError> {
    let header_end = find(raw, b"\r\n\r\n")
        .ok_or_else(|| DockerError::Malformed("missing end of headers".to_string()))?;
    let head = std::str::from_utf8(&raw[..header_end])
        .map_err(|_| DockerError::Malformed("headers are not UTF-8".to_string()))?;
    let body = &raw[header_end + 4..];

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap_or_default();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| DockerError::Malformed(format!("bad status line '{}'", status_line)))?;

    let mut chunked = false;
    let mut content_length = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("transfer-encoding") {
            chunked = value.eq_ignore_ascii_case("chunked");
        } else if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().ok();
        }
    }

    let body = if chunked {
        decode_chunked(body)?
    } else if let Some(len) = content_length {
        if body.len() < len {
            return Err(DockerError::Malformed(format!(
                "body truncated: expected {} bytes, got {}",
                len,
                body.len()
            )));
        }
        body[..len].to_vec()
    } else {
        body.to_vec()
    };

    Ok(HttpResponse { status, body })
}

fn decode_chunked(mut body: &[u8]) -> Result<Vec<u8>, DockerError> {
    let mut decoded = Vec::with_capacity(body.len());
    loop {
        let line_end = find(body, b"\r\n")
            .ok_or_else(|| DockerError::Malformed("unterminated chunk size".to_string()))?;
        let size_line = std::str::from_utf8(&body[..line_end])
            .map_err(|_| DockerError::Malformed("chunk size is not UTF-8".to_string()))?;
        // Chunk extensions after ';' are ignored.
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| DockerError::Malformed(format!("bad chunk size '{}'", size_hex)))?;
        body = &body[line_end + 2..];

        if size == 0 {
            return Ok(decoded);
        }
        if body.len() < size + 2 {
            return Err(DockerError::Malformed("truncated chunk".to_string()));
        }
        decoded.extend_from_slice(&body[..size]);
        body = &body[size + 2..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_length_response() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n[]";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"[]");
    }

    #[test]
    fn test_parse_chunked_response() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\n[{\"I\r\na;ext=1\r\nd\":\"abc\"}]\r\n0\r\n\r\n";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.body, br#"[{"Id":"abc"}]"#);
    }

    #[test]
    fn test_parse_error_status() {
        let raw = b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 20\r\n\r\n{\"message\":\"boom\"}\n\n";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(engine_message(&response.body), "boom");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_response(b"not http at all"),
            Err(DockerError::Malformed(_))
        ));
        assert!(matches!(
            parse_response(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n"),
            Err(DockerError::Malformed(_))
        ));
    }

    #[test]
    fn test_engine_message_falls_back_to_text() {
        assert_eq!(engine_message(b"page not found\n"), "page not found");
    }

    #[tokio::test]
    async fn test_list_containers_without_engine() {
        let dir = tempfile::tempdir().unwrap();
        let client = DockerClient::new(dir.path().join("missing.sock").display().to_string());
        let err = client.list_containers(true).await.unwrap_err();
        assert!(matches!(err, DockerError::Connect { .. }));
        assert_eq!(client.api_version(), None);
    }
}
