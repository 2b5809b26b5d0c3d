use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::ViewError;
use crate::types::{ContainerSummary, Mount, NetworkSettings, Port};

pub const RUNNING: &str = "running";

/// Render-ready row for one container. Built per request, never stored.
#[derive(Debug, Clone)]
pub struct ContainerView {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    pub image_id: String,
    pub command: String,
    pub created: DateTime<Utc>,
    pub state: String,
    pub status: String,
    pub ports: Vec<Port>,
    pub labels: BTreeMap<String, String>,
    pub network_ips: BTreeMap<String, String>,
    pub public_port: u16,
    pub url: String,
    pub mounts: Vec<Mount>,
}

impl ContainerView {
    pub fn from_summary(summary: ContainerSummary, host_ip: &str) -> Result<Self, ViewError> {
        let created = created_at(summary.created).ok_or_else(|| ViewError::InvalidTimestamp {
            id: summary.id.clone(),
            created: summary.created,
        })?;
        let public_port = public_port(&summary.ports);
        let network_ips = network_ips(summary.network_settings.as_ref());

        Ok(Self {
            id: summary.id,
            names: summary.names,
            image: summary.image,
            image_id: summary.image_id,
            command: summary.command,
            created,
            state: summary.state,
            status: summary.status,
            ports: summary.ports,
            labels: summary.labels.unwrap_or_default().into_iter().collect(),
            network_ips,
            public_port,
            url: format!("http://{}:{}", host_ip, public_port),
            mounts: summary.mounts,
        })
    }

    /// Container name without the engine's leading slash.
    pub fn display_name(&self) -> &str {
        self.names
            .first()
            .map(|n| n.trim_start_matches('/'))
            .unwrap_or(self.id.as_str())
    }

    pub fn short_id(&self) -> &str {
        self.id.get(..12).unwrap_or(self.id.as_str())
    }

    pub fn is_running(&self) -> bool {
        self.state == RUNNING
    }
}

/// First non-zero public port in engine order, 0 when none is published.
pub fn public_port(ports: &[Port]) -> u16 {
    ports
        .iter()
        .filter_map(|p| p.public_port)
        .find(|&p| p != 0)
        .unwrap_or(0)
}

pub fn network_ips(settings: Option<&NetworkSettings>) -> BTreeMap<String, String> {
    settings
        .map(|s| {
            s.networks
                .iter()
                .map(|(name, endpoint)| (name.clone(), endpoint.ip_address.clone()))
                .collect()
        })
        .unwrap_or_default()
}

pub fn created_at(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// Build the rows of one listing. All rows share `host_ip`; the first
/// container that cannot be converted fails the whole listing.
pub fn build_views(
    containers: Vec<ContainerSummary>,
    host_ip: &str,
) -> Result<Vec<ContainerView>, ViewError> {
    containers
        .into_iter()
        .map(|c| ContainerView::from_summary(c, host_ip))
        .collect()
}

/// Move running containers to the front, keeping engine order within both
/// groups.
pub fn running_first(views: &mut [ContainerView]) {
    views.sort_by_key(|v| !v.is_running());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EndpointSettings;
    use std::collections::HashMap;

    fn summary(id: &str, state: &str) -> ContainerSummary {
        ContainerSummary {
            id: id.to_string(),
            names: vec![format!("/{}", id)],
            image: "nginx:latest".to_string(),
            image_id: "sha256:d74508fb6632".to_string(),
            command: "nginx".to_string(),
            created: 1_700_000_000,
            ports: Vec::new(),
            labels: None,
            state: state.to_string(),
            status: String::new(),
            network_settings: None,
            mounts: Vec::new(),
        }
    }

    fn port(private_port: u16, public_port: Option<u16>) -> Port {
        Port {
            ip: None,
            private_port,
            public_port,
            port_type: "tcp".to_string(),
        }
    }

    #[test]
    fn test_public_port_first_non_zero() {
        assert_eq!(public_port(&[port(80, Some(0)), port(81, Some(8080))]), 8080);
        assert_eq!(
            public_port(&[port(80, None), port(81, Some(9000)), port(82, Some(8080))]),
            9000
        );
        assert_eq!(public_port(&[port(80, None)]), 0);
        assert_eq!(public_port(&[]), 0);
    }

    #[test]
    fn test_network_ips() {
        assert!(network_ips(None).is_empty());

        let mut networks = HashMap::new();
        networks.insert(
            "bridge".to_string(),
            EndpointSettings {
                network_id: "n1".to_string(),
                gateway: "172.17.0.1".to_string(),
                ip_address: "172.17.0.2".to_string(),
                mac_address: String::new(),
            },
        );
        let ips = network_ips(Some(&NetworkSettings { networks }));
        assert_eq!(ips.get("bridge").map(String::as_str), Some("172.17.0.2"));
    }

    #[test]
    fn test_from_summary() {
        let mut c = summary("8dfafdbc3a40aaaa", "running");
        c.ports = vec![port(443, None), port(80, Some(8080))];
        c.labels = Some(HashMap::from([("tier".to_string(), "web".to_string())]));

        let view = ContainerView::from_summary(c, "192.168.1.20").unwrap();
        assert_eq!(view.url, "http://192.168.1.20:8080");
        assert_eq!(view.public_port, 8080);
        assert_eq!(view.created.timestamp(), 1_700_000_000);
        assert_eq!(view.labels["tier"], "web");
        assert!(view.network_ips.is_empty());
        assert_eq!(view.display_name(), "8dfafdbc3a40aaaa");
        assert_eq!(view.short_id(), "8dfafdbc3a40");
    }

    #[test]
    fn test_unpublished_container_url_uses_port_zero() {
        let view = ContainerView::from_summary(summary("abc", "exited"), "127.0.0.1").unwrap();
        assert_eq!(view.url, "http://127.0.0.1:0");
        assert_eq!(view.short_id(), "abc");
    }

    #[test]
    fn test_invalid_timestamp_fails_listing() {
        let mut bad = summary("bad", "running");
        bad.created = i64::MAX;
        let err = build_views(vec![summary("ok", "running"), bad], "127.0.0.1").unwrap_err();
        assert!(matches!(err, ViewError::InvalidTimestamp { ref id, .. } if id == "bad"));
    }

    #[test]
    fn test_running_first_is_stable() {
        let containers = vec![
            summary("exited-1", "exited"),
            summary("running-1", "running"),
            summary("exited-2", "exited"),
            summary("paused-1", "paused"),
            summary("running-2", "running"),
        ];
        let mut views = build_views(containers, "127.0.0.1").unwrap();
        running_first(&mut views);
        let ids: Vec<_> = views.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["running-1", "running-2", "exited-1", "exited-2", "paused-1"]
        );
    }

    #[test]
    fn test_state_is_not_validated() {
        let view = ContainerView::from_summary(summary("x", "hibernating"), "127.0.0.1").unwrap();
        assert_eq!(view.state, "hibernating");
        assert!(!view.is_running());
    }
}
