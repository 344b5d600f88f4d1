//! Request and response bodies of the control-plane API.
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/server/add/`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewServerRequest {
    pub server_name: String,
    pub network_address: String,
    pub network_mask: u8,
    pub public_key: String,
    pub endpoint_address: String,
    pub endpoint_port: u16,
    pub n_reserved_ips: u32,
    pub allowed_ips: String,
}

/// Body of `POST /api/v1/client/add/`. Only ever carries the public half of
/// the peering keypair.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PeeringRequest {
    pub client_name: String,
    pub server_name: String,
    pub public_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub(crate) struct ServerQuery<'a> {
    pub server_name: &'a str,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub(crate) struct PeeringQuery<'a> {
    pub client_name: &'a str,
    pub server_name: &'a str,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct Peer {
    pub ip_address: String,
    pub public_key: String,
}

impl Peer {
    pub fn new(ip_address: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            public_key: public_key.into(),
        }
    }

    /// Leased addresses are single hosts unless the control plane already
    /// sent a prefix.
    pub fn allowed_ips(&self) -> String {
        if self.ip_address.contains('/') {
            self.ip_address.clone()
        } else if self.ip_address.contains(':') {
            format!("{}/128", self.ip_address)
        } else {
            format!("{}/32", self.ip_address)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct PeerList {
    #[serde(default)]
    pub peers: Vec<Peer>,
}

impl From<Vec<Peer>> for PeerList {
    fn from(peers: Vec<Peer>) -> Self {
        Self { peers }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub(crate) struct ServerAddress {
    pub server_wg_ip: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LeaseServer {
    pub endpoint_address: String,
    pub endpoint_port: u16,
    pub public_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LeaseSubnet {
    pub allowed_ips: String,
    pub lease: String,
}

/// How a client must configure itself to reach one server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PeeringLease {
    pub server: LeaseServer,
    pub subnet: LeaseSubnet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_allowed_ips() {
        assert_eq!(Peer::new("10.8.0.7", "k").allowed_ips(), "10.8.0.7/32");
        assert_eq!(Peer::new("10.8.0.0/30", "k").allowed_ips(), "10.8.0.0/30");
        assert_eq!(Peer::new("fd00::7", "k").allowed_ips(), "fd00::7/128");
    }

    #[test]
    fn test_peer_list_tolerates_missing_peers() {
        let list: PeerList = serde_json::from_str("{}").unwrap();
        assert!(list.peers.is_empty());
    }

    #[test]
    fn test_lease_from_json() {
        let body = r#"{
            "server": {"endpoint_address": "203.0.113.10", "endpoint_port": 51820, "public_key": "srv="},
            "subnet": {"allowed_ips": "10.8.0.0/24", "lease": "10.8.0.7/32"}
        }"#;
        let lease: PeeringLease = serde_json::from_str(body).unwrap();
        assert_eq!(lease.server.endpoint_port, 51820);
        assert_eq!(lease.subnet.lease, "10.8.0.7/32");
    }
}
