use wgapi_lib::types::Secret;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireGuardInterface {
    pub private_key: Secret,
    pub address: Option<String>,
    pub listen_port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WireGuardPeer {
    pub public_key: String,
    pub allowed_ips: String,
    pub endpoint: Option<String>,
}

impl From<&crate::api::Peer> for WireGuardPeer {
    fn from(p: &crate::api::Peer) -> Self {
        Self {
            public_key: p.public_key.clone(),
            allowed_ips: p.allowed_ips(),
            endpoint: None,
        }
    }
}

/// An `[Interface]` section followed by zero or more `[Peer]` sections, as
/// read by `wg-quick` and `wg syncconf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireGuardConfig {
    pub interface: WireGuardInterface,
    pub peers: Vec<WireGuardPeer>,
}

impl WireGuardConfig {
    /// Renders the config file. The output contains the private key in the
    /// clear and must only be written to owner-only files.
    pub fn render(&self) -> String {
        let mut out = format!(
            "[Interface]\nPrivateKey = {}\n",
            self.interface.private_key.expose()
        );
        if let Some(address) = &self.interface.address {
            out.push_str(&format!("Address = {address}\n"));
        }
        if let Some(port) = self.interface.listen_port {
            out.push_str(&format!("ListenPort = {port}\n"));
        }

        for peer in &self.peers {
            out.push_str(&format!(
                "\n[Peer]\nPublicKey = {}\nAllowedIPs = {}\n",
                peer.public_key, peer.allowed_ips
            ));
            if let Some(endpoint) = &peer.endpoint {
                out.push_str(&format!("Endpoint = {endpoint}\n"));
            }
        }

        out
    }
}

/// `host:port`, bracketing IPv6 literals.
pub fn endpoint(address: &str, port: u16) -> String {
    if address.contains(':') && !address.starts_with('[') {
        format!("[{address}]:{port}")
    } else {
        format!("{address}:{port}")
    }
}

#[derive(Debug)]
pub struct WireGuardConfigBuilder {
    private_key: Secret,
    address: Option<String>,
    listen_port: Option<u16>,
    peers: Vec<WireGuardPeer>,
}

impl WireGuardConfigBuilder {
    pub fn builder(private_key: Secret) -> Self {
        Self {
            private_key,
            address: None,
            listen_port: None,
            peers: Vec::new(),
        }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn listen_port(mut self, port: u16) -> Self {
        self.listen_port = Some(port);
        self
    }

    pub fn peer(mut self, peer: WireGuardPeer) -> Self {
        self.peers.push(peer);
        self
    }

    pub fn peers(mut self, peers: Vec<WireGuardPeer>) -> Self {
        self.peers = peers;
        self
    }

    pub fn build(self) -> WireGuardConfig {
        WireGuardConfig {
            interface: WireGuardInterface {
                private_key: self.private_key,
                address: self.address,
                listen_port: self.listen_port,
            },
            peers: self.peers,
        }
    }
}
