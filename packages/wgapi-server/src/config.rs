use wgapi_crypto::Keypair;
use wgapi_lib::{types::InterfaceName, ServerSection, SubnetSection};
use wgapi_proto::{
    wireguard::WireGuardConfigBuilder, NewServerRequest, PeerList, WireGuardPeer,
};

/// This host's hub role. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct ServerIdentity {
    name: InterfaceName,
    subnet: SubnetSection,
    endpoint_address: String,
    endpoint_port: u16,
    keypair: Keypair,
}

impl ServerIdentity {
    pub fn new(section: &ServerSection, keypair: Keypair) -> Self {
        Self {
            name: InterfaceName::from(section.name.as_str()),
            subnet: section.subnet.clone(),
            endpoint_address: section.endpoint_address.clone(),
            endpoint_port: section.endpoint_port,
            keypair,
        }
    }

    pub fn name(&self) -> &InterfaceName {
        &self.name
    }

    pub fn public_key(&self) -> &str {
        self.keypair.public_key()
    }

    pub fn registration_request(&self) -> NewServerRequest {
        NewServerRequest {
            server_name: self.name.to_string(),
            network_address: self.subnet.network_address.clone(),
            network_mask: self.subnet.network_mask,
            public_key: self.keypair.public_key().to_string(),
            endpoint_address: self.endpoint_address.clone(),
            endpoint_port: self.endpoint_port,
            n_reserved_ips: self.subnet.num_reserved_ips,
            allowed_ips: self.subnet.allowed_ips.clone(),
        }
    }

    /// Config for `wg-quick up`: carries the interface address.
    pub fn render_initial(&self, tunnel_ip: &str, peers: &PeerList) -> String {
        self.render(
            Some(format!("{tunnel_ip}/{}", self.subnet.network_mask)),
            peers,
        )
    }

    /// Config for `wg syncconf`, which rejects `Address`.
    pub fn render_sync(&self, peers: &PeerList) -> String {
        self.render(None, peers)
    }

    fn render(&self, address: Option<String>, peers: &PeerList) -> String {
        let mut builder = WireGuardConfigBuilder::builder(self.keypair.private_key().clone())
            .listen_port(self.endpoint_port)
            .peers(peers.peers.iter().map(WireGuardPeer::from).collect());
        if let Some(address) = address {
            builder = builder.address(address);
        }
        builder.build().render()
    }
}
