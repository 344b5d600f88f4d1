//! In-memory stand-ins for wireguard-tools and the control plane.
use crate::{
    api::{NewServerRequest, PeerList, PeeringLease, PeeringRequest},
    command::WireGuardTool,
    control::ControlPlane,
    ApiError, ApiResult, ToolError, ToolResult,
};
use async_trait::async_trait;
use std::{
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};
use wgapi_lib::types::Secret;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Derives a well-formed (32 byte, base64) key from a seed.
pub fn fake_key(seed: u8) -> String {
    base64::encode([seed; 32])
}

#[derive(Debug, Default)]
struct ToolState {
    missing: bool,
    fail_up: bool,
    fail_sync: bool,
    generated: u8,
    genkey_calls: usize,
    pubkey_calls: usize,
    up_calls: Vec<PathBuf>,
    sync_calls: Vec<(String, String)>,
}

/// Fake wireguard-tools. Records every call; `syncconf` records the config
/// file content as it was when the sync ran.
#[derive(Debug, Default)]
pub struct MockWireGuard {
    state: Mutex<ToolState>,
}

impl MockWireGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if wireguard-tools were not installed.
    pub fn set_missing(&self, missing: bool) {
        lock(&self.state).missing = missing;
    }

    pub fn set_fail_up(&self, fail: bool) {
        lock(&self.state).fail_up = fail;
    }

    pub fn set_fail_sync(&self, fail: bool) {
        lock(&self.state).fail_sync = fail;
    }

    pub fn genkey_calls(&self) -> usize {
        lock(&self.state).genkey_calls
    }

    pub fn pubkey_calls(&self) -> usize {
        lock(&self.state).pubkey_calls
    }

    pub fn up_calls(&self) -> Vec<PathBuf> {
        lock(&self.state).up_calls.clone()
    }

    /// `(interface, config content)` per successful or failed sync attempt.
    pub fn sync_calls(&self) -> Vec<(String, String)> {
        lock(&self.state).sync_calls.clone()
    }

    /// Public key the mock derives for a given private key.
    pub fn public_key_for(private_key: &str) -> String {
        let seed = base64::decode(private_key)
            .ok()
            .and_then(|b| b.first().copied())
            .unwrap_or_default();
        fake_key(seed.wrapping_add(128))
    }
}

#[async_trait]
impl WireGuardTool for MockWireGuard {
    async fn genkey(&self) -> ToolResult<Secret> {
        let mut state = lock(&self.state);
        state.genkey_calls += 1;
        if state.missing {
            return Err(ToolError::NotFound("wg".to_string()));
        }
        state.generated += 1;
        Ok(Secret::from(fake_key(state.generated)))
    }

    async fn pubkey(&self, private_key: &Secret) -> ToolResult<String> {
        let mut state = lock(&self.state);
        state.pubkey_calls += 1;
        if state.missing {
            return Err(ToolError::NotFound("wg".to_string()));
        }
        Ok(Self::public_key_for(private_key.expose()))
    }

    async fn up(&self, config: &Path) -> ToolResult<()> {
        let mut state = lock(&self.state);
        state.up_calls.push(config.to_path_buf());
        if state.missing {
            return Err(ToolError::NotFound("wg-quick".to_string()));
        }
        if state.fail_up {
            return Err(ToolError::Failed {
                program: "wg-quick".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "wg-quick: `wg0' already exists".to_string(),
            });
        }
        Ok(())
    }

    async fn syncconf(&self, interface: &str, config: &Path) -> ToolResult<()> {
        let content = std::fs::read_to_string(config)?;
        let mut state = lock(&self.state);
        state.sync_calls.push((interface.to_string(), content));
        if state.missing {
            return Err(ToolError::NotFound("wg".to_string()));
        }
        if state.fail_sync {
            return Err(ToolError::Failed {
                program: "wg".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Unable to modify interface: No such device".to_string(),
            });
        }
        Ok(())
    }
}

/// A control-plane call as seen by [`MockControlPlane`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RegisterServer(NewServerRequest),
    ServerExists(String),
    ServerConfig(String),
    ServerAddress(String),
    RegisterClient(PeeringRequest),
    PeeringLease { client: String, server: String },
}

#[derive(Debug)]
struct ControlState {
    exists: bool,
    register_server: ApiResult<()>,
    server_address: ApiResult<String>,
    peer_lists: VecDeque<ApiResult<PeerList>>,
    register_client: HashMap<String, ApiError>,
    leases: HashMap<String, ApiResult<PeeringLease>>,
    calls: Vec<Call>,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            exists: false,
            register_server: Ok(()),
            server_address: Ok("10.8.0.1".to_string()),
            peer_lists: VecDeque::new(),
            register_client: HashMap::new(),
            leases: HashMap::new(),
            calls: Vec::new(),
        }
    }
}

/// Scriptable control plane. Peer lists are served in order; the last one
/// keeps being served once the script runs out.
#[derive(Debug, Default)]
pub struct MockControlPlane {
    state: Mutex<ControlState>,
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_exists(&self, exists: bool) {
        lock(&self.state).exists = exists;
    }

    pub fn set_register_server(&self, result: ApiResult<()>) {
        lock(&self.state).register_server = result;
    }

    pub fn set_server_address(&self, result: ApiResult<String>) {
        lock(&self.state).server_address = result;
    }

    pub fn push_peer_list(&self, result: ApiResult<PeerList>) {
        lock(&self.state).peer_lists.push_back(result);
    }

    pub fn fail_register_client(&self, server: &str, error: ApiError) {
        lock(&self.state)
            .register_client
            .insert(server.to_string(), error);
    }

    pub fn set_lease(&self, server: &str, result: ApiResult<PeeringLease>) {
        lock(&self.state).leases.insert(server.to_string(), result);
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.state).calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        lock(&self.state).calls.iter().filter(|c| pred(c)).count()
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn register_server(&self, request: &NewServerRequest) -> ApiResult<()> {
        let mut state = lock(&self.state);
        state.calls.push(Call::RegisterServer(request.clone()));
        let result = state.register_server.clone();
        if result.is_ok() {
            state.exists = true;
        }
        result
    }

    async fn server_exists(&self, server_name: &str) -> bool {
        let mut state = lock(&self.state);
        state.calls.push(Call::ServerExists(server_name.to_string()));
        state.exists
    }

    async fn fetch_server_config(&self, server_name: &str) -> ApiResult<PeerList> {
        let mut state = lock(&self.state);
        state.calls.push(Call::ServerConfig(server_name.to_string()));
        if state.peer_lists.len() > 1 {
            if let Some(next) = state.peer_lists.pop_front() {
                return next;
            }
        }
        state
            .peer_lists
            .front()
            .cloned()
            .unwrap_or_else(|| Ok(PeerList::default()))
    }

    async fn fetch_server_address(&self, server_name: &str) -> ApiResult<String> {
        let mut state = lock(&self.state);
        state.calls.push(Call::ServerAddress(server_name.to_string()));
        state.server_address.clone()
    }

    async fn register_client(&self, request: &PeeringRequest) -> ApiResult<()> {
        let mut state = lock(&self.state);
        state.calls.push(Call::RegisterClient(request.clone()));
        match state.register_client.get(&request.server_name) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn fetch_peering_lease(
        &self,
        client_name: &str,
        server_name: &str,
    ) -> ApiResult<PeeringLease> {
        let mut state = lock(&self.state);
        state.calls.push(Call::PeeringLease {
            client: client_name.to_string(),
            server: server_name.to_string(),
        });
        state
            .leases
            .get(server_name)
            .cloned()
            .unwrap_or(Err(ApiError::LeaseUnavailable))
    }
}
