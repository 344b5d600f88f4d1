#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::{path::Path, sync::Arc, time::Duration};
    use tokio::sync::broadcast;
    use wgapi_client::{PeeringOutcome, Provisioner};
    use wgapi_crypto::KeyStore;
    use wgapi_lib::Config;
    use wgapi_proto::{mock::MockWireGuard, ApiClient};
    use wgapi_server::{CycleOutcome, Server, ServerIdentity, Snapshot};
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    }

    fn client_config(api: &MockServer, state: &Path, wg: &Path) -> Config {
        let content = format!(
            r#"
name: "laptop-01"
type: client
api_server:
  address: "{}"
  username: "admin"
  password: "hunter2"
peering_list:
  - server_name: "hub-a"
  - server_name: "hub-b"
wireguard_dir: "{}"
state_dir: "{}"
"#,
            api.uri(),
            wg.display(),
            state.display()
        );
        Config::try_from(content.as_str()).unwrap()
    }

    fn server_config(api: &MockServer, state: &Path, wg: &Path) -> Config {
        let content = format!(
            r#"
type: server
api_server:
  address: "{}"
  username: "admin"
  password: "hunter2"
server:
  name: "hub-a"
  subnet:
    network_address: "10.8.0.0"
    network_mask: 24
    num_reserved_ips: 5
    allowed_ips: "10.8.0.0/24"
  endpoint_address: "203.0.113.10"
  endpoint_port: 51820
wireguard_dir: "{}"
state_dir: "{}"
"#,
            api.uri(),
            wg.display(),
            state.display()
        );
        Config::try_from(content.as_str()).unwrap()
    }

    async fn mount_lease(api: &MockServer, server_name: &str, endpoint: &str, lease: &str) {
        Mock::given(method("POST"))
            .and(path("/api/v1/client/add/"))
            .and(body_partial_json(json!({ "server_name": server_name })))
            .respond_with(ResponseTemplate::new(201))
            .mount(api)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/client/config/"))
            .and(body_partial_json(json!({ "server_name": server_name })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "server": {
                    "endpoint_address": endpoint,
                    "endpoint_port": 51820,
                    "public_key": format!("{server_name}-pub="),
                },
                "subnet": {
                    "allowed_ips": "10.8.0.0/24",
                    "lease": lease,
                },
            })))
            .mount(api)
            .await;
    }

    async fn mount_peers(api: &MockServer, peers: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/api/v1/server/exists/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(api)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/server/wireguard_ip/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "server_wg_ip": "10.8.0.1" })),
            )
            .mount(api)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/server/config/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "peers": peers })))
            .mount(api)
            .await;
    }

    async fn request_count(api: &MockServer) -> usize {
        api.received_requests().await.map(|r| r.len()).unwrap_or_default()
    }

    async fn server_for(
        config: &Config,
        tool: Arc<MockWireGuard>,
        refresh_interval: Duration,
    ) -> Server<ApiClient, Arc<MockWireGuard>> {
        let section = config.server().unwrap();
        let keypair = KeyStore::new(config.state_dir(), tool.clone())
            .ensure(&section.name)
            .await
            .unwrap();
        Server::new(
            ServerIdentity::new(section, keypair),
            ApiClient::try_from(config.api_server()).unwrap(),
            tool,
            config.wireguard_dir(),
            refresh_interval,
        )
    }

    #[tokio::test]
    async fn test_client_provisions_two_hubs_once() {
        init_tracing();
        let api = MockServer::start().await;
        let state = tempfile::tempdir().unwrap();
        let wg = tempfile::tempdir().unwrap();
        mount_lease(&api, "hub-a", "203.0.113.10", "10.8.0.7").await;
        mount_lease(&api, "hub-b", "198.51.100.4", "10.9.0.3").await;

        let config = client_config(&api, state.path(), wg.path());
        let tool = Arc::new(MockWireGuard::new());
        let provisioner = Provisioner::new(
            config.name(),
            ApiClient::try_from(config.api_server()).unwrap(),
            KeyStore::new(config.state_dir(), tool.clone()),
            config.wireguard_dir(),
        );

        let report = provisioner.run(config.peering_list()).await.unwrap();
        assert_eq!(report.outcome("hub-a"), Some(&PeeringOutcome::Provisioned));
        assert_eq!(report.outcome("hub-b"), Some(&PeeringOutcome::Provisioned));
        assert_eq!(request_count(&api).await, 4);
        assert_eq!(tool.genkey_calls(), 2);

        let hub_a = std::fs::read_to_string(wg.path().join("hub-a.conf")).unwrap();
        assert!(hub_a.contains("Address = 10.8.0.7\n"));
        assert!(hub_a.contains("PublicKey = hub-a-pub=\n"));
        assert!(hub_a.contains("Endpoint = 203.0.113.10:51820\n"));
        let hub_b = std::fs::read_to_string(wg.path().join("hub-b.conf")).unwrap();
        assert!(hub_b.contains("Address = 10.9.0.3\n"));
        assert!(hub_b.contains("Endpoint = 198.51.100.4:51820\n"));

        // Keys are cached per peering under the state dir.
        assert!(state.path().join(".hub-a.priv").exists());
        assert!(state.path().join("hub-b.pub").exists());

        let report = provisioner.run(config.peering_list()).await.unwrap();
        assert_eq!(
            report.outcome("hub-a"),
            Some(&PeeringOutcome::AlreadyProvisioned)
        );
        assert_eq!(
            report.outcome("hub-b"),
            Some(&PeeringOutcome::AlreadyProvisioned)
        );
        assert_eq!(request_count(&api).await, 4);
        assert_eq!(tool.genkey_calls(), 2);
    }

    #[tokio::test]
    async fn test_client_lease_failure_is_retried_next_run() {
        init_tracing();
        let api = MockServer::start().await;
        let state = tempfile::tempdir().unwrap();
        let wg = tempfile::tempdir().unwrap();
        mount_lease(&api, "hub-a", "203.0.113.10", "10.8.0.7").await;
        Mock::given(method("POST"))
            .and(path("/api/v1/client/add/"))
            .and(body_partial_json(json!({ "server_name": "hub-b" })))
            .respond_with(ResponseTemplate::new(201))
            .mount(&api)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/client/config/"))
            .and(body_partial_json(json!({ "server_name": "hub-b" })))
            .respond_with(ResponseTemplate::new(500))
            .mount(&api)
            .await;

        let config = client_config(&api, state.path(), wg.path());
        let provisioner = Provisioner::new(
            config.name(),
            ApiClient::try_from(config.api_server()).unwrap(),
            KeyStore::new(config.state_dir(), Arc::new(MockWireGuard::new())),
            config.wireguard_dir(),
        );

        let report = provisioner.run(config.peering_list()).await.unwrap();
        assert_eq!(report.outcome("hub-a"), Some(&PeeringOutcome::Provisioned));
        assert!(matches!(
            report.outcome("hub-b"),
            Some(PeeringOutcome::Abandoned(_))
        ));
        assert!(!wg.path().join("hub-b.conf").exists());

        // Only hub-b is attempted again: one registration, one lease fetch.
        let before = request_count(&api).await;
        provisioner.run(config.peering_list()).await.unwrap();
        assert_eq!(request_count(&api).await, before + 2);
    }

    #[tokio::test]
    async fn test_server_applies_only_changes() {
        init_tracing();
        let api = MockServer::start().await;
        let state = tempfile::tempdir().unwrap();
        let wg = tempfile::tempdir().unwrap();
        let p1 = json!([{ "ip_address": "10.8.0.6", "public_key": "peer1=" }]);
        mount_peers(&api, p1.clone()).await;

        let config = server_config(&api, state.path(), wg.path());
        let tool = Arc::new(MockWireGuard::new());
        let server = server_for(&config, tool.clone(), config.refresh_interval()).await;

        let first = server.reconcile(Snapshot::default()).await.unwrap();
        assert_eq!(first.outcome, CycleOutcome::Applied);
        let second = server.reconcile(first.snapshot.clone()).await.unwrap();
        assert_eq!(second.outcome, CycleOutcome::Unchanged);
        assert_eq!(tool.sync_calls().len(), 1);

        api.reset().await;
        let p2 = json!([
            { "ip_address": "10.8.0.6", "public_key": "peer1=" },
            { "ip_address": "10.8.0.7", "public_key": "peer2=" },
        ]);
        mount_peers(&api, p2).await;

        let third = server.reconcile(second.snapshot).await.unwrap();
        assert_eq!(third.outcome, CycleOutcome::Applied);

        let syncs = tool.sync_calls();
        assert_eq!(syncs.len(), 2);
        let (interface, content) = &syncs[1];
        assert_eq!(interface, "hub-a");
        assert!(content.contains("PublicKey = peer1=\nAllowedIPs = 10.8.0.6/32\n"));
        assert!(content.contains("PublicKey = peer2=\nAllowedIPs = 10.8.0.7/32\n"));
        assert_eq!(
            std::fs::read_to_string(wg.path().join("hub-a.conf")).unwrap(),
            *content
        );
    }

    #[tokio::test]
    async fn test_server_run_until_shutdown() {
        init_tracing();
        let api = MockServer::start().await;
        let state = tempfile::tempdir().unwrap();
        let wg = tempfile::tempdir().unwrap();
        mount_peers(
            &api,
            json!([{ "ip_address": "10.8.0.6", "public_key": "peer1=" }]),
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/server/add/"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&api)
            .await;

        let config = server_config(&api, state.path(), wg.path());
        let tool = Arc::new(MockWireGuard::new());
        let server = server_for(&config, tool.clone(), Duration::from_millis(10)).await;

        let (tx, rx) = broadcast::channel(1);
        let (result, _) = tokio::join!(server.run(rx), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(()).unwrap();
        });
        result.unwrap();

        // Many cycles over the same peer list, one hot-sync.
        assert_eq!(tool.up_calls().len(), 1);
        assert_eq!(tool.sync_calls().len(), 1);
        let content = std::fs::read_to_string(wg.path().join("hub-a.conf")).unwrap();
        assert!(!content.contains("Address"));
        assert!(content.contains("ListenPort = 51820\n"));
    }

    #[tokio::test]
    async fn test_server_registers_when_unknown() {
        init_tracing();
        let api = MockServer::start().await;
        let state = tempfile::tempdir().unwrap();
        let wg = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/api/v1/server/exists/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&api)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/server/add/"))
            .and(body_partial_json(json!({
                "server_name": "hub-a",
                "network_mask": 24,
                "n_reserved_ips": 5,
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&api)
            .await;

        let config = server_config(&api, state.path(), wg.path());
        let server = server_for(
            &config,
            Arc::new(MockWireGuard::new()),
            config.refresh_interval(),
        )
        .await;

        server.ensure_registered().await.unwrap();
        api.verify().await;
    }
}
