use crate::{
    api::{
        NewServerRequest, PeerList, PeeringLease, PeeringQuery, PeeringRequest,
        ServerAddress, ServerQuery,
    },
    ApiError, ApiResult,
};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::{sync::Arc, time::Duration};
use strum::{AsRefStr, Display};
use wgapi_lib::{types::Secret, ApiServer};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
pub enum Operation {
    RegisterServer,
    ServerExists,
    ServerConfig,
    ServerAddress,
    RegisterClient,
    PeeringLease,
}

impl Operation {
    pub fn path(&self) -> &'static str {
        match self {
            Operation::RegisterServer => "/api/v1/server/add/",
            Operation::ServerExists => "/api/v1/server/exists/",
            Operation::ServerConfig => "/api/v1/server/config/",
            Operation::ServerAddress => "/api/v1/server/wireguard_ip/",
            Operation::RegisterClient => "/api/v1/client/add/",
            Operation::PeeringLease => "/api/v1/client/config/",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Operation::RegisterServer | Operation::RegisterClient => Method::POST,
            _ => Method::GET,
        }
    }

    /// Status-code table for each operation.
    pub fn classify(&self, status: u16) -> ApiResult<()> {
        match (self, status) {
            (Operation::RegisterServer | Operation::RegisterClient, 201) => Ok(()),
            (Operation::RegisterServer | Operation::RegisterClient, 400) => {
                Err(ApiError::RequestFormat)
            }

            (
                Operation::ServerExists
                | Operation::ServerConfig
                | Operation::ServerAddress
                | Operation::PeeringLease,
                200,
            ) => Ok(()),
            (Operation::ServerConfig | Operation::ServerAddress, 404) => {
                Err(ApiError::RequestFormat)
            }

            (Operation::PeeringLease, 500) => Err(ApiError::LeaseUnavailable),
            (_, 500) => Err(ApiError::ApiServer),
            (_, 401) => Err(ApiError::Unauthorized),
            (_, code) => Err(ApiError::Unknown(code)),
        }
    }
}

/// The control-plane operations the agent relies on. Each call is a single
/// attempt; retry policy belongs to the caller.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn register_server(&self, request: &NewServerRequest) -> ApiResult<()>;

    /// Any failure reads as "not registered".
    async fn server_exists(&self, server_name: &str) -> bool;

    async fn fetch_server_config(&self, server_name: &str) -> ApiResult<PeerList>;

    /// Tunnel address of the server's own interface.
    async fn fetch_server_address(&self, server_name: &str) -> ApiResult<String>;

    async fn register_client(&self, request: &PeeringRequest) -> ApiResult<()>;

    async fn fetch_peering_lease(
        &self,
        client_name: &str,
        server_name: &str,
    ) -> ApiResult<PeeringLease>;
}

#[async_trait]
impl<T: ControlPlane + ?Sized> ControlPlane for Arc<T> {
    async fn register_server(&self, request: &NewServerRequest) -> ApiResult<()> {
        (**self).register_server(request).await
    }

    async fn server_exists(&self, server_name: &str) -> bool {
        (**self).server_exists(server_name).await
    }

    async fn fetch_server_config(&self, server_name: &str) -> ApiResult<PeerList> {
        (**self).fetch_server_config(server_name).await
    }

    async fn fetch_server_address(&self, server_name: &str) -> ApiResult<String> {
        (**self).fetch_server_address(server_name).await
    }

    async fn register_client(&self, request: &PeeringRequest) -> ApiResult<()> {
        (**self).register_client(request).await
    }

    async fn fetch_peering_lease(
        &self,
        client_name: &str,
        server_name: &str,
    ) -> ApiResult<PeeringLease> {
        (**self).fetch_peering_lease(client_name, server_name).await
    }
}

/// HTTP implementation of [`ControlPlane`] using basic authentication and
/// JSON bodies.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    username: String,
    password: Secret,
    http: Client,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: Secret,
    ) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<B: Serialize + Sync>(
        &self,
        op: Operation,
        body: &B,
    ) -> ApiResult<Response> {
        let url = format!("{}{}", self.base_url, op.path());
        tracing::debug!("{op}: {} {url}", op.method());

        let resp = self
            .http
            .request(op.method(), &url)
            .basic_auth(&self.username, Some(self.password.expose()))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;

        let status = resp.status().as_u16();
        if let Err(e) = op.classify(status) {
            tracing::warn!("{op} against {} failed with status {status}: {e}", self.base_url);
            return Err(e);
        }

        Ok(resp)
    }

    async fn decode<T: DeserializeOwned>(op: Operation, resp: Response) -> ApiResult<T> {
        resp.json::<T>().await.map_err(|e| {
            tracing::warn!("Could not decode {op} response: {e}");
            ApiError::MalformedResponse(e.to_string())
        })
    }
}

impl TryFrom<&ApiServer> for ApiClient {
    type Error = ApiError;
    fn try_from(a: &ApiServer) -> ApiResult<Self> {
        ApiClient::new(a.address.clone(), a.username.clone(), a.password.clone())
    }
}

#[async_trait]
impl ControlPlane for ApiClient {
    async fn register_server(&self, request: &NewServerRequest) -> ApiResult<()> {
        self.send(Operation::RegisterServer, request).await?;
        Ok(())
    }

    async fn server_exists(&self, server_name: &str) -> bool {
        match self
            .send(Operation::ServerExists, &ServerQuery { server_name })
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Treating server {server_name} as unregistered: {e}");
                false
            }
        }
    }

    async fn fetch_server_config(&self, server_name: &str) -> ApiResult<PeerList> {
        let resp = self
            .send(Operation::ServerConfig, &ServerQuery { server_name })
            .await?;
        Self::decode(Operation::ServerConfig, resp).await
    }

    async fn fetch_server_address(&self, server_name: &str) -> ApiResult<String> {
        let resp = self
            .send(Operation::ServerAddress, &ServerQuery { server_name })
            .await?;
        let address: ServerAddress = Self::decode(Operation::ServerAddress, resp).await?;
        Ok(address.server_wg_ip)
    }

    async fn register_client(&self, request: &PeeringRequest) -> ApiResult<()> {
        self.send(Operation::RegisterClient, request).await?;
        Ok(())
    }

    async fn fetch_peering_lease(
        &self,
        client_name: &str,
        server_name: &str,
    ) -> ApiResult<PeeringLease> {
        let resp = self
            .send(
                Operation::PeeringLease,
                &PeeringQuery {
                    client_name,
                    server_name,
                },
            )
            .await?;
        Self::decode(Operation::PeeringLease, resp).await
    }
}
