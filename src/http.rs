//! HTTP client for the hosting API.
//!
//! Uses native-tls with the platform's root certificates and a global
//! timeout. Non-2xx statuses are returned as values so callers can treat
//! "not found" and "already exists" as outcomes rather than failures.

use std::time::Duration;

use ureq::tls::{RootCerts, TlsConfig, TlsProvider};
use ureq::Agent;

use crate::error::RemoteRepoError;
use crate::remote::{ApiRequest, ApiResponse, Method, Transport};

/// Upper bound on API response bodies.
pub const MAX_API_RESPONSE_SIZE: u64 = 1024 * 1024;

const USER_AGENT: &str = concat!("greenwall/", env!("CARGO_PKG_VERSION"));

pub fn agent(timeout: Duration) -> Agent {
    let tls_config = TlsConfig::builder()
        .provider(TlsProvider::NativeTls)
        .root_certs(RootCerts::PlatformVerifier)
        .build();

    Agent::config_builder()
        .tls_config(tls_config)
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// [`Transport`] backed by a `ureq` agent.
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: agent(timeout),
        }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, RemoteRepoError> {
        let transport_error = |e: ureq::Error| RemoteRepoError::Transport {
            url: request.url.clone(),
            message: e.to_string(),
        };
        let authorization = format!("Bearer {}", request.token);

        let response = match request.method {
            Method::Delete => self
                .agent
                .delete(&request.url)
                .header("Authorization", &authorization)
                .header("Accept", "application/vnd.github+json")
                .header("User-Agent", USER_AGENT)
                .call(),
            Method::Post => self
                .agent
                .post(&request.url)
                .header("Authorization", &authorization)
                .header("Accept", "application/vnd.github+json")
                .header("User-Agent", USER_AGENT)
                .header("Content-Type", "application/json")
                .send(request.body.as_deref().unwrap_or_default()),
        }
        .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .with_config()
            .limit(MAX_API_RESPONSE_SIZE)
            .read_to_string()
            .map_err(transport_error)?;

        Ok(ApiResponse { status, body })
    }
}
