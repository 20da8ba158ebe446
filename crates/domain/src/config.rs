use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Resolver configuration.
///
/// Server discovery is the caller's concern; the resolver uses the first
/// entry of `servers` for all queries.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    pub servers: Vec<SocketAddr>,
    #[serde(default = "default_query_timeout")]
    pub query_timeout_ms: u64,
}

fn default_query_timeout() -> u64 {
    5000
}

impl ResolverConfig {
    pub fn new(servers: Vec<SocketAddr>) -> Self {
        Self {
            servers,
            query_timeout_ms: default_query_timeout(),
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}
