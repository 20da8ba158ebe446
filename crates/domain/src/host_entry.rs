use std::net::{IpAddr, Ipv4Addr};

/// Resolved host information: canonical name, aliases collected from CNAME
/// records in encounter order, and the address list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub host_name: Option<String>,
    pub aliases: Vec<String>,
    pub addresses: Vec<IpAddr>,
}

impl HostEntry {
    /// Synthetic entry for a literal address; no lookup was performed.
    pub fn for_literal(ip: IpAddr) -> Self {
        Self {
            host_name: Some(ip.to_string()),
            aliases: Vec::new(),
            addresses: vec![ip],
        }
    }

    /// Synthetic loopback entry returned for an empty host name.
    pub fn loopback() -> Self {
        Self {
            host_name: Some("localhost".to_string()),
            aliases: Vec::new(),
            addresses: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
        }
    }
}
