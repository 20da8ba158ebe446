//! Reverse-lookup probe names for literal addresses.

use std::net::IpAddr;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Builds the PTR probe name for `ip`: reversed dotted octets under
/// `in-addr.arpa` for IPv4, reversed nibbles under `ip6.arpa` for IPv6.
pub(crate) fn reverse_name(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, d] = v4.octets();
            format!("{d}.{c}.{b}.{a}.in-addr.arpa")
        }
        IpAddr::V6(v6) => {
            let mut name = String::with_capacity(72);
            for byte in v6.octets().iter().rev() {
                name.push(HEX[(byte & 0x0f) as usize] as char);
                name.push('.');
                name.push(HEX[(byte >> 4) as usize] as char);
                name.push('.');
            }
            name.push_str("ip6.arpa");
            name
        }
    }
}
