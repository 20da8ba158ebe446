//! Stub DNS resolver: forwards queries to an upstream recursive server over
//! a single connected UDP socket, correlating replies by transaction ID.
mod harvest;
mod pending;
mod resolver;
mod reverse;

pub use nameq_domain::{HostEntry, ResolveError, ResolverConfig};
pub use resolver::StubResolver;
