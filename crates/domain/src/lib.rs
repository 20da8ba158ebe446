//! nameq domain layer
pub mod config;
pub mod errors;
pub mod host_entry;
pub mod record_type;

pub use config::ResolverConfig;
pub use errors::ResolveError;
pub use host_entry::HostEntry;
pub use record_type::RecordType;
