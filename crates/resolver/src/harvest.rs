//! Answer-section digest for one query phase.
//!
//! Replaces the classic mutable reused result object: each phase of a
//! lookup produces a fresh `Harvest`, so nothing is shared between
//! concurrent operations.

use nameq_proto::{Record, RecordData};
use smallvec::SmallVec;
use std::net::IpAddr;

#[derive(Debug, Clone, Default)]
pub(crate) struct Harvest {
    pub addresses: SmallVec<[IpAddr; 4]>,
    pub aliases: Vec<String>,
    pub host_name: Option<String>,
}

/// Walks the answer records in order: A/AAAA become addresses, CNAME
/// targets become aliases in encounter order, and the first PTR target is
/// taken as the resolved host name, ending the walk. CNAME chains are never
/// chased with further queries; the upstream server is assumed to have
/// flattened them.
pub(crate) fn harvest_answers(records: &[Record]) -> Harvest {
    let mut harvest = Harvest::default();
    for record in records {
        match &record.data {
            RecordData::A(v4) => harvest.addresses.push(IpAddr::V4(*v4)),
            RecordData::Aaaa(v6) => harvest.addresses.push(IpAddr::V6(*v6)),
            RecordData::Cname(target) => harvest.aliases.push(target.clone()),
            RecordData::Ptr(target) => {
                // Aliases collected before the PTR stay in the result.
                harvest.host_name = Some(target.clone());
                break;
            }
            RecordData::Other(_) => {}
        }
    }
    harvest
}
