//! The resolver engine: one connected UDP socket, a perpetual receive loop,
//! and a retry/timeout state machine per query.

use crate::harvest::{harvest_answers, Harvest};
use crate::pending::PendingTable;
use crate::reverse::reverse_name;
use nameq_domain::{HostEntry, RecordType, ResolveError, ResolverConfig};
use nameq_proto::name::MAX_NAME_LEN;
use nameq_proto::{build_query, Header, Response, CLASS_IN};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// A reply must carry at least a full header and one more byte.
const MIN_DATAGRAM_LEN: usize = 13;

/// Receive buffer size; covers EDNS-sized UDP responses.
const MAX_DATAGRAM_LEN: usize = 4096;

/// One resend of the identical datagram after the first deadline expires.
const MAX_RETRIES: u32 = 1;

/// Stub resolver over a single upstream recursive server.
///
/// Every lookup either completes without touching the network (literal
/// addresses, the empty name) or sends a query on the shared socket and is
/// completed by the receive loop. Dropping the resolver (or calling
/// [`close`](Self::close)) halts the receive loop; operations still in
/// flight then finish with [`ResolveError::Timeout`].
pub struct StubResolver {
    shared: Arc<Shared>,
    recv_task: JoinHandle<()>,
}

struct Shared {
    socket: UdpSocket,
    server: SocketAddr,
    timeout: Duration,
    pending: PendingTable,
}

impl StubResolver {
    /// Binds an ephemeral UDP socket, connects it to the first configured
    /// upstream server and starts the receive loop.
    pub async fn connect(config: &ResolverConfig) -> Result<Self, ResolveError> {
        let server = *config
            .servers
            .first()
            .ok_or_else(|| ResolveError::Config("no upstream servers configured".into()))?;
        let bind_addr = if server.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(server).await?;
        debug!(server = %server, "stub resolver connected");

        let shared = Arc::new(Shared {
            socket,
            server,
            timeout: config.query_timeout(),
            pending: PendingTable::new(),
        });
        let recv_task = tokio::spawn(recv_loop(Arc::clone(&shared)));
        Ok(Self { shared, recv_task })
    }

    /// Stops the receive loop. No further lookups will complete.
    pub fn close(&self) {
        self.recv_task.abort();
    }

    /// Resolves `name` to its addresses.
    ///
    /// The empty name yields the loopback address and a literal IP yields
    /// itself, both without sending a datagram; anything else is an A query
    /// against the upstream.
    pub async fn get_host_addresses(&self, name: &str) -> Result<Vec<IpAddr>, ResolveError> {
        if name.len() > MAX_NAME_LEN {
            return Err(ResolveError::InvalidHostName(name.into()));
        }
        if name.is_empty() {
            return Ok(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]);
        }
        if let Ok(ip) = name.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }
        let harvest = self.lookup(name, RecordType::A).await?;
        Ok(harvest.addresses.into_vec())
    }

    /// Resolves `name` to a full host entry (canonical name, aliases,
    /// addresses). A literal IP triggers a reverse lookup first.
    pub async fn get_host_entry(&self, name: &str) -> Result<HostEntry, ResolveError> {
        if name.len() > MAX_NAME_LEN {
            return Err(ResolveError::InvalidHostName(name.into()));
        }
        if name.is_empty() {
            return Ok(HostEntry::loopback());
        }
        if let Ok(ip) = name.parse::<IpAddr>() {
            return self.reverse_then_forward(ip).await;
        }
        let harvest = self.lookup(name, RecordType::A).await?;
        Ok(HostEntry {
            host_name: Some(harvest.host_name.unwrap_or_else(|| name.to_string())),
            aliases: harvest.aliases,
            addresses: harvest.addresses.into_vec(),
        })
    }

    /// PTR probe for a literal address, chained into a forward query for
    /// whatever name the reverse zone reports. A rejected or empty probe is
    /// not fatal: the address itself is already known.
    async fn reverse_then_forward(&self, ip: IpAddr) -> Result<HostEntry, ResolveError> {
        let probe = reverse_name(ip);
        let discovered = match self.lookup(&probe, RecordType::PTR).await {
            Ok(harvest) => harvest.host_name,
            Err(e) if e.is_ptr_recoverable() => {
                debug!(address = %ip, error = %e, "ptr probe yielded no name");
                None
            }
            Err(e) => return Err(e),
        };

        let Some(host) = discovered else {
            return Ok(HostEntry::for_literal(ip));
        };

        let forward = self.lookup(&host, RecordType::A).await?;
        let mut addresses = vec![ip];
        addresses.extend(forward.addresses.into_iter().filter(|a| *a != ip));
        Ok(HostEntry {
            host_name: Some(host),
            aliases: forward.aliases,
            addresses,
        })
    }

    /// One validated query/response cycle against the upstream.
    async fn lookup(&self, name: &str, rtype: RecordType) -> Result<Harvest, ResolveError> {
        debug!(name, record_type = %rtype, "lookup");
        let query = build_query(name, rtype, CLASS_IN)
            .map_err(|e| ResolveError::InvalidHostName(format!("{name}: {e}")))?;

        let (from, mut response) = self.exchange(query).await?;
        validate_response(
            &mut response,
            from,
            self.shared.server,
            rtype.to_u16(),
            CLASS_IN,
        )?;

        let rcode = response.header().rcode();
        if rcode != 0 {
            return Err(ResolveError::NameError(format!(
                "server returned rcode {rcode}"
            )));
        }
        let answers = response
            .answers()
            .map_err(|e| ResolveError::Malformed(e.to_string()))?;
        if answers.is_empty() {
            return Err(ResolveError::NameError(
                "no answer records in response".into(),
            ));
        }
        Ok(harvest_answers(answers))
    }

    /// Sends a query and waits for its correlated reply, resending the
    /// identical datagram once, under the same transaction ID, when the
    /// deadline expires.
    async fn exchange(&self, mut query: Vec<u8>) -> Result<(SocketAddr, Response), ResolveError> {
        let (tx, mut rx) = oneshot::channel();
        let id = self.shared.pending.register(tx)?;
        Header::patch_id(&mut query, id);

        let mut attempt = 0u32;
        loop {
            if let Err(e) = self.shared.socket.send(&query).await {
                self.shared.pending.remove(id);
                return Err(e.into());
            }
            trace!(id, attempt, bytes = query.len(), "query datagram sent");

            match tokio::time::timeout(self.shared.timeout, &mut rx).await {
                Ok(Ok((from, bytes))) => return parse_reply(from, bytes),
                // The sender can only disappear unanswered while the
                // resolver is tearing down.
                Ok(Err(_)) => return Err(ResolveError::Timeout),
                Err(_) => {
                    attempt += 1;
                    if attempt <= MAX_RETRIES {
                        debug!(id, attempt, "query deadline expired, resending");
                        continue;
                    }
                    if !self.shared.pending.remove(id) {
                        // The receive loop won the race; its reply is
                        // already in the channel.
                        if let Ok((from, bytes)) = rx.try_recv() {
                            return parse_reply(from, bytes);
                        }
                    }
                    debug!(id, "query timed out after retry");
                    return Err(ResolveError::Timeout);
                }
            }
        }
    }
}

impl Drop for StubResolver {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

fn parse_reply(from: SocketAddr, bytes: Vec<u8>) -> Result<(SocketAddr, Response), ResolveError> {
    let response = Response::parse(bytes).map_err(|e| ResolveError::Malformed(e.to_string()))?;
    Ok((from, response))
}

/// Perpetual receive loop. Kept deliberately thin: match the transaction ID,
/// hand the datagram to the waiting operation, re-arm. Harvesting happens on
/// the waiter's task so a slow consumer cannot stall unrelated replies.
async fn recv_loop(shared: Arc<Shared>) {
    let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
    loop {
        let (len, from) = match shared.socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!(error = %e, "receive loop terminating");
                break;
            }
        };
        if len < MIN_DATAGRAM_LEN {
            trace!(len, "undersized datagram dropped");
            continue;
        }
        let Some(id) = Header::peek_id(&buf[..len]) else {
            continue;
        };
        // Unmatched IDs are dropped silently: stray and spoofed replies are
        // expected traffic, not errors.
        if !shared.pending.complete(id, from, buf[..len].to_vec()) {
            trace!(id, %from, "datagram with unknown transaction id dropped");
        }
    }
}

/// Checks everything that must hold before a reply may be harvested. The
/// question name is deliberately not byte-compared; servers may normalize
/// case or the trailing dot.
fn validate_response(
    response: &mut Response,
    from: SocketAddr,
    server: SocketAddr,
    qtype: u16,
    qclass: u16,
) -> Result<(), ResolveError> {
    if from != server {
        return Err(ResolveError::ResponseHeader(format!(
            "reply from unexpected endpoint {from}, expected {server}"
        )));
    }
    let header = *response.header();
    if !header.is_response() {
        return Err(ResolveError::ResponseHeader(
            "reply does not have the response bit set".into(),
        ));
    }
    if header.qdcount != 1 {
        return Err(ResolveError::ResponseHeader(format!(
            "expected one question, found {}",
            header.qdcount
        )));
    }
    let questions = response
        .questions()
        .map_err(|e| ResolveError::Malformed(e.to_string()))?;
    let Some(question) = questions.first() else {
        return Err(ResolveError::ResponseHeader(
            "question section missing".into(),
        ));
    };
    if question.qtype != qtype || question.qclass != qclass {
        return Err(ResolveError::ResponseHeader(format!(
            "question {}/{} does not match query {}/{}",
            question.qtype, question.qclass, qtype, qclass
        )));
    }
    Ok(())
}
