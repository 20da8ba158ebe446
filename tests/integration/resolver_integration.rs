//! End-to-end tests of the stub resolver against a mock UDP upstream.

mod support;

use nameq_domain::ResolveError;
use nameq_proto::Header;
use nameq_resolver::StubResolver;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Mutex;
use support::{question_of, reply, Answer, MockUpstream};

#[tokio::test]
async fn forward_lookup_harvests_addresses() {
    let upstream = MockUpstream::spawn(|query| {
        vec![reply(
            query,
            0,
            &[
                Answer::A(Ipv4Addr::new(93, 184, 216, 34)),
                Answer::Aaaa("2606:2800:220:1:248:1893:25c8:1946".parse().unwrap()),
            ],
        )]
    })
    .await;
    let resolver = StubResolver::connect(&upstream.config(2000)).await.unwrap();

    let addresses = resolver.get_host_addresses("example.com").await.unwrap();
    assert_eq!(
        addresses,
        vec![
            IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)),
            "2606:2800:220:1:248:1893:25c8:1946".parse().unwrap(),
        ]
    );
    assert_eq!(upstream.datagrams_received(), 1);
}

#[tokio::test]
async fn literal_address_resolves_without_datagrams() {
    let upstream = MockUpstream::spawn(|_| Vec::new()).await;
    let resolver = StubResolver::connect(&upstream.config(2000)).await.unwrap();

    let addresses = resolver.get_host_addresses("127.0.0.1").await.unwrap();
    assert_eq!(addresses, vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]);

    let v6 = resolver.get_host_addresses("::1").await.unwrap();
    assert_eq!(v6, vec!["::1".parse::<IpAddr>().unwrap()]);

    assert_eq!(upstream.datagrams_received(), 0);
}

#[tokio::test]
async fn empty_name_is_loopback() {
    let upstream = MockUpstream::spawn(|_| Vec::new()).await;
    let resolver = StubResolver::connect(&upstream.config(2000)).await.unwrap();

    let addresses = resolver.get_host_addresses("").await.unwrap();
    assert_eq!(addresses, vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]);

    let entry = resolver.get_host_entry("").await.unwrap();
    assert_eq!(entry.host_name.as_deref(), Some("localhost"));
    assert_eq!(entry.addresses, vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]);

    assert_eq!(upstream.datagrams_received(), 0);
}

#[tokio::test]
async fn overlong_name_is_rejected_up_front() {
    let upstream = MockUpstream::spawn(|_| Vec::new()).await;
    let resolver = StubResolver::connect(&upstream.config(2000)).await.unwrap();

    let name = "a".repeat(300);
    assert!(matches!(
        resolver.get_host_addresses(&name).await,
        Err(ResolveError::InvalidHostName(_))
    ));
    assert!(matches!(
        resolver.get_host_entry(&name).await,
        Err(ResolveError::InvalidHostName(_))
    ));
    assert_eq!(upstream.datagrams_received(), 0);
}

#[tokio::test]
async fn unanswered_query_sends_exactly_two_datagrams() {
    let upstream = MockUpstream::spawn(|_| Vec::new()).await;
    let resolver = StubResolver::connect(&upstream.config(100)).await.unwrap();

    let result = resolver.get_host_addresses("example.com").await;
    assert!(matches!(result, Err(ResolveError::Timeout)));

    // Initial datagram plus the single retry, nothing more.
    assert_eq!(upstream.datagrams_received(), 2);
}

#[tokio::test]
async fn retry_reuses_the_transaction_id() {
    let ids = std::sync::Arc::new(Mutex::new(Vec::new()));
    let seen = std::sync::Arc::clone(&ids);
    let upstream = MockUpstream::spawn(move |query| {
        seen.lock().unwrap().push(Header::peek_id(query).unwrap());
        Vec::new()
    })
    .await;
    let resolver = StubResolver::connect(&upstream.config(100)).await.unwrap();

    let _ = resolver.get_host_addresses("example.com").await;
    let ids = ids.lock().unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], ids[1]);
}

#[tokio::test]
async fn nxdomain_is_a_name_error() {
    let upstream = MockUpstream::spawn(|query| vec![reply(query, 3, &[])]).await;
    let resolver = StubResolver::connect(&upstream.config(2000)).await.unwrap();

    assert!(matches!(
        resolver.get_host_addresses("nope.example.com").await,
        Err(ResolveError::NameError(_))
    ));
}

#[tokio::test]
async fn empty_answer_section_is_a_name_error() {
    let upstream = MockUpstream::spawn(|query| vec![reply(query, 0, &[])]).await;
    let resolver = StubResolver::connect(&upstream.config(2000)).await.unwrap();

    assert!(matches!(
        resolver.get_host_addresses("example.com").await,
        Err(ResolveError::NameError(_))
    ));
}

#[tokio::test]
async fn failed_ptr_probe_still_yields_the_literal_entry() {
    let upstream = MockUpstream::spawn(|query| vec![reply(query, 3, &[])]).await;
    let resolver = StubResolver::connect(&upstream.config(2000)).await.unwrap();

    let entry = resolver.get_host_entry("8.8.8.8").await.unwrap();
    assert_eq!(entry.host_name.as_deref(), Some("8.8.8.8"));
    assert!(entry.aliases.is_empty());
    assert_eq!(entry.addresses, vec!["8.8.8.8".parse::<IpAddr>().unwrap()]);

    // Only the PTR probe went out; no forward phase without a name.
    assert_eq!(upstream.datagrams_received(), 1);
}

#[tokio::test]
async fn ptr_probe_chains_into_forward_lookup() {
    let questions = std::sync::Arc::new(Mutex::new(Vec::new()));
    let seen = std::sync::Arc::clone(&questions);
    let upstream = MockUpstream::spawn(move |query| {
        let (name, qtype) = question_of(query);
        seen.lock().unwrap().push((name, qtype));
        match qtype {
            12 => vec![reply(query, 0, &[Answer::Ptr("dns.google")])],
            1 => vec![reply(query, 0, &[Answer::A(Ipv4Addr::new(8, 8, 8, 8))])],
            _ => Vec::new(),
        }
    })
    .await;
    let resolver = StubResolver::connect(&upstream.config(2000)).await.unwrap();

    let entry = resolver.get_host_entry("8.8.8.8").await.unwrap();
    assert_eq!(entry.host_name.as_deref(), Some("dns.google"));
    assert_eq!(entry.addresses, vec!["8.8.8.8".parse::<IpAddr>().unwrap()]);

    let questions = questions.lock().unwrap();
    assert_eq!(
        questions[0],
        ("8.8.8.8.in-addr.arpa".to_string(), 12),
        "first phase is the reverse probe"
    );
    assert_eq!(questions[1], ("dns.google".to_string(), 1));
}

#[tokio::test]
async fn cname_targets_become_aliases() {
    let upstream = MockUpstream::spawn(|query| {
        vec![reply(
            query,
            0,
            &[
                Answer::Cname("example.com"),
                Answer::A(Ipv4Addr::new(192, 0, 2, 1)),
            ],
        )]
    })
    .await;
    let resolver = StubResolver::connect(&upstream.config(2000)).await.unwrap();

    let entry = resolver.get_host_entry("www.example.com").await.unwrap();
    assert_eq!(entry.host_name.as_deref(), Some("www.example.com"));
    assert_eq!(entry.aliases, vec!["example.com"]);
    assert_eq!(
        entry.addresses,
        vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1))]
    );
}

#[tokio::test]
async fn concurrent_queries_never_share_a_transaction_id() {
    let ids = std::sync::Arc::new(Mutex::new(Vec::new()));
    let seen = std::sync::Arc::clone(&ids);
    // Never answer, so all queries stay pending together.
    let upstream = MockUpstream::spawn(move |query| {
        seen.lock().unwrap().push(Header::peek_id(query).unwrap());
        Vec::new()
    })
    .await;
    let resolver = std::sync::Arc::new(StubResolver::connect(&upstream.config(150)).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..8 {
        let resolver = std::sync::Arc::clone(&resolver);
        handles.push(tokio::spawn(async move {
            resolver
                .get_host_addresses(&format!("host{i}.example.com"))
                .await
        }));
    }
    for handle in handles {
        assert!(matches!(
            handle.await.unwrap(),
            Err(ResolveError::Timeout)
        ));
    }

    let ids = ids.lock().unwrap();
    let distinct: HashSet<u16> = ids.iter().copied().collect();
    assert_eq!(distinct.len(), 8, "eight in-flight queries, eight ids");
}

#[tokio::test]
async fn stray_and_undersized_datagrams_are_ignored() {
    let upstream = MockUpstream::spawn(|query| {
        let good = reply(query, 0, &[Answer::A(Ipv4Addr::new(10, 1, 2, 3))]);
        let mut stray = good.clone();
        let stray_id = Header::peek_id(&stray).unwrap() ^ 0x5555;
        Header::patch_id(&mut stray, stray_id);
        // Stray id first, then a runt, then the real reply.
        vec![stray, vec![0u8; 12], good]
    })
    .await;
    let resolver = StubResolver::connect(&upstream.config(2000)).await.unwrap();

    let addresses = resolver.get_host_addresses("example.com").await.unwrap();
    assert_eq!(addresses, vec![IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3))]);
}

#[tokio::test]
async fn close_halts_resolution() {
    let upstream = MockUpstream::spawn(|query| vec![reply(query, 0, &[])]).await;
    let resolver = StubResolver::connect(&upstream.config(100)).await.unwrap();

    resolver.close();
    // The receive loop is gone, so even an answering upstream cannot
    // complete the query.
    assert!(matches!(
        resolver.get_host_addresses("example.com").await,
        Err(ResolveError::Timeout)
    ));
}
