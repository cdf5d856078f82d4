//! SAMR scenarios
//!
//! Exercises:
//! - Connecting and resolving a domain by name
//! - Domain handle caching and close_all
//! - Following STATUS_MORE_ENTRIES across enumeration calls
//! - A server that repeats the same enumeration context
//! - RID and name lookups with partial mapping
//! - Lookup replies that do not pair with the request
//! - Alias membership

mod common;

use common::*;
use msrpc::lsa::SidNameUse;
use msrpc::samr::*;
use msrpc::{NtStatus, RpcError};
use msrpc_ndr::{CountedArray, NdrError, RpcSid, UnicodeString};

fn rid_page(context: u32, entries: &[(u32, &str)], status: NtStatus) -> bytes::Bytes {
    let entries: Vec<RidEnumeration> = entries
        .iter()
        .map(|(relative_id, name)| RidEnumeration {
            relative_id: *relative_id,
            name: UnicodeString::new(*name),
        })
        .collect();
    let count = entries.len() as u32;
    StubBuilder::new()
        .u32(context)
        .unique(Some(&CountedArray::new(entries)))
        .u32(count)
        .u32(status.0)
        .build()
}

/// Test: Resolve a domain once, page through its users, close everything
#[test]
fn test_enumerate_users_across_pages() {
    init_logging();
    println!("\n=== Enumerate Users Across Pages Test ===");

    let server = handle(0x51);
    let domain = handle(0x52);
    let domain_sid: RpcSid = "S-1-5-21-100-200-300".parse().unwrap();

    let transport = ScriptedTransport::new();
    transport
        .respond(handle_response(&server, 0))
        .respond(StubBuilder::new().unique(Some(&domain_sid)).u32(0).build())
        .respond(handle_response(&domain, 0))
        .respond(rid_page(
            7,
            &[(500, "Administrator"), (501, "Guest")],
            NtStatus::MORE_ENTRIES,
        ))
        .respond(rid_page(0, &[(1104, "alice")], NtStatus::SUCCESS))
        .respond(handle_response(&handle(0), 0))
        .respond(handle_response(&handle(0), 0));

    let samr = SamrClient::new(&transport);
    let connected = samr
        .connect(None, access::SAM_SERVER_CONNECT | access::SAM_SERVER_LOOKUP_DOMAIN)
        .unwrap();

    let opened = samr
        .open_domain_by_name(&connected, "Builtin", access::DOMAIN_LIST_ACCOUNTS)
        .unwrap();
    assert_eq!(opened, domain);
    // Second open is served from the cache
    let again = samr
        .open_domain_by_name(&connected, "BUILTIN", access::DOMAIN_LIST_ACCOUNTS)
        .unwrap();
    assert_eq!(again, domain);

    let users = samr.enumerate_users(&opened, 0).unwrap();
    let names: Vec<&str> = users.iter().filter_map(|u| u.name.as_str()).collect();
    println!("Users: {:?}", names);
    assert_eq!(names, vec!["Administrator", "Guest", "alice"]);
    assert_eq!(users[2].relative_id, 1104);

    samr.close_all().unwrap();
    samr.close(connected).unwrap();

    assert_eq!(
        transport.opnums(),
        vec![
            opnum::CONNECT2,
            opnum::LOOKUP_DOMAIN_IN_SAM_SERVER,
            opnum::OPEN_DOMAIN,
            opnum::ENUMERATE_USERS_IN_DOMAIN,
            opnum::ENUMERATE_USERS_IN_DOMAIN,
            opnum::CLOSE_HANDLE,
            opnum::CLOSE_HANDLE,
        ]
    );

    // The second page resumes from the context the first one returned
    let requests = transport.requests();
    assert_eq!(&requests[3].stub[20..24], &0u32.to_le_bytes());
    assert_eq!(&requests[4].stub[20..24], &7u32.to_le_bytes());
    assert_eq!(&requests[5].stub[..20], domain.as_bytes());
}

/// Test: An unknown domain name is reported, not cached
#[test]
fn test_lookup_unknown_domain() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport
        .respond(
            StubBuilder::new()
                .referent(0)
                .u32(NtStatus::NO_SUCH_DOMAIN.0)
                .build(),
        )
        .respond(StubBuilder::new().referent(0).u32(0).build());

    let samr = SamrClient::new(&transport);
    let server = handle(0x51);
    let err = samr
        .open_domain_by_name(&server, "Nowhere", access::DOMAIN_LOOKUP)
        .unwrap_err();
    assert_eq!(err.nt_status(), Some(NtStatus::NO_SUCH_DOMAIN));

    // A success status with no SID is still a missing domain
    let err = samr.lookup_domain(&server, "Nowhere").unwrap_err();
    assert_eq!(err.nt_status(), Some(NtStatus::NO_SUCH_DOMAIN));

    samr.close_all().unwrap();
    assert_eq!(transport.opnums().len(), 2);
}

/// Test: Domain names across pages
#[test]
fn test_enumerate_domains() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport
        .respond(rid_page(1, &[(0, "WORKSTATION")], NtStatus::MORE_ENTRIES))
        .respond(rid_page(2, &[(0, "Builtin")], NtStatus::SUCCESS));

    let samr = SamrClient::new(&transport);
    let domains = samr.enumerate_domains(&handle(0x51)).unwrap();
    assert_eq!(domains, vec!["WORKSTATION", "Builtin"]);
}

/// Test: STATUS_MORE_ENTRIES with the same enumeration context stops the loop
#[test]
fn test_enumerate_stalled_context() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport
        .respond(rid_page(7, &[(500, "Administrator")], NtStatus::MORE_ENTRIES))
        .respond(rid_page(7, &[(501, "Guest")], NtStatus::MORE_ENTRIES))
        .respond(rid_page(0, &[(1104, "alice")], NtStatus::SUCCESS));

    let samr = SamrClient::new(&transport);
    let err = samr.enumerate_users(&handle(0x52), 0).unwrap_err();
    println!("Error: {}", err);
    assert!(matches!(err, RpcError::InvalidArgument(_)));
    assert_eq!(transport.opnums().len(), 2);
    assert_eq!(transport.pending(), 1);
}

/// Test: Partially mapped name and RID lookups
#[test]
fn test_lookup_names_and_ids() {
    init_logging();
    println!("\n=== SAMR Lookup Test ===");

    let transport = ScriptedTransport::new();
    transport
        .respond(
            StubBuilder::new()
                .value(&CountedArray::new(vec![1104u32, 0]))
                .value(&CountedArray::new(vec![1u32, 8]))
                .u32(NtStatus::SOME_NOT_MAPPED.0)
                .build(),
        )
        .respond(
            StubBuilder::new()
                .value(&CountedArray::new(vec![
                    UnicodeString::new("Administrators"),
                    UnicodeString::null(),
                ]))
                .value(&CountedArray::new(vec![4u32, 8]))
                .u32(NtStatus::SOME_NOT_MAPPED.0)
                .build(),
        );

    let samr = SamrClient::new(&transport);
    let domain = handle(0x52);

    let accounts = samr.lookup_names(&domain, &["alice", "nobody"]).unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].relative_id, 1104);
    assert_eq!(accounts[0].sid_type, SidNameUse::User);
    assert_eq!(accounts[1].sid_type, SidNameUse::Unknown);

    let accounts = samr.lookup_ids(&domain, &[544, 9999]).unwrap();
    assert_eq!(
        accounts,
        vec![DomainAccount {
            name: "Administrators".to_owned(),
            relative_id: 544,
            sid_type: SidNameUse::Alias,
        }]
    );
}

/// Test: A reply with fewer RIDs than names is rejected
#[test]
fn test_lookup_names_short_reply() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport.respond(
        StubBuilder::new()
            .value(&CountedArray::new(vec![1104u32]))
            .value(&CountedArray::new(vec![1u32]))
            .u32(NtStatus::SOME_NOT_MAPPED.0)
            .build(),
    );

    let samr = SamrClient::new(&transport);
    let err = samr
        .lookup_names(&handle(0x52), &["alice", "bob", "carol"])
        .unwrap_err();
    assert!(matches!(
        err,
        RpcError::Ndr(NdrError::LengthMismatch {
            expected: 3,
            actual: 1,
            ..
        })
    ));
}

/// Test: A reply with fewer names than RIDs is rejected
#[test]
fn test_lookup_ids_short_reply() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport.respond(
        StubBuilder::new()
            .value(&CountedArray::new(vec![UnicodeString::new("Administrators")]))
            .value(&CountedArray::new(vec![4u32, 4]))
            .u32(0)
            .build(),
    );

    let samr = SamrClient::new(&transport);
    let err = samr.lookup_ids(&handle(0x52), &[544, 545]).unwrap_err();
    assert!(matches!(
        err,
        RpcError::Ndr(NdrError::LengthMismatch {
            expected: 2,
            actual: 1,
            ..
        })
    ));
}

/// Test: A use value wider than 16 bits is reported as unrecognised
#[test]
fn test_lookup_names_wide_use() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport.respond(
        StubBuilder::new()
            .value(&CountedArray::new(vec![1104u32]))
            .value(&CountedArray::new(vec![0x1_0001u32]))
            .u32(0)
            .build(),
    );

    let samr = SamrClient::new(&transport);
    let accounts = samr.lookup_names(&handle(0x52), &["alice"]).unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].sid_type, SidNameUse::Other(u16::MAX));
}

/// Test: Too many names never reach the wire
#[test]
fn test_lookup_names_over_limit() {
    init_logging();

    let transport = ScriptedTransport::new();
    let samr = SamrClient::new(&transport);
    let names = vec!["user"; MAX_LOOKUP_COUNT + 1];
    assert!(samr.lookup_names(&handle(0x52), &names).is_err());
    assert!(transport.requests().is_empty());
}

/// Test: Open an alias and list its members
#[test]
fn test_alias_members() {
    init_logging();

    let alias = handle(0x53);
    let members: CountedArray<Option<RpcSid>> = CountedArray::new(vec![
        Some("S-1-5-21-100-200-300-500".parse().unwrap()),
        Some("S-1-5-21-100-200-300-512".parse().unwrap()),
    ]);

    let transport = ScriptedTransport::new();
    transport
        .respond(handle_response(&alias, 0))
        .respond(StubBuilder::new().value(&members).u32(0).build());

    let samr = SamrClient::new(&transport);
    let opened = samr
        .open_alias(&handle(0x52), 544, access::ALIAS_LIST_MEMBERS)
        .unwrap();
    let sids = samr.alias_members(&opened).unwrap();
    let sids: Vec<String> = sids.iter().map(ToString::to_string).collect();
    assert_eq!(sids, vec!["S-1-5-21-100-200-300-500", "S-1-5-21-100-200-300-512"]);

    let open_request = &transport.requests()[0];
    assert_eq!(open_request.opnum, opnum::OPEN_ALIAS);
    assert_eq!(&open_request.stub[24..28], &544u32.to_le_bytes());
}
