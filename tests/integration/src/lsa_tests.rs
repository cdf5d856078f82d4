//! LSA scenarios
//!
//! Exercises:
//! - Policy open/close round trip
//! - Enumerating the accounts holding a privilege, with and without a buffer
//! - Name translation against a referenced domain list
//! - Translation replies with the wrong number of entries
//! - Union tag mismatches and NTSTATUS failures surfacing as typed errors

mod common;

use common::*;
use msrpc::lsa::*;
use msrpc::{call, NtStatus, RpcError};
use msrpc_ndr::{CountedArray, NdrError, RpcSid, UnicodeString};

/// Test: Open a policy, enumerate SeBackupPrivilege holders, close
#[test]
fn test_enumerate_accounts_with_user_right() {
    init_logging();
    println!("\n=== Enumerate Accounts With User Right Test ===");

    let policy = handle(0x11);
    let transport = ScriptedTransport::new();
    transport
        .respond(handle_response(&policy, 0))
        .respond(
            StubBuilder::new()
                .u32(2) // EntriesRead
                .referent(0x0002_0000)
                .u32(2) // MaximumCount
                .referent(0x0002_0004)
                .referent(0x0002_0008)
                .sid(5, &[32, 551])
                .sid(5, &[21, 1, 2, 3, 500])
                .u32(0)
                .build(),
        )
        .respond(handle_response(&handle(0), 0));

    let lsa = LsaClient::new(&transport);
    let opened = lsa
        .open_policy(None, access::POLICY_LOOKUP_NAMES | access::POLICY_VIEW_LOCAL_INFORMATION)
        .unwrap();
    assert_eq!(opened, policy);

    let sids = lsa
        .enumerate_accounts_with_user_right(&opened, "SeBackupPrivilege")
        .unwrap();
    let sids: Vec<String> = sids.iter().map(ToString::to_string).collect();
    println!("Holders: {:?}", sids);
    assert_eq!(sids, vec!["S-1-5-32-551", "S-1-5-21-1-2-3-500"]);

    lsa.close(opened).unwrap();

    assert_eq!(
        transport.opnums(),
        vec![
            opnum::OPEN_POLICY2,
            opnum::ENUMERATE_ACCOUNTS_WITH_USER_RIGHT,
            opnum::CLOSE
        ]
    );

    // Handle, unique RPC_UNICODE_STRING, then the 17 characters deferred
    let request = &transport.requests()[1];
    assert_eq!(request.stub.len(), 78);
    assert_eq!(&request.stub[..20], policy.as_bytes());
    assert_eq!(&request.stub[24..28], &[34, 0, 34, 0]);
    let tail: Vec<u16> = request.stub[44..]
        .chunks(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    assert_eq!(String::from_utf16(&tail).unwrap(), "SeBackupPrivilege");
    assert_eq!(transport.pending(), 0);
}

/// Test: A null account buffer is an empty list, not an error
#[test]
fn test_enumerate_accounts_empty_buffer() {
    init_logging();
    println!("\n=== Enumerate Accounts Empty Buffer Test ===");

    let empty = StubBuilder::new().u32(0).referent(0).u32(0).build();
    let transport = ScriptedTransport::new();
    transport.respond(empty.clone()).respond(empty);

    let request = LsarEnumerateAccountsWithUserRight {
        policy: handle(0x22),
        user_right: Some("SeTcbPrivilege".to_owned()),
    };
    let response = call(&transport, &request).unwrap();
    assert_eq!(response.accounts, None);
    assert_eq!(response.status, NtStatus::SUCCESS);

    let lsa = LsaClient::new(&transport);
    let sids = lsa
        .enumerate_accounts_with_user_right(&handle(0x22), "SeTcbPrivilege")
        .unwrap();
    assert!(sids.is_empty());
}

/// Test: STATUS_NO_MORE_ENTRIES means nobody holds the right
#[test]
fn test_enumerate_accounts_no_more_entries() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport.respond(
        StubBuilder::new()
            .u32(0)
            .referent(0)
            .u32(NtStatus::NO_MORE_ENTRIES.0)
            .build(),
    );

    let lsa = LsaClient::new(&transport);
    let sids = lsa
        .enumerate_accounts_with_user_right(&handle(0x22), "SeDebugPrivilege")
        .unwrap();
    assert!(sids.is_empty());
}

/// Test: Translating names, one of which does not map
#[test]
fn test_lookup_names_partially_mapped() {
    init_logging();
    println!("\n=== Lookup Names Test ===");

    let domain_sid: RpcSid = "S-1-5-21-1-2-3".parse().unwrap();
    let domains = ReferencedDomainList {
        domains: CountedArray::new(vec![TrustInformation {
            name: UnicodeString::new("CORP"),
            sid: Some(domain_sid.clone()),
        }]),
        max_entries: 32,
    };
    let translated = CountedArray::new(vec![
        TranslatedSid {
            sid_type: SidNameUse::User,
            relative_id: 1104,
            domain_index: 0,
        },
        TranslatedSid {
            sid_type: SidNameUse::Unknown,
            relative_id: 0,
            domain_index: -1,
        },
    ]);

    let transport = ScriptedTransport::new();
    transport.respond(
        StubBuilder::new()
            .unique(Some(&domains))
            .value(&translated)
            .u32(1) // MappedCount
            .u32(NtStatus::SOME_NOT_MAPPED.0)
            .build(),
    );

    let lsa = LsaClient::new(&transport);
    let results = lsa.lookup_names(&handle(0x11), &["alice", "nobody"]).unwrap();
    assert_eq!(results.len(), 2);

    assert_eq!(results[0].name, "alice");
    assert_eq!(results[0].sid_type, SidNameUse::User);
    assert_eq!(results[0].domain.as_deref(), Some("CORP"));
    assert_eq!(results[0].sid, Some(domain_sid.with_rid(1104).unwrap()));

    assert_eq!(results[1].name, "nobody");
    assert_eq!(results[1].sid, None);
    assert_eq!(results[1].domain, None);
}

/// Test: Fewer translated SIDs than names is rejected
#[test]
fn test_lookup_names_short_reply() {
    init_logging();

    let translated = CountedArray::new(vec![TranslatedSid {
        sid_type: SidNameUse::User,
        relative_id: 1104,
        domain_index: -1,
    }]);
    let transport = ScriptedTransport::new();
    transport.respond(
        StubBuilder::new()
            .referent(0)
            .value(&translated)
            .u32(1) // MappedCount
            .u32(NtStatus::SOME_NOT_MAPPED.0)
            .build(),
    );

    let lsa = LsaClient::new(&transport);
    let err = lsa.lookup_names(&handle(0x11), &["alice", "bob"]).unwrap_err();
    println!("Error: {}", err);
    assert!(matches!(
        err,
        RpcError::Ndr(NdrError::LengthMismatch {
            expected: 2,
            actual: 1,
            ..
        })
    ));
}

/// Test: More translated names than SIDs is rejected
#[test]
fn test_lookup_sids_long_reply() {
    init_logging();

    let name = |value: &str| TranslatedName {
        sid_type: SidNameUse::User,
        name: UnicodeString::new(value),
        domain_index: -1,
    };
    let transport = ScriptedTransport::new();
    transport.respond(
        StubBuilder::new()
            .referent(0)
            .value(&CountedArray::new(vec![name("alice"), name("bob")]))
            .u32(2) // MappedCount
            .u32(0)
            .build(),
    );

    let lsa = LsaClient::new(&transport);
    let sid: RpcSid = "S-1-5-21-1-2-3-1104".parse().unwrap();
    let err = lsa.lookup_sids(&handle(0x11), &[sid]).unwrap_err();
    assert!(matches!(
        err,
        RpcError::Ndr(NdrError::LengthMismatch {
            expected: 1,
            actual: 2,
            ..
        })
    ));
}

/// Test: STATUS_NONE_MAPPED fails the whole lookup
#[test]
fn test_lookup_names_none_mapped() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport.respond(
        StubBuilder::new()
            .referent(0)
            .value(&CountedArray::<TranslatedSid>::null())
            .u32(0)
            .u32(NtStatus::NONE_MAPPED.0)
            .build(),
    );

    let lsa = LsaClient::new(&transport);
    let err = lsa.lookup_names(&handle(0x11), &["ghost"]).unwrap_err();
    assert_eq!(err.nt_status(), Some(NtStatus::NONE_MAPPED));
}

/// Test: A union arm other than the one requested is a decode error
#[test]
fn test_query_information_wrong_tag() {
    init_logging();
    println!("\n=== Query Information Wrong Tag Test ===");

    let transport = ScriptedTransport::new();
    transport.respond(
        StubBuilder::new()
            .referent(0x0002_0000)
            .u16(PolicyInformationClass::PrimaryDomain.value())
            .build(),
    );

    let lsa = LsaClient::new(&transport);
    let err = lsa.account_domain(&handle(0x11)).unwrap_err();
    println!("Error: {}", err);
    assert!(matches!(
        err,
        RpcError::Ndr(NdrError::UnexpectedTag {
            expected: 5,
            actual: 3
        })
    ));
}

/// Test: Account domain name and SID
#[test]
fn test_account_domain() {
    init_logging();

    let info = DomainInfo {
        name: UnicodeString::new("WORKSTATION"),
        sid: Some("S-1-5-21-10-20-30".parse().unwrap()),
    };
    let transport = ScriptedTransport::new();
    transport.respond(
        StubBuilder::new()
            .referent(0x0002_0000)
            .u16(PolicyInformationClass::AccountDomain.value())
            .value(&info)
            .u32(0)
            .build(),
    );

    let lsa = LsaClient::new(&transport);
    let domain = lsa.account_domain(&handle(0x11)).unwrap().unwrap();
    assert_eq!(domain, info);
}

/// Test: STATUS_ACCESS_DENIED from LsarOpenPolicy2
#[test]
fn test_open_policy_access_denied() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport.respond(handle_response(&handle(0), NtStatus::ACCESS_DENIED.0));

    let lsa = LsaClient::new(&transport);
    let err = lsa.open_policy(Some("\\\\dc01"), access::MAXIMUM_ALLOWED).unwrap_err();
    assert!(matches!(
        err,
        RpcError::NtStatus {
            operation: "LsarOpenPolicy2",
            status: NtStatus::ACCESS_DENIED
        }
    ));
}

/// Test: A dropped connection surfaces as a transport error
#[test]
fn test_transport_failure() {
    init_logging();

    let transport = ScriptedTransport::new();
    let lsa = LsaClient::new(&transport);
    let err = lsa.close(handle(0x11)).unwrap_err();
    assert!(matches!(err, RpcError::Transport(_)));
}
