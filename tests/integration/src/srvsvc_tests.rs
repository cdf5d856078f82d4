//! Server Service scenarios
//!
//! Exercises:
//! - Share enumeration across ERROR_MORE_DATA pages
//! - A server that stops advancing the resume handle
//! - Single-share and server information at the detailed levels
//! - Responses at a level other than the requested one

mod common;

use common::*;
use msrpc::srvsvc::*;
use msrpc::{RpcError, Win32Error};
use msrpc_ndr::{CountedArray, NdrError, WString};

fn share1(name: &str, share_type: u32, remark: &str) -> ShareInfo1 {
    ShareInfo1 {
        netname: Some(WString::from(name)),
        share_type,
        remark: Some(WString::from(remark)),
    }
}

fn enum_page(shares: Vec<ShareInfo1>, total: u32, resume: u32, error: Win32Error) -> bytes::Bytes {
    StubBuilder::new()
        .value(&ShareEnum::Level1(Some(CountedArray::new(shares))))
        .u32(total)
        .unique(Some(&resume))
        .u32(error.0)
        .build()
}

fn resume_handle_sent(stub: &[u8]) -> u32 {
    let tail = &stub[stub.len() - 4..];
    u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]])
}

/// Test: Two pages of level 1 shares
#[test]
fn test_enumerate_shares_across_pages() {
    init_logging();
    println!("\n=== Share Enumeration Test ===");

    let transport = ScriptedTransport::new();
    transport
        .respond(enum_page(
            vec![
                share1("ADMIN$", share_type::DISKTREE | share_type::SPECIAL, "Remote Admin"),
                share1("C$", share_type::DISKTREE | share_type::SPECIAL, "Default share"),
            ],
            3,
            2,
            Win32Error::MORE_DATA,
        ))
        .respond(enum_page(
            vec![share1("IPC$", share_type::IPC | share_type::SPECIAL, "Remote IPC")],
            3,
            3,
            Win32Error::SUCCESS,
        ));

    let srvsvc = ServerServiceClient::new(&transport).with_server_name("\\\\FILESRV");
    let shares = srvsvc.enumerate_shares(ShareLevel::Level1).unwrap();
    let names: Vec<&str> = shares.iter().filter_map(ShareInfo::netname).collect();
    println!("Shares: {:?}", names);
    assert_eq!(names, vec!["ADMIN$", "C$", "IPC$"]);
    assert_eq!(
        shares[2].share_type().map(|t| t & share_type::TYPE_MASK),
        Some(share_type::IPC)
    );

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.opnum == opnum::SHARE_ENUM));
    assert_eq!(resume_handle_sent(&requests[0].stub), 0);
    assert_eq!(resume_handle_sent(&requests[1].stub), 2);
}

/// Test: ERROR_MORE_DATA with the same resume handle stops the loop
#[test]
fn test_enumerate_shares_stalled_resume_handle() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport
        .respond(enum_page(vec![share1("A", 0, "")], 5, 1, Win32Error::MORE_DATA))
        .respond(enum_page(vec![share1("B", 0, "")], 5, 1, Win32Error::MORE_DATA));

    let srvsvc = ServerServiceClient::new(&transport);
    let err = srvsvc.enumerate_shares(ShareLevel::Level1).unwrap_err();
    assert!(matches!(err, RpcError::InvalidArgument(_)));
    assert_eq!(transport.opnums().len(), 2);
}

/// Test: A container at the wrong level is rejected
#[test]
fn test_enumerate_shares_wrong_level() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport.respond(
        StubBuilder::new()
            .value(&ShareEnum::Level2(Some(CountedArray::new(vec![ShareInfo2::default()]))))
            .u32(1)
            .unique(Some(&0u32))
            .u32(0)
            .build(),
    );

    let srvsvc = ServerServiceClient::new(&transport);
    let err = srvsvc.enumerate_shares(ShareLevel::Level1).unwrap_err();
    assert!(matches!(
        err,
        RpcError::Ndr(NdrError::UnexpectedTag {
            expected: 1,
            actual: 2
        })
    ));
}

/// Test: Level 0 names only
#[test]
fn test_share_names() {
    init_logging();

    let shares: Vec<ShareInfo0> = ["print$", "public"]
        .iter()
        .map(|name| ShareInfo0 {
            netname: Some(WString::from(*name)),
        })
        .collect();
    let transport = ScriptedTransport::new();
    transport.respond(
        StubBuilder::new()
            .value(&ShareEnum::Level0(Some(CountedArray::new(shares))))
            .u32(2)
            .unique(Some(&0u32))
            .u32(0)
            .build(),
    );

    let srvsvc = ServerServiceClient::new(&transport);
    assert_eq!(srvsvc.share_names().unwrap(), vec!["print$", "public"]);
}

/// Test: NetrShareGetInfo at level 2
#[test]
fn test_share_info() {
    init_logging();
    println!("\n=== Share Info Test ===");

    let info = ShareInfo2 {
        netname: Some(WString::from("public")),
        share_type: share_type::DISKTREE,
        remark: Some(WString::from("Shared files")),
        permissions: 0,
        max_uses: u32::MAX,
        current_uses: 4,
        path: Some(WString::from("D:\\Public")),
        passwd: None,
    };
    let transport = ScriptedTransport::new();
    transport
        .respond(
            StubBuilder::new()
                .u32(2)
                .referent(0x0002_0000)
                .value(&info)
                .u32(0)
                .build(),
        )
        .respond(
            StubBuilder::new()
                .u32(2)
                .referent(0)
                .u32(Win32Error::FILE_NOT_FOUND.0)
                .build(),
        );

    let srvsvc = ServerServiceClient::new(&transport);
    let share = srvsvc.share_info("public", ShareLevel::Level2).unwrap();
    assert_eq!(share, ShareInfo::Level2(info));

    let err = srvsvc.share_info("missing", ShareLevel::Level2).unwrap_err();
    assert_eq!(err.win32_error(), Some(Win32Error::FILE_NOT_FOUND));
}

/// Test: NetrServerGetInfo at level 101
#[test]
fn test_server_info() {
    init_logging();

    let info = ServerInfo101 {
        platform_id: 500,
        name: Some(WString::from("FILESRV")),
        version_major: 10,
        version_minor: 0,
        server_type: 0x0000_9003,
        comment: Some(WString::from("")),
    };
    let transport = ScriptedTransport::new();
    transport.respond(
        StubBuilder::new()
            .u32(101)
            .referent(0x0002_0000)
            .value(&info)
            .u32(0)
            .build(),
    );

    let srvsvc = ServerServiceClient::new(&transport);
    let server = srvsvc.server_info(ServerLevel::Level101).unwrap();
    assert_eq!(server.name(), Some("FILESRV"));
    assert_eq!(server.platform_id(), 500);
    assert_eq!(transport.opnums(), vec![opnum::SERVER_GET_INFO]);
}
