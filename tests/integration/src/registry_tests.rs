//! Remote Registry scenarios
//!
//! Exercises:
//! - Each distinct key path is opened once and closed by close_all
//! - Value data growing its buffer after ERROR_MORE_DATA
//! - Data arrays that disagree with lpcbLen
//! - Subkey and value enumeration
//! - Failed opens are not cached

mod common;

use common::*;
use msrpc::winreg::*;
use msrpc::{RpcError, Win32Error};
use msrpc_ndr::{ConformantVaryingArray, ContextHandle, NdrError, TerminatedUnicodeString};
use std::collections::HashSet;

fn utf16z(value: &str) -> Vec<u8> {
    value
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

/// Value group as the server returns it: type, data, lpcbData, lpcbLen
fn value_fields(builder: StubBuilder, value_type: u32, data: &[u8], size: u32, length: u32) -> StubBuilder {
    builder
        .unique(Some(&value_type))
        .unique(Some(&ConformantVaryingArray::with_max_count(size, data.to_vec())))
        .unique(Some(&size))
        .unique(Some(&length))
}

fn query_value_stub(value_type: u32, data: &[u8], error: Win32Error) -> bytes::Bytes {
    let size = data.len() as u32;
    value_fields(StubBuilder::new(), value_type, data, size, size)
        .u32(error.0)
        .build()
}

fn query_info_stub(sub_keys: u32, values: u32) -> bytes::Bytes {
    StubBuilder::new()
        .value(&TerminatedUnicodeString::new(""))
        .u32(sub_keys)
        .u32(32) // MaxSubKeyLen
        .u32(0) // MaxClassLen
        .u32(values)
        .u32(64) // MaxValueNameLen
        .u32(512) // MaxValueLen
        .u32(0) // SecurityDescriptor
        .value(&FileTime {
            low_date_time: 0x1234_5678,
            high_date_time: 0x01d9_0000,
        })
        .u32(0)
        .build()
}

/// lpcbData as sent in a value request
fn data_capacity_sent(stub: &[u8]) -> u32 {
    let field = &stub[stub.len() - 12..stub.len() - 8];
    u32::from_le_bytes([field[0], field[1], field[2], field[3]])
}

/// Test: Browsing two keys opens each path once; close_all releases all three handles
#[test]
fn test_each_key_opened_once() {
    init_logging();
    println!("\n=== Registry Handle Cache Test ===");

    let hklm = handle(0x71);
    let microsoft = handle(0x72);
    let system = handle(0x73);

    let transport = ScriptedTransport::new();
    transport
        .respond(handle_response(&hklm, 0))
        .respond(handle_response(&microsoft, 0))
        .respond(query_value_stub(
            value_type::REG_SZ,
            &utf16z("Windows 10 Pro"),
            Win32Error::SUCCESS,
        ))
        .respond(query_value_stub(
            value_type::REG_DWORD,
            &19045u32.to_le_bytes(),
            Win32Error::SUCCESS,
        ))
        .respond(handle_response(&system, 0))
        .respond(query_info_stub(6, 0))
        .respond(handle_response(&handle(0), 0))
        .respond(handle_response(&handle(0), 0))
        .respond(handle_response(&handle(0), 0));

    let registry = RegistryClient::new(&transport);
    let product = registry
        .query_value("HKLM\\SOFTWARE\\Microsoft", "ProductName")
        .unwrap();
    assert_eq!(product, RegistryValue::Sz("Windows 10 Pro".to_owned()));

    // Same key, different spelling: served from the cache
    let build = registry
        .query_value("hklm/software/microsoft", "CurrentBuildNumber")
        .unwrap();
    assert_eq!(build, RegistryValue::Dword(19045));

    // A sibling reuses the cached hive handle
    let info = registry.query_info("HKLM\\SYSTEM").unwrap();
    println!("HKLM\\SYSTEM: {:?}", info);
    assert_eq!(info.sub_keys, 6);
    assert_eq!(info.last_write_time.as_u64(), 0x01d9_0000_1234_5678);

    registry.close_all().unwrap();

    assert_eq!(
        transport.opnums(),
        vec![
            opnum::OPEN_LOCAL_MACHINE,
            opnum::BASE_REG_OPEN_KEY,
            opnum::BASE_REG_QUERY_VALUE,
            opnum::BASE_REG_QUERY_VALUE,
            opnum::BASE_REG_OPEN_KEY,
            opnum::BASE_REG_QUERY_INFO_KEY,
            opnum::BASE_REG_CLOSE_KEY,
            opnum::BASE_REG_CLOSE_KEY,
            opnum::BASE_REG_CLOSE_KEY,
        ]
    );

    let requests = transport.requests();
    // Subkeys are opened relative to the hive handle
    assert_eq!(&requests[1].stub[..20], hklm.as_bytes());
    assert_eq!(&requests[4].stub[..20], hklm.as_bytes());

    let closed: HashSet<ContextHandle> = requests[6..]
        .iter()
        .map(|request| ContextHandle::try_from(&request.stub[..]).unwrap())
        .collect();
    assert_eq!(closed, HashSet::from([hklm, microsoft, system]));

    // Nothing left to close
    registry.close_all().unwrap();
    assert_eq!(transport.opnums().len(), 9);
}

/// Test: ERROR_MORE_DATA retries with the size the server reported
#[test]
fn test_query_value_more_data() {
    init_logging();
    println!("\n=== Registry More Data Test ===");

    let blob: Vec<u8> = (0..2048u32).map(|i| (i % 251) as u8).collect();
    let transport = ScriptedTransport::new();
    transport
        .respond(handle_response(&handle(0x71), 0))
        .respond(handle_response(&handle(0x74), 0))
        .respond(
            value_fields(StubBuilder::new(), value_type::REG_BINARY, &[], 2048, 0)
                .u32(Win32Error::MORE_DATA.0)
                .build(),
        )
        .respond(query_value_stub(value_type::REG_BINARY, &blob, Win32Error::SUCCESS));

    let registry = RegistryClient::new(&transport);
    let value = registry
        .query_value("HKLM\\SYSTEM\\Setup", "Blob")
        .unwrap();
    assert_eq!(value, RegistryValue::Binary(blob));

    let requests = transport.requests();
    assert_eq!(data_capacity_sent(&requests[2].stub), RegistryConfig::default().initial_data_buffer);
    assert_eq!(data_capacity_sent(&requests[3].stub), 2048);
}

/// Test: A value larger than the configured ceiling is not retried
#[test]
fn test_query_value_over_ceiling() {
    init_logging();

    let config = RegistryConfig {
        max_data_buffer: 4096,
        ..Default::default()
    };
    let transport = ScriptedTransport::new();
    transport
        .respond(handle_response(&handle(0x71), 0))
        .respond(
            value_fields(StubBuilder::new(), value_type::REG_BINARY, &[], 1 << 20, 0)
                .u32(Win32Error::MORE_DATA.0)
                .build(),
        );

    let registry = RegistryClient::with_config(&transport, config);
    let err = registry.query_value("HKLM", "Huge").unwrap_err();
    assert_eq!(err.win32_error(), Some(Win32Error::MORE_DATA));
    assert_eq!(transport.opnums().len(), 2);
}

/// Test: Data whose array length disagrees with lpcbLen
#[test]
fn test_query_value_length_mismatch() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport
        .respond(handle_response(&handle(0x71), 0))
        .respond(
            value_fields(StubBuilder::new(), value_type::REG_DWORD, &[1, 0, 0, 0], 4, 3)
                .u32(0)
                .build(),
        );

    let registry = RegistryClient::new(&transport);
    let err = registry.query_value("HKLM", "Broken").unwrap_err();
    println!("Error: {}", err);
    assert!(matches!(
        err,
        RpcError::Ndr(NdrError::LengthMismatch {
            expected: 3,
            actual: 4,
            ..
        })
    ));
}

/// Test: Subkeys until ERROR_NO_MORE_ITEMS
#[test]
fn test_enum_keys() {
    init_logging();

    let key_stub = |name: &str| {
        StubBuilder::new()
            .value(&TerminatedUnicodeString::new(name))
            .referent(0)
            .unique(Some(&FileTime::default()))
            .u32(0)
            .build()
    };

    let transport = ScriptedTransport::new();
    transport
        .respond(handle_response(&handle(0x71), 0))
        .respond(handle_response(&handle(0x75), 0))
        .respond(key_stub("Microsoft"))
        .respond(key_stub("Policies"))
        .respond(
            StubBuilder::new()
                .value(&TerminatedUnicodeString::null())
                .referent(0)
                .referent(0)
                .u32(Win32Error::NO_MORE_ITEMS.0)
                .build(),
        );

    let registry = RegistryClient::new(&transport);
    let keys = registry.enum_keys("HKLM\\SOFTWARE").unwrap();
    assert_eq!(keys, vec!["Microsoft", "Policies"]);

    let indices: Vec<u32> = transport.requests()[2..]
        .iter()
        .map(|r| u32::from_le_bytes([r.stub[20], r.stub[21], r.stub[22], r.stub[23]]))
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

/// Test: Values with their decoded data
#[test]
fn test_enum_values() {
    init_logging();

    let value_stub = |name: &str, value_type: u32, data: &[u8], error: Win32Error| {
        let size = data.len() as u32;
        value_fields(
            StubBuilder::new().value(&TerminatedUnicodeString::new(name)),
            value_type,
            data,
            size,
            size,
        )
        .u32(error.0)
        .build()
    };

    let multi: Vec<u8> = utf16z("Tcpip")
        .into_iter()
        .chain(utf16z("Afd"))
        .chain([0, 0])
        .collect();

    let transport = ScriptedTransport::new();
    transport
        .respond(handle_response(&handle(0x71), 0))
        .respond(handle_response(&handle(0x76), 0))
        .respond(value_stub("Start", value_type::REG_DWORD, &2u32.to_le_bytes(), Win32Error::SUCCESS))
        .respond(value_stub("DependOnService", value_type::REG_MULTI_SZ, &multi, Win32Error::SUCCESS))
        .respond(
            value_fields(
                StubBuilder::new().value(&TerminatedUnicodeString::null()),
                value_type::REG_NONE,
                &[],
                0,
                0,
            )
            .u32(Win32Error::NO_MORE_ITEMS.0)
            .build(),
        );

    let registry = RegistryClient::new(&transport);
    let values = registry
        .enum_values("HKLM\\SYSTEM\\CurrentControlSet\\Services\\NetBT")
        .unwrap();
    assert_eq!(
        values,
        vec![
            ("Start".to_owned(), RegistryValue::Dword(2)),
            (
                "DependOnService".to_owned(),
                RegistryValue::MultiSz(vec!["Tcpip".to_owned(), "Afd".to_owned()])
            ),
        ]
    );
}

/// Test: A missing key is reported and retried on the next access
#[test]
fn test_missing_key_not_cached() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport
        .respond(handle_response(&handle(0x71), 0))
        .respond(handle_response(&handle(0), Win32Error::FILE_NOT_FOUND.0))
        .respond(handle_response(&handle(0), Win32Error::FILE_NOT_FOUND.0));

    let registry = RegistryClient::new(&transport);
    for _ in 0..2 {
        let err = registry.open_key("HKLM\\SOFTWARE\\Missing").unwrap_err();
        assert_eq!(err.win32_error(), Some(Win32Error::FILE_NOT_FOUND));
    }
    assert_eq!(
        transport.opnums(),
        vec![
            opnum::OPEN_LOCAL_MACHINE,
            opnum::BASE_REG_OPEN_KEY,
            opnum::BASE_REG_OPEN_KEY
        ]
    );

    let err = registry.open_key("SOFTWARE\\Missing").unwrap_err();
    assert!(matches!(err, RpcError::InvalidArgument(_)));
}
