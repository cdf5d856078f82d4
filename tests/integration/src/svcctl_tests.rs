//! Service Control Manager scenarios
//!
//! Exercises:
//! - Status and configuration queries through the open/close helpers
//! - QUERY_SERVICE_CONFIGW buffer negotiation
//! - Start and stop
//! - Handles are released when the query itself fails

mod common;

use common::*;
use msrpc::svcctl::*;
use msrpc::{RpcError, Win32Error};
use msrpc_ndr::WString;

fn status_stub(current_state: u32, error: Win32Error) -> bytes::Bytes {
    let status = ServiceStatus {
        service_type: 0x10,
        current_state,
        controls_accepted: 0x5,
        ..Default::default()
    };
    StubBuilder::new().value(&status).u32(error.0).build()
}

/// Test: service_status opens the SCM and the service, then closes both
#[test]
fn test_service_status() {
    init_logging();
    println!("\n=== Service Status Test ===");

    let scm = handle(0x61);
    let service = handle(0x62);
    let transport = ScriptedTransport::new();
    transport
        .respond(handle_response(&scm, 0))
        .respond(handle_response(&service, 0))
        .respond(status_stub(state::RUNNING, Win32Error::SUCCESS))
        .respond(handle_response(&handle(0), 0))
        .respond(handle_response(&handle(0), 0));

    let svcctl = ServiceControlClient::new(&transport);
    let status = svcctl.service_status("Spooler").unwrap();
    println!("Spooler: {:?}", status);
    assert!(status.is_running());

    assert_eq!(
        transport.opnums(),
        vec![
            opnum::OPEN_SC_MANAGER_W,
            opnum::OPEN_SERVICE_W,
            opnum::QUERY_SERVICE_STATUS,
            opnum::CLOSE_SERVICE_HANDLE,
            opnum::CLOSE_SERVICE_HANDLE,
        ]
    );
    let requests = transport.requests();
    assert_eq!(&requests[3].stub[..], service.as_bytes());
    assert_eq!(&requests[4].stub[..], scm.as_bytes());
}

/// Test: Both handles are closed even when the query fails
#[test]
fn test_service_status_failure_still_closes() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport
        .respond(handle_response(&handle(0x61), 0))
        .respond(handle_response(&handle(0x62), 0))
        .respond(status_stub(0, Win32Error::ACCESS_DENIED))
        .respond(handle_response(&handle(0), 0))
        .respond(handle_response(&handle(0), 0));

    let svcctl = ServiceControlClient::new(&transport);
    let err = svcctl.service_status("Spooler").unwrap_err();
    assert!(matches!(
        err,
        RpcError::Win32 {
            operation: "RQueryServiceStatus",
            error: Win32Error::ACCESS_DENIED
        }
    ));
    assert_eq!(transport.opnums().len(), 5);
    assert_eq!(transport.pending(), 0);
}

/// Test: A missing service closes only the SCM handle
#[test]
fn test_open_missing_service() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport
        .respond(handle_response(&handle(0x61), 0))
        .respond(handle_response(&handle(0), Win32Error::SERVICE_DOES_NOT_EXIST.0))
        .respond(handle_response(&handle(0), 0));

    let svcctl = ServiceControlClient::new(&transport);
    let err = svcctl.service_config("NoSuchService").unwrap_err();
    assert_eq!(err.win32_error(), Some(Win32Error::SERVICE_DOES_NOT_EXIST));
    assert_eq!(
        transport.opnums(),
        vec![
            opnum::OPEN_SC_MANAGER_W,
            opnum::OPEN_SERVICE_W,
            opnum::CLOSE_SERVICE_HANDLE
        ]
    );
}

/// Test: The configuration query retries with the size the server asks for
#[test]
fn test_query_config_buffer_negotiation() {
    init_logging();
    println!("\n=== Query Service Config Test ===");

    let config = ServiceConfig {
        service_type: 0x10,
        start_type: 2,
        error_control: 1,
        binary_path_name: Some(WString::from("C:\\Windows\\System32\\spoolsv.exe")),
        load_order_group: Some(WString::from("SpoolerGroup")),
        tag_id: 0,
        dependencies: Some(WString::from("RPCSS/http")),
        service_start_name: Some(WString::from("LocalSystem")),
        display_name: Some(WString::from("Print Spooler")),
    };

    let transport = ScriptedTransport::new();
    transport
        .respond(
            StubBuilder::new()
                .value(&ServiceConfig::default())
                .u32(436)
                .u32(Win32Error::INSUFFICIENT_BUFFER.0)
                .build(),
        )
        .respond(StubBuilder::new().value(&config).u32(436).u32(0).build());

    let svcctl = ServiceControlClient::new(&transport);
    let decoded = svcctl.query_config(&handle(0x62)).unwrap();
    assert_eq!(decoded.display_name, "Print Spooler");
    assert_eq!(decoded.binary_path_name, "C:\\Windows\\System32\\spoolsv.exe");
    assert_eq!(decoded.dependencies, vec!["RPCSS", "http"]);
    assert_eq!(decoded.start_type, 2);

    let requests = transport.requests();
    assert_eq!(&requests[0].stub[20..24], &0u32.to_le_bytes());
    assert_eq!(&requests[1].stub[20..24], &436u32.to_le_bytes());
}

/// Test: A buffer request beyond the ceiling is not retried
#[test]
fn test_query_config_buffer_ceiling() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport.respond(
        StubBuilder::new()
            .value(&ServiceConfig::default())
            .u32(MAX_CONFIG_BUFFER + 1)
            .u32(Win32Error::INSUFFICIENT_BUFFER.0)
            .build(),
    );

    let svcctl = ServiceControlClient::new(&transport);
    let err = svcctl.query_config(&handle(0x62)).unwrap_err();
    assert_eq!(err.win32_error(), Some(Win32Error::INSUFFICIENT_BUFFER));
    assert_eq!(transport.opnums().len(), 1);
}

/// Test: Start with arguments, then stop
#[test]
fn test_start_and_stop() {
    init_logging();

    let transport = ScriptedTransport::new();
    transport
        .respond(StubBuilder::new().u32(0).build())
        .respond(status_stub(state::STOP_PENDING, Win32Error::SUCCESS))
        .respond(StubBuilder::new().u32(Win32Error::SERVICE_ALREADY_RUNNING.0).build());

    let svcctl = ServiceControlClient::new(&transport);
    let service = handle(0x62);
    svcctl.start(&service, &["--verbose"]).unwrap();

    let status = svcctl.stop(&service).unwrap();
    assert_eq!(status.current_state, state::STOP_PENDING);

    let err = svcctl.start(&service, &[]).unwrap_err();
    assert_eq!(err.win32_error(), Some(Win32Error::SERVICE_ALREADY_RUNNING));

    let requests = transport.requests();
    assert_eq!(requests[0].opnum, opnum::START_SERVICE_W);
    assert_eq!(&requests[0].stub[20..24], &1u32.to_le_bytes());
    assert_eq!(requests[1].opnum, opnum::CONTROL_SERVICE);
    assert_eq!(&requests[1].stub[20..24], &control::STOP.to_le_bytes());
    // No arguments: argc 0 and a null argv
    assert_eq!(&requests[2].stub[20..], &[0u8; 8]);
}
