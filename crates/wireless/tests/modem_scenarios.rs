//! End-to-end modem scenarios against a scripted serial link.
//!
//! Simulated time advances 100 µs per tick read, so multi-second waits stay
//! cheap while keeping their ordering.

// Test files legitimately use unwrap() and slicing for readable assertions.
#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]

use common::{Node, Registry};
use platform::mocks::{ScriptedTransport, SimClock, SimTimer};
use platform::Error;
use wireless::{Modem, ModemConfig, ModemName, ReceiveMode, SocketKind};

type TestModem = Modem<ScriptedTransport, SimTimer>;

const CONNECTED: &[u8] = b"\r\nconnect success ConID=3\r\n\r\nOK\r\n";

fn modem(clock: &SimClock, script: impl FnOnce(&mut ScriptedTransport)) -> TestModem {
    modem_with(clock, ModemConfig::default(), script)
}

fn modem_with(clock: &SimClock, config: ModemConfig, script: impl FnOnce(&mut ScriptedTransport)) -> TestModem {
    let mut transport = ScriptedTransport::with_chunk(clock.clone(), 8);
    script(&mut transport);
    let mut modem = Modem::with_config(
        ModemName::WifiBluetooth1,
        transport,
        SimTimer::new(clock.clone()),
        config,
    );
    modem.init().unwrap();
    modem
}

// ---- Wi-Fi join ---------------------------------------------------------------

#[test]
fn join_returns_only_after_address_event() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |t| {
        t.on_command(
            b"AT+WJAP",
            &[(0, b"\r\nOK\r\n"), (2_000_000, b"+EVENT:WIFI_GOT_IP\r\n")],
        );
    });

    modem.join_wifi_ap("lab", "secret").unwrap();

    assert!(clock.now_us() >= 2_000_000, "returned before the address event");
    assert_eq!(modem.transport().sent(), b"AT+WJAP=lab,secret\r\n");
}

#[test]
fn join_acknowledged_without_address_times_out() {
    let clock = SimClock::with_step(100);
    let config = ModemConfig {
        join_timeout_ms: 200,
        ..ModemConfig::default()
    };
    let mut modem = modem_with(&clock, config, |t| {
        t.on_command(b"AT+WJAP", &[(0, b"\r\nOK\r\n")]);
    });

    assert_eq!(modem.join_wifi_ap("lab", "secret"), Err(Error::TimedOut));
}

#[test]
fn join_refused_is_protocol_error() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |t| {
        t.on_command(b"AT+WJAP", &[(0, b"\r\nERROR\r\n")]);
    });

    assert_eq!(modem.join_wifi_ap("lab", "wrong"), Err(Error::Protocol));
}

// ---- Raw commands -------------------------------------------------------------

#[test]
fn raw_command_reply_and_truncation() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |t| {
        t.on_command(b"AT+GMR", &[(0, b"version 1.2.3\r\nOK\r\n")]);
    });

    let mut out = [0u8; 32];
    let reply = modem.send_command(b"AT+GMR\r\n", 1000, &mut out).unwrap();
    assert_eq!(&out[..reply.len], b"version 1.2.3");
    assert!(!reply.truncated);

    let mut small = [0u8; 7];
    let reply = modem.send_command(b"AT+GMR\r\n", 1000, &mut small).unwrap();
    assert_eq!(reply.len, 7);
    assert!(reply.truncated);
    assert_eq!(&small, b"version");
}

#[test]
fn unknown_command_is_protocol_error() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |t| {
        t.on_command(b"AT+NOPE", &[(0, b"Unknowncmd:AT+NOPE\r\n")]);
    });

    let mut out = [0u8; 16];
    assert_eq!(
        modem.send_command(b"AT+NOPE\r\n", 1000, &mut out),
        Err(Error::Protocol)
    );
}

#[test]
fn silent_module_times_out() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |_| {});
    assert_eq!(
        modem.send_command(b"AT\r\n", 50, &mut []),
        Err(Error::TimedOut)
    );
}

// ---- Sockets ------------------------------------------------------------------

#[test]
fn socket_lifecycle() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |t| {
        t.on_command(b"AT+SOCKET=", &[(0, CONNECTED)]);
        t.on_command(b"AT+SOCKETSEND=3,5", &[(0, b"\r\n>")]);
        t.on_command(b"hello", &[(300, b"\r\nSEND OK\r\n\r\nOK\r\n")]);
        t.on_command(b"AT+SOCKETREAD=3", &[(0, b"+SOCKETREAD:3,5,world\r\nOK\r\n")]);
        t.on_command(b"AT+SOCKETDEL=3", &[(0, b"\r\nOK\r\n")]);
    });

    let con_id = modem
        .create_socket_connection(SocketKind::TcpServer, None, 9000)
        .unwrap();
    assert_eq!(con_id, 3);
    assert_eq!(modem.connections().find(9000), Some(3));

    modem.socket_send(9000, b"hello").unwrap();

    let mut buf = [0u8; 16];
    let n = modem.socket_read(9000, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"world");

    modem.delete_socket_connection(9000).unwrap();
    assert_eq!(modem.connections().find(9000), None);

    let sent: Vec<&[u8]> = modem.transport().transmits().iter().map(Vec::as_slice).collect();
    assert_eq!(
        sent,
        vec![
            &b"AT+SOCKET=3,9000\r\n"[..],
            b"AT+SOCKETSEND=3,5\r\n",
            b"hello",
            b"AT+SOCKETREAD=3\r\n",
            b"AT+SOCKETDEL=3\r\n",
        ]
    );
}

#[test]
fn client_socket_names_its_host() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |t| {
        t.on_command(b"AT+SOCKET=", &[(0, CONNECTED)]);
    });

    modem
        .create_socket_connection(SocketKind::TcpClient, Some("10.0.0.7"), 8080)
        .unwrap();
    assert_eq!(modem.transport().sent(), b"AT+SOCKET=4,10.0.0.7,8080\r\n");
}

#[test]
fn duplicate_port_is_rejected_before_any_io() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |t| {
        t.on_command(b"AT+SOCKET=", &[(0, CONNECTED)]);
    });

    modem
        .create_socket_connection(SocketKind::Udp, Some("10.0.0.1"), 5000)
        .unwrap();
    assert_eq!(
        modem.create_socket_connection(SocketKind::Udp, Some("10.0.0.1"), 5000),
        Err(Error::AlreadyExists)
    );
    assert_eq!(modem.transport().transmits().len(), 1);
}

#[test]
fn full_table_is_rejected_before_any_io() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |t| {
        t.on_command(b"AT+SOCKET=", &[(0, CONNECTED)]);
    });

    for port in 1..=10 {
        modem
            .create_socket_connection(SocketKind::TcpServer, None, port)
            .unwrap();
    }
    assert_eq!(
        modem.create_socket_connection(SocketKind::TcpServer, None, 11),
        Err(Error::Overflow)
    );
    assert_eq!(modem.transport().transmits().len(), 10);
}

#[test]
fn connect_reply_without_con_id_is_protocol_error() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |t| {
        t.on_command(b"AT+SOCKET=", &[(0, b"\r\nconnect success\r\n\r\nOK\r\n")]);
    });

    assert_eq!(
        modem.create_socket_connection(SocketKind::TcpServer, None, 9000),
        Err(Error::Protocol)
    );
    assert!(modem.connections().is_empty());
}

#[test]
fn unknown_port_is_not_connected() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |_| {});

    let mut buf = [0u8; 4];
    assert_eq!(modem.socket_send(1, b"x"), Err(Error::NotConnected));
    assert_eq!(modem.socket_read(1, &mut buf), Err(Error::NotConnected));
    assert_eq!(modem.delete_socket_connection(1), Err(Error::NotConnected));
    assert!(modem.transport().sent().is_empty());
}

#[test]
fn empty_payload_is_invalid() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |_| {});
    assert_eq!(modem.socket_send(1, b""), Err(Error::InvalidArgument));
}

#[test]
fn oversized_read_fills_buffer_and_overflows() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |t| {
        t.on_command(b"AT+SOCKET=", &[(0, CONNECTED)]);
        t.on_command(b"AT+SOCKETREAD=3", &[(0, b"+SOCKETREAD:3,5,world\r\nOK\r\n")]);
    });
    modem
        .create_socket_connection(SocketKind::TcpServer, None, 9000)
        .unwrap();

    let mut buf = [0u8; 3];
    assert_eq!(modem.socket_read(9000, &mut buf), Err(Error::Overflow));
    assert_eq!(&buf, b"wor");
}

#[test]
fn read_is_bounded_by_the_reply_buffer() {
    let clock = SimClock::with_step(100);
    let mut reply = b"+SOCKETREAD:3,300,".to_vec();
    reply.extend(std::iter::repeat(b'x').take(300));
    reply.extend_from_slice(b"\r\nOK\r\n");
    let mut modem = modem(&clock, |t| {
        t.on_command(b"AT+SOCKET=", &[(0, CONNECTED)]);
        t.on_command(b"AT+SOCKETREAD=3", &[(0, reply.as_slice())]);
    });
    modem
        .create_socket_connection(SocketKind::TcpServer, None, 9000)
        .unwrap();

    let mut buf = [0u8; 512];
    assert_eq!(modem.socket_read(9000, &mut buf), Err(Error::Overflow));

    // 256-byte capture minus the 18-byte header
    assert!(buf[..238].iter().all(|&b| b == b'x'));
    assert_eq!(buf[238], 0);
}

#[test]
fn read_reply_for_another_connection_is_protocol_error() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |t| {
        t.on_command(b"AT+SOCKET=", &[(0, CONNECTED)]);
        t.on_command(b"AT+SOCKETREAD=3", &[(0, b"+SOCKETREAD:4,2,hi\r\nOK\r\n")]);
    });
    modem
        .create_socket_connection(SocketKind::TcpServer, None, 9000)
        .unwrap();

    let mut buf = [0u8; 8];
    assert_eq!(modem.socket_read(9000, &mut buf), Err(Error::Protocol));
}

#[test]
fn receive_mode_command() {
    let clock = SimClock::with_step(100);
    let mut modem = modem(&clock, |t| {
        t.on_command(b"AT+SOCKETRECVCFG", &[(0, b"\r\nOK\r\n")]);
    });

    modem.set_socket_receive_mode(ReceiveMode::Passive).unwrap();
    assert_eq!(modem.transport().sent(), b"AT+SOCKETRECVCFG=1\r\n");
}

// ---- Registry -----------------------------------------------------------------

#[test]
fn modem_is_found_by_name() {
    let clock = SimClock::with_step(100);
    let modem = modem(&clock, |_| {});

    let node = Node::new(&modem);
    let registry: Registry<'_, ModemName, TestModem> = Registry::new();
    registry.register(&node).unwrap();

    let found = registry.find_by_name(ModemName::WifiBluetooth1).unwrap();
    assert!(core::ptr::eq(found, &modem));
}
