//! AT command lines and terminal-response matching.
//!
//! Replies carry no length prefix. An exchange ends when one of a small set
//! of markers shows up anywhere in the bytes received so far:
//!
//! - `"\r\nOK\r\n"`: success; the text before it is the reply payload
//! - `"\r\nERROR\r\n"`: the module rejected the command
//! - `"Unknown cmd:"` / `"Unknowncmd:"`: followed by the echoed input up to
//!   `"\r\n"` (firmware revisions disagree on the space)

#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use platform::Error;

    // ---- Matcher -------------------------------------------------------------

    #[test]
    fn ok_payload_is_the_text_before_it() {
        let m = match_window(b"junk\r\nOK\r\n", &RESPONSE_PATTERNS).unwrap();
        assert_eq!(m.disposition, Disposition::Success);
        assert_eq!(m.payload, 0..4);
        assert_eq!(m.end, 10);
    }

    #[test]
    fn error_marker_fails_without_payload() {
        let m = match_window(b"AT+X\r\n\r\nERROR\r\n", &RESPONSE_PATTERNS).unwrap();
        assert_eq!(m.disposition, Disposition::Fail);
        assert!(m.payload.is_empty());
    }

    #[test]
    fn unknown_command_captures_echo_up_to_crlf() {
        let window = b"Unknown cmd:AT+FOO\r\n";
        let m = match_window(window, &RESPONSE_PATTERNS).unwrap();
        assert_eq!(m.disposition, Disposition::Unknown);
        assert_eq!(&window[m.payload.clone()], b"AT+FOO");
        assert_eq!(m.end, window.len());

        let compact = b"Unknowncmd: AT\r\n";
        let m = match_window(compact, &RESPONSE_PATTERNS).unwrap();
        assert_eq!(&compact[m.payload], b" AT");
    }

    #[test]
    fn unknown_command_waits_for_its_delimiter() {
        assert_eq!(match_window(b"Unknown cmd:AT+FO", &RESPONSE_PATTERNS), None);
    }

    #[test]
    fn leftmost_marker_wins() {
        let m = match_window(b"\r\nERROR\r\n\r\nOK\r\n", &RESPONSE_PATTERNS).unwrap();
        assert_eq!(m.disposition, Disposition::Fail);
    }

    #[test]
    fn partial_marker_is_not_a_match() {
        assert_eq!(match_window(b"junk\r\nOK\r", &RESPONSE_PATTERNS), None);
        assert_eq!(match_window(b"", &RESPONSE_PATTERNS), None);
    }

    #[test]
    fn tail_keeps_one_byte_less_than_longest_marker() {
        assert_eq!(tail_len(&RESPONSE_PATTERNS), UNKNOWN_CMD.len() - 1);
        assert_eq!(tail_len(&GOT_IP_PATTERNS), GOT_IP.len() - 1);
        assert_eq!(tail_len(&[]), 0);
    }

    // ---- Encoding ------------------------------------------------------------

    #[test]
    fn join_command_line() {
        let cmd = AtCommand::JoinAp {
            ssid: "lab",
            password: "secret",
        }
        .encode()
        .unwrap();
        assert_eq!(cmd.as_str(), "AT+WJAP=lab,secret\r\n");
    }

    #[test]
    fn socket_command_with_and_without_host() {
        let server = AtCommand::Socket {
            kind: SocketKind::TcpServer,
            host: None,
            port: 9000,
        };
        assert_eq!(server.encode().unwrap().as_str(), "AT+SOCKET=3,9000\r\n");

        let client = AtCommand::Socket {
            kind: SocketKind::TcpClient,
            host: Some("192.168.1.2"),
            port: 80,
        };
        assert_eq!(
            client.encode().unwrap().as_str(),
            "AT+SOCKET=4,192.168.1.2,80\r\n"
        );
    }

    #[test]
    fn socket_io_command_lines() {
        let send = AtCommand::SocketSend { con_id: 1, len: 5 };
        assert_eq!(send.encode().unwrap().as_str(), "AT+SOCKETSEND=1,5\r\n");
        let read = AtCommand::SocketRead { con_id: 2 };
        assert_eq!(read.encode().unwrap().as_str(), "AT+SOCKETREAD=2\r\n");
        let del = AtCommand::SocketDelete { con_id: 3 };
        assert_eq!(del.encode().unwrap().as_str(), "AT+SOCKETDEL=3\r\n");
        let mode = AtCommand::SocketReceiveMode(ReceiveMode::Passive);
        assert_eq!(mode.encode().unwrap().as_str(), "AT+SOCKETRECVCFG=1\r\n");
    }

    #[test]
    fn oversized_command_is_overflow() {
        let long = "x".repeat(120);
        let cmd = AtCommand::JoinAp {
            ssid: &long,
            password: "pw",
        };
        assert_eq!(cmd.encode(), Err(Error::Overflow));
    }

    #[test]
    fn line_breaks_in_arguments_are_rejected() {
        let cmd = AtCommand::JoinAp {
            ssid: "lab\r\nAT+RST",
            password: "pw",
        };
        assert_eq!(cmd.encode(), Err(Error::InvalidArgument));
        let empty = AtCommand::JoinAp {
            ssid: "",
            password: "pw",
        };
        assert_eq!(empty.encode(), Err(Error::InvalidArgument));
    }
}

use core::fmt::Write as _;
use core::ops::Range;

use platform::config::AT_COMMAND_MAX_LEN;
use platform::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Markers
// ─────────────────────────────────────────────────────────────────────────────

/// Success terminator.
pub const OK: &[u8] = b"\r\nOK\r\n";
/// Rejection terminator.
pub const ERROR: &[u8] = b"\r\nERROR\r\n";
/// Unrecognised command, followed by the echoed input.
pub const UNKNOWN_CMD: &[u8] = b"Unknown cmd:";
/// Same as [`UNKNOWN_CMD`], as some firmware revisions print it.
pub const UNKNOWN_CMD_COMPACT: &[u8] = b"Unknowncmd:";
/// Asynchronous event once the access point has assigned an address.
pub const GOT_IP: &[u8] = b"+EVENT:WIFI_GOT_IP";
/// Data prompt after `AT+SOCKETSEND`.
pub const PROMPT: &[u8] = b">";
/// Delimiter ending an unknown-command echo.
const CRLF: &[u8] = b"\r\n";

/// What an exchange means once its marker is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Disposition {
    /// Terminal success. Payload is everything before the marker.
    Success,
    /// Terminal failure. No payload.
    Fail,
    /// Unrecognised command. Payload is the text after the marker up to
    /// the next `"\r\n"`; the match is only terminal once that arrives.
    Unknown,
}

/// A marker and its disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    /// Bytes to look for.
    pub marker: &'static [u8],
    /// Outcome once `marker` is found.
    pub disposition: Disposition,
}

impl Pattern {
    /// Tag `marker` with `disposition`.
    pub const fn new(marker: &'static [u8], disposition: Disposition) -> Self {
        Self {
            marker,
            disposition,
        }
    }
}

/// Terminal markers of an ordinary command, in priority order.
pub const RESPONSE_PATTERNS: [Pattern; 4] = [
    Pattern::new(OK, Disposition::Success),
    Pattern::new(ERROR, Disposition::Fail),
    Pattern::new(UNKNOWN_CMD, Disposition::Unknown),
    Pattern::new(UNKNOWN_CMD_COMPACT, Disposition::Unknown),
];

/// Markers ending the wait for an address after `AT+WJAP`.
pub const GOT_IP_PATTERNS: [Pattern; 2] = [
    Pattern::new(GOT_IP, Disposition::Success),
    Pattern::new(ERROR, Disposition::Fail),
];

/// Markers ending the wait for the `AT+SOCKETSEND` data prompt.
pub const PROMPT_PATTERNS: [Pattern; 4] = [
    Pattern::new(PROMPT, Disposition::Success),
    Pattern::new(ERROR, Disposition::Fail),
    Pattern::new(UNKNOWN_CMD, Disposition::Unknown),
    Pattern::new(UNKNOWN_CMD_COMPACT, Disposition::Unknown),
];

// ─────────────────────────────────────────────────────────────────────────────
// Matching
// ─────────────────────────────────────────────────────────────────────────────

/// A terminal marker found in the receive window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Disposition of the pattern that matched.
    pub disposition: Disposition,
    /// Window bytes the disposition designates as payload.
    pub payload: Range<usize>,
    /// Index just past the match; later bytes belong to the next exchange.
    pub end: usize,
}

/// Scan the whole window, left to right, trying `patterns` in order at each
/// position. Returns the first terminal match.
pub fn match_window(window: &[u8], patterns: &[Pattern]) -> Option<Match> {
    for start in 0..window.len() {
        let Some(rest) = window.get(start..) else {
            break;
        };
        for pattern in patterns {
            if !rest.starts_with(pattern.marker) {
                continue;
            }
            // start + marker.len() <= window.len()
            let after = start.saturating_add(pattern.marker.len());
            match pattern.disposition {
                Disposition::Success => {
                    return Some(Match {
                        disposition: Disposition::Success,
                        payload: 0..start,
                        end: after,
                    })
                }
                Disposition::Fail => {
                    return Some(Match {
                        disposition: Disposition::Fail,
                        payload: after..after,
                        end: after,
                    })
                }
                Disposition::Unknown => {
                    let echo = window.get(after..).unwrap_or_default();
                    if let Some(len) = common::parse::find(echo, CRLF) {
                        let delimiter = after.saturating_add(len);
                        return Some(Match {
                            disposition: Disposition::Unknown,
                            payload: after..delimiter,
                            end: delimiter.saturating_add(CRLF.len()),
                        });
                    }
                }
            }
        }
    }
    None
}

/// Bytes a sliding window must keep so that no marker of `patterns` can be
/// split across a slide: one less than the longest marker.
pub fn tail_len(patterns: &[Pattern]) -> usize {
    patterns
        .iter()
        .map(|p| p.marker.len())
        .max()
        .unwrap_or(0)
        .saturating_sub(1)
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// A formatted command line, `"\r\n"` included.
pub type CommandLine = heapless::String<AT_COMMAND_MAX_LEN>;

/// Socket types, as the module numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum SocketKind {
    Udp = 2,
    TcpServer = 3,
    TcpClient = 4,
}

impl SocketKind {
    /// Numeric type used in `AT+SOCKET`.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// How the module hands over received socket data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReceiveMode {
    /// Pushed as `+EVENT` lines as it arrives.
    Active = 0,
    /// Held until fetched with `AT+SOCKETREAD`.
    Passive = 1,
}

impl ReceiveMode {
    /// Numeric mode used in `AT+SOCKETRECVCFG`.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Commands the modem driver issues.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtCommand<'a> {
    /// `AT+WJAP=<ssid>,<password>`
    JoinAp { ssid: &'a str, password: &'a str },
    /// `AT+SOCKET=<kind>[,<host>],<port>`
    Socket {
        kind: SocketKind,
        host: Option<&'a str>,
        port: u16,
    },
    /// `AT+SOCKETSEND=<con_id>,<len>`; the payload follows the `>` prompt.
    SocketSend { con_id: u32, len: usize },
    /// `AT+SOCKETREAD=<con_id>`
    SocketRead { con_id: u32 },
    /// `AT+SOCKETDEL=<con_id>`
    SocketDelete { con_id: u32 },
    /// `AT+SOCKETRECVCFG=<mode>`
    SocketReceiveMode(ReceiveMode),
}

impl AtCommand<'_> {
    /// Format the command line.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an empty SSID/host or an argument
    /// containing a line break; [`Error::Overflow`] if the line does not
    /// fit in [`AT_COMMAND_MAX_LEN`] bytes.
    pub fn encode(&self) -> Result<CommandLine> {
        let mut line = CommandLine::new();
        let written = match *self {
            AtCommand::JoinAp { ssid, password } => {
                check_argument(ssid)?;
                check_text(password)?;
                write!(line, "AT+WJAP={ssid},{password}\r\n")
            }
            AtCommand::Socket {
                kind,
                host: Some(host),
                port,
            } => {
                check_argument(host)?;
                write!(line, "AT+SOCKET={},{host},{port}\r\n", kind.code())
            }
            AtCommand::Socket {
                kind,
                host: None,
                port,
            } => write!(line, "AT+SOCKET={},{port}\r\n", kind.code()),
            AtCommand::SocketSend { con_id, len } => {
                write!(line, "AT+SOCKETSEND={con_id},{len}\r\n")
            }
            AtCommand::SocketRead { con_id } => write!(line, "AT+SOCKETREAD={con_id}\r\n"),
            AtCommand::SocketDelete { con_id } => write!(line, "AT+SOCKETDEL={con_id}\r\n"),
            AtCommand::SocketReceiveMode(mode) => {
                write!(line, "AT+SOCKETRECVCFG={}\r\n", mode.code())
            }
        };
        written.map_err(|_| Error::Overflow)?;
        Ok(line)
    }
}

fn check_argument(text: &str) -> Result<()> {
    if text.is_empty() {
        return Err(Error::InvalidArgument);
    }
    check_text(text)
}

// A line break would end the command early and start another one.
fn check_text(text: &str) -> Result<()> {
    if text.bytes().any(|b| b == b'\r' || b == b'\n') {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}
