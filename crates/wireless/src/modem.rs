//! Wi-Fi/Bluetooth module on a serial link.
//!
//! Every operation is one or more [`Session`] exchanges. Socket operations
//! take the caller's port and resolve it to the module's ConID through the
//! [`ConnectionTable`].
//!
//! | Operation | Command | Waits for |
//! |-----------|---------|-----------|
//! | [`Modem::join_wifi_ap`] | `AT+WJAP` | `OK`, then `+EVENT:WIFI_GOT_IP` |
//! | [`Modem::create_socket_connection`] | `AT+SOCKET` | `ConID=<n>` … `OK` |
//! | [`Modem::socket_send`] | `AT+SOCKETSEND` | `>`, payload, `OK` |
//! | [`Modem::socket_read`] | `AT+SOCKETREAD` | `+SOCKETREAD:<id>,<len>,<data>` … `OK` |
//! | [`Modem::delete_socket_connection`] | `AT+SOCKETDEL` | `OK` |
//! | [`Modem::set_socket_receive_mode`] | `AT+SOCKETRECVCFG` | `OK` |

use common::parse::{find, parse_u32};
use common::registry::Named;
use platform::config::{
    AT_COMMAND_TIMEOUT_MS, AT_REPLY_BUFFER_SIZE, AT_SOCKET_CONNECT_TIMEOUT_MS,
    AT_WIFI_JOIN_TIMEOUT_MS,
};
use platform::{CounterTimer, Error, Result, Transport};

use crate::at::{
    AtCommand, Disposition, Pattern, ReceiveMode, SocketKind, GOT_IP_PATTERNS, PROMPT_PATTERNS,
    RESPONSE_PATTERNS,
};
use crate::connections::ConnectionTable;
use crate::session::{printable, Session};
use crate::window::{OutputSink, OverflowPolicy};

const CON_ID_FIELD: &[u8] = b"ConID=";
const SOCKET_READ_HEADER: &[u8] = b"+SOCKETREAD:";

/// Wireless modules on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModemName {
    /// Wi-Fi/Bluetooth co-processor.
    WifiBluetooth1,
}

/// Runtime-tunable deadlines and window behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModemConfig {
    /// Deadline for an ordinary command's terminal response.
    pub command_timeout_ms: u32,
    /// Deadline for `+EVENT:WIFI_GOT_IP` once the join is acknowledged.
    pub join_timeout_ms: u32,
    /// Deadline for a socket connect to answer.
    pub connect_timeout_ms: u32,
    /// Receive window behaviour when it fills without a marker.
    pub overflow_policy: OverflowPolicy,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: AT_COMMAND_TIMEOUT_MS,
            join_timeout_ms: AT_WIFI_JOIN_TIMEOUT_MS,
            connect_timeout_ms: AT_SOCKET_CONNECT_TIMEOUT_MS,
            overflow_policy: OverflowPolicy::Slide,
        }
    }
}

/// Payload captured by a successful command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reply {
    /// Bytes written to the caller's buffer.
    pub len: usize,
    /// Some reply text did not fit the caller's buffer.
    pub truncated: bool,
}

/// The module, its serial link and its millisecond tick.
pub struct Modem<Tr, T> {
    name: ModemName,
    transport: Tr,
    clock: T,
    connections: ConnectionTable,
    config: ModemConfig,
}

impl<Tr, T> Modem<Tr, T>
where
    Tr: Transport,
    T: CounterTimer,
{
    /// Modem with the default [`ModemConfig`].
    pub fn new(name: ModemName, transport: Tr, clock: T) -> Self {
        Self::with_config(name, transport, clock, ModemConfig::default())
    }

    /// Modem on `transport`, timed by the millisecond `clock`.
    pub fn with_config(name: ModemName, transport: Tr, clock: T, config: ModemConfig) -> Self {
        Self {
            name,
            transport,
            clock,
            connections: ConnectionTable::new(),
            config,
        }
    }

    /// Start the millisecond tick if needed and drop any pending input.
    pub fn init(&mut self) -> Result<()> {
        if !self.clock.is_running()? {
            self.clock.set_period_us(1000)?;
            self.clock.start()?;
        }
        self.transport.clear_receive_buffer()?;
        platform::info!("modem ready");
        Ok(())
    }

    /// Send a raw command line and wait for its terminal response.
    ///
    /// Text received before `OK` is copied into `out`.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] on `ERROR` or `Unknown cmd`;
    /// [`Error::TimedOut`] if nothing terminal arrives in `timeout_ms`;
    /// [`Error::Overflow`] if the window fills under
    /// [`OverflowPolicy::Reject`].
    pub fn send_command(&mut self, command: &[u8], timeout_ms: u32, out: &mut [u8]) -> Result<Reply> {
        self.exchange(command, &RESPONSE_PATTERNS, timeout_ms, out)
    }

    /// Join an access point and wait until it assigns an address.
    pub fn join_wifi_ap(&mut self, ssid: &str, password: &str) -> Result<()> {
        let command = AtCommand::JoinAp { ssid, password }.encode()?;
        let config = self.config;
        let mut session = self.session();
        session.send(command.as_bytes())?;

        let mut sink = OutputSink::discard();
        accept(session.wait_for(&RESPONSE_PATTERNS, config.command_timeout_ms, &mut sink)?)?;
        platform::debug!("join accepted, waiting for address");
        accept(session.wait_for(&GOT_IP_PATTERNS, config.join_timeout_ms, &mut sink)?)?;

        platform::info!("joined access point {}", ssid);
        Ok(())
    }

    /// Open a socket and remember which ConID serves `port`.
    ///
    /// `host` is the remote address for clients and UDP; servers pass
    /// `None`.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyExists`] or [`Error::Overflow`] from the connection
    /// table, before anything is sent; [`Error::Protocol`] if the module
    /// refuses or its reply has no `ConID=`.
    pub fn create_socket_connection(&mut self, kind: SocketKind, host: Option<&str>, port: u16) -> Result<u32> {
        if self.connections.contains(port) {
            return Err(Error::AlreadyExists);
        }
        if self.connections.is_full() {
            return Err(Error::Overflow);
        }

        let command = AtCommand::Socket { kind, host, port }.encode()?;
        let mut reply = [0u8; AT_REPLY_BUFFER_SIZE];
        let timeout = self.config.connect_timeout_ms;
        let Reply { len, .. } = self.exchange(command.as_bytes(), &RESPONSE_PATTERNS, timeout, &mut reply)?;
        let text = reply.get(..len).unwrap_or_default();

        let con_id = find(text, CON_ID_FIELD)
            .and_then(|at| text.get(at.saturating_add(CON_ID_FIELD.len())..))
            .and_then(|field| parse_u32(field).ok())
            .map(|(id, _)| id)
            .ok_or_else(|| {
                platform::warn!("no ConID in connect reply: {}", printable(text));
                Error::Protocol
            })?;

        self.connections.add(port, con_id)?;
        platform::info!("socket on port {} is ConID {}", port, con_id);
        Ok(con_id)
    }

    /// Send `data` on the socket opened for `port`.
    pub fn socket_send(&mut self, port: u16, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let con_id = self.con_id(port)?;
        let command = AtCommand::SocketSend {
            con_id,
            len: data.len(),
        }
        .encode()?;
        let config = self.config;
        let mut session = self.session();
        session.send(command.as_bytes())?;

        let mut sink = OutputSink::discard();
        accept(session.wait_for(&PROMPT_PATTERNS, config.command_timeout_ms, &mut sink)?)?;
        session.write(data)?;
        accept(session.wait_for(&RESPONSE_PATTERNS, config.command_timeout_ms, &mut sink)?)?;

        platform::debug!("sent {} bytes on ConID {}", data.len(), con_id);
        Ok(())
    }

    /// Fetch pending data of the socket opened for `port` into `out`.
    ///
    /// Returns the payload length.
    ///
    /// The reply is captured in an [`AT_REPLY_BUFFER_SIZE`]-byte buffer
    /// before parsing, so one call delivers at most that many bytes minus
    /// the `+SOCKETREAD:<id>,<len>,` header, however large `out` is.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] for an unknown port; [`Error::Protocol`] for
    /// a malformed reply or one for another ConID; [`Error::Overflow`] when
    /// the payload is longer than `out` or than the reply buffer (`out`
    /// then holds the bytes that fitted).
    pub fn socket_read(&mut self, port: u16, out: &mut [u8]) -> Result<usize> {
        let con_id = self.con_id(port)?;
        let command = AtCommand::SocketRead { con_id }.encode()?;
        let mut reply = [0u8; AT_REPLY_BUFFER_SIZE];
        let timeout = self.config.command_timeout_ms;
        let status = self.exchange(command.as_bytes(), &RESPONSE_PATTERNS, timeout, &mut reply)?;
        let text = reply.get(..status.len).unwrap_or_default();

        let (id, len, data) = parse_socket_read(text)?;
        if id != con_id {
            platform::warn!("read reply for ConID {}, expected {}", id, con_id);
            return Err(Error::Protocol);
        }
        let payload = match data.get(..len) {
            Some(payload) => payload,
            // Cut off by our reply buffer; hand over what arrived.
            None if status.truncated => data,
            None => return Err(Error::Protocol),
        };

        let copied = payload.len().min(out.len());
        if let (Some(dst), Some(src)) = (out.get_mut(..copied), payload.get(..copied)) {
            dst.copy_from_slice(src);
        }
        if copied < len {
            return Err(Error::Overflow);
        }
        Ok(copied)
    }

    /// Close the socket opened for `port` and forget its row.
    pub fn delete_socket_connection(&mut self, port: u16) -> Result<()> {
        let con_id = self.con_id(port)?;
        let command = AtCommand::SocketDelete { con_id }.encode()?;
        let timeout = self.config.command_timeout_ms;
        self.exchange(command.as_bytes(), &RESPONSE_PATTERNS, timeout, &mut [])?;
        self.connections.delete(port);
        platform::info!("closed socket on port {}", port);
        Ok(())
    }

    /// Choose how the module delivers received socket data.
    pub fn set_socket_receive_mode(&mut self, mode: ReceiveMode) -> Result<()> {
        let command = AtCommand::SocketReceiveMode(mode).encode()?;
        let timeout = self.config.command_timeout_ms;
        self.exchange(command.as_bytes(), &RESPONSE_PATTERNS, timeout, &mut [])?;
        Ok(())
    }

    /// Open sockets.
    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    /// Active deadlines and window policy.
    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// The serial link.
    pub fn transport(&self) -> &Tr {
        &self.transport
    }

    /// Give back the serial link and the tick.
    pub fn release(self) -> (Tr, T) {
        (self.transport, self.clock)
    }

    fn session(&mut self) -> Session<'_, Tr, T> {
        Session::new(&mut self.transport, &self.clock, self.config.overflow_policy)
    }

    /// Single command, single terminal response.
    fn exchange(&mut self, command: &[u8], patterns: &[Pattern], timeout_ms: u32, out: &mut [u8]) -> Result<Reply> {
        let mut session = self.session();
        session.send(command)?;
        let mut sink = OutputSink::new(out);
        accept(session.wait_for(patterns, timeout_ms, &mut sink)?)?;
        Ok(Reply {
            len: sink.len(),
            truncated: sink.truncated(),
        })
    }

    fn con_id(&self, port: u16) -> Result<u32> {
        self.connections.find(port).ok_or(Error::NotConnected)
    }
}

impl<Tr, T> Named for Modem<Tr, T> {
    type Name = ModemName;

    fn name(&self) -> ModemName {
        self.name
    }
}

fn accept(disposition: Disposition) -> Result<()> {
    match disposition {
        Disposition::Success => Ok(()),
        Disposition::Fail => {
            platform::debug!("at << ERROR");
            Err(Error::Protocol)
        }
        Disposition::Unknown => Err(Error::Protocol),
    }
}

/// Split `+SOCKETREAD:<id>,<len>,<data>` into its fields.
fn parse_socket_read(text: &[u8]) -> Result<(u32, usize, &[u8])> {
    let header = find(text, SOCKET_READ_HEADER).ok_or(Error::Protocol)?;
    let fields = text
        .get(header.saturating_add(SOCKET_READ_HEADER.len())..)
        .unwrap_or_default();

    let (id, end) = parse_u32(fields).map_err(|_| Error::Protocol)?;
    let fields = after_comma(fields, end)?;
    let (len, end) = parse_u32(fields).map_err(|_| Error::Protocol)?;
    let data = after_comma(fields, end)?;

    let len = usize::try_from(len).map_err(|_| Error::Protocol)?;
    Ok((id, len, data))
}

fn after_comma(fields: &[u8], at: usize) -> Result<&[u8]> {
    match fields.get(at..) {
        Some([b',', rest @ ..]) => Ok(rest),
        _ => Err(Error::Protocol),
    }
}
