use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hqm_core::wire::{command, ClientMessage, ServerMessage, PROTOCOL_VERSION};
use hqm_core::{rink::Rink, Match, TickScheduler};

use crate::beacon::Beacon;
use crate::config::ServerConfig;

/// Datagrams larger than this are rejected before decoding even starts —
/// every real HQM datagram is well under a kilobyte.
const MAX_DATAGRAM: usize = 4096;

pub struct GameServer {
    socket: UdpSocket,
    config: ServerConfig,
    match_state: Match,
    scheduler: TickScheduler,
    beacon: Option<Beacon>,
    running: Arc<AtomicBool>,
    recv_buffer: [u8; MAX_DATAGRAM],
}

impl GameServer {
    pub fn new(config: ServerConfig) -> io::Result<Self> {
        let bind_addr = format!("{}:{}", config.bind, config.port);
        let socket = UdpSocket::bind(&bind_addr)?;
        socket.set_nonblocking(true)?;

        let rink = Rink::new(config.rink_width, config.rink_length, config.rink_corner);
        let match_state = Match::new(rink, config.team_size);
        let beacon = config.public.then(Beacon::new);

        Ok(Self {
            socket,
            config,
            match_state,
            scheduler: TickScheduler::new(),
            beacon,
            running: Arc::new(AtomicBool::new(true)),
            recv_buffer: [0u8; MAX_DATAGRAM],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Blocks the calling thread until `running` is cleared, cooperatively
    /// polling the socket and the two independent timers (§5, §9).
    pub fn run(&mut self) {
        while self.running.load(Ordering::SeqCst) {
            self.poll_once();
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// One pass: drain pending datagrams, run however many ticks the
    /// elapsed time covers, send the resulting snapshots, and fire the
    /// beacon if it's due. Exposed separately from `run` so tests and
    /// embedding code can drive the loop deterministically.
    pub fn poll_once(&mut self) {
        self.drain_incoming();

        for outgoing in self.scheduler.poll(&mut self.match_state) {
            let bytes = outgoing.message.encode();
            if let Err(e) = self.socket.send_to(&bytes, outgoing.address) {
                log::warn!("send to {} failed: {e}", outgoing.address);
            }
        }

        if let Some(beacon) = self.beacon.as_mut() {
            beacon.poll(&self.socket);
        }
    }

    fn drain_incoming(&mut self) {
        loop {
            let (len, addr) = match self.socket.recv_from(&mut self.recv_buffer) {
                Ok(pair) => pair,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    log::warn!("recv failed: {e}");
                    break;
                }
            };
            self.handle_datagram(&self.recv_buffer[..len].to_vec(), addr);
        }
    }

    /// Decodes and dispatches one datagram. Every failure mode in §7 —
    /// bad magic, unknown command, truncated body, wrong version, unknown
    /// sender, duplicate join, mismatched game id — is a silent drop here,
    /// never a reply.
    fn handle_datagram(&mut self, data: &[u8], addr: SocketAddr) {
        let Some(msg) = ClientMessage::decode(data) else { return };
        match msg {
            ClientMessage::InfoRequest { version, nonce } => {
                if version != PROTOCOL_VERSION {
                    return;
                }
                let response = self.match_state.info_response(self.config.name, nonce);
                let bytes = response.encode();
                if let Err(e) = self.socket.send_to(&bytes, addr) {
                    log::warn!("info response to {addr} failed: {e}");
                }
            }
            ClientMessage::Join { version, name } => {
                if version != PROTOCOL_VERSION {
                    return;
                }
                if let Some(slot) = self.match_state.join(addr, name) {
                    log::debug!("slot {slot} joined from {addr}");
                } // else: duplicate join from this address, ignored
            }
            ClientMessage::Update {
                game_id,
                stick_angle,
                turn,
                fwd_back,
                stick_x,
                stick_y,
                head_rot,
                body_rot,
                keys,
                last_acked_packet,
                last_seen_msg_index,
                chat,
                ..
            } => {
                let Some(slot) = self.match_state.find_session_by_addr(addr) else { return };
                let chat = chat.map(|f| (f.rep_index, f.text));
                self.match_state.apply_update(
                    slot,
                    game_id,
                    stick_angle,
                    turn,
                    fwd_back,
                    stick_x,
                    stick_y,
                    head_rot,
                    body_rot,
                    keys,
                    last_acked_packet,
                    last_seen_msg_index,
                    chat,
                );
            }
            ClientMessage::Exit => {
                if let Some(slot) = self.match_state.find_session_by_addr(addr) {
                    self.match_state.exit(slot);
                }
            }
        }
    }
}

/// Command-code constants re-exported for the handful of call sites (log
/// messages, future admin tooling) that want the raw byte rather than the
/// decoded enum variant.
#[allow(unused_imports)]
pub use command::{EXIT, INFO_REQUEST, JOIN, UPDATE};

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket as StdUdpSocket;

    fn config_on(port: u16) -> ServerConfig {
        ServerConfig { bind: "127.0.0.1".to_string(), port, ..ServerConfig::default() }
    }

    #[test]
    fn join_then_poll_sends_a_reply_to_the_joining_client() {
        let mut server = GameServer::new(config_on(0)).unwrap();
        let server_addr = server.local_addr().unwrap();

        let client = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        client.set_nonblocking(true).unwrap();
        let join = ClientMessage::Join { version: PROTOCOL_VERSION, name: crate::config::pad_name(b"Tester") };
        client.send_to(&join.encode(), server_addr).unwrap();

        server.poll_once();
        server.poll_once();

        let mut buf = [0u8; MAX_DATAGRAM];
        let received = client.recv_from(&mut buf);
        assert!(received.is_ok(), "client should have received a datagram after joining");
    }

    #[test]
    fn wrong_version_join_is_silently_dropped() {
        let mut server = GameServer::new(config_on(0)).unwrap();
        let server_addr = server.local_addr().unwrap();

        let client = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        client.set_nonblocking(true).unwrap();
        let join = ClientMessage::Join { version: PROTOCOL_VERSION.wrapping_add(1), name: [0u8; 32] };
        client.send_to(&join.encode(), server_addr).unwrap();

        server.poll_once();
        assert_eq!(server.match_state.session_count(), 0);
    }

    #[test]
    fn info_request_gets_an_immediate_response() {
        let mut server = GameServer::new(config_on(0)).unwrap();
        let server_addr = server.local_addr().unwrap();

        let client = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        client.set_nonblocking(true).unwrap();
        let request = ClientMessage::InfoRequest { version: PROTOCOL_VERSION, nonce: 7 };
        client.send_to(&request.encode(), server_addr).unwrap();

        server.poll_once();

        let mut buf = [0u8; MAX_DATAGRAM];
        let (len, _) = client.recv_from(&mut buf).expect("info response datagram");
        let response = ServerMessage::decode(&buf[..len]).expect("well-formed response");
        match response {
            ServerMessage::InfoResponse(r) => assert_eq!(r.nonce, 7),
            other => panic!("expected InfoResponse, got {other:?}"),
        }
    }
}
