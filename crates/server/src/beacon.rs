//! Public-listing beacon (§6, §9 "two independent timers feeding a
//! single-consumer queue"): an independent 10 s interval, separate from the
//! tick timer, that announces the server to the master list while it's
//! running with `--public`.

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use hqm_core::wire::BEACON;

/// Master address the original server announced to; kept hard-coded per
/// §6 ("sends ... to a hard-coded master address").
pub const MASTER_HOST: &str = "66.226.72.227";
pub const MASTER_PORT: u16 = 27590;

const INTERVAL: Duration = Duration::from_secs(10);

pub struct Beacon {
    master: SocketAddr,
    last_sent: Instant,
}

impl Beacon {
    pub fn new() -> Self {
        Self {
            master: master_addr(),
            // Fire on the first poll rather than waiting out the full interval.
            last_sent: Instant::now() - INTERVAL,
        }
    }

    /// Sends the beacon datagram if the interval has elapsed. Failures are
    /// logged and otherwise ignored — losing a beacon tick isn't fatal.
    pub fn poll(&mut self, socket: &UdpSocket) {
        if self.last_sent.elapsed() < INTERVAL {
            return;
        }
        self.last_sent = Instant::now();
        if let Err(e) = socket.send_to(&BEACON, self.master) {
            log::warn!("public-listing beacon send failed: {e}");
        }
    }
}

impl Default for Beacon {
    fn default() -> Self {
        Self::new()
    }
}

fn master_addr() -> SocketAddr {
    format!("{MASTER_HOST}:{MASTER_PORT}").parse().expect("master host/port is a literal IPv4 socket address")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_addr_parses() {
        let addr = master_addr();
        assert_eq!(addr.port(), MASTER_PORT);
    }

    #[test]
    fn beacon_fires_on_first_poll_then_waits_out_the_interval() {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut beacon = Beacon::new();
        beacon.poll(&socket); // sends immediately
        let sent_at = beacon.last_sent;
        beacon.poll(&socket); // too soon, no-op
        assert_eq!(beacon.last_sent, sent_at);
    }
}
