//! 100 Hz tick driver (§4.8, §5): an accumulator loop in the style of the
//! teacher's `GameServer::tick_once`/`tick` split, just without the socket —
//! the caller polls this each time through its event loop and gets back the
//! datagrams produced by however many ticks the elapsed wall time covers.

use std::time::{Duration, Instant};

use crate::match_state::{Match, Outgoing};

pub const TICK_RATE_HZ: u32 = 100;

pub struct TickScheduler {
    tick_duration: Duration,
    last_poll: Instant,
    accumulator: Duration,
    running: bool,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self {
            tick_duration: Duration::from_secs_f64(1.0 / TICK_RATE_HZ as f64),
            last_poll: Instant::now(),
            accumulator: Duration::ZERO,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Call once per event-loop iteration. Runs as many ticks as the
    /// elapsed wall-clock time covers and returns every datagram those
    /// ticks produced, in tick order. The loop pauses itself while `m` has
    /// no sessions (§4.8: "If no players are present the loop is paused")
    /// and resumes cleanly — without a burst of catch-up ticks — the next
    /// time a session exists.
    pub fn poll(&mut self, m: &mut Match) -> Vec<Outgoing> {
        let now = Instant::now();
        let elapsed = now - self.last_poll;
        self.last_poll = now;

        if m.is_empty() {
            self.running = false;
            self.accumulator = Duration::ZERO;
            return Vec::new();
        }
        if !self.running {
            self.running = true;
            self.accumulator = Duration::ZERO;
            return Vec::new();
        }

        self.accumulator += elapsed;
        let mut outgoing = Vec::new();
        while self.accumulator >= self.tick_duration {
            self.accumulator -= self.tick_duration;
            outgoing.extend(m.tick());
        }
        outgoing
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}
