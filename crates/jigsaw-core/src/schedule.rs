//! Timer and timeout bookkeeping driven by front-end clocks
//!
//! Front ends report the current time in milliseconds; the scheduler hands
//! back whatever became due, earliest first. There is at most one repeating
//! ticker. Cancelling a timeout removes it before it can fire.

/// Ticker period
pub const TICK_MS: u64 = 1000;

/// One-shot timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Clear the hint with this id
    HintExpired(u64),
    /// Leave the game-over screen for the gallery
    LossReturn,
}

/// Something that became due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Due {
    Tick,
    Timeout(Timeout),
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_tick_ms: Option<u64>,
    timeouts: Vec<(u64, Timeout)>,
}

impl Scheduler {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms,
            ..Self::default()
        }
    }

    /// Last time reported by the front end
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Start the repeating ticker, replacing any running one
    pub fn start_ticker(&mut self) {
        self.next_tick_ms = Some(self.now_ms + TICK_MS);
    }

    pub fn stop_ticker(&mut self) {
        self.next_tick_ms = None;
    }

    pub fn ticker_running(&self) -> bool {
        self.next_tick_ms.is_some()
    }

    /// Arm a one-shot timeout `after_ms` from now
    pub fn schedule(&mut self, timeout: Timeout, after_ms: u64) {
        self.timeouts.push((self.now_ms + after_ms, timeout));
    }

    /// Remove pending timeouts matching `pred`
    pub fn cancel(&mut self, pred: impl Fn(&Timeout) -> bool) {
        self.timeouts.retain(|(_, t)| !pred(t));
    }

    pub fn cancel_all(&mut self) {
        self.timeouts.clear();
    }

    pub fn is_pending(&self, timeout: Timeout) -> bool {
        self.timeouts.iter().any(|&(_, t)| t == timeout)
    }

    /// Pop the earliest item due at or before `now_ms`.
    ///
    /// Call repeatedly until `None`; handling one item may start or stop
    /// the ticker or arm new timeouts. Once nothing is due the clock moves
    /// to `now_ms`.
    pub fn next_due(&mut self, now_ms: u64) -> Option<Due> {
        let timeout = self
            .timeouts
            .iter()
            .enumerate()
            .filter(|(_, (at, _))| *at <= now_ms)
            .min_by_key(|(_, (at, _))| *at)
            .map(|(i, &(at, _))| (i, at));
        let tick = self.next_tick_ms.filter(|&at| at <= now_ms);

        match (tick, timeout) {
            (Some(tick_at), Some((_, timeout_at))) if tick_at <= timeout_at => {
                self.fire_tick(tick_at)
            }
            (_, Some((index, timeout_at))) => {
                let (_, timeout) = self.timeouts.remove(index);
                self.now_ms = self.now_ms.max(timeout_at);
                Some(Due::Timeout(timeout))
            }
            (Some(tick_at), None) => self.fire_tick(tick_at),
            (None, None) => {
                self.now_ms = self.now_ms.max(now_ms);
                None
            }
        }
    }

    fn fire_tick(&mut self, tick_at: u64) -> Option<Due> {
        self.now_ms = self.now_ms.max(tick_at);
        self.next_tick_ms = Some(tick_at + TICK_MS);
        Some(Due::Tick)
    }
}
