use std::time::Duration;

/// Monotonic page time, advanced explicitly by the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct PageClock {
    now: Duration,
}

impl PageClock {
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Moves the clock to `now`. Time never runs backwards.
    pub fn set(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }
}

/// A single-slot timer: arming it again replaces the pending deadline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Duration>,
}

impl Timer {
    pub fn arm(&mut self, now: Duration, delay: Duration) {
        self.deadline = Some(now.saturating_add(delay));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once when the deadline has been reached.
    pub fn fire(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// A repeating timer for periodic reconciliation work.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    period: Duration,
    next: Duration,
}

impl Interval {
    pub fn new(now: Duration, period: Duration) -> Self {
        Self {
            period,
            next: now.saturating_add(period),
        }
    }

    /// Returns true when at least one period has elapsed. Missed periods
    /// collapse into a single tick.
    pub fn tick(&mut self, now: Duration) -> bool {
        if now < self.next {
            return false;
        }
        while self.next <= now {
            self.next = self.next.saturating_add(self.period);
        }
        true
    }
}
