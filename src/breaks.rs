use chrono::{DateTime, Duration, Local};

/// Periodic stand-up reminder while monitoring
#[derive(Debug, Clone)]
pub struct BreakReminder {
    interval: Duration,
    pub last_break: DateTime<Local>,
    pub next_break: DateTime<Local>,
}

impl BreakReminder {
    pub fn new(interval_mins: u32, now: DateTime<Local>) -> Self {
        let interval = Duration::minutes(i64::from(interval_mins.max(1)));
        Self {
            interval,
            last_break: now,
            next_break: now + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Restart the countdown, e.g. when monitoring starts or the interval changes
    pub fn reschedule(&mut self, interval_mins: u32, now: DateTime<Local>) {
        *self = Self::new(interval_mins, now);
    }

    /// Fires once when the break is due, then schedules the next one
    pub fn check(&mut self, now: DateTime<Local>) -> bool {
        if now < self.next_break {
            return false;
        }
        self.last_break = now;
        self.next_break = now + self.interval;
        true
    }

    pub fn time_until_break(&self, now: DateTime<Local>) -> Duration {
        (self.next_break - now).max(Duration::zero())
    }
}
