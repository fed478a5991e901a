use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seconds left until `deadline` as observed at `now`, floor-clamped at zero.
///
/// The countdown is a pure function of the stored deadline and the sampled
/// clock: there is no accumulating counter to drift, and a missed tick
/// (backgrounded tab, paused stream) self-corrects on the next sample. The
/// value is advisory display data; the grading decision re-derives on-time
/// status from the same stored deadline at finalize.
pub fn remaining_seconds(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (deadline - now).num_seconds().max(0)
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TimerEvent {
    TimerTick(TimerTick),
    TimeExpired(TimeExpired),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimerTick {
    pub attempt_id: String,
    pub remaining_seconds: i64,
    pub deadline: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimeExpired {
    pub attempt_id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl TimerEvent {
    pub fn to_sse_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            TimerEvent::TimerTick(_) => "timer-tick",
            TimerEvent::TimeExpired(_) => "time-expired",
        }
    }
}

/// Per-stream countdown state: ticks while time remains, emits `time-expired`
/// exactly once when the remaining seconds first reach zero, then ends.
pub struct Countdown {
    deadline: DateTime<Utc>,
    expired_sent: bool,
}

impl Countdown {
    pub fn new(deadline: DateTime<Utc>) -> Self {
        Self {
            deadline,
            expired_sent: false,
        }
    }

    /// Event for a tick observed at `now`; None once the one-shot expiry has
    /// been emitted.
    pub fn tick(&mut self, attempt_id: &str, now: DateTime<Utc>) -> Option<TimerEvent> {
        if self.expired_sent {
            return None;
        }
        let remaining = remaining_seconds(self.deadline, now);
        if remaining == 0 {
            self.expired_sent = true;
            return Some(TimerEvent::TimeExpired(TimeExpired {
                attempt_id: attempt_id.to_string(),
                timestamp: now,
                message: "Time limit exceeded".to_string(),
            }));
        }
        Some(TimerEvent::TimerTick(TimerTick {
            attempt_id: attempt_id.to_string(),
            remaining_seconds: remaining,
            deadline: self.deadline,
            timestamp: now,
        }))
    }
}
