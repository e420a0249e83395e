//! Countdown to the next prediction update.
//!
//! The remaining time is derived once from the server payload; after that
//! the clock ticks locally, one decrement per second, with no further
//! round-trips. Reaching zero means the predictions on screen are stale and
//! the caller should refresh its view of the server.

use std::fmt;

use chrono::{DateTime, Local};
use tokio::time::{sleep, Duration};
use tracing::info;

use crate::api::CountdownResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining_secs: u64,
    /// Server-formatted label for the update slot, e.g. "12:00 PM".
    next_update: String,
}

impl Countdown {
    pub fn from_parts(hours: u64, minutes: u64, seconds: u64) -> Self {
        Self {
            remaining_secs: hours * 3600 + minutes * 60 + seconds,
            next_update: String::new(),
        }
    }

    pub fn from_response(response: &CountdownResponse) -> Self {
        Self {
            next_update: response.next_update.clone(),
            ..Self::from_parts(response.hours, response.minutes, response.seconds)
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    pub fn next_update_label(&self) -> &str {
        &self.next_update
    }

    /// One local 1-second decrement. Returns `true` while still counting.
    pub fn tick(&mut self) -> bool {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        !self.is_expired()
    }

    /// Wall-clock moment at which the countdown reaches zero.
    pub fn ends_at(&self) -> DateTime<Local> {
        Local::now() + chrono::Duration::seconds(self.remaining_secs as i64)
    }

    /// Tick once per second until expiry.
    pub async fn run(mut self) {
        info!(
            "next update at {} ({} remaining)",
            self.next_update, self
        );
        while !self.is_expired() {
            sleep(Duration::from_secs(1)).await;
            self.tick();
        }
        info!("countdown expired, predictions are stale");
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.remaining_secs / 3600;
        let minutes = (self.remaining_secs % 3600) / 60;
        let seconds = self.remaining_secs % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}
