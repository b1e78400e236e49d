//! Transient success/error notifications
//!
//! Alerts expire on their own after the configured interval (five seconds
//! by default) and can be dismissed earlier.

use docflow_common::Error;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
}

/// Panel an alert belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Generate,
    Optimize,
    Documents,
    Templates,
    Injection,
    Diagram,
    Settings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: u64,
    pub channel: Channel,
    pub kind: AlertKind,
    pub message: String,
    raised_at: Instant,
}

impl Alert {
    pub fn is_error(&self) -> bool {
        self.kind == AlertKind::Error
    }
}

pub struct AlertSink {
    alerts: Vec<Alert>,
    next_id: u64,
    dismiss_after: Duration,
}

impl AlertSink {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            alerts: Vec::new(),
            next_id: 1,
            dismiss_after,
        }
    }

    pub fn success(&mut self, channel: Channel, message: impl Into<String>) -> u64 {
        self.push_at(channel, AlertKind::Success, message.into(), Instant::now())
    }

    pub fn error(&mut self, channel: Channel, message: impl Into<String>) -> u64 {
        self.push_at(channel, AlertKind::Error, message.into(), Instant::now())
    }

    /// Surface a failed operation.
    pub fn report(&mut self, channel: Channel, err: &Error) -> u64 {
        self.error(channel, err.to_string())
    }

    fn push_at(&mut self, channel: Channel, kind: AlertKind, message: String, now: Instant) -> u64 {
        match kind {
            AlertKind::Success => info!(?channel, "{}", message),
            AlertKind::Error => warn!(?channel, "{}", message),
        }

        self.prune_at(now);

        let id = self.next_id;
        self.next_id += 1;
        self.alerts.push(Alert {
            id,
            channel,
            kind,
            message,
            raised_at: now,
        });
        id
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|alert| alert.id != id);
        self.alerts.len() != before
    }

    /// Alerts still visible at `now`, oldest first.
    pub fn active_at(&self, now: Instant) -> Vec<&Alert> {
        self.alerts
            .iter()
            .filter(|alert| now.saturating_duration_since(alert.raised_at) < self.dismiss_after)
            .collect()
    }

    pub fn active(&self) -> Vec<&Alert> {
        self.active_at(Instant::now())
    }

    /// Most recent visible alert on a channel.
    pub fn latest(&self, channel: Channel) -> Option<&Alert> {
        self.active().into_iter().rev().find(|alert| alert.channel == channel)
    }

    /// Drop alerts that expired by `now`.
    fn prune_at(&mut self, now: Instant) {
        let dismiss_after = self.dismiss_after;
        self.alerts
            .retain(|alert| now.saturating_duration_since(alert.raised_at) < dismiss_after);
    }

    /// Take every alert, expired or not, for a front end that prints them once.
    pub fn drain(&mut self) -> Vec<Alert> {
        std::mem::take(&mut self.alerts)
    }
}

impl Default for AlertSink {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}
