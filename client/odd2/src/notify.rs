//! Single-slot user notifications.
//!
//! The page shows at most one notice at a time: a new notice replaces
//! whatever is visible, and a notice disappears on its own after
//! [`NOTICE_TTL`]. Each push is also emitted through the matching tracing
//! level so headless runs still show the message.

use tokio::time::{Duration, Instant};
use tracing::{error, info, warn};

/// How long a notice stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
}

#[derive(Debug, Default)]
pub struct Notifier {
    current: Option<(Notice, Instant)>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a notice, replacing whatever is currently visible.
    pub fn push(&mut self, kind: NoticeKind, message: impl Into<String>) {
        let notice = Notice {
            message: message.into(),
            kind,
        };
        match kind {
            NoticeKind::Error => error!("{}", notice.message),
            NoticeKind::Warning => warn!("{}", notice.message),
            NoticeKind::Success | NoticeKind::Info => info!("{}", notice.message),
        }
        self.current = Some((notice, Instant::now()));
    }

    /// The currently visible notice, if it hasn't expired yet.
    pub fn current(&self) -> Option<&Notice> {
        match &self.current {
            Some((notice, shown_at)) if shown_at.elapsed() < NOTICE_TTL => Some(notice),
            _ => None,
        }
    }
}
