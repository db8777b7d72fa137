//! Routing of daemon notifications
//!
//! aria2 pushes six events over the WebSocket transport, each carrying a list
//! of `{"gid": ...}` structs. Applications implement [`Notifier`] for the ones
//! they care about; every method defaults to doing nothing.
//!
//! # Examples
//!
//! ```rust
//! use ariarpc_client::{DownloadEvent, Notifier};
//!
//! struct PrintDone;
//!
//! impl Notifier for PrintDone {
//!     fn on_download_complete(&self, events: &[DownloadEvent]) {
//!         for e in events {
//!             println!("finished {}", e.gid);
//!         }
//!     }
//! }
//! ```
//!
//! Handlers run on the receiver task. Anything slow belongs in a task of its
//! own, otherwise replies to pending calls queue up behind it.

use ariarpc_core::{methods, JsonRpcNotification};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Payload of every aria2 notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadEvent {
    /// GID of the download
    pub gid: String,
}

/// Receiver of daemon notifications
pub trait Notifier: Send + Sync {
    fn on_download_start(&self, _events: &[DownloadEvent]) {}
    fn on_download_pause(&self, _events: &[DownloadEvent]) {}
    fn on_download_stop(&self, _events: &[DownloadEvent]) {}
    fn on_download_complete(&self, _events: &[DownloadEvent]) {}
    fn on_download_error(&self, _events: &[DownloadEvent]) {}
    /// BitTorrent payload done; seeding may continue
    fn on_bt_download_complete(&self, _events: &[DownloadEvent]) {}
}

/// The fixed set of events aria2 sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    DownloadStart,
    DownloadPause,
    DownloadStop,
    DownloadComplete,
    DownloadError,
    BtDownloadComplete,
}

impl NotificationKind {
    /// Map a method name, `None` for anything aria2 does not define
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            methods::ON_DOWNLOAD_START => Some(Self::DownloadStart),
            methods::ON_DOWNLOAD_PAUSE => Some(Self::DownloadPause),
            methods::ON_DOWNLOAD_STOP => Some(Self::DownloadStop),
            methods::ON_DOWNLOAD_COMPLETE => Some(Self::DownloadComplete),
            methods::ON_DOWNLOAD_ERROR => Some(Self::DownloadError),
            methods::ON_BT_DOWNLOAD_COMPLETE => Some(Self::BtDownloadComplete),
            _ => None,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Self::DownloadStart => methods::ON_DOWNLOAD_START,
            Self::DownloadPause => methods::ON_DOWNLOAD_PAUSE,
            Self::DownloadStop => methods::ON_DOWNLOAD_STOP,
            Self::DownloadComplete => methods::ON_DOWNLOAD_COMPLETE,
            Self::DownloadError => methods::ON_DOWNLOAD_ERROR,
            Self::BtDownloadComplete => methods::ON_BT_DOWNLOAD_COMPLETE,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// What happened to a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Delivered to the notifier
    Delivered(NotificationKind),
    /// Known event, but no notifier registered
    Discarded(NotificationKind),
    /// Method name aria2 does not define
    Unknown,
    /// Params were not a list of `{gid}`
    Malformed(NotificationKind),
}

/// Routes notifications to an optional [`Notifier`]
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    notifier: Option<Arc<dyn Notifier>>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self { notifier }
    }

    pub fn has_notifier(&self) -> bool {
        self.notifier.is_some()
    }

    /// Deliver one notification
    ///
    /// Never fails; problems are logged and reported through the return
    /// value.
    pub fn dispatch(&self, notification: &JsonRpcNotification) -> Dispatch {
        let Some(kind) = NotificationKind::from_method(&notification.method) else {
            tracing::warn!(method = %notification.method, "unknown notification dropped");
            return Dispatch::Unknown;
        };

        let Some(notifier) = &self.notifier else {
            return Dispatch::Discarded(kind);
        };

        let events: Vec<DownloadEvent> = match serde_json::from_value(notification.params.clone())
        {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(method = %kind, error = %e, "malformed notification params dropped");
                return Dispatch::Malformed(kind);
            }
        };

        tracing::debug!(method = %kind, count = events.len(), "dispatching notification");
        match kind {
            NotificationKind::DownloadStart => notifier.on_download_start(&events),
            NotificationKind::DownloadPause => notifier.on_download_pause(&events),
            NotificationKind::DownloadStop => notifier.on_download_stop(&events),
            NotificationKind::DownloadComplete => notifier.on_download_complete(&events),
            NotificationKind::DownloadError => notifier.on_download_error(&events),
            NotificationKind::BtDownloadComplete => notifier.on_bt_download_complete(&events),
        }
        Dispatch::Delivered(kind)
    }
}

impl fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("has_notifier", &self.has_notifier())
            .finish()
    }
}
