use crate::state::Store;
use chrono::Utc;
use log::debug;
use serde::Serialize;
use std::time::Duration;
use strum::Display;

/// How long a notification stays fully visible
pub const DISPLAY_DURATION: Duration = Duration::from_millis(5000);

/// Time between a notification starting its removal animation and being deleted
pub const REMOVAL_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Millisecond timestamp of creation, bumped to stay unique
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub removing: bool,
}

impl Store {
    /// Queues a notification and schedules its removal.
    ///
    /// Must be called from within a tokio runtime.
    pub fn notify(&self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        let message = message.into();
        let id = self.update(|state| {
            let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
            let id = now.max(state.last_notification_id + 1);
            state.last_notification_id = id;
            state.notifications.push(Notification { id, message, kind, removing: false });
            id
        });
        debug!("Notification {} queued", id);

        let store = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(DISPLAY_DURATION).await;
            if store.mark_removing(id) {
                tokio::time::sleep(REMOVAL_DELAY).await;
                store.remove_notification(id);
            }
        });

        id
    }

    /// Starts the removal of a notification ahead of its timer.
    ///
    /// Returns false if the notification is gone or already on its way out.
    pub fn dismiss(&self, id: u64) -> bool {
        let started = self.update(|state| {
            match state.notifications.iter_mut().find(|n| n.id == id && !n.removing) {
                Some(notification) => {
                    notification.removing = true;
                    true
                }
                None => false,
            }
        });

        if started {
            let store = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(REMOVAL_DELAY).await;
                store.remove_notification(id);
            });
        }

        started
    }

    // true while the notification still exists
    fn mark_removing(&self, id: u64) -> bool {
        self.update(|state| match state.notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.removing = true;
                true
            }
            None => false,
        })
    }

    fn remove_notification(&self, id: u64) {
        self.update(|state| state.notifications.retain(|n| n.id != id));
    }
}
