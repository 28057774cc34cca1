use super::Notification;

/// Outcome of [`NotificationChain::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainAdd {
    /// Absorbed into the last pending notification.
    Merged,
    /// Appended as a new entry.
    Appended,
}

/// Notifications produced by one compound mutation, dispatched together
/// once it completes.
#[derive(Debug, Default)]
pub struct NotificationChain {
    notifications: Vec<Notification>,
}

impl NotificationChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `notification` into the last entry when possible, otherwise
    /// appends it. The chain accepts every notification.
    pub fn add(&mut self, notification: Notification) -> ChainAdd {
        if let Some(last) = self.notifications.last_mut() {
            if last.merge(&notification) {
                return ChainAdd::Merged;
            }
        }
        self.notifications.push(notification);
        ChainAdd::Appended
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Notification> {
        self.notifications.iter()
    }

    /// Dispatches every entry, oldest first.
    pub fn dispatch(self) {
        for notification in &self.notifications {
            notification.dispatch();
        }
    }
}
