//! Change notifications: the records every mutation produces, chains that
//! batch them per compound mutation, and adapters that receive them.

mod adapter;
mod chain;
mod notification;

pub(crate) use adapter::same_adapter;
pub use adapter::{Adapter, AdapterRef, ContentAdapter, NotificationRecorder};
pub use chain::{ChainAdd, NotificationChain};
pub use notification::{EventType, FeatureRef, Notification};
