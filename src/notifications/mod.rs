pub mod format;
pub mod models;
pub mod senders;
pub mod service;

pub use senders::{Notifier, NotifyError};
pub use service::{NotificationService, NotifierFactory};
