pub mod notifier;

pub use notifier::{Notification, NotificationKind, NotificationResult, Notifier, NotifierPlugin};
