pub mod manager;
pub mod notifiers;
pub mod templates;
pub mod traits;

pub use manager::NotifierManager;
pub use traits::{Notification, NotificationKind, Notifier, NotifierPlugin};
