// Notifier plugin implementations
pub mod pushover;
pub mod telegram;

pub use pushover::PushoverNotifier;
pub use telegram::TelegramNotifier;
