pub mod poll_state;
pub mod snapshot;

// Re-exports for convenience
pub use poll_state::*;
pub use snapshot::*;
