pub mod active_hours;
pub mod detector;
pub mod error_state;
pub mod identifier_store;
pub mod poller;

pub use active_hours::ActiveHours;
pub use detector::{ChangeDetector, ChangeKind, Detection};
pub use error_state::{ErrorStateTracker, FailureAlert};
pub use identifier_store::{FileIdentifierStore, IdentifierStore};
pub use poller::{CycleOutcome, Poller};
