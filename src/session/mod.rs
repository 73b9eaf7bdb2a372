pub mod error;
pub mod invariants;
pub mod record;
pub mod store;

pub use error::{SessionError, SessionErrorKind};
pub use invariants::{InvariantCorrection, reconcile, reconcile_in_place};
pub use record::{SessionRecord, StageError, StageErrorKind};
pub use store::{SessionLease, SessionStore};
