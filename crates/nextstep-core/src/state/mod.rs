//! Session state machine.
//!
//! [`SessionState`] owns the authoritative snapshot and pairs every
//! transition with its credential-store write. Consumers observe
//! transitions through a `watch` channel or synchronous [`SessionListener`]s.

mod attempt;
mod listener;
mod machine;
mod snapshot;

pub use attempt::AuthAttempt;
pub use listener::{SessionEvent, SessionListener, Transition};
pub use machine::SessionState;
pub use snapshot::{Generation, SessionPhase, SessionSnapshot};
