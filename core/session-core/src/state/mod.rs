//! Search session state container.
//!
//! Holds zero or one "current" search session and the searches in flight for
//! it. The state is only ever replaced through a fixed set of [`Transition`]s;
//! subscribers observe every published state in order.
//!
//! # Module Structure
//!
//! - [`types`]: `SessionState`, `PendingSearch` and the derived `SessionPhase`
//! - [`transition`]: pure `next_state(current, transition)` logic
//! - [`container`]: `SessionStateContainer`, which applies transitions and
//!   publishes the state and session-id streams
//! - [`stream`]: `Subscription`, the ordered replay-latest receiver
//!
//! # Invariants
//!
//! - At most one active session at a time.
//! - Pending searches exist only while a session is active.
//! - `is_stored` flips to true only for the session that was current when
//!   the store completed.

mod container;
mod stream;
mod transition;
mod types;

pub use container::SessionStateContainer;
pub use stream::Subscription;
pub use transition::{next_state, Transition};
pub use types::{PendingSearch, SearchId, SessionPhase, SessionState};
