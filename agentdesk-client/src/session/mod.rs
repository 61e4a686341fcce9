//! Session state
//!
//! [`SessionStore`] is the only shared mutable resource. It is written by the
//! [`SessionReconciler`] and by explicit auth actions, and mirrored into a
//! [`SessionRecord`] so a later process can warm-start.

pub mod reconcile;
pub mod record;
pub mod store;

pub use reconcile::{ReconcilePhase, Resolution, SessionReconciler};
pub use record::{FileSessionRecord, MemorySessionRecord, SessionRecord, USER_SLOT};
pub use store::{SessionStore, SessionWatcher, Ticket};
