//! Session store
//!
//! Single-writer slot for the current [`Session`], built on a
//! `tokio::sync::watch` channel so every observer sees each replacement.
//! Writers that may race (reconciliation cycles, auth actions) go through
//! [`SessionStore::commit`], which checks a sequence ticket and updates the
//! durable record under the same lock as the in-memory value.

use super::record::SessionRecord;
use agentdesk_core::{DeskResult, Identity, Session};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Sequence stamp of one attempt to write the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    #[cfg(test)]
    pub(crate) fn initial() -> Self {
        Ticket(0)
    }

    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// Process-wide holder of the current session
#[derive(Debug)]
pub struct SessionStore {
    sender: watch::Sender<Session>,
    record: Arc<dyn SessionRecord>,
    generation: AtomicU64,
    /// Highest ticket whose outcome is in `sender`
    settled: watch::Sender<u64>,
    /// Set while the live identity only came from the durable record
    unverified: AtomicBool,
}

impl SessionStore {
    pub fn new(record: Arc<dyn SessionRecord>) -> Self {
        let (sender, _) = watch::channel(Session::Unauthenticated);
        Self {
            sender,
            record,
            generation: AtomicU64::new(0),
            settled: watch::channel(0).0,
            unverified: AtomicBool::new(false),
        }
    }

    /// Optimistically adopt the durable record, if any
    pub fn hydrate(&self) -> Session {
        let identity = match self.record.load() {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Could not read durable session record: {}", e);
                None
            }
        };

        let hydrated = identity.is_some();
        let session = Session::from(identity);
        self.sender.send_replace(session.clone());
        self.unverified.store(hydrated, Ordering::SeqCst);

        debug!(authenticated = hydrated, "Hydrated session from durable record");
        session
    }

    pub fn get(&self) -> Session {
        self.sender.borrow().clone()
    }

    /// Replace the session and notify observers. No validation, no durable write.
    pub fn set(&self, session: Session) {
        self.sender.send_replace(session);
    }

    pub fn persist(&self, identity: &Identity) -> DeskResult<()> {
        self.record.save(identity)
    }

    pub fn clear_durable(&self) -> DeskResult<()> {
        self.record.clear()
    }

    pub fn subscribe(&self) -> SessionWatcher {
        SessionWatcher::new(self.sender.subscribe())
    }

    /// Stamp a new write attempt; every older ticket becomes stale
    pub fn next_ticket(&self) -> Ticket {
        Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current_ticket(&self) -> Ticket {
        Ticket(self.generation.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Record that `ticket` reached its final session value. Stale tickets
    /// are ignored.
    pub fn mark_settled(&self, ticket: Ticket) {
        if !self.is_current(ticket) {
            return;
        }
        self.settled.send_if_modified(|settled| {
            if ticket.0 > *settled {
                *settled = ticket.0;
                true
            } else {
                false
            }
        });
    }

    /// Wait until the newest ticket has settled and return the session it
    /// left behind. Tickets issued while waiting are waited for as well.
    pub async fn wait_settled(&self) -> Session {
        let mut settled = self.settled.subscribe();
        loop {
            if *settled.borrow_and_update() >= self.generation.load(Ordering::SeqCst) {
                return self.get();
            }
            if settled.changed().await.is_err() {
                return self.get();
            }
        }
    }

    /// True while the authenticated identity has not been confirmed by the
    /// server or an explicit login in this process
    pub fn is_unverified(&self) -> bool {
        self.unverified.load(Ordering::SeqCst) && self.get().is_authenticated()
    }

    /// Write `session` through to memory and the durable record, unless a
    /// newer ticket has been issued.
    ///
    /// Returns `Ok(false)` when the ticket is stale. A durable write failure
    /// is reported after the in-memory value has been replaced.
    pub fn commit(&self, ticket: Ticket, session: Session) -> DeskResult<bool> {
        let mut accepted = false;
        let mut durable = Ok(());

        self.sender.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != ticket.0 {
                return false;
            }
            accepted = true;

            durable = match session.identity() {
                Some(identity) => self.record.save(identity),
                None => self.record.clear(),
            };
            self.unverified.store(false, Ordering::SeqCst);

            let modified = *current != session;
            *current = session;
            modified
        });

        if !accepted {
            debug!(ticket = ticket.0, "Discarded stale session write");
            return Ok(false);
        }
        self.mark_settled(ticket);
        durable.map(|_| true)
    }

    /// Invalidate every in-flight attempt and write `session` through
    pub fn establish(&self, session: Session) -> DeskResult<()> {
        let ticket = self.next_ticket();
        self.commit(ticket, session).map(|_| ())
    }
}

/// Observer of the authenticated/unauthenticated discriminant
#[derive(Debug)]
pub struct SessionWatcher {
    receiver: watch::Receiver<Session>,
    authenticated: bool,
}

impl SessionWatcher {
    fn new(mut receiver: watch::Receiver<Session>) -> Self {
        let authenticated = receiver.borrow_and_update().is_authenticated();
        Self {
            receiver,
            authenticated,
        }
    }

    pub fn current(&self) -> Session {
        self.receiver.borrow().clone()
    }

    /// Wait until the session flips between authenticated and
    /// unauthenticated. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Session> {
        loop {
            self.receiver.changed().await.ok()?;
            let session = self.receiver.borrow_and_update().clone();
            if session.is_authenticated() != self.authenticated {
                self.authenticated = session.is_authenticated();
                return Some(session);
            }
        }
    }
}
