//! Session reconciliation controller
//!
//! Runs once per navigation and decides whether the in-memory session can be
//! trusted or must be checked against the server. Each cycle takes a fresh
//! [`Ticket`]; a cycle whose ticket was superseded while `who_am_i` was in
//! flight leaves the store untouched and reports whatever the newest cycle
//! or auth action settles on.

use super::store::{SessionStore, Ticket};
use crate::routing::Route;
use agentdesk_api::SessionApi;
use agentdesk_core::{ReconcilePolicy, Session};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Where the controller is in the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePhase {
    Initializing,
    TrustingCache,
    Validating,
    Resolved { authenticated: bool },
}

impl ReconcilePhase {
    /// Protected content must not render while this is true
    pub fn is_loading(&self) -> bool {
        !matches!(self, ReconcilePhase::Resolved { .. })
    }
}

/// Outcome of one reconciliation cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    ticket: Ticket,
    session: Session,
    superseded: bool,
}

impl Resolution {
    #[cfg(test)]
    pub(crate) fn settled(session: Session) -> Self {
        Self {
            ticket: Ticket::initial(),
            session,
            superseded: false,
        }
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// A newer cycle or auth action overtook this one; `session` is what
    /// that newer writer settled on, not this cycle's server answer
    pub fn superseded(&self) -> bool {
        self.superseded
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }
}

pub struct SessionReconciler {
    store: Arc<SessionStore>,
    api: Arc<dyn SessionApi>,
    policy: ReconcilePolicy,
    phase: watch::Sender<ReconcilePhase>,
}

impl SessionReconciler {
    pub fn new(store: Arc<SessionStore>, api: Arc<dyn SessionApi>) -> Self {
        let (phase, _) = watch::channel(ReconcilePhase::Initializing);
        Self {
            store,
            api,
            policy: ReconcilePolicy::default(),
            phase,
        }
    }

    pub fn with_policy(mut self, policy: ReconcilePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn phase(&self) -> ReconcilePhase {
        *self.phase.borrow()
    }

    /// Follow phase transitions, e.g. to drive a loading indicator
    pub fn watch_phase(&self) -> watch::Receiver<ReconcilePhase> {
        self.phase.subscribe()
    }

    fn needs_validation(&self, session: &Session) -> bool {
        if !session.is_authenticated() {
            return true;
        }
        match self.policy {
            ReconcilePolicy::TrustCache => false,
            ReconcilePolicy::ValidateOnce => self.store.is_unverified(),
            ReconcilePolicy::AlwaysValidate => true,
        }
    }

    fn publish(&self, ticket: Ticket, phase: ReconcilePhase) {
        if self.store.is_current(ticket) {
            debug!(ticket = ticket.sequence(), ?phase, "Reconcile phase");
            self.phase.send_replace(phase);
        }
    }

    fn resolve(&self, ticket: Ticket) -> Resolution {
        let session = self.store.get();
        self.publish(
            ticket,
            ReconcilePhase::Resolved {
                authenticated: session.is_authenticated(),
            },
        );
        self.store.mark_settled(ticket);
        Resolution {
            ticket,
            session,
            superseded: false,
        }
    }

    /// The settled state without starting a cycle, for re-evaluating a view
    /// after the session changed under it
    pub(crate) fn settled(&self) -> Resolution {
        Resolution {
            ticket: self.store.current_ticket(),
            session: self.store.get(),
            superseded: false,
        }
    }

    /// Run one cycle for a navigation to `route`
    pub async fn reconcile(&self, route: &Route) -> Resolution {
        let ticket = self.store.next_ticket();

        if route.is_exempt() {
            return self.resolve(ticket);
        }

        let current = self.store.get();
        if !self.needs_validation(&current) {
            self.publish(ticket, ReconcilePhase::TrustingCache);
            return self.resolve(ticket);
        }

        self.publish(ticket, ReconcilePhase::Validating);
        let session = match self.api.who_am_i().await {
            Ok(identity) => Session::from(identity),
            Err(e) => {
                debug!(error = %e, "Session check failed, treating as signed out");
                Session::Unauthenticated
            }
        };

        let accepted = match self.store.commit(ticket, session) {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Failed to update durable session record: {}", e);
                true
            }
        };

        if accepted {
            return self.resolve(ticket);
        }

        debug!(
            ticket = ticket.sequence(),
            route = %route,
            "Discarding stale session check"
        );
        // the store may still hold a value a newer check is about to replace
        let session = self.store.wait_settled().await;
        Resolution {
            ticket,
            session,
            superseded: true,
        }
    }
}
