//! Navigator
//!
//! Composes reconciliation and the guard: every navigation resolves the
//! session first, then asks the guard what to show.

use super::guard::{GuardDecision, RouteGuard};
use super::route::Route;
use crate::session::{ReconcilePhase, SessionReconciler, SessionWatcher};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Redirect hops `open` follows before giving up
const MAX_REDIRECTS: usize = 4;

pub struct Navigator {
    reconciler: Arc<SessionReconciler>,
    guard: RouteGuard,
    location: Mutex<Option<Route>>,
}

impl Navigator {
    pub fn new(reconciler: Arc<SessionReconciler>) -> Self {
        Self {
            reconciler,
            guard: RouteGuard,
            location: Mutex::new(None),
        }
    }

    pub fn reconciler(&self) -> &Arc<SessionReconciler> {
        &self.reconciler
    }

    pub fn phase(&self) -> ReconcilePhase {
        self.reconciler.phase()
    }

    /// The last route that rendered
    pub fn location(&self) -> Option<Route> {
        self.lock().clone()
    }

    /// One navigation: parse, reconcile, guard
    pub async fn navigate(&self, path: &str) -> GuardDecision {
        let Some(route) = Route::parse(path) else {
            debug!(path = path, "No route matches");
            return GuardDecision::NotFound;
        };

        if route == Route::Root {
            return GuardDecision::Redirect(Route::home());
        }

        let resolution = self.reconciler.reconcile(&route).await;
        let decision = self.guard.evaluate(&route, &resolution);

        // an overtaken navigation must not move the view away from the newer one
        let current = !resolution.superseded()
            && self.reconciler.store().is_current(resolution.ticket());
        if let (GuardDecision::Render(rendered), true) = (&decision, current) {
            *self.lock() = Some(rendered.clone());
        }
        debug!(route = %route, ?decision, current, "Navigation settled");
        decision
    }

    /// Navigate and follow redirects until something renders
    pub async fn open(&self, path: &str) -> GuardDecision {
        let mut decision = self.navigate(path).await;
        for _ in 0..MAX_REDIRECTS {
            match &decision {
                GuardDecision::Redirect(target) => {
                    let target = target.path();
                    decision = self.navigate(&target).await;
                }
                _ => break,
            }
        }
        decision
    }

    /// Re-run the guard for the current location whenever the session flips
    /// between signed in and signed out
    pub fn watch_session(&self) -> SessionFollower<'_> {
        SessionFollower {
            navigator: self,
            watcher: self.reconciler.store().subscribe(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Route>> {
        self.location.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Guard decisions for the current location, one per session flip
pub struct SessionFollower<'a> {
    navigator: &'a Navigator,
    watcher: SessionWatcher,
}

impl SessionFollower<'_> {
    /// `None` once the session store is gone
    pub async fn next(&mut self) -> Option<GuardDecision> {
        loop {
            self.watcher.changed().await?;
            let Some(route) = self.navigator.location() else {
                continue;
            };

            let resolution = self.navigator.reconciler.settled();
            let decision = self.navigator.guard.evaluate(&route, &resolution);
            debug!(route = %route, ?decision, "Session changed, guard re-evaluated");
            return Some(decision);
        }
    }
}
