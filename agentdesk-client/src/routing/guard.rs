//! Route guard

use super::route::Route;
use crate::session::Resolution;

/// What the view layer should do with a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    Redirect(Route),
    NotFound,
}

impl GuardDecision {
    pub fn route(&self) -> Option<&Route> {
        match self {
            GuardDecision::Render(route) | GuardDecision::Redirect(route) => Some(route),
            GuardDecision::NotFound => None,
        }
    }
}

/// Gates protected views on a resolved session.
///
/// Takes a [`Resolution`] rather than the store so it cannot be consulted
/// before reconciliation has finished for the navigation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    pub fn evaluate(&self, route: &Route, resolution: &Resolution) -> GuardDecision {
        match route {
            Route::Root => GuardDecision::Redirect(Route::home()),
            route if route.is_protected() && !resolution.is_authenticated() => {
                GuardDecision::Redirect(Route::Login)
            }
            route => GuardDecision::Render(route.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_core::{Identity, Session};

    fn signed_in() -> Resolution {
        Resolution::settled(Session::Authenticated(Identity::new("u1", "A")))
    }

    fn signed_out() -> Resolution {
        Resolution::settled(Session::Unauthenticated)
    }

    #[test]
    fn protected_routes_need_a_session() {
        let guard = RouteGuard;
        let project = Route::Project("42".into());

        assert_eq!(
            guard.evaluate(&project, &signed_out()),
            GuardDecision::Redirect(Route::Login)
        );
        assert_eq!(
            guard.evaluate(&project, &signed_in()),
            GuardDecision::Render(project.clone())
        );
    }

    #[test]
    fn auth_pages_always_render() {
        let guard = RouteGuard;
        for route in [Route::Login, Route::Register] {
            assert_eq!(guard.evaluate(&route, &signed_out()), GuardDecision::Render(route.clone()));
            assert_eq!(guard.evaluate(&route, &signed_in()), GuardDecision::Render(route.clone()));
        }
    }

    #[test]
    fn root_redirects_home() {
        assert_eq!(
            RouteGuard.evaluate(&Route::Root, &signed_out()),
            GuardDecision::Redirect(Route::Projects)
        );
    }
}
