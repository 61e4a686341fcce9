//! Route surface of the client

use std::fmt;

/// A location the client can navigate to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Register,
    Projects,
    Project(String),
    Chat(String),
}

impl Route {
    /// Parse a path such as `/projects/42`. Query strings and fragments are
    /// ignored; unknown paths yield `None`.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Root),
            ["login"] => Some(Route::Login),
            ["register"] => Some(Route::Register),
            ["projects"] => Some(Route::Projects),
            ["projects", id] => Some(Route::Project(id.to_string())),
            ["chat", agent_id] => Some(Route::Chat(agent_id.to_string())),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Root => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Projects => "/projects".to_string(),
            Route::Project(id) => format!("/projects/{}", id),
            Route::Chat(agent_id) => format!("/chat/{}", agent_id),
        }
    }

    /// Auth pages skip reconciliation entirely
    pub fn is_exempt(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Projects | Route::Project(_) | Route::Chat(_))
    }

    /// Where `/` sends the visitor
    pub fn home() -> Route {
        Route::Projects
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_route_surface() {
        assert_eq!(Route::parse("/"), Some(Route::Root));
        assert_eq!(Route::parse(""), Some(Route::Root));
        assert_eq!(Route::parse("/login"), Some(Route::Login));
        assert_eq!(Route::parse("/register/"), Some(Route::Register));
        assert_eq!(Route::parse("/projects"), Some(Route::Projects));
        assert_eq!(Route::parse("/projects/42"), Some(Route::Project("42".into())));
        assert_eq!(Route::parse("/chat/5?tab=history"), Some(Route::Chat("5".into())));
        assert_eq!(Route::parse("/projects/42/agents"), None);
        assert_eq!(Route::parse("/settings"), None);
    }

    #[test]
    fn exempt_and_protected_are_disjoint() {
        for path in ["/", "/login", "/register", "/projects", "/projects/1", "/chat/2"] {
            let route = Route::parse(path).unwrap();
            assert!(!(route.is_exempt() && route.is_protected()), "{}", path);
            assert_eq!(route.path(), if path == "/" { "/" } else { path });
        }
        assert!(Route::Login.is_exempt());
        assert!(!Route::Root.is_protected());
        assert!(Route::Chat("5".into()).is_protected());
    }
}
