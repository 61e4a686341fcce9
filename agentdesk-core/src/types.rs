//! Core data type definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Descriptor of the authenticated caller as returned by the server.
///
/// Only `id` and `name` are named; every other profile field the API sends is
/// kept verbatim in `profile` so the record survives a persistence round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl Identity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            profile: Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.profile.insert(key.to_string(), value.into());
        self
    }

    /// Name to show in a navigation bar
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// The client's belief about who is logged in
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Session {
    #[default]
    Unauthenticated,
    Authenticated(Identity),
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Authenticated(identity) => Some(identity),
            Session::Unauthenticated => None,
        }
    }

    /// True when `other` differs in the authenticated/unauthenticated sense
    pub fn discriminant_differs(&self, other: &Session) -> bool {
        self.is_authenticated() != other.is_authenticated()
    }
}

impl From<Option<Identity>> for Session {
    fn from(identity: Option<Identity>) -> Self {
        match identity {
            Some(identity) => Session::Authenticated(identity),
            None => Session::Unauthenticated,
        }
    }
}

/// When a live authenticated session is re-checked against the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// Any authenticated session in memory is trusted until logout
    #[default]
    TrustCache,
    /// An identity restored from disk is confirmed once, then trusted
    ValidateOnce,
    /// Every protected navigation asks the server
    AlwaysValidate,
}

impl std::fmt::Display for ReconcilePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcilePolicy::TrustCache => write!(f, "trust_cache"),
            ReconcilePolicy::ValidateOnce => write!(f, "validate_once"),
            ReconcilePolicy::AlwaysValidate => write!(f, "always_validate"),
        }
    }
}

impl std::str::FromStr for ReconcilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "trust_cache" => Ok(ReconcilePolicy::TrustCache),
            "validate_once" => Ok(ReconcilePolicy::ValidateOnce),
            "always_validate" => Ok(ReconcilePolicy::AlwaysValidate),
            _ => Err(format!("Unknown reconcile policy: {}", s)),
        }
    }
}
