//! Transport credentials
//!
//! The server keeps the session in an HTTP cookie. Every client shares one
//! `reqwest` cookie jar; `CredentialJar` additionally remembers the raw
//! `Set-Cookie` values so they can be written to disk and restored by a later
//! process, the way a browser keeps its cookies across reloads.

use agentdesk_core::{DeskError, DeskResult, ErrorContext};
use chrono::{DateTime, Utc};
use reqwest::cookie::Jar;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct CredentialJar {
    jar: Arc<Jar>,
    origin: Url,
    /// cookie name -> full Set-Cookie value
    cookies: Arc<Mutex<BTreeMap<String, String>>>,
}

impl CredentialJar {
    pub fn new(base_url: &str) -> DeskResult<Self> {
        let origin = Url::parse(base_url).map_err(|e| DeskError::Config {
            message: format!("Invalid API base URL '{}': {}", base_url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("credentials").with_operation("new"),
        })?;

        Ok(Self {
            jar: Arc::new(Jar::default()),
            origin,
            cookies: Arc::new(Mutex::new(BTreeMap::new())),
        })
    }

    pub(crate) fn jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }

    /// Remember every `Set-Cookie` the server sent with `response`
    pub(crate) fn record_response(&self, response: &reqwest::Response) {
        for value in response.headers().get_all(reqwest::header::SET_COOKIE) {
            if let Ok(raw) = value.to_str() {
                self.record(raw);
            }
        }
    }

    fn record(&self, raw: &str) {
        let Some(name) = cookie_name(raw) else {
            return;
        };
        let mut cookies = self.lock();
        if is_expiring(raw) {
            cookies.remove(&name);
        } else {
            cookies.insert(name, raw.to_string());
        }
    }

    /// Number of cookies currently remembered
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all remembered credentials and expire them in the live jar
    pub fn forget(&self) {
        let mut cookies = self.lock();
        for (name, raw) in cookies.iter() {
            let expired = format!("{}=; Max-Age=0; Path={}", name, cookie_path(raw));
            self.jar.add_cookie_str(&expired, &self.origin);
        }
        cookies.clear();
        debug!("Forgot transport credentials");
    }

    /// Restore credentials saved by an earlier process
    pub fn load(&self, path: &Path) -> DeskResult<usize> {
        if !path.exists() {
            return Ok(0);
        }

        let content = std::fs::read_to_string(path)?;
        let saved: BTreeMap<String, String> = match serde_json::from_str(&content) {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Ignoring unreadable credentials file {}: {}", path.display(), e);
                return Ok(0);
            }
        };

        let mut cookies = self.lock();
        for (name, raw) in saved {
            self.jar.add_cookie_str(&raw, &self.origin);
            cookies.insert(name, raw);
        }

        debug!("Restored {} credential(s) from {}", cookies.len(), path.display());
        Ok(cookies.len())
    }

    /// Write remembered credentials to `path`; an empty jar removes the file
    pub fn save(&self, path: &Path) -> DeskResult<()> {
        let cookies = self.lock().clone();

        if cookies.is_empty() {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(&cookies)?)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map only means another thread panicked mid-insert
        self.cookies.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn cookie_name(raw: &str) -> Option<String> {
    let pair = raw.split(';').next()?.trim();
    let (name, _) = pair.split_once('=')?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn attributes(raw: &str) -> impl Iterator<Item = (String, String)> + '_ {
    raw.split(';').skip(1).map(|attr| {
        let (key, value) = attr.split_once('=').unwrap_or((attr, ""));
        (key.trim().to_ascii_lowercase(), value.trim().to_string())
    })
}

fn cookie_path(raw: &str) -> String {
    attributes(raw)
        .find(|(key, _)| key == "path")
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "/".to_string())
}

fn is_expiring(raw: &str) -> bool {
    attributes(raw).any(|(key, value)| match key.as_str() {
        "max-age" => value.parse::<i64>().map(|age| age <= 0).unwrap_or(false),
        "expires" => expires_at(&value).is_some_and(|at| at <= Utc::now()),
        _ => false,
    })
}

/// Parse an `Expires` date; both `01 Jan 1970` and `01-Jan-1970` occur
fn expires_at(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(&value.replace('-', " "))
        .ok()
        .map(|at| at.with_timezone(&Utc))
}
