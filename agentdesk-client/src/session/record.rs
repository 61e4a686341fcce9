//! Durable session record
//!
//! A key/value file standing in for browser local storage. Only the `user`
//! slot is used: the JSON-serialized identity of the last known session.
//! The record is a cache and is never treated as proof of a live session.

use agentdesk_core::{DeskError, DeskResult, ErrorContext, Identity};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Name of the slot holding the identity
pub const USER_SLOT: &str = "user";

/// Persistent slot for the last known identity
pub trait SessionRecord: Send + Sync + std::fmt::Debug {
    /// The stored identity, if any. Unreadable content counts as absent.
    fn load(&self) -> DeskResult<Option<Identity>>;

    fn save(&self, identity: &Identity) -> DeskResult<()>;

    fn clear(&self) -> DeskResult<()>;
}

/// Session record kept in a JSON file
#[derive(Debug, Clone)]
pub struct FileSessionRecord {
    path: PathBuf,
}

impl FileSessionRecord {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `<data dir>/agentdesk/session.json`, or the working directory when the
    /// platform has no data dir
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("agentdesk"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_slots(&self) -> DeskResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| storage_error(e, "read"))?;
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(slots)) => Ok(slots),
            Ok(_) | Err(_) => {
                warn!("Ignoring unreadable session record {}", self.path.display());
                Ok(Map::new())
            }
        }
    }

    fn write_slots(&self, slots: &Map<String, Value>) -> DeskResult<()> {
        if slots.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).map_err(|e| storage_error(e, "remove"))?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| storage_error(e, "create_dir"))?;
            }
        }

        let json = serde_json::to_string_pretty(slots)?;
        std::fs::write(&self.path, json).map_err(|e| storage_error(e, "write"))
    }
}

impl SessionRecord for FileSessionRecord {
    fn load(&self) -> DeskResult<Option<Identity>> {
        let mut slots = self.read_slots()?;
        let Some(user) = slots.remove(USER_SLOT) else {
            return Ok(None);
        };
        if user.is_null() {
            return Ok(None);
        }

        match serde_json::from_value::<Identity>(user) {
            Ok(identity) => {
                debug!(user_id = %identity.id, "Loaded durable session record");
                Ok(Some(identity))
            }
            Err(e) => {
                warn!("Discarding malformed user slot in {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    fn save(&self, identity: &Identity) -> DeskResult<()> {
        let mut slots = self.read_slots()?;
        slots.insert(USER_SLOT.to_string(), serde_json::to_value(identity)?);
        self.write_slots(&slots)
    }

    fn clear(&self) -> DeskResult<()> {
        let mut slots = self.read_slots()?;
        if slots.remove(USER_SLOT).is_some() || self.path.exists() {
            self.write_slots(&slots)?;
        }
        Ok(())
    }
}

/// In-memory record, used by tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemorySessionRecord {
    slot: Mutex<Option<String>>,
}

impl MemorySessionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(identity: &Identity) -> DeskResult<Self> {
        Ok(Self {
            slot: Mutex::new(Some(serde_json::to_string(identity)?)),
        })
    }

    /// The serialized slot content, exactly as a reader would find it
    pub fn raw(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionRecord for MemorySessionRecord {
    fn load(&self) -> DeskResult<Option<Identity>> {
        match self.lock().as_deref() {
            Some(raw) => Ok(serde_json::from_str(raw).ok()),
            None => Ok(None),
        }
    }

    fn save(&self, identity: &Identity) -> DeskResult<()> {
        *self.lock() = Some(serde_json::to_string(identity)?);
        Ok(())
    }

    fn clear(&self) -> DeskResult<()> {
        *self.lock() = None;
        Ok(())
    }
}

fn storage_error(error: std::io::Error, operation: &str) -> DeskError {
    DeskError::Storage {
        message: format!("Session record {} failed: {}", operation, error),
        source: Some(Box::new(error)),
        context: ErrorContext::new("session_record").with_operation(operation),
    }
}
