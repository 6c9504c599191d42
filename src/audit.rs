//! Append-only audit trail of ingestion and scoring actions.
//!
//! Log format: JSON Lines, one [`AuditEntry`] per line.
//! Recording is fire-and-forget: failures are logged, never returned.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// One traceability record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub actor: String,
    pub target: String,
    /// SHA-256 of the content acted upon, hex encoded
    pub sha256: Option<String>,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl AuditEntry {
    pub fn new(action: impl Into<String>, actor: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            action: action.into(),
            actor: actor.into(),
            target: target.into(),
            sha256: None,
            meta: Map::new(),
        }
    }

    /// Attach the checksum of uploaded content
    pub fn with_content(mut self, content: &[u8]) -> Self {
        self.sha256 = Some(Self::checksum(content));
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Hex-encoded SHA-256 digest
    pub fn checksum(content: &[u8]) -> String {
        hex::encode(Sha256::digest(content))
    }
}

/// JSON-lines audit sink
pub struct AuditLog {
    path: Option<PathBuf>,
    /// Serializes appends from concurrent tasks
    write_lock: Mutex<()>,
}

impl AuditLog {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            write_lock: Mutex::new(()),
        }
    }

    /// Sink that drops every entry
    pub fn disabled() -> Self {
        Self {
            path: None,
            write_lock: Mutex::new(()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Record an entry; never fails the caller
    pub fn record(&self, entry: &AuditEntry) {
        if let Err(e) = self.append(entry) {
            warn!(action = %entry.action, error = %e, "Failed to write audit entry");
        }
    }

    fn append(&self, entry: &AuditEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let line = serde_json::to_string(entry)?;
        let _guard = self.write_lock.lock();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create audit directory {:?}", parent))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open audit log {:?}", path))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Read every entry back, skipping lines that do not parse
    pub fn read_all(&self) -> Result<Vec<AuditEntry>> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(error = %e, "Skipping malformed audit line"),
            }
        }
        Ok(entries)
    }
}
