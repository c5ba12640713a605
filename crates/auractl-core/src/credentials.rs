//! On-disk credential storage
//!
//! Client identities and their cached bearer tokens live in a single JSON
//! file (`credentials.json`) next to the config file. Writes go through a
//! temp file in the same directory followed by a rename, so a concurrent
//! reader sees either the old or the new file and never a partial one. The
//! file is created owner-only (0600 on Unix).
//!
//! There is no cross-process locking. Two invocations refreshing at the same
//! time both write a valid token; the last writer wins.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, trace};

/// Name of the credentials file inside the config directory
pub const CREDENTIALS_FILE_NAME: &str = "credentials.json";

/// Errors from reading or updating the credentials file
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to read credentials from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write credentials to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Credentials file {path} is corrupt: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize credentials: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Credential '{name}' not found")]
    NotFound { name: String },

    #[error("Credential '{name}' already exists")]
    AlreadyExists { name: String },

    #[error("No credentials configured")]
    NoneConfigured,

    #[error("No default credential set; choose one of: {}", .available.join(", "))]
    NoDefault { available: Vec<String> },
}

pub type Result<T> = std::result::Result<T, CredentialError>;

/// A bearer token together with its absolute expiry
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// True when the token outlives `now + margin`
    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: TimeDelta) -> bool {
        self.expires_at > now + margin
    }
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("access_token", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// One named client identity and its cached token, if any
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Credential {
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<CachedToken>,
}

impl Credential {
    pub fn new(
        name: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: None,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("token", &self.token)
            .finish()
    }
}

/// Contents of the credentials file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_credential: Option<String>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Credential> {
        self.credentials.iter().find(|c| c.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Credential> {
        self.credentials.iter_mut().find(|c| c.name == name)
    }

    /// Add a credential. The first one added becomes the default.
    pub fn add(&mut self, credential: Credential) -> Result<()> {
        if self.get(&credential.name).is_some() {
            return Err(CredentialError::AlreadyExists {
                name: credential.name,
            });
        }
        if self.default_credential.is_none() {
            self.default_credential = Some(credential.name.clone());
        }
        self.credentials.push(credential);
        Ok(())
    }

    /// Remove a credential, clearing the default if it pointed at it
    pub fn remove(&mut self, name: &str) -> Result<Credential> {
        let index = self
            .credentials
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| not_found(name))?;
        if self.default_credential.as_deref() == Some(name) {
            self.default_credential = None;
        }
        Ok(self.credentials.remove(index))
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if self.get(name).is_none() {
            return Err(not_found(name));
        }
        self.default_credential = Some(name.to_string());
        Ok(())
    }

    /// Resolve which credential a command should use.
    ///
    /// Resolution order:
    /// 1. The explicitly requested name
    /// 2. The default credential
    /// 3. The only credential, when exactly one exists
    pub fn active(&self, explicit: Option<&str>) -> Result<&Credential> {
        if let Some(name) = explicit {
            return self.get(name).ok_or_else(|| not_found(name));
        }
        if let Some(name) = &self.default_credential {
            return self.get(name).ok_or_else(|| not_found(name));
        }
        match self.credentials.as_slice() {
            [] => Err(CredentialError::NoneConfigured),
            [only] => Ok(only),
            many => Err(CredentialError::NoDefault {
                available: many.iter().map(|c| c.name.clone()).collect(),
            }),
        }
    }
}

fn not_found(name: &str) -> CredentialError {
    CredentialError::NotFound {
        name: name.to_string(),
    }
}

/// File-backed credential store
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<dir>/credentials.json`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CREDENTIALS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the credentials file.
    ///
    /// A missing or empty file yields empty credentials so a first-time
    /// `credential add` can populate it.
    pub fn load(&self) -> Result<Credentials> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No credentials file at {}", self.path.display());
                return Ok(Credentials::default());
            }
            Err(e) => {
                return Err(CredentialError::Read {
                    path: self.path.display().to_string(),
                    source: e,
                });
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Credentials::default());
        }

        serde_json::from_slice(&bytes).map_err(|e| CredentialError::Parse {
            path: self.path.display().to_string(),
            source: e,
        })
    }

    /// Atomically replace the credentials file with owner-only permissions
    pub fn save(&self, credentials: &Credentials) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let write_err = |source: io::Error| CredentialError::Write {
            path: self.path.display().to_string(),
            source,
        };

        fs::create_dir_all(&dir).map_err(write_err)?;

        let mut contents =
            serde_json::to_vec_pretty(credentials).map_err(CredentialError::Serialize)?;
        contents.push(b'\n');

        // NamedTempFile is created 0600 on Unix; set it explicitly anyway so
        // the rename never publishes a wider mode.
        let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }
        tmp.write_all(&contents).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        trace!("Wrote {} credentials to {}", credentials.credentials.len(), self.path.display());
        Ok(())
    }

    /// Load, apply `update`, and save
    pub fn update<T>(&self, update: impl FnOnce(&mut Credentials) -> Result<T>) -> Result<T> {
        let mut credentials = self.load()?;
        let result = update(&mut credentials)?;
        self.save(&credentials)?;
        Ok(result)
    }

    /// Record a freshly obtained token for `name`
    pub fn store_token(&self, name: &str, token: CachedToken) -> Result<()> {
        self.update(|creds| {
            let credential = creds.get_mut(name).ok_or_else(|| not_found(name))?;
            credential.token = Some(token);
            Ok(())
        })
    }

    /// Drop the cached token for `name` (logout).
    ///
    /// With `retain_identity` the client id and secret are kept; otherwise the
    /// whole credential is removed.
    pub fn clear(&self, name: &str, retain_identity: bool) -> Result<()> {
        self.update(|creds| {
            if retain_identity {
                let credential = creds.get_mut(name).ok_or_else(|| not_found(name))?;
                credential.token = None;
            } else {
                creds.remove(name)?;
            }
            Ok(())
        })
    }
}
