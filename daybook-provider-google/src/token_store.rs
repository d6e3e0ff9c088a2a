//! Persisted Google OAuth access token.
//!
//! Stored as versioned JSON at `~/.config/daybook/google/token.json`:
//!
//! ```json
//! { "version": "1.0", "token": { "access_token": "...", "expires_at": 1717000000000, ... } }
//! ```
//!
//! Timestamps are milliseconds since the Unix epoch. A file with another
//! version or a broken structure is deleted on load and treated as
//! signed-out.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TOKEN_VERSION: &str = "1.0";

/// Tokens this close to expiry already count as expired.
const EXPIRY_BUFFER_MS: i64 = 60_000;

const DEFAULT_EXPIRES_IN: i64 = 3600;

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn default_expires_in() -> i64 {
    DEFAULT_EXPIRES_IN
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub expires_at: i64,
    #[serde(default)]
    pub scope: String,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub stored_at: i64,
}

/// Token as returned by an OAuth token endpoint or exported by a browser
/// sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    /// Milliseconds since the epoch.
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub scope: String,
}

impl StoredToken {
    /// Fill in the defaults a bare token response leaves out.
    pub fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        let expires_in = response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);
        let now_ms = now.timestamp_millis();

        StoredToken {
            access_token: response.access_token,
            token_type: response.token_type.unwrap_or_else(default_token_type),
            expires_in,
            expires_at: response.expires_at.unwrap_or(now_ms + expires_in * 1000),
            scope: response.scope,
            stored_at: now_ms,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires_at)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now.timestamp_millis() + EXPIRY_BUFFER_MS
    }

    /// Present, structurally complete and not about to expire.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.is_structurally_valid() && !self.is_expired(now)
    }

    fn is_structurally_valid(&self) -> bool {
        !self.access_token.is_empty() && self.expires_at != 0
    }

    /// Whether the granted scopes allow reading calendar events.
    pub fn has_calendar_scope(&self) -> bool {
        let scope = self.scope.to_lowercase();
        scope.contains("calendar.readonly")
            || scope
                .split_whitespace()
                .any(|s| s == "calendar" || s.ends_with("/auth/calendar"))
    }
}

#[derive(Serialize, Deserialize)]
struct TokenFile {
    version: String,
    token: StoredToken,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpirationInfo {
    pub is_expired: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub expires_in_minutes: Option<i64>,
}

impl ExpirationInfo {
    pub fn of(token: Option<&StoredToken>, now: DateTime<Utc>) -> Self {
        match token {
            None => ExpirationInfo {
                is_expired: true,
                expires_at: None,
                expires_in_minutes: None,
            },
            Some(token) => ExpirationInfo {
                is_expired: token.is_expired(now),
                expires_at: token.expires_at(),
                expires_in_minutes: Some(
                    (token.expires_at - now.timestamp_millis()).div_euclid(60_000),
                ),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Could not determine config directory")?
            .join("daybook")
            .join("google")
            .join("token.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, token: &StoredToken) -> Result<()> {
        let file = TokenFile {
            version: TOKEN_VERSION.to_string(),
            token: token.clone(),
        };
        let contents = serde_json::to_string_pretty(&file).context("Failed to serialize token")?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write token to {}", self.path.display()))?;

        // Owner-only, the file holds a bearer token:
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", self.path.display()))?;
        }

        tracing::info!(
            expires_at = ?token.expires_at(),
            scope = %token.scope,
            "token saved"
        );
        Ok(())
    }

    /// The stored token, or `None` when signed out.
    ///
    /// Unreadable, unparseable, wrong-version and incomplete files are
    /// removed.
    pub fn load(&self) -> Option<StoredToken> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no stored token");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "could not read token: {}", e);
                return None;
            }
        };

        let file: TokenFile = match serde_json::from_str(&contents) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("stored token is not valid JSON, clearing: {}", e);
                self.clear();
                return None;
            }
        };

        if file.version != TOKEN_VERSION {
            tracing::warn!(version = %file.version, "token version mismatch, clearing");
            self.clear();
            return None;
        }

        if !file.token.is_structurally_valid() {
            tracing::warn!("invalid token structure, clearing");
            self.clear();
            return None;
        }

        Some(file.token)
    }

    pub fn is_token_valid(token: Option<&StoredToken>, now: DateTime<Utc>) -> bool {
        token.is_some_and(|t| t.is_valid(now))
    }

    /// Remove the token file. A missing file is not an error.
    pub fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::info!("token cleared"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), "could not remove token: {}", e),
        }
    }
}
