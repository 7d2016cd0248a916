//! File-backed credential store.
//!
//! The credential set lives in one JSON document of five flat string
//! values. `user` is stored as a JSON-encoded string so every key stays
//! uniformly string-typed. The file holds either all five keys or is
//! treated as empty; saves go through a temp file and rename.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use tally_application::ports::{CredentialStore, StoreError};
use tally_domain::{CredentialSet, UserProfile};

/// On-disk shape: the five flat keys, each optional so a partial file
/// still deserializes and can be rejected as a whole.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredFields {
    access_token: Option<String>,
    access_token_expires: Option<String>,
    refresh_token: Option<String>,
    refresh_token_expires: Option<String>,
    user: Option<String>,
}

impl StoredFields {
    fn from_credentials(credentials: &CredentialSet) -> Result<Self, StoreError> {
        let user = serde_json::to_string(&credentials.user)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self {
            access_token: Some(credentials.access_token.clone()),
            access_token_expires: Some(credentials.access_token_expires.to_rfc3339()),
            refresh_token: Some(credentials.refresh_token.clone()),
            refresh_token_expires: Some(credentials.refresh_token_expires.to_rfc3339()),
            user: Some(user),
        })
    }

    /// All five keys present and decodable, or no session at all.
    fn into_credentials(self) -> Result<Option<CredentialSet>, StoreError> {
        let (
            Some(access_token),
            Some(access_token_expires),
            Some(refresh_token),
            Some(refresh_token_expires),
            Some(user),
        ) = (
            self.access_token,
            self.access_token_expires,
            self.refresh_token,
            self.refresh_token_expires,
            self.user,
        )
        else {
            return Ok(None);
        };

        let access_token_expires = parse_timestamp(&access_token_expires)?;
        let refresh_token_expires = parse_timestamp(&refresh_token_expires)?;
        let user: UserProfile = serde_json::from_str(&user)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        Ok(Some(CredentialSet {
            access_token,
            access_token_expires,
            refresh_token,
            refresh_token_expires,
            user,
        }))
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

/// File-backed [`CredentialStore`].
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store over the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the conventional `credentials.json` inside a
    /// state directory.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("credentials.json"))
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "credentials.json".to_string());
        self.path
            .with_file_name(format!("{file_name}.{}.tmp", std::process::id()))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn save(&self, credentials: &CredentialSet) -> Result<(), StoreError> {
        let fields = StoredFields::from_credentials(credentials)?;
        let json = serde_json::to_string_pretty(&fields)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        // Temp file + rename so a crashed save never leaves a torn set.
        let temp = self.temp_path();
        fs::write(&temp, json).await?;
        fs::rename(&temp, &self.path).await?;
        Ok(())
    }

    async fn load(&self) -> Result<Option<CredentialSet>, StoreError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(StoreError::Io(error)),
        };
        let fields: StoredFields = serde_json::from_str(&contents)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fields.into_credentials()
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(StoreError::Io(error)),
        }
    }
}
