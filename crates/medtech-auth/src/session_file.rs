//! Session persistence between runs
//!
//! One canonical file, `session.json`, holds the serialized credential. All
//! writes are atomic (temp file + rename) with 0600 permissions since the
//! file contains a live access token.
//!
//! Earlier releases scattered the session across differently named files
//! (`auth.json`, `token.json`). Those are a one-time migration source only:
//! consulted when the canonical file is absent, rewritten canonically, then
//! deleted. They are never a steady-state lookup path.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::credential::Credential;
use crate::error::{Error, Result};

/// Canonical session file name.
const SESSION_FILE: &str = "session.json";

/// File names the session was stored under by earlier releases, in the
/// order they are consulted during migration.
const LEGACY_FILES: &[&str] = &["auth.json", "token.json"];

/// Reads and writes the persisted session inside one directory.
pub struct SessionFile {
    dir: PathBuf,
}

impl SessionFile {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn canonical_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    /// Load the persisted credential, if any.
    ///
    /// A missing session is `None`, not an error. When only legacy files
    /// exist, the first parseable one is promoted to the canonical file and
    /// every legacy file is removed, so the scan never happens twice.
    pub async fn load(&self) -> Result<Option<Credential>> {
        let canonical = self.canonical_path();
        if canonical.exists() {
            let credential = read_credential(&canonical).await?;
            return Ok(Some(credential));
        }

        let mut migrated = None;
        for &name in LEGACY_FILES {
            let legacy = self.dir.join(name);
            if !legacy.exists() {
                continue;
            }
            if migrated.is_none() {
                match read_credential(&legacy).await {
                    Ok(credential) => {
                        info!(from = name, "migrating legacy session file");
                        migrated = Some(credential);
                    }
                    Err(e) => {
                        warn!(from = name, error = %e, "discarding unreadable legacy session file");
                    }
                }
            }
            tokio::fs::remove_file(&legacy)
                .await
                .map_err(|e| Error::Io(format!("removing legacy session file {name}: {e}")))?;
        }

        if let Some(credential) = &migrated {
            self.save(credential).await?;
        }
        Ok(migrated)
    }

    /// Persist the credential to the canonical file.
    pub async fn save(&self, credential: &Credential) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::Io(format!("creating session directory: {e}")))?;
        write_atomic(&self.canonical_path(), credential).await
    }

    /// Delete the persisted session. Missing file is fine.
    pub async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_file(self.canonical_path()).await {
            Ok(()) => {
                debug!("removed persisted session");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(format!("removing session file: {e}"))),
        }
    }
}

async fn read_credential(path: &Path) -> Result<Credential> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Io(format!("reading session file: {e}")))?;
    serde_json::from_str(&contents)
        .map_err(|e| Error::SessionParse(format!("parsing {}: {e}", path.display())))
}

/// Write the credential atomically: temp file in the same directory, 0600,
/// then rename over the target.
async fn write_atomic(path: &Path, credential: &Credential) -> Result<()> {
    let json = serde_json::to_string_pretty(credential)
        .map_err(|e| Error::SessionParse(format!("serializing session: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("session path has no parent directory".into()))?;
    let tmp_path = dir.join(format!(".session.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp session file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting session file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp session file: {e}")))?;

    debug!(path = %path.display(), "persisted session");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Identity, Role};

    fn test_credential(token: &str) -> Credential {
        Credential {
            access_token: token.into(),
            identity: Identity {
                id: "u-1".into(),
                email: "a@clinic.example".into(),
                role: Role::Admin,
                first_name: None,
                last_name: None,
            },
        }
    }

    #[tokio::test]
    async fn missing_session_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().to_path_buf());
        assert!(file.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().to_path_buf());

        file.save(&test_credential("at_1")).await.unwrap();
        let loaded = file.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "at_1");
        assert_eq!(loaded.identity.role, Role::Admin);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().to_path_buf());

        file.save(&test_credential("at_1")).await.unwrap();
        file.remove().await.unwrap();
        assert!(file.load().await.unwrap().is_none());
        file.remove().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn session_file_is_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().to_path_buf());
        file.save(&test_credential("at_1")).await.unwrap();

        let metadata = tokio::fs::metadata(dir.path().join(SESSION_FILE)).await.unwrap();
        let mode = metadata.permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "session file must be 0600, got {mode:o}");
    }

    #[tokio::test]
    async fn legacy_file_migrates_once() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("auth.json");
        let json = serde_json::to_string(&test_credential("at_legacy")).unwrap();
        tokio::fs::write(&legacy, json).await.unwrap();

        let file = SessionFile::new(dir.path().to_path_buf());
        let loaded = file.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "at_legacy");

        // Promoted to the canonical file; legacy artifact gone.
        assert!(dir.path().join(SESSION_FILE).exists());
        assert!(!legacy.exists());

        // Second load comes straight from the canonical file.
        let again = file.load().await.unwrap().unwrap();
        assert_eq!(again.access_token, "at_legacy");
    }

    #[tokio::test]
    async fn first_parseable_legacy_file_wins_and_all_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let auth = dir.path().join("auth.json");
        let token = dir.path().join("token.json");
        tokio::fs::write(&auth, serde_json::to_string(&test_credential("at_a")).unwrap())
            .await
            .unwrap();
        tokio::fs::write(&token, serde_json::to_string(&test_credential("at_b")).unwrap())
            .await
            .unwrap();

        let file = SessionFile::new(dir.path().to_path_buf());
        let loaded = file.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "at_a");
        assert!(!auth.exists());
        assert!(!token.exists());
    }

    #[tokio::test]
    async fn unreadable_legacy_file_is_skipped_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let auth = dir.path().join("auth.json");
        let token = dir.path().join("token.json");
        tokio::fs::write(&auth, "not json at all").await.unwrap();
        tokio::fs::write(&token, serde_json::to_string(&test_credential("at_b")).unwrap())
            .await
            .unwrap();

        let file = SessionFile::new(dir.path().to_path_buf());
        let loaded = file.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "at_b");
        assert!(!auth.exists());
        assert!(!token.exists());
    }

    #[tokio::test]
    async fn canonical_file_shadows_legacy_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().to_path_buf());
        file.save(&test_credential("at_canonical")).await.unwrap();

        let legacy = dir.path().join("token.json");
        tokio::fs::write(&legacy, serde_json::to_string(&test_credential("at_stale")).unwrap())
            .await
            .unwrap();

        let loaded = file.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "at_canonical");
        // Legacy file untouched: migration only runs when the canonical
        // file is absent.
        assert!(legacy.exists());
    }

    #[tokio::test]
    async fn corrupt_canonical_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(SESSION_FILE), "{{{")
            .await
            .unwrap();

        let file = SessionFile::new(dir.path().to_path_buf());
        let err = file.load().await.unwrap_err();
        assert!(matches!(err, Error::SessionParse(_)), "got: {err:?}");
    }
}
