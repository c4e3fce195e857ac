//! Persisted defaults for `ccpctl`.
//!
//! A single JSON document holds the control-plane endpoint and credentials,
//! the last session token, and the infrastructure values used to fill in
//! cluster creation requests. It lives at `$CCPCTL_CONF` or `~/.ccpctl.json`
//! and is written with owner-only permissions since it carries a password.

#![forbid(unsafe_code)]

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable overriding the defaults file location.
pub const DEFAULTS_ENV: &str = "CCPCTL_CONF";

/// File name of the defaults file under the home directory.
pub const DEFAULTS_FILE: &str = ".ccpctl.json";

/// Token lifetime assumed when none is configured.
pub const DEFAULT_TOKEN_EXPIRY_MINUTES: u64 = 180;

/// Placeholder shown in place of secrets.
pub const REDACTED: &str = "********";

/// Errors raised while loading or saving defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the defaults file failed.
    #[error("defaults file {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The defaults file is not valid JSON for [`Defaults`].
    #[error("defaults file {path} is malformed: {source}")]
    Parse {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// No explicit path and no home directory to fall back to.
    #[error("cannot locate defaults file: no home directory and CCPCTL_CONF is unset")]
    NoHomeDir,

    /// A value needed for the requested operation has not been configured.
    #[error("{field} is not configured; run `ccpctl config set --{flag} <value>`")]
    Missing {
        /// Dotted field name.
        field: &'static str,
        /// CLI flag that sets it.
        flag: &'static str,
    },
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Control-plane endpoint and credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlPlane {
    /// Display name of the control plane.
    pub name: String,
    /// Base URL, e.g. `https://10.10.20.110`.
    pub url: String,
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Skip TLS certificate verification.
    pub insecure_skip_verify: bool,
}

impl fmt::Debug for ControlPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlPlane")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .finish()
    }
}

/// The last token issued by the control plane.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Token value.
    pub token: String,
    /// When the token was issued.
    pub acquired_at: DateTime<Utc>,
}

impl fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredSession")
            .field("token", &REDACTED)
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

/// SSH access installed on new cluster nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshDefaults {
    /// Node login user.
    pub user: String,
    /// Public key contents.
    pub key: String,
}

/// A name paired with the control-plane id it resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedRef {
    /// Human-facing name.
    pub name: String,
    /// Control-plane id.
    pub id: String,
}

impl NamedRef {
    /// Whether both halves are set.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !self.name.is_empty() && !self.id.is_empty()
    }
}

/// Infrastructure values used when a creation request leaves them out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfraDefaults {
    /// Cluster that commands act on when none is named.
    pub cluster: String,
    /// vSphere compute cluster.
    pub vsphere_cluster: String,
    /// vSphere datacenter.
    pub datacenter: String,
    /// vSphere datastore.
    pub datastore: String,
    /// Port group for node interfaces.
    pub network: String,
    /// Node VM template.
    pub image: String,
    /// Infrastructure provider.
    pub provider: NamedRef,
    /// IP pool subnet.
    pub subnet: NamedRef,
}

/// Everything `ccpctl` persists between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Endpoint and credentials.
    pub control_plane: ControlPlane,
    /// Last issued token, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<StoredSession>,
    /// How long a token is reused before logging in again.
    pub token_expiry_minutes: u64,
    /// Node SSH access.
    pub ssh: SshDefaults,
    /// Infrastructure defaults.
    pub infra: InfraDefaults,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            control_plane: ControlPlane::default(),
            session: None,
            token_expiry_minutes: DEFAULT_TOKEN_EXPIRY_MINUTES,
            ssh: SshDefaults::default(),
            infra: InfraDefaults::default(),
        }
    }
}

impl Defaults {
    /// Returns the control plane if every login field is set. The name is
    /// only a label and may be empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first unset field.
    pub fn require_control_plane(&self) -> Result<&ControlPlane> {
        let cp = &self.control_plane;
        let checks: [(&str, &'static str, &'static str); 3] = [
            (&cp.url, "control_plane.url", "url"),
            (&cp.username, "control_plane.username", "username"),
            (&cp.password, "control_plane.password", "password"),
        ];
        for (value, field, flag) in checks {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing { field, flag });
            }
        }
        Ok(cp)
    }

    /// Token lifetime as a [`Duration`].
    #[must_use]
    pub fn token_expiry(&self) -> Duration {
        Duration::from_secs(self.token_expiry_minutes.saturating_mul(60))
    }

    /// Stores a freshly issued token.
    pub fn record_session(&mut self, token: impl Into<String>, acquired_at: DateTime<Utc>) {
        self.session = Some(StoredSession {
            token: token.into(),
            acquired_at,
        });
    }

    /// Drops the stored token.
    pub fn clear_session(&mut self) {
        self.session = None;
    }

    /// Copy safe to print: password and token are masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.control_plane.password.is_empty() {
            copy.control_plane.password = REDACTED.to_string();
        }
        if let Some(session) = copy.session.as_mut() {
            session.token = REDACTED.to_string();
        }
        copy
    }
}

/// Location of the defaults file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultsStore {
    path: PathBuf,
}

impl DefaultsStore {
    /// Store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Picks the explicit path, then `$CCPCTL_CONF`, then `~/.ccpctl.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] when nothing else applies and the
    /// home directory is unknown.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::at(path));
        }
        if let Some(path) = std::env::var_os(DEFAULTS_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(path));
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(Self::at(home.join(DEFAULTS_FILE)))
    }

    /// Path of the defaults file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads defaults; a missing file yields [`Defaults::default`].
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Defaults> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no defaults file, using built-in defaults");
                return Ok(Defaults::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(Defaults::default());
        }
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes defaults as pretty JSON, owner read/write only.
    ///
    /// # Errors
    ///
    /// Fails if the parent directory cannot be created or the file written.
    pub fn save(&self, defaults: &Defaults) -> Result<()> {
        let io_err = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut json = serde_json::to_string_pretty(defaults).map_err(|source| {
            ConfigError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        json.push('\n');

        write_private(&self.path, json.as_bytes()).map_err(io_err)?;
        info!(path = %self.path.display(), "saved defaults");
        Ok(())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn configured() -> Defaults {
        Defaults {
            control_plane: ControlPlane {
                name: "lab".into(),
                url: "https://10.10.20.110".into(),
                username: "admin".into(),
                password: "C1sco12345".into(),
                insecure_skip_verify: true,
            },
            ssh: SshDefaults {
                user: "ccpuser".into(),
                key: "ssh-ed25519 AAAA".into(),
            },
            infra: InfraDefaults {
                datacenter: "dc1".into(),
                provider: NamedRef {
                    name: "vsphere".into(),
                    id: "p-1".into(),
                },
                ..InfraDefaults::default()
            },
            ..Defaults::default()
        }
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let store = DefaultsStore::at(dir.path().join("absent.json"));

        let defaults = store.load().unwrap();
        assert_eq!(defaults, Defaults::default());
        assert_eq!(defaults.token_expiry_minutes, 180);
        assert!(defaults.session.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = DefaultsStore::at(dir.path().join("ccpctl.json"));
        let mut defaults = configured();
        let issued = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();
        defaults.record_session("tok-1", issued);

        store.save(&defaults).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, defaults);
        assert_eq!(loaded.session.unwrap().acquired_at, issued);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let store = DefaultsStore::at(dir.path().join("nested/deeper/ccpctl.json"));
        store.save(&configured()).unwrap();
        assert!(store.path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ccpctl.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        DefaultsStore::at(&path).save(&configured()).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_partial_file_fills_remaining_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ccpctl.json");
        std::fs::write(&path, r#"{"control_plane": {"url": "https://cp"}}"#).unwrap();

        let loaded = DefaultsStore::at(&path).load().unwrap();
        assert_eq!(loaded.control_plane.url, "https://cp");
        assert_eq!(loaded.token_expiry_minutes, DEFAULT_TOKEN_EXPIRY_MINUTES);
        assert!(loaded.infra.datacenter.is_empty());
    }

    #[test]
    fn test_empty_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ccpctl.json");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(DefaultsStore::at(&path).load().unwrap(), Defaults::default());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ccpctl.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = DefaultsStore::at(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("malformed"));
    }

    #[test]
    fn test_resolve_prefers_explicit_path() {
        let store = DefaultsStore::resolve(Some(PathBuf::from("/tmp/x.json"))).unwrap();
        assert_eq!(store.path(), Path::new("/tmp/x.json"));
    }

    #[test]
    fn test_require_control_plane() {
        let defaults = configured();
        assert_eq!(defaults.require_control_plane().unwrap().username, "admin");

        let mut missing = configured();
        missing.control_plane.password.clear();
        let err = missing.require_control_plane().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                field: "control_plane.password",
                flag: "password"
            }
        ));

        let err = Defaults::default().require_control_plane().unwrap_err();
        assert!(err.to_string().starts_with("control_plane.url is not configured"));

        let mut unnamed = configured();
        unnamed.control_plane.name.clear();
        assert_eq!(
            unnamed.require_control_plane().unwrap().url,
            "https://10.10.20.110"
        );
    }

    #[test]
    fn test_token_expiry() {
        let mut defaults = Defaults::default();
        assert_eq!(defaults.token_expiry(), Duration::from_secs(180 * 60));
        defaults.token_expiry_minutes = 5;
        assert_eq!(defaults.token_expiry(), Duration::from_secs(300));
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut defaults = configured();
        defaults.record_session("tok-1", Utc::now());

        let shown = defaults.redacted();
        assert_eq!(shown.control_plane.password, REDACTED);
        assert_eq!(shown.session.as_ref().unwrap().token, REDACTED);
        assert_eq!(shown.control_plane.username, "admin");
        assert_eq!(defaults.control_plane.password, "C1sco12345");

        let debug = format!("{defaults:?}");
        assert!(!debug.contains("C1sco12345"));
        assert!(!debug.contains("tok-1"));
    }

    #[test]
    fn test_clear_session() {
        let mut defaults = configured();
        defaults.record_session("tok-1", Utc::now());
        defaults.clear_session();
        assert!(defaults.session.is_none());

        let json = serde_json::to_value(&defaults).unwrap();
        assert!(json.get("session").is_none());
    }

    #[test]
    fn test_named_ref_resolution() {
        assert!(!NamedRef::default().is_resolved());
        assert!(
            NamedRef {
                name: "vsphere".into(),
                id: "p-1".into()
            }
            .is_resolved()
        );
    }
}
