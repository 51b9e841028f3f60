//! YAML configuration: application settings, operator credentials and link groups.
//!
//! The file is read once at startup into an immutable [`Configuration`]. A
//! [`ConfigHandle`] keeps the current snapshot behind an `Arc` so a reload swaps
//! the whole set at once; readers holding the previous snapshot keep using it
//! until their request ends.

use crate::auth::credentials::{Credential, CredentialStore};
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    collections::HashSet,
    fmt, fs,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SESSION_EXPIRE_SECONDS: u64 = 60 * 60;
const DEFAULT_SESSION_IDLE_SECONDS: u64 = 30 * 60;
const DEFAULT_REMEMBER_EXPIRE_SECONDS: u64 = 3 * 24 * 60 * 60;
const DEFAULT_COOKIE_NAME: &str = "dashid";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration file found, tried: {0}")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Logo {
    pub favicon: String,
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Contact {
    pub email: String,
    pub phone: Vec<String>,
    pub address: String,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct App {
    pub port: u16,
    pub salt: String,
    /// Absolute session lifetime in seconds.
    pub session_expire: u64,
    /// Idle timeout in seconds.
    pub session_idle: u64,
    /// Absolute lifetime applied when "remember me" is ticked.
    pub remember_expire: u64,
    pub cookie_name: String,
    pub cookie_domain: String,
    // Older files use `cookie_secure: 1`.
    #[serde(deserialize_with = "deserialize_flag")]
    pub cookie_secure: bool,
    pub template_dir: PathBuf,
    pub asset_dir: PathBuf,
    pub logo: Logo,
    pub contact: Contact,
}

impl Default for App {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            salt: String::new(),
            session_expire: DEFAULT_SESSION_EXPIRE_SECONDS,
            session_idle: DEFAULT_SESSION_IDLE_SECONDS,
            remember_expire: DEFAULT_REMEMBER_EXPIRE_SECONDS,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_domain: String::new(),
            cookie_secure: false,
            template_dir: PathBuf::from("templates"),
            asset_dir: PathBuf::from("assets"),
            logo: Logo::default(),
            contact: Contact::default(),
        }
    }
}

impl App {
    #[must_use]
    pub fn session_lifetime(&self) -> Duration {
        Duration::from_secs(self.session_expire)
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle)
    }

    #[must_use]
    pub fn remember_lifetime(&self) -> Duration {
        Duration::from_secs(self.remember_expire)
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("port", &self.port)
            .field("salt", &"***")
            .field("session_expire", &self.session_expire)
            .field("session_idle", &self.session_idle)
            .field("remember_expire", &self.remember_expire)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_domain", &self.cookie_domain)
            .field("cookie_secure", &self.cookie_secure)
            .field("template_dir", &self.template_dir)
            .field("asset_dir", &self.asset_dir)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Deserialize)]
pub struct User {
    #[serde(rename = "uname")]
    pub username: String,
    #[serde(rename = "pass")]
    pub password_hash: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password_hash", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Link {
    pub title: String,
    pub subtitle: String,
    pub icon: String,
    pub url: String,
    pub git_url: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Group {
    pub name: String,
    #[serde(skip_deserializing)]
    pub slug: String,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub app: App,
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    #[serde(skip)]
    credentials: CredentialStore,
}

impl Configuration {
    /// Read the first existing file out of `candidates`.
    ///
    /// # Errors
    /// Returns an error if no candidate exists, the file cannot be read or parsed,
    /// or the result fails validation.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self, ConfigError> {
        let path = candidates
            .iter()
            .map(AsRef::as_ref)
            .find(|path| path.is_file())
            .ok_or_else(|| {
                ConfigError::NotFound(
                    candidates
                        .iter()
                        .map(|p| p.as_ref().display().to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                )
            })?;

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_yaml(&raw).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        info!(
            path = %path.display(),
            users = config.users.len(),
            groups = config.groups.len(),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Parse and validate a YAML document.
    ///
    /// # Errors
    /// Returns an error if the YAML is malformed or fails validation.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        config.finalize();
        Ok(config)
    }

    /// Credential snapshot built from `users`.
    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.app.salt.trim().is_empty() {
            return Err(ConfigError::Invalid("app.salt must not be empty".to_string()));
        }
        if self.app.session_expire == 0 {
            return Err(ConfigError::Invalid(
                "app.session_expire must be greater than zero".to_string(),
            ));
        }
        if self.app.session_idle == 0 {
            return Err(ConfigError::Invalid(
                "app.session_idle must be greater than zero".to_string(),
            ));
        }
        if self.app.remember_expire < self.app.session_expire {
            return Err(ConfigError::Invalid(
                "app.remember_expire must not be shorter than app.session_expire".to_string(),
            ));
        }
        if self.app.cookie_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "app.cookie_name must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for user in &self.users {
            let key = user.username.trim().to_lowercase();
            if key.is_empty() {
                return Err(ConfigError::Invalid("users: empty uname".to_string()));
            }
            if user.password_hash.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "users: empty pass for {}",
                    user.username
                )));
            }
            if !seen.insert(key) {
                return Err(ConfigError::Invalid(format!(
                    "users: duplicate uname {}",
                    user.username
                )));
            }
        }

        Ok(())
    }

    fn finalize(&mut self) {
        for group in &mut self.groups {
            group.slug = slugify(&group.name);
        }

        self.credentials = self
            .users
            .iter()
            .map(|user| Credential::new(user.username.trim(), user.password_hash.trim()))
            .collect();

        for credential in self.credentials.iter() {
            if credential.is_legacy_digest() {
                warn!(
                    username = credential.username(),
                    "Password stored as unsalted digest, consider `dashgate hash-password`"
                );
            }
        }
    }
}

/// Holds the current configuration snapshot and swaps it on reload.
#[derive(Debug)]
pub struct ConfigHandle {
    candidates: Vec<PathBuf>,
    current: RwLock<Arc<Configuration>>,
}

impl ConfigHandle {
    /// Load the initial snapshot.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be loaded.
    pub fn load(candidates: Vec<PathBuf>) -> Result<Self, ConfigError> {
        let config = Configuration::load(&candidates)?;
        Ok(Self {
            candidates,
            current: RwLock::new(Arc::new(config)),
        })
    }

    #[must_use]
    pub fn from_config(config: Configuration) -> Self {
        Self {
            candidates: Vec::new(),
            current: RwLock::new(Arc::new(config)),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<Configuration> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-read the file and replace the snapshot. On error the old snapshot stays.
    ///
    /// # Errors
    /// Returns an error if the new configuration cannot be loaded.
    pub fn reload(&self) -> Result<Arc<Configuration>, ConfigError> {
        let fresh = Arc::new(Configuration::load(&self.candidates)?);
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = fresh.clone();
        Ok(fresh)
    }
}

/// Normalize a group name into a URL-safe anchor (`a-z0-9-`).
fn slugify(input: &str) -> String {
    let mut slug = String::new();
    let mut prev_dash = false;
    for ch in input.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    slug.trim_matches('-').to_string()
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value == 1,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
app:
  port: 9000
  salt: "pepper"
  session_expire: 120
  cookie_domain: "dash.local"
  cookie_secure: 1
  logo:
    url: "/assets/logo.png"
    alt: "Logo"
  contact:
    email: "ops@dash.local"
    phone: ["+1 555 0100", "+1 555 0101"]
users:
  - uname: Admin
    pass: "d033e22ae348aeb5660fc2140aec35850c4da997"
groups:
  - name: "Build & Deploy"
    links:
      - title: CI
        url: "https://ci.dash.local"
"#;

    #[test]
    fn parses_sample_with_defaults() {
        let config = Configuration::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.app.port, 9000);
        assert_eq!(config.app.session_lifetime(), Duration::from_secs(120));
        assert_eq!(
            config.app.idle_timeout(),
            Duration::from_secs(DEFAULT_SESSION_IDLE_SECONDS)
        );
        assert_eq!(
            config.app.remember_lifetime(),
            Duration::from_secs(72 * 60 * 60)
        );
        assert_eq!(config.app.cookie_name, "dashid");
        assert!(config.app.cookie_secure);
        assert_eq!(config.app.contact.phone.len(), 2);
        assert_eq!(config.groups[0].slug, "build-deploy");
        assert_eq!(config.groups[0].links[0].title, "CI");
    }

    #[test]
    fn cookie_secure_accepts_bool() {
        let raw = SAMPLE.replace("cookie_secure: 1", "cookie_secure: false");
        let config = Configuration::from_yaml(&raw).unwrap();
        assert!(!config.app.cookie_secure);
    }

    #[test]
    fn builds_credential_snapshot() {
        let config = Configuration::from_yaml(SAMPLE).unwrap();
        assert!(config.credentials().find_by_username("admin").is_some());
        assert!(config.credentials().find_by_username("ADMIN").is_some());
        assert!(config.credentials().find_by_username("root").is_none());
    }

    #[test]
    fn rejects_missing_salt() {
        let raw = SAMPLE.replace("salt: \"pepper\"", "salt: \"\"");
        let err = Configuration::from_yaml(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_remember_shorter_than_session() {
        for remember in ["0", "60"] {
            let raw = SAMPLE.replace(
                "session_expire: 120\n",
                &format!("session_expire: 120\n  remember_expire: {remember}\n"),
            );
            let err = Configuration::from_yaml(&raw).unwrap_err();
            assert!(
                matches!(&err, ConfigError::Invalid(msg) if msg.contains("remember_expire")),
                "{err}"
            );
        }

        let raw = SAMPLE.replace(
            "session_expire: 120\n",
            "session_expire: 120\n  remember_expire: 120\n",
        );
        assert!(Configuration::from_yaml(&raw).is_ok());
    }

    #[test]
    fn rejects_duplicate_usernames() {
        let raw = SAMPLE.replace(
            "users:\n",
            "users:\n  - uname: admin\n    pass: \"abc\"\n",
        );
        let err = Configuration::from_yaml(&raw).unwrap_err();
        assert!(err.to_string().contains("duplicate uname"));
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Build & Deploy  "), "build-deploy");
        assert_eq!(slugify("Ops"), "ops");
        assert_eq!(slugify("--"), "");
    }

    #[test]
    fn debug_masks_secrets() {
        let config = Configuration::from_yaml(SAMPLE).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("pepper"));
        assert!(!rendered.contains("d033e22ae348aeb5660fc2140aec35850c4da997"));
    }

    #[test]
    fn load_uses_first_existing_candidate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let missing = PathBuf::from("/nonexistent/dashgate.yml");
        let config = Configuration::load(&[missing, file.path().to_path_buf()]).unwrap();
        assert_eq!(config.app.port, 9000);
    }

    #[test]
    fn load_reports_missing_files() {
        let err = Configuration::load(&[PathBuf::from("/nonexistent/a.yml")]).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn reload_swaps_snapshot_and_keeps_old_on_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let handle = ConfigHandle::load(vec![file.path().to_path_buf()]).unwrap();
        let before = handle.snapshot();

        let updated = SAMPLE.replace("port: 9000", "port: 9001");
        fs::write(file.path(), updated).unwrap();
        handle.reload().unwrap();
        assert_eq!(handle.snapshot().app.port, 9001);
        assert_eq!(before.app.port, 9000);

        fs::write(file.path(), "app: [").unwrap();
        assert!(handle.reload().is_err());
        assert_eq!(handle.snapshot().app.port, 9001);
    }
}
