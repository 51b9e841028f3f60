//! Read-only credential snapshot built from the configured user list.

use super::password;
use std::fmt;

#[derive(Clone)]
pub struct Credential {
    username: String,
    password_hash: String,
}

impl Credential {
    #[must_use]
    pub fn new(username: &str, password_hash: &str) -> Self {
        Self {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// True when the stored hash is an unsalted hex digest rather than a PHC string.
    #[must_use]
    pub fn is_legacy_digest(&self) -> bool {
        !password::is_phc(&self.password_hash)
    }

    /// Check a submitted password against this credential.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        password::verify(candidate, &self.password_hash)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password_hash", &"***")
            .finish()
    }
}

/// Immutable list of credentials; lookups are case-insensitive on the username.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: Vec<Credential>,
}

impl CredentialStore {
    #[must_use]
    pub fn find_by_username(&self, name: &str) -> Option<&Credential> {
        let wanted = name.trim().to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.username.to_lowercase() == wanted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Credential> for CredentialStore {
    fn from_iter<I: IntoIterator<Item = Credential>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        [
            Credential::new("Alice", "d033e22ae348aeb5660fc2140aec35850c4da997"),
            Credential::new("bob", "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn lookup_ignores_case() {
        let store = store();
        for name in ["alice", "ALICE", "Alice", " alice "] {
            let found = store.find_by_username(name).map(Credential::username);
            assert_eq!(found, Some("Alice"), "lookup for {name:?}");
        }
    }

    #[test]
    fn lookup_missing_is_none() {
        assert!(store().find_by_username("carol").is_none());
        assert!(CredentialStore::default().find_by_username("alice").is_none());
    }

    #[test]
    fn detects_legacy_digest() {
        let store = store();
        assert_eq!(store.len(), 2);
        assert!(store
            .find_by_username("alice")
            .is_some_and(Credential::is_legacy_digest));
        assert!(!store
            .find_by_username("bob")
            .is_some_and(Credential::is_legacy_digest));
    }

    #[test]
    fn debug_hides_hash() {
        let rendered = format!("{:?}", store());
        assert!(!rendered.contains("d033e22"));
        assert!(rendered.contains("Alice"));
    }
}
