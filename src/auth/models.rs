//! Records owned by the credential store.

use secrecy::SecretString;
use std::fmt;

/// A registered account. Never mutated after creation.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Argon2 PHC string, never the plaintext.
    pub password_hash: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// A tenant application and the key its session tokens are signed with.
#[derive(Clone, Debug)]
pub struct App {
    pub id: i32,
    pub name: String,
    pub secret: SecretString,
}

impl App {
    #[must_use]
    pub fn new(id: i32, name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            secret: SecretString::from(secret.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn user_debug_redacts_hash() {
        let user = User {
            id: 1,
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
        };
        let printed = format!("{user:?}");
        assert!(printed.contains("a@x.com"));
        assert!(!printed.contains("argon2id"));
    }

    #[test]
    fn app_debug_redacts_secret() {
        let app = App::new(7, "billing", "very-secret-key");
        assert!(!format!("{app:?}").contains("very-secret-key"));
        assert_eq!(app.secret.expose_secret(), "very-secret-key");
    }
}
