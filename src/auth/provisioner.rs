//! Resolution of the per-application signing secret.

use crate::auth::{
    error::{StoreError, StoreResult},
    models::App,
    store::CredentialStore,
};
use std::{fmt, str::FromStr};
use tracing::warn;

/// Secret given to every auto-provisioned application.
///
/// It is the same for all of them, so any holder can mint tokens for any
/// auto-provisioned app. Only for local development; production runs
/// [`AppPolicy::Strict`] with secrets provisioned by an operator.
pub const PLACEHOLDER_SECRET: &str = "$2a$12$Bues8rdmFfS1QVc0XZI88eqlzFlAxQM.GWjUZhIfAQrnbaXbRKLVa";

/// What to do when a login names an application the store does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppPolicy {
    /// Unknown applications are an error.
    #[default]
    Strict,
    /// Unknown applications are created with a generated name and
    /// [`PLACEHOLDER_SECRET`]. Insecure.
    AutoProvision,
}

impl AppPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::AutoProvision => "auto-provision",
        }
    }
}

impl fmt::Display for AppPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "auto-provision" | "auto" => Ok(Self::AutoProvision),
            other => Err(format!("unknown app policy: {other}")),
        }
    }
}

/// The application record created for an unknown id under auto-provisioning.
#[must_use]
pub fn placeholder_app(app_id: i32) -> App {
    App::new(app_id, format!("App_{app_id}"), PLACEHOLDER_SECRET)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SecretProvisioner {
    policy: AppPolicy,
}

impl SecretProvisioner {
    #[must_use]
    pub const fn new(policy: AppPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> AppPolicy {
        self.policy
    }

    /// Return the application and its secret, creating it if the policy allows.
    ///
    /// # Errors
    /// `NotFound` under [`AppPolicy::Strict`] for unknown ids, or any store failure.
    pub async fn resolve(&self, store: &dyn CredentialStore, app_id: i32) -> StoreResult<App> {
        match store.app_by_id(app_id).await {
            Err(StoreError::NotFound) if self.policy == AppPolicy::AutoProvision => {
                warn!(app_id, "auto-provisioning app with placeholder secret");

                store.provision_app(placeholder_app(app_id)).await
            }
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryStore;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn strict_rejects_unknown_app() {
        let store = MemoryStore::new();
        let provisioner = SecretProvisioner::new(AppPolicy::Strict);

        assert!(matches!(
            provisioner.resolve(&store, 7).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(store.app_by_id(7).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn strict_returns_existing_app() -> StoreResult<()> {
        let store = MemoryStore::new();
        store.provision_app(App::new(7, "billing", "s7")).await?;

        let app = SecretProvisioner::new(AppPolicy::Strict)
            .resolve(&store, 7)
            .await?;
        assert_eq!(app.secret.expose_secret(), "s7");
        Ok(())
    }

    #[tokio::test]
    async fn auto_provision_creates_placeholder() -> StoreResult<()> {
        let store = MemoryStore::new();
        let provisioner = SecretProvisioner::new(AppPolicy::AutoProvision);

        let app = provisioner.resolve(&store, 42).await?;
        assert_eq!(app.id, 42);
        assert_eq!(app.name, "App_42");
        assert_eq!(app.secret.expose_secret(), PLACEHOLDER_SECRET);

        // deterministic on the next lookup
        let again = store.app_by_id(42).await?;
        assert_eq!(again.secret.expose_secret(), PLACEHOLDER_SECRET);
        Ok(())
    }

    #[tokio::test]
    async fn auto_provision_keeps_operator_secret() -> StoreResult<()> {
        let store = MemoryStore::new();
        store.provision_app(App::new(7, "billing", "s7")).await?;

        let app = SecretProvisioner::new(AppPolicy::AutoProvision)
            .resolve(&store, 7)
            .await?;
        assert_eq!(app.secret.expose_secret(), "s7");
        Ok(())
    }

    #[test]
    fn policy_parses() {
        assert_eq!("strict".parse::<AppPolicy>(), Ok(AppPolicy::Strict));
        assert_eq!(
            "Auto-Provision".parse::<AppPolicy>(),
            Ok(AppPolicy::AutoProvision)
        );
        assert!("lazy".parse::<AppPolicy>().is_err());
        assert_eq!(AppPolicy::default(), AppPolicy::Strict);
    }
}
