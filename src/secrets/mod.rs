//! Where the portal credentials come from.

pub mod gopass;
pub mod vault;

pub use self::gopass::Gopass;

use crate::{cli::globals::GlobalArgs, config::Config, orchestrator::Credentials, Result};
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug, Clone)]
pub enum SecretStore {
    Gopass(Gopass),
    Vault(GlobalArgs),
}

impl SecretStore {
    /// # Errors
    /// Returns [`crate::Error::Secret`] if the store cannot produce `name`.
    pub async fn fetch(&self, name: &str) -> Result<SecretString> {
        match self {
            Self::Gopass(store) => store.fetch(name).await,
            Self::Vault(globals) => vault::read_secret(globals, name).await,
        }
    }

    /// Login and password of the card profile selected in `config`.
    ///
    /// # Errors
    /// Returns the first lookup failure; nothing is sent to the portal then.
    pub async fn credentials(&self, config: &Config) -> Result<Credentials> {
        let username = self.fetch(&config.login_secret()).await?;
        let password = self.fetch(&config.password_secret()).await?;

        Ok(Credentials {
            username: username.expose_secret().to_string(),
            password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_credentials_use_card_templates() {
        let mut config = Config::default();
        config.card = "perso".to_string();
        config.login_key = "{card}/login".to_string();

        let store = SecretStore::Gopass(Gopass::with_binary("echo"));
        let credentials = store.credentials(&config).await;
        assert_eq!(
            credentials.ok().map(|c| c.username),
            Some("show --password perso/login".to_string())
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_stops_early() {
        let store = SecretStore::Gopass(Gopass::with_binary("false"));
        assert!(store.credentials(&Config::default()).await.is_err());
    }
}
