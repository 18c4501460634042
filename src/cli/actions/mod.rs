pub mod generate;
pub mod history;

mod run;

use crate::{config::Config, secrets::SecretStore};
use std::time::Duration;

/// Options shared by every action: which portal, which card profile and where
/// its credentials live.
#[derive(Debug, Clone)]
pub struct Profile {
    pub bank: String,
    pub card: String,
    pub currency: String,
    pub login_key: String,
    pub password_key: String,
    pub poll_timeout: Option<Duration>,
    pub store: SecretStore,
}

impl Profile {
    #[must_use]
    pub fn config(&self) -> Config {
        let mut config = Config::new(&self.bank);
        config.card.clone_from(&self.card);
        config.currency.clone_from(&self.currency);
        config.login_key.clone_from(&self.login_key);
        config.password_key.clone_from(&self.password_key);
        config.poll_timeout = self.poll_timeout;
        config
    }
}

#[derive(Debug)]
pub enum Action {
    Generate(generate::Args),
    History(history::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
