//! Login, optional 3-D Secure, one operation, logout.

use crate::{
    config::Config,
    portal::{Amount, HistoryEntry, IssuedCard, PortalClient, Validity},
    secure3ds::{Prompt, StepUpEngine, StepUpOutcome},
    transport::Transport,
    Error, Result,
};
use secrecy::SecretString;
use std::future::Future;
use tracing::{debug, info, instrument};

/// Portal login, usually fetched from the secret store.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// Something to do once the session is authenticated.
pub trait Operation {
    type Output;

    fn perform(self, portal: &PortalClient) -> impl Future<Output = Result<Self::Output>>;
}

#[derive(Debug, Clone)]
pub struct IssueCard {
    pub amount: Amount,
    pub currency: String,
    pub validity: Validity,
}

impl Operation for IssueCard {
    type Output = IssuedCard;

    async fn perform(self, portal: &PortalClient) -> Result<IssuedCard> {
        portal
            .issue_card(&self.amount, &self.currency, self.validity)
            .await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ListHistory;

impl Operation for ListHistory {
    type Output = Vec<HistoryEntry>;

    async fn perform(self, portal: &PortalClient) -> Result<Vec<HistoryEntry>> {
        portal.list_history().await
    }
}

pub struct Orchestrator<P: Prompt> {
    portal: PortalClient,
    prompt: P,
}

impl<P: Prompt> Orchestrator<P> {
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client cannot be built.
    pub fn new(config: Config, prompt: P) -> Result<Self> {
        config.validate()?;
        let transport = Transport::new(&config.user_agent)?;

        Ok(Self {
            portal: PortalClient::new(config, transport),
            prompt,
        })
    }

    #[must_use]
    pub fn portal(&self) -> &PortalClient {
        &self.portal
    }

    #[must_use]
    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    /// Authenticate, perform `operation`, and log out whatever happened.
    ///
    /// # Errors
    /// Returns the first error of login, step-up or the operation; logout
    /// failures are never returned.
    #[instrument(skip_all, fields(username = %credentials.username))]
    pub async fn run<O: Operation>(
        &self,
        credentials: &Credentials,
        operation: O,
    ) -> Result<O::Output> {
        self.with_logout(async {
            self.authenticate(credentials).await?;
            operation.perform(&self.portal).await
        })
        .await
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<()> {
        let session = self
            .portal
            .login(&credentials.username, &credentials.password)
            .await?;
        info!("logged in");

        if session.step_up_required() {
            let engine = StepUpEngine::new(&self.portal, &self.prompt);
            match engine.authenticate().await? {
                StepUpOutcome::Succeeded => {}
                other => return Err(other.into_error()),
            }
        }

        Ok(())
    }

    /// Run `body`, then log out on every exit path, Ctrl-C included.
    async fn with_logout<T>(&self, body: impl Future<Output = Result<T>>) -> Result<T> {
        let result = tokio::select! {
            result = body => result,
            Ok(()) = tokio::signal::ctrl_c() => Err(Error::Interrupted),
        };

        if let Err(e) = &result {
            debug!("run failed, logging out: {}", e);
        }
        self.portal.logout().await;

        result
    }
}
