//! 3-D Secure step-up against the authentication hub.
//!
//! ```text
//! paRequest (no redirect) -> follow Location -> getSession -> startAuthent
//!     OTP_SMS     -> updateAuthent (one code, one try)
//!     MOBILE_APP  -> startPolling every 5 s until a terminal flag
//! endAuthent -> paRequestFromAuthPages -> portal /receive3ds
//! ```

pub mod outcome;
pub mod prompt;

pub use self::outcome::{AuthMethod, PollStatus, StepUpOutcome};
pub use self::prompt::{Prompt, TerminalPrompt};

use self::outcome::{HubReply, HubSession, OtpReply, StartAuthentication};
use crate::{
    document::Document,
    portal::PortalClient,
    session::{HubTransaction, StepUpFields},
    transport::Redirects,
    Error, Result,
};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::json;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

const PA_REQUEST: &str = "/acs-pa-service/pa/paRequest";
const PA_REQUEST_FROM_AUTH_PAGES: &str = "/acs-pa-service/pa/paRequestFromAuthPages";
const GET_SESSION: &str = "/acs-auth-pages/authent/pages/getSession/";
const START_AUTHENT: &str = "/acs-auth-pages/authent/pages/startAuthent";
const UPDATE_AUTHENT: &str = "/acs-auth-pages/authent/pages/updateAuthent";
const START_POLLING: &str = "/acs-auth-pages/authent/pages/startPolling";
const END_AUTHENT: &str = "/acs-auth-pages/authent/pages/endAuthent";

const OTP_STEP: &str = "otp_validating_3";
const LANGUAGE: &str = "fr";
const REGION: &str = "FR";

/// Runs one step-up attempt for the session held by `portal`.
pub struct StepUpEngine<'a, P: Prompt + ?Sized> {
    portal: &'a PortalClient,
    prompt: &'a P,
}

fn upgrade_insecure() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
    headers
}

/// Trailing path segment of the PA-request redirect.
fn authentication_id(location: &str) -> Result<String> {
    location
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::parse(format!("no authentication id in {location}")))
}

/// `MD` and `PaRes` of the hub's auto-submit page.
fn pa_response(body: &str) -> Result<(String, String)> {
    let doc = Document::parse(body);
    Ok((doc.input("MD")?, doc.input("PaRes")?))
}

impl<'a, P: Prompt + ?Sized> StepUpEngine<'a, P> {
    pub fn new(portal: &'a PortalClient, prompt: &'a P) -> Self {
        Self { portal, prompt }
    }

    fn hub(&self, path: &str) -> String {
        self.portal.config().hub_endpoint(path)
    }

    /// Run the whole step-up and resume the portal session.
    ///
    /// Returns `Succeeded` once the portal accepted the PA-response, or
    /// `UnknownMethod` (nothing resumed) when the hub picks an unsupported
    /// method. Every other outcome is returned as [`Error::StepUp`].
    ///
    /// # Errors
    /// Returns [`Error::StepUp`] for canceled/blocked/failed/timed out
    /// attempts, and transport or parse errors from any hop.
    #[instrument(skip_all)]
    pub async fn authenticate(&self) -> Result<StepUpOutcome> {
        let session = self.portal.session()?;
        let fields = session
            .step_up_fields()
            .ok_or_else(|| Error::parse("login did not request 3-D Secure"))?;

        self.prompt
            .notify("3D Secure authentication required. Loading...");

        let transaction = self.open(fields).await?;

        let outcome = match self.start(&transaction).await? {
            AuthMethod::OtpSms => self.otp(&transaction).await?,
            AuthMethod::MobileApp { challenge_id } => {
                self.mobile_app(&transaction, &challenge_id).await?
            }
            AuthMethod::Unknown(method) => {
                warn!("unknown authentication mode: {}", method);
                return Ok(StepUpOutcome::UnknownMethod(method));
            }
        };

        if outcome != StepUpOutcome::Succeeded {
            return Err(outcome.into_error());
        }

        let (merchant_data, pa_res) = self.close(&transaction).await?;
        self.portal.resume(&merchant_data, &pa_res).await?;

        info!("3-D Secure completed, session resumed");
        Ok(StepUpOutcome::Succeeded)
    }

    /// PA-request, redirect and hub session.
    async fn open(&self, fields: &StepUpFields) -> Result<HubTransaction> {
        let transport = self.portal.transport();

        let return_url = self.portal.return_url();
        let form = [
            ("MD", fields.merchant_data.as_str()),
            ("PaReq", fields.pa_request.as_str()),
            ("TermUrl", return_url.as_str()),
        ];
        let reply = transport
            .post_form(&self.hub(PA_REQUEST), &form, HeaderMap::new(), Redirects::Manual)
            .await?;

        let location = reply.location()?;
        let authentication_id = authentication_id(&location)?;
        debug!("redirect url: {}", location);
        debug!("auth 3ds id: {}", authentication_id);

        transport.get(&location, HeaderMap::new()).await?;

        let reply = transport
            .post_json(
                &self.hub(&format!("{GET_SESSION}{authentication_id}")),
                &json!({
                    "inIframe": false,
                    "parentUrl": null
                }),
                HeaderMap::new(),
            )
            .await?;
        let hub_session: HubSession = reply.json()?;
        debug!("account id: {}", hub_session.account_id);

        Ok(HubTransaction {
            authentication_id,
            account_id: hub_session.account_id,
            transaction_id: hub_session.hub_session_id,
        })
    }

    async fn start(&self, transaction: &HubTransaction) -> Result<AuthMethod> {
        let reply = self
            .portal
            .transport()
            .post_json(
                &self.hub(START_AUTHENT),
                &json!({
                    "accountId": transaction.account_id,
                    "language": LANGUAGE,
                    "region": REGION,
                    "hubAuthenticationInput": {
                        "transactionContext": {}
                    }
                }),
                HeaderMap::new(),
            )
            .await?;

        let start: StartAuthentication = reply.json()?;
        debug!("means to use: {}", start.means_to_use);
        AuthMethod::from_start(&start)
    }

    /// One code, one round trip; a wrong code ends the attempt.
    async fn otp(&self, transaction: &HubTransaction) -> Result<StepUpOutcome> {
        self.prompt.notify("Authentication by SMS");
        let code = self.prompt.read_code()?;

        let reply = self
            .portal
            .transport()
            .post_json(
                &self.hub(UPDATE_AUTHENT),
                &json!({
                    "accountId": transaction.account_id,
                    "language": LANGUAGE,
                    "step": OTP_STEP,
                    "skipCurrentHubCall": false,
                    "hubAuthenticationInput": {
                        "otp": code.expose_secret(),
                        "merchantWhitelistedByUser": false
                    }
                }),
                HeaderMap::new(),
            )
            .await?;

        let update: OtpReply = reply.json()?;
        if update.hub_authentication_output.authentication_success {
            Ok(StepUpOutcome::Succeeded)
        } else {
            Err(Error::StepUp {
                outcome: StepUpOutcome::Failed,
                message: "Wrong authentication code.".to_string(),
            })
        }
    }

    async fn mobile_app(
        &self,
        transaction: &HubTransaction,
        challenge_id: &str,
    ) -> Result<StepUpOutcome> {
        self.prompt.notify("Authentication by mobile");
        self.prompt.notify("Waiting for auth...");

        let config = self.portal.config();
        match config.poll_timeout {
            Some(deadline) => timeout(deadline, self.poll(transaction, challenge_id))
                .await
                .map_err(|_| Error::PollDeadline(deadline.as_secs()))?,
            None => self.poll(transaction, challenge_id).await,
        }
    }

    /// Poll until the hub raises a terminal flag; no attempt cap.
    async fn poll(&self, transaction: &HubTransaction, challenge_id: &str) -> Result<StepUpOutcome> {
        let interval = self.portal.config().poll_interval;
        let payload = json!({
            "accountId": transaction.account_id,
            "hubAuthenticationInput": {
                "authenticationId": challenge_id,
                "transactionId": transaction.transaction_id
            }
        });

        let mut attempt: u64 = 0;
        loop {
            sleep(interval).await;
            attempt += 1;

            let reply = self
                .portal
                .transport()
                .post_json(&self.hub(START_POLLING), &payload, HeaderMap::new())
                .await?;
            let poll: HubReply = reply.json()?;

            match PollStatus::from(&poll.hub_authentication_output) {
                PollStatus::Pending => debug!("poll {}: pending", attempt),
                PollStatus::Done(outcome) => {
                    debug!("poll {}: {}", attempt, outcome);
                    if outcome == StepUpOutcome::Succeeded {
                        self.prompt.notify("Authentication succeeded");
                    }
                    return Ok(outcome);
                }
            }
        }
    }

    /// End the hub authentication and fetch the PA-response for the portal.
    async fn close(&self, transaction: &HubTransaction) -> Result<(String, String)> {
        let transport = self.portal.transport();

        transport
            .post_json(
                &self.hub(END_AUTHENT),
                &json!({
                    "accountId": transaction.account_id,
                    "hubAuthenticationInput": {}
                }),
                HeaderMap::new(),
            )
            .await?;

        let form = [("accountId", transaction.account_id.as_str())];
        let reply = transport
            .post_form(
                &self.hub(PA_REQUEST_FROM_AUTH_PAGES),
                &form,
                upgrade_insecure(),
                Redirects::Follow,
            )
            .await?;

        let (merchant_data, pa_res) = pa_response(&reply.body)?;
        debug!("md: {}", merchant_data);
        debug!("PaRes: {}", pa_res);

        Ok((merchant_data, pa_res))
    }
}
