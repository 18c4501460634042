pub mod card;
pub mod history;

pub use self::card::{Amount, IssuedCard, Validity};
pub use self::history::HistoryEntry;

use crate::{
    config::Config,
    document::Document,
    session::{SessionState, StepUpFields, SESSION_COOKIE},
    transport::{Redirects, Transport},
    Error, Result,
};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use std::sync::OnceLock;
use tracing::{debug, instrument, warn};

/// Constant the login form always carries before a session exists.
const BOOTSTRAP_TOKEN: &str = "9876543210";
const STEP_UP_FORM: &str = "form#form-3ds-authentificate";

/// Client for the card-issuing portal.
///
/// Holds the session established by [`PortalClient::login`]; every later
/// page request carries its cookie and anti-replay token.
#[derive(Debug)]
pub struct PortalClient {
    config: Config,
    transport: Transport,
    session: OnceLock<SessionState>,
}

/// Token and optional step-up form of the page answering the login post.
fn parse_login(body: &str) -> Result<(String, Option<StepUpFields>)> {
    let doc = Document::parse(body);
    doc.check_error().map_err(Error::into_authentication)?;

    let token = doc.input("token")?;

    let step_up = if doc.has(STEP_UP_FORM)? {
        Some(StepUpFields {
            merchant_data: doc.input("MD")?,
            pa_request: doc.input("PaReq")?,
            return_url: doc.input("TermUrl")?,
        })
    } else {
        None
    };

    Ok((token, step_up))
}

impl PortalClient {
    #[must_use]
    pub fn new(config: Config, transport: Transport) -> Self {
        Self {
            config,
            transport,
            session: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// # Errors
    /// Returns [`Error::NoSession`] before a successful login.
    pub fn session(&self) -> Result<&SessionState> {
        self.session.get().ok_or(Error::NoSession)
    }

    /// Where the hub sends the browser back after 3-D Secure.
    #[must_use]
    pub fn return_url(&self) -> String {
        self.config.portal_endpoint("/receive3ds")
    }

    /// Log in and remember the session.
    ///
    /// # Errors
    /// Returns [`Error::Authentication`] when the portal refuses the credentials,
    /// [`Error::Parse`] when the page lacks the cookie or token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<&SessionState> {
        if self.session.get().is_some() {
            return Err(Error::Authentication {
                message: "a portal session is already open".to_string(),
            });
        }

        let url = self.config.portal_endpoint("/login");
        let form = [
            ("request", "login"),
            ("identifiantCrypte", ""),
            ("app", ""),
            ("identifiant", username),
            ("memorize", "false"),
            ("password", password.expose_secret()),
            ("token", BOOTSTRAP_TOKEN),
        ];

        let reply = self
            .transport
            .post_form(&url, &form, HeaderMap::new(), Redirects::Follow)
            .await?;

        let (token, step_up) = parse_login(&reply.body)?;

        let cookie = reply
            .cookie(SESSION_COOKIE)
            .map(str::to_string)
            .or_else(|| self.transport.jar_cookie(&url, SESSION_COOKIE))
            .ok_or_else(|| Error::parse(format!("no {SESSION_COOKIE} cookie after login")))?;

        debug!("jsessionid: {}", cookie);
        debug!("token: {}", token);
        debug!("need3dsecure: {}", step_up.is_some());

        let state = SessionState::new(cookie, token, step_up);
        Ok(self.session.get_or_init(|| state))
    }

    /// Issue a new single-use number.
    ///
    /// # Errors
    /// Returns [`Error::Issuance`] when the portal reports an error or the card
    /// page is incomplete, transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn issue_card(
        &self,
        amount: &Amount,
        currency: &str,
        validity: Validity,
    ) -> Result<IssuedCard> {
        let session = self.session()?;
        let months = validity.months().to_string();
        let form = [
            ("request", "ocode"),
            ("token", session.token()),
            ("montant", amount.as_str()),
            ("devise", currency),
            ("dateValidite", months.as_str()),
        ];

        let reply = self
            .transport
            .post_form(
                &self.config.portal_endpoint("/cpn"),
                &form,
                session.headers()?,
                Redirects::Follow,
            )
            .await?;

        IssuedCard::parse(&reply.body)
    }

    /// Previously issued numbers, header row first, most recent next.
    ///
    /// # Errors
    /// Returns [`Error::Portal`] when the portal reports an error.
    #[instrument(skip(self))]
    pub async fn list_history(&self) -> Result<Vec<HistoryEntry>> {
        let session = self.session()?;
        let form = [("token", session.token())];

        let reply = self
            .transport
            .post_form(
                &self.config.portal_endpoint("/historic"),
                &form,
                session.headers()?,
                Redirects::Follow,
            )
            .await?;

        history::parse(&reply.body)
    }

    /// Hand the hub's PA-response to the portal, completing the interrupted login.
    ///
    /// # Errors
    /// Returns [`Error::Portal`] when the portal reports an error.
    #[instrument(skip(self, pa_response))]
    pub async fn resume(&self, merchant_data: &str, pa_response: &str) -> Result<()> {
        let session = self.session()?;
        let mut headers = session.headers()?;
        headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));

        let form = [("MD", merchant_data), ("PaRes", pa_response)];

        let reply = self
            .transport
            .post_form(&self.return_url(), &form, headers, Redirects::Follow)
            .await?;

        Document::parse(&reply.body).check_error()
    }

    /// Best effort, failures are only logged.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let headers = match self.session.get().map(SessionState::headers) {
            Some(Ok(headers)) => headers,
            Some(Err(e)) => {
                warn!("logout without the session cookie: {}", e);
                HeaderMap::new()
            }
            None => {
                debug!("logout without an established session");
                HeaderMap::new()
            }
        };

        if let Err(e) = self
            .transport
            .get(&self.config.portal_endpoint("/logout"), headers)
            .await
        {
            warn!("logout failed: {}", e);
        }
    }
}
