use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};

/// Name of the portal's session cookie.
pub const SESSION_COOKIE: &str = "JSESSIONID";

/// Fields of the portal's 3-D Secure form, captured at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepUpFields {
    /// `MD`, the merchant data blob.
    pub merchant_data: String,
    /// `PaReq`, the payment-authentication request blob.
    pub pa_request: String,
    /// `TermUrl` as announced by the portal.
    pub return_url: String,
}

/// An authenticated portal session.
///
/// Built once by a successful login and never changed afterwards. Step-up
/// is required exactly when `step_up` is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    session_cookie: String,
    anti_replay_token: String,
    step_up: Option<StepUpFields>,
}

impl SessionState {
    #[must_use]
    pub fn new(
        session_cookie: String,
        anti_replay_token: String,
        step_up: Option<StepUpFields>,
    ) -> Self {
        Self {
            session_cookie,
            anti_replay_token,
            step_up,
        }
    }

    #[must_use]
    pub fn session_cookie(&self) -> &str {
        &self.session_cookie
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.anti_replay_token
    }

    #[must_use]
    pub fn step_up_required(&self) -> bool {
        self.step_up.is_some()
    }

    #[must_use]
    pub fn step_up_fields(&self) -> Option<&StepUpFields> {
        self.step_up.as_ref()
    }

    /// `Cookie` header value the portal expects on authenticated pages.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        format!(
            "{SESSION_COOKIE}={}; eCarteBleue-pref=open",
            self.session_cookie
        )
    }

    /// Headers carrying the session cookie, ready to be extended.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] if the cookie cannot be sent as a header value.
    pub fn headers(&self) -> Result<HeaderMap> {
        let value = HeaderValue::from_str(&self.cookie_header())
            .map_err(|e| Error::parse(format!("session cookie is not a valid header: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, value);
        Ok(headers)
    }
}

/// Identifiers handed out by the hub during one step-up attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubTransaction {
    /// Trailing segment of the PA-request redirect.
    pub authentication_id: String,
    /// `accountId` from the hub session.
    pub account_id: String,
    /// `hubSessionId` from the hub session.
    pub transaction_id: String,
}
