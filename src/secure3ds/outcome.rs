use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;

/// Terminal state of one step-up attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepUpOutcome {
    Succeeded,
    Canceled,
    Blocked,
    Failed,
    TimedOut,
    /// The hub asked for a method this client does not speak.
    UnknownMethod(String),
}

impl StepUpOutcome {
    /// Operator-facing message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Succeeded => "Authentication succeeded.".to_string(),
            Self::Canceled => "Authentication canceled.".to_string(),
            Self::Blocked => "Authentication blocked.".to_string(),
            Self::Failed => "Authentication failed.".to_string(),
            Self::TimedOut => "Authentication time out.".to_string(),
            Self::UnknownMethod(method) => format!("Unknown authentication mode: {method}"),
        }
    }

    /// Wrap a non-successful outcome into the error the run aborts with.
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::StepUp {
            message: self.message(),
            outcome: self,
        }
    }
}

impl fmt::Display for StepUpOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Succeeded => "Succeeded",
            Self::Canceled => "Canceled",
            Self::Blocked => "Blocked",
            Self::Failed => "Failed",
            Self::TimedOut => "TimedOut",
            Self::UnknownMethod(_) => "UnknownMethod",
        };
        f.write_str(name)
    }
}

/// Step-up method chosen by the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// One-time code sent by SMS.
    OtpSms,
    /// Approval in the bank's mobile app; `challenge_id` is polled for.
    MobileApp { challenge_id: String },
    Unknown(String),
}

impl AuthMethod {
    /// # Errors
    /// Returns [`Error::Parse`] if a mobile-app challenge has no id.
    pub fn from_start(start: &StartAuthentication) -> Result<Self> {
        match start.means_to_use.as_str() {
            "OTP_SMS" => Ok(Self::OtpSms),
            "MOBILE_APP" => {
                let challenge_id = start
                    .hub_authentication_output
                    .id
                    .clone()
                    .ok_or_else(|| Error::parse("no hubAuthenticationOutput.id for MOBILE_APP"))?;
                Ok(Self::MobileApp { challenge_id })
            }
            other => Ok(Self::Unknown(other.to_string())),
        }
    }
}

/// Body of `getSession`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubSession {
    pub account_id: String,
    pub hub_session_id: String,
}

/// Body of `startAuthent`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAuthentication {
    pub means_to_use: String,
    #[serde(default)]
    pub hub_authentication_output: Challenge,
}

/// `hubAuthenticationOutput` of `startAuthent`; only the mobile app sends an id.
#[derive(Debug, Default, Deserialize)]
pub struct Challenge {
    pub id: Option<String>,
}

/// Body of `updateAuthent`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpReply {
    pub hub_authentication_output: OtpOutput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpOutput {
    pub authentication_success: bool,
}

/// Body of `startPolling`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubReply {
    pub hub_authentication_output: AuthenticationOutput,
}

/// `hubAuthenticationOutput` of a poll; every flag is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOutput {
    pub authentication_success: bool,
    pub authentication_canceled: bool,
    pub authentication_blocked: bool,
    pub authentication_failed: bool,
    #[serde(rename = "authenticationTimeOut")]
    pub authentication_time_out: bool,
}

/// One poll of the mobile-app approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    Pending,
    Done(StepUpOutcome),
}

impl From<&AuthenticationOutput> for PollStatus {
    /// First raised flag wins: success, canceled, blocked, failed, timed out.
    fn from(output: &AuthenticationOutput) -> Self {
        let flags = [
            (output.authentication_success, StepUpOutcome::Succeeded),
            (output.authentication_canceled, StepUpOutcome::Canceled),
            (output.authentication_blocked, StepUpOutcome::Blocked),
            (output.authentication_failed, StepUpOutcome::Failed),
            (output.authentication_time_out, StepUpOutcome::TimedOut),
        ];

        flags
            .into_iter()
            .find_map(|(raised, outcome)| raised.then_some(outcome))
            .map_or(Self::Pending, Self::Done)
    }
}
