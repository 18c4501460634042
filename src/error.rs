use crate::secure3ds::StepUpOutcome;
use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of a portal run.
///
/// Portal-reported messages are carried verbatim; presentation (coloring,
/// banners) is left to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Login rejected, or the login page showed the error panel.
    #[error("{message}")]
    Authentication { message: String },

    /// The issuance page showed the error panel or lacked a card field.
    #[error("{message}")]
    Issuance { message: String },

    /// Any other portal page (history, 3-D Secure resumption) showed the error panel.
    #[error("{message}")]
    Portal { message: String },

    /// The step-up attempt ended in a non-successful terminal state.
    #[error("{message}")]
    StepUp {
        outcome: StepUpOutcome,
        message: String,
    },

    /// The server answered with a status >= 400.
    #[error("Something went wrong when calling {url}: {status}")]
    Transport { url: String, status: StatusCode },

    #[error("unable to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request never produced a response.
    #[error("Unable to reach {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// An expected field, header or JSON member is absent.
    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("secret lookup failed for {name}: {reason}")]
    Secret { name: String, reason: String },

    #[error("unable to read the authentication code: {0}")]
    Prompt(String),

    #[error("no portal session, login first")]
    NoSession,

    #[error("mobile app approval not received within {0} seconds")]
    PollDeadline(u64),

    #[error("interrupted")]
    Interrupted,
}

impl Error {
    pub(crate) fn parse(what: impl Into<String>) -> Self {
        Self::Parse(what.into())
    }

    /// Re-labels a portal error panel raised during login.
    pub(crate) fn into_authentication(self) -> Self {
        match self {
            Self::Portal { message } => Self::Authentication { message },
            other => other,
        }
    }

    /// Re-labels a portal error panel or a missing field raised during issuance.
    pub(crate) fn into_issuance(self) -> Self {
        match self {
            Self::Portal { message } => Self::Issuance { message },
            Self::Parse(message) => Self::Issuance { message },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portal_panel_becomes_authentication_error() {
        let err = Error::Portal {
            message: "Identifiant inconnu".to_string(),
        }
        .into_authentication();
        assert!(matches!(err, Error::Authentication { ref message } if message == "Identifiant inconnu"));
    }

    #[test]
    fn missing_field_becomes_issuance_error() {
        let err = Error::parse("cvv not found").into_issuance();
        assert!(matches!(err, Error::Issuance { .. }));
        assert_eq!(err.to_string(), "cvv not found");
    }

    #[test]
    fn transport_error_names_url_and_status() {
        let err = Error::Transport {
            url: "https://portal.test/login".to_string(),
            status: StatusCode::BAD_GATEWAY,
        };
        assert_eq!(
            err.to_string(),
            "Something went wrong when calling https://portal.test/login: 502 Bad Gateway"
        );
    }

    #[test]
    fn step_up_error_displays_message() {
        let err = Error::StepUp {
            outcome: StepUpOutcome::Failed,
            message: "Wrong authentication code.".to_string(),
        };
        assert_eq!(err.to_string(), "Wrong authentication code.");
    }
}
