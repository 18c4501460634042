//! # ecarte
//!
//! `ecarte` issues single-use virtual card numbers ("e-Carte Bleue") from a
//! bank's web portal.
//!
//! Issuing a number is a single form post. Getting to the point where the
//! portal accepts that post is the interesting part: the login may demand a
//! 3-D Secure step-up, which is handled by a separate authentication hub and
//! resolved either with an SMS one-time code or with an approval in the bank's
//! mobile app.
//!
//! ## Layers
//!
//! - [`transport`]: form/JSON/GET requests with a shared cookie jar, optional
//!   manual redirect handling and status checking.
//! - [`portal`]: login, issuance, history, 3-D Secure resumption and logout
//!   against the portal's HTML pages.
//! - [`secure3ds`]: the hub protocol (PA-request handshake, OTP or mobile-app
//!   polling, PA-response retrieval).
//! - [`orchestrator`]: login, optional step-up, the requested operation and a
//!   logout that runs on every exit path.
//! - [`secrets`] and [`cli`]: credential lookup and the command-line surface.

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod orchestrator;
pub mod portal;
pub mod secrets;
pub mod secure3ds;
pub mod session;
pub mod transport;

pub use self::error::{Error, Result};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
