use std::time::Duration;
use url::Url;

pub const DEFAULT_BANK: &str = "caisse-epargne";
pub const DEFAULT_CARD: &str = "joint";
pub const DEFAULT_CURRENCY: &str = "1.000000";
pub const DEFAULT_LOGIN_KEY: &str = "me/sites/e-cartebleue.com/{card} user";
pub const DEFAULT_PASSWORD_KEY: &str = "me/sites/e-cartebleue.com/{card}";
pub const PORTAL_HOST: &str = "https://service.e-cartebleue.com/fr/";
pub const HUB_HOST: &str = "https://natixispaymentsolutions-3ds-vdm.wlp-acs.com";
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Everything a run needs to know about the outside world.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bank segment of the portal URL (`caisse-epargne`, `sg`, `banquepopulaire`, ...).
    pub bank: String,
    /// Portal base, `https://service.e-cartebleue.com/fr/<bank>` unless overridden.
    pub portal_url: String,
    /// 3-D Secure hub base.
    pub hub_url: String,
    /// Card profile used to expand the secret key templates.
    pub card: String,
    /// Secret name holding the portal login; `{card}` is replaced.
    pub login_key: String,
    /// Secret name holding the portal password; `{card}` is replaced.
    pub password_key: String,
    /// Value posted as `devise`.
    pub currency: String,
    /// Delay before each mobile-app poll.
    pub poll_interval: Duration,
    /// Local deadline for the mobile-app approval, none by default.
    pub poll_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Config {
    #[must_use]
    pub fn new(bank: &str) -> Self {
        Self {
            bank: bank.to_string(),
            portal_url: format!("{PORTAL_HOST}{bank}"),
            hub_url: HUB_HOST.to_string(),
            card: DEFAULT_CARD.to_string(),
            login_key: DEFAULT_LOGIN_KEY.to_string(),
            password_key: DEFAULT_PASSWORD_KEY.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            poll_interval: POLL_INTERVAL,
            poll_timeout: None,
            user_agent: crate::APP_USER_AGENT.to_string(),
        }
    }

    /// Point the portal and the hub somewhere else (mock servers, staging).
    #[must_use]
    pub fn with_endpoints(mut self, portal_url: &str, hub_url: &str) -> Self {
        self.portal_url = portal_url.trim_end_matches('/').to_string();
        self.hub_url = hub_url.trim_end_matches('/').to_string();
        self
    }

    /// Join `path` to the portal base.
    #[must_use]
    pub fn portal_endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.portal_url)
    }

    /// Join `path` to the hub base.
    #[must_use]
    pub fn hub_endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.hub_url)
    }

    #[must_use]
    pub fn login_secret(&self) -> String {
        self.login_key.replace("{card}", &self.card)
    }

    #[must_use]
    pub fn password_secret(&self) -> String {
        self.password_key.replace("{card}", &self.card)
    }

    /// # Errors
    /// Returns an error if either base URL does not parse.
    pub fn validate(&self) -> crate::Result<()> {
        for base in [&self.portal_url, &self.hub_url] {
            Url::parse(base).map_err(|e| crate::Error::parse(format!("invalid URL {base}: {e}")))?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BANK)
    }
}
