//! HTTP plumbing shared by the portal and the 3-D Secure hub.
//!
//! Two `reqwest` clients share one cookie jar: one follows redirects, the
//! other hands 3xx responses back untouched so the caller can read
//! `Location`. Any status >= 400 becomes [`Error::Transport`].

use crate::{Error, Result};
use reqwest::{
    cookie::{CookieStore, Jar},
    header::{HeaderMap, HeaderValue, ACCEPT, LOCATION},
    redirect::Policy,
    Client, RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info_span, trace, Instrument};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirects {
    Follow,
    Manual,
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Final URL, after redirects when they were followed.
    pub url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Cookies set by this response (not the whole jar).
    pub cookies: HashMap<String, String>,
    pub body: String,
}

impl Reply {
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Absolute redirect target of a 3xx reply.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] if the header is absent or not a valid URL.
    pub fn location(&self) -> Result<String> {
        let location = self
            .headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| Error::parse(format!("no Location header in reply from {}", self.url)))?;

        let base = Url::parse(&self.url).map_err(|e| Error::parse(format!("{}: {e}", self.url)))?;
        let target = base
            .join(location)
            .map_err(|e| Error::parse(format!("invalid Location {location}: {e}")))?;

        Ok(target.to_string())
    }

    /// # Errors
    /// Returns [`Error::Parse`] if the body is not the expected JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| Error::parse(format!("invalid JSON from {}: {e}", self.url)))
    }
}

#[derive(Debug, Clone)]
pub struct Transport {
    follow: Client,
    manual: Client,
    jar: Arc<Jar>,
}

impl Transport {
    /// # Errors
    /// Returns [`Error::Client`] if a client cannot be built (TLS backend init).
    pub fn new(user_agent: &str) -> Result<Self> {
        let jar = Arc::new(Jar::default());

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let builder = || {
            Client::builder()
                .user_agent(user_agent)
                .default_headers(headers.clone())
                .cookie_provider(Arc::clone(&jar))
        };

        let follow = builder().build().map_err(Error::Client)?;
        let manual = builder()
            .redirect(Policy::none())
            .build()
            .map_err(Error::Client)?;

        Ok(Self {
            follow,
            manual,
            jar,
        })
    }

    /// # Errors
    /// Returns an error on connection failure or status >= 400.
    pub async fn get(&self, url: &str, headers: HeaderMap) -> Result<Reply> {
        let request = self.follow.get(url).headers(headers);
        self.send("GET", url, request).await
    }

    /// Post `form` as `application/x-www-form-urlencoded`.
    ///
    /// # Errors
    /// Returns an error on connection failure or status >= 400.
    pub async fn post_form<T: Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
        headers: HeaderMap,
        redirects: Redirects,
    ) -> Result<Reply> {
        let client = match redirects {
            Redirects::Follow => &self.follow,
            Redirects::Manual => &self.manual,
        };
        let request = client.post(url).headers(headers).form(form);
        self.send("POST", url, request).await
    }

    /// Post `body` as `application/json`.
    ///
    /// # Errors
    /// Returns an error on connection failure or status >= 400.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: HeaderMap,
    ) -> Result<Reply> {
        let request = self.follow.post(url).headers(headers).json(body);
        self.send("POST", url, request).await
    }

    /// Look a cookie up in the shared jar for `url`.
    #[must_use]
    pub fn jar_cookie(&self, url: &str, name: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let header = self.jar.cookies(&url)?;
        header
            .to_str()
            .ok()?
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }

    async fn send(&self, method: &str, url: &str, request: RequestBuilder) -> Result<Reply> {
        let span = info_span!("http.request", http.method = method, url = %url);

        let response = request
            .send()
            .instrument(span)
            .await
            .map_err(|source| Error::Connection {
                url: url.to_string(),
                source,
            })?;

        let final_url = response.url().to_string();
        let status = response.status();
        let headers = response.headers().clone();
        let cookies = response
            .cookies()
            .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
            .collect::<HashMap<_, _>>();

        let body = response.text().await.map_err(|source| Error::Connection {
            url: final_url.clone(),
            source,
        })?;

        debug!("{} {} -> {}", method, final_url, status);
        debug!("response headers: {:?}", headers);
        trace!("response body:\n{}", compact(&body));

        if status.as_u16() >= 400 {
            return Err(Error::Transport {
                url: final_url,
                status,
            });
        }

        Ok(Reply {
            url: final_url,
            status,
            headers,
            cookies,
            body,
        })
    }
}

/// Drop blank lines and expand tabs, HTML pages are mostly whitespace.
fn compact(body: &str) -> String {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.replace('\t', "  "))
        .collect::<Vec<_>>()
        .join("\n")
}
