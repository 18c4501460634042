use crate::{cli::globals::GlobalArgs, Error, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info_span, instrument, Instrument};
use url::Url;

fn vault_error_message(json_response: &Value) -> &str {
    json_response
        .get("errors")
        .and_then(|v| v.get(0))
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Normalise `url` to `scheme://host:port` and append `path`.
///
/// # Errors
/// Returns an error if `url` cannot be parsed, has no host, or uses an unsupported scheme.
pub fn endpoint_url(url: &str, path: &str) -> Result<String> {
    let invalid = |reason: String| Error::Secret {
        name: url.to_string(),
        reason,
    };

    let url = Url::parse(url).map_err(|e| invalid(format!("Error parsing URL: {e}")))?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| invalid("Error parsing URL: no host specified".to_string()))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => return Err(invalid(format!("Error parsing URL: unsupported scheme {scheme}"))),
        },
    };

    let endpoint_url = format!("{scheme}://{host}:{port}{path}");

    debug!("endpoint URL: {}", endpoint_url);

    Ok(endpoint_url)
}

/// KV v2 read URL, `/v1/<mount>/data/<name>` with every segment escaped.
fn kv_url(globals: &GlobalArgs, name: &str) -> Result<Url> {
    let base = endpoint_url(&globals.vault_url, "/v1")?;
    let mut url = Url::parse(&base).map_err(|e| Error::Secret {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    url.path_segments_mut()
        .map_err(|()| Error::Secret {
            name: name.to_string(),
            reason: format!("{base} cannot be a base URL"),
        })?
        .extend(globals.vault_mount.split('/').filter(|s| !s.is_empty()))
        .push("data")
        .extend(name.split('/').filter(|s| !s.is_empty()));

    Ok(url)
}

/// Read one field of a KV v2 secret.
///
/// # Errors
/// Returns [`Error::Secret`] if the Vault request fails, Vault returns a
/// non-success status, or the field is missing.
#[instrument(skip(globals))]
pub async fn read_secret(globals: &GlobalArgs, name: &str) -> Result<SecretString> {
    let failed = |reason: String| Error::Secret {
        name: name.to_string(),
        reason,
    };

    let client = Client::builder()
        .user_agent(crate::APP_USER_AGENT)
        .build()
        .map_err(Error::Client)?;

    let url = kv_url(globals, name)?;

    let span = info_span!(
        "vault.kv.read",
        http.method = "GET",
        url = %url
    );
    let response = client
        .get(url.clone())
        .header("X-Vault-Token", globals.vault_token.expose_secret())
        .send()
        .instrument(span)
        .await
        .map_err(|e| failed(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let json_response: Value = response.json().await.unwrap_or(Value::Null);

        return Err(failed(format!(
            "{} - {}, {}",
            url,
            status,
            vault_error_message(&json_response)
        )));
    }

    let json_response: Value = response.json().await.map_err(|e| failed(e.to_string()))?;
    let secret = json_response
        .get("data")
        .and_then(|data| data.get("data"))
        .and_then(|data| data.get(&globals.vault_field))
        .and_then(Value::as_str)
        .ok_or_else(|| failed(format!("no {} field in secret", globals.vault_field)))?;

    Ok(SecretString::from(secret.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn globals(url: &str) -> GlobalArgs {
        let mut globals = GlobalArgs::new(url.to_string());
        globals.set_token(SecretString::from("vault-token".to_string()));
        globals
    }

    #[test]
    fn endpoint_url_defaults_http_port() -> Result<()> {
        let url = endpoint_url("http://example.com", "/v1/test")?;
        assert_eq!(url, "http://example.com:80/v1/test");
        Ok(())
    }

    #[test]
    fn endpoint_url_defaults_https_port() -> Result<()> {
        let url = endpoint_url("https://example.com", "/v1/test")?;
        assert_eq!(url, "https://example.com:443/v1/test");
        Ok(())
    }

    #[test]
    fn endpoint_url_rejects_unsupported_scheme() -> Result<()> {
        let err = endpoint_url("ftp://example.com", "/v1/test")
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert!(err.to_string().contains("unsupported scheme"));
        Ok(())
    }

    #[test]
    fn kv_url_escapes_segments() -> Result<()> {
        let url = kv_url(
            &globals("https://vault.tld:8200"),
            "me/sites/e-cartebleue.com/joint user",
        )?;
        assert_eq!(
            url.as_str(),
            "https://vault.tld:8200/v1/secret/data/me/sites/e-cartebleue.com/joint%20user"
        );
        Ok(())
    }

    #[tokio::test]
    async fn read_secret_returns_field() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/secret/data/me/sites/e-cartebleue.com/joint"))
            .and(header("X-Vault-Token", "vault-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"data": {"value": "hunter2"}}
            })))
            .mount(&server)
            .await;

        let secret = read_secret(&globals(&server.uri()), "me/sites/e-cartebleue.com/joint").await?;
        assert_eq!(secret.expose_secret(), "hunter2");
        Ok(())
    }

    #[tokio::test]
    async fn read_secret_errors_on_failure_status() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "errors": ["permission denied"]
            })))
            .mount(&server)
            .await;

        let err = read_secret(&globals(&server.uri()), "x")
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert!(err.to_string().contains("permission denied"));
        Ok(())
    }

    #[tokio::test]
    async fn read_secret_errors_on_missing_field() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"data": {"password": "x"}}
            })))
            .mount(&server)
            .await;

        let result = read_secret(&globals(&server.uri()), "x").await;
        assert!(matches!(result, Err(Error::Secret { .. })));
        Ok(())
    }
}
