use crate::{Error, Result};
use secrecy::SecretString;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Secrets stored in a `gopass` password store.
#[derive(Debug, Clone)]
pub struct Gopass {
    binary: String,
}

impl Default for Gopass {
    fn default() -> Self {
        Self {
            binary: "gopass".to_string(),
        }
    }
}

impl Gopass {
    #[must_use]
    pub fn with_binary(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }

    /// First line of `gopass show --password <name>`.
    ///
    /// # Errors
    /// Returns [`Error::Secret`] if gopass cannot run, exits non-zero or prints nothing.
    #[instrument(skip(self))]
    pub async fn fetch(&self, name: &str) -> Result<SecretString> {
        let failed = |reason: String| Error::Secret {
            name: name.to_string(),
            reason,
        };

        let output = Command::new(&self.binary)
            .args(["show", "--password", name])
            .output()
            .await
            .map_err(|e| failed(format!("cannot run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!("{} {}", output.status, stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let secret = stdout.lines().next().map(str::trim).unwrap_or_default();
        if secret.is_empty() {
            return Err(failed("empty secret".to_string()));
        }

        debug!("secret {} found", name);
        Ok(SecretString::from(secret.to_string()))
    }
}
