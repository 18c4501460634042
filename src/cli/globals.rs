use secrecy::SecretString;

/// Vault connection used when the credentials live in a KV v2 mount.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub vault_url: String,
    pub vault_token: SecretString,
    pub vault_mount: String,
    pub vault_field: String,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(vurl: String) -> Self {
        Self {
            vault_url: vurl,
            vault_token: SecretString::default(),
            vault_mount: "secret".to_string(),
            vault_field: "value".to_string(),
        }
    }

    pub fn set_token(&mut self, token: SecretString) {
        self.vault_token = token;
    }
}
