use crate::config::{DEFAULT_LOGIN_KEY, DEFAULT_PASSWORD_KEY};
use clap::{Arg, Command};

pub const ARG_SECRET_STORE: &str = "secret-store";
pub const ARG_LOGIN_KEY: &str = "login-key";
pub const ARG_PASSWORD_KEY: &str = "password-key";
pub const ARG_VAULT_URL: &str = "vault-url";
pub const ARG_VAULT_TOKEN: &str = "vault-token";
pub const ARG_VAULT_MOUNT: &str = "vault-mount";
pub const ARG_VAULT_FIELD: &str = "vault-field";

pub const STORE_GOPASS: &str = "gopass";
pub const STORE_VAULT: &str = "vault";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SECRET_STORE)
                .long(ARG_SECRET_STORE)
                .help("Where the portal login and password are stored")
                .env("ECARTE_SECRET_STORE")
                .value_parser([STORE_GOPASS, STORE_VAULT])
                .default_value(STORE_GOPASS),
        )
        .arg(
            Arg::new(ARG_LOGIN_KEY)
                .long(ARG_LOGIN_KEY)
                .help("Secret holding the portal login, {card} is replaced by the card profile")
                .env("ECARTE_LOGIN_KEY")
                .default_value(DEFAULT_LOGIN_KEY),
        )
        .arg(
            Arg::new(ARG_PASSWORD_KEY)
                .long(ARG_PASSWORD_KEY)
                .help("Secret holding the portal password, {card} is replaced by the card profile")
                .env("ECARTE_PASSWORD_KEY")
                .default_value(DEFAULT_PASSWORD_KEY),
        )
        .arg(
            Arg::new(ARG_VAULT_URL)
                .long(ARG_VAULT_URL)
                .help("Vault base URL, example: https://vault.tld:8200")
                .env("ECARTE_VAULT_URL")
                .required_if_eq(ARG_SECRET_STORE, STORE_VAULT),
        )
        .arg(
            Arg::new(ARG_VAULT_TOKEN)
                .long(ARG_VAULT_TOKEN)
                .help("Vault token")
                .env("ECARTE_VAULT_TOKEN")
                .hide_env_values(true)
                .required_if_eq(ARG_SECRET_STORE, STORE_VAULT),
        )
        .arg(
            Arg::new(ARG_VAULT_MOUNT)
                .long(ARG_VAULT_MOUNT)
                .help("Vault KV-v2 mount path")
                .env("ECARTE_VAULT_MOUNT")
                .default_value("secret"),
        )
        .arg(
            Arg::new(ARG_VAULT_FIELD)
                .long(ARG_VAULT_FIELD)
                .help("Field of the Vault secret holding the value")
                .env("ECARTE_VAULT_FIELD")
                .default_value("value"),
        )
}
