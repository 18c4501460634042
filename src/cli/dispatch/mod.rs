use crate::{
    cli::{
        actions::{generate, history, Action, Profile},
        commands::{
            secrets::{
                ARG_LOGIN_KEY, ARG_PASSWORD_KEY, ARG_SECRET_STORE, ARG_VAULT_FIELD,
                ARG_VAULT_MOUNT, ARG_VAULT_TOKEN, ARG_VAULT_URL, STORE_VAULT,
            },
            ARG_AMOUNT, ARG_BANK, ARG_CARD, ARG_CURRENCY, ARG_EXPIRE_IN, ARG_LIST,
            ARG_POLL_TIMEOUT,
        },
        globals::GlobalArgs,
    },
    config::{DEFAULT_BANK, DEFAULT_CARD, DEFAULT_CURRENCY, DEFAULT_LOGIN_KEY, DEFAULT_PASSWORD_KEY},
    portal::{Amount, Validity},
    secrets::{Gopass, SecretStore},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::time::Duration;

fn string_or(matches: &clap::ArgMatches, id: &str, default: &str) -> String {
    matches
        .get_one::<String>(id)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

fn secret_store(matches: &clap::ArgMatches) -> Result<SecretStore> {
    if matches.get_one::<String>(ARG_SECRET_STORE).map(String::as_str) != Some(STORE_VAULT) {
        return Ok(SecretStore::Gopass(Gopass::default()));
    }

    let vault_url = matches
        .get_one::<String>(ARG_VAULT_URL)
        .cloned()
        .context("missing required argument: --vault-url")?;
    let vault_token = matches
        .get_one::<String>(ARG_VAULT_TOKEN)
        .cloned()
        .context("missing required argument: --vault-token")?;

    let mut globals = GlobalArgs::new(vault_url);
    globals.set_token(SecretString::from(vault_token));
    globals.vault_mount = string_or(matches, ARG_VAULT_MOUNT, &globals.vault_mount);
    globals.vault_field = string_or(matches, ARG_VAULT_FIELD, &globals.vault_field);

    Ok(SecretStore::Vault(globals))
}

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let profile = Profile {
        bank: string_or(matches, ARG_BANK, DEFAULT_BANK),
        card: string_or(matches, ARG_CARD, DEFAULT_CARD),
        currency: string_or(matches, ARG_CURRENCY, DEFAULT_CURRENCY),
        login_key: string_or(matches, ARG_LOGIN_KEY, DEFAULT_LOGIN_KEY),
        password_key: string_or(matches, ARG_PASSWORD_KEY, DEFAULT_PASSWORD_KEY),
        poll_timeout: matches
            .get_one::<u64>(ARG_POLL_TIMEOUT)
            .copied()
            .map(Duration::from_secs),
        store: secret_store(matches)?,
    };

    if matches.get_flag(ARG_LIST) {
        return Ok(Action::History(history::Args { profile }));
    }

    let amount = matches
        .get_one::<Amount>(ARG_AMOUNT)
        .cloned()
        .context("missing required argument: <amount>")?;
    let validity = matches
        .get_one::<Validity>(ARG_EXPIRE_IN)
        .copied()
        .unwrap_or_default();

    Ok(Action::Generate(generate::Args {
        profile,
        amount,
        validity,
    }))
}
