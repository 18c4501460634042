use crate::{
    cli::actions::Profile,
    orchestrator::{IssueCard, Orchestrator},
    portal::{Amount, IssuedCard, Validity},
    secure3ds::TerminalPrompt,
};
use anyhow::{Context, Result};
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub profile: Profile,
    pub amount: Amount,
    pub validity: Validity,
}

/// Issue one card number and print it.
///
/// # Errors
/// Returns an error if the credentials cannot be fetched or the portal refuses.
pub async fn execute(args: Args) -> Result<()> {
    let card = issue(args).await?;
    println!("\n{card}\n");
    Ok(())
}

async fn issue(args: Args) -> Result<IssuedCard> {
    let config = args.profile.config();
    debug!("amount: {}", args.amount);
    debug!("expire in: {} months", args.validity.months());

    let credentials = args
        .profile
        .store
        .credentials(&config)
        .await
        .context("unable to fetch the portal credentials")?;

    let operation = IssueCard {
        amount: args.amount,
        currency: config.currency.clone(),
        validity: args.validity,
    };

    let orchestrator = Orchestrator::new(config, TerminalPrompt)?;
    Ok(orchestrator.run(&credentials, operation).await?)
}
