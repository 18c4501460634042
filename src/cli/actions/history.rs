use crate::{
    cli::{actions::Profile, report},
    orchestrator::{ListHistory, Orchestrator},
    secure3ds::TerminalPrompt,
};
use anyhow::{Context, Result};

#[derive(Debug)]
pub struct Args {
    pub profile: Profile,
}

/// Print previously issued numbers, most recent first.
///
/// # Errors
/// Returns an error if the credentials cannot be fetched or the portal refuses.
pub async fn execute(args: Args) -> Result<()> {
    let config = args.profile.config();

    let credentials = args
        .profile
        .store
        .credentials(&config)
        .await
        .context("unable to fetch the portal credentials")?;

    let orchestrator = Orchestrator::new(config, TerminalPrompt)?;
    let entries = orchestrator.run(&credentials, ListHistory).await?;

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| entry.cells().iter().map(ToString::to_string).collect())
        .collect();

    println!("{}", report::table(&rows));
    Ok(())
}
