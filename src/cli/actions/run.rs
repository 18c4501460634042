use crate::cli::actions::{generate, history, Action};
use anyhow::Result;

/// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Generate(args) => generate::execute(args).await,
        Action::History(args) => history::execute(args).await,
    }
}
