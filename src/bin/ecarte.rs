use anyhow::Result;
use ecarte::cli::{report, start};

#[tokio::main]
async fn main() -> Result<()> {
    let action = start()?;

    if let Err(err) = action.execute().await {
        report::error(&err);
        std::process::exit(1);
    }

    Ok(())
}
