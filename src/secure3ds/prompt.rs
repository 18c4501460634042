use crate::{Error, Result};
use dialoguer::Input;
use secrecy::SecretString;

/// The human side of a step-up.
pub trait Prompt {
    /// Tell the operator what is going on (which method, waiting for the app).
    fn notify(&self, message: &str);

    /// Block until the operator typed the one-time code.
    ///
    /// # Errors
    /// Returns [`Error::Prompt`] if the terminal cannot be read.
    fn read_code(&self) -> Result<SecretString>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }

    fn read_code(&self) -> Result<SecretString> {
        let code: String = Input::new()
            .with_prompt("Enter code")
            .interact_text()
            .map_err(|e| Error::Prompt(e.to_string()))?;

        Ok(SecretString::from(code.trim().to_string()))
    }
}
