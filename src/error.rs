use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("invalid species specifier: {0}")]
    InvalidSpecies(String),

    #[error("invalid identifiers: {0}")]
    InvalidIdentifiers(String),

    #[error("invalid homology target species: {0}")]
    InvalidTargetSpecies(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("mygene.info request failed: {0}")]
    ProviderHttp(String),

    #[error("mygene.info returned status {status}: {message}")]
    ProviderStatus { status: u16, message: String },
}

impl KiraError {
    /// The provider answers a one-element array query with a 400. Callers
    /// treat it as "nothing found" only when the query held a single term.
    pub fn is_single_element_rejection(&self) -> bool {
        matches!(self, KiraError::ProviderStatus { status: 400, .. })
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            KiraError::InvalidSpecies(_)
                | KiraError::InvalidIdentifiers(_)
                | KiraError::InvalidTargetSpecies(_)
                | KiraError::ConfigRead(_)
                | KiraError::ConfigParse(_)
        )
    }
}
