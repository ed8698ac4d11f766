//! Precondition checks for incoming submissions
//!
//! Everything here runs before a job directory exists. A submission that
//! fails a check never touches the filesystem or spawns a process.

use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::Language;
use crate::gate::{self, GateRejection};
use crate::runner::{ExecuteError, Runner};
use crate::types::{SubmissionRequest, SubmissionResponse};

/// Reasons a submission is refused or could not be run
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Invalid secret key")]
    Unauthorized,

    #[error("Code too large")]
    CodeTooLarge { len: usize, max: usize },

    #[error("Too many inputs")]
    TooManyInputs { count: usize, max: usize },

    #[error("Unsupported language")]
    UnsupportedLanguage(String),

    #[error(transparent)]
    Rejected(#[from] GateRejection),

    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

impl SubmissionError {
    /// Check if the pipeline itself failed, as opposed to the request
    /// being refused
    pub fn is_internal(&self) -> bool {
        matches!(self, SubmissionError::Execute(_))
    }
}

impl From<&SubmissionError> for SubmissionResponse {
    fn from(error: &SubmissionError) -> Self {
        SubmissionResponse::error(error.to_string())
    }
}

impl Runner {
    /// Validate a submission and run it
    ///
    /// Checks run in a fixed order: key, code size, input count, language,
    /// then the content gate. The first failing check is reported.
    #[instrument(skip_all, fields(language = %request.language, inputs = request.inputs.len()))]
    pub async fn submit(&self, request: &SubmissionRequest) -> Result<Vec<String>, SubmissionError> {
        let language = self.check(request)?;
        let outcome = self
            .execute_language(language, &request.code, &request.inputs)
            .await?;
        Ok(outcome.into_outputs())
    }

    /// Run the precondition checks without executing anything
    pub fn check(&self, request: &SubmissionRequest) -> Result<Language, SubmissionError> {
        let config = self.config();

        if request.key != config.expected_key() {
            return Err(SubmissionError::Unauthorized);
        }

        if request.code.len() > config.max_code_size {
            return Err(SubmissionError::CodeTooLarge {
                len: request.code.len(),
                max: config.max_code_size,
            });
        }

        if request.inputs.len() > config.max_inputs {
            return Err(SubmissionError::TooManyInputs {
                count: request.inputs.len(),
                max: config.max_inputs,
            });
        }

        let language: Language = request
            .language
            .parse()
            .map_err(|_| SubmissionError::UnsupportedLanguage(request.language.clone()))?;

        gate::validate(language, &request.code).inspect_err(|rejection| {
            debug!(token = rejection.token, "submission rejected by content gate");
        })?;

        Ok(language)
    }
}
