use serde::{Deserialize, Serialize};

/// A request to run code, as received over the wire
///
/// Every field may be omitted. Missing fields are empty and are rejected by
/// the submission checks rather than by deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionRequest {
    /// Source code to run
    #[serde(default)]
    pub code: String,

    /// Language wire name (e.g. "Python", "C++")
    #[serde(default)]
    pub language: String,

    /// Stdin payloads; the program runs once per entry
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Shared secret
    #[serde(default)]
    pub key: String,
}

impl SubmissionRequest {
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
            ..Self::default()
        }
    }

    /// Add a stdin payload
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.inputs.push(input.into());
        self
    }

    /// Set the shared secret
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

/// Response body for a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmissionResponse {
    /// One output per input, or a single compiler diagnostic
    Success { outputs: Vec<String> },

    /// The submission could not be run
    Error { message: String },
}

impl SubmissionResponse {
    pub fn success(outputs: Vec<String>) -> Self {
        SubmissionResponse::Success { outputs }
    }

    pub fn error(message: impl Into<String>) -> Self {
        SubmissionResponse::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionResponse::Success { .. })
    }
}
