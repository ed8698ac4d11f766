//! Code runner for Polyrun
//!
//! Provides the execution pipeline: stage the source in a fresh job
//! directory, compile it if the language needs that, run it once per input
//! and remove the job directory again.

use thiserror::Error;
use tracing::{info, instrument};

pub use crate::runner::compile::{CompileOutcome, StagedProgram, compile, stage};
pub use crate::runner::execute::{TASK_FAILED_DIAGNOSTIC, run_all, run_one};
pub use crate::runner::process::{ProcessError, ProcessOutcome, run_bounded};

mod compile;
mod execute;
mod process;

use crate::config::{
    Config, Language, MissingPublicClass, Toolchain, ToolchainRegistry, UnsupportedLanguage,
};
use crate::workspace::{JobWorkspace, WorkspaceError};

/// Output recorded when a compiler or program exceeds its deadline
pub const TIMEOUT_DIAGNOSTIC: &str = "Error: Code execution timed out";

/// Errors that stop the pipeline before any program output exists
///
/// Compiler errors, crashes and timeouts are not errors here; they are
/// reported as output text in [`ExecutionOutcome`].
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error(transparent)]
    UnsupportedLanguage(#[from] UnsupportedLanguage),

    #[error(transparent)]
    MissingPublicClass(#[from] MissingPublicClass),

    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
}

/// Result of running a submission
///
/// `Ran` holds exactly one output per input, in input order. When
/// compilation fails nothing runs and the single compiler diagnostic is
/// returned instead, so callers must not assume the flattened list from
/// [`into_outputs`](Self::into_outputs) lines up with the inputs in that
/// case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The program ran once per input
    Ran(Vec<String>),

    /// Compilation failed or timed out
    CompileFailed(String),
}

impl ExecutionOutcome {
    /// Check if compilation failed
    pub fn is_compile_failure(&self) -> bool {
        matches!(self, ExecutionOutcome::CompileFailed(_))
    }

    /// Flatten into the response list: the per-input outputs, or a
    /// one-element list holding the compiler diagnostic
    pub fn into_outputs(self) -> Vec<String> {
        match self {
            ExecutionOutcome::Ran(outputs) => outputs,
            ExecutionOutcome::CompileFailed(diagnostic) => vec![diagnostic],
        }
    }
}

/// High-level runner for code execution
#[derive(Debug, Clone)]
pub struct Runner {
    config: Config,
    registry: ToolchainRegistry,
}

impl Runner {
    /// Create a new runner with the given configuration
    pub fn new(config: Config) -> Self {
        let registry = config.registry();
        Self { config, registry }
    }

    /// Create a new runner with default configuration
    pub fn with_defaults() -> Self {
        Self::new(Config::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the recipe used for a language
    pub fn toolchain(&self, language: Language) -> &Toolchain {
        self.registry.get(language)
    }

    /// Run `code` once per input
    ///
    /// `language` is a wire name such as `"Python"` or `"C++"`. The job
    /// directory is removed before this returns, on every path.
    pub async fn execute(
        &self,
        language: &str,
        code: &str,
        inputs: &[String],
    ) -> Result<ExecutionOutcome, ExecuteError> {
        let language: Language = language.parse()?;
        self.execute_language(language, code, inputs).await
    }

    /// Run `code` once per input for an already-parsed language
    #[instrument(skip(self, code, inputs), fields(inputs = inputs.len()))]
    pub async fn execute_language(
        &self,
        language: Language,
        code: &str,
        inputs: &[String],
    ) -> Result<ExecutionOutcome, ExecuteError> {
        let toolchain = self.registry.get(language);

        // Naming can fail (Java without a public class), so settle it
        // before touching the filesystem
        let source_name = toolchain.source_name(code)?;

        // A failed stage drops the workspace, which removes it in place
        let workspace = JobWorkspace::create(&self.config.base_dir).await?;
        let program = stage(&workspace, toolchain, source_name, code).await?;

        let outcome = match compile(&program, self.config.compile_timeout()).await {
            CompileOutcome::Failed(diagnostic) => {
                info!(job_id = %workspace.id(), "compilation failed");
                ExecutionOutcome::CompileFailed(diagnostic)
            }
            CompileOutcome::Ready => {
                let outputs = run_all(&program, inputs, self.config.exec_timeout()).await;
                info!(job_id = %workspace.id(), "execution complete");
                ExecutionOutcome::Ran(outputs)
            }
        };

        workspace.remove().await;
        Ok(outcome)
    }
}
