//! Build step: staging source and compiling it
//!
//! Writes the submitted source into the job directory and, for compiled
//! languages, invokes the compiler under a deadline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, instrument};

use crate::config::{ARTIFACT_NAME, Placeholders, SourceName, Toolchain};
use crate::runner::TIMEOUT_DIAGNOSTIC;
use crate::runner::process::{ProcessOutcome, describe_status, failure_text, run_bounded};
use crate::workspace::{JobWorkspace, WorkspaceError};

/// Source written to a job directory, with the paths its recipe refers to
#[derive(Debug, Clone)]
pub struct StagedProgram {
    dir: PathBuf,
    source: PathBuf,
    artifact: PathBuf,
    class_name: Option<String>,
    toolchain: Toolchain,
}

impl StagedProgram {
    /// Job directory the program lives in
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn source_path(&self) -> &Path {
        &self.source
    }

    /// Where the compiler is told to put its output
    pub fn artifact_path(&self) -> &Path {
        &self.artifact
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    fn placeholders(&self) -> Placeholders<'_> {
        Placeholders {
            source: &self.source,
            output: &self.artifact,
            dir: &self.dir,
            class: self.class_name.as_deref(),
        }
    }

    pub fn compile_command(&self) -> Option<Vec<String>> {
        self.toolchain.compile_command(&self.placeholders())
    }

    pub fn run_command(&self) -> Vec<String> {
        self.toolchain.run_command(&self.placeholders())
    }
}

/// Result of the compile step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// The program can be run
    Ready,

    /// The compiler failed or timed out; carries the diagnostic text
    Failed(String),
}

/// Write `code` verbatim into the job directory
#[instrument(skip(workspace, toolchain, code), fields(job_id = %workspace.id()))]
pub async fn stage(
    workspace: &JobWorkspace,
    toolchain: &Toolchain,
    source_name: SourceName,
    code: &str,
) -> Result<StagedProgram, WorkspaceError> {
    let source = workspace
        .write_file(&source_name.file_name, code.as_bytes())
        .await?;
    let artifact = workspace.file_path(ARTIFACT_NAME)?;

    debug!(source = %source.display(), "staged source file");

    Ok(StagedProgram {
        dir: workspace.path().to_path_buf(),
        source,
        artifact,
        class_name: source_name.class_name,
        toolchain: toolchain.clone(),
    })
}

/// Compile a staged program, if its recipe has a compile step
#[instrument(skip(program), fields(language = %program.toolchain().language()))]
pub async fn compile(program: &StagedProgram, limit: Duration) -> CompileOutcome {
    let Some(command) = program.compile_command() else {
        return CompileOutcome::Ready;
    };

    debug!(?command, "compiling");

    let outcome = match run_bounded(&command, program.dir(), None, limit).await {
        Ok(ProcessOutcome::Exited { status, .. }) if status.success() => CompileOutcome::Ready,
        Ok(ProcessOutcome::Exited { status, output }) => {
            CompileOutcome::Failed(failure_text(&output, &describe_status(&status)))
        }
        Ok(ProcessOutcome::TimedOut) => CompileOutcome::Failed(TIMEOUT_DIAGNOSTIC.to_owned()),
        Err(e) => CompileOutcome::Failed(e.to_string()),
    };

    debug!(
        success = matches!(outcome, CompileOutcome::Ready),
        "compilation complete"
    );

    outcome
}
