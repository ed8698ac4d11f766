//! Execution fan-out
//!
//! Runs one staged program once per input payload, all payloads at the same
//! time, and collects the outputs in input order.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::runner::TIMEOUT_DIAGNOSTIC;
use crate::runner::compile::StagedProgram;
use crate::runner::process::{ProcessOutcome, describe_status, failure_text, run_bounded};

/// Output recorded for an input whose task panicked
pub const TASK_FAILED_DIAGNOSTIC: &str = "Error: execution task failed";

/// Run `program` once per input and return one output per input, in order
///
/// Each input runs in its own task with its own deadline. Results are
/// written into a slot addressed by input index, so completion order does
/// not matter.
#[instrument(skip(program, inputs), fields(inputs = inputs.len()))]
pub async fn run_all(program: &StagedProgram, inputs: &[String], limit: Duration) -> Vec<String> {
    let argv: Arc<[String]> = program.run_command().into();
    let cwd: Arc<Path> = Arc::from(program.dir());

    debug!(?argv, "running program");

    let mut tasks = JoinSet::new();
    for (index, input) in inputs.iter().enumerate() {
        let argv = Arc::clone(&argv);
        let cwd = Arc::clone(&cwd);
        let input = input.clone();
        tasks.spawn(async move {
            let output = run_one(&argv, &cwd, &input, limit).await;
            (index, output)
        });
    }

    let mut slots: Vec<Option<String>> = vec![None; inputs.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, output)) => slots[index] = Some(output),
            Err(e) => warn!(error = %e, "execution task failed"),
        }
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| TASK_FAILED_DIAGNOSTIC.to_owned()))
        .collect()
}

/// Run a single input and turn however the process ended into output text
///
/// An empty payload leaves the child without stdin.
pub async fn run_one(argv: &[String], cwd: &Path, input: &str, limit: Duration) -> String {
    let stdin = (!input.is_empty()).then_some(input.as_bytes());
    match run_bounded(argv, cwd, stdin, limit).await {
        Ok(ProcessOutcome::Exited { status, output }) if status.success() => {
            output.trim().to_owned()
        }
        Ok(ProcessOutcome::Exited { status, output }) => {
            failure_text(&output, &describe_status(&status))
        }
        Ok(ProcessOutcome::TimedOut) => TIMEOUT_DIAGNOSTIC.to_owned(),
        Err(e) => e.to_string(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::{Language, RecipeOverride, Toolchain};
    use crate::runner::compile::stage;
    use crate::workspace::JobWorkspace;

    async fn shell_program(workspace: &JobWorkspace, script: &str) -> StagedProgram {
        let toolchain = Toolchain::builtin(Language::Python).with_override(&RecipeOverride {
            compile: None,
            run: Some(vec!["sh".to_owned(), "{source}".to_owned()]),
        });
        let name = toolchain.source_name(script).unwrap();
        stage(workspace, &toolchain, name, script).await.unwrap()
    }

    fn inputs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[tokio::test]
    async fn outputs_follow_input_order() {
        let base = tempfile::tempdir().unwrap();
        let workspace = JobWorkspace::create(base.path()).await.unwrap();
        // The first input sleeps longest, so completion order is reversed
        let program = shell_program(
            &workspace,
            "read x\ncase $x in a) sleep 0.6;; b) sleep 0.3;; esac\necho $x\n",
        )
        .await;

        let outputs = run_all(&program, &inputs(&["a", "b", "c"]), Duration::from_secs(5)).await;
        assert_eq!(outputs, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn inputs_run_concurrently() {
        let base = tempfile::tempdir().unwrap();
        let workspace = JobWorkspace::create(base.path()).await.unwrap();
        let program = shell_program(&workspace, "sleep 0.5\necho done\n").await;

        let started = std::time::Instant::now();
        let outputs = run_all(&program, &inputs(&["", "", "", ""]), Duration::from_secs(5)).await;

        assert_eq!(outputs, vec!["done"; 4]);
        assert!(started.elapsed() < Duration::from_millis(1900));
    }

    #[tokio::test]
    async fn timeout_affects_only_slow_input() {
        let base = tempfile::tempdir().unwrap();
        let workspace = JobWorkspace::create(base.path()).await.unwrap();
        let program = shell_program(
            &workspace,
            "read x\nif [ \"$x\" = slow ]; then sleep 5; fi\necho $x\n",
        )
        .await;

        let outputs = run_all(
            &program,
            &inputs(&["fast", "slow", "quick"]),
            Duration::from_millis(500),
        )
        .await;
        assert_eq!(outputs, vec!["fast", TIMEOUT_DIAGNOSTIC, "quick"]);
    }

    #[tokio::test]
    async fn failing_run_keeps_output_and_reason() {
        let base = tempfile::tempdir().unwrap();
        let workspace = JobWorkspace::create(base.path()).await.unwrap();
        let program = shell_program(&workspace, "echo partial\necho boom >&2\nexit 2\n").await;

        let outputs = run_all(&program, &inputs(&[""]), Duration::from_secs(5)).await;
        assert_eq!(outputs, vec!["partial\nboom\nexit status 2"]);
    }

    #[tokio::test]
    async fn failing_run_without_output_is_just_reason() {
        let base = tempfile::tempdir().unwrap();
        let workspace = JobWorkspace::create(base.path()).await.unwrap();
        let program = shell_program(&workspace, "exit 1\n").await;

        let outputs = run_all(&program, &inputs(&[""]), Duration::from_secs(5)).await;
        assert_eq!(outputs, vec!["exit status 1"]);
    }

    #[tokio::test]
    async fn clean_output_is_trimmed() {
        let base = tempfile::tempdir().unwrap();
        let workspace = JobWorkspace::create(base.path()).await.unwrap();
        let program = shell_program(&workspace, "echo\necho '  Hello, World!  '\necho\n").await;

        let outputs = run_all(&program, &inputs(&[""]), Duration::from_secs(5)).await;
        assert_eq!(outputs, vec!["Hello, World!"]);
    }

    #[tokio::test]
    async fn no_inputs_means_no_runs() {
        let base = tempfile::tempdir().unwrap();
        let workspace = JobWorkspace::create(base.path()).await.unwrap();
        let program = shell_program(&workspace, "echo never\n").await;

        let outputs = run_all(&program, &[], Duration::from_secs(5)).await;
        assert!(outputs.is_empty());
    }

    #[tokio::test]
    async fn run_one_spawn_failure_describes_error() {
        let dir = tempfile::tempdir().unwrap();
        let argv = vec!["polyrun-no-such-runtime".to_owned()];
        let output = run_one(&argv, dir.path(), "", Duration::from_secs(1)).await;
        assert!(output.starts_with("failed to start 'polyrun-no-such-runtime'"));
    }
}
