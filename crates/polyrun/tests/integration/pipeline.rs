use std::time::{Duration, Instant};

use polyrun::{Config, ExecutionOutcome, Runner, TIMEOUT_DIAGNOSTIC};

use super::{fixture_source, inputs, job_dirs, test_runner};

#[tokio::test]
async fn test_outputs_follow_input_order() {
    let base = tempfile::tempdir().unwrap();
    let runner = test_runner(base.path());

    let outputs = runner
        .execute(
            "Python",
            &fixture_source("echo_delayed.py"),
            &inputs(&["a", "b", "c"]),
        )
        .await
        .unwrap()
        .into_outputs();

    assert_eq!(outputs, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_sleeping_program_times_out() {
    let base = tempfile::tempdir().unwrap();
    let mut config = Config::default().with_base_dir(base.path());
    config.exec_timeout_ms = 1000;
    let runner = Runner::new(config);

    let started = Instant::now();
    let outputs = runner
        .execute("Python", &fixture_source("sleep.py"), &inputs(&["", ""]))
        .await
        .unwrap()
        .into_outputs();

    assert_eq!(outputs, vec![TIMEOUT_DIAGNOSTIC, TIMEOUT_DIAGNOSTIC]);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(job_dirs(base.path()), 0);
}

#[tokio::test]
async fn test_compile_error_is_single_output() {
    let base = tempfile::tempdir().unwrap();
    let runner = test_runner(base.path());

    let outcome = runner
        .execute(
            "C",
            &fixture_source("compile_error.c"),
            &inputs(&["1", "2", "3"]),
        )
        .await
        .unwrap();

    let ExecutionOutcome::CompileFailed(diagnostic) = outcome else {
        panic!("expected compile failure, got {outcome:?}");
    };
    assert!(diagnostic.contains("error"), "{diagnostic}");
    assert!(diagnostic.ends_with("exit status 1"), "{diagnostic}");
    assert_eq!(job_dirs(base.path()), 0);
}

#[tokio::test]
async fn test_runtime_error_is_output() {
    let base = tempfile::tempdir().unwrap();
    let runner = test_runner(base.path());

    let outputs = runner
        .execute("Python", &fixture_source("crash.py"), &inputs(&["", "x"]))
        .await
        .unwrap()
        .into_outputs();

    assert_eq!(outputs.len(), 2);
    for output in outputs {
        assert!(output.starts_with("before\n"), "{output}");
        assert!(output.contains("ValueError: boom"), "{output}");
        assert!(output.ends_with("exit status 1"), "{output}");
    }
    assert_eq!(job_dirs(base.path()), 0);
}

#[tokio::test]
async fn test_repeated_runs_are_equivalent() {
    let base = tempfile::tempdir().unwrap();
    let runner = test_runner(base.path());
    let code = fixture_source("greet.py");

    let first = runner.execute("Python", &code, &inputs(&["x"])).await.unwrap();
    let second = runner.execute("Python", &code, &inputs(&["x"])).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(job_dirs(base.path()), 0);
}
