use polyrun::ExecutionOutcome;

use super::{fixture_source, inputs, job_dirs, test_runner};

async fn assert_hello_world(language: &str, fixture: &str) {
    let base = tempfile::tempdir().unwrap();
    let runner = test_runner(base.path());

    let outcome = runner
        .execute(language, &fixture_source(fixture), &inputs(&[""]))
        .await
        .unwrap_or_else(|e| panic!("{language} failed to run: {e}"));

    assert_eq!(
        outcome,
        ExecutionOutcome::Ran(inputs(&["Hello, World!"])),
        "{language}"
    );
    assert_eq!(job_dirs(base.path()), 0);
}

#[tokio::test]
async fn test_python_hello_world() {
    assert_hello_world("Python", "hello.py").await;
}

#[tokio::test]
async fn test_c_hello_world() {
    assert_hello_world("C", "hello.c").await;
}

#[tokio::test]
async fn test_cpp_hello_world() {
    assert_hello_world("C++", "hello.cpp").await;
}

#[tokio::test]
async fn test_java_hello_world() {
    assert_hello_world("Java", "HelloWorld.java").await;
}

#[tokio::test]
async fn test_javascript_hello_world() {
    assert_hello_world("JavaScript", "hello.js").await;
}

#[tokio::test]
async fn test_go_hello_world() {
    assert_hello_world("Go", "hello.go").await;
}

#[tokio::test]
async fn test_python_reads_input() {
    let base = tempfile::tempdir().unwrap();
    let runner = test_runner(base.path());

    let outputs = runner
        .execute("Python", &fixture_source("greet.py"), &inputs(&["Gemini"]))
        .await
        .unwrap()
        .into_outputs();

    assert_eq!(outputs, vec!["Hello, Gemini!"]);
}

#[tokio::test]
async fn test_cpp_runs_once_per_input() {
    let base = tempfile::tempdir().unwrap();
    let runner = test_runner(base.path());

    let outputs = runner
        .execute(
            "C++",
            &fixture_source("sum.cpp"),
            &inputs(&["1 2", "40 2", "-5 5"]),
        )
        .await
        .unwrap()
        .into_outputs();

    assert_eq!(outputs, vec!["3", "42", "0"]);
}

#[tokio::test]
async fn test_java_without_public_class() {
    let base = tempfile::tempdir().unwrap();
    let runner = test_runner(base.path());
    let code = fixture_source("HelloWorld.java").replace("public class", "class");

    let err = runner
        .execute("Java", &code, &inputs(&[""]))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "no public class found in Java code");
    assert_eq!(job_dirs(base.path()), 0);
}
