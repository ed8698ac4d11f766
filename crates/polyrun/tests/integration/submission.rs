use polyrun::{Config, Runner, SubmissionError, SubmissionRequest, SubmissionResponse};

use super::{fixture_source, job_dirs};

fn keyed_runner(base: &std::path::Path) -> Runner {
    let mut config = Config::default().with_base_dir(base);
    config.secret_key = Some("s3cret".to_owned());
    Runner::new(config)
}

#[tokio::test]
async fn test_submit_success() {
    let base = tempfile::tempdir().unwrap();
    let runner = keyed_runner(base.path());

    let request = SubmissionRequest::new("Python", fixture_source("greet.py"))
        .with_input("Ada")
        .with_input("Grace")
        .with_key("s3cret");
    let outputs = runner.submit(&request).await.unwrap();

    assert_eq!(
        SubmissionResponse::success(outputs),
        SubmissionResponse::success(vec![
            "Hello, Ada!".to_owned(),
            "Hello, Grace!".to_owned()
        ])
    );
}

#[tokio::test]
async fn test_submit_rejects_denylisted_import() {
    let base = tempfile::tempdir().unwrap();
    let runner = keyed_runner(base.path());

    // The sleep fixture imports `time`, which is fine; `subprocess` is not
    let code = format!("import subprocess\n{}", fixture_source("sleep.py"));
    let request = SubmissionRequest::new("Python", code).with_key("s3cret");

    let err = runner.submit(&request).await.unwrap_err();
    assert!(matches!(err, SubmissionError::Rejected(ref r) if r.token == "subprocess"));
    assert_eq!(job_dirs(base.path()), 0);
}

#[tokio::test]
async fn test_submit_rejects_c_stdio() {
    let base = tempfile::tempdir().unwrap();
    let runner = keyed_runner(base.path());

    let request = SubmissionRequest::new("C", fixture_source("hello.c")).with_key("s3cret");
    let err = runner.submit(&request).await.unwrap_err();

    assert_eq!(err.to_string(), "import of '<stdio.h>' is not allowed");
}
