//! End-to-end subprocess tests against real launchable binaries.

use std::sync::Arc;
use std::time::{Duration, Instant};

use liquictl_core::{
    Invoker, Liquibase, LiquibaseConfig, RealInvoker, ToolExit, UpdateAttrs,
};

fn config_with_tool(tool: &str) -> LiquibaseConfig {
    LiquibaseConfig {
        liquibase: tool.into(),
        change_log_file: "changelog.xml".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn noop_executable_resolves_with_exit_zero() {
    // `true` ignores its arguments and exits 0
    let liquibase = Liquibase::new(config_with_tool("true"));
    let exit = liquibase.update(UpdateAttrs::default()).await.unwrap();
    assert_eq!(exit, ToolExit { code: Some(0) });
    assert!(exit.success());
}

#[tokio::test]
async fn failing_executable_resolves_with_nonzero_code() {
    let liquibase = Liquibase::new(config_with_tool("false"));
    let exit = liquibase.update(UpdateAttrs::default()).await.unwrap();
    assert_eq!(exit.code, Some(1));
    assert!(!exit.success());
}

#[tokio::test]
async fn missing_executable_rejects() {
    let liquibase = Liquibase::new(config_with_tool("/no/such/liquibase-binary"));
    let result = liquibase.update(UpdateAttrs::default()).await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("/no/such/liquibase-binary"));
}

#[tokio::test]
async fn signal_killed_child_has_no_code() {
    let exit = RealInvoker
        .invoke("sh", &["-c".into(), "kill -9 $$".into()])
        .await
        .unwrap();
    assert_eq!(exit.code, None);
    assert!(!exit.success());
}

#[tokio::test]
async fn arguments_reach_child_as_single_tokens() {
    // A value with spaces and a metacharacter stays one argument without a
    // shell in the path; `sh -c` sees it as $1 via the extra args.
    let exit = RealInvoker
        .invoke(
            "sh",
            &[
                "-c".into(),
                r#"[ "$1" = '--contexts="a b;c"' ]"#.into(),
                "sh".into(),
                r#"--contexts="a b;c""#.into(),
            ],
        )
        .await
        .unwrap();
    assert!(exit.success());
}

#[tokio::test]
async fn unawaited_invocations_run_concurrently() {
    let invoker = Arc::new(RealInvoker);
    let args = vec!["0.4".to_string()];

    let start = Instant::now();
    let first = invoker.invoke("sleep", &args);
    let second = invoker.invoke("sleep", &args);
    let (a, b) = tokio::join!(first, second);
    let elapsed = start.elapsed();

    assert!(a.unwrap().success());
    assert!(b.unwrap().success());
    // Serialized execution would take at least 0.8s
    assert!(
        elapsed < Duration::from_millis(700),
        "invocations did not overlap: {elapsed:?}"
    );
}
