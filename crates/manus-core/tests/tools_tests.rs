mod common;

use manus_core::{AgentError, FileTool, ShellTool, Tool};
use serde_json::{json, Map, Value};

use common::create_test_workspace;

fn inputs(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

#[tokio::test]
async fn read_text_returns_content_and_path() {
    let workspace = create_test_workspace();
    let tool = FileTool::new(workspace.path());

    let output = tool
        .execute(&inputs(&[
            ("action", json!("read_text")),
            ("path", json!("data/notes.txt")),
        ]))
        .await
        .expect("read_text failed");

    assert!(output.success);
    let data = output.data.expect("missing data");
    assert!(data["content"].as_str().unwrap().contains("Meeting notes."));
    assert!(data["path"].as_str().unwrap().ends_with("data/notes.txt"));
}

#[tokio::test]
async fn read_of_missing_file_is_an_operational_failure() {
    let workspace = create_test_workspace();
    let tool = FileTool::new(workspace.path());

    // Missing files are an ordinary failure the trace records, not a
    // policy error that halts with a typed AgentError.
    let output = tool
        .execute(&inputs(&[
            ("action", json!("read_text")),
            ("path", json!("missing.txt")),
        ]))
        .await
        .expect("read_text returned a policy error");

    assert!(!output.success);
    assert!(output.error.unwrap().contains("missing.txt"));
}

#[tokio::test]
async fn write_text_creates_parents_and_reports_bytes() {
    let workspace = create_test_workspace();
    let tool = FileTool::new(workspace.path());

    let output = tool
        .execute(&inputs(&[
            ("action", json!("write_text")),
            ("path", json!("out/deep/report.md")),
            ("content", json!("hello")),
        ]))
        .await
        .expect("write_text failed");

    assert!(output.success);
    assert_eq!(output.data.unwrap()["bytes_written"], json!(5));
    let written = std::fs::read_to_string(workspace.path().join("out/deep/report.md")).unwrap();
    assert_eq!(written, "hello");
}

#[tokio::test]
async fn write_modes_append_and_overwrite() {
    let workspace = create_test_workspace();
    let tool = FileTool::new(workspace.path());

    for _ in 0..2 {
        tool.execute(&inputs(&[
            ("action", json!("write_text")),
            ("path", json!("out/log.txt")),
            ("content", json!("line\n")),
            ("mode", json!("append")),
        ]))
        .await
        .expect("append failed");
    }
    let appended = std::fs::read_to_string(workspace.path().join("out/log.txt")).unwrap();
    assert_eq!(appended, "line\nline\n");

    tool.execute(&inputs(&[
        ("action", json!("write_text")),
        ("path", json!("out/log.txt")),
        ("content", json!("fresh\n")),
        ("mode", json!("overwrite")),
    ]))
    .await
    .expect("overwrite failed");
    let replaced = std::fs::read_to_string(workspace.path().join("out/log.txt")).unwrap();
    assert_eq!(replaced, "fresh\n");
}

#[tokio::test]
async fn sandbox_rejects_escaping_and_absolute_paths() {
    let workspace = create_test_workspace();
    let tool = FileTool::new(workspace.path());

    let err = tool
        .execute(&inputs(&[
            ("action", json!("write_text")),
            ("path", json!("../outside.txt")),
            ("content", json!("nope")),
        ]))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::SandboxViolation { .. }));
    assert!(!workspace.path().parent().unwrap().join("outside.txt").exists());

    let err = tool
        .execute(&inputs(&[
            ("action", json!("read_text")),
            ("path", json!("/etc/passwd")),
        ]))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::SandboxViolation { .. }));
}

#[tokio::test]
async fn list_dir_filters_with_glob_pattern() {
    let workspace = create_test_workspace();
    std::fs::write(workspace.path().join("data/report.md"), "x").unwrap();
    let tool = FileTool::new(workspace.path());

    let output = tool
        .execute(&inputs(&[
            ("action", json!("list_dir")),
            ("path", json!("data")),
            ("pattern", json!("*.txt")),
        ]))
        .await
        .expect("list_dir failed");

    assert!(output.success);
    let data = output.data.unwrap();
    assert_eq!(data["count"], json!(1));
    assert_eq!(data["entries"][0]["name"], json!("notes.txt"));
    assert_eq!(data["entries"][0]["is_file"], json!(true));
}

#[tokio::test]
async fn shell_runs_allow_listed_commands_in_the_workspace() {
    let workspace = create_test_workspace();
    let tool = ShellTool::new(workspace.path());

    let output = tool
        .execute(&inputs(&[("cmd", json!("cat data/notes.txt"))]))
        .await
        .expect("cat failed");

    assert!(output.success);
    let data = output.data.unwrap();
    assert!(data["stdout"].as_str().unwrap().contains("Meeting notes."));
    assert_eq!(data["return_code"], json!(0));
}

#[tokio::test]
async fn shell_blocks_unlisted_commands_before_spawning() {
    let workspace = create_test_workspace();
    let tool = ShellTool::new(workspace.path());

    let err = tool
        .execute(&inputs(&[("cmd", json!("rm -rf data"))]))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::CommandNotAllowed { .. }));
    // The blocked command never ran.
    assert!(workspace.path().join("data/notes.txt").is_file());
}

#[tokio::test]
async fn shell_blocks_metacharacters_and_pipes() {
    let workspace = create_test_workspace();
    let tool = ShellTool::new(workspace.path());

    for cmd in [
        "cat data/notes.txt | grep notes",
        "ls > listing.txt",
        "ls; cat /etc/passwd",
        "cat $(ls)",
    ] {
        let err = tool
            .execute(&inputs(&[("cmd", json!(cmd))]))
            .await
            .unwrap_err();
        assert!(
            matches!(err, AgentError::CommandNotAllowed { .. }),
            "expected '{cmd}' to be blocked"
        );
    }
}

#[tokio::test]
async fn shell_nonzero_exit_is_an_operational_failure() {
    let workspace = create_test_workspace();
    let tool = ShellTool::new(workspace.path());

    let output = tool
        .execute(&inputs(&[("cmd", json!("cat missing.txt"))]))
        .await
        .expect("cat returned a policy error");

    assert!(!output.success);
    let data = output.data.unwrap();
    assert_ne!(data["return_code"], json!(0));
    assert!(!data["stderr"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn shell_timeout_terminates_the_command() {
    let workspace = create_test_workspace();
    let tool = ShellTool::new(workspace.path());

    let err = tool
        .execute(&inputs(&[
            ("cmd", json!("python3 -c 'import time; time.sleep(10)'")),
            ("timeout", json!(1)),
        ]))
        .await
        .unwrap_err();

    match err {
        AgentError::Timeout { timeout_secs, .. } => assert_eq!(timeout_secs, 1),
        other => panic!("unexpected error: {other}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn shell_timeout_kills_spawned_descendants() {
    let workspace = create_test_workspace();
    let tool = ShellTool::new(workspace.path());

    // The timed-out command spawns a grandchild that would drop a marker
    // file after two seconds. Killing the whole process group means the
    // marker never appears.
    std::fs::write(
        workspace.path().join("straggler.py"),
        "import time\ntime.sleep(2)\nopen('straggler.txt', 'w').write('alive')\n",
    )
    .expect("Failed to write helper script");

    let cmd = "python3 -c 'import subprocess, time; subprocess.Popen([\"python3\", \"straggler.py\"]); time.sleep(30)'";
    let err = tool
        .execute(&inputs(&[("cmd", json!(cmd)), ("timeout", json!(1))]))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Timeout { .. }));

    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    assert!(!workspace.path().join("straggler.txt").exists());
}

#[tokio::test]
async fn shell_custom_allowlist_is_enforced() {
    let workspace = create_test_workspace();
    let tool = ShellTool::new(workspace.path()).with_allowlist(vec!["ls".to_string()]);

    assert!(tool
        .execute(&inputs(&[("cmd", json!("ls data"))]))
        .await
        .unwrap()
        .success);
    assert!(tool
        .execute(&inputs(&[("cmd", json!("cat data/notes.txt"))]))
        .await
        .is_err());
}
