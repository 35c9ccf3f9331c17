use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn qtov(config_home: &Path, arg: Option<&str>, stdin: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_qtov"));
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(arg) = arg {
        cmd.arg(arg);
    }

    let mut child = cmd.spawn().expect("qtov binary should start");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn malformed_json_fails_without_result_line() {
    let home = tempfile::tempdir().unwrap();
    let output = qtov(home.path(), Some("{not json"), "");

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read render job"));
}

#[test]
fn missing_video_from_stdin_fails() {
    let home = tempfile::tempdir().unwrap();
    let job = serde_json::json!({
        "video_path": home.path().join("absent.mp4"),
        "quote": "Nothing here",
        "style": {},
        "output_path": home.path().join("out.mp4"),
    });
    let output = qtov(home.path(), None, &job.to_string());

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("File not found"));
}

#[test]
fn empty_stdin_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = qtov(home.path(), None, "");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No job given"));
}

#[test]
fn invalid_style_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let job = r#"{"video_path": "in.mp4", "quote": "q", "style": {"fontSize": 5}, "output_path": "o.mp4"}"#;
    let output = qtov(home.path(), Some(job), "");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("fontSize"));
}
