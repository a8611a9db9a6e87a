use std::{
    io::Write,
    path::PathBuf,
    process::{Command, Stdio},
};

fn demo(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(file)
}

#[test]
fn stdin_requests_produce_snapshots_and_rejections() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_candy-quest"))
        .arg("--config")
        .arg(demo("session.toml"))
        .arg("--content")
        .arg(demo("content.json"))
        .args(["--player", "alice", "--player", "bob"])
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to launch candy-quest binary");

    {
        let mut stdin = child.stdin.take().expect("piped stdin");
        writeln!(stdin, "not json").expect("write request");
        writeln!(
            stdin,
            r#"{{"user":"mallory","action_kind":"USE_ITEM","payload":"flashlight"}}"#
        )
        .expect("write request");
        writeln!(
            stdin,
            r#"{{"user":"bob","action_kind":"USE_ITEM","payload":"flashlight"}}"#
        )
        .expect("write request");
    }

    let output = child.wait_with_output().expect("binary finished");
    assert!(output.status.success(), "binary exited with {:?}", output.status);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid request"), "stderr: {stderr}");
    assert!(stderr.contains("rejected request from mallory"), "stderr: {stderr}");
    assert!(stderr.contains("rejected request from bob"), "stderr: {stderr}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.lines().next().expect("initial snapshot");
    let snapshot: serde_json::Value = serde_json::from_str(first).expect("snapshot is json");
    assert_eq!(snapshot["characters"].as_array().map(Vec::len), Some(2));
    assert_eq!(snapshot["characters"][0]["user"], "alice");
    assert_eq!(snapshot["turn"]["round"], 1);
}
