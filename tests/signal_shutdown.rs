//! Process-level shutdown tests for the `toolhost` binary.

use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

const EXIT_BOUND: Duration = Duration::from_secs(5);

fn spawn_server() -> Child {
    Command::new(env!("CARGO_BIN_EXE_toolhost"))
        .env("TOOLHOST_MONITOR_ENABLED", "false")
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("failed to start toolhost")
}

/// Send `initialize` and wait for its answer so the serve loop is running.
async fn handshake(stdin: &mut ChildStdin, stdout: ChildStdout) -> Value {
    stdin
        .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n")
        .await
        .unwrap();
    stdin.flush().await.unwrap();

    let mut lines = BufReader::new(stdout).lines();
    let line = tokio::time::timeout(EXIT_BOUND, lines.next_line())
        .await
        .expect("no initialize response")
        .unwrap()
        .expect("stdout closed");
    serde_json::from_str(&line).unwrap()
}

#[tokio::test]
async fn test_sigint_exits_while_stdin_held_open() {
    let mut child = spawn_server();
    let mut stdin = child.stdin.take().unwrap();
    let stdout = child.stdout.take().unwrap();

    let init = handshake(&mut stdin, stdout).await;
    assert_eq!(init["id"], 1);

    // Let the interrupt watcher task get polled before signalling.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let pid = child.id().expect("child already exited");
    let status = std::process::Command::new("kill")
        .args(["-INT", &pid.to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    // stdin stays open for the whole wait.
    let exit = tokio::time::timeout(EXIT_BOUND, child.wait())
        .await
        .expect("toolhost still running after SIGINT")
        .unwrap();
    assert!(exit.success(), "unexpected exit status {:?}", exit);
    drop(stdin);
}

#[tokio::test]
async fn test_stdin_eof_exits_cleanly() {
    let mut child = spawn_server();
    let mut stdin = child.stdin.take().unwrap();
    let stdout = child.stdout.take().unwrap();

    handshake(&mut stdin, stdout).await;
    drop(stdin);

    let exit = tokio::time::timeout(EXIT_BOUND, child.wait())
        .await
        .expect("toolhost still running after EOF")
        .unwrap();
    assert!(exit.success());
}
