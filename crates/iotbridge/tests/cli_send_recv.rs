#![cfg(all(unix, feature = "cli"))]

use std::os::unix::net::UnixStream;
use std::path::Path;
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_iotbridge"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn spawn_recv(endpoint: &Path, budget: &str, extra: &[&str]) -> Child {
    bin()
        .arg("--format")
        .arg("json")
        .arg("recv")
        .arg(endpoint)
        .arg(budget)
        .args(extra)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("recv command should start")
}

fn send(endpoint: &Path, file: &Path) -> Output {
    bin()
        .arg("send")
        .arg(endpoint)
        .arg(file)
        .output()
        .expect("send should run")
}

// The receiver binds before it listens; retry until the endpoint accepts.
fn send_when_ready(endpoint: &Path, file: &Path, timeout: Duration) -> Output {
    let start = Instant::now();
    loop {
        let output = send(endpoint, file);
        if output.status.success() || start.elapsed() >= timeout {
            return output;
        }
        thread::sleep(Duration::from_millis(25));
    }
}

fn wait_with_timeout(mut child: Child, timeout: Duration) -> Output {
    let start = Instant::now();
    loop {
        if child.try_wait().expect("child should be pollable").is_some() {
            return child.wait_with_output().expect("child output should be readable");
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            panic!("child did not exit within {timeout:?}");
        }
        thread::sleep(Duration::from_millis(25));
    }
}

// A peer that connects and never writes keeps the receiver inside read().
fn connect_silent_peer(endpoint: &Path, timeout: Duration) -> UnixStream {
    let start = Instant::now();
    loop {
        match UnixStream::connect(endpoint) {
            Ok(stream) => return stream,
            Err(err) if start.elapsed() >= timeout => panic!("receiver never listened: {err}"),
            Err(_) => thread::sleep(Duration::from_millis(25)),
        }
    }
}

fn signal(child: &Child, sig: libc::c_int) {
    // SAFETY: the pid belongs to a child this test spawned and has not reaped.
    let rc = unsafe { libc::kill(child.id() as libc::pid_t, sig) };
    assert_eq!(rc, 0, "kill failed: {}", std::io::Error::last_os_error());
}

fn json_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("stdout line should be json"))
        .collect()
}

#[test]
fn single_message_reaches_receiver() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = dir.path().join("rmsg.sock");
    let file = dir.path().join("message.txt");
    std::fs::write(&file, b"topic/a\nhello").unwrap();

    let child = spawn_recv(&endpoint, "1", &[]);
    let sent = send_when_ready(&endpoint, &file, Duration::from_secs(3));
    assert!(sent.status.success(), "send failed: {sent:?}");

    let output = wait_with_timeout(child, Duration::from_secs(5));
    assert!(output.status.success());

    let messages = json_lines(&output.stdout);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["size"], 13);
    assert_eq!(messages[0]["topic"], "topic/a");
    assert_eq!(messages[0]["body"], "hello");
    assert!(endpoint.exists(), "socket file is left in place by default");
}

#[test]
fn sequential_messages_arrive_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = dir.path().join("rmsg.sock");
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");
    std::fs::write(&first, b"topic/1\nfirst body\n").unwrap();
    std::fs::write(&second, b"topic/2\nsecond body\n").unwrap();

    let child = spawn_recv(&endpoint, "2", &[]);
    assert!(send_when_ready(&endpoint, &first, Duration::from_secs(3))
        .status
        .success());
    assert!(send(&endpoint, &second).status.success());

    let output = wait_with_timeout(child, Duration::from_secs(5));
    assert!(output.status.success());

    let messages = json_lines(&output.stdout);
    let topics: Vec<_> = messages.iter().map(|m| m["topic"].clone()).collect();
    assert_eq!(topics, vec!["topic/1", "topic/2"]);
    assert_eq!(messages[0]["sequence"], 1);
    assert_eq!(messages[1]["sequence"], 2);
}

#[test]
fn oversized_message_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = dir.path().join("rmsg.sock");
    let file = dir.path().join("big.txt");
    let mut content = b"topic/big\n".to_vec();
    content.extend(std::iter::repeat(b'b').take(100));
    std::fs::write(&file, &content).unwrap();

    let child = spawn_recv(&endpoint, "1", &["--max-message-size", "33"]);
    let sent = send_when_ready(&endpoint, &file, Duration::from_secs(3));
    assert!(sent.status.success(), "sender sees no error on truncation");

    let output = wait_with_timeout(child, Duration::from_secs(5));
    let messages = json_lines(&output.stdout);
    assert_eq!(messages[0]["size"], 32);
    assert_eq!(messages[0]["topic"], "topic/big");
}

#[test]
fn zero_budget_exits_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = dir.path().join("idle.sock");

    let child = spawn_recv(&endpoint, "0", &[]);
    let output = wait_with_timeout(child, Duration::from_secs(3));
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn send_to_missing_listener_fails() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = dir.path().join("nobody.sock");
    let file = dir.path().join("message.txt");
    std::fs::write(&file, b"topic/a\nhello").unwrap();

    let output = send(&endpoint, &file);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("connect() failed"), "stderr: {stderr}");
}

#[test]
fn send_missing_file_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = dir.path().join("rmsg.sock");

    let output = send(&endpoint, &dir.path().join("absent.txt"));
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read message file"), "stderr: {stderr}");
}

#[test]
fn recv_setup_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = dir.path().join("missing-dir").join("rmsg.sock");

    let child = spawn_recv(&endpoint, "5", &[]);
    let output = wait_with_timeout(child, Duration::from_secs(3));
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bind() failed"), "stderr: {stderr}");
}

#[test]
fn over_long_endpoint_rejected() {
    let endpoint = format!("/tmp/{}", "e".repeat(200));

    let output = bin()
        .arg("recv")
        .arg(&endpoint)
        .arg("1")
        .output()
        .expect("recv should run");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("socket path too long"), "stderr: {stderr}");
}

#[test]
fn usage_errors_exit_one() {
    let wrong_count = bin()
        .arg("send")
        .arg("/tmp/only-endpoint.sock")
        .output()
        .expect("cli should run");
    assert_eq!(wrong_count.status.code(), Some(1));

    let unknown = bin()
        .arg("publish")
        .arg("/tmp/x.sock")
        .arg("file")
        .output()
        .expect("cli should run");
    assert_eq!(unknown.status.code(), Some(1));
}

#[test]
fn sigterm_exits_while_peer_holds_connection() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = dir.path().join("held.sock");

    let child = spawn_recv(&endpoint, "5", &[]);
    let _peer = connect_silent_peer(&endpoint, Duration::from_secs(3));
    thread::sleep(Duration::from_millis(300));

    signal(&child, libc::SIGTERM);
    let output = wait_with_timeout(child, Duration::from_secs(6));
    assert_eq!(output.status.code(), Some(130));
    assert!(output.stdout.is_empty());
}

#[test]
fn second_signal_exits_without_grace_period() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = dir.path().join("held.sock");

    let child = spawn_recv(&endpoint, "5", &[]);
    let _peer = connect_silent_peer(&endpoint, Duration::from_secs(3));
    thread::sleep(Duration::from_millis(300));

    signal(&child, libc::SIGTERM);
    thread::sleep(Duration::from_millis(50));
    signal(&child, libc::SIGINT);
    let output = wait_with_timeout(child, Duration::from_millis(1500));
    assert_eq!(output.status.code(), Some(130));
}

#[test]
fn sigterm_between_messages_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = dir.path().join("idle.sock");
    let file = dir.path().join("message.txt");
    std::fs::write(&file, b"topic/a\nhello").unwrap();

    let child = spawn_recv(&endpoint, "5", &[]);
    assert!(send_when_ready(&endpoint, &file, Duration::from_secs(3))
        .status
        .success());
    thread::sleep(Duration::from_millis(200));

    signal(&child, libc::SIGTERM);
    let output = wait_with_timeout(child, Duration::from_secs(3));
    assert!(output.status.success());
    assert_eq!(json_lines(&output.stdout).len(), 1);
}

#[test]
fn closed_stdout_does_not_kill_receiver() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = dir.path().join("rmsg.sock");
    let file = dir.path().join("message.txt");
    std::fs::write(&file, b"topic/a\nhello").unwrap();

    let mut child = spawn_recv(&endpoint, "2", &[]);
    drop(child.stdout.take());

    assert!(send_when_ready(&endpoint, &file, Duration::from_secs(3))
        .status
        .success());
    let second = send_when_ready(&endpoint, &file, Duration::from_secs(3));
    assert!(second.status.success(), "receiver died after first message: {second:?}");

    let output = wait_with_timeout(child, Duration::from_secs(5));
    assert!(output.status.success(), "receiver status: {:?}", output.status);
}
