//! 命令行端到端测试

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::process::{self, Stdio};
use tempfile::tempdir;

fn cli(config_file: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("legged-cli").unwrap();
    cmd.arg("--config-file").arg(config_file);
    cmd
}

#[cfg(unix)]
#[test]
fn test_call_success_exit_code() {
    let dir = tempdir().unwrap();
    cli(&dir.path().join("config.toml"))
        .args(["call", "--poll-ms", "10", "--", "true"])
        .assert()
        .success()
        .stdout(predicate::str::contains("true"));
}

#[cfg(unix)]
#[test]
fn test_call_remote_failure_exit_code() {
    let dir = tempdir().unwrap();
    cli(&dir.path().join("config.toml"))
        .args(["call", "--", "sh", "-c", "exit 3"])
        .assert()
        .code(1);
}

#[cfg(unix)]
#[test]
fn test_call_sigint_exit_code() {
    use assert_cmd::prelude::CommandCargoExt;

    let dir = tempdir().unwrap();
    let mut child = process::Command::cargo_bin("legged-cli")
        .unwrap()
        .arg("--config-file")
        .arg(dir.path().join("config.toml"))
        .args(["call", "--poll-ms", "10", "--", "sleep", "10"])
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    // "执行" 一行在 Ctrl+C 处理器安装之后输出
    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    let mut line = String::new();
    loop {
        line.clear();
        assert!(stdout.read_line(&mut line).unwrap() > 0, "exited before running");
        if line.contains("执行") {
            break;
        }
    }
    assert!(line.contains("sleep 10"), "unexpected output: {}", line);

    let started = std::time::Instant::now();
    let status = process::Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let mut rest = String::new();
    stdout.read_to_string(&mut rest).unwrap();
    let status = child.wait().unwrap();

    assert_eq!(status.code(), Some(130));
    assert!(rest.contains("已取消"), "unexpected output: {}", rest);
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}

#[test]
fn test_call_requires_program() {
    let dir = tempdir().unwrap();
    cli(&dir.path().join("config.toml")).arg("call").assert().failure();
}

#[test]
fn test_config_set_get_check() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legged").join("config.toml");

    cli(&path)
        .args(["config", "set", "--capacity", "4", "--chunk-ms", "20"])
        .assert()
        .success();
    assert!(path.exists());

    cli(&path)
        .args(["config", "get", "stream.capacity"])
        .assert()
        .success()
        .stdout(predicate::str::diff("4\n"));

    cli(&path)
        .args(["config", "get"])
        .assert()
        .success()
        .stdout(predicate::str::contains("chunk_ms = 20"));

    cli(&path).args(["config", "check"]).assert().success();

    cli(&path)
        .args(["config", "get", "stream.volume"])
        .assert()
        .failure();
}

#[test]
fn test_stream_file_to_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("capture.raw");
    let output = dir.path().join("published.raw");

    // 20ms 一块 = 960 字节，5 块；容量足够大，不会丢块
    let data: Vec<u8> = (0..960 * 5).map(|i| (i % 199) as u8).collect();
    fs::write(&input, &data).unwrap();

    cli(&dir.path().join("config.toml"))
        .arg("stream")
        .arg("--file")
        .arg(&input)
        .args(["--capacity", "16", "--chunk-ms", "20"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("丢弃 0 块"));

    assert_eq!(fs::read(&output).unwrap(), data);
}

#[test]
fn test_stream_file_paced_at_default_capacity() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("capture.raw");
    let output = dir.path().join("published.raw");

    // 默认容量 2；按块时长节拍读取，消费方跟得上就不丢块
    let data: Vec<u8> = (0..960 * 5).map(|i| (i % 251) as u8).collect();
    fs::write(&input, &data).unwrap();

    cli(&dir.path().join("config.toml"))
        .arg("stream")
        .arg("--file")
        .arg(&input)
        .args(["--chunk-ms", "20"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("采集 5 块，丢弃 0 块"));

    assert_eq!(fs::read(&output).unwrap(), data);
}

#[test]
fn test_stream_rejects_oversized_chunk() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("capture.raw");
    fs::write(&input, [0u8; 16]).unwrap();

    cli(&dir.path().join("config.toml"))
        .arg("stream")
        .arg("--file")
        .arg(&input)
        .args(["--chunk-ms", "18446744073709551615"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("chunk_ms"));
}

#[test]
fn test_stream_rejects_zero_capacity() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("capture.raw");
    fs::write(&input, [0u8; 16]).unwrap();

    cli(&dir.path().join("config.toml"))
        .arg("stream")
        .arg("--file")
        .arg(&input)
        .args(["--capacity", "0"])
        .assert()
        .failure();
}
