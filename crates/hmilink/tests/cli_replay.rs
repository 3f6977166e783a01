#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::Command;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/hmilink-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn hmilink() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_hmilink"));
    cmd.arg("--log-level").arg("error");
    cmd
}

#[test]
fn replay_prints_frames_as_json() {
    let dir = unique_temp_dir("replay");
    let capture = dir.join("capture.bin");
    std::fs::write(&capture, b"DATA:T1=21;VOL=3;\nSETTINGS:SP=40;\nPARAM_OK\n")
        .expect("capture should be writable");

    let output = hmilink()
        .arg("--format")
        .arg("json")
        .arg("replay")
        .arg(&capture)
        .arg("--chunk-size")
        .arg("5")
        .output()
        .expect("replay should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("\"kind\":\"DATA\""));
    assert!(lines[0].contains("\"VOL\":\"3\""));
    assert!(lines[1].contains("\"kind\":\"SETTINGS\""));
    assert!(lines[2].contains("\"payload\":\"PARAM_OK\""));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_overflow_fails_when_requested() {
    let dir = unique_temp_dir("overflow");
    let capture = dir.join("capture.bin");
    let mut bytes = b"DATA:T1=1;\n".to_vec();
    bytes.extend(std::iter::repeat_n(b'X', 100));
    bytes.extend_from_slice(b"\nDATA:T1=2;\n");
    std::fs::write(&capture, &bytes).expect("capture should be writable");

    let output = hmilink()
        .arg("--format")
        .arg("raw")
        .arg("--buffer-capacity")
        .arg("32")
        .arg("replay")
        .arg(&capture)
        .arg("--fail-on-overflow")
        .output()
        .expect("replay should run");

    assert_eq!(output.status.code(), Some(60));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "DATA:T1=1;\nDATA:T1=2;\n");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_counts_each_lost_message_and_drops_their_tails() {
    let dir = unique_temp_dir("lost-tails");
    let capture = dir.join("capture.bin");
    std::fs::write(&capture, b"OK\nLONGLINE1\nLONGLINE2\nOK\n")
        .expect("capture should be writable");

    let output = hmilink()
        .arg("--format")
        .arg("raw")
        .arg("--buffer-capacity")
        .arg("4")
        .arg("replay")
        .arg(&capture)
        .arg("--chunk-size")
        .arg("5")
        .arg("--fail-on-overflow")
        .output()
        .expect("replay should run");

    assert_eq!(output.status.code(), Some(60));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "OK\nOK\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("2 message(s) exceeded the 4-byte buffer"),
        "stderr: {stderr}"
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_snapshot_keeps_latest_values() {
    let dir = unique_temp_dir("snapshot");
    let capture = dir.join("capture.bin");
    std::fs::write(&capture, b"DATA:T1=20;T2=18;\nDATA:T1=21;\n")
        .expect("capture should be writable");

    let output = hmilink()
        .arg("--format")
        .arg("pretty")
        .arg("replay")
        .arg(&capture)
        .arg("--snapshot")
        .output()
        .expect("replay should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DATA.T1=21"));
    assert!(stdout.contains("DATA.T2=18"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_missing_file_is_transport_error() {
    let output = hmilink()
        .arg("replay")
        .arg("/tmp/hmilink-cli-definitely-missing.bin")
        .output()
        .expect("replay should run");

    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn zero_chunk_size_is_usage_error() {
    let dir = unique_temp_dir("chunk");
    let capture = dir.join("capture.bin");
    std::fs::write(&capture, b"PARAM\n").expect("capture should be writable");

    let output = hmilink()
        .arg("replay")
        .arg(&capture)
        .arg("--chunk-size")
        .arg("0")
        .output()
        .expect("replay should run");

    assert_eq!(output.status.code(), Some(64));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_name() {
    let output = hmilink().arg("version").output().expect("version should run");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("hmilink "));
}
