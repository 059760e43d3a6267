#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

const SCENARIO: [u8; 23] = [
    0x00, 0x17, 0x05, 0x04, 0x4F, 0x01, 0x05, 0x41, 0xA0, 0x00, 0x00, 0x18, 0x41, 0x20, 0x00,
    0x00, 0x19, 0xC0, 0xA0, 0x00, 0x00, 0xEE, 0x7A,
];

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/traxcli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn traxlink() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_traxlink"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn run_with_stdin(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = traxlink()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("traxlink should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin)
        .expect("stdin should accept input");
    child.wait_with_output().expect("traxlink should finish")
}

#[test]
fn crc_prints_xmodem_check_value() {
    let output = run_with_stdin(&["crc"], b"123456789");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("decimal: 12739"), "stdout: {stdout}");
    assert!(stdout.contains("hex: 31c3"), "stdout: {stdout}");
}

#[test]
fn crc_of_empty_input_is_zero() {
    let output = run_with_stdin(&["crc", "--format", "json"], b"");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"crc\":0"), "stdout: {stdout}");
}

#[test]
fn frame_wraps_start_command() {
    let output = run_with_stdin(&["frame"], b"15\n");

    assert!(output.status.success());
    assert_eq!(output.stdout, vec![0x00, 0x05, 0x15, 0xBD, 0x61]);
}

#[test]
fn frame_emits_one_datagram_per_line() {
    let output = run_with_stdin(&["frame"], b"03 04 05 18 19 4f\n\n16\n");

    assert!(output.status.success());
    assert_eq!(
        output.stdout,
        vec![
            0x00, 0x0A, 0x03, 0x04, 0x05, 0x18, 0x19, 0x4F, 0xE2, 0xEF, 0x00, 0x05, 0x16, 0x8D,
            0x02,
        ]
    );
}

#[test]
fn decode_finds_sample_behind_garbage() {
    let dir = unique_temp_dir("decode");
    let capture = dir.join("capture.bin");
    let mut bytes = vec![0xFF, 0x00, 0x17, 0x12, 0x34];
    bytes.extend_from_slice(&SCENARIO);
    bytes.extend_from_slice(&[0xAA; 7]);
    std::fs::write(&capture, &bytes).expect("capture should be writable");

    let output = traxlink()
        .arg("--format")
        .arg("json")
        .arg("decode")
        .arg(&capture)
        .output()
        .expect("decode should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1, "stdout: {stdout}");
    assert!(stdout.contains("\"pitch\":10.0"), "stdout: {stdout}");
    assert!(stdout.contains("\"yaw\":20.0"), "stdout: {stdout}");
    assert!(stdout.contains("\"roll\":-5.0"), "stdout: {stdout}");
    assert!(stdout.contains("\"heading_status\":1"), "stdout: {stdout}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_pretty_matches_console_layout() {
    let output = run_with_stdin(&["decode", "--format", "pretty"], &SCENARIO);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim_end(), "P: 10.000\tR: -5.000\tY: 20.000\tHS: 1");
}

#[test]
fn decode_without_valid_datagram_returns_60() {
    let mut corrupt = SCENARIO;
    corrupt[22] ^= 0x01;
    let output = run_with_stdin(&["decode"], &corrupt);

    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn decode_stats_reports_checksum_errors() {
    let mut corrupt = SCENARIO;
    corrupt[9] ^= 0x40;
    let mut input = corrupt.to_vec();
    input.extend_from_slice(&SCENARIO);

    let output = run_with_stdin(&["decode", "--stats", "--format", "json"], &input);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"accepted\":1"), "stdout: {stdout}");
    assert!(stdout.contains("\"checksum_errors\":1"), "stdout: {stdout}");
}

#[test]
fn monitor_missing_device_returns_transport_error() {
    let dir = unique_temp_dir("missing");

    let output = traxlink()
        .arg("monitor")
        .arg(dir.join("ttyMISSING"))
        .output()
        .expect("monitor should run");

    assert_eq!(output.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn monitor_rejects_unsupported_baud_with_64() {
    let output = traxlink()
        .arg("monitor")
        .arg("/dev/null")
        .arg("--baud")
        .arg("12345")
        .output()
        .expect("monitor should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn monitor_reads_capture_file_without_setup() {
    let dir = unique_temp_dir("monitor");
    let capture = dir.join("capture.bin");
    std::fs::write(&capture, SCENARIO).expect("capture should be writable");

    let output = traxlink()
        .arg("--format")
        .arg("json")
        .arg("monitor")
        .arg(&capture)
        .arg("--no-setup")
        .arg("--count")
        .arg("1")
        .arg("--interval")
        .arg("1ms")
        .output()
        .expect("monitor should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"seq\":1"), "stdout: {stdout}");
    assert!(stdout.contains("\"heading_uncertainty\":\"low\""), "stdout: {stdout}");
    // --no-setup must leave the capture untouched.
    assert_eq!(std::fs::read(&capture).expect("capture readable"), SCENARIO);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn monitor_never_writes_setup_into_capture() {
    use std::os::unix::fs::PermissionsExt;

    let dir = unique_temp_dir("monitor-setup");
    let capture = dir.join("capture.bin");
    let mut bytes = SCENARIO.to_vec();
    bytes.extend_from_slice(&SCENARIO);
    std::fs::write(&capture, &bytes).expect("capture should be writable");
    std::fs::set_permissions(&capture, std::fs::Permissions::from_mode(0o444))
        .expect("capture permissions should be settable");

    let output = traxlink()
        .arg("--format")
        .arg("json")
        .arg("monitor")
        .arg(&capture)
        .arg("--count")
        .arg("1")
        .arg("--interval")
        .arg("1ms")
        .output()
        .expect("monitor should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"pitch\":10.0"), "stdout: {stdout}");
    assert_eq!(std::fs::read(&capture).expect("capture readable"), bytes);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn monitor_empty_capture_returns_transport_error() {
    let dir = unique_temp_dir("monitor-empty");
    let capture = dir.join("empty.bin");
    std::fs::write(&capture, b"").expect("capture should be writable");

    let output = traxlink()
        .arg("monitor")
        .arg(&capture)
        .arg("--no-setup")
        .arg("--interval")
        .arg("1ms")
        .output()
        .expect("monitor should run");

    assert_eq!(output.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_package_version() {
    let output = traxlink().arg("version").output().expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("traxlink "));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_extended_lists_features() {
    let output = traxlink()
        .arg("version")
        .arg("--extended")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: traxlink"));
    assert!(stdout.contains("cli=true"));
}
