use std::process::{Command, Output};

use tempfile::TempDir;

fn run_in(dir: &TempDir, size: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ipcmeter"))
        .arg(size)
        .current_dir(dir.path())
        .output()
        .unwrap()
}

#[test]
fn successful_run_exits_zero_and_reports_every_mechanism() {
    let dir = tempfile::tempdir().unwrap();

    let out = run_in(&dir, "1024");

    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "Starting IPC comparison with message size: 1024 bytes...");
    assert_eq!(lines.len(), 9);
    for (pair, label) in lines[1..]
        .chunks(2)
        .zip(["mmap", "shared memory", "file read-write", "unix socket"])
    {
        assert!(pair[0].starts_with(&format!("{}: Elapsed time = ", label)));
        assert!(pair[1].starts_with(&format!("{}: Throughput = ", label)));
        assert!(pair[1].ends_with(" MB/s"));
    }
    assert!(!dir.path().join("test_file").exists());
    assert!(!dir.path().join("socket_test").exists());
}

#[test]
fn failed_mechanism_exits_one_and_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();

    let out = run_in(&dir, &usize::MAX.to_string());

    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    assert!(!dir.path().join("test_file").exists());
    assert!(!dir.path().join("socket_test").exists());
}

#[test]
fn invalid_size_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();

    let out = run_in(&dir, "-5");

    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("Starting IPC comparison with message size: 1048576 bytes..."));
}
