use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_missing_required_flag_exits_1() {
    let output = Command::new(env!("CARGO_BIN_EXE_rgsplit"))
        .args(["--fastq1", "reads.fastq.gz", "--output-basename", "sample"])
        .output()
        .expect("failed to run rgsplit");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--readgroups-txt"));
}

#[test]
fn test_missing_input_exits_1() {
    let dir = tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_rgsplit"))
        .args([
            "--fastq1", "/nonexistent/reads.fastq.gz",
            "--output-basename", "sample",
            "--readgroups-txt", "readgroups.txt",
        ])
        .env("OUTPREFIX", dir.path())
        .output()
        .expect("failed to run rgsplit");
    assert_eq!(output.status.code(), Some(1));
    assert!(!dir.path().join("readgroups.txt").exists());
}

#[test]
fn test_help_exits_0() {
    let output = Command::new(env!("CARGO_BIN_EXE_rgsplit"))
        .arg("--help")
        .output()
        .expect("failed to run rgsplit");
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--ignore-warnings"));
}
