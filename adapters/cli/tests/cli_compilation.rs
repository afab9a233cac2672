use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "squad-tactics"])
        .status()
        .expect("failed to invoke cargo check for squad-tactics CLI binary");

    assert!(status.success(), "cargo check --bin squad-tactics should succeed");
}

#[test]
fn bundled_catalog_runs_a_skirmish() {
    let output = Command::new(env!("CARGO_BIN_EXE_squad-tactics"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["--ticks", "400"])
        .output()
        .expect("failed to run the squad-tactics binary");

    assert!(output.status.success(), "skirmish run should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("skirmish ended after"),
        "unexpected output: {stdout}"
    );
}

#[test]
fn missing_catalog_fails_with_context() {
    let output = Command::new(env!("CARGO_BIN_EXE_squad-tactics"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["--catalog", "does/not/exist.toml"])
        .output()
        .expect("failed to run the squad-tactics binary");

    assert!(!output.status.success(), "missing catalog must fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to read unit catalog"),
        "unexpected error output: {stderr}"
    );
}
