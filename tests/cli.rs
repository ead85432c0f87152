use assert_cmd::Command;

#[test]
fn screens_lists_all_six_dashboards() {
    let output = Command::cargo_bin("jobpulse")
        .expect("binary")
        .arg("screens")
        .output()
        .expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    for name in [
        "import-jobs",
        "export-jobs",
        "delivery-orders",
        "billing",
        "kyc",
        "documents",
    ] {
        assert!(stdout.contains(name), "screens output missing {name}");
    }
    assert!(stdout.contains("todayJobCreateImport"));
    assert!(stdout.contains("doPlanningPending"));
}

#[test]
fn watch_rejects_malformed_fiscal_year() {
    let output = Command::cargo_bin("jobpulse")
        .expect("binary")
        .args([
            "watch",
            "--screen",
            "import-jobs",
            "--year",
            "2025-26",
            "--feed-url",
            "ws://127.0.0.1:1/feed",
        ])
        .output()
        .expect("run");
    assert!(!output.status.success());
}

#[test]
fn watch_rejects_unknown_screen_name() {
    let output = Command::cargo_bin("jobpulse")
        .expect("binary")
        .args(["watch", "--screen", "warehouse"])
        .output()
        .expect("run");
    assert!(!output.status.success());
}
