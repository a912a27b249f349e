#![cfg(unix)]

mod support;

use std::process::Command;

#[test]
fn int_test_start_without_gui_flag_refuses_off_tty() {
    let ctx = tempfile::tempdir().expect("ctx tmpdir");
    let fake = tempfile::tempdir().expect("fake tmpdir");
    support::write_context(ctx.path());
    support::install_fake_docker(fake.path(), support::FAKE_DOCKER_OK);

    // Captured output means stdin is not a terminal, so the GUI menu must
    // refuse instead of blocking on a prompt nobody will answer.
    let bin = env!("CARGO_BIN_EXE_simdock");
    let out = Command::new(bin)
        .args(["--context-dir", &ctx.path().display().to_string(), "start"])
        .env("PATH", fake.path())
        .env("NO_COLOR", "1")
        .env_remove("SIMDOCK_TEST_DISABLE_DOCKER")
        .env_remove("SIMDOCK_SKIP_DOCKER")
        .output()
        .expect("run simdock start");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("pass --gui webrtc|x11|none"),
        "stderr:\n{}",
        stderr
    );
}
