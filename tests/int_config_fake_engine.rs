#![cfg(unix)]

mod support;

use std::process::Command;

#[test]
fn int_test_config_previews_the_compose_invocation() {
    let ctx = tempfile::tempdir().expect("ctx tmpdir");
    let fake = tempfile::tempdir().expect("fake tmpdir");
    support::write_context(ctx.path());
    support::install_fake_docker(fake.path(), support::FAKE_DOCKER_OK);

    let bin = env!("CARGO_BIN_EXE_simdock");
    let out = Command::new(bin)
        .args([
            "--context-dir",
            &ctx.path().display().to_string(),
            "--verbose",
            "config",
            "--gui",
            "webrtc",
            "--ros",
        ])
        .env("PATH", fake.path())
        .env("NO_COLOR", "1")
        .env_remove("SIMDOCK_TEST_DISABLE_DOCKER")
        .env_remove("SIMDOCK_SKIP_DOCKER")
        .output()
        .expect("run simdock config");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(out.status.success(), "config failed:\n{}", stderr);
    assert!(
        stderr.contains("simdock: docker: compose"),
        "verbose mode should preview the engine call:\n{}",
        stderr
    );
    assert!(stderr.contains(" config"), "stderr:\n{}", stderr);
    assert!(
        stderr.contains("--env-file") && stderr.contains(".env.webrtc"),
        "the webrtc env layer belongs in the plan:\n{}",
        stderr
    );
    assert!(
        !stderr.contains(" -p "),
        "config must not name a project:\n{}",
        stderr
    );
}
