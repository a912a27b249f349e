#![cfg(unix)]

mod support;

use std::process::Command;

#[test]
fn int_test_copy_lists_the_three_artifact_mappings() {
    let ctx = tempfile::tempdir().expect("ctx tmpdir");
    let fake = tempfile::tempdir().expect("fake tmpdir");
    let dest = tempfile::tempdir().expect("dest tmpdir");
    support::write_context(ctx.path());
    support::install_fake_docker(fake.path(), support::FAKE_DOCKER_ONE_SESSION);

    let bin = env!("CARGO_BIN_EXE_simdock");
    let out = Command::new(bin)
        .args([
            "--context-dir",
            &ctx.path().display().to_string(),
            "copy",
            "--name",
            "simdock-base",
            "--output",
            &dest.path().display().to_string(),
        ])
        .env("PATH", fake.path())
        .env("NO_COLOR", "1")
        .env_remove("SIMDOCK_TEST_DISABLE_DOCKER")
        .env_remove("SIMDOCK_SKIP_DOCKER")
        .output()
        .expect("run simdock copy");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(out.status.success(), "copy failed:\n{}", stderr);

    let stdout = String::from_utf8_lossy(&out.stdout);
    for sub in ["logs", "docs/_build", "data_storage"] {
        assert!(
            stdout.contains(&format!("/workspace/workbench/{} ->", sub)),
            "missing mapping for {}:\n{}",
            sub,
            stdout
        );
    }
    assert!(
        dest.path().join("artifacts").is_dir(),
        "destination root must be created"
    );
    assert!(stderr.contains("finished copying artifacts"), "stderr:\n{}", stderr);
}

#[test]
fn int_test_copy_requires_the_workbench_path_layer_var() {
    let ctx = tempfile::tempdir().expect("ctx tmpdir");
    let fake = tempfile::tempdir().expect("fake tmpdir");
    support::write_context(ctx.path());
    // Drop the workbench path from the base layer; copy has no source root
    // to resolve against without it.
    std::fs::write(ctx.path().join("compose/env/.env.base"), "ACCEPT_EULA=Y\n")
        .expect("rewrite .env.base");
    support::install_fake_docker(fake.path(), support::FAKE_DOCKER_ONE_SESSION);

    let bin = env!("CARGO_BIN_EXE_simdock");
    let out = Command::new(bin)
        .args([
            "--context-dir",
            &ctx.path().display().to_string(),
            "copy",
            "--name",
            "simdock-base",
        ])
        .env("PATH", fake.path())
        .env("NO_COLOR", "1")
        .env_remove("SIMDOCK_TEST_DISABLE_DOCKER")
        .env_remove("SIMDOCK_SKIP_DOCKER")
        .output()
        .expect("run simdock copy");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("DOCKER_WORKBENCH_PATH is not set"),
        "stderr:\n{}",
        stderr
    );
}
