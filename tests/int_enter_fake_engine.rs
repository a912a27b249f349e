#![cfg(unix)]

mod support;

use std::process::Command;

/// Stub with one listed session whose container has already exited.
const FAKE_DOCKER_EXITED: &str = concat!(
    "#!/bin/sh\n",
    "case \"$1\" in\n",
    "  ps) printf 'cafe0001\\tsimdock-base\\t171234-00042\\tbrave otter\\tbase\\tnone\\tunknown\\n' ;;\n",
    "  container) printf 'exited\\n' ;;\n",
    "  *) ;;\n",
    "esac\n",
    "exit 0\n"
);

/// Stub whose `exec` fails with a distinctive status.
const FAKE_DOCKER_EXEC_7: &str = concat!(
    "#!/bin/sh\n",
    "case \"$1\" in\n",
    "  ps) printf 'cafe0001\\tsimdock-base\\t171234-00042\\tbrave otter\\tbase\\tnone\\tunknown\\n' ;;\n",
    "  container) printf 'running\\n' ;;\n",
    "  exec) exit 7 ;;\n",
    "  *) ;;\n",
    "esac\n",
    "exit 0\n"
);

#[test]
fn int_test_enter_exited_container_is_not_running() {
    let ctx = tempfile::tempdir().expect("ctx tmpdir");
    let fake = tempfile::tempdir().expect("fake tmpdir");
    support::write_context(ctx.path());
    support::install_fake_docker(fake.path(), FAKE_DOCKER_EXITED);

    let bin = env!("CARGO_BIN_EXE_simdock");
    let out = Command::new(bin)
        .args([
            "--context-dir",
            &ctx.path().display().to_string(),
            "enter",
            "--name",
            "simdock-base",
        ])
        .env("PATH", fake.path())
        .env("NO_COLOR", "1")
        .env_remove("SIMDOCK_TEST_DISABLE_DOCKER")
        .env_remove("SIMDOCK_SKIP_DOCKER")
        .output()
        .expect("run simdock enter");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("is not running"),
        "stderr:\n{}",
        stderr
    );
}

#[test]
fn int_test_enter_propagates_the_shell_exit_status() {
    let ctx = tempfile::tempdir().expect("ctx tmpdir");
    let fake = tempfile::tempdir().expect("fake tmpdir");
    support::write_context(ctx.path());
    support::install_fake_docker(fake.path(), FAKE_DOCKER_EXEC_7);

    let bin = env!("CARGO_BIN_EXE_simdock");
    let out = Command::new(bin)
        .args([
            "--context-dir",
            &ctx.path().display().to_string(),
            "enter",
            "--name",
            "simdock-base",
        ])
        .env("PATH", fake.path())
        .env("NO_COLOR", "1")
        .env_remove("SIMDOCK_TEST_DISABLE_DOCKER")
        .env_remove("SIMDOCK_SKIP_DOCKER")
        .output()
        .expect("run simdock enter");
    assert_eq!(
        out.status.code(),
        Some(7),
        "the in-container shell's status must pass through; stderr:\n{}",
        String::from_utf8_lossy(&out.stderr)
    );
}
