/*!
Test support helpers shared across integration tests.

- have_docker(): check docker availability on PATH
- write_context(dir): lay out a minimal session context (compose files + env layers)
- install_fake_docker(dir, script): drop an executable `docker` stub for PATH tests

These helpers do not print skip messages themselves so tests can keep their
own "skipping: ..." outputs verbatim.
*/

use std::path::Path;
use std::process::Command;

/// Return true if `docker` is available on PATH.
#[allow(dead_code)]
pub fn have_docker() -> bool {
    Command::new("docker")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Lay out a minimal context directory: compose entrypoint, overlays and the
/// four env layers. Values are plausible rather than real; fake-engine tests
/// only need the files to parse.
#[allow(dead_code)]
pub fn write_context(dir: &Path) {
    let compose = dir.join("compose");
    let env = compose.join("env");
    std::fs::create_dir_all(&env).expect("create context dirs");

    std::fs::write(
        compose.join("compose.yaml"),
        concat!(
            "services:\n",
            "  workbench-base:\n",
            "    image: workbench:latest\n",
            "    container_name: ${CONTAINER_NAME}\n",
            "    labels:\n",
            "      com.simdock.session_id: ${SESSION_ID}\n",
            "      com.simdock.nickname: ${SESSION_NICKNAME}\n",
            "      com.simdock.profile: ${SESSION_PROFILE}\n",
            "      com.simdock.gui: ${SESSION_GUI}\n",
            "      com.simdock.access: ${SESSION_ACCESS}\n",
        ),
    )
    .expect("write compose.yaml");
    std::fs::write(
        compose.join("x11.yaml"),
        "services:\n  workbench-base:\n    volumes:\n      - ${X11_COOKIE_FILE}:/tmp/.docker.xauth\n",
    )
    .expect("write x11.yaml");
    std::fs::write(
        compose.join("tunnel.yaml"),
        "services:\n  tunnel:\n    image: tunnel:latest\n    container_name: tunnel-${SESSION_ID}\n",
    )
    .expect("write tunnel.yaml");

    std::fs::write(
        env.join(".env.base"),
        "DOCKER_WORKBENCH_PATH=/workspace/workbench\nACCEPT_EULA=Y\n",
    )
    .expect("write .env.base");
    std::fs::write(env.join(".env.ros2"), "ROS_DISTRO=humble\n").expect("write .env.ros2");
    std::fs::write(
        env.join(".env.webrtc"),
        "WEBRTC_HTTP_PORT=8211\nWEBRTC_TCP_PORT=49100\nWEBRTC_UDP_PORT=47998\n",
    )
    .expect("write .env.webrtc");
    std::fs::write(env.join(".env.tunnel"), "TUNNEL_AUTHKEY=\n").expect("write .env.tunnel");
}

/// Install an executable `docker` stub into `dir` (unix only). Tests point
/// PATH at `dir` so the binary under test resolves the stub instead of a
/// real engine.
#[cfg(unix)]
#[allow(dead_code)]
pub fn install_fake_docker(dir: &Path, script: &str) {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("docker");
    std::fs::write(&path, script).expect("write docker stub");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod docker stub");
}

/// Stub that accepts every invocation silently.
#[allow(dead_code)]
pub const FAKE_DOCKER_OK: &str = "#!/bin/sh\nexit 0\n";

/// Stub that reports one running base session for `ps` queries and answers
/// `container inspect` with "running"; everything else succeeds silently.
#[allow(dead_code)]
pub const FAKE_DOCKER_ONE_SESSION: &str = concat!(
    "#!/bin/sh\n",
    "case \"$1\" in\n",
    "  ps) printf 'cafe0001\\tsimdock-base\\t171234-00042\\tbrave otter\\tbase\\tnone\\tunknown\\n' ;;\n",
    "  container) printf 'running\\n' ;;\n",
    "  *) ;;\n",
    "esac\n",
    "exit 0\n"
);
