//! Profile resolution and compose-overlay planning.
//!
//! A profile names one of the fixed deployment variants of the workbench
//! compose file. X11 sessions run under `base`/`ros2` with the X11 overlay
//! attached separately, so the engine-side profile set stays small.

use std::path::{Path, PathBuf};

use clap::ValueEnum;

/// Context-relative compose layout.
pub const COMPOSE_DIR: &str = "compose";
pub const ENV_DIR: &str = "compose/env";
const BASE_COMPOSE_FILE: &str = "compose.yaml";
const X11_OVERLAY_FILE: &str = "x11.yaml";
const TUNNEL_OVERLAY_FILE: &str = "tunnel.yaml";
const ENV_BASE: &str = ".env.base";
const ENV_ROS2: &str = ".env.ros2";
const ENV_WEBRTC: &str = ".env.webrtc";
const ENV_TUNNEL: &str = ".env.tunnel";

/// GUI streaming mode of a session. Each mode owns its own env-layer and
/// overlay contributions; the lifecycle controller never special-cases modes
/// inline.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum GuiMode {
    None,
    X11,
    Webrtc,
}

impl GuiMode {
    pub fn as_label(self) -> &'static str {
        match self {
            GuiMode::None => "none",
            GuiMode::X11 => "x11",
            GuiMode::Webrtc => "webrtc",
        }
    }

    pub fn parse_label(s: &str) -> Option<GuiMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Some(GuiMode::None),
            "x11" => Some(GuiMode::X11),
            "webrtc" => Some(GuiMode::Webrtc),
            _ => None,
        }
    }

    /// Env layer contributed by this mode, if any.
    fn env_layer(self) -> Option<&'static str> {
        match self {
            GuiMode::Webrtc => Some(ENV_WEBRTC),
            GuiMode::None | GuiMode::X11 => None,
        }
    }

    /// Overlay file contributed by this mode. X11 attaches its overlay only
    /// when the invoking environment actually has a display; absence is a
    /// silent downgrade, not an error.
    fn overlay_file(self, display_available: bool) -> Option<&'static str> {
        match self {
            GuiMode::X11 if display_available => Some(X11_OVERLAY_FILE),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccessMode {
    Local,
    Remote,
}

impl AccessMode {
    pub fn from_remote_flag(remote: bool) -> AccessMode {
        if remote {
            AccessMode::Remote
        } else {
            AccessMode::Local
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            AccessMode::Local => "local",
            AccessMode::Remote => "remote",
        }
    }
}

/// Closed set of engine-side deployment variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Profile {
    Base,
    Ros2,
    WebrtcLocal,
    WebrtcRemote,
    Ros2WebrtcLocal,
    Ros2WebrtcRemote,
}

impl Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Base => "base",
            Profile::Ros2 => "ros2",
            Profile::WebrtcLocal => "webrtc-local",
            Profile::WebrtcRemote => "webrtc-remote",
            Profile::Ros2WebrtcLocal => "ros2-webrtc-local",
            Profile::Ros2WebrtcRemote => "ros2-webrtc-remote",
        }
    }

    pub fn parse(s: &str) -> Option<Profile> {
        match s.trim() {
            "base" => Some(Profile::Base),
            "ros2" => Some(Profile::Ros2),
            "webrtc-local" => Some(Profile::WebrtcLocal),
            "webrtc-remote" => Some(Profile::WebrtcRemote),
            "ros2-webrtc-local" => Some(Profile::Ros2WebrtcLocal),
            "ros2-webrtc-remote" => Some(Profile::Ros2WebrtcRemote),
            _ => None,
        }
    }

    /// Deterministic mapping from user intent to profile. X11 rides on
    /// `base`/`ros2` and ignores the remote flag (remote only applies to
    /// WebRTC streaming).
    pub fn resolve(gui: GuiMode, ros: bool, remote: bool) -> Profile {
        match (gui, ros) {
            (GuiMode::None, false) | (GuiMode::X11, false) => Profile::Base,
            (GuiMode::None, true) | (GuiMode::X11, true) => Profile::Ros2,
            (GuiMode::Webrtc, false) => {
                if remote {
                    Profile::WebrtcRemote
                } else {
                    Profile::WebrtcLocal
                }
            }
            (GuiMode::Webrtc, true) => {
                if remote {
                    Profile::Ros2WebrtcRemote
                } else {
                    Profile::Ros2WebrtcLocal
                }
            }
        }
    }

    pub fn uses_ros(self) -> bool {
        matches!(
            self,
            Profile::Ros2 | Profile::Ros2WebrtcLocal | Profile::Ros2WebrtcRemote
        )
    }

    pub fn uses_webrtc(self) -> bool {
        matches!(
            self,
            Profile::WebrtcLocal
                | Profile::WebrtcRemote
                | Profile::Ros2WebrtcLocal
                | Profile::Ros2WebrtcRemote
        )
    }

    pub fn is_remote(self) -> bool {
        matches!(self, Profile::WebrtcRemote | Profile::Ros2WebrtcRemote)
    }

    /// Engine-level container name for this profile, with an optional
    /// user-chosen suffix to keep same-profile sessions apart.
    pub fn container_name(self, suffix: Option<&str>) -> String {
        let mut name = format!("{}{}", crate::CONTAINER_PREFIX, self.as_str());
        if let Some(s) = suffix {
            let s = s.trim();
            if !s.is_empty() {
                name.push('-');
                name.push_str(s);
            }
        }
        name
    }

    /// Image tag built by compose for this profile; shares the container
    /// name stem.
    pub fn image_name(self, suffix: Option<&str>) -> String {
        format!("{}:latest", self.container_name(suffix))
    }
}

/// Ordered compose-file and env-file lists for one engine invocation. The
/// base entries always come first; conditional layers keep a fixed relative
/// order (base, ros, gui, tunnel) so override expectations hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayPlan {
    pub profile: Profile,
    pub compose_files: Vec<PathBuf>,
    pub env_files: Vec<PathBuf>,
}

impl OverlayPlan {
    /// Plan a fresh start from user intent.
    pub fn for_start(
        context_dir: &Path,
        gui: GuiMode,
        ros: bool,
        remote: bool,
        display_available: bool,
    ) -> OverlayPlan {
        let profile = Profile::resolve(gui, ros, remote);
        let compose = context_dir.join(COMPOSE_DIR);
        let env = context_dir.join(ENV_DIR);

        let mut compose_files = vec![compose.join(BASE_COMPOSE_FILE)];
        if let Some(f) = gui.overlay_file(display_available) {
            compose_files.push(compose.join(f));
        }
        if profile.is_remote() {
            compose_files.push(compose.join(TUNNEL_OVERLAY_FILE));
        }

        let mut env_files = vec![env.join(ENV_BASE)];
        if ros {
            env_files.push(env.join(ENV_ROS2));
        }
        if let Some(f) = gui.env_layer() {
            env_files.push(env.join(f));
        }
        if gui == GuiMode::Webrtc && remote {
            env_files.push(env.join(ENV_TUNNEL));
        }

        OverlayPlan {
            profile,
            compose_files,
            env_files,
        }
    }

    /// Re-derive a teardown plan from the profile string stored on a running
    /// session. The stored profile is authoritative; current CLI flags play no
    /// part. The X11 overlay is never re-attached here: credential teardown is
    /// handled separately and compose-down does not need the mount.
    pub fn for_stored_profile(context_dir: &Path, profile_str: &str) -> OverlayPlan {
        // Unparseable (pre-release) profile strings fall back to substring
        // inference, same rules as the registry.
        let parsed = Profile::parse(profile_str);
        let remote = parsed
            .map(Profile::is_remote)
            .unwrap_or_else(|| profile_str.ends_with("-remote"));
        let ros = parsed
            .map(Profile::uses_ros)
            .unwrap_or_else(|| profile_str.starts_with("ros2"));
        let webrtc = parsed
            .map(Profile::uses_webrtc)
            .unwrap_or_else(|| profile_str.contains("webrtc"));
        let compose = context_dir.join(COMPOSE_DIR);
        let env = context_dir.join(ENV_DIR);

        let mut compose_files = vec![compose.join(BASE_COMPOSE_FILE)];
        if remote {
            compose_files.push(compose.join(TUNNEL_OVERLAY_FILE));
        }

        let mut env_files = vec![env.join(ENV_BASE)];
        if ros {
            env_files.push(env.join(ENV_ROS2));
        }
        if webrtc {
            env_files.push(env.join(ENV_WEBRTC));
        }
        if remote {
            env_files.push(env.join(ENV_TUNNEL));
        }

        OverlayPlan {
            profile: parsed.unwrap_or(Profile::Base),
            compose_files,
            env_files,
        }
    }

    /// Path of the base compose file for a context (used by the pre-build
    /// step, which deliberately skips all overlays).
    pub fn base_compose_file(context_dir: &Path) -> PathBuf {
        context_dir.join(COMPOSE_DIR).join(BASE_COMPOSE_FILE)
    }

    pub fn base_env_file(context_dir: &Path) -> PathBuf {
        context_dir.join(ENV_DIR).join(ENV_BASE)
    }
}
