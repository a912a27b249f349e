//! Compose invocation layer.
//!
//! One `ComposeContext` value carries everything a compose call needs:
//! context directory, project name, file/env-file plan, and interpolation
//! variables. It is passed by value into the engine boundary; the ambient
//! process environment is never mutated. Variables reach compose both as
//! `--env-file` flags and as child-process environment, because
//! interpolation inside the compose files needs the latter.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use crate::docker::Docker;
use crate::profile::OverlayPlan;

/// Service name of the buildable base image inside the compose file.
pub const BASE_SERVICE: &str = "workbench-base";

pub struct ComposeContext {
    pub context_dir: PathBuf,
    pub project: Option<String>,
    pub plan: OverlayPlan,
    pub vars: BTreeMap<String, String>,
}

impl ComposeContext {
    pub fn new(context_dir: &Path, plan: OverlayPlan) -> ComposeContext {
        ComposeContext {
            context_dir: context_dir.to_path_buf(),
            project: None,
            plan,
            vars: BTreeMap::new(),
        }
    }

    pub fn with_project(mut self, project: &str) -> ComposeContext {
        self.project = Some(project.to_string());
        self
    }

    pub fn insert_var(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    pub fn extend_vars(&mut self, vars: BTreeMap<String, String>) {
        self.vars.extend(vars);
    }

    /// Fixed argument order: project, compose files, profile, env files.
    /// Callers append the subcommand.
    pub fn args_with_profile(&self) -> Vec<String> {
        let mut args = self.args_without_profile_inner(true);
        args.extend(self.env_file_args());
        args
    }

    /// Teardown argument order: same as start minus the `--profile` filter,
    /// so `down` sees every service regardless of profile gating.
    pub fn args_without_profile(&self) -> Vec<String> {
        let mut args = self.args_without_profile_inner(false);
        args.extend(self.env_file_args());
        args
    }

    fn args_without_profile_inner(&self, with_profile: bool) -> Vec<String> {
        let mut args = vec!["compose".to_string()];
        if let Some(p) = &self.project {
            args.push("-p".to_string());
            args.push(p.clone());
        }
        for f in &self.plan.compose_files {
            args.push("--file".to_string());
            args.push(f.display().to_string());
        }
        if with_profile {
            args.push("--profile".to_string());
            args.push(self.plan.profile.as_str().to_string());
        }
        args
    }

    fn env_file_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.plan.env_files.len() * 2);
        for f in &self.plan.env_files {
            args.push("--env-file".to_string());
            args.push(f.display().to_string());
        }
        args
    }

    /// `compose ... up --detach --remove-orphans`, streaming engine output to
    /// the terminal (image builds can take a while).
    pub fn up(&self, docker: &Docker) -> io::Result<ExitStatus> {
        let mut args = self.args_with_profile();
        args.extend([
            "up".to_string(),
            "--detach".to_string(),
            "--remove-orphans".to_string(),
        ]);
        docker.run_inherit_with_env_in(&self.context_dir, &args, &self.vars)
    }

    /// `compose ... down --volumes --remove-orphans`.
    pub fn down(&self, docker: &Docker) -> io::Result<ExitStatus> {
        let mut args = self.args_without_profile();
        args.extend([
            "down".to_string(),
            "--volumes".to_string(),
            "--remove-orphans".to_string(),
        ]);
        docker.run_inherit_with_env_in(&self.context_dir, &args, &self.vars)
    }

    /// `compose ... config [--output <file>]`: dump the merged configuration
    /// for debugging overlay and env-file layering.
    pub fn config(&self, docker: &Docker, output: Option<&Path>) -> io::Result<ExitStatus> {
        let mut args = self.args_with_profile();
        args.push("config".to_string());
        if let Some(out) = output {
            args.push("--output".to_string());
            args.push(out.display().to_string());
        }
        docker.run_inherit_with_env_in(&self.context_dir, &args, &self.vars)
    }
}

/// Pre-build the base image with only the base file and base env layer; the
/// overlays do not matter for the image and skipping them keeps the build
/// independent of per-session state.
pub fn build_base(
    docker: &Docker,
    context_dir: &Path,
    vars: &BTreeMap<String, String>,
) -> io::Result<ExitStatus> {
    let args = vec![
        "compose".to_string(),
        "--file".to_string(),
        OverlayPlan::base_compose_file(context_dir).display().to_string(),
        "--env-file".to_string(),
        OverlayPlan::base_env_file(context_dir).display().to_string(),
        "build".to_string(),
        BASE_SERVICE.to_string(),
    ];
    docker.run_inherit_with_env_in(context_dir, &args, vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{GuiMode, OverlayPlan};

    fn ctx() -> ComposeContext {
        let plan = OverlayPlan::for_start(Path::new("/ctx"), GuiMode::Webrtc, true, true, false);
        ComposeContext::new(Path::new("/ctx"), plan).with_project("171234-00042")
    }

    #[test]
    fn test_args_with_profile_order() {
        let args = ctx().args_with_profile();
        let got: Vec<&str> = args.iter().map(String::as_str).collect();
        assert_eq!(
            got,
            vec![
                "compose",
                "-p",
                "171234-00042",
                "--file",
                "/ctx/compose/compose.yaml",
                "--file",
                "/ctx/compose/tunnel.yaml",
                "--profile",
                "ros2-webrtc-remote",
                "--env-file",
                "/ctx/compose/env/.env.base",
                "--env-file",
                "/ctx/compose/env/.env.ros2",
                "--env-file",
                "/ctx/compose/env/.env.webrtc",
                "--env-file",
                "/ctx/compose/env/.env.tunnel",
            ]
        );
    }

    #[test]
    fn test_args_without_profile_skips_profile_only() {
        let args = ctx().args_without_profile();
        assert!(!args.contains(&"--profile".to_string()));
        assert!(args.contains(&"--env-file".to_string()));
        assert_eq!(args[0], "compose");
    }

    #[test]
    fn test_no_project_flag_when_unset() {
        let plan = OverlayPlan::for_start(Path::new("/ctx"), GuiMode::None, false, false, false);
        let args = ComposeContext::new(Path::new("/ctx"), plan).args_with_profile();
        assert!(!args.contains(&"-p".to_string()));
        assert_eq!(args[1], "--file");
    }

    #[test]
    fn test_insert_and_extend_vars() {
        let mut c = ctx();
        c.insert_var("SESSION_ID", "171234-00042");
        let mut extra = BTreeMap::new();
        extra.insert("SESSION_ID".to_string(), "override".to_string());
        extra.insert("SESSION_GUI".to_string(), "webrtc".to_string());
        c.extend_vars(extra);
        assert_eq!(c.vars.get("SESSION_ID").map(String::as_str), Some("override"));
        assert_eq!(c.vars.get("SESSION_GUI").map(String::as_str), Some("webrtc"));
    }
}
