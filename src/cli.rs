use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::color::ColorMode;
use crate::profile::GuiMode;

/// `list --gui` filter values; `all` is the identity filter.
#[derive(Copy, Clone, PartialEq, Eq, Debug, clap::ValueEnum)]
pub enum GuiFilter {
    All,
    Webrtc,
    X11,
    None,
}

impl GuiFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            GuiFilter::All => "all",
            GuiFilter::Webrtc => "webrtc",
            GuiFilter::X11 => "x11",
            GuiFilter::None => "none",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, clap::ValueEnum)]
pub enum AccessFilter {
    All,
    Local,
    Remote,
}

impl AccessFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessFilter::All => "all",
            AccessFilter::Local => "local",
            AccessFilter::Remote => "remote",
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum SessionCmd {
    /// Start a new session
    Start {
        /// GUI mode (interactive menu when omitted)
        #[arg(long, value_enum)]
        gui: Option<GuiMode>,

        /// Enable the ROS 2 middleware layer
        #[arg(long)]
        ros: bool,

        /// Disable the ROS 2 middleware layer explicitly
        #[arg(long = "no-ros", conflicts_with = "ros")]
        no_ros: bool,

        /// Treat the session as remote (attaches the tunnel sidecar for webrtc)
        #[arg(long)]
        remote: bool,

        /// Force a pre-build of the base image before bring-up
        #[arg(long)]
        rebuild: bool,

        /// Container name suffix, e.g. --suffix dev gives simdock-base-dev
        #[arg(long)]
        suffix: Option<String>,
    },

    /// Enter a running session with an interactive shell
    Enter {
        /// Container name (e.g. simdock-base)
        #[arg(long)]
        name: Option<String>,

        /// Session id to match
        #[arg(long = "id")]
        id: Option<String>,
    },

    /// Stop a running session and remove its non-persistent volumes
    Stop {
        /// Container name (e.g. simdock-base)
        #[arg(long)]
        name: Option<String>,

        /// Session id to match
        #[arg(long = "id")]
        id: Option<String>,

        /// Do not prompt for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// List running sessions
    List {
        /// Filter by GUI mode
        #[arg(long, value_enum, default_value_t = GuiFilter::All)]
        gui: GuiFilter,

        /// Filter by access mode
        #[arg(long, value_enum, default_value_t = AccessFilter::All)]
        access: AccessFilter,

        /// Filter by nickname substring (case-insensitive)
        #[arg(long, default_value = "")]
        nickname: String,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Copy workbench artifacts (logs, docs, data) out of a running session
    Copy {
        /// Container name (e.g. simdock-base)
        #[arg(long)]
        name: Option<String>,

        /// Session id to match
        #[arg(long = "id")]
        id: Option<String>,

        /// Destination directory (defaults to the context directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the merged compose configuration for a flag selection
    Config {
        /// GUI mode to plan for
        #[arg(long, value_enum)]
        gui: Option<GuiMode>,

        /// Plan with the ROS 2 layer
        #[arg(long)]
        ros: bool,

        /// Plan without the ROS 2 layer explicitly
        #[arg(long = "no-ros", conflicts_with = "ros")]
        no_ros: bool,

        /// Plan as a remote session
        #[arg(long)]
        remote: bool,

        /// Write the configuration to a file instead of the terminal
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run diagnostics to check environment and configuration
    Doctor,
}

#[derive(Parser, Debug)]
#[command(
    name = "simdock",
    version,
    about = "Launch, enter and stop isolated containerized simulation sessions with GUI streaming and ROS support.",
    after_long_help = "Examples:\n  simdock start --gui webrtc --ros\n  simdock enter --id 171234-00042\n  simdock stop --name simdock-base -y\n  simdock list --gui webrtc --json\n  simdock config --gui x11 --output merged.yaml\n",
    after_help = "\n"
)]
pub struct Cli {
    /// Print detailed execution info
    #[arg(long)]
    pub verbose: bool,

    /// Colorize output: auto|always|never
    #[arg(long = "color", value_enum)]
    pub color: Option<ColorMode>,

    /// Session context directory (default: walk up from the working
    /// directory looking for compose/compose.yaml; SIMDOCK_CONTEXT overrides)
    #[arg(long = "context-dir")]
    pub context_dir: Option<PathBuf>,

    /// Action to run; an interactive menu is shown when omitted
    #[command(subcommand)]
    pub command: Option<SessionCmd>,
}
