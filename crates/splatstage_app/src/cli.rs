// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// splatstage - compose interactive scenes over gaussian splats
#[derive(Parser, Debug)]
#[command(name = "splatstage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Editor settings file (RON). Defaults apply when missing.
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a starter scene with one box and an always-on tooltip
    New {
        /// Output scene file (.ron or .json)
        out: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Load a scene, run one frame and print entities, groups and tooltips
    Inspect {
        /// Scene file (.ron or .json)
        scene: PathBuf,
        /// Print the tooltip list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the viewer scene document into a directory
    Export {
        /// Scene file (.ron or .json)
        scene: PathBuf,
        /// Output directory
        out_dir: PathBuf,
        /// Splat file referenced by the viewer
        #[arg(long)]
        splat: Option<String>,
        /// Skybox texture URL
        #[arg(long)]
        skybox: Option<String>,
    },
}
