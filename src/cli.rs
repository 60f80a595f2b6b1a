// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "fleetvisor")]
#[command(about = "Safe stop, start, and rolling restarts across supervisord domains")]
#[command(version)]
pub struct Cli {
    /// Config file (default: discover fleetvisor.yml in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new fleetvisor.yml configuration file
    Init {
        /// Directory holding the supervisord control sockets
        #[arg(long)]
        socket_dir: Option<String>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show process status per domain
    Status {
        /// Domains to inspect (default: all)
        domains: Vec<String>,
    },

    /// Stop processes
    Stop {
        #[command(flatten)]
        target: Target,

        /// Do not wait for the stop call to complete
        #[arg(long)]
        no_wait: bool,

        /// Kill processes still running after this long (e.g. 30s)
        #[arg(long, value_parser = parse_duration)]
        force_kill_timeout: Option<Duration>,
    },

    /// Start processes
    Start {
        #[command(flatten)]
        target: Target,

        /// Start workers of this color instead of the active one
        #[arg(short, long)]
        state: Option<String>,
    },

    /// Restart processes, swapping worker colors where possible
    Restart {
        /// Domains to restart (default: all)
        domains: Vec<String>,

        /// Do not wait for stop calls to complete
        #[arg(long)]
        no_wait: bool,

        /// Stop and start workers in place instead of swapping colors
        #[arg(long)]
        wait_workers: bool,

        /// Kill processes still running after this long (e.g. 30s)
        #[arg(long, value_parser = parse_duration)]
        force_kill_timeout: Option<Duration>,
    },

    /// Suspend job admission, optionally drain, then restart
    GracefulRestart {
        /// Domains to restart (default: all)
        domains: Vec<String>,

        /// Set the shared suspension flag first
        #[arg(long)]
        suspend: bool,

        /// Wait for job consumers to drain (implies --suspend)
        #[arg(long)]
        wait_jobs: bool,

        /// Enable maintenance mode and pause the scheduler while restarting
        #[arg(long)]
        pause_upstream: bool,

        /// How long to wait for consumers to drain
        #[arg(long, value_parser = parse_duration)]
        timeout: Option<Duration>,

        /// How often to check consumer states
        #[arg(long, value_parser = parse_duration)]
        poll_interval: Option<Duration>,

        /// Do not wait for stop calls to complete
        #[arg(long)]
        no_wait: bool,
    },

    /// Set the job suspension flag
    Suspend,

    /// Clear the job suspension flag
    Resume,
}

#[derive(Args)]
pub struct Target {
    /// Domains to act on (default: all)
    pub domains: Vec<String>,

    /// Only these processes
    #[arg(short, long = "process")]
    pub processes: Vec<String>,
}

impl Target {
    pub fn processes(&self) -> Option<Vec<String>> {
        if self.processes.is_empty() {
            None
        } else {
            Some(self.processes.clone())
        }
    }
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(s).map_err(|e| e.to_string())
}
