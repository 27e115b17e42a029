use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::{MirrorConfig, DEFAULT_USER_AGENT};

#[derive(Parser, Debug)]
#[command(
    name = "site-mirror",
    about = "A CLI utility to mirror a web page with all of its assets",
    version,
    long_about = "Downloads a web page together with its stylesheets, scripts, images, fonts and media, rewrites every reference to the local copy and stores the result in a self-contained project folder."
)]
pub struct MirrorCommand {
    /// The URL of the page to mirror (https:// is assumed when no scheme is given)
    #[arg(required = true)]
    pub url: String,

    /// Directory in which the project folder is created
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Maximum concurrent asset downloads
    #[arg(short = 'c', long, default_value = "8", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_concurrent: u32,

    /// Timeout for requests in seconds
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// User agent string to use for requests
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Skip README.md, structure_prompt.txt and full_source_code.txt
    #[arg(long)]
    pub no_report: bool,

    /// Print the page's metadata and resource lists instead of mirroring it
    #[arg(long)]
    pub inspect: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl MirrorCommand {
    pub fn config(&self) -> MirrorConfig {
        MirrorConfig {
            user_agent: self.user_agent.clone(),
            timeout_secs: self.timeout,
            max_concurrent: self.max_concurrent as usize,
            write_report: !self.no_report,
        }
    }

    /// Default `env_logger` filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "site_mirror=warn",
            1 => "site_mirror=info",
            _ => "site_mirror=debug",
        }
    }
}
