//! Command-line interface.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use greenwall::{CommitMode, Identity, RemoteConfig, RemoteOptions, RunConfig, Spacing};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ModeArg {
    /// `git commit --allow-empty`
    Empty,
    /// Append to a tracked file before every commit
    Mutate,
}

impl From<ModeArg> for CommitMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Empty => CommitMode::Empty,
            ModeArg::Mutate => CommitMode::Mutate,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SpacingArg {
    /// Spaces take their glyph's width
    Advance,
    /// Spaces take no width
    Collapse,
}

impl From<SpacingArg> for Spacing {
    fn from(arg: SpacingArg) -> Self {
        match arg {
            SpacingArg::Advance => Spacing::Advance,
            SpacingArg::Collapse => Spacing::Collapse,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevelArg::Off => log::LevelFilter::Off,
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Generate git commits that draw a message on the contribution heatmap
#[derive(Debug, Parser)]
#[command(name = "greenwall")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Git author name
    #[arg(long)]
    pub name: String,

    /// Git author email
    #[arg(long)]
    pub email: String,

    /// Year for the commits (default: the trailing twelve months)
    #[arg(long)]
    pub year: Option<i32>,

    /// Message to draw
    #[arg(long)]
    pub message: String,

    /// Git repository URL to push to
    #[arg(long)]
    pub repository: String,

    /// GitHub token; deletes and recreates the remote repository first
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// BDF or PSF2 font (default: built-in 5x7 font)
    #[arg(long, value_name = "PATH")]
    pub font: Option<PathBuf>,

    /// Commits per lit cell
    #[arg(long, default_value_t = 400, value_parser = clap::value_parser!(u32).range(1..))]
    pub commits_per_day: u32,

    #[arg(long, value_enum, default_value = "empty")]
    pub mode: ModeArg,

    #[arg(long, value_enum, default_value = "advance")]
    pub spacing: SpacingArg,

    /// Directory whose git history is replaced
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub workdir: PathBuf,

    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Local hour of day for commit timestamps
    #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(0..24))]
    pub hour: u32,

    /// The repository owner is an organization
    #[arg(long)]
    pub org: bool,

    /// Create the remote repository as private
    #[arg(long)]
    pub private: bool,

    /// Stop after committing locally
    #[arg(long)]
    pub no_push: bool,

    /// Print the drawing and the planned commits without touching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Timeout for each git command
    #[arg(long, value_name = "SECONDS", default_value_t = 60)]
    pub command_timeout: u64,

    /// Timeout for each API request
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    pub http_timeout: u64,

    #[arg(long, value_enum, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevelArg,
}

impl Cli {
    pub fn to_config(&self) -> RunConfig {
        let identity = Identity {
            name: self.name.clone(),
            email: self.email.clone(),
        };
        let mut config = RunConfig::new(identity, self.message.as_str(), self.repository.as_str());
        config.year = self.year;
        config.font = self.font.clone();
        config.commits_per_day = self.commits_per_day;
        config.mode = self.mode.into();
        config.spacing = self.spacing.into();
        config.workdir = self.workdir.clone();
        config.branch = self.branch.clone();
        config.hour = self.hour;
        config.remote = self.github_token.as_ref().map(|token| RemoteConfig {
            token: token.clone(),
            options: RemoteOptions {
                private: self.private,
                organization: self.org,
                ..RemoteOptions::default()
            },
        });
        config.command_timeout = Duration::from_secs(self.command_timeout);
        config.http_timeout = Duration::from_secs(self.http_timeout);
        config.push = !self.no_push;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 9] = [
        "greenwall",
        "--name",
        "Octo Cat",
        "--email",
        "octo@example.com",
        "--message",
        "HI",
        "--repository",
        "git@github.com:octo/hi.git",
    ];

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(REQUIRED).unwrap();
        let config = cli.to_config();
        assert_eq!(config.identity.name, "Octo Cat");
        assert_eq!(config.message, "HI");
        assert_eq!(config.commits_per_day, 400);
        assert_eq!(config.mode, CommitMode::Empty);
        assert_eq!(config.spacing, Spacing::Advance);
        assert_eq!(config.hour, 12);
        assert!(config.push);
        assert!(!cli.dry_run);
    }

    #[test]
    fn token_enables_remote_reset() {
        let args = REQUIRED
            .iter()
            .copied()
            .chain(["--github-token", "t0ken", "--org", "--private"])
            .chain(["--mode", "mutate", "--no-push"]);
        let config = Cli::try_parse_from(args).unwrap().to_config();
        let remote = config.remote.unwrap();
        assert_eq!(remote.token, "t0ken");
        assert!(remote.options.organization && remote.options.private);
        assert_eq!(config.mode, CommitMode::Mutate);
        assert!(!config.push);
    }

    #[test]
    fn rejects_out_of_range_hour() {
        let args = REQUIRED.iter().copied().chain(["--hour", "24"]);
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn requires_message() {
        let args = REQUIRED.iter().copied().filter(|a| *a != "--message" && *a != "HI");
        assert!(Cli::try_parse_from(args).is_err());
    }
}
