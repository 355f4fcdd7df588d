//! A complete run: plan the drawing, optionally reset the remote, rewrite
//! local history and push.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, NaiveDate, TimeZone};
use log::{info, warn};

use crate::calendar::{self, CalendarMapper};
use crate::error::{CalendarError, Error};
use crate::font::Font;
use crate::git::{CommitMode, CommitSpec, Executor, Git, Identity};
use crate::raster::{self, Spacing, VISIBLE_WEEKS};
use crate::remote::{RemoteOptions, RepoManager, RepoRef, Transport};

/// Everything a run needs. Built by the CLI; the library reads no ambient
/// state.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub identity: Identity,
    pub message: String,
    /// Remote URL pushed to.
    pub repository: String,
    /// Explicit year; `None` draws on the trailing twelve months.
    pub year: Option<i32>,
    /// BDF or PSF2 font; `None` uses the embedded font.
    pub font: Option<PathBuf>,
    pub commits_per_day: u32,
    pub mode: CommitMode,
    pub spacing: Spacing,
    pub workdir: PathBuf,
    pub branch: String,
    /// Local hour of day of every commit.
    pub hour: u32,
    pub remote: Option<RemoteConfig>,
    pub command_timeout: Duration,
    pub http_timeout: Duration,
    pub push: bool,
}

impl RunConfig {
    pub fn new(
        identity: Identity,
        message: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            message: message.into(),
            repository: repository.into(),
            year: None,
            font: None,
            commits_per_day: 400,
            mode: CommitMode::Empty,
            spacing: Spacing::Advance,
            workdir: PathBuf::from("."),
            branch: "main".to_string(),
            hour: 12,
            remote: None,
            command_timeout: Duration::from_secs(60),
            http_timeout: Duration::from_secs(30),
            push: true,
        }
    }
}

/// Enables the remote reset.
#[derive(Clone)]
pub struct RemoteConfig {
    pub token: String,
    pub options: RemoteOptions,
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("token", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

/// The drawing, resolved to dated commits. Producing a plan has no side
/// effects.
#[derive(Debug, Clone)]
pub struct Plan {
    pub reference: NaiveDate,
    pub specs: Vec<CommitSpec>,
    pub weeks: u32,
    pub preview: String,
}

impl Plan {
    pub fn commits(&self) -> usize {
        self.specs.iter().map(|s| s.repeat as usize).sum()
    }
}

/// Plans in the system time zone relative to today.
pub fn plan(config: &RunConfig) -> Result<Plan, Error> {
    let reference = match config.year {
        Some(year) => calendar::reference_for_year(year)?,
        None => calendar::reference_trailing(Local::now().date_naive())?,
    };
    let mapper = CalendarMapper::local(reference, config.hour)?;
    plan_with(config, &mapper)
}

/// Plans against an explicit calendar.
pub fn plan_with<Tz>(config: &RunConfig, calendar: &CalendarMapper<Tz>) -> Result<Plan, Error>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let font = match &config.font {
        Some(path) => Font::load(path)?,
        None => Font::builtin()?,
    };
    let raster = raster::rasterize(&font, &config.message, config.spacing)?;
    if raster.weeks() > VISIBLE_WEEKS {
        warn!(
            "message spans {} weeks; only {VISIBLE_WEEKS} fit on the heatmap",
            raster.weeks()
        );
    }

    let specs = raster
        .iter()
        .map(|coordinate| {
            Ok(CommitSpec {
                coordinate,
                date: calendar.iso8601(coordinate)?,
                repeat: config.commits_per_day,
            })
        })
        .collect::<Result<Vec<_>, CalendarError>>()?;

    info!(
        "planned {} cells over {} weeks starting {}",
        specs.len(),
        raster.weeks(),
        calendar.reference()
    );
    Ok(Plan {
        reference: calendar.reference(),
        specs,
        weeks: raster.weeks(),
        preview: raster.preview(),
    })
}

/// Result of the optional remote reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Skipped,
    Recreated { html_url: Option<String> },
    /// Reported and ignored; local history was still generated.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub commits: usize,
    pub remote: RemoteStatus,
    pub pushed: bool,
}

/// Carries out `plan`: remote reset, fresh local history, commits, push.
/// The remote is only reset on runs that push.
pub fn execute<E: Executor, T: Transport>(
    config: &RunConfig,
    plan: &Plan,
    executor: E,
    transport: T,
) -> Result<Summary, Error> {
    let remote = match &config.remote {
        Some(remote) if config.push => reset_remote(&config.repository, remote, transport),
        Some(_) => {
            warn!("not pushing; leaving remote repository {} untouched", config.repository);
            RemoteStatus::Skipped
        }
        None => RemoteStatus::Skipped,
    };

    let mut git = Git::new(executor, &config.workdir, config.identity.clone())
        .with_branch(&config.branch)
        .with_mode(config.mode);
    git.reinit()?;
    let commits = git.paint(&plan.specs)?;
    info!("repository with pattern created ({commits} commits)");

    if config.push {
        git.add_remote(&config.repository)?;
        git.push()?;
        info!("pushed {} to {}", config.branch, config.repository);
    }

    Ok(Summary {
        commits,
        remote,
        pushed: config.push,
    })
}

fn reset_remote<T: Transport>(url: &str, remote: &RemoteConfig, transport: T) -> RemoteStatus {
    let repo = match RepoRef::parse(url) {
        Ok(repo) => repo,
        Err(e) => {
            warn!("skipping remote reset: {e}");
            return RemoteStatus::Failed(e.to_string());
        }
    };
    match RepoManager::new(transport, remote.token.as_str()).recreate(&repo, &remote.options) {
        Ok(recreated) => {
            if let Some(url) = &recreated.html_url {
                info!("remote repository ready at {url}");
            }
            RemoteStatus::Recreated {
                html_url: recreated.html_url,
            }
        }
        Err(e) => {
            warn!("remote reset failed: {e}");
            RemoteStatus::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, Utc};

    use super::*;
    use crate::git::tests::Recorder;
    use crate::remote::tests::Scripted;

    fn config(message: &str) -> RunConfig {
        let mut config = RunConfig::new(
            Identity {
                name: "Octo Cat".to_string(),
                email: "octo@example.com".to_string(),
            },
            message,
            "https://github.com/alice/demo.git",
        );
        config.commits_per_day = 2;
        config
    }

    fn mapper() -> CalendarMapper<Utc> {
        let reference = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        CalendarMapper::new(reference, NaiveTime::from_hms_opt(12, 0, 0).unwrap(), Utc)
    }

    #[test]
    fn plan_dates_every_lit_cell() {
        let plan = plan_with(&config("Hi"), &mapper()).unwrap();
        let font = Font::builtin().unwrap();
        let lit = font.glyph('H').unwrap().lit_pixels() + font.glyph('i').unwrap().lit_pixels();
        assert_eq!(plan.specs.len(), lit);
        assert_eq!(plan.commits(), lit * 2);
        let first = &plan.specs[0];
        assert_eq!(first.coordinate.day, 0);
        assert_eq!(first.date, "2024-01-07T12:00:00+00:00");
        assert_eq!(plan.preview.lines().count(), 7);
    }

    #[test]
    fn plan_rejects_unknown_characters() {
        let err = plan_with(&config("naïve ☃"), &mapper()).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn plan_reports_missing_font() {
        let mut config = config("x");
        config.font = Some(PathBuf::from("/nonexistent/greenwall.bdf"));
        assert!(matches!(plan_with(&config, &mapper()), Err(Error::Font(_))));
    }

    #[test]
    fn unknown_character_leaves_history_alone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let mut config = config("☃");
        config.workdir = dir.path().to_path_buf();
        assert!(plan_with(&config, &mapper()).is_err());
        assert!(dir.path().join(".git").exists());
    }

    #[test]
    fn executes_without_remote() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(".");
        config.workdir = dir.path().to_path_buf();
        let plan = plan_with(&config, &mapper()).unwrap();
        let mut recorder = Recorder::default();
        let transport = Scripted::default();

        let summary = execute(&config, &plan, &mut recorder, &transport).unwrap();
        // '.' lights four cells
        assert_eq!(summary.commits, 8);
        assert_eq!(summary.remote, RemoteStatus::Skipped);
        assert!(summary.pushed);
        assert!(transport.requests.borrow().is_empty());

        let args: Vec<_> = recorder.invocations.iter().map(|c| c.args.join(" ")).collect();
        assert_eq!(args.len(), 2 + 8 + 2);
        assert_eq!(args[0], "init");
        assert_eq!(args[1], "checkout -b main");
        assert_eq!(args[10], "remote add origin https://github.com/alice/demo.git");
        assert_eq!(args[11], "push -f origin main");
    }

    #[test]
    fn remote_failure_does_not_block_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(".");
        config.workdir = dir.path().to_path_buf();
        config.remote = Some(RemoteConfig {
            token: "t0ken".to_string(),
            options: RemoteOptions::default(),
        });
        let plan = plan_with(&config, &mapper()).unwrap();
        let mut recorder = Recorder::default();
        let transport = Scripted::new(&[(500, "boom")]);

        let summary = execute(&config, &plan, &mut recorder, &transport).unwrap();
        assert!(
            matches!(summary.remote, RemoteStatus::Failed(ref message) if message.contains("500"))
        );
        assert_eq!(summary.commits, 8);
        assert!(summary.pushed);
        assert_eq!(recorder.invocations.len(), 2 + 8 + 2);
    }

    #[test]
    fn no_push_leaves_remote_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(".");
        config.workdir = dir.path().to_path_buf();
        config.push = false;
        config.remote = Some(RemoteConfig {
            token: "t0ken".to_string(),
            options: RemoteOptions::default(),
        });
        let plan = plan_with(&config, &mapper()).unwrap();
        let mut recorder = Recorder::default();
        let transport = Scripted::new(&[(204, ""), (201, "{}")]);

        let summary = execute(&config, &plan, &mut recorder, &transport).unwrap();
        assert_eq!(summary.remote, RemoteStatus::Skipped);
        assert!(!summary.pushed);
        assert!(transport.requests.borrow().is_empty());
        assert_eq!(recorder.invocations.len(), 2 + 8);
    }

    #[test]
    fn unparseable_repository_skips_remote_reset() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(".");
        config.workdir = dir.path().to_path_buf();
        config.repository = "file:///srv/git/demo".to_string();
        config.remote = Some(RemoteConfig {
            token: "t0ken".to_string(),
            options: RemoteOptions::default(),
        });
        let plan = plan_with(&config, &mapper()).unwrap();
        let transport = Scripted::default();

        let summary = execute(&config, &plan, &mut Recorder::default(), &transport).unwrap();
        assert!(matches!(summary.remote, RemoteStatus::Failed(_)));
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn commit_failure_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(".");
        config.workdir = dir.path().to_path_buf();
        let plan = plan_with(&config, &mapper()).unwrap();
        let mut recorder = Recorder {
            fail_at: Some(3),
            ..Default::default()
        };

        let err = execute(&config, &plan, &mut recorder, Scripted::default()).unwrap_err();
        assert!(matches!(err, Error::Commit(_)));
        assert_eq!(recorder.invocations.len(), 4);
    }

    #[test]
    fn debug_output_hides_token() {
        let remote = RemoteConfig {
            token: "secret-token".to_string(),
            options: RemoteOptions::default(),
        };
        assert!(!format!("{remote:?}").contains("secret-token"));
    }
}
