//! Drives the `git` binary to paint the heatmap.
//!
//! Identity and dates travel in each [`Invocation`]'s own environment; the
//! process environment is never modified.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::error::CommitExecutionError;
use crate::raster::GridCoordinate;

/// File appended to before every commit in [`CommitMode::Mutate`].
pub const PATTERN_FILE: &str = "greenwall.txt";

const GIT: &str = "git";

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Author and committer identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitMode {
    /// `git commit --allow-empty`.
    #[default]
    Empty,
    /// Append a line to [`PATTERN_FILE`], stage it, then commit.
    Mutate,
}

/// One heatmap cell and the commits that light it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSpec {
    pub coordinate: GridCoordinate,
    /// RFC 3339 author and committer date.
    pub date: String,
    pub repeat: u32,
}

/// A single external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Added on top of the inherited environment for this call only.
    pub env: Vec<(String, String)>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Runs external commands. Every call either succeeds or reports why not.
pub trait Executor {
    fn execute(&mut self, invocation: &Invocation) -> Result<(), CommitExecutionError>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn execute(&mut self, invocation: &Invocation) -> Result<(), CommitExecutionError> {
        (**self).execute(invocation)
    }
}

/// Spawns real processes and waits for them with a timeout.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Duration,
}

impl ProcessExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl Executor for ProcessExecutor {
    fn execute(&mut self, invocation: &Invocation) -> Result<(), CommitExecutionError> {
        let command = invocation.to_string();
        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CommitExecutionError::Spawn {
                command: command.clone(),
                source,
            })?;

        let (status, stderr) = wait_with_timeout(child, self.timeout).map_err(|e| match e {
            WaitError::Timeout => CommitExecutionError::Timeout {
                command: command.clone(),
                timeout_secs: self.timeout.as_secs(),
            },
            WaitError::Io(source) => CommitExecutionError::Spawn {
                command: command.clone(),
                source,
            },
        })?;

        if !status.success() {
            return Err(CommitExecutionError::Failed {
                command,
                code: status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}

enum WaitError {
    Timeout,
    Io(std::io::Error),
}

fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
) -> Result<(ExitStatus, String), WaitError> {
    // read while the child runs; a full pipe would block it
    let stderr = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf).ok();
            String::from_utf8_lossy(&buf).into_owned()
        })
    });

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let stderr = stderr
                    .map(|reader| reader.join().unwrap_or_default())
                    .unwrap_or_default();
                return Ok((status, stderr));
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(WaitError::Timeout);
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => return Err(WaitError::Io(e)),
        }
    }
}

/// A working directory whose history is rewritten through `git`.
pub struct Git<E> {
    executor: E,
    workdir: PathBuf,
    identity: Identity,
    branch: String,
    mode: CommitMode,
}

impl<E: Executor> Git<E> {
    pub fn new(executor: E, workdir: impl Into<PathBuf>, identity: Identity) -> Self {
        Self {
            executor,
            workdir: workdir.into(),
            identity,
            branch: "main".to_string(),
            mode: CommitMode::Empty,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_mode(mut self, mode: CommitMode) -> Self {
        self.mode = mode;
        self
    }

    fn invocation(&self, args: &[&str], date: Option<&str>) -> Invocation {
        let mut env = vec![
            ("GIT_AUTHOR_NAME".to_string(), self.identity.name.clone()),
            ("GIT_AUTHOR_EMAIL".to_string(), self.identity.email.clone()),
            ("GIT_COMMITTER_NAME".to_string(), self.identity.name.clone()),
            ("GIT_COMMITTER_EMAIL".to_string(), self.identity.email.clone()),
        ];
        if let Some(date) = date {
            env.push(("GIT_AUTHOR_DATE".to_string(), date.to_string()));
            env.push(("GIT_COMMITTER_DATE".to_string(), date.to_string()));
        }
        Invocation {
            program: GIT.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            env,
            cwd: self.workdir.clone(),
        }
    }

    fn run(&mut self, args: &[&str], date: Option<&str>) -> Result<(), CommitExecutionError> {
        let invocation = self.invocation(args, date);
        match invocation.env_var("GIT_AUTHOR_DATE") {
            Some(date) => debug!("running {invocation} dated {date}"),
            None => debug!("running {invocation}"),
        }
        self.executor.execute(&invocation)
    }

    /// Destroys any existing local history and starts a fresh repository.
    pub fn reinit(&mut self) -> Result<(), CommitExecutionError> {
        let dot_git = self.workdir.join(".git");
        match fs::remove_dir_all(&dot_git) {
            Ok(()) => info!("removed existing history in {}", dot_git.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(CommitExecutionError::Io { path: dot_git, source }),
        }
        self.run(&["init"], None)?;
        let branch = self.branch.clone();
        self.run(&["checkout", "-b", &branch], None)
    }

    /// Creates one commit dated `date`.
    pub fn commit_at(&mut self, date: &str, message: &str) -> Result<(), CommitExecutionError> {
        match self.mode {
            CommitMode::Empty => self.run(&["commit", "--allow-empty", "-m", message], Some(date)),
            CommitMode::Mutate => {
                let path = self.workdir.join(PATTERN_FILE);
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .and_then(|mut file| writeln!(file, "{date} {message}"))
                    .map_err(|source| CommitExecutionError::Io { path, source })?;
                self.run(&["add", PATTERN_FILE], None)?;
                self.run(&["commit", "-m", message], Some(date))
            }
        }
    }

    /// Issues `repeat` commits per `CommitSpec`, in the given order. Returns the
    /// number of commits created.
    pub fn paint<'s>(
        &mut self,
        specs: impl IntoIterator<Item = &'s CommitSpec>,
    ) -> Result<usize, CommitExecutionError> {
        let mut commits = 0;
        for spec in specs {
            debug!("painting {} at {} x{}", spec.coordinate, spec.date, spec.repeat);
            for i in 0..spec.repeat {
                let message = format!("Commit[{i}] at {}", spec.coordinate);
                self.commit_at(&spec.date, &message)?;
                commits += 1;
            }
        }
        Ok(commits)
    }

    pub fn add_remote(&mut self, url: &str) -> Result<(), CommitExecutionError> {
        self.run(&["remote", "add", "origin", url], None)
    }

    /// Force-pushes the branch to `origin`.
    pub fn push(&mut self) -> Result<(), CommitExecutionError> {
        let branch = self.branch.clone();
        self.run(&["push", "-f", "origin", &branch], None)
    }
}
