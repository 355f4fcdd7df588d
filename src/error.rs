//! Typed errors for each stage of a run.
//!
//! Font and glyph errors are raised before anything touches the working
//! directory. Remote repository errors are reported by the pipeline and do
//! not stop local history generation. Commit errors abort the run.

use std::path::PathBuf;

use thiserror::Error;

/// The font resource could not be read or parsed.
#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("failed to read font '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neither PSF2 magic nor a BDF `STARTFONT` header was found.
    #[error("unrecognised font format (expected PSF2 or BDF)")]
    UnknownFormat,

    /// Input data ended prematurely.
    #[error("unexpected end of font data")]
    UnexpectedEnd,

    /// Missing magic number; probably not PSF data.
    #[error("bad PSF2 magic number")]
    BadMagic,

    #[error("malformed font at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("glyph bitmap holds {actual} bytes, expected {expected}")]
    BitmapSize { expected: usize, actual: usize },

    #[error("font contains no glyphs")]
    Empty,
}

/// The message contains a character the font cannot draw.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("font has no glyph for character {ch:?}")]
pub struct UnknownGlyphError {
    pub ch: char,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error(transparent)]
    UnknownGlyph(#[from] UnknownGlyphError),

    /// A glyph lights a pixel below the seventh heatmap row.
    #[error("glyph for {ch:?} is {rows} rows tall; the heatmap only has 7")]
    GlyphTooTall { ch: char, rows: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("year {0} is outside the supported calendar range")]
    InvalidYear(i32),

    #[error("date arithmetic overflowed the supported calendar range")]
    OutOfRange,

    #[error("hour {0} is not a valid time of day")]
    InvalidHour(u32),

    #[error("local time {0} does not exist in this time zone")]
    NonexistentTime(chrono::NaiveDateTime),
}

/// An external command could not be run or reported failure.
#[derive(Debug, Error)]
pub enum CommitExecutionError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}: {stderr}", exit_status(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{command}` did not finish within {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("failed to update '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// The remote URL is neither `https://host/owner/repo[.git]` nor
/// `git@host:owner/repo[.git]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid repository URL: {url}")]
pub struct InvalidRepositoryUrlError {
    pub url: String,
}

/// The hosting API rejected a request or could not be reached.
#[derive(Debug, Error)]
pub enum RemoteRepoError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("failed to {action} repository {repo} ({status}): {body}")]
    Status {
        action: &'static str,
        repo: String,
        status: u16,
        body: String,
    },

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Any failure of a run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Font(#[from] FontLoadError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Commit(#[from] CommitExecutionError),

    #[error(transparent)]
    InvalidRepositoryUrl(#[from] InvalidRepositoryUrlError),

    #[error(transparent)]
    Remote(#[from] RemoteRepoError),
}
