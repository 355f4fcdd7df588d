//! Draw text on a contribution heatmap with backdated git commits.
//!
//! A message is laid out with a bitmap font ([`Font`], BDF or PSF2) into
//! (week, day) heatmap cells ([`raster`]), every cell is mapped to a date
//! relative to a reference Sunday ([`calendar`]), and a fresh git history
//! with a configurable number of commits per cell is written and pushed
//! ([`git`]). The remote repository can be deleted and recreated through
//! the hosting API first ([`remote`]).
//!
//! ```no_run
//! use greenwall::{Identity, ProcessExecutor, RunConfig, UreqTransport};
//!
//! let identity = Identity {
//!     name: "Octo Cat".into(),
//!     email: "octo@example.com".into(),
//! };
//! let config = RunConfig::new(identity, "HELLO", "git@github.com:octo/hello.git");
//! let plan = greenwall::plan(&config)?;
//! println!("{}", plan.preview);
//! greenwall::execute(
//!     &config,
//!     &plan,
//!     ProcessExecutor::new(config.command_timeout),
//!     UreqTransport::new(config.http_timeout),
//! )?;
//! # Ok::<(), greenwall::Error>(())
//! ```

mod bdf;
pub mod calendar;
mod error;
mod font;
pub mod git;
mod glyph;
pub mod http;
mod pipeline;
mod psf2;
pub mod raster;
pub mod remote;

pub use calendar::CalendarMapper;
pub use error::{
    CalendarError, CommitExecutionError, Error, FontLoadError, InvalidRepositoryUrlError,
    RemoteRepoError, RenderError, UnknownGlyphError,
};
pub use font::Font;
pub use git::{CommitMode, CommitSpec, Executor, Git, Identity, Invocation, ProcessExecutor};
pub use glyph::{ColumnIter, Glyph, RowIter};
pub use http::UreqTransport;
pub use pipeline::{execute, plan, plan_with, Plan, RemoteConfig, RemoteStatus, RunConfig, Summary};
pub use raster::{rasterize, GridCoordinate, Raster, Spacing};
pub use remote::{RemoteOptions, RepoManager, RepoRef, Transport};
