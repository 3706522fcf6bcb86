//! Notebook application layer.
//!
//! Wires the event store, the command bus and the read side together:
//! - [`Config`] from `NOTEBOOK_*` environment variables
//! - [`telemetry::init`] for the tracing subscriber and
//!   [`telemetry::install_metrics`] for the metrics recorder
//! - [`SyncBehavior`], which catches projections up after every command
//! - [`BackgroundCatchUp`], the periodic repair loop
//! - [`Notebook`], the assembled facade over two SQLite databases

pub mod background;
pub mod config;
pub mod error;
pub mod notebook;
pub mod sync;
pub mod telemetry;

pub use background::BackgroundCatchUp;
pub use config::Config;
pub use error::{NotebookError, Result};
pub use notebook::Notebook;
pub use sync::SyncBehavior;
