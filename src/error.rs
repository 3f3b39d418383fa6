//! Error Module
//! One error type for the whole pipeline, tagged with the stage that raised it.

use polars::prelude::PolarsError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage, used to tell which component failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Settings resolution, before any input is read.
    Config,
    Load,
    Project,
    Clean,
    Aggregate,
    Render,
    Trend,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Load => "load",
            Stage::Project => "project",
            Stage::Clean => "clean",
            Stage::Aggregate => "aggregate",
            Stage::Render => "render",
            Stage::Trend => "trend",
            Stage::Report => "report",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("[{stage}] cannot read input {}: {reason}", path.display())]
    Input {
        stage: Stage,
        path: PathBuf,
        reason: String,
    },
    #[error("[{stage}] expected column `{column}` is missing")]
    Schema { stage: Stage, column: String },
    #[error("[{stage}] trend fit needs at least {required} distinct years, got {observed}")]
    InsufficientData {
        stage: Stage,
        observed: usize,
        required: usize,
    },
    #[error("[{stage}] polars error: {source}")]
    Polars {
        stage: Stage,
        #[source]
        source: PolarsError,
    },
    #[error("[{stage}] failed to render chart `{chart}`: {message}")]
    Render {
        stage: Stage,
        chart: String,
        message: String,
    },
    #[error("[{stage}] I/O error on {}: {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("[config] invalid configuration: {0}")]
    Config(String),
}

impl ReportError {
    /// Stage that raised the error.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ReportError::Input { stage, .. }
            | ReportError::Schema { stage, .. }
            | ReportError::InsufficientData { stage, .. }
            | ReportError::Polars { stage, .. }
            | ReportError::Render { stage, .. }
            | ReportError::Io { stage, .. } => Some(*stage),
            ReportError::Config(_) => Some(Stage::Config),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Attach a stage to a polars result.
pub trait InStage<T> {
    fn in_stage(self, stage: Stage) -> Result<T>;
}

impl<T> InStage<T> for std::result::Result<T, PolarsError> {
    fn in_stage(self, stage: Stage) -> Result<T> {
        self.map_err(|source| ReportError::Polars { stage, source })
    }
}
