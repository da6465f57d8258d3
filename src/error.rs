use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while building or running a generation.
#[derive(Debug, Error)]
pub enum SimError {
    /// A sensor or collision probe landed outside the track raster.
    #[error("query ({x}, {y}) outside {width}x{height} track")]
    OutOfBoundsQuery {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    /// A controller produced an action index outside the four known actions.
    #[error("controller produced unknown action index {index}")]
    InvalidAction { index: usize },
    /// The track image could not be read or decoded.
    #[error("failed to load track {}", .path.display())]
    AssetLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SimError {
    pub fn kind(&self) -> &'static str {
        match self {
            SimError::OutOfBoundsQuery { .. } => "out_of_bounds_query",
            SimError::InvalidAction { .. } => "invalid_action",
            SimError::AssetLoad { .. } => "asset_load_failure",
            SimError::InvalidConfig(_) => "invalid_config",
        }
    }
}

/// A fatal error located at the tick (and agent, when known) where it occurred.
#[derive(Debug, Error)]
#[error("generation {generation} aborted at tick {tick}{}: {source}", agent_suffix(.agent))]
pub struct GenerationError {
    pub generation: u64,
    pub tick: u32,
    pub agent: Option<usize>,
    #[source]
    pub source: SimError,
}

fn agent_suffix(agent: &Option<usize>) -> String {
    match agent {
        Some(idx) => format!(" (agent {idx})"),
        None => String::new(),
    }
}
