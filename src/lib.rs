//! Generation-level evaluation of track-driving agents.
//!
//! A [`GenerationRunner`] owns an immutable [`TrackMap`] and a [`SimConfig`];
//! each call to [`GenerationRunner::evaluate`] spawns one agent per
//! [`Controller`], advances all of them in lockstep, and returns the final
//! fitness of every agent for an external optimizer.

pub mod agent;
pub mod collision;
pub mod config;
pub mod controller;
pub mod error;
pub mod physics;
pub mod reporting;
pub mod sensory;
pub mod simulation;
pub mod stats;
pub mod track;
pub mod world;

pub use agent::{Action, Agent, SensorReading};
pub use config::SimConfig;
pub use controller::{Controller, FeedForwardController, ScriptedController};
pub use error::{GenerationError, SimError};
pub use simulation::{
    GenerationOutcome, GenerationRunner, RunState, StopSignal, Termination, TickObserver,
    TickSnapshot,
};
pub use track::TrackMap;
