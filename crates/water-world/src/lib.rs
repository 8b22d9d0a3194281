//! Water flow simulation engine.
//!
//! This module implements the 2D grid where water flows around obstacles and
//! out of infinite sources, advancing one generation per tick.

pub mod grid;
pub mod simulation;

pub use grid::{Grid, GridStats};
pub use simulation::{FlowRules, GridSimulator, StepStats};
