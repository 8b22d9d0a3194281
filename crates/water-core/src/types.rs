//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Contents of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Impassable; water never enters or leaves
    Obstacle,
    /// Infinite supply; flows like water but is never drained
    Source,
    /// Water at the given pressure. `Water(0)` is an empty cell.
    Water(u32),
}

impl Cell {
    pub const EMPTY: Cell = Cell::Water(0);

    pub fn is_empty(&self) -> bool {
        *self == Cell::EMPTY
    }

    pub fn is_source(&self) -> bool {
        matches!(self, Cell::Source)
    }

    pub fn is_obstacle(&self) -> bool {
        matches!(self, Cell::Obstacle)
    }

    /// Pressure of a water cell. `None` for sources and obstacles.
    pub fn pressure(&self) -> Option<u32> {
        match self {
            Cell::Water(p) => Some(*p),
            _ => None,
        }
    }

    /// Pressure used when this cell pushes water into a neighbour.
    ///
    /// Sources sit above every representable water pressure, so a water cell
    /// can never tie with one. Obstacles push nothing.
    pub fn head(&self) -> u64 {
        match self {
            Cell::Obstacle => 0,
            Cell::Source => u64::MAX,
            Cell::Water(p) => u64::from(*p),
        }
    }

    /// Whether this cell takes part in flow this tick
    pub fn is_flowing(&self) -> bool {
        self.head() > 0
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::EMPTY
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Obstacle => write!(f, "#"),
            Cell::Source => write!(f, "S"),
            Cell::Water(0) => write!(f, "."),
            Cell::Water(p) if *p < 10 => write!(f, "{}", p),
            Cell::Water(_) => write!(f, "*"),
        }
    }
}

/// Direction a unit of water moves in a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flow {
    Down,
    Left,
    Right,
    Up,
}

impl Flow {
    /// (row, column) delta of the flow target
    pub fn to_delta(&self) -> (isize, isize) {
        match self {
            Flow::Down => (1, 0),
            Flow::Left => (0, -1),
            Flow::Right => (0, 1),
            Flow::Up => (-1, 0),
        }
    }

    pub fn is_lateral(&self) -> bool {
        matches!(self, Flow::Left | Flow::Right)
    }
}

/// Kind of destructive point edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    Source,
    Obstacle,
    Erase,
}

impl EditKind {
    /// Cell value written by this edit
    pub fn cell(&self) -> Cell {
        match self {
            EditKind::Source => Cell::Source,
            EditKind::Obstacle => Cell::Obstacle,
            EditKind::Erase => Cell::EMPTY,
        }
    }
}

/// A point edit at a grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    pub kind: EditKind,
    pub row: usize,
    pub column: usize,
}

impl Edit {
    pub fn new(kind: EditKind, row: usize, column: usize) -> Self {
        Self { kind, row, column }
    }
}
