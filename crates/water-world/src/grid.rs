//! 2D grid of water cells.

use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use water_core::{validate_placement, Cell, Error, Result};

/// A bounded, row-major grid. Edges do not wrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridData")]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
}

/// Unchecked wire form; converted through `Grid::from_cells`
#[derive(Deserialize)]
struct GridData {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
}

impl TryFrom<GridData> for Grid {
    type Error = Error;

    fn try_from(data: GridData) -> Result<Self> {
        Grid::from_cells(data.rows, data.columns, data.cells)
    }
}

/// Aggregate counts over a grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridStats {
    pub sources: usize,
    pub obstacles: usize,
    /// Water cells with non-zero pressure
    pub wet_cells: usize,
    /// Sum of pressure over water cells (sources excluded)
    pub total_pressure: u64,
    pub max_pressure: u32,
}

impl Grid {
    /// An all-empty grid
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![Cell::EMPTY; rows * columns],
        }
    }

    /// Build a grid from row-major cells
    pub fn from_cells(rows: usize, columns: usize, cells: Vec<Cell>) -> Result<Self> {
        if rows.checked_mul(columns) != Some(cells.len()) {
            return Err(Error::Configuration(format!(
                "expected {} cells for a {}x{} grid, got {}",
                rows.saturating_mul(columns),
                rows,
                columns,
                cells.len()
            )));
        }
        Ok(Self {
            rows,
            columns,
            cells,
        })
    }

    /// Create a grid with sources and obstacles at distinct random cells.
    ///
    /// Fails when the requested cells would not leave at least one empty cell.
    pub fn seeded(
        rows: usize,
        columns: usize,
        num_sources: usize,
        num_obstacles: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Self> {
        validate_placement(rows, columns, num_sources, num_obstacles)?;

        let mut grid = Self::new(rows, columns);
        let picked = index::sample(rng, grid.cells.len(), num_sources + num_obstacles);
        for (n, i) in picked.into_iter().enumerate() {
            grid.cells[i] = if n < num_sources {
                Cell::Source
            } else {
                Cell::Obstacle
            };
        }

        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Get the cell at (row, column)
    pub fn get(&self, row: usize, column: usize) -> Result<Cell> {
        let index = self.checked_index(row, column)?;
        Ok(self.cells[index])
    }

    /// Overwrite the cell at (row, column)
    pub fn set(&mut self, row: usize, column: usize, cell: Cell) -> Result<()> {
        let index = self.checked_index(row, column)?;
        self.cells[index] = cell;
        Ok(())
    }

    /// Unchecked read for coordinates already known to be in bounds
    pub(crate) fn at(&self, row: usize, column: usize) -> Cell {
        self.cells[row * self.columns + column]
    }

    /// Add one unit of pressure to a water cell
    pub(crate) fn add_unit(&mut self, row: usize, column: usize) {
        let index = row * self.columns + column;
        if let Cell::Water(p) = &mut self.cells[index] {
            *p = p.saturating_add(1);
        }
    }

    /// Remove one unit of pressure from a water cell. Sources are never drained.
    pub(crate) fn remove_unit(&mut self, row: usize, column: usize) {
        let index = row * self.columns + column;
        if let Cell::Water(p) = &mut self.cells[index] {
            *p = p.saturating_sub(1);
        }
    }

    fn checked_index(&self, row: usize, column: usize) -> Result<usize> {
        if row >= self.rows || column >= self.columns {
            return Err(Error::OutOfBounds {
                row,
                column,
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(row * self.columns + column)
    }

    /// Row-major cells
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn stats(&self) -> GridStats {
        let mut stats = GridStats::default();
        for cell in &self.cells {
            match cell {
                Cell::Source => stats.sources += 1,
                Cell::Obstacle => stats.obstacles += 1,
                Cell::Water(0) => {}
                Cell::Water(p) => {
                    stats.wet_cells += 1;
                    stats.total_pressure += u64::from(*p);
                    stats.max_pressure = stats.max_pressure.max(*p);
                }
            }
        }
        stats
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.columns.max(1)) {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
