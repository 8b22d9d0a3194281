//! Simulation engine for advancing the water grid.

use crate::grid::Grid;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use water_core::{Cell, Edit, EditKind, Flow, Result, SimulatorConfig};

/// Pressure thresholds that decide where a cell flows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowRules {
    pub highest_allowed_pressure: u32,
    pub pressure_to_flow_up: u32,
}

impl FlowRules {
    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self {
            highest_allowed_pressure: config.highest_allowed_pressure,
            pressure_to_flow_up: config.pressure_to_flow_up,
        }
    }

    /// Pick the single flow for the cell at (row, column), reading only `grid`.
    ///
    /// Priority: down, then lateral (coin flip when both sides qualify), then up.
    /// Consumes randomness only when both lateral sides qualify. The caller
    /// guarantees (row, column) lies inside `grid`.
    pub(crate) fn decide(
        &self,
        grid: &Grid,
        row: usize,
        column: usize,
        rng: &mut impl Rng,
    ) -> Option<Flow> {
        let cell = grid.at(row, column);
        if !cell.is_flowing() {
            return None;
        }

        if self.can_flow_down(grid, row, column) {
            return Some(Flow::Down);
        }

        let left = self.can_flow_sideways(grid, cell, row, column, Flow::Left);
        let right = self.can_flow_sideways(grid, cell, row, column, Flow::Right);
        let lateral = match (left, right) {
            (true, true) if rng.gen_bool(0.5) => Some(Flow::Left),
            (true, true) => Some(Flow::Right),
            (true, false) => Some(Flow::Left),
            (false, true) => Some(Flow::Right),
            (false, false) => None,
        };
        if lateral.is_some() {
            return lateral;
        }

        self.can_flow_up(grid, cell, row, column).then_some(Flow::Up)
    }

    fn can_flow_down(&self, grid: &Grid, row: usize, column: usize) -> bool {
        row + 1 < grid.rows() && self.below_ceiling(grid.at(row + 1, column))
    }

    fn can_flow_up(&self, grid: &Grid, cell: Cell, row: usize, column: usize) -> bool {
        row > 0
            && cell.head() >= u64::from(self.pressure_to_flow_up)
            && self.below_ceiling(grid.at(row - 1, column))
    }

    fn can_flow_sideways(
        &self,
        grid: &Grid,
        cell: Cell,
        row: usize,
        column: usize,
        flow: Flow,
    ) -> bool {
        let neighbour = match flow {
            Flow::Left if column > 0 => grid.at(row, column - 1),
            Flow::Right if column + 1 < grid.columns() => grid.at(row, column + 1),
            _ => return false,
        };
        matches!(neighbour, Cell::Water(p) if u64::from(p) < cell.head())
    }

    /// Vertical targets accept water until they reach the pressure ceiling
    fn below_ceiling(&self, target: Cell) -> bool {
        matches!(target, Cell::Water(p) if p < self.highest_allowed_pressure)
    }
}

/// Flow counts produced by a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStats {
    pub flows_down: usize,
    pub flows_lateral: usize,
    pub flows_up: usize,
    /// Units emitted by sources (the only net creation of water)
    pub injected: u64,
}

impl StepStats {
    pub fn total_flows(&self) -> usize {
        self.flows_down + self.flows_lateral + self.flows_up
    }

    fn record(&mut self, flow: Flow) {
        if flow.is_lateral() {
            self.flows_lateral += 1;
        } else if flow == Flow::Down {
            self.flows_down += 1;
        } else {
            self.flows_up += 1;
        }
    }
}

/// Owns the grid and advances it one generation per `step`.
///
/// Single writer: callers serialize access; the simulator does no locking.
pub struct GridSimulator {
    grid: Grid,
    config: SimulatorConfig,
    rules: FlowRules,
    rng: ChaCha8Rng,
    generation: u64,
}

impl GridSimulator {
    /// Create a simulator with a randomly seeded grid
    pub fn new(config: SimulatorConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let grid = Self::initialize(
            config.rows,
            config.columns,
            config.num_sources,
            config.num_obstacles,
            &mut rng,
        )?;

        info!(
            rows = config.rows,
            columns = config.columns,
            num_sources = config.num_sources,
            num_obstacles = config.num_obstacles,
            seed = ?config.seed,
            "Grid simulator initialized"
        );

        Ok(Self {
            rules: FlowRules::from_config(&config),
            grid,
            config,
            rng,
            generation: 0,
        })
    }

    /// Wrap an existing grid. The grid's dimensions replace the configured ones.
    pub fn from_grid(mut config: SimulatorConfig, grid: Grid) -> Result<Self> {
        config.rows = grid.rows();
        config.columns = grid.columns();
        config.validate_thresholds()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            rules: FlowRules::from_config(&config),
            grid,
            config,
            rng,
            generation: 0,
        })
    }

    /// Produce a grid with `num_sources` sources and `num_obstacles` obstacles
    /// at distinct random cells; every other cell is empty.
    pub fn initialize(
        rows: usize,
        columns: usize,
        num_sources: usize,
        num_obstacles: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Grid> {
        Grid::seeded(rows, columns, num_sources, num_obstacles, rng)
    }

    /// Advance one generation.
    ///
    /// Every decision reads the pre-tick grid; moves are written to a fresh
    /// copy that replaces the grid once the row-major scan finishes.
    pub fn step(&mut self) -> StepStats {
        let mut next = self.grid.clone();
        let mut stats = StepStats::default();

        for row in 0..self.grid.rows() {
            for column in 0..self.grid.columns() {
                let Some(flow) = self.rules.decide(&self.grid, row, column, &mut self.rng) else {
                    continue;
                };

                let (dr, dc) = flow.to_delta();
                let target_row = row.wrapping_add_signed(dr);
                let target_column = column.wrapping_add_signed(dc);
                next.add_unit(target_row, target_column);

                if self.grid.at(row, column).is_source() {
                    stats.injected += 1;
                } else {
                    next.remove_unit(row, column);
                }
                stats.record(flow);
            }
        }

        self.grid = next;
        self.generation += 1;

        trace!(
            generation = self.generation,
            flows_down = stats.flows_down,
            flows_lateral = stats.flows_lateral,
            flows_up = stats.flows_up,
            injected = stats.injected,
            "Tick complete"
        );

        stats
    }

    pub fn place_source(&mut self, row: usize, column: usize) -> Result<()> {
        self.apply(Edit::new(EditKind::Source, row, column))
    }

    pub fn place_obstacle(&mut self, row: usize, column: usize) -> Result<()> {
        self.apply(Edit::new(EditKind::Obstacle, row, column))
    }

    pub fn erase(&mut self, row: usize, column: usize) -> Result<()> {
        self.apply(Edit::new(EditKind::Erase, row, column))
    }

    /// Overwrite a single cell, whatever it currently holds
    pub fn apply(&mut self, edit: Edit) -> Result<()> {
        self.grid.set(edit.row, edit.column, edit.kind.cell())?;
        debug!(
            kind = ?edit.kind,
            row = edit.row,
            column = edit.column,
            generation = self.generation,
            "Cell edited"
        );
        Ok(())
    }

    /// Reset every cell to empty, keeping the dimensions
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn clear(&mut self) {
        self.grid = Grid::new(self.config.rows, self.config.columns);
        debug!("Grid cleared");
    }

    pub fn get(&self, row: usize, column: usize) -> Result<Cell> {
        self.grid.get(row, column)
    }

    /// Current grid snapshot. Replaced wholesale on the next `step`.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn columns(&self) -> usize {
        self.grid.columns()
    }

    /// Ticks completed since construction
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
