use crate::grid::{wrap_add, Grid};
use crate::palette::Rgb;
use crate::rules::RuleSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    fn index(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    fn from_index(i: u8) -> Self {
        match i % 4 {
            0 => Direction::Up,
            1 => Direction::Right,
            2 => Direction::Down,
            _ => Direction::Left,
        }
    }

    /// Clockwise by `delta` quarter turns.
    pub(crate) fn turned(self, delta: u8) -> Self {
        Self::from_index(self.index() + delta % 4)
    }

    fn offset(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub(crate) fn arrow(self) -> char {
        match self {
            Direction::Up => '↑',
            Direction::Right => '→',
            Direction::Down => '↓',
            Direction::Left => '←',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Ant {
    pub(crate) x: usize,
    pub(crate) y: usize,
    pub(crate) dir: Direction,
}

/// One automaton step: turn on the current cell, update it, move forward.
///
/// Assumes a non-empty grid and a validated rule set.
pub(crate) fn step(grid: &mut Grid, ant: &mut Ant, rules: &RuleSet) {
    let s = grid.get(ant.x, ant.y);
    ant.dir = ant.dir.turned(rules.delta_for(s));

    let next = if rules.multi_color {
        (s + 1) % rules.color_count
    } else {
        1 - s.min(1)
    };
    grid.set(ant.x, ant.y, next);

    let (dx, dy) = ant.dir.offset();
    ant.x = wrap_add(ant.x, dx, grid.cols);
    ant.y = wrap_add(ant.y, dy, grid.rows);
}

/// Everything one running simulation owns.
#[derive(Clone, Debug)]
pub(crate) struct Simulation {
    pub(crate) grid: Grid,
    pub(crate) ant: Ant,
    pub(crate) rules: RuleSet,
    pub(crate) ant_color: Rgb,
    pub(crate) generation: u64,
}

impl Simulation {
    pub(crate) fn new(rows: usize, cols: usize, rules: RuleSet, ant_color: Rgb) -> Self {
        let mut sim = Self {
            grid: Grid::new(rows, cols),
            ant: Ant {
                x: 0,
                y: 0,
                dir: Direction::Up,
            },
            rules,
            ant_color,
            generation: 0,
        };
        sim.reset();
        sim
    }

    /// Blank grid, ant centered and facing up. Rules are kept.
    pub(crate) fn reset(&mut self) {
        self.grid = Grid::new(self.grid.rows, self.grid.cols);
        self.ant = Ant {
            x: self.grid.cols / 2,
            y: self.grid.rows / 2,
            dir: Direction::Up,
        };
        self.generation = 0;
    }

    pub(crate) fn reconfigure(&mut self, rules: RuleSet, ant_color: Rgb) {
        self.rules = rules;
        self.ant_color = ant_color;
        self.reset();
    }

    /// Keeps the overlapping cells and clamps the ant into the new bounds.
    pub(crate) fn resize(&mut self, rows: usize, cols: usize) {
        self.grid = self.grid.resized(rows, cols);
        self.ant.x = self.ant.x.min(cols.saturating_sub(1));
        self.ant.y = self.ant.y.min(rows.saturating_sub(1));
    }

    pub(crate) fn advance(&mut self, steps: u32) -> u32 {
        for _ in 0..steps {
            step(&mut self.grid, &mut self.ant, &self.rules);
        }
        self.generation += u64::from(steps);
        steps
    }
}
