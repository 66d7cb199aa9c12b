use crate::config::{GhostSetup, RoundConfig};
use crate::constants::{phase_duration, GHOST_CENTER_TOLERANCE, TIMER_EPSILON};
use crate::grid::{ActorKind, LevelGrid};
use crate::rng::Rng;
use crate::tiles::TileSymbol;
use crate::types::{Direction, GhostName, GhostState, GhostView, GridCell, WorldPos};

use super::motion::ActorMotion;

#[derive(Clone, Debug)]
pub struct GhostTuning {
    pub speed: f32,
    pub frightened_speed: f32,
    pub eaten_speed: f32,
    pub scatter_durations: Vec<f32>,
    pub chase_durations: Vec<f32>,
}

impl GhostTuning {
    pub fn from_config(config: &RoundConfig) -> Self {
        Self {
            speed: config.ghost_speed,
            frightened_speed: config.frightened_ghost_speed,
            eaten_speed: config.eaten_ghost_speed,
            scatter_durations: config.scatter_durations.clone(),
            chase_durations: config.chase_durations.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GhostController {
    name: GhostName,
    state: GhostState,
    motion: ActorMotion,
    spawn: GridCell,
    scatter_corner: GridCell,
    gate: Option<GridCell>,
    phase: usize,
    phase_timer: f32,
    tuning: GhostTuning,
    rng: Rng,
}

impl GhostController {
    // Each ghost owns a random stream derived from `seed` and its name, so
    // frightened turns never depend on roster order.
    pub fn new(grid: &LevelGrid, setup: &GhostSetup, tuning: GhostTuning, seed: u32) -> Self {
        let phase_timer = phase_duration(&tuning.scatter_durations, 0);
        Self {
            name: setup.name,
            state: GhostState::Scatter,
            motion: ActorMotion::new(grid, setup.spawn, Direction::Left, GHOST_CENTER_TOLERANCE),
            spawn: setup.spawn,
            scatter_corner: setup.scatter_corner,
            gate: grid.map().find_first(TileSymbol::GhostGate),
            phase: 0,
            phase_timer,
            tuning,
            rng: Rng::new(ghost_seed(seed, setup.name)),
        }
    }

    pub fn name(&self) -> GhostName {
        self.name
    }

    pub fn state(&self) -> GhostState {
        self.state
    }

    pub fn position(&self) -> WorldPos {
        self.motion.position
    }

    pub fn motion(&self) -> &ActorMotion {
        &self.motion
    }

    pub fn phase(&self) -> usize {
        self.phase
    }

    pub fn gate(&self) -> Option<GridCell> {
        self.gate
    }

    pub fn set_frightened(&mut self) {
        if self.state != GhostState::Eaten {
            self.state = GhostState::Frightened;
        }
    }

    pub fn set_chase(&mut self) {
        if self.state != GhostState::Eaten {
            self.state = GhostState::Chase;
        }
    }

    pub fn set_scatter(&mut self) {
        if self.state != GhostState::Eaten {
            self.state = GhostState::Scatter;
        }
    }

    pub fn set_eaten(&mut self) {
        self.state = GhostState::Eaten;
    }

    pub fn reset_to_spawn(&mut self, grid: &LevelGrid) {
        self.motion.place(grid, self.spawn, Direction::Left);
        self.state = GhostState::Scatter;
        self.phase = 0;
        self.phase_timer = phase_duration(&self.tuning.scatter_durations, 0);
    }

    pub fn speed(&self) -> f32 {
        match self.state {
            GhostState::Frightened => self.tuning.frightened_speed,
            GhostState::Eaten => self.tuning.eaten_speed,
            GhostState::Scatter | GhostState::Chase => self.tuning.speed,
        }
    }

    pub fn target_cell(&self, pacman_cell: GridCell) -> GridCell {
        match self.state {
            GhostState::Scatter => self.scatter_corner,
            GhostState::Chase => pacman_cell,
            GhostState::Eaten => self.gate.unwrap_or(self.scatter_corner),
            GhostState::Frightened => self.motion.current,
        }
    }

    fn tick_phase_timer(&mut self, dt: f32) {
        if matches!(self.state, GhostState::Frightened | GhostState::Eaten) {
            return;
        }
        self.phase_timer -= dt;
        if self.phase_timer > TIMER_EPSILON {
            return;
        }
        match self.state {
            GhostState::Scatter => {
                self.state = GhostState::Chase;
                self.phase_timer = phase_duration(&self.tuning.chase_durations, self.phase);
            }
            GhostState::Chase => {
                self.state = GhostState::Scatter;
                let last = self.tuning.scatter_durations.len().saturating_sub(1);
                self.phase = (self.phase + 1).min(last);
                self.phase_timer = phase_duration(&self.tuning.scatter_durations, self.phase);
            }
            GhostState::Frightened | GhostState::Eaten => {}
        }
    }

    // Greedy one-step turn choice at a cell centre. The reverse heading is
    // only taken out of a dead end; `None` means there is nowhere to go.
    pub fn choose_direction(
        &self,
        grid: &LevelGrid,
        from: GridCell,
        heading: Direction,
        pacman_cell: GridCell,
        rng: &mut Rng,
    ) -> Direction {
        let goal = (self.state != GhostState::Frightened).then(|| self.target_cell(pacman_cell));
        choose_turn(grid, from, heading, goal, rng)
    }

    pub fn tick(&mut self, grid: &LevelGrid, pacman_cell: GridCell, dt: f32) -> bool {
        self.tick_phase_timer(dt);

        let speed = self.speed();
        let goal = (self.state != GhostState::Frightened).then(|| self.target_cell(pacman_cell));
        let rng = &mut self.rng;
        self.motion.update(grid, ActorKind::Ghost, speed, dt, |motion| {
            choose_turn(grid, motion.current, motion.dir, goal, rng)
        });

        self.check_gate_arrival(grid)
    }

    fn check_gate_arrival(&mut self, grid: &LevelGrid) -> bool {
        if self.state != GhostState::Eaten {
            return false;
        }
        let Some(gate) = self.gate else {
            return false;
        };
        let arrived = self.motion.current == gate
            || (self.motion.target == gate && self.motion.reached_target(grid));
        if arrived {
            self.state = GhostState::Chase;
        }
        arrived
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            name: self.name,
            state: self.state,
            cell: self.motion.current,
            target: self.motion.target,
            dir: self.motion.dir,
            x: self.motion.position.x,
            y: self.motion.position.y,
        }
    }
}

fn ghost_seed(seed: u32, name: GhostName) -> u32 {
    let slot = match name {
        GhostName::Blinky => 1u32,
        GhostName::Pinky => 2,
        GhostName::Inky => 3,
        GhostName::Clyde => 4,
    };
    seed ^ slot.wrapping_mul(0x9e37_79b9)
}

// `goal = None` picks uniformly among the candidates.
fn choose_turn(
    grid: &LevelGrid,
    from: GridCell,
    heading: Direction,
    goal: Option<GridCell>,
    rng: &mut Rng,
) -> Direction {
    let reverse = heading.opposite();
    let candidates: Vec<Direction> = Direction::CARDINALS
        .into_iter()
        .filter(|dir| *dir != reverse)
        .filter(|dir| grid.can_enter(ActorKind::Ghost, from, *dir))
        .collect();

    if candidates.is_empty() {
        if grid.can_enter(ActorKind::Ghost, from, reverse) {
            return reverse;
        }
        return Direction::None;
    }

    let Some(goal) = goal else {
        return rng.choose(&candidates).copied().unwrap_or(Direction::None);
    };

    let mut best = candidates[0];
    let mut best_dist = i64::MAX;
    for dir in candidates {
        let dist = grid.neighbor(from, dir).squared_distance(goal);
        if dist < best_dist {
            best_dist = dist;
            best = dir;
        }
    }
    best
}
