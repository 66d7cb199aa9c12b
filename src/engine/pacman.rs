use crate::collectibles::CollectibleRegistry;
use crate::constants::pacman_center_tolerance;
use crate::grid::{ActorKind, LevelGrid};
use crate::types::{Collectible, Direction, GridCell, PacmanView, WorldPos};

use super::motion::ActorMotion;

#[derive(Clone, Debug)]
pub struct PacmanController {
    motion: ActorMotion,
    buffered: Direction,
    spawn: GridCell,
    speed: f32,
}

impl PacmanController {
    pub fn new(grid: &LevelGrid, spawn: GridCell, speed: f32) -> Self {
        let tolerance = pacman_center_tolerance(grid.cell_size());
        Self {
            motion: ActorMotion::new(grid, spawn, Direction::Left, tolerance),
            buffered: Direction::None,
            spawn,
            speed,
        }
    }

    pub fn position(&self) -> WorldPos {
        self.motion.position
    }

    pub fn motion(&self) -> &ActorMotion {
        &self.motion
    }

    pub fn direction(&self) -> Direction {
        self.motion.dir
    }

    pub fn buffered(&self) -> Direction {
        self.buffered
    }

    pub fn buffer_input(&mut self, dir: Direction) {
        self.buffered = dir;
    }

    pub fn reset_to_spawn(&mut self, grid: &LevelGrid) {
        self.motion.place(grid, self.spawn, Direction::Left);
        self.buffered = Direction::None;
    }

    pub fn tick(
        &mut self,
        grid: &LevelGrid,
        collectibles: &mut CollectibleRegistry,
        dt: f32,
    ) -> Vec<(GridCell, Collectible)> {
        let mut consumed = Vec::new();
        let buffered = &mut self.buffered;
        let mut take = |cell: GridCell| {
            if let Some(item) = collectibles.try_consume(cell) {
                consumed.push((cell, item));
            }
        };

        self.motion
            .update(grid, ActorKind::Pacman, self.speed, dt, |motion| {
                take(motion.current);
                if *buffered != Direction::None
                    && grid.can_enter(ActorKind::Pacman, motion.current, *buffered)
                {
                    let turn = *buffered;
                    *buffered = Direction::None;
                    turn
                } else if grid.can_enter(ActorKind::Pacman, motion.current, motion.dir) {
                    motion.dir
                } else {
                    Direction::None
                }
            });

        // Tolerance and tunnel jumps can skip a centre, so sweep both ends.
        take(grid.world_to_grid(self.motion.position));
        take(self.motion.target);
        consumed
    }

    pub fn view(&self) -> PacmanView {
        PacmanView {
            cell: self.motion.current,
            target: self.motion.target,
            dir: self.motion.dir,
            buffered: self.buffered,
            x: self.motion.position.x,
            y: self.motion.position.y,
        }
    }
}
