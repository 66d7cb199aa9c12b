use serde::{Deserialize, Serialize};

use crate::maze::MazeMap;
use crate::types::{Direction, GridCell, WorldPos};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Pacman,
    Ghost,
}

#[derive(Clone, Debug)]
pub struct LevelGrid {
    map: MazeMap,
    cell_size: f32,
    origin: WorldPos,
    passable_pacman: Vec<bool>,
    passable_ghost: Vec<bool>,
    horizontal_wrap: bool,
}

impl LevelGrid {
    pub fn new(map: MazeMap, cell_size: f32, origin: WorldPos) -> Self {
        let mut passable_pacman = Vec::with_capacity(map.width() * map.height());
        let mut passable_ghost = Vec::with_capacity(map.width() * map.height());
        for (_, symbol) in map.cells() {
            passable_pacman.push(!symbol.blocks_pacman());
            passable_ghost.push(!symbol.blocks_ghosts());
        }
        Self {
            map,
            cell_size,
            origin,
            passable_pacman,
            passable_ghost,
            horizontal_wrap: true,
        }
    }

    pub fn map(&self) -> &MazeMap {
        &self.map
    }

    pub fn width(&self) -> i32 {
        self.map.width() as i32
    }

    pub fn height(&self) -> i32 {
        self.map.height() as i32
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn horizontal_wrap(&self) -> bool {
        self.horizontal_wrap
    }

    pub fn set_horizontal_wrap(&mut self, enabled: bool) {
        self.horizontal_wrap = enabled;
    }

    pub fn in_bounds(&self, cell: GridCell) -> bool {
        self.map.in_bounds(cell.x, cell.y)
    }

    pub fn grid_to_world(&self, cell: GridCell) -> WorldPos {
        let half = self.cell_size * 0.5;
        WorldPos {
            x: self.origin.x + cell.x as f32 * self.cell_size + half,
            y: self.origin.y - cell.y as f32 * self.cell_size - half,
        }
    }

    pub fn world_to_grid(&self, pos: WorldPos) -> GridCell {
        let local_x = pos.x - self.origin.x;
        let local_y = pos.y - self.origin.y;
        GridCell {
            x: (local_x / self.cell_size).floor() as i32,
            y: (-local_y / self.cell_size).floor() as i32,
        }
    }

    pub fn is_walkable(&self, kind: ActorKind, cell: GridCell) -> bool {
        if !self.in_bounds(cell) {
            return false;
        }
        let idx = cell.y as usize * self.map.width() + cell.x as usize;
        match kind {
            ActorKind::Pacman => self.passable_pacman[idx],
            ActorKind::Ghost => self.passable_ghost[idx],
        }
    }

    pub fn wrap_horizontal(&self, cell: GridCell) -> GridCell {
        let mut wrapped = cell;
        if wrapped.x < 0 {
            wrapped.x = self.width() - 1;
        } else if wrapped.x >= self.width() {
            wrapped.x = 0;
        }
        wrapped
    }

    pub fn neighbor(&self, cell: GridCell, dir: Direction) -> GridCell {
        let next = cell.step(dir);
        if self.horizontal_wrap {
            self.wrap_horizontal(next)
        } else {
            next
        }
    }

    pub fn can_enter(&self, kind: ActorKind, cell: GridCell, dir: Direction) -> bool {
        if dir == Direction::None {
            return false;
        }
        self.is_walkable(kind, self.neighbor(cell, dir))
    }
}
