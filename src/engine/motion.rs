use crate::grid::{ActorKind, LevelGrid};
use crate::types::{Direction, GridCell, WorldPos};

// An actor always walks from `current` toward `target`. Decisions are made
// only once the position reaches the target centre; movement happens every
// tick. `position` stays on the segment between the two cell centres.
#[derive(Clone, Debug)]
pub struct ActorMotion {
    pub current: GridCell,
    pub target: GridCell,
    pub dir: Direction,
    pub position: WorldPos,
    tolerance: f32,
}

impl ActorMotion {
    pub fn new(grid: &LevelGrid, cell: GridCell, dir: Direction, tolerance: f32) -> Self {
        Self {
            current: cell,
            target: cell,
            dir,
            position: grid.grid_to_world(cell),
            tolerance,
        }
    }

    pub fn place(&mut self, grid: &LevelGrid, cell: GridCell, dir: Direction) {
        self.current = cell;
        self.target = cell;
        self.dir = dir;
        self.position = grid.grid_to_world(cell);
    }

    pub fn reached_target(&self, grid: &LevelGrid) -> bool {
        self.position.distance(grid.grid_to_world(self.target)) <= self.tolerance
    }

    pub fn is_idle(&self) -> bool {
        self.current == self.target
    }

    fn arrive(&mut self, grid: &LevelGrid) {
        self.position = grid.grid_to_world(self.target);
        self.current = self.target;
    }

    pub fn head(&mut self, grid: &LevelGrid, kind: ActorKind, dir: Direction) {
        if dir == Direction::None {
            self.dir = Direction::None;
            self.target = self.current;
            return;
        }
        let raw = self.current.step(dir);
        let next = grid.neighbor(self.current, dir);
        if !grid.is_walkable(kind, next) {
            self.dir = Direction::None;
            self.target = self.current;
            return;
        }
        self.dir = dir;
        if next != raw {
            self.place(grid, next, dir);
            return;
        }
        self.target = next;
    }

    pub fn advance(&mut self, grid: &LevelGrid, speed: f32, dt: f32) {
        let goal = grid.grid_to_world(self.target);
        self.position = self.position.move_towards(goal, (speed * dt).max(0.0));
    }

    pub fn update<F>(
        &mut self,
        grid: &LevelGrid,
        kind: ActorKind,
        speed: f32,
        dt: f32,
        decide: F,
    ) -> bool
    where
        F: FnOnce(&ActorMotion) -> Direction,
    {
        let decided = self.reached_target(grid);
        if decided {
            self.arrive(grid);
            let dir = decide(self);
            self.head(grid, kind, dir);
        }
        self.advance(grid, speed, dt);
        decided
    }

    pub fn on_segment(&self, grid: &LevelGrid, eps: f32) -> bool {
        let a = grid.grid_to_world(self.current);
        let b = grid.grid_to_world(self.target);
        let total = a.distance(b);
        (a.distance(self.position) + self.position.distance(b) - total).abs() <= eps
    }
}
