use super::*;
use crate::types::FruitView;

#[derive(Clone, Debug)]
pub struct FruitSlot {
    cell: GridCell,
    time_left: f32,
    active: bool,
    spawned: bool,
}

impl FruitSlot {
    pub fn new(cell: GridCell) -> Self {
        Self {
            cell,
            time_left: 0.0,
            active: false,
            spawned: false,
        }
    }

    pub fn cell(&self) -> GridCell {
        self.cell
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn view(&self) -> Option<FruitView> {
        self.active.then(|| FruitView {
            x: self.cell.x,
            y: self.cell.y,
            time_left: self.time_left,
        })
    }
}

impl GameEngine {
    pub(super) fn update_fruit(&mut self, dt_secs: f32) {
        if !self.config.fruit.enabled {
            return;
        }

        if !self.fruit.active {
            let remaining = self.collectibles.remaining_count();
            if !self.fruit.spawned
                && remaining > 0
                && remaining <= self.config.fruit.spawn_threshold
            {
                self.fruit.active = true;
                self.fruit.spawned = true;
                self.fruit.time_left = self.config.fruit.lifetime;
                self.events.push(RuntimeEvent::FruitSpawned {
                    x: self.fruit.cell.x,
                    y: self.fruit.cell.y,
                });
            }
            return;
        }

        self.fruit.time_left -= dt_secs;
        if self.fruit.time_left <= TIMER_EPSILON {
            self.fruit.active = false;
            self.fruit.time_left = 0.0;
            self.events.push(RuntimeEvent::FruitExpired);
            return;
        }

        let centre = self.grid.grid_to_world(self.fruit.cell);
        if self.pacman.position().distance(centre) < self.config.fruit.pickup_radius {
            let points = self.config.fruit.points;
            self.fruit.active = false;
            self.score = self.score.saturating_add(points);
            self.stats.fruit_eaten += 1;
            self.events.push(RuntimeEvent::FruitEaten { points });
        }
    }
}
