use std::collections::BTreeMap;

use crate::maze::MazeMap;
use crate::types::{Collectible, GridCell};

#[derive(Clone, Debug, Default)]
pub struct CollectibleRegistry {
    entries: BTreeMap<GridCell, Collectible>,
}

impl CollectibleRegistry {
    pub fn from_map(map: &MazeMap) -> Self {
        let entries = map
            .cells()
            .filter_map(|(cell, symbol)| symbol.collectible().map(|item| (cell, item)))
            .collect();
        Self { entries }
    }

    pub fn try_consume(&mut self, cell: GridCell) -> Option<Collectible> {
        self.entries.remove(&cell)
    }

    pub fn remaining_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, cell: GridCell) -> Option<Collectible> {
        self.entries.get(&cell).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridCell, Collectible)> + '_ {
        self.entries.iter().map(|(cell, item)| (*cell, *item))
    }
}
