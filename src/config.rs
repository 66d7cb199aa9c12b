use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    CHASE_DURATIONS, COLLISION_RADIUS, EATEN_GHOST_SPEED, FRIGHTENED_DURATION_SECS,
    FRIGHTENED_GHOST_SPEED, FRUIT_LIFETIME_SECS, FRUIT_PICKUP_RADIUS, FRUIT_POINTS,
    FRUIT_SPAWN_THRESHOLD, GHOST_BASE_POINTS, GHOST_SPEED, PACMAN_SPEED, PELLET_POINTS,
    POWER_PELLET_POINTS, SCATTER_DURATIONS, STARTING_LIVES,
};
use crate::error::ConfigError;
use crate::grid::LevelGrid;
use crate::maze::{default_maze, parse_map_text, MazeMap};
use crate::types::{GhostName, GridCell, WorldPos};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FruitConfig {
    pub enabled: bool,
    pub spawn_threshold: usize,
    pub lifetime: f32,
    pub points: u32,
    pub pickup_radius: f32,
}

impl Default for FruitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spawn_threshold: FRUIT_SPAWN_THRESHOLD,
            lifetime: FRUIT_LIFETIME_SECS,
            points: FRUIT_POINTS,
            pickup_radius: FRUIT_PICKUP_RADIUS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GhostSetup {
    pub name: GhostName,
    pub spawn: GridCell,
    pub scatter_corner: GridCell,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LevelLayout {
    pub map_path: Option<PathBuf>,
    pub map_text: Option<String>,
    pub mirror_quadrant: bool,
    pub pacman_spawn: GridCell,
    pub ghosts: Vec<GhostSetup>,
    pub fruit_cell: Option<GridCell>,
}

impl Default for LevelLayout {
    fn default() -> Self {
        Self {
            map_path: None,
            map_text: None,
            mirror_quadrant: true,
            pacman_spawn: GridCell::new(13, 23),
            // Bottom-corner ghosts start above the gate: from inside the house
            // their greedy turns never climb back out.
            ghosts: vec![
                GhostSetup {
                    name: GhostName::Blinky,
                    spawn: GridCell::new(13, 14),
                    scatter_corner: GridCell::new(25, 0),
                },
                GhostSetup {
                    name: GhostName::Pinky,
                    spawn: GridCell::new(14, 14),
                    scatter_corner: GridCell::new(2, 0),
                },
                GhostSetup {
                    name: GhostName::Inky,
                    spawn: GridCell::new(12, 11),
                    scatter_corner: GridCell::new(27, 28),
                },
                GhostSetup {
                    name: GhostName::Clyde,
                    spawn: GridCell::new(15, 11),
                    scatter_corner: GridCell::new(0, 28),
                },
            ],
            // The stock centre (14,14) is inside the ghost house.
            fruit_cell: Some(GridCell::new(13, 17)),
        }
    }
}

impl LevelLayout {
    pub fn load_map(&self) -> Result<MazeMap, ConfigError> {
        let raw = match (&self.map_path, &self.map_text) {
            (Some(path), _) => Some(read_text(path)?),
            (None, Some(text)) => Some(text.clone()),
            (None, None) => None,
        };
        let Some(raw) = raw else {
            return Ok(default_maze());
        };
        let block = parse_map_text(&raw)?;
        if !self.mirror_quadrant {
            return Ok(block);
        }
        let rows: Vec<Vec<_>> = (0..block.height() as i32)
            .map(|y| (0..block.width() as i32).map(|x| block.tile(x, y)).collect())
            .collect();
        Ok(MazeMap::build_from_quadrant(&rows)?)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoundConfig {
    pub starting_lives: u32,
    pub pellet_points: u32,
    pub power_pellet_points: u32,
    pub ghost_base_points: u32,
    pub frightened_duration: f32,
    pub pacman_speed: f32,
    pub ghost_speed: f32,
    pub frightened_ghost_speed: f32,
    pub eaten_ghost_speed: f32,
    pub collision_radius: f32,
    pub scatter_durations: Vec<f32>,
    pub chase_durations: Vec<f32>,
    pub horizontal_wrap: bool,
    pub cell_size: f32,
    pub origin: WorldPos,
    pub fruit: FruitConfig,
    pub level: LevelLayout,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            starting_lives: STARTING_LIVES,
            pellet_points: PELLET_POINTS,
            power_pellet_points: POWER_PELLET_POINTS,
            ghost_base_points: GHOST_BASE_POINTS,
            frightened_duration: FRIGHTENED_DURATION_SECS,
            pacman_speed: PACMAN_SPEED,
            ghost_speed: GHOST_SPEED,
            frightened_ghost_speed: FRIGHTENED_GHOST_SPEED,
            eaten_ghost_speed: EATEN_GHOST_SPEED,
            collision_radius: COLLISION_RADIUS,
            scatter_durations: SCATTER_DURATIONS.to_vec(),
            chase_durations: CHASE_DURATIONS.to_vec(),
            horizontal_wrap: true,
            cell_size: 1.0,
            origin: WorldPos::default(),
            fruit: FruitConfig::default(),
            level: LevelLayout::default(),
        }
    }
}

impl RoundConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = read_text(path)?;
        Self::from_json_str(&raw)
    }

    pub fn build_grid(&self) -> Result<LevelGrid, ConfigError> {
        if !(self.cell_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "cellSize must be positive, got {}",
                self.cell_size
            )));
        }
        let map = self.level.load_map()?;
        let mut grid = LevelGrid::new(map, self.cell_size, self.origin);
        grid.set_horizontal_wrap(self.horizontal_wrap);

        if !grid.in_bounds(self.level.pacman_spawn) {
            return Err(ConfigError::Invalid(format!(
                "pacman spawn {:?} is outside the {}x{} map",
                self.level.pacman_spawn,
                grid.width(),
                grid.height()
            )));
        }
        if let Some(cell) = self.level.fruit_cell {
            if !grid.in_bounds(cell) {
                return Err(ConfigError::Invalid(format!(
                    "fruit cell {:?} is outside the {}x{} map",
                    cell,
                    grid.width(),
                    grid.height()
                )));
            }
        }
        for ghost in &self.level.ghosts {
            if !grid.in_bounds(ghost.spawn) {
                return Err(ConfigError::Invalid(format!(
                    "{:?} spawn {:?} is outside the {}x{} map",
                    ghost.name,
                    ghost.spawn,
                    grid.width(),
                    grid.height()
                )));
            }
        }
        Ok(grid)
    }
}

fn read_text(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    })
}
