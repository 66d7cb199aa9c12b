use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    None,
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    pub const CARDINALS: [Direction; 4] = [
        Direction::Left,
        Direction::Up,
        Direction::Right,
        Direction::Down,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Self::Left),
            "up" => Some(Self::Up),
            "right" => Some(Self::Right),
            "down" => Some(Self::Down),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    // Grid delta; grid y grows downward so `Up` is `-1`.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::None => (0, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::None => Direction::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn squared_distance(self, other: GridCell) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

// Continuous position; world y grows upward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: WorldPos) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn move_towards(self, target: WorldPos, max_delta: f32) -> WorldPos {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist <= max_delta || dist == 0.0 {
            return target;
        }
        WorldPos {
            x: self.x + dx / dist * max_delta,
            y: self.y + dy / dist * max_delta,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostState {
    Scatter,
    Chase,
    Frightened,
    Eaten,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostName {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl GhostName {
    pub const ALL: [GhostName; 4] = [
        GhostName::Blinky,
        GhostName::Pinky,
        GhostName::Inky,
        GhostName::Clyde,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collectible {
    Pellet,
    PowerPellet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicMood {
    Normal,
    Frightened,
    DeadPresent,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletConsumed {
        x: i32,
        y: i32,
        power: bool,
    },
    FrightenedStarted,
    FrightenedEnded,
    GhostEaten {
        ghost: GhostName,
        points: u32,
        chain: u32,
    },
    GhostRecovered {
        ghost: GhostName,
    },
    LifeLost {
        #[serde(rename = "livesRemaining")]
        lives_remaining: u32,
    },
    GameOver {
        #[serde(rename = "finalScore")]
        final_score: u32,
    },
    RoundReset,
    FruitSpawned {
        x: i32,
        y: i32,
    },
    FruitEaten {
        points: u32,
    },
    FruitExpired,
    MusicChanged {
        mood: MusicMood,
    },
    LevelCleared,
}

#[derive(Clone, Debug, Serialize)]
pub struct PacmanView {
    pub cell: GridCell,
    pub target: GridCell,
    pub dir: Direction,
    pub buffered: Direction,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub name: GhostName,
    pub state: GhostState,
    pub cell: GridCell,
    pub target: GridCell,
    pub dir: Direction,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct FruitView {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "timeLeft")]
    pub time_left: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "elapsedSecs")]
    pub elapsed_secs: f32,
    pub score: u32,
    pub lives: u32,
    #[serde(rename = "remainingCollectibles")]
    pub remaining_collectibles: usize,
    #[serde(rename = "frightenedTimeLeft")]
    pub frightened_time_left: f32,
    pub mood: MusicMood,
    pub pacman: PacmanView,
    pub ghosts: Vec<GhostView>,
    pub fruit: Option<FruitView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RoundSummary {
    pub ticks: u64,
    #[serde(rename = "elapsedSecs")]
    pub elapsed_secs: f32,
    pub score: u32,
    #[serde(rename = "bestScore")]
    pub best_score: u32,
    pub lives: u32,
    #[serde(rename = "pelletsEaten")]
    pub pellets_eaten: u32,
    #[serde(rename = "powerPelletsEaten")]
    pub power_pellets_eaten: u32,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: u32,
    #[serde(rename = "livesLost")]
    pub lives_lost: u32,
    #[serde(rename = "gameOvers")]
    pub game_overs: u32,
    #[serde(rename = "fruitEaten")]
    pub fruit_eaten: u32,
    #[serde(rename = "remainingCollectibles")]
    pub remaining_collectibles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for dir in Direction::CARDINALS {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
        assert_eq!(Direction::None.opposite(), Direction::None);
    }

    #[test]
    fn up_moves_toward_row_zero() {
        let cell = GridCell::new(3, 3);
        assert_eq!(cell.step(Direction::Up), GridCell::new(3, 2));
        assert_eq!(cell.step(Direction::Down), GridCell::new(3, 4));
        assert_eq!(cell.step(Direction::None), cell);
    }

    #[test]
    fn move_towards_never_overshoots() {
        let start = WorldPos::new(0.0, 0.0);
        let target = WorldPos::new(1.0, 0.0);
        let mid = start.move_towards(target, 0.25);
        assert!((mid.x - 0.25).abs() < 1e-6);
        assert_eq!(start.move_towards(target, 5.0), target);
    }

    #[test]
    fn parse_move_accepts_known_words_only() {
        assert_eq!(Direction::parse_move("left"), Some(Direction::Left));
        assert_eq!(Direction::parse_move("none"), Some(Direction::None));
        assert_eq!(Direction::parse_move("sideways"), None);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let value = serde_json::to_value(RuntimeEvent::GhostEaten {
            ghost: GhostName::Inky,
            points: 400,
            chain: 2,
        })
        .expect("event serializes");
        assert_eq!(value["type"], "ghost_eaten");
        assert_eq!(value["ghost"], "inky");
        assert_eq!(value["points"], 400);
    }
}
