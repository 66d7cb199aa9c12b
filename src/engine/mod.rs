use crate::collectibles::CollectibleRegistry;
use crate::config::RoundConfig;
use crate::constants::{ghost_chain_points, TIMER_EPSILON};
use crate::error::ConfigError;
use crate::grid::LevelGrid;
use crate::types::{
    Collectible, Direction, GhostState, GridCell, MusicMood, RoundSummary, RuntimeEvent, Snapshot,
};

mod fruit_system;
pub mod ghost;
pub mod motion;
mod music_system;
pub mod pacman;

pub use self::fruit_system::FruitSlot;
pub use self::ghost::{GhostController, GhostTuning};
pub use self::motion::ActorMotion;
pub use self::pacman::PacmanController;

pub type RoundCoordinator = GameEngine;

#[derive(Clone, Debug, Default)]
struct RoundStats {
    pellets_eaten: u32,
    power_pellets_eaten: u32,
    ghosts_eaten: u32,
    lives_lost: u32,
    game_overs: u32,
    fruit_eaten: u32,
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: RoundConfig,

    grid: LevelGrid,
    collectibles: CollectibleRegistry,
    pacman: PacmanController,
    ghosts: Vec<GhostController>,
    events: Vec<RuntimeEvent>,
    fruit: FruitSlot,
    mood: Option<MusicMood>,

    score: u32,
    best_score: u32,
    lives: u32,
    frightened_timer: f32,
    eaten_chain: u32,
    level_cleared: bool,
    tick_counter: u64,
    elapsed_secs: f64,
    stats: RoundStats,
}

impl GameEngine {
    pub fn new(config: RoundConfig, seed: u32) -> Result<Self, ConfigError> {
        let grid = config.build_grid()?;
        Ok(Self::with_grid(config, grid, seed))
    }

    pub fn with_grid(config: RoundConfig, grid: LevelGrid, seed: u32) -> Self {
        let collectibles = CollectibleRegistry::from_map(grid.map());
        let pacman = PacmanController::new(&grid, config.level.pacman_spawn, config.pacman_speed);
        let tuning = GhostTuning::from_config(&config);
        let ghosts = config
            .level
            .ghosts
            .iter()
            .map(|setup| GhostController::new(&grid, setup, tuning.clone(), seed))
            .collect();
        let fruit_cell = config
            .level
            .fruit_cell
            .unwrap_or_else(|| GridCell::new(grid.width() / 2, grid.height() / 2));

        Self {
            lives: config.starting_lives,
            config,
            grid,
            collectibles,
            pacman,
            ghosts,
            events: Vec::new(),
            fruit: FruitSlot::new(fruit_cell),
            mood: None,
            score: 0,
            best_score: 0,
            frightened_timer: 0.0,
            eaten_chain: 0,
            level_cleared: false,
            tick_counter: 0,
            elapsed_secs: 0.0,
            stats: RoundStats::default(),
        }
    }

    pub fn grid(&self) -> &LevelGrid {
        &self.grid
    }

    pub fn pacman(&self) -> &PacmanController {
        &self.pacman
    }

    pub fn ghosts(&self) -> &[GhostController] {
        &self.ghosts
    }

    pub fn collectibles(&self) -> &CollectibleRegistry {
        &self.collectibles
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best_score(&self) -> u32 {
        self.best_score.max(self.score)
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.collectibles.remaining_count()
    }

    pub fn frightened_time_left(&self) -> f32 {
        self.frightened_timer
    }

    pub fn eaten_chain(&self) -> u32 {
        self.eaten_chain
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn is_level_cleared(&self) -> bool {
        self.level_cleared
    }

    pub fn receive_input(&mut self, dir: Direction) {
        self.pacman.buffer_input(dir);
    }

    pub fn step(&mut self, dt_secs: f32) {
        self.tick_counter += 1;
        self.elapsed_secs += dt_secs as f64;

        // Ghosts chase where Pac-Man stood when the tick began.
        let pacman_cell = self.grid.world_to_grid(self.pacman.position());

        self.update_frightened_timer(dt_secs);
        // Ghosts move on start-of-tick state; a power pellet eaten below
        // frightens them from the next tick on.
        self.update_ghosts(pacman_cell, dt_secs);
        self.update_pacman(dt_secs);
        self.resolve_collisions();
        self.update_fruit(dt_secs);
        self.check_level_cleared();
        self.update_music();
    }

    pub fn on_pellet_consumed(&mut self, power: bool) {
        if power {
            self.score = self.score.saturating_add(self.config.power_pellet_points);
            self.stats.power_pellets_eaten += 1;
            self.start_frightened_mode();
        } else {
            self.score = self.score.saturating_add(self.config.pellet_points);
            self.stats.pellets_eaten += 1;
        }
    }

    pub fn on_pacman_collides_with_ghost(&mut self, ghost_idx: usize) -> bool {
        let Some(ghost) = self.ghosts.get_mut(ghost_idx) else {
            return false;
        };
        match ghost.state() {
            GhostState::Frightened => {
                self.eaten_chain += 1;
                let points = ghost_chain_points(self.config.ghost_base_points, self.eaten_chain);
                ghost.set_eaten();
                let name = ghost.name();
                self.score = self.score.saturating_add(points);
                self.stats.ghosts_eaten += 1;
                self.events.push(RuntimeEvent::GhostEaten {
                    ghost: name,
                    points,
                    chain: self.eaten_chain,
                });
                false
            }
            GhostState::Eaten => false,
            GhostState::Scatter | GhostState::Chase => {
                self.lose_life();
                true
            }
        }
    }

    pub fn reset_round(&mut self) {
        self.frightened_timer = 0.0;
        self.eaten_chain = 0;
        for ghost in &mut self.ghosts {
            ghost.reset_to_spawn(&self.grid);
        }
        self.pacman.reset_to_spawn(&self.grid);
        self.events.push(RuntimeEvent::RoundReset);
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            elapsed_secs: self.elapsed_secs as f32,
            score: self.score,
            lives: self.lives,
            remaining_collectibles: self.collectibles.remaining_count(),
            frightened_time_left: self.frightened_timer,
            mood: self.mood(),
            pacman: self.pacman.view(),
            ghosts: self.ghosts.iter().map(|ghost| ghost.view()).collect(),
            fruit: self.fruit.view(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> RoundSummary {
        RoundSummary {
            ticks: self.tick_counter,
            elapsed_secs: self.elapsed_secs as f32,
            score: self.score,
            best_score: self.best_score(),
            lives: self.lives,
            pellets_eaten: self.stats.pellets_eaten,
            power_pellets_eaten: self.stats.power_pellets_eaten,
            ghosts_eaten: self.stats.ghosts_eaten,
            lives_lost: self.stats.lives_lost,
            game_overs: self.stats.game_overs,
            fruit_eaten: self.stats.fruit_eaten,
            remaining_collectibles: self.collectibles.remaining_count(),
        }
    }

    fn update_pacman(&mut self, dt_secs: f32) {
        let consumed = self.pacman.tick(&self.grid, &mut self.collectibles, dt_secs);
        for (cell, item) in consumed {
            let power = item == Collectible::PowerPellet;
            self.events.push(RuntimeEvent::PelletConsumed {
                x: cell.x,
                y: cell.y,
                power,
            });
            self.on_pellet_consumed(power);
        }
    }

    fn update_ghosts(&mut self, pacman_cell: GridCell, dt_secs: f32) {
        for idx in 0..self.ghosts.len() {
            let recovered = self.ghosts[idx].tick(&self.grid, pacman_cell, dt_secs);
            if recovered {
                self.events.push(RuntimeEvent::GhostRecovered {
                    ghost: self.ghosts[idx].name(),
                });
            }
        }
    }

    fn resolve_collisions(&mut self) {
        let radius = self.config.collision_radius;
        for idx in 0..self.ghosts.len() {
            let dist = self.pacman.position().distance(self.ghosts[idx].position());
            if dist < radius && self.on_pacman_collides_with_ghost(idx) {
                // Everyone was moved back to spawn; later ghosts are stale.
                break;
            }
        }
    }

    fn update_frightened_timer(&mut self, dt_secs: f32) {
        if self.frightened_timer <= 0.0 {
            return;
        }
        self.frightened_timer -= dt_secs;
        if self.frightened_timer <= TIMER_EPSILON {
            self.frightened_timer = 0.0;
            self.end_frightened_mode();
        }
    }

    fn start_frightened_mode(&mut self) {
        self.frightened_timer = self.config.frightened_duration;
        self.eaten_chain = 0;
        for ghost in &mut self.ghosts {
            ghost.set_frightened();
        }
        self.events.push(RuntimeEvent::FrightenedStarted);
    }

    fn end_frightened_mode(&mut self) {
        for ghost in &mut self.ghosts {
            if ghost.state() == GhostState::Frightened {
                ghost.set_chase();
            }
        }
        self.events.push(RuntimeEvent::FrightenedEnded);
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.stats.lives_lost += 1;
        self.events.push(RuntimeEvent::LifeLost {
            lives_remaining: self.lives,
        });
        if self.lives == 0 {
            self.game_over();
        } else {
            self.reset_round();
        }
    }

    fn game_over(&mut self) {
        self.events.push(RuntimeEvent::GameOver {
            final_score: self.score,
        });
        self.best_score = self.best_score.max(self.score);
        self.stats.game_overs += 1;
        self.score = 0;
        self.lives = self.config.starting_lives;
        self.reset_round();
    }

    fn check_level_cleared(&mut self) {
        if !self.level_cleared && self.collectibles.is_empty() {
            self.level_cleared = true;
            self.events.push(RuntimeEvent::LevelCleared);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GhostSetup;
    use crate::constants::TICK_SECONDS;
    use crate::maze::MazeMap;
    use crate::tiles::TileSymbol;
    use crate::types::{GhostName, WorldPos};

    fn grid_from(rows: &[&str]) -> LevelGrid {
        let rows: Vec<Vec<TileSymbol>> = rows
            .iter()
            .map(|row| {
                row.chars()
                    .map(|c| TileSymbol::from_letter(c).expect("known letter"))
                    .collect()
            })
            .collect();
        LevelGrid::new(MazeMap::from_rows(&rows).expect("valid"), 1.0, WorldPos::default())
    }

    fn engine_from(rows: &[&str], pacman: GridCell, ghosts: &[GridCell]) -> GameEngine {
        let grid = grid_from(rows);
        let mut config = RoundConfig::default();
        config.level.pacman_spawn = pacman;
        config.level.fruit_cell = None;
        config.level.ghosts = ghosts
            .iter()
            .zip(GhostName::ALL)
            .map(|(cell, name)| GhostSetup {
                name,
                spawn: *cell,
                scatter_corner: *cell,
            })
            .collect();
        GameEngine::with_grid(config, grid, 7)
    }

    fn sealed_engine() -> GameEngine {
        engine_from(
            &["ooooooooo", "oeoeoeoeo", "ooooooooo"],
            GridCell::new(1, 1),
            &[GridCell::new(3, 1), GridCell::new(5, 1), GridCell::new(7, 1)],
        )
    }

    fn run(engine: &mut GameEngine, ticks: usize) {
        for _ in 0..ticks {
            engine.step(TICK_SECONDS);
        }
    }

    #[test]
    fn default_level_builds() {
        let engine = GameEngine::new(RoundConfig::default(), 1).expect("default level");
        assert_eq!(engine.grid().width(), 28);
        assert_eq!(engine.grid().height(), 29);
        assert_eq!(engine.ghosts().len(), 4);
        assert_eq!(engine.lives(), 3);
        assert!(engine.remaining_collectibles() > 200);
    }

    #[test]
    fn pellet_points_differ_by_kind() {
        let mut engine = sealed_engine();
        engine.on_pellet_consumed(false);
        assert_eq!(engine.score(), 10);
        engine.on_pellet_consumed(true);
        assert_eq!(engine.score(), 60);
        assert!(engine
            .ghosts()
            .iter()
            .all(|ghost| ghost.state() == GhostState::Frightened));
        assert_eq!(engine.frightened_time_left(), 6.0);
    }

    #[test]
    fn ghost_chain_scores_double() {
        let mut engine = sealed_engine();
        engine.on_pellet_consumed(true);
        engine.events.clear();
        let before = engine.score();

        for idx in 0..3 {
            assert!(!engine.on_pacman_collides_with_ghost(idx));
        }
        let points: Vec<u32> = engine
            .events
            .iter()
            .filter_map(|event| match event {
                RuntimeEvent::GhostEaten { points, .. } => Some(*points),
                _ => None,
            })
            .collect();
        assert_eq!(points, vec![200, 400, 800]);
        assert_eq!(engine.score(), before + 1400);
        assert!(engine
            .ghosts()
            .iter()
            .all(|ghost| ghost.state() == GhostState::Eaten));
    }

    #[test]
    fn new_power_pellet_restarts_the_chain() {
        let mut engine = sealed_engine();
        engine.on_pellet_consumed(true);
        engine.on_pacman_collides_with_ghost(0);
        engine.on_pacman_collides_with_ghost(1);
        assert_eq!(engine.eaten_chain(), 2);

        engine.on_pellet_consumed(true);
        assert_eq!(engine.eaten_chain(), 0);
        // Eaten ghosts stay Eaten; only the third is frightened again.
        assert_eq!(engine.ghosts()[0].state(), GhostState::Eaten);
        assert_eq!(engine.ghosts()[2].state(), GhostState::Frightened);
        engine.events.clear();
        engine.on_pacman_collides_with_ghost(2);
        assert!(matches!(
            engine.events.as_slice(),
            [RuntimeEvent::GhostEaten { points: 200, chain: 1, .. }]
        ));
    }

    #[test]
    fn frightened_ends_after_exactly_six_seconds() {
        let mut engine = sealed_engine();
        engine.on_pellet_consumed(true);

        run(&mut engine, 359);
        assert!(engine
            .ghosts()
            .iter()
            .all(|ghost| ghost.state() == GhostState::Frightened));

        run(&mut engine, 1);
        assert!(engine
            .ghosts()
            .iter()
            .all(|ghost| ghost.state() == GhostState::Chase));
        assert_eq!(engine.frightened_time_left(), 0.0);
    }

    #[test]
    fn colliding_with_an_eaten_ghost_is_harmless() {
        let mut engine = sealed_engine();
        engine.on_pellet_consumed(true);
        engine.on_pacman_collides_with_ghost(0);
        let score = engine.score();
        assert!(!engine.on_pacman_collides_with_ghost(0));
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.score(), score);
    }

    #[test]
    fn normal_ghost_costs_a_life_and_resets_round() {
        let mut engine = engine_from(
            &["oooooo", "oeeeeo", "oooooo"],
            GridCell::new(1, 1),
            &[GridCell::new(4, 1)],
        );
        engine.on_pellet_consumed(false);
        let mut lost = false;
        for _ in 0..120 {
            engine.step(TICK_SECONDS);
            if engine
                .events
                .iter()
                .any(|event| matches!(event, RuntimeEvent::LifeLost { lives_remaining: 2 }))
            {
                lost = true;
                break;
            }
        }
        assert!(lost);
        assert_eq!(engine.lives(), 2);
        assert_eq!(engine.score(), 10);
        assert!(engine.events.contains(&RuntimeEvent::RoundReset));
        assert_eq!(
            engine.pacman().position(),
            engine.grid().grid_to_world(GridCell::new(1, 1))
        );
        assert_eq!(
            engine.ghosts()[0].position(),
            engine.grid().grid_to_world(GridCell::new(4, 1))
        );
        assert_eq!(engine.ghosts()[0].state(), GhostState::Scatter);
    }

    #[test]
    fn last_life_triggers_game_over_and_restart() {
        let mut engine = sealed_engine();
        engine.on_pellet_consumed(false);
        engine.on_pellet_consumed(false);
        for _ in 0..3 {
            assert!(engine.on_pacman_collides_with_ghost(0));
        }
        assert!(engine
            .events
            .contains(&RuntimeEvent::GameOver { final_score: 20 }));
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.best_score(), 20);
        let summary = engine.build_summary();
        assert_eq!(summary.game_overs, 1);
        assert_eq!(summary.lives_lost, 3);
    }

    #[test]
    fn reset_round_cancels_frightened_mode() {
        let mut engine = sealed_engine();
        engine.on_pellet_consumed(true);
        engine.on_pacman_collides_with_ghost(0);
        engine.reset_round();
        assert_eq!(engine.frightened_time_left(), 0.0);
        assert_eq!(engine.eaten_chain(), 0);
        assert!(engine
            .ghosts()
            .iter()
            .all(|ghost| ghost.state() == GhostState::Scatter && ghost.phase() == 0));
        assert_eq!(engine.pacman().direction(), Direction::Left);
    }

    #[test]
    fn level_cleared_fires_once() {
        let mut engine = engine_from(&["ooooo", "oesso", "ooooo"], GridCell::new(1, 1), &[]);
        engine.receive_input(Direction::Right);
        run(&mut engine, 60);
        let cleared = engine
            .build_snapshot(true)
            .events
            .iter()
            .filter(|event| **event == RuntimeEvent::LevelCleared)
            .count();
        assert_eq!(cleared, 1);
        assert!(engine.is_level_cleared());
        run(&mut engine, 60);
        assert!(!engine.build_snapshot(true).events.contains(&RuntimeEvent::LevelCleared));
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = sealed_engine();
        engine.on_pellet_consumed(true);
        let peek = engine.build_snapshot(false);
        assert!(peek.events.is_empty());
        let first = engine.build_snapshot(true);
        let second = engine.build_snapshot(true);
        assert_eq!(first.events, vec![RuntimeEvent::FrightenedStarted]);
        assert!(second.events.is_empty());
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let script = [
            (0, Direction::Left),
            (90, Direction::Up),
            (200, Direction::Right),
            (330, Direction::Down),
            (480, Direction::Left),
        ];
        let mut a = GameEngine::new(RoundConfig::default(), 424_242).expect("level");
        let mut b = GameEngine::new(RoundConfig::default(), 424_242).expect("level");

        for tick in 0..900 {
            for (at, dir) in script {
                if at == tick {
                    a.receive_input(dir);
                    b.receive_input(dir);
                }
            }
            a.step(TICK_SECONDS);
            b.step(TICK_SECONDS);
            let sa = serde_json::to_string(&a.build_snapshot(true)).expect("snapshot json");
            let sb = serde_json::to_string(&b.build_snapshot(true)).expect("snapshot json");
            assert_eq!(sa, sb);
        }
    }

    #[test]
    fn power_pellet_frightens_ghosts_after_their_move() {
        let mut engine = engine_from(
            &["ooooooo", "opeeeeo", "ooooooo"],
            GridCell::new(1, 1),
            &[GridCell::new(5, 1)],
        );
        run(&mut engine, 1);

        assert_eq!(engine.score(), 50);
        assert_eq!(engine.ghosts()[0].state(), GhostState::Frightened);
        let moved = engine.ghosts()[0]
            .position()
            .distance(engine.grid().grid_to_world(GridCell::new(5, 1)));
        let normal_step = engine.config.ghost_speed * TICK_SECONDS;
        assert!((moved - normal_step).abs() < 1e-4, "moved {moved}");
    }

    #[test]
    fn ghost_tracks_do_not_depend_on_roster_order() {
        let forward = RoundConfig::default();
        let mut swapped = RoundConfig::default();
        swapped.level.ghosts.swap(0, 1);

        let mut a = GameEngine::new(forward, 99).expect("level");
        let mut b = GameEngine::new(swapped, 99).expect("level");
        a.on_pellet_consumed(true);
        b.on_pellet_consumed(true);

        let cells = |engine: &GameEngine, name: GhostName| {
            engine
                .ghosts()
                .iter()
                .find(|ghost| ghost.name() == name)
                .map(|ghost| ghost.motion().current)
        };
        for tick in 0..240 {
            a.step(TICK_SECONDS);
            b.step(TICK_SECONDS);
            for name in GhostName::ALL {
                assert_eq!(cells(&a, name), cells(&b, name), "{name:?} at tick {tick}");
            }
        }
    }

    #[test]
    fn stock_ghosts_get_out_of_the_house() {
        let mut engine = GameEngine::new(RoundConfig::default(), 3).expect("level");
        let mut outside = [false; 4];
        for _ in 0..180 {
            engine.step(TICK_SECONDS);
            for (idx, ghost) in engine.ghosts().iter().enumerate() {
                if ghost.motion().current.y <= 11 {
                    outside[idx] = true;
                }
            }
        }
        assert_eq!(outside, [true; 4]);
    }

    #[test]
    fn music_follows_frightened_then_dead_ghosts() {
        let mut engine = sealed_engine();
        run(&mut engine, 1);
        assert!(engine
            .build_snapshot(true)
            .events
            .contains(&RuntimeEvent::MusicChanged {
                mood: MusicMood::Normal
            }));

        engine.on_pellet_consumed(true);
        engine.on_pacman_collides_with_ghost(0);
        run(&mut engine, 1);
        assert_eq!(engine.mood(), MusicMood::Frightened);

        // Sealed ghost never reaches a gate, so it stays Eaten.
        run(&mut engine, 360);
        assert_eq!(engine.ghosts()[0].state(), GhostState::Eaten);
        assert_eq!(engine.mood(), MusicMood::DeadPresent);
        let moods: Vec<MusicMood> = engine
            .build_snapshot(true)
            .events
            .iter()
            .filter_map(|event| match event {
                RuntimeEvent::MusicChanged { mood } => Some(*mood),
                _ => None,
            })
            .collect();
        assert_eq!(moods, vec![MusicMood::Frightened, MusicMood::DeadPresent]);
    }

    #[test]
    fn fruit_spawns_once_below_threshold_and_expires() {
        let mut engine = engine_from(
            &["ooooooo", "oeeesso", "ooooooo"],
            GridCell::new(1, 1),
            &[],
        );
        engine.config.fruit.spawn_threshold = 2;
        engine.fruit = FruitSlot::new(GridCell::new(3, 1));

        run(&mut engine, 1);
        assert!(engine.fruit.view().is_some());
        assert!(engine
            .build_snapshot(true)
            .events
            .contains(&RuntimeEvent::FruitSpawned { x: 3, y: 1 }));

        run(&mut engine, 60 * 10);
        assert!(engine.fruit.view().is_none());
        let events = engine.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::FruitExpired));

        run(&mut engine, 60);
        assert!(engine.fruit.view().is_none());
    }

    #[test]
    fn fruit_is_eaten_within_pickup_radius() {
        let mut engine = engine_from(
            &["ooooooo", "oeeesso", "ooooooo"],
            GridCell::new(1, 1),
            &[],
        );
        engine.config.fruit.spawn_threshold = 2;
        engine.fruit = FruitSlot::new(GridCell::new(3, 1));
        run(&mut engine, 1);
        engine.receive_input(Direction::Right);
        run(&mut engine, 40);

        let events = engine.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::FruitEaten { points: 100 }));
        assert_eq!(engine.build_summary().fruit_eaten, 1);
        assert_eq!(engine.score(), 100 + 20);
    }
}
