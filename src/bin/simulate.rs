use clap::Parser;
use pacman_maze::config::RoundConfig;
use pacman_maze::constants::{TICK_RATE, TICK_SECONDS};
use pacman_maze::engine::GameEngine;
use pacman_maze::grid::ActorKind;
use pacman_maze::logging::{LogLevel, StructuredLogLine};
use pacman_maze::rng::Rng;
use pacman_maze::types::{Direction, GhostName, GhostState, RuntimeEvent, Snapshot};
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const SEGMENT_EPSILON: f32 = 1e-3;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    seconds: Option<u32>,
    #[arg(long)]
    scenario: Option<String>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
    seconds: u32,
    autopilot: bool,
    #[serde(rename = "horizontalWrap")]
    horizontal_wrap: bool,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    seconds: u32,
    ticks: u64,
    score: u32,
    #[serde(rename = "bestScore")]
    best_score: u32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "powerPelletsEaten")]
    power_pellets_eaten: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    #[serde(rename = "ghostsRecovered")]
    ghosts_recovered: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    #[serde(rename = "gameOvers")]
    game_overs: u32,
    #[serde(rename = "fruitEaten")]
    fruit_eaten: u32,
    #[serde(rename = "remainingCollectibles")]
    remaining_collectibles: usize,
    #[serde(rename = "levelCleared")]
    level_cleared: bool,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: u32,
    #[serde(rename = "clearedCount")]
    cleared_count: usize,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Default)]
struct TickHistory {
    score: u32,
    remaining: usize,
    ghost_states: Vec<(GhostName, GhostState)>,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at_ms));

    let base_config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            StructuredLogLine::new(
                LogLevel::Error,
                "config_load_failed",
                &run_id,
                json!({
                    "path": cli.config.as_ref().map(|path| path.to_string_lossy().to_string()),
                    "error": error,
                }),
            )
            .emit();
            std::process::exit(2);
        }
    };

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        StructuredLogLine::new(
            LogLevel::Info,
            "scenario_started",
            &run_id,
            json!({
                "seconds": scenario.seconds,
                "autopilot": scenario.autopilot,
                "horizontalWrap": scenario.horizontal_wrap,
            }),
        )
        .scenario(&scenario.name)
        .seed(scenario.seed)
        .emit();

        let scenario_run = match run_scenario(&scenario, &base_config) {
            Ok(run) => run,
            Err(error) => {
                StructuredLogLine::new(
                    LogLevel::Error,
                    "scenario_setup_failed",
                    &run_id,
                    json!({ "error": error }),
                )
                .scenario(&scenario.name)
                .seed(scenario.seed)
                .emit();
                std::process::exit(2);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            StructuredLogLine::new(
                LogLevel::Warn,
                "anomaly_detected",
                &run_id,
                json!({ "message": anomaly.message }),
            )
            .scenario(&scenario.name)
            .seed(scenario.seed)
            .tick(anomaly.tick)
            .emit();
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();

        StructuredLogLine::new(
            LogLevel::Info,
            "scenario_finished",
            &run_id,
            json!({
                "score": scenario_run.result.score,
                "livesLost": scenario_run.result.lives_lost,
                "levelCleared": scenario_run.result.level_cleared,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        )
        .scenario(&scenario.name)
        .seed(scenario.seed)
        .tick(scenario_run.finished_tick)
        .emit();

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => StructuredLogLine::new(
                LogLevel::Error,
                "scenario_result_serialize_failed",
                &run_id,
                json!({ "error": error.to_string() }),
            )
            .emit(),
        }
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        scenario_results,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            StructuredLogLine::new(
                LogLevel::Error,
                "summary_write_failed",
                &run_id,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            )
            .emit();
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    StructuredLogLine::new(
        LogLevel::Info,
        "run_finished",
        &run_id,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "clearedCount": summary.cleared_count,
            "summaryOut": summary_out_written,
        }),
    )
    .emit();

    if has_anomaly {
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<RoundConfig, String> {
    match path {
        Some(path) => RoundConfig::from_json_file(path).map_err(|error| error.to_string()),
        None => Ok(RoundConfig::default()),
    }
}

fn run_scenario(scenario: &Scenario, base_config: &RoundConfig) -> Result<ScenarioRunResult, String> {
    let mut config = base_config.clone();
    config.horizontal_wrap = scenario.horizontal_wrap;
    let starting_lives = config.starting_lives;
    let mut engine = GameEngine::new(config, scenario.seed).map_err(|error| error.to_string())?;
    let mut pilot_rng = Rng::new(scenario.seed ^ 0x5eed_u32);

    let mut ghosts_recovered = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last_tick = 0u64;
    let mut history = TickHistory {
        score: engine.score(),
        remaining: engine.remaining_collectibles(),
        ghost_states: engine
            .ghosts()
            .iter()
            .map(|ghost| (ghost.name(), ghost.state()))
            .collect(),
    };

    let total_ticks = scenario.seconds as u64 * TICK_RATE as u64;
    for _ in 0..total_ticks {
        if scenario.autopilot {
            if let Some(dir) = autopilot_choice(&engine, &mut pilot_rng) {
                engine.receive_input(dir);
            }
        }
        engine.step(TICK_SECONDS);
        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;

        for message in collect_snapshot_anomalies(&engine, &snapshot, &history, starting_lives) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        for event in &snapshot.events {
            if let RuntimeEvent::GhostRecovered { .. } = event {
                ghosts_recovered += 1;
            }
        }

        history = TickHistory {
            score: snapshot.score,
            remaining: snapshot.remaining_collectibles,
            ghost_states: snapshot
                .ghosts
                .iter()
                .map(|ghost| (ghost.name, ghost.state))
                .collect(),
        };

        if engine.is_level_cleared() {
            break;
        }
    }

    let summary = engine.build_summary();
    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            seconds: scenario.seconds,
            ticks: summary.ticks,
            score: summary.score,
            best_score: summary.best_score,
            pellets_eaten: summary.pellets_eaten,
            power_pellets_eaten: summary.power_pellets_eaten,
            ghosts_eaten: summary.ghosts_eaten,
            ghosts_recovered,
            lives_lost: summary.lives_lost,
            game_overs: summary.game_overs,
            fruit_eaten: summary.fruit_eaten,
            remaining_collectibles: summary.remaining_collectibles,
            level_cleared: engine.is_level_cleared(),
            anomalies,
        },
        anomaly_records,
        finished_tick: last_tick,
    })
}

fn autopilot_choice(engine: &GameEngine, rng: &mut Rng) -> Option<Direction> {
    let pacman = engine.pacman();
    if pacman.buffered() != Direction::None {
        return None;
    }
    let grid = engine.grid();
    let here = pacman.motion().target;
    let heading = pacman.direction();

    let open: Vec<Direction> = Direction::CARDINALS
        .into_iter()
        .filter(|dir| grid.can_enter(ActorKind::Pacman, here, *dir))
        .collect();
    let forward: Vec<Direction> = open
        .iter()
        .copied()
        .filter(|dir| heading == Direction::None || *dir != heading.opposite())
        .collect();
    let pool = if forward.is_empty() { open } else { forward };
    let with_food: Vec<Direction> = pool
        .iter()
        .copied()
        .filter(|dir| engine.collectibles().get(grid.neighbor(here, *dir)).is_some())
        .collect();

    if with_food.is_empty() {
        rng.choose(&pool).copied()
    } else {
        rng.choose(&with_food).copied()
    }
}

fn collect_snapshot_anomalies(
    engine: &GameEngine,
    snapshot: &Snapshot,
    previous: &TickHistory,
    starting_lives: u32,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    let grid = engine.grid();

    if snapshot.lives == 0 || snapshot.lives > starting_lives {
        anomalies.push(format!("lives out of range: {}", snapshot.lives));
    }

    if snapshot.remaining_collectibles > previous.remaining {
        anomalies.push(format!(
            "collectibles increased: {} -> {}",
            previous.remaining, snapshot.remaining_collectibles
        ));
    }

    let game_over = snapshot
        .events
        .iter()
        .any(|event| matches!(event, RuntimeEvent::GameOver { .. }));
    if snapshot.score < previous.score && !game_over {
        anomalies.push(format!(
            "score decreased without game over: {} -> {}",
            previous.score, snapshot.score
        ));
    }

    if !snapshot.frightened_time_left.is_finite() || snapshot.frightened_time_left < 0.0 {
        anomalies.push(format!(
            "invalid frightened timer: {}",
            snapshot.frightened_time_left
        ));
    }

    let pacman = engine.pacman().motion();
    if !pacman.position.x.is_finite() || !pacman.position.y.is_finite() {
        anomalies.push("pacman position is not finite".to_string());
    } else if !pacman.on_segment(grid, SEGMENT_EPSILON) {
        anomalies.push(format!(
            "pacman off its segment: {:?} -> {:?}",
            pacman.current, pacman.target
        ));
    }
    if !grid.is_walkable(ActorKind::Pacman, pacman.current) {
        anomalies.push(format!("pacman on blocked cell: {:?}", pacman.current));
    }

    for ghost in engine.ghosts() {
        let motion = ghost.motion();
        if !motion.position.x.is_finite() || !motion.position.y.is_finite() {
            anomalies.push(format!("{:?} position is not finite", ghost.name()));
        } else if !motion.on_segment(grid, SEGMENT_EPSILON) {
            anomalies.push(format!(
                "{:?} off its segment: {:?} -> {:?}",
                ghost.name(),
                motion.current,
                motion.target
            ));
        }
        if !grid.is_walkable(ActorKind::Ghost, motion.current) {
            anomalies.push(format!(
                "{:?} on blocked cell: {:?}",
                ghost.name(),
                motion.current
            ));
        }
    }

    let round_reset = snapshot
        .events
        .iter()
        .any(|event| matches!(event, RuntimeEvent::RoundReset));
    for (name, state) in &previous.ghost_states {
        if *state != GhostState::Eaten || round_reset {
            continue;
        }
        let now = snapshot
            .ghosts
            .iter()
            .find(|ghost| ghost.name == *name)
            .map(|ghost| ghost.state);
        let recovered = snapshot.events.iter().any(
            |event| matches!(event, RuntimeEvent::GhostRecovered { ghost } if ghost == name),
        );
        if now != Some(GhostState::Eaten) && !recovered {
            anomalies.push(format!("{name:?} left eaten state without reaching the gate"));
        }
    }

    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(now_ms));
    let seconds = cli.seconds.unwrap_or(90).clamp(1, 3600);

    let scenarios = vec![
        Scenario {
            name: "autopilot".to_string(),
            seed,
            seconds,
            autopilot: true,
            horizontal_wrap: true,
        },
        Scenario {
            name: "autopilot-no-wrap".to_string(),
            seed: normalize_seed(seed as u64 + 1),
            seconds,
            autopilot: true,
            horizontal_wrap: false,
        },
        Scenario {
            name: "no-input".to_string(),
            seed: normalize_seed(seed as u64 + 2),
            seconds,
            autopilot: false,
            horizontal_wrap: true,
        },
    ];

    match cli.scenario.as_deref() {
        Some(name) => scenarios
            .into_iter()
            .filter(|scenario| scenario.name == name)
            .collect(),
        None => scenarios,
    }
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let total_score: u64 = scenarios.iter().map(|scenario| scenario.score as u64).sum();
    let average_score = if scenario_count == 0 {
        0
    } else {
        (total_score / scenario_count as u64) as u32
    };
    let cleared_count = scenarios
        .iter()
        .filter(|scenario| scenario.level_cleared)
        .count();
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_score,
        cleared_count,
        scenarios,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
