use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use pacman_maze::config::RoundConfig;
use pacman_maze::constants::{TICK_MS, TICK_SECONDS};
use pacman_maze::engine::GameEngine;
use pacman_maze::logging::{emit_log, LogLevel, StructuredLogLine};
use pacman_maze::server_protocol::{parse_client_message, ParsedClientMessage};
use pacman_maze::types::RuntimeEvent;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};

const CLIENT_QUEUE: usize = 256;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u32>,
}

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    run_id: String,
    clients: HashMap<String, ClientContext>,
    config: RoundConfig,
    fixed_seed: Option<u32>,
    game: GameEngine,
}

impl ServerState {
    fn new(config: RoundConfig, fixed_seed: Option<u32>, run_id: String) -> Result<Self, String> {
        let game = GameEngine::new(config.clone(), round_seed(fixed_seed))
            .map_err(|error| error.to_string())?;
        Ok(Self {
            run_id,
            clients: HashMap::new(),
            config,
            fixed_seed,
            game,
        })
    }

    fn restart(&mut self) -> Result<(), String> {
        let seed = round_seed(self.fixed_seed);
        self.game = GameEngine::new(self.config.clone(), seed).map_err(|error| error.to_string())?;
        self.log(LogLevel::Info, "round_restarted", json!({ "seed": seed }));
        Ok(())
    }

    fn log_line(&self, level: LogLevel, event: &str, details: Value) -> StructuredLogLine {
        StructuredLogLine::new(level, event, &self.run_id, details).tick(self.game.tick())
    }

    fn log(&self, level: LogLevel, event: &str, details: Value) {
        self.log_line(level, event, details).emit();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let run_id = make_id("server");
    let port = resolve_port(cli.port, std::env::var("PORT").ok().as_deref());

    let config = match cli.config.as_deref() {
        Some(path) => RoundConfig::from_json_file(path),
        None => Ok(RoundConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(error) => {
            emit_log(
                LogLevel::Error,
                "config_load_failed",
                &run_id,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    let state = match ServerState::new(config, cli.seed, run_id.clone()) {
        Ok(state) => Arc::new(Mutex::new(state)),
        Err(error) => {
            emit_log(
                LogLevel::Error,
                "level_setup_failed",
                &run_id,
                json!({ "error": error }),
            );
            std::process::exit(2);
        }
    };
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/map", get(map_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            emit_log(
                LogLevel::Error,
                "bind_failed",
                &run_id,
                json!({ "addr": bind_addr, "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    emit_log(
        LogLevel::Info,
        "listening",
        &run_id,
        json!({ "port": port }),
    );
    if let Err(error) = axum::serve(listener, app).await {
        emit_log(
            LogLevel::Error,
            "server_runtime_failed",
            &run_id,
            json!({ "error": error.to_string() }),
        );
        std::process::exit(1);
    }
}

fn resolve_port(cli_port: Option<u16>, env_port: Option<&str>) -> u16 {
    cli_port
        .or_else(|| env_port.and_then(|value| value.parse::<u16>().ok()))
        .unwrap_or(8080)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn map_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(build_map_payload(&guard.game))
}

fn build_map_payload(game: &GameEngine) -> Value {
    let map = game.grid().map();
    json!({
        "width": map.width(),
        "height": map.height(),
        "rows": map.to_letter_rows(),
        "rotations": map.rotations(),
    })
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(CLIENT_QUEUE);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id.clone(), ClientContext { tx: tx.clone() });
        send_welcome(&mut guard, &client_id);
        guard.log(
            LogLevel::Info,
            "client_connected",
            json!({ "clientId": client_id, "clients": guard.clients.len() }),
        );
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(&state, &client_id, raw.as_str()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    handle_client_message(&state, &client_id, &text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    handle_disconnect(&state, &client_id).await;
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: &SharedState, client_id: &str, raw: &str) {
    let mut guard = state.lock().await;
    let Some(message) = parse_client_message(raw) else {
        guard.log(
            LogLevel::Warn,
            "invalid_client_message",
            json!({ "clientId": client_id, "bytes": raw.len() }),
        );
        send_to_client(
            &mut guard,
            client_id,
            &json!({ "type": "error", "message": "invalid message" }),
            QueuePolicy::DisconnectOnFull,
        );
        return;
    };
    apply_client_message(&mut guard, client_id, message);
}

fn apply_client_message(state: &mut ServerState, client_id: &str, message: ParsedClientMessage) {
    match message {
        ParsedClientMessage::Input { dir } => {
            state.game.receive_input(dir);
        }
        ParsedClientMessage::Reset => {
            if let Err(error) = state.restart() {
                state.log(
                    LogLevel::Error,
                    "round_restart_failed",
                    json!({ "error": error }),
                );
                send_to_client(
                    state,
                    client_id,
                    &json!({ "type": "error", "message": "reset failed" }),
                    QueuePolicy::DisconnectOnFull,
                );
            }
        }
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                state,
                client_id,
                &json!({ "type": "pong", "t": t }),
                QueuePolicy::DisconnectOnFull,
            );
        }
    }
}

async fn handle_disconnect(state: &SharedState, client_id: &str) {
    let mut guard = state.lock().await;
    disconnect_client_internal(&mut guard, client_id);
}

fn disconnect_client_internal(state: &mut ServerState, client_id: &str) {
    let Some(context) = state.clients.remove(client_id) else {
        return;
    };
    let _ = context.tx.try_send(OutboundMessage::Close {
        code: 1000,
        reason: "bye".to_string(),
    });
    state.log(
        LogLevel::Info,
        "client_disconnected",
        json!({ "clientId": client_id, "clients": state.clients.len() }),
    );
}

fn send_welcome(state: &mut ServerState, client_id: &str) {
    let map = build_map_payload(&state.game);
    send_to_client(
        state,
        client_id,
        &json!({
            "type": "welcome",
            "clientId": client_id,
            "map": map,
        }),
        QueuePolicy::DisconnectOnFull,
    );
    let snapshot = state.game.build_snapshot(false);
    send_to_client(
        state,
        client_id,
        &json!({ "type": "state", "snapshot": snapshot }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_game(&mut guard);
        }
    });
}

fn tick_game(state: &mut ServerState) {
    if state.clients.is_empty() {
        return;
    }

    state.game.step(TICK_SECONDS);
    let snapshot = state.game.build_snapshot(true);
    let game_over = snapshot
        .events
        .iter()
        .any(|event| matches!(event, RuntimeEvent::GameOver { .. }));
    let cleared = snapshot
        .events
        .iter()
        .any(|event| matches!(event, RuntimeEvent::LevelCleared));

    broadcast(
        state,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
        QueuePolicy::DropOnFull,
    );

    if game_over || cleared {
        let summary = state.game.build_summary();
        let outcome = if cleared { "level_cleared" } else { "game_over" };
        state.log(LogLevel::Info, outcome, json!({ "score": summary.score }));
        broadcast(
            state,
            &json!({
                "type": outcome,
                "summary": summary,
            }),
            QueuePolicy::DisconnectOnFull,
        );
    }
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client_internal(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        disconnect_client_internal(state, &client_id);
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn round_seed(fixed_seed: Option<u32>) -> u32 {
    fixed_seed.unwrap_or_else(|| rand::rng().random())
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("{prefix}_{seq}_{suffix}")
}
