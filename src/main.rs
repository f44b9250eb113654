use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::ws::{self, WebSocket};
use axum::extract::{Json, State, WebSocketUpgrade};
use axum::response::{ErrorResponse, IntoResponse, Response};
use axum::routing::{any, post};
use axum::Router;
use futures_util::stream::StreamExt as _;
use heroroll::message_bus::{Message, MessageBus, UiCommand};
use heroroll::store::SettingsStore;
use heroroll::HeroRoll;
use heroroll_model::hero::{HeroName, RoleFilter};
use heroroll_model::PlayerSlot;
use http::StatusCode;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::signal;
use tower_http::services::ServeDir;

use crate::utils::{print_err, unwrap_or_def_verbose};

mod heroroll;
mod logging;
mod utils;

struct AppState {
    message_bus: MessageBus,
}

type AppStateArg = State<Arc<AppState>>;

#[derive(Serialize)]
struct EmptyResponse;

impl IntoResponse for EmptyResponse {
    fn into_response(self) -> Response {
        serde_json::to_string(&EmptyResponse)
            .unwrap()
            .into_response()
    }
}

fn bad_request(msg: impl Display) -> ErrorResponse {
    (StatusCode::BAD_REQUEST, msg.to_string()).into()
}

async fn initialize_ui(State(state): AppStateArg) -> impl IntoResponse {
    debug!("initialize_ui");
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::InitializeUi));
    EmptyResponse
}

#[derive(Debug, Deserialize)]
struct SetPlayerCount {
    count: u8,
}
async fn set_player_count(
    State(state): AppStateArg,
    Json(body): Json<SetPlayerCount>,
) -> axum::response::Result<()> {
    debug!("set_player_count({:?})", body);
    if !(1..=heroroll_model::MAX_PLAYERS).contains(&body.count) {
        return Err(bad_request("Player count out of range"));
    }
    state
        .message_bus
        .send(Message::UiCommand(UiCommand::SetPlayerCount(body.count)));
    Ok(())
}

#[derive(Debug, Deserialize)]
struct SetPlayerRole {
    slot: PlayerSlot,
    role: RoleFilter,
}
async fn set_player_role(State(state): AppStateArg, Json(body): Json<SetPlayerRole>) {
    debug!("set_player_role({:?})", body);
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::SetPlayerRole(
            body.slot, body.role,
        )));
}

#[derive(Debug, Deserialize)]
struct SetPlayerName {
    slot: PlayerSlot,
    name: String,
}
async fn set_player_name(State(state): AppStateArg, Json(body): Json<SetPlayerName>) {
    debug!("set_player_name({:?})", body);
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::SetPlayerName(
            body.slot, body.name,
        )));
}

#[derive(Debug, Deserialize)]
struct SetListRole {
    role: RoleFilter,
}
async fn set_list_role(State(state): AppStateArg, Json(body): Json<SetListRole>) {
    debug!("set_list_role({:?})", body);
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::SetListRole(body.role)));
}

#[derive(Debug, Deserialize)]
struct SetToggle {
    enabled: bool,
}
async fn set_challenge_mode(State(state): AppStateArg, Json(body): Json<SetToggle>) {
    debug!("set_challenge_mode({:?})", body);
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::SetChallengeMode(
            body.enabled,
        )));
}

async fn set_no_repeat(State(state): AppStateArg, Json(body): Json<SetToggle>) {
    debug!("set_no_repeat({:?})", body);
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::SetNoRepeat(body.enabled)));
}

#[derive(Debug, Deserialize)]
struct ToggleBan {
    hero: HeroName,
}
async fn toggle_ban(State(state): AppStateArg, Json(body): Json<ToggleBan>) {
    debug!("toggle_ban({:?})", body);
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::ToggleBan(body.hero)));
}

#[derive(Debug, Deserialize)]
struct SetAllBanned {
    heroes: Vec<HeroName>,
    banned: bool,
}
async fn set_all_banned(State(state): AppStateArg, Json(body): Json<SetAllBanned>) {
    debug!("set_all_banned({} heroes, {})", body.heroes.len(), body.banned);
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::SetAllBanned {
            heroes: body.heroes,
            banned: body.banned,
        }));
}

async fn roll(State(state): AppStateArg) {
    debug!("roll()");
    let _ = state.message_bus.send(Message::UiCommand(UiCommand::Roll));
}

async fn clear_picks(State(state): AppStateArg) {
    debug!("clear_picks()");
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::ClearPicks));
}

async fn clear_history(State(state): AppStateArg) {
    debug!("clear_history()");
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::ClearHistory));
}

#[derive(Debug, Deserialize)]
struct MarkComplete {
    slot: PlayerSlot,
    hero: Option<HeroName>,
}
async fn mark_complete(State(state): AppStateArg, Json(body): Json<MarkComplete>) {
    debug!("mark_complete({:?})", body);
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::MarkComplete {
            slot: body.slot,
            hero: body.hero,
        }));
}

async fn mark_all_complete(State(state): AppStateArg) {
    debug!("mark_all_complete()");
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::MarkAllComplete));
}

#[derive(Debug, Deserialize)]
struct UndoComplete {
    slot: PlayerSlot,
    hero: HeroName,
}
async fn undo_complete(State(state): AppStateArg, Json(body): Json<UndoComplete>) {
    debug!("undo_complete({:?})", body);
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::UndoComplete {
            slot: body.slot,
            hero: body.hero,
        }));
}

async fn clear_filters(State(state): AppStateArg) {
    debug!("clear_filters()");
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::ClearFilters));
}

async fn reset_challenge(State(state): AppStateArg) {
    debug!("reset_challenge()");
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::ResetChallenge));
}

async fn factory_reset(State(state): AppStateArg) {
    debug!("factory_reset()");
    let _ = state
        .message_bus
        .send(Message::UiCommand(UiCommand::FactoryReset));
}

async fn create_ui_event_stream(ws: WebSocketUpgrade, State(state): AppStateArg) -> Response {
    ws.on_upgrade(move |socket| ui_event_stream(socket, state.message_bus.clone()))
}

fn wrap_result<T: Serialize, E: Display>(
    r: std::result::Result<T, E>,
) -> std::result::Result<ws::Message, axum::Error> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    enum WrappedResult<T> {
        Success(T),
        Error(String),
    }
    let wrapped_result = match r {
        Ok(data) => WrappedResult::Success(data),
        Err(e) => WrappedResult::Error(e.to_string()),
    };
    let json_text = serde_json::to_string_pretty(&wrapped_result)
        .unwrap_or_else(|e| format!("{{ \"error\": \"JSON serialization failed: {e}\" }}"));
    Ok(ws::Message::text(json_text))
}

async fn ui_event_stream(socket: WebSocket, message_bus: MessageBus) {
    debug!("ui_event_stream");
    let stream = message_bus.subscribe().ui_update_stream().map(wrap_result);
    let _ = stream.forward(socket).await.inspect_err(print_err);
}

async fn terminate_on_signal() -> Result<()> {
    let interrupt_signal: Pin<Box<dyn Future<Output = _>>> = Box::pin(async {
        signal::unix::signal(signal::unix::SignalKind::interrupt())
            .context("Failed to register terminate signal handlers!")?
            .recv()
            .await;
        Ok(())
    });
    let terminate_signal = Box::pin(async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to register terminate signal handlers!")?
            .recv()
            .await;
        Ok(())
    });
    futures_util::future::select_all([interrupt_signal, terminate_signal])
        .await
        .0
}

#[tokio::main]
async fn main() {
    logging::init();
    let config = unwrap_or_def_verbose(heroroll::store::load_config());
    let settings = SettingsStore::open();
    let message_bus = MessageBus::new();
    let heroroll = HeroRoll::new(config.clone(), settings, message_bus.clone());
    let heroroll_task = tokio::spawn(heroroll.dispatch_ui_commands(message_bus.clone()));

    let shared_state = Arc::new(AppState {
        message_bus: message_bus.clone(),
    });
    let app = Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .route("/ui_stream", any(create_ui_event_stream))
                .route("/initialize_ui", post(initialize_ui))
                .route("/set_player_count", post(set_player_count))
                .route("/set_player_role", post(set_player_role))
                .route("/set_player_name", post(set_player_name))
                .route("/set_list_role", post(set_list_role))
                .route("/set_challenge_mode", post(set_challenge_mode))
                .route("/set_no_repeat", post(set_no_repeat))
                .route("/toggle_ban", post(toggle_ban))
                .route("/set_all_banned", post(set_all_banned))
                .route("/roll", post(roll))
                .route("/clear_picks", post(clear_picks))
                .route("/clear_history", post(clear_history))
                .route("/mark_complete", post(mark_complete))
                .route("/mark_all_complete", post(mark_all_complete))
                .route("/undo_complete", post(undo_complete))
                .route("/clear_filters", post(clear_filters))
                .route("/reset_challenge", post(reset_challenge))
                .route("/factory_reset", post(factory_reset))
                .with_state(shared_state),
        )
        .fallback_service(ServeDir::new(&config.static_serving_dir));
    let listener = tokio::net::TcpListener::bind(&config.serving_addr)
        .await
        .unwrap();
    tokio::spawn(async { axum::serve(listener, app).await });

    info!("Running");
    let _ = terminate_on_signal().await.inspect_err(print_err);
    info!("Terminating.");
    message_bus.send(Message::UiCommand(UiCommand::CloseApplication));

    debug!("Waiting for workers to stop...");
    let _ = heroroll_task.await.inspect_err(print_err);
    debug!("All workers stopped.")
}
