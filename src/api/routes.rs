use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::health::{HealthSnapshot, HealthState};
use crate::error::AppError;
use crate::gateway::StatsGateway;
use crate::poller::Poller;
use crate::roster::{self, AddOutcome};
use crate::store::TrackerStore;
use crate::types::TrackedPlayer;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn TrackerStore>,
    pub gateway: Arc<dyn StatsGateway>,
    pub poller: Arc<Poller>,
    pub health: Arc<HealthState>,
    /// When set, mutating routes require it in `x-admin-token`.
    pub admin_token: Option<String>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/players", get(get_players).post(add_player).delete(remove_players))
        .route("/players/search", get(search_players))
        .route("/poll", post(trigger_poll))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct NameQuery {
    pub name: String,
}

#[derive(Deserialize)]
pub struct AddPlayerRequest {
    pub name: String,
    /// 1-based pick from a previous ambiguous response.
    pub index: Option<usize>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    #[serde(flatten)]
    pub health: HealthSnapshot,
    pub roster_size: usize,
}

#[derive(Serialize)]
pub struct AddPlayerResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: AddOutcome,
}

#[derive(Serialize)]
pub struct RemovePlayersResponse {
    pub removed: Vec<TrackedPlayer>,
}

#[derive(Serialize)]
pub struct PollResponse {
    pub accepted: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Result<Json<HealthResponse>, AppError> {
    let roster_size = state.store.roster().await?.len();
    Ok(Json(HealthResponse { health: state.health.snapshot(), roster_size }))
}

async fn get_players(State(state): State<ApiState>) -> Result<Json<Vec<TrackedPlayer>>, AppError> {
    Ok(Json(roster::list(state.store.as_ref()).await?))
}

async fn search_players(
    State(state): State<ApiState>,
    Query(params): Query<NameQuery>,
) -> Result<Json<Vec<TrackedPlayer>>, AppError> {
    let candidates = roster::search_candidates(state.gateway.as_ref(), &params.name).await?;
    Ok(Json(candidates))
}

async fn add_player(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(req): Json<AddPlayerRequest>,
) -> Result<(StatusCode, Json<AddPlayerResponse>), AppError> {
    authorize(&state, &headers)?;

    let outcome =
        roster::add_by_name(state.gateway.as_ref(), state.store.as_ref(), &req.name, req.index)
            .await?;
    let status = match outcome {
        AddOutcome::Added(_) => StatusCode::CREATED,
        AddOutcome::AlreadyTracked(_) => StatusCode::OK,
        AddOutcome::Ambiguous(_) => StatusCode::MULTIPLE_CHOICES,
    };
    Ok((status, Json(AddPlayerResponse { message: outcome.message(), outcome })))
}

async fn remove_players(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(params): Query<NameQuery>,
) -> Result<Json<RemovePlayersResponse>, AppError> {
    authorize(&state, &headers)?;
    let removed = roster::remove_by_name(state.store.as_ref(), &params.name).await?;
    Ok(Json(RemovePlayersResponse { removed }))
}

async fn trigger_poll(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<PollResponse>), AppError> {
    authorize(&state, &headers)?;
    if state.poller.trigger() {
        Ok((StatusCode::ACCEPTED, Json(PollResponse { accepted: true })))
    } else {
        Ok((StatusCode::CONFLICT, Json(PollResponse { accepted: false })))
    }
}

fn authorize(state: &ApiState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Ok(());
    };
    match headers.get(ADMIN_TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        Some(given) if given == expected => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::MarkerPolicy;
    use crate::poller::PollSettings;
    use crate::store::MemoryStore;
    use crate::testing::{player, RecordingNotifier, ScriptedGateway};

    fn state(admin_token: Option<&str>) -> (ApiState, Arc<MemoryStore>) {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.set_search(vec![
            player(660271, "Shohei Ohtani"),
            player(999001, "Will Smith"),
            player(999002, "Will Smith"),
        ]);
        let store = Arc::new(MemoryStore::new());
        let health = Arc::new(HealthState::new());
        let poller = Arc::new(Poller::new(
            gateway.clone(),
            Arc::new(RecordingNotifier::new()),
            store.clone(),
            health.clone(),
            PollSettings {
                interval: Duration::from_secs(300),
                player_timeout: Duration::from_secs(5),
                marker_policy: MarkerPolicy::AfterDelivery,
                daily_schedule: false,
                timezone: chrono_tz::America::New_York,
            },
        ));
        let state = ApiState {
            store: store.clone(),
            gateway,
            poller,
            health,
            admin_token: admin_token.map(str::to_string),
        };
        (state, store)
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_idle_and_roster_size() {
        let (state, store) = state(None);
        store.add_player(player(660271, "Shohei Ohtani")).await.unwrap();

        let (status, body) =
            send(router(state), Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "idle");
        assert_eq!(body["roster_size"], 1);
        assert_eq!(body["cycles_completed"], 0);
    }

    #[tokio::test]
    async fn add_unique_player_is_created() {
        let (state, store) = state(None);
        let (status, body) =
            send(router(state), post_json("/players", json!({"name": "Ohtani"}))).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["outcome"], "added");
        assert_eq!(store.roster().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ambiguous_add_lists_candidates() {
        let (state, store) = state(None);
        let app = router(state);

        let (status, body) =
            send(app.clone(), post_json("/players", json!({"name": "Will Smith"}))).await;
        assert_eq!(status, StatusCode::MULTIPLE_CHOICES);
        assert_eq!(body["players"].as_array().map(Vec::len), Some(2));

        let (status, _) =
            send(app, post_json("/players", json!({"name": "Will Smith", "index": 1}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(store.roster().await.unwrap()[0].id, 999001);
    }

    #[tokio::test]
    async fn unknown_player_is_404() {
        let (state, _) = state(None);
        let (status, _) =
            send(router(state), post_json("/players", json!({"name": "Babe Ruth"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mutations_require_admin_token_when_configured() {
        let (state, store) = state(Some("s3cret"));
        let app = router(state);

        let (status, _) = send(app.clone(), post_json("/players", json!({"name": "Ohtani"}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let mut req = post_json("/players", json!({"name": "Ohtani"}));
        req.headers_mut().insert(ADMIN_TOKEN_HEADER, "s3cret".parse().unwrap());
        let (status, _) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::CREATED);

        // reads stay open
        let (status, body) =
            send(app, Request::get("/players").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(store.roster().await.unwrap().len()));
    }

    #[tokio::test]
    async fn delete_removes_matching_players() {
        let (state, store) = state(None);
        store.add_player(player(999001, "Will Smith")).await.unwrap();
        store.add_player(player(660271, "Shohei Ohtani")).await.unwrap();

        let req = Request::delete("/players?name=smith").body(Body::empty()).unwrap();
        let (status, body) = send(router(state), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"][0]["id"], 999001);
        assert_eq!(store.roster().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_returns_candidates() {
        let (state, _) = state(None);
        let req = Request::get("/players/search?name=will").body(Body::empty()).unwrap();
        let (status, body) = send(router(state), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn poll_conflicts_while_cycle_running() {
        let (state, _) = state(None);
        let health = state.health.clone();
        let app = router(state);

        assert!(health.try_start_cycle(chrono::Utc::now()));
        let req = Request::post("/poll").body(Body::empty()).unwrap();
        let (status, _) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::CONFLICT);

        health.finish_cycle(chrono::Utc::now(), None);
        let req = Request::post("/poll").body(Body::empty()).unwrap();
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["accepted"], true);
    }
}
