use anyhow::Context;
use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::db::{Database, WorkoutStore};
use crate::models::{ExercisePlanEntry, Level, WorkoutDetails, WorkoutRecord};
use crate::plans;
use crate::tracker::{ProgressSnapshot, TrackerError, WorkoutSummary, WorkoutTracker};
use serde::{Deserialize, Serialize};

/// Shared by every request; the tracker mutex makes workout updates single-writer.
pub struct ApiState<S = Database> {
    pub database: Arc<Mutex<S>>,
    pub tracker: Arc<Mutex<WorkoutTracker>>,
    pub username: Arc<str>,
    pub history_limit: usize,
    pub auth_token: Option<Arc<str>>,
}

impl<S> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            database: Arc::clone(&self.database),
            tracker: Arc::clone(&self.tracker),
            username: Arc::clone(&self.username),
            history_limit: self.history_limit,
            auth_token: self.auth_token.clone(),
        }
    }
}

impl<S: WorkoutStore> ApiState<S> {
    pub fn new(database: S, username: &str, config: &AppConfig) -> Self {
        Self {
            database: Arc::new(Mutex::new(database)),
            tracker: Arc::new(Mutex::new(WorkoutTracker::new())),
            username: Arc::from(username),
            history_limit: config.history_limit,
            auth_token: config.api_auth_token.as_deref().map(Arc::from),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "status": "error", "message": self.message }));
        (self.status, body).into_response()
    }
}

impl From<TrackerError> for ApiError {
    fn from(e: TrackerError) -> Self {
        let status = match e {
            TrackerError::UnknownLevel(_) => StatusCode::BAD_REQUEST,
            TrackerError::UnknownExercise { .. } => StatusCode::NOT_FOUND,
            TrackerError::StartWhileActive(_)
            | TrackerError::CompleteSetWhenNotActive
            | TrackerError::EndWhenNotActive => StatusCode::CONFLICT,
        };
        Self::new(status, e.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        error!("Database error: {}", e);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("database error: {}", e))
    }
}

#[derive(Serialize)]
pub struct PlanResponse {
    pub level: Level,
    pub total_sets: u32,
    pub max_calories: f64,
    pub exercises: &'static [ExercisePlanEntry],
}

impl PlanResponse {
    fn for_level(level: Level) -> Self {
        let exercises = plans::plan_for(level);
        Self {
            level,
            total_sets: plans::total_sets(exercises),
            max_calories: plans::full_calories(exercises),
            exercises,
        }
    }
}

#[derive(Deserialize)]
pub struct StartInput {
    pub level: String,
}

#[derive(Deserialize)]
pub struct SetInput {
    pub exercise: String,
}

#[derive(Debug, Serialize)]
pub struct EndResponse {
    pub workout_id: i64,
    pub summary: WorkoutSummary,
}

pub fn router<S>(state: ApiState<S>, cors_origins: &[String]) -> Router
where
    S: WorkoutStore + Send + 'static,
{
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/plans", get(get_plans))
        .route("/api/plans/:level", get(get_plan))
        .route("/api/workout", get(get_workout::<S>))
        .route("/api/workout/start", post(start_workout::<S>))
        .route("/api/workout/sets", post(complete_set::<S>))
        .route("/api/workout/end", post(end_workout::<S>))
        .route("/api/history", get(get_history::<S>))
        .route("/api/history/:id", get(get_workout_details::<S>))
        .layer(middleware::from_fn_with_state(state.clone(), require_token::<S>))
        .layer(cors)
        .with_state(state)
}

pub async fn run_server<S>(state: ApiState<S>, config: &AppConfig) -> anyhow::Result<()>
where
    S: WorkoutStore + Send + 'static,
{
    let app = router(state, &config.cors_origins());

    let listener = tokio::net::TcpListener::bind(&config.api_bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.api_bind_addr))?;
    info!("API Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

fn token_matches(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected)
}

async fn require_token<S>(State(state): State<ApiState<S>>, request: Request, next: Next) -> Response {
    if let Some(expected) = &state.auth_token {
        if !token_matches(request.headers(), expected) {
            return ApiError::new(StatusCode::UNAUTHORIZED, "missing or invalid bearer token")
                .into_response();
        }
    }
    next.run(request).await
}

async fn get_plans() -> Json<Vec<PlanResponse>> {
    Json(Level::ALL.into_iter().map(PlanResponse::for_level).collect())
}

async fn get_plan(Path(level): Path<String>) -> Result<Json<PlanResponse>, ApiError> {
    let level: Level = level
        .parse()
        .map_err(|l| ApiError::from(TrackerError::UnknownLevel(l)))?;
    Ok(Json(PlanResponse::for_level(level)))
}

async fn get_workout<S>(State(state): State<ApiState<S>>) -> Json<Option<ProgressSnapshot>> {
    Json(state.tracker.lock().await.snapshot())
}

async fn start_workout<S>(
    State(state): State<ApiState<S>>,
    Json(input): Json<StartInput>,
) -> Result<Json<ProgressSnapshot>, ApiError> {
    let mut tracker = state.tracker.lock().await;
    let session = tracker.start(&input.level)?;
    Ok(Json(session.snapshot()))
}

async fn complete_set<S>(
    State(state): State<ApiState<S>>,
    Json(input): Json<SetInput>,
) -> Result<Json<ProgressSnapshot>, ApiError> {
    let mut tracker = state.tracker.lock().await;
    Ok(Json(tracker.complete_set(&input.exercise)?))
}

/// Persists before clearing the session so a failed write can be retried.
async fn end_workout<S: WorkoutStore>(
    State(state): State<ApiState<S>>,
) -> Result<Json<EndResponse>, ApiError> {
    let mut tracker = state.tracker.lock().await;
    let now = Local::now();
    let summary = tracker.summarize_at(now)?;

    let workout_id = state
        .database
        .lock()
        .await
        .save_workout(&summary.to_new_workout(&state.username))?;

    tracker.end_at(now)?;
    Ok(Json(EndResponse {
        workout_id,
        summary,
    }))
}

async fn get_history<S: WorkoutStore>(
    State(state): State<ApiState<S>>,
) -> Result<Json<Vec<WorkoutRecord>>, ApiError> {
    let db = state.database.lock().await;
    Ok(Json(db.load_history(&state.username, state.history_limit)?))
}

async fn get_workout_details<S: WorkoutStore>(
    State(state): State<ApiState<S>>,
    Path(id): Path<i64>,
) -> Result<Json<WorkoutDetails>, ApiError> {
    let db = state.database.lock().await;
    db.load_details(&state.username, id)?
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("workout {} not found", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewWorkout;

    fn state() -> ApiState {
        ApiState::new(
            Database::open_in_memory().unwrap(),
            "ana",
            &AppConfig::default(),
        )
    }

    fn start(level: &str) -> Json<StartInput> {
        Json(StartInput {
            level: level.to_string(),
        })
    }

    fn set(exercise: &str) -> Json<SetInput> {
        Json(SetInput {
            exercise: exercise.to_string(),
        })
    }

    #[tokio::test]
    async fn workout_lifecycle_persists_history() {
        let state = state();

        let Json(snapshot) = start_workout(State(state.clone()), start("Beginner"))
            .await
            .unwrap();
        assert_eq!(snapshot.target_sets, 15);

        for _ in 0..4 {
            complete_set(State(state.clone()), set("Push-ups")).await.unwrap();
        }
        let Json(live) = get_workout(State(state.clone())).await;
        let live = live.expect("workout in progress");
        assert_eq!(live.completed_sets, 3);
        assert!((live.calories_burned - 15.0).abs() < 1e-9);

        let Json(ended) = end_workout(State(state.clone())).await.unwrap();
        assert_eq!(ended.summary.status, crate::models::CompletionStatus::Partial);
        assert!(get_workout(State(state.clone())).await.0.is_none());

        let Json(history) = get_history(State(state.clone())).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, ended.workout_id);

        let Json(details) = get_workout_details(State(state.clone()), Path(ended.workout_id))
            .await
            .unwrap();
        assert_eq!(details.exercises.len(), 5);
        assert_eq!(details.exercises[0].sets, 3);
    }

    #[tokio::test]
    async fn precondition_failures_map_to_status_codes() {
        let state = state();

        let err = complete_set(State(state.clone()), set("Push-ups"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err = end_workout(State(state.clone())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err = start_workout(State(state.clone()), start("Expert"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        start_workout(State(state.clone()), start("Advanced"))
            .await
            .unwrap();
        let err = start_workout(State(state.clone()), start("Beginner"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err = complete_set(State(state.clone()), set("Jumping Jacks"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = get_workout_details(State(state.clone()), Path(42))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn plans_are_listed() {
        let Json(all) = get_plans().await;
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].total_sets, 25);

        let Json(plan) = get_plan(Path("intermediate".to_string())).await.unwrap();
        assert_eq!(plan.level, Level::Intermediate);
        assert!(get_plan(Path("expert".to_string())).await.is_err());
    }

    /// Rejects the first `failures` saves, then stores nothing but counts.
    struct FailingStore {
        failures: usize,
        saved: usize,
    }

    impl WorkoutStore for FailingStore {
        fn save_workout(&mut self, _workout: &NewWorkout) -> rusqlite::Result<i64> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(rusqlite::Error::InvalidQuery);
            }
            self.saved += 1;
            Ok(self.saved as i64)
        }

        fn load_history(&self, _username: &str, _limit: usize) -> rusqlite::Result<Vec<WorkoutRecord>> {
            Ok(Vec::new())
        }

        fn load_details(
            &self,
            _username: &str,
            _workout_id: i64,
        ) -> rusqlite::Result<Option<WorkoutDetails>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn failed_save_keeps_workout_active_for_retry() {
        let state = ApiState::new(
            FailingStore {
                failures: 1,
                saved: 0,
            },
            "ana",
            &AppConfig::default(),
        );
        start_workout(State(state.clone()), start("Beginner"))
            .await
            .unwrap();
        complete_set(State(state.clone()), set("Squats")).await.unwrap();

        let err = end_workout(State(state.clone())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        let live = get_workout(State(state.clone())).await.0;
        assert_eq!(live.map(|s| s.completed_sets), Some(1));

        let Json(ended) = end_workout(State(state.clone())).await.unwrap();
        assert_eq!(ended.workout_id, 1);
        assert!((ended.summary.calories_burned - 9.0).abs() < 1e-9);
        assert!(get_workout(State(state.clone())).await.0.is_none());
        assert_eq!(state.database.lock().await.saved, 1);
    }

    #[test]
    fn bearer_token_check() {
        let mut headers = HeaderMap::new();
        assert!(!token_matches(&headers, "secret"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        assert!(token_matches(&headers, "secret"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer other"));
        assert!(!token_matches(&headers, "secret"));
    }

    #[test]
    fn router_builds_with_and_without_origins() {
        let _ = router(state(), &[]);
        let _ = router(state(), &["http://localhost:3000".to_string()]);
    }
}
