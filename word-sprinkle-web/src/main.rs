use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use word_sprinkle::{Document, Level, Outline, Vocabulary, VocabularyEntry};
use word_sprinkle_engine::{
    EngineOptions, FavoriteRegistry, JsonFileStore, MemoryStore, PassReport, ProgressState,
    ProgressTracker, Settings, SettingsStore, SettingsUpdate, SprinkleEngine,
};

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprinkleRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub outline: Option<Outline>,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub frequency: Option<u8>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SprinkleResponse {
    pub html: String,
    pub text: String,
    pub settings: Settings,
    pub report: Option<PassReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub progress: ProgressState,
    pub favorites: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub word: String,
    pub favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct VocabularyResponse {
    pub level: Level,
    pub description: &'static str,
    pub entries: Vec<VocabularyEntry>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

#[derive(Clone)]
pub struct AppState {
    pub vocabulary: Arc<Vocabulary>,
    pub store: Arc<dyn SettingsStore>,
    pub options: EngineOptions,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/api/sprinkle", post(sprinkle))
        .route("/api/settings", get(read_settings).post(update_settings))
        .route("/api/progress", get(read_progress))
        .route("/api/favorites", post(toggle_favorite))
        .route("/api/vocabulary/{level}", get(list_vocabulary))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let vocabulary = Vocabulary::builtin().map_err(|e| format!("Failed to load vocabulary: {}", e))?;
    let store: Arc<dyn SettingsStore> = match std::env::var("SPRINKLE_STORE") {
        Ok(path) => {
            info!("Persisting settings to {}", path);
            Arc::new(JsonFileStore::new(path))
        }
        Err(_) => Arc::new(MemoryStore::new()),
    };
    let state = AppState {
        vocabulary: Arc::new(vocabulary),
        store,
        options: EngineOptions::default(),
    };

    info!("Starting word-sprinkle web server");

    let addr = std::env::var("SPRINKLE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}

async fn serve_index() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        include_str!("static/index.html"),
    )
}

fn check_frequency(frequency: Option<u8>) -> Result<(), ApiError> {
    match frequency.filter(|f| *f > 100) {
        Some(frequency) => Err(bad_request(format!(
            "Frequency must be between 0 and 100, got {}",
            frequency
        ))),
        None => Ok(()),
    }
}

async fn sprinkle(
    State(state): State<AppState>,
    Json(request): Json<SprinkleRequest>,
) -> Result<Json<SprinkleResponse>, ApiError> {
    let mut document = match (request.text, request.outline) {
        (Some(text), None) => Document::from_plain_text(&text),
        (None, Some(outline)) => Document::from_outline(&outline),
        _ => {
            return Err(bad_request(
                "Provide exactly one of 'text' or 'outline'".to_string(),
            ));
        }
    };
    check_frequency(request.frequency)?;

    let mut engine = match request.seed {
        Some(seed) => SprinkleEngine::seeded(state.vocabulary.clone(), state.store.clone(), seed),
        None => SprinkleEngine::new(state.vocabulary.clone(), state.store.clone()),
    }
    .with_options(state.options);

    let settings = engine
        .initialize_with(&SettingsUpdate {
            enabled: None,
            level: request.level,
            frequency: request.frequency,
        })
        .await;
    let report = engine.process_page(&mut document).await;

    if let Some(report) = &report {
        info!(
            "Sprinkled {} of {} eligible words at {}",
            report.placed.len(),
            report.candidates,
            settings.level
        );
    }

    Ok(Json(SprinkleResponse {
        html: document.to_html(),
        text: document.to_plain_text(),
        settings,
        report,
    }))
}

async fn read_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(Settings::load(state.store.as_ref()).await)
}

async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Settings>, ApiError> {
    check_frequency(update.frequency)?;
    let settings = Settings::load(state.store.as_ref()).await.merge(&update);
    settings.save(state.store.as_ref()).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to save settings: {}", e),
            }),
        )
    })?;
    info!(
        "Settings updated: enabled={}, level={}, frequency={}%",
        settings.enabled, settings.level, settings.frequency
    );
    Ok(Json(settings))
}

async fn read_progress(State(state): State<AppState>) -> Json<ProgressResponse> {
    let tracker =
        ProgressTracker::new(state.store.clone()).with_policy(state.options.seen_words_policy);
    let favorites = FavoriteRegistry::new(state.store.clone());
    Json(ProgressResponse {
        progress: tracker.current().await,
        favorites: favorites.list().await,
    })
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Json(request): Json<FavoriteRequest>,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let word = request.word.trim();
    if word.is_empty() {
        return Err(bad_request("'word' must not be empty".to_string()));
    }
    let favorites = FavoriteRegistry::new(state.store.clone())
        .toggle(word, request.favorite)
        .await;
    Ok(Json(FavoritesResponse { favorites }))
}

async fn list_vocabulary(
    Path(level): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<VocabularyResponse>, ApiError> {
    let level: Level = level.parse().map_err(bad_request)?;
    Ok(Json(VocabularyResponse {
        level,
        description: level.description(),
        entries: state.vocabulary.tier(level).to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState {
            vocabulary: Arc::new(Vocabulary::builtin().unwrap()),
            store: Arc::new(MemoryStore::new()),
            options: EngineOptions::default(),
        }
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_sprinkle_text() {
        let (status, body) = send(
            app(state()),
            "POST",
            "/api/sprinkle",
            Some(json!({"text": "I see a house today.", "frequency": 100, "seed": 1})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], json!("I sehen a Haus heute."));
        assert!(body["html"].as_str().unwrap().contains("german-sprinkle-word"));
        assert_eq!(body["report"]["candidates"], json!(3));
        assert_eq!(body["report"]["progress"]["newCount"], json!(3));
        assert_eq!(body["settings"]["level"], json!("B1"));
    }

    #[tokio::test]
    async fn test_sprinkle_requires_one_input() {
        let (status, body) = send(app(state()), "POST", "/api/sprinkle", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("exactly one"));
    }

    #[tokio::test]
    async fn test_sprinkle_rejects_large_frequency() {
        let (status, _) = send(
            app(state()),
            "POST",
            "/api/sprinkle",
            Some(json!({"text": "a house", "frequency": 150})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_settings_reject_large_frequency() {
        let state = state();
        let (status, body) = send(
            app(state.clone()),
            "POST",
            "/api/settings",
            Some(json!({"frequency": 150})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("150"));

        let (_, body) = send(app(state), "GET", "/api/settings", None).await;
        assert_eq!(body["frequency"], json!(15));
    }

    #[tokio::test]
    async fn test_disabled_settings_leave_text_alone() {
        let state = state();
        let (status, _) = send(
            app(state.clone()),
            "POST",
            "/api/settings",
            Some(json!({"enabled": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(
            app(state),
            "POST",
            "/api/sprinkle",
            Some(json!({"text": "a house", "frequency": 100})),
        )
        .await;
        assert_eq!(body["text"], json!("a house"));
        assert_eq!(body["report"], Value::Null);
    }

    #[tokio::test]
    async fn test_progress_after_sprinkle() {
        let state = state();
        send(
            app(state.clone()),
            "POST",
            "/api/sprinkle",
            Some(json!({"text": "a house", "frequency": 100, "seed": 9})),
        )
        .await;

        let (status, body) = send(app(state), "GET", "/api/progress", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["progress"]["pagesCount"], json!(1));
        assert_eq!(body["progress"]["wordsToday"], json!(1));
        assert_eq!(body["favorites"], json!([]));
    }

    #[tokio::test]
    async fn test_toggle_favorites() {
        let state = state();
        let (_, body) = send(
            app(state.clone()),
            "POST",
            "/api/favorites",
            Some(json!({"word": "Haus", "favorite": true})),
        )
        .await;
        assert_eq!(body["favorites"], json!(["Haus"]));

        let (_, body) = send(
            app(state),
            "POST",
            "/api/favorites",
            Some(json!({"word": "Haus", "favorite": false})),
        )
        .await;
        assert_eq!(body["favorites"], json!([]));
    }

    #[tokio::test]
    async fn test_vocabulary_by_level() {
        let (status, body) = send(app(state()), "GET", "/api/vocabulary/a1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["level"], json!("A1"));
        assert!(
            body["entries"]
                .as_array()
                .unwrap()
                .iter()
                .any(|entry| entry["source"] == json!("house"))
        );

        let (status, _) = send(app(state()), "GET", "/api/vocabulary/C1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
