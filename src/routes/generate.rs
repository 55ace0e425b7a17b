use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use crate::encode::{ImagePayload, encode_all};
use crate::error::{
    AppError, AppResult, ENCODING_FAILED_MSG, GENERATION_FAILED_MSG, GENERATION_IN_FLIGHT_MSG,
};
use crate::generate::generate_recipe;
use crate::models::{AppState, Recipe, SessionStatus, StoredImage};

pub const NO_IMAGES_MSG: &str = "Please upload at least one ingredient photo.";

#[derive(Deserialize)]
pub struct GenerateReq {
    #[serde(default)]
    pub preferences: String,
}

#[derive(Deserialize)]
pub struct OneShotReq {
    /// Images as base64 data URLs.
    pub images: Vec<String>,
    #[serde(default)]
    pub preferences: String,
}

/// Generate a recipe from the session's current photo set.
///
/// The session moves idle/success/error -> loading -> success or error;
/// loading always exits, and a second invocation while loading is rejected
/// with 409. Zero photos fail validation before any network call.
///
/// # Errors
///
/// Returns an error if the session is unknown or empty, a generation is
/// already in flight, or encoding/generation fails.
pub async fn for_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<GenerateReq>,
) -> AppResult<Json<Recipe>> {
    let images = begin(&state, id).await?;

    let outcome = run_pipeline(&state, &images, &req.preferences).await;

    settle(&state, id, &outcome).await;
    outcome.map(Json)
}

/// One-shot generation without a session: images arrive as data URLs and no
/// state is kept.
///
/// # Errors
///
/// Returns an error if no images are supplied, a data URL cannot be decoded,
/// or the generation call fails.
pub async fn one_shot(
    State(state): State<AppState>,
    Json(req): Json<OneShotReq>,
) -> AppResult<Json<Recipe>> {
    if req.images.is_empty() {
        return Err(AppError::Validation(NO_IMAGES_MSG.to_string()));
    }

    let payloads: Vec<ImagePayload> = req
        .images
        .iter()
        .map(|s| ImagePayload::from_data_url(s))
        .collect::<anyhow::Result<_>>()
        .map_err(AppError::Encoding)?;

    let recipe = generate_recipe(
        &state.llm,
        &state.http,
        &payloads,
        &req.preferences,
        Duration::from_secs(state.config.llm_timeout_secs),
    )
    .await
    .map_err(AppError::Generation)?;

    Ok(Json(recipe))
}

/// Validate and flip the session to loading, clearing any previous outcome.
/// Returns a snapshot of the image list the pipeline will work on.
async fn begin(state: &AppState, id: Uuid) -> AppResult<Vec<StoredImage>> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    if session.status == SessionStatus::Loading {
        return Err((StatusCode::CONFLICT, GENERATION_IN_FLIGHT_MSG.to_string()).into());
    }

    // Rejected before loading: the previous recipe stays visible alongside
    // the validation message.
    if session.images.is_empty() {
        session.status = SessionStatus::Error;
        session.error = Some(NO_IMAGES_MSG.to_string());
        return Err(AppError::Validation(NO_IMAGES_MSG.to_string()));
    }

    session.recipe = None;
    session.error = None;
    session.status = SessionStatus::Loading;
    Ok(session.images.clone())
}

async fn run_pipeline(
    state: &AppState,
    images: &[StoredImage],
    preferences: &str,
) -> Result<Recipe, AppError> {
    let payloads = encode_all(images).await.map_err(AppError::Encoding)?;

    generate_recipe(
        &state.llm,
        &state.http,
        &payloads,
        preferences,
        Duration::from_secs(state.config.llm_timeout_secs),
    )
    .await
    .map_err(AppError::Generation)
}

/// Publish the outcome. Runs on every pipeline exit so the session never
/// stays in loading.
async fn settle(state: &AppState, id: Uuid, outcome: &Result<Recipe, AppError>) {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&id) else {
        return;
    };
    match outcome {
        Ok(recipe) => {
            session.status = SessionStatus::Success;
            session.recipe = Some(recipe.clone());
        }
        Err(err) => {
            session.status = SessionStatus::Error;
            session.error = Some(public_message(err).to_string());
        }
    }
}

/// The message stored on the session and shown to users; never the raw cause.
fn public_message(err: &AppError) -> &'static str {
    match err {
        AppError::Encoding(_) => ENCODING_FAILED_MSG,
        _ => GENERATION_FAILED_MSG,
    }
}
