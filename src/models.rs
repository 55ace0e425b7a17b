use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{config::Config, llm::LlmClient};

/* ---------- App state ---------- */

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    pub llm: LlmClient,
    pub http: reqwest::Client,
    pub config: Config,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config, llm: LlmClient) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            llm,
            http: reqwest::Client::new(),
            config,
        }
    }
}

/* ---------- Domain model ---------- */

/// The generated recipe. Wire names are fixed camelCase; every field is
/// required, so a model reply missing one fails deserialization outright
/// instead of producing a partial recipe.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub recipe_name: String,
    pub description: String,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: String,
    pub ingredients: RecipeIngredients,
    pub instructions: Vec<String>,
    pub meal_prep: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredients {
    /// Ingredients identified from the user's photos.
    pub provided: Vec<String>,
    /// Additional ingredients to buy; empty means "nothing else needed".
    pub shopping_list: Vec<String>,
}

/* ---------- Upload sessions ---------- */

/// One uploaded photo, held in memory until its session generates a recipe.
#[derive(Clone, Debug)]
pub struct StoredImage {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Server-side counterpart of the uploader's component state: an ordered
/// image list, a parallel preview list, and the outcome of the last
/// generation. Only the generate handler moves `status` through
/// loading/success/error.
#[derive(Clone, Debug)]
pub struct Session {
    pub images: Vec<StoredImage>,
    /// Relative media paths of preview thumbnails, index-parallel to `images`.
    pub previews: Vec<String>,
    pub status: SessionStatus,
    pub recipe: Option<Recipe>,
    pub error: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            images: Vec::new(),
            previews: Vec::new(),
            status: SessionStatus::Idle,
            recipe: None,
            error: None,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/* ---------- API views ---------- */

#[derive(Serialize, Debug)]
pub struct ImageView {
    pub index: usize,
    pub file_name: String,
    pub media_type: String,
    pub size_bytes: usize,
    /// Path under /media serving the preview thumbnail.
    pub preview: String,
}

#[derive(Serialize, Debug)]
pub struct SessionView {
    pub id: Uuid,
    pub status: SessionStatus,
    pub images: Vec<ImageView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionView {
    #[must_use]
    pub fn from_session(id: Uuid, s: &Session) -> Self {
        let images = s
            .images
            .iter()
            .zip(&s.previews)
            .enumerate()
            .map(|(index, (img, preview))| ImageView {
                index,
                file_name: img.file_name.clone(),
                media_type: img.media_type.clone(),
                size_bytes: img.bytes.len(),
                preview: format!("/media/{preview}"),
            })
            .collect();
        Self {
            id,
            status: s.status,
            images,
            recipe: s.recipe.clone(),
            error: s.error.clone(),
        }
    }
}
