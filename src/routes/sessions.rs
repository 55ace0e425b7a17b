use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use std::io;
use uuid::Uuid;

use crate::error::{AppError, AppResult, GENERATION_IN_FLIGHT_MSG};
use crate::models::{AppState, SessionStatus, SessionView, StoredImage};

/// Open a new upload session.
pub async fn create(State(state): State<AppState>) -> Json<SessionView> {
    let id = Uuid::new_v4();
    let session = crate::models::Session::new();
    let view = SessionView::from_session(id, &session);
    state.sessions.write().await.insert(id, session);
    tracing::info!(session=%id, "session created");
    Json(view)
}

/// Current session state: images in order, status, and the last recipe or
/// error if any.
///
/// # Errors
///
/// Returns 404 if the session does not exist.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionView>> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(SessionView::from_session(id, session)))
}

/// Append one or more photos to the session. Accepts a multipart form with
/// fields named `image` (or `file`), repeated. Prior selections are kept and
/// duplicates are allowed.
///
/// # Errors
///
/// Returns an error if the session is unknown, a generation is in flight,
/// an image exceeds the size limit, or a preview cannot be rendered.
pub async fn add_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<SessionView>> {
    ensure_not_loading(&state, id).await?;

    let max_bytes = state.config.max_image_bytes();
    let mut images: Vec<StoredImage> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if !matches!(field.name(), Some("image" | "file")) {
            continue;
        }

        let file_name = field
            .file_name()
            .map_or_else(|| "upload".to_string(), ToString::to_string);
        let media_type = field.content_type().map_or_else(
            || {
                mime_guess::from_path(&file_name)
                    .first_or(mime_guess::mime::IMAGE_JPEG)
                    .to_string()
            },
            ToString::to_string,
        );

        let bytes = field.bytes().await?.to_vec();
        if bytes.len() > max_bytes {
            return Err((
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("image exceeds {} MB limit", state.config.max_image_mb),
            )
                .into());
        }

        images.push(StoredImage {
            file_name,
            media_type,
            bytes,
        });
    }

    if images.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "no images provided".to_string()).into());
    }

    // Render and store previews before touching the session so a failed
    // upload leaves it unchanged. If a later file in the batch fails, the
    // previews already written must not be left orphaned.
    let mut previews: Vec<String> = Vec::new();
    for img in &images {
        match store_preview(&state, id, img).await {
            Ok(preview) => previews.push(preview),
            Err(e) => {
                remove_preview_files(&state, &previews).await;
                return Err(e);
            }
        }
    }

    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&id) else {
        drop(sessions);
        remove_preview_files(&state, &previews).await;
        return Err(StatusCode::NOT_FOUND.into());
    };
    if session.status == SessionStatus::Loading {
        drop(sessions);
        remove_preview_files(&state, &previews).await;
        return Err((StatusCode::CONFLICT, GENERATION_IN_FLIGHT_MSG.to_string()).into());
    }

    session.images.append(&mut images);
    session.previews.append(&mut previews);
    let view = SessionView::from_session(id, session);
    drop(sessions);

    Ok(Json(view))
}

/// Remove the photo at `index`, shrinking the image and preview lists by one
/// without reordering the rest. The preview file is deleted immediately.
///
/// # Errors
///
/// Returns 404 if the session or index does not exist, 409 while a
/// generation is in flight.
pub async fn remove_image(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> AppResult<Json<SessionView>> {
    let preview;
    let view;
    {
        let mut sessions = state.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
        if session.status == SessionStatus::Loading {
            return Err((StatusCode::CONFLICT, GENERATION_IN_FLIGHT_MSG.to_string()).into());
        }
        if index >= session.images.len() {
            return Err((StatusCode::NOT_FOUND, format!("no image at index {index}")).into());
        }
        session.images.remove(index);
        preview = session.previews.remove(index);
        view = SessionView::from_session(id, session);
    }

    remove_preview_files(&state, &[preview]).await;
    Ok(Json(view))
}

async fn ensure_not_loading(state: &AppState, id: Uuid) -> AppResult<()> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    if session.status == SessionStatus::Loading {
        return Err((StatusCode::CONFLICT, GENERATION_IN_FLIGHT_MSG.to_string()).into());
    }
    Ok(())
}

/// Decode the upload, render a webp thumbnail, and write it under the media
/// dir. Returns the path relative to the media root.
async fn store_preview(state: &AppState, id: Uuid, img: &StoredImage) -> AppResult<String> {
    let bytes = img.bytes.clone();
    let webp = tokio::task::spawn_blocking(move || -> io::Result<Vec<u8>> {
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| io::Error::other(format!("decode error: {e}")))?;
        crate::image_io::to_preview_webp(&decoded)
    })
    .await?
    .map_err(|e| AppError::Encoding(e.into()))?;

    let rel_dir = format!("previews/{id}");
    let rel_path = format!("{rel_dir}/{}.webp", Uuid::new_v4());

    let abs_dir = state.config.media_dir.join(&rel_dir);
    tokio::fs::create_dir_all(&abs_dir).await?;
    tokio::fs::write(state.config.media_dir.join(&rel_path), &webp).await?;

    Ok(rel_path)
}

/// Best-effort deletion so stale thumbnails don't pile up under the media dir.
async fn remove_preview_files(state: &AppState, previews: &[String]) {
    for rel in previews {
        let path = state.config.media_dir.join(rel);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path=%path.display(), error=%e, "failed to remove preview file");
        }
    }
}
