use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// User-facing message for any failure while reading or decoding uploaded
/// images. The real cause is logged, never sent to the client.
pub const ENCODING_FAILED_MSG: &str = "One of the uploaded photos could not be read.";

/// User-facing message for any failure of the generation call itself.
pub const GENERATION_FAILED_MSG: &str =
    "Failed to generate a recipe. The culinary AI might be taking a nap. Please try again.";

pub const GENERATION_IN_FLIGHT_MSG: &str = "A recipe is already being generated for this session.";

#[derive(Debug)]
pub enum AppError {
    /// Return just a status code with an empty body.
    Status(StatusCode),
    /// Return a status code with a plain-text message body.
    Msg(StatusCode, String),
    /// Request rejected before any work was done; message is safe to show inline.
    Validation(String),
    /// An uploaded image could not be read or decoded; cause logged only.
    Encoding(anyhow::Error),
    /// The outbound generation call failed or returned a malformed recipe;
    /// cause logged only.
    Generation(anyhow::Error),
    /// Internal error -> 500 with JSON body; logged.
    Anyhow(anyhow::Error),
}

impl From<StatusCode> for AppError {
    fn from(code: StatusCode) -> Self {
        Self::Status(code)
    }
}

impl From<(StatusCode, String)> for AppError {
    fn from((code, msg): (StatusCode, String)) -> Self {
        Self::Msg(code, msg)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        Self::Anyhow(e)
    }
}

/* ---- Narrow, explicit conversions so `?` works everywhere ---- */

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self::Anyhow(e.into())
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        Self::Encoding(e.into())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Anyhow(e.into())
    }
}

#[derive(Serialize)]
struct ErrBody {
    error: String,
}

fn json_err(code: StatusCode, msg: &str) -> axum::response::Response {
    (
        code,
        Json(ErrBody {
            error: msg.to_string(),
        }),
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::Status(code) => code.into_response(), // empty body
            Self::Msg(code, msg) => json_err(code, &msg),
            Self::Validation(msg) => json_err(StatusCode::UNPROCESSABLE_ENTITY, &msg),
            Self::Encoding(err) => {
                tracing::error!("image encoding failed: {:#}", err);
                json_err(StatusCode::BAD_REQUEST, ENCODING_FAILED_MSG)
            }
            Self::Generation(err) => {
                tracing::error!("recipe generation failed: {:#}", err);
                json_err(StatusCode::BAD_GATEWAY, GENERATION_FAILED_MSG)
            }
            Self::Anyhow(err) => {
                tracing::error!("{:#}", err);
                json_err(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
