use base64::{Engine as _, engine::general_purpose::STANDARD as B64};

use crate::models::StoredImage;

/// Base64-encoded image content plus its declared media type. Lives only for
/// the duration of one generation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePayload {
    pub media_type: String,
    pub data: String,
}

impl ImagePayload {
    #[must_use]
    pub fn from_bytes(media_type: &str, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.to_string(),
            data: B64.encode(bytes),
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` URL, stripping the scheme and
    /// media-type prefix so only the payload encoding remains.
    ///
    /// # Errors
    ///
    /// Returns Err if the string is not a base64 data URL or the payload is
    /// not valid base64.
    pub fn from_data_url(s: &str) -> anyhow::Result<Self> {
        let rest = s
            .strip_prefix("data:")
            .ok_or_else(|| anyhow::anyhow!("not a data URL"))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("data URL has no payload separator"))?;
        let media_type = meta
            .strip_suffix(";base64")
            .ok_or_else(|| anyhow::anyhow!("data URL is not base64-encoded"))?;
        if media_type.is_empty() {
            anyhow::bail!("data URL declares no media type");
        }

        // Re-encode after decoding so the payload we ship is known-valid
        // canonical base64.
        let bytes = B64
            .decode(payload.trim())
            .map_err(|e| anyhow::anyhow!("invalid base64 payload: {e}"))?;

        Ok(Self::from_bytes(media_type, &bytes))
    }

    /// Data-URL form, as the chat API expects inline image parts.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Encode every stored image concurrently, joining in input order. Encoding
/// is CPU work, so each image goes through `spawn_blocking`.
///
/// # Errors
///
/// Returns Err if any encode task fails to join.
pub async fn encode_all(images: &[StoredImage]) -> anyhow::Result<Vec<ImagePayload>> {
    let tasks = images.iter().map(|img| {
        let media_type = img.media_type.clone();
        let bytes = img.bytes.clone();
        tokio::task::spawn_blocking(move || ImagePayload::from_bytes(&media_type, &bytes))
    });
    let payloads = futures::future::try_join_all(tasks).await?;
    Ok(payloads)
}
