use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::{
    encode::ImagePayload,
    llm::{ImageChatRequest, LlmClient},
    models::Recipe,
    schema::recipe_response_format,
};

const SYSTEM_PROMPT: &str = "You are an expert chef and creative meal planner. \
    Based on the provided image(s) of ingredients and the user's preferences, \
    create a delicious and unique recipe. \
    You MUST return your response as a single, valid JSON object that adheres \
    to the provided schema. Do not include any text, markdown formatting, or \
    code fences outside of the JSON object.";

const DEFAULT_PREFERENCE: &str = "None specified. Feel free to be creative!";

const GENERATION_TEMPERATURE: f32 = 0.7;
const GENERATION_MAX_TOKENS: u32 = 5000;

/// Instruction block sent as the user message, alongside the image parts.
/// Embeds the preference string verbatim and enumerates the eight required
/// sub-tasks.
#[must_use]
pub fn build_prompt(preferences: &str) -> String {
    let preferences = if preferences.trim().is_empty() {
        DEFAULT_PREFERENCE
    } else {
        preferences
    };

    format!(
        "User preferences: \"{preferences}\"\n\n\
         Your task is to:\n\
         1. Identify all the edible ingredients visible in the image(s).\n\
         2. Create a unique and appealing recipe name.\n\
         3. Write a short, enticing description of the dish.\n\
         4. Estimate prep time, cook time, and the number of servings.\n\
         5. List the ingredients you identified in the images.\n\
         6. Create a shopping list of any *additional* ingredients required for \
         the recipe. If no other ingredients are needed, this must be an empty array.\n\
         7. Provide clear, step-by-step cooking instructions.\n\
         8. Provide helpful meal prep suggestions to save time later \
         (e.g., \"chop all vegetables beforehand\", \"make the sauce a day ahead\").\n\n\
         Return exactly one JSON object conforming to the response schema, \
         with no surrounding text."
    )
}

/// Seam around the external model so the pipeline can be driven by a canned
/// backend in tests. [`LlmClient`] is the only production implementation.
pub trait ChatBackend {
    fn chat(
        &self,
        http: &reqwest::Client,
        req: ImageChatRequest<'_>,
    ) -> impl Future<Output = anyhow::Result<JsonValue>> + Send;
}

impl ChatBackend for LlmClient {
    async fn chat(
        &self,
        http: &reqwest::Client,
        req: ImageChatRequest<'_>,
    ) -> anyhow::Result<JsonValue> {
        self.chat_json_images(http, req).await
    }
}

/// Assert the parsed reply has the full recipe shape. Any missing required
/// field fails deserialization; a blank recipe name is rejected too.
///
/// # Errors
///
/// Will return err if the value does not conform to the recipe shape.
pub fn decode_recipe(v: JsonValue) -> anyhow::Result<Recipe> {
    let recipe: Recipe =
        serde_json::from_value(v).map_err(|e| anyhow::anyhow!("malformed recipe: {e}"))?;
    if recipe.recipe_name.trim().is_empty() {
        anyhow::bail!("malformed recipe: recipeName is empty");
    }
    Ok(recipe)
}

/// Run one generation: build the prompt, send it with every image payload
/// attached inline and the recipe schema as the response format, then decode
/// the reply into a [`Recipe`]. One outbound call, no retry, no caching.
///
/// # Errors
///
/// Will return err if the call fails or the reply does not conform to the
/// recipe shape. Callers must ensure `images` is non-empty.
pub async fn generate_recipe<B: ChatBackend>(
    backend: &B,
    http: &reqwest::Client,
    images: &[ImagePayload],
    preferences: &str,
    timeout: Duration,
) -> anyhow::Result<Recipe> {
    let prompt = build_prompt(preferences);

    let reply = backend
        .chat(
            http,
            ImageChatRequest {
                system: SYSTEM_PROMPT,
                text_prompt: &prompt,
                images,
                response_format: recipe_response_format(),
                temperature: GENERATION_TEMPERATURE,
                timeout,
                max_tokens: Some(GENERATION_MAX_TOKENS),
            },
        )
        .await?;

    decode_recipe(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_recipe_json() -> JsonValue {
        json!({
            "recipeName": "Rustic Egg Galette",
            "description": "A quick galette from pantry staples.",
            "prepTime": "15 minutes",
            "cookTime": "30 minutes",
            "servings": "4 servings",
            "ingredients": {
                "provided": ["eggs", "flour"],
                "shoppingList": ["butter"]
            },
            "instructions": ["Mix the dough.", "Bake until golden."],
            "mealPrep": ["Make the dough a day ahead."]
        })
    }

    #[test]
    fn prompt_embeds_preference_verbatim() {
        let p = build_prompt("vegan, gluten-free, quick 30-min meal");
        assert!(p.contains("\"vegan, gluten-free, quick 30-min meal\""));
    }

    #[test]
    fn prompt_defaults_when_preference_empty() {
        for empty in ["", "   "] {
            let p = build_prompt(empty);
            assert!(p.contains(DEFAULT_PREFERENCE));
        }
    }

    #[test]
    fn prompt_enumerates_eight_tasks() {
        let p = build_prompt("");
        for n in 1..=8 {
            assert!(p.contains(&format!("{n}. ")), "missing task {n}");
        }
        assert!(p.contains("empty array"));
    }

    #[test]
    fn decode_accepts_full_recipe() {
        let r = decode_recipe(full_recipe_json()).unwrap();
        assert_eq!(r.recipe_name, "Rustic Egg Galette");
        assert_eq!(r.ingredients.provided, ["eggs", "flour"]);
        assert_eq!(r.instructions.len(), 2);
    }

    #[test]
    fn decode_accepts_empty_shopping_list() {
        let mut v = full_recipe_json();
        v["ingredients"]["shoppingList"] = json!([]);
        let r = decode_recipe(v).unwrap();
        assert!(r.ingredients.shopping_list.is_empty());
    }

    #[test]
    fn decode_rejects_any_missing_required_field() {
        for field in [
            "recipeName",
            "description",
            "prepTime",
            "cookTime",
            "servings",
            "ingredients",
            "instructions",
            "mealPrep",
        ] {
            let mut v = full_recipe_json();
            v.as_object_mut().unwrap().remove(field);
            assert!(decode_recipe(v).is_err(), "accepted recipe without {field}");
        }
        let mut v = full_recipe_json();
        v["ingredients"].as_object_mut().unwrap().remove("shoppingList");
        assert!(decode_recipe(v).is_err());
    }

    #[test]
    fn decode_rejects_blank_name() {
        let mut v = full_recipe_json();
        v["recipeName"] = json!("   ");
        assert!(decode_recipe(v).is_err());
    }

    struct CannedBackend {
        reply: JsonValue,
    }

    impl ChatBackend for CannedBackend {
        async fn chat(
            &self,
            _http: &reqwest::Client,
            req: ImageChatRequest<'_>,
        ) -> anyhow::Result<JsonValue> {
            assert!(!req.images.is_empty());
            assert_eq!(req.response_format["type"], "json_schema");
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn generate_decodes_canned_reply() {
        let backend = CannedBackend {
            reply: full_recipe_json(),
        };
        let http = reqwest::Client::new();
        let images = vec![ImagePayload::from_bytes("image/png", b"fake")];
        let recipe =
            generate_recipe(&backend, &http, &images, "quick dessert", Duration::from_secs(5))
                .await
                .unwrap();
        assert_eq!(recipe.servings, "4 servings");
    }

    #[tokio::test]
    async fn generate_fails_on_partial_reply() {
        let mut reply = full_recipe_json();
        reply.as_object_mut().unwrap().remove("mealPrep");
        let backend = CannedBackend { reply };
        let http = reqwest::Client::new();
        let images = vec![ImagePayload::from_bytes("image/png", b"fake")];
        let err = generate_recipe(&backend, &http, &images, "", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("malformed recipe"));
    }
}
