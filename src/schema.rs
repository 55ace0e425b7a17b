use serde_json::{Value as JsonValue, json};

/// JSON schema the model's reply must conform to. Mirrors [`crate::models::Recipe`]
/// exactly: same wire names, same types, everything required.
#[must_use]
pub fn recipe_schema() -> JsonValue {
    json!({
        "type": "object",
        "properties": {
            "recipeName":  { "type": "string", "description": "Creative name of the recipe." },
            "description": { "type": "string", "description": "A short, enticing description of the dish." },
            "prepTime":    { "type": "string", "description": "Estimated preparation time, e.g. \"15 minutes\"." },
            "cookTime":    { "type": "string", "description": "Estimated cooking time, e.g. \"30 minutes\"." },
            "servings":    { "type": "string", "description": "Number of servings the recipe makes, e.g. \"4 servings\"." },
            "ingredients": {
                "type": "object",
                "properties": {
                    "provided": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Ingredients identified from the user's images."
                    },
                    "shoppingList": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Additional ingredients needed to complete the recipe. Empty array if none."
                    }
                },
                "required": ["provided", "shoppingList"]
            },
            "instructions": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Step-by-step cooking instructions, in execution order."
            },
            "mealPrep": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Suggestions for preparing parts of the meal in advance."
            }
        },
        "required": [
            "recipeName", "description", "prepTime", "cookTime",
            "servings", "ingredients", "instructions", "mealPrep"
        ]
    })
}

/// `response_format` body constraining an OpenAI-compatible endpoint to emit
/// structured JSON matching [`recipe_schema`] instead of free text.
#[must_use]
pub fn recipe_response_format() -> JsonValue {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "recipe",
            "strict": true,
            "schema": recipe_schema()
        }
    })
}
