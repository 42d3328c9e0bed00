//! Prompt template for the generative language backend.

use super::GenerationKind;

/// Response format the model is asked to follow, verbatim.
const RESPONSE_FORMAT: &str = r#"{
  "title": "Recipe Name",
  "description": "Brief description of the dish",
  "cookingTime": "30 minutes",
  "servings": 4,
  "difficulty": "Easy",
  "ingredients": ["ingredient 1 with measurement", "ingredient 2 with measurement"],
  "instructions": ["Step 1 instruction", "Step 2 instruction"]
}"#;

/// Render the recipe prompt for a request.
pub fn render_recipe_prompt(kind: GenerationKind, input: &str) -> String {
    let task = match kind {
        GenerationKind::Ingredients => format!(
            "Create a recipe using these ingredients: {input}. Use them as the main components of the dish."
        ),
        GenerationKind::Dish => format!(
            "Create a traditional recipe for: {input}. Provide a complete recipe with ingredients and instructions."
        ),
    };

    format!(
        r#"{task}

Respond with ONLY a valid JSON object in this exact format:
{RESPONSE_FORMAT}

The "difficulty" must be one of "Easy", "Medium" or "Hard".
No markdown formatting, no additional text, just the JSON object."#
    )
}

/// One-word prompt used to check the API key works.
pub const CONNECTION_TEST_PROMPT: &str = "Say 'Hello' in one word.";
