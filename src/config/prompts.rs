//! Prompt templates for Smak.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    pub recipe: RecipePrompts,
}


/// Prompts for RAG answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// System instruction; `{{context}}` is replaced with the retrieved chunks.
    pub system: String,
    /// User message; `{{question}}` is replaced with the caller's prompt.
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: "Answer the user's question using only the sources below:\n\n{{context}}"
                .to_string(),
            user: "{{question}}".to_string(),
        }
    }
}

/// The built-in recipe extraction prompt, used when a caller supplies a link
/// but no prompt of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipePrompts {
    pub extraction: String,
}

impl Default for RecipePrompts {
    fn default() -> Self {
        Self {
            extraction: r#"Extract the complete recipe from this cooking video with the following requirements:

- Recipe Title: Use the official name of the dish.
- Author Credit: Mention the channel or creator's name if stated.
- Recipe Description: A short, engaging description of the dish, including flavors and origins if mentioned.

- Ingredients Table:
  A structured table with these columns:
  - Ingredient Name
  - Quantity (as shown in the video)
  - Quantity converted to metric (EU standard measurements)

- Preparation and Cooking Details:
  - List all marination, soaking, or pre-cooking preparation steps clearly.
  - Separate sections for marination time, cooking time, and preparation time where applicable.
  - Full step-by-step instructions, including cooking methods, temperature settings
    (both Celsius and Fahrenheit if mentioned), timing for each step, and resting or cooling times.

- Tips and Tricks:
  Summarize any tips, tricks, or chef's secrets shared during the video.

- Additional Important Information:
  Alternative ingredient options, warnings about common mistakes, special tools needed,
  and serving or storage suggestions.

The final result should read like a friendly, complete, cookbook-quality recipe that is
detailed enough for beginners but polished enough for experienced cooks. Format the
answer as clean Markdown."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from defaults, with optional overrides from a custom directory.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }

            let recipe_path = custom_path.join("recipe.toml");
            if recipe_path.exists() {
                let content = std::fs::read_to_string(&recipe_path)?;
                prompts.recipe = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.rag.system.contains("{{context}}"));
        assert!(prompts.rag.user.contains("{{question}}"));
        assert!(!prompts.recipe.extraction.is_empty());
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }
}
