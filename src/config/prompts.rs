//! Prompt templates for Kilde.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub grounding: GroundingPrompts,
}


/// Prompts for grounded answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundingPrompts {
    pub system: String,
    pub user: String,
}

impl Default for GroundingPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an assistant answering questions based only on the given context.

Guidelines:
- Use only the supplied context; never draw on outside knowledge
- If the context does not contain the answer, say so in the answer field
- Report a confidence score from 0 to 100 reflecting how well the context supports your answer
- Respond with a single JSON object and nothing else"#
                .to_string(),

            user: r#"Context:
{{context}}

Question:
{{question}}

Respond ONLY in this format:
{"answer": "your answer here", "confidence": 87}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with an optional custom directory.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let grounding_path = custom_path.join("grounding.toml");
            if grounding_path.exists() {
                let content = std::fs::read_to_string(&grounding_path)?;
                prompts.grounding = toml::from_str(&content)?;
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
        assert!(!prompts.grounding.system.is_empty());
        assert!(prompts.grounding.user.contains("{{context}}"));
        assert!(prompts.grounding.user.contains("{{question}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Context:\n{{context}}\n\nQuestion:\n{{question}}";
        let mut vars = std::collections::HashMap::new();
        vars.insert("context".to_string(), "Paris is in France.".to_string(),);
        vars.insert("question".to_string(), "Where is Paris?".to_string());

        let result = Prompts::render(template, &vars);
        assert!(result.contains("Paris is in France."));
        assert!(!result.contains("{{"));
    }
}
