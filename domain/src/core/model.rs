//! Model value object representing an LLM model

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// LLM models the assistant can talk to (Value Object)
///
/// Known variants drive provider routing by model family; anything else is
/// carried verbatim as [`Model::Custom`] so local or self-hosted models
/// (vLLM, Ollama) can be named in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    // Claude models
    ClaudeOpus45,
    ClaudeSonnet45,
    ClaudeHaiku45,
    ClaudeSonnet4,
    // GPT models
    Gpt5,
    Gpt5Mini,
    Gpt41,
    Gpt41Mini,
    // Custom
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::ClaudeOpus45 => "claude-opus-4-5",
            Model::ClaudeSonnet45 => "claude-sonnet-4-5",
            Model::ClaudeHaiku45 => "claude-haiku-4-5",
            Model::ClaudeSonnet4 => "claude-sonnet-4-0",
            Model::Gpt5 => "gpt-5",
            Model::Gpt5Mini => "gpt-5-mini",
            Model::Gpt41 => "gpt-4.1",
            Model::Gpt41Mini => "gpt-4.1-mini",
            Model::Custom(s) => s,
        }
    }

    /// Check if this is a Claude model
    pub fn is_claude(&self) -> bool {
        match self {
            Model::ClaudeOpus45
            | Model::ClaudeSonnet45
            | Model::ClaudeHaiku45
            | Model::ClaudeSonnet4 => true,
            Model::Custom(s) => s.starts_with("claude-"),
            _ => false,
        }
    }

    /// Check if this is a GPT model
    pub fn is_gpt(&self) -> bool {
        match self {
            Model::Gpt5 | Model::Gpt5Mini | Model::Gpt41 | Model::Gpt41Mini => true,
            Model::Custom(s) => s.starts_with("gpt-") || s.starts_with("o3") || s.starts_with("o4"),
            _ => false,
        }
    }
}

impl Default for Model {
    /// Returns the default model (Claude Sonnet 4.5)
    fn default() -> Self {
        Model::ClaudeSonnet45
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim() {
            "claude-opus-4-5" | "claude-opus-4.5" => Model::ClaudeOpus45,
            "claude-sonnet-4-5" | "claude-sonnet-4.5" => Model::ClaudeSonnet45,
            "claude-haiku-4-5" | "claude-haiku-4.5" => Model::ClaudeHaiku45,
            "claude-sonnet-4-0" | "claude-sonnet-4" => Model::ClaudeSonnet4,
            "gpt-5" => Model::Gpt5,
            "gpt-5-mini" => Model::Gpt5Mini,
            "gpt-4.1" => Model::Gpt41,
            "gpt-4.1-mini" => Model::Gpt41Mini,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(model) = s.parse::<Model>();
        Ok(model)
    }
}
