use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Proficiency tier, labelled by TOEIC score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    #[default]
    #[serde(rename = "400")]
    Toeic400,
    #[serde(rename = "600")]
    Toeic600,
    #[serde(rename = "800")]
    Toeic800,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toeic400 => "400",
            Self::Toeic600 => "600",
            Self::Toeic800 => "800",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "400" => Ok(Self::Toeic400),
            "600" => Ok(Self::Toeic600),
            "800" => Ok(Self::Toeic800),
            other => bail!("Unknown level '{other}' (expected 400, 600 or 800)"),
        }
    }
}

/// Identifier of a reply backend, passed through to the server untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub const ANTHROPIC: &'static str = "anthropic";
    pub const AZURE_OPENAI: &'static str = "azure_openai";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable name for notices. Unknown ids are shown as-is.
    pub fn display_name(&self) -> &str {
        match self.0.as_str() {
            Self::ANTHROPIC => "Claude (Anthropic)",
            Self::AZURE_OPENAI => "GPT (Azure OpenAI)",
            other => other,
        }
    }
}

impl Default for ProviderId {
    fn default() -> Self {
        Self::new(Self::ANTHROPIC)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-memory session settings, changed only by explicit user action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub level: Level,
    pub provider: ProviderId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Anything other than "dark" falls back to light.
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim() == "dark" { Self::Dark } else { Self::Light }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parses_known_tiers() {
        assert_eq!("400".parse::<Level>().unwrap(), Level::Toeic400);
        assert_eq!(" 800 ".parse::<Level>().unwrap(), Level::Toeic800);
        assert!("900".parse::<Level>().is_err());
    }

    #[test]
    fn level_serializes_as_score_string() {
        assert_eq!(serde_json::to_string(&Level::Toeic600).unwrap(), "\"600\"");
        let parsed: Level = serde_json::from_str("\"800\"").unwrap();
        assert_eq!(parsed, Level::Toeic800);
    }

    #[test]
    fn provider_display_names() {
        assert_eq!(ProviderId::default().display_name(), "Claude (Anthropic)");
        assert_eq!(
            ProviderId::new("azure_openai").display_name(),
            "GPT (Azure OpenAI)"
        );
        assert_eq!(ProviderId::new("local").display_name(), "local");
    }

    #[test]
    fn theme_toggle_and_parse() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::parse_lenient("dark\n"), Theme::Dark);
        assert_eq!(Theme::parse_lenient("garbage"), Theme::Light);
    }
}
