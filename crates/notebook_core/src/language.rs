use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language the platform can route a cell to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Sql,
    R,
    Scala,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Sql => "sql",
            Language::R => "r",
            Language::Scala => "scala",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notebook records carry the declared language as loosely-typed text, so an
/// unknown value has to surface as a dispatch failure rather than be
/// unrepresentable.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" => Ok(Language::Python),
            "sql" => Ok(Language::Sql),
            "r" => Ok(Language::R),
            "scala" => Ok(Language::Scala),
            _ => Err(UnsupportedLanguage(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_languages_case_insensitively() {
        assert_eq!("python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("SCALA".parse::<Language>().unwrap(), Language::Scala);
    }

    #[test]
    fn unknown_language_keeps_the_offending_name() {
        let err = "julia".parse::<Language>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported language: julia");
    }
}
