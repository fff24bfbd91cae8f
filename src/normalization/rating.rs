use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Brazilian advisory classification stored on each game.
///
/// Product pages do not expose a machine-readable classification, so
/// enrichment always assigns [`AgeRating::PLACEHOLDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeRating {
    #[serde(rename = "BR0")]
    Br0,
    #[serde(rename = "BR10")]
    Br10,
    #[serde(rename = "BR12")]
    Br12,
    #[serde(rename = "BR14")]
    Br14,
    #[serde(rename = "BR16")]
    Br16,
    #[serde(rename = "BR18")]
    Br18,
}

impl AgeRating {
    pub const PLACEHOLDER: AgeRating = AgeRating::Br0;

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRating::Br0 => "BR0",
            AgeRating::Br10 => "BR10",
            AgeRating::Br12 => "BR12",
            AgeRating::Br14 => "BR14",
            AgeRating::Br16 => "BR16",
            AgeRating::Br18 => "BR18",
        }
    }
}

impl fmt::Display for AgeRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeRating {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BR0" | "L" => Ok(AgeRating::Br0),
            "BR10" => Ok(AgeRating::Br10),
            "BR12" => Ok(AgeRating::Br12),
            "BR14" => Ok(AgeRating::Br14),
            "BR16" => Ok(AgeRating::Br16),
            "BR18" => Ok(AgeRating::Br18),
            other => Err(anyhow::anyhow!("unknown age rating {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_br0() {
        assert_eq!(AgeRating::PLACEHOLDER.to_string(), "BR0");
    }

    #[test]
    fn parses_stored_values() {
        assert_eq!("br16".parse::<AgeRating>().unwrap(), AgeRating::Br16);
        assert_eq!("L".parse::<AgeRating>().unwrap(), AgeRating::Br0);
        assert!("PG-13".parse::<AgeRating>().is_err());
    }

    #[test]
    fn serializes_as_classification_code() {
        let json = serde_json::to_string(&AgeRating::Br18).unwrap();
        assert_eq!(json, "\"BR18\"");
    }
}
