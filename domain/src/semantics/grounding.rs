//! Grounding enums for ICM (Interactive Communication Management) moves.
//!
//! Larsson (2002) models grounding feedback along four action levels with a
//! polarity. The wire codes (`per`, `und`, `acc`, `rea` / `pos`, `neg`,
//! `int`) combine into ICM signatures such as `per*neg` ("Pardon?") or
//! `und*int` ("Paris, is that correct?").

use serde::{Deserialize, Serialize};

/// Action level of an ICM move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionLevel {
    /// Did I hear it?
    #[serde(rename = "per")]
    Perception,
    /// Did I understand it?
    #[serde(rename = "und")]
    Understanding,
    /// Do I accept it?
    #[serde(rename = "acc")]
    Acceptance,
    /// Did I act on it?
    #[serde(rename = "rea")]
    Reaction,
}

impl ActionLevel {
    /// Returns the canonical wire code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionLevel::Perception => "per",
            ActionLevel::Understanding => "und",
            ActionLevel::Acceptance => "acc",
            ActionLevel::Reaction => "rea",
        }
    }
}

impl std::str::FromStr for ActionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per" | "perception" => Ok(ActionLevel::Perception),
            "und" | "understanding" => Ok(ActionLevel::Understanding),
            "acc" | "acceptance" => Ok(ActionLevel::Acceptance),
            "rea" | "reaction" => Ok(ActionLevel::Reaction),
            _ => Err(format!("Invalid ActionLevel: {}", s)),
        }
    }
}

impl std::fmt::Display for ActionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Polarity of a dialogue move or answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    #[serde(rename = "pos")]
    Positive,
    #[serde(rename = "neg")]
    Negative,
    #[serde(rename = "int")]
    Interrogative,
}

impl Polarity {
    /// Returns the canonical wire code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Positive => "pos",
            Polarity::Negative => "neg",
            Polarity::Interrogative => "int",
        }
    }
}

impl std::str::FromStr for Polarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pos" | "positive" => Ok(Polarity::Positive),
            "neg" | "negative" => Ok(Polarity::Negative),
            "int" | "interrogative" => Ok(Polarity::Interrogative),
            _ => Err(format!("Invalid Polarity: {}", s)),
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_level_wire_codes() {
        assert_eq!(ActionLevel::Perception.as_str(), "per");
        assert_eq!(ActionLevel::Understanding.as_str(), "und");
        assert_eq!(ActionLevel::Acceptance.as_str(), "acc");
        assert_eq!(ActionLevel::Reaction.as_str(), "rea");
    }

    #[test]
    fn test_action_level_from_str() {
        assert_eq!("per".parse::<ActionLevel>().unwrap(), ActionLevel::Perception);
        assert_eq!(
            "understanding".parse::<ActionLevel>().unwrap(),
            ActionLevel::Understanding
        );
        assert!("foo".parse::<ActionLevel>().is_err());
    }

    #[test]
    fn test_polarity_wire_codes() {
        assert_eq!(Polarity::Positive.as_str(), "pos");
        assert_eq!(Polarity::Negative.as_str(), "neg");
        assert_eq!(Polarity::Interrogative.as_str(), "int");
    }

    #[test]
    fn test_serde_roundtrip() {
        for level in [
            ActionLevel::Perception,
            ActionLevel::Understanding,
            ActionLevel::Acceptance,
            ActionLevel::Reaction,
        ] {
            let json = serde_json::to_string(&level).unwrap();
            let back: ActionLevel = serde_json::from_str(&json).unwrap();
            assert_eq!(level, back);
        }
        let json = serde_json::to_string(&Polarity::Interrogative).unwrap();
        assert_eq!(json, "\"int\"");
    }
}
