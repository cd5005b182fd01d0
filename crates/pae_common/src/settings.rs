//! Player-facing game settings: difficulty, audience, game mode and map type.
//!
//! String forms match the browser UI (`beginner`, `highSchool`, `challenge`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    /// Points awarded for a correct answer at this difficulty
    pub fn points_multiplier(&self) -> u32 {
        match self {
            Difficulty::Beginner => 1,
            Difficulty::Intermediate => 2,
            Difficulty::Advanced => 3,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!(
                "Unknown difficulty: '{}'. Valid values: beginner, intermediate, advanced",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Audience {
    #[default]
    Elementary,
    HighSchool,
    Undergraduate,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Elementary => "elementary",
            Audience::HighSchool => "highSchool",
            Audience::Undergraduate => "undergraduate",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Audience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "elementary" => Ok(Audience::Elementary),
            "highschool" => Ok(Audience::HighSchool),
            "undergraduate" => Ok(Audience::Undergraduate),
            other => Err(format!(
                "Unknown audience: '{}'. Valid values: elementary, highSchool, undergraduate",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Tutorial,
    #[default]
    Challenge,
    Explore,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Tutorial => "tutorial",
            GameMode::Challenge => "challenge",
            GameMode::Explore => "explore",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tutorial" => Ok(GameMode::Tutorial),
            "challenge" => Ok(GameMode::Challenge),
            "explore" => Ok(GameMode::Explore),
            other => Err(format!(
                "Unknown game mode: '{}'. Valid values: tutorial, challenge, explore",
                other
            )),
        }
    }
}

/// Which PAE map of a protein to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapType {
    #[default]
    Full,
    Domain,
    Interface,
}

impl MapType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MapType::Full => "full",
            MapType::Domain => "domain",
            MapType::Interface => "interface",
        }
    }
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MapType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(MapType::Full),
            "domain" => Ok(MapType::Domain),
            "interface" => Ok(MapType::Interface),
            other => Err(format!(
                "Unknown map type: '{}'. Valid values: full, domain, interface",
                other
            )),
        }
    }
}
