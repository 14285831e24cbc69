use serde::{Deserialize, Serialize};
use std::fmt;

/// Posture labels (wire names match the snapshot format)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostureLabel {
    #[serde(rename = "goede_houding")]
    Good,
    #[serde(rename = "slechte_houding")]
    Bad,
}

impl PostureLabel {
    pub const ALL: [PostureLabel; 2] = [PostureLabel::Good, PostureLabel::Bad];

    /// Label string handed to the classifier engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            PostureLabel::Good => "goede_houding",
            PostureLabel::Bad => "slechte_houding",
        }
    }

    pub fn from_wire(label: &str) -> Option<Self> {
        match label {
            "goede_houding" => Some(PostureLabel::Good),
            "slechte_houding" => Some(PostureLabel::Bad),
            _ => None,
        }
    }

    pub fn friendly_name(&self) -> &'static str {
        match self {
            PostureLabel::Good => "good posture",
            PostureLabel::Bad => "bad posture",
        }
    }
}

impl fmt::Display for PostureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
