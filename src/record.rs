use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Common,
    Rare,
    Endangered,
}

impl Category {
    /// Parse a category label, accepting the Portuguese spreadsheet labels.
    /// Unknown labels fall back to `Common`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "" | "common" | "comum" => Category::Common,
            "rare" | "rara" | "raro" => Category::Rare,
            "endangered" | "ameaçada" | "ameacada" | "em perigo" => Category::Endangered,
            other => {
                warn!("Unknown bird category {:?}, defaulting to common", other);
                Category::Common
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Common => "common",
            Category::Rare => "rare",
            Category::Endangered => "endangered",
        };
        f.write_str(label)
    }
}

/// A catalog entry. Absent optional fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bird {
    pub id: u64,
    pub name: String,
    pub scientific_name: String,
    pub family: Option<String>,
    pub habitat: Option<String>,
    pub diet: Option<String>,
    pub conservation_status: Option<String>,
    pub description: Option<String>,
    pub wikipedia_url: Option<String>,
    pub image_url: Option<String>,
    pub category: Category,
}

/// Creation payload for a bird; the store assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBird {
    pub name: String,
    pub scientific_name: String,
    pub family: Option<String>,
    pub habitat: Option<String>,
    pub diet: Option<String>,
    pub conservation_status: Option<String>,
    pub description: Option<String>,
    pub wikipedia_url: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<Category>,
}

impl NewBird {
    pub fn new(name: &str, scientific_name: &str) -> Self {
        Self {
            name: name.to_string(),
            scientific_name: scientific_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sighting {
    pub id: u64,
    pub user_id: u64,
    pub bird_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirdWithSeenStatus {
    #[serde(flatten)]
    pub bird: Bird,
    pub seen: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SightingRequest {
    pub user_id: u64,
    pub bird_id: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RemovalResponse {
    pub success: bool,
}
