use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog entry for a nail design. Owned by the storage collaborator; the
/// try-on pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub design_type: Option<String>,
    #[serde(default)]
    pub occasion: Option<String>,
    #[serde(default)]
    pub length: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    /// Name of the reference image inside the image store.
    pub image_path: String,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
    #[serde(default)]
    pub popularity: i64,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub salon_name: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Design {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        image_path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            colors: Vec::new(),
            design_type: None,
            occasion: None,
            length: None,
            material: None,
            image_path: image_path.into(),
            thumbnail_path: None,
            popularity: 0,
            created_by: None,
            salon_name: None,
            created_at: Utc::now(),
        }
    }
}
