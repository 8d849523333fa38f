use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Root of the portable entity graph; owns all other exported entities
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: i64,
    /// Human-chosen unique slug, lower case latin characters, digits and
    /// underscores
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_login: String,
    #[serde(default)]
    pub guest_logins: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(key: impl Into<String>, name: impl Into<String>, owner_login: impl Into<String>) -> Self {
        Self {
            id: 0,
            key: key.into(),
            name: name.into(),
            description: None,
            owner_login: owner_login.into(),
            guest_logins: Vec::new(),
            created_at: Utc::now(),
        }
    }
}
