use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// The only legacy transformation that carried a parameter.
const PARAMETERIZED_LEGACY_FILTER: &str = "brightness";

/// Image metadata as stored.
///
/// `user_id` is a plain id reference to the owning user: nothing cascades when that user
/// goes away. `transformations` is the pre-migration representation of the applied filter
/// and is empty for every record written by the current code.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ImageEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub original_filename: String,
    pub original_path: String,
    pub processed_path: String,
    pub filter_name: Option<String>,
    pub filter_value: Option<String>,
    pub transformations: Vec<String>,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ImageEntity {
    pub fn is_owned_by(&self, user_id: &Uuid) -> bool {
        self.user_id == *user_id
    }

    pub fn has_legacy_transformations(&self) -> bool {
        self.filter_name.is_none() && !self.transformations.is_empty()
    }

    pub fn resolved_filter_name(&self) -> Option<String> {
        self.filter_name.clone().or_else(|| legacy_filter(&self.transformations).0)
    }

    pub fn resolved_filter_value(&self) -> Option<String> {
        self.filter_value.clone().or_else(|| legacy_filter(&self.transformations).1)
    }
}

/// Maps a legacy `transformations` list onto `(filter_name, filter_value)`.
///
/// The first entry is the filter name. A value is only carried for `brightness`, and only
/// when the second entry parses as a finite number.
pub fn legacy_filter(transformations: &[String]) -> (Option<String>, Option<String>) {
    let Some(name) = transformations.first() else {
        return (None, None);
    };

    let value = match transformations.get(1) {
        Some(raw) if name == PARAMETERIZED_LEGACY_FILTER => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|_| raw.trim().to_string()),
        _ => None,
    };

    (Some(name.clone()), value)
}
