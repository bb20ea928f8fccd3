// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tabled::Tabled;

fn format_confidence(confidence: &f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

#[derive(Clone, Debug, Deserialize, Tabled)]
pub(crate) struct Prediction {
    #[tabled(rename = "Disease")]
    pub(crate) disease_name: String,
    #[tabled(rename = "Confidence", display_with = "format_confidence")]
    pub(crate) confidence_score: f64,
    #[tabled(rename = "Crop")]
    pub(crate) crop_type: String,
    #[tabled(skip)]
    #[serde(default)]
    pub(crate) advisory: serde_json::Map<String, serde_json::Value>,
}

/// A stored diagnosis. History listings carry the raw document identifier,
/// hence the alias.
#[derive(Clone, Debug, Deserialize, Tabled)]
pub(crate) struct Diagnosis {
    #[tabled(rename = "ID")]
    #[serde(alias = "_id")]
    pub(crate) id: String,
    #[tabled(rename = "Crop")]
    pub(crate) crop_type: String,
    #[tabled(rename = "Disease")]
    pub(crate) predicted_disease: String,
    #[tabled(rename = "Confidence", display_with = "format_confidence")]
    pub(crate) confidence_score: f64,
    #[tabled(rename = "Image")]
    #[serde(default)]
    pub(crate) image_url: String,
    #[tabled(rename = "Diagnosed")]
    #[serde(with = "super::timestamp")]
    pub(crate) created_at: DateTime<Utc>,
    #[tabled(skip)]
    #[serde(default)]
    pub(crate) advisory: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct SupportedCrops {
    pub(crate) crops: Vec<String>,
}

#[cfg(test)]
mod tests {
    use crate::error::Result;

    use super::*;

    #[test]
    fn history_documents_use_raw_identifier() -> Result<()> {
        let diagnosis: Diagnosis = serde_json::from_value(serde_json::json!({
            "_id": "66aa01",
            "user_id": "665b1c",
            "crop_type": "tomato",
            "image_path": "uploads/images/a.jpg",
            "image_url": "/uploads/images/a.jpg",
            "predicted_disease": "Early blight",
            "confidence_score": 0.87,
            "advisory": null,
            "created_at": "2024-06-02T10:15:00"
        }))?;

        assert_eq!(diagnosis.id, "66aa01");
        assert_eq!(diagnosis.predicted_disease, "Early blight");
        assert!(diagnosis.advisory.is_none());
        Ok(())
    }

    #[test]
    fn confidence_is_shown_as_percentage() {
        assert_eq!(format_confidence(&0.876), "87.6%");
    }
}
