//! Asset metadata for user-uploaded models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an asset, as assigned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a temporary ID for entries the backend has not named yet
    pub fn temporary() -> Self {
        Self(format!("temp-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversion state reported by the backend conversion service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Conversion metadata attached to an asset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionInfo {
    /// Target output format (e.g., "glb")
    #[serde(default)]
    pub target_format: Option<String>,
    #[serde(default)]
    pub status: ConversionStatus,
}

/// Raw asset JSON from the backend
///
/// Older backend versions report the identifier under `fileId` or `modelId`
/// and the display name under `fileName` or `name`. All aliases are accepted
/// and collapsed by [`ModelAsset::from`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelAssetJson {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "fileId")]
    pub file_id: Option<String>,
    #[serde(default, rename = "modelId")]
    pub model_id: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, rename = "fileName")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "previewImage")]
    pub preview_image: Option<String>,
    #[serde(default)]
    pub conversion: Option<ConversionInfo>,
    #[serde(default, rename = "uploadDate")]
    pub upload_date: Option<DateTime<Utc>>,
}

/// A user-owned uploaded model, normalized for UI consumption
#[derive(Debug, Clone)]
pub struct ModelAsset {
    pub id: AssetId,
    pub name: String,
    pub preview_image: Option<String>,
    pub conversion: Option<ConversionInfo>,
    pub upload_date: Option<DateTime<Utc>>,
}

impl From<ModelAssetJson> for ModelAsset {
    fn from(json: ModelAssetJson) -> Self {
        let id = json
            .id
            .or(json.file_id)
            .or(json.model_id)
            .map(AssetId::new)
            .unwrap_or_else(AssetId::temporary);
        let name = json
            .filename
            .or(json.file_name)
            .or(json.name)
            .unwrap_or_else(|| id.to_string());
        Self {
            id,
            name,
            preview_image: json.preview_image,
            conversion: json.conversion,
            upload_date: json.upload_date,
        }
    }
}

impl ModelAsset {
    /// Whether this asset is (or converts to) a GLB, for the "GLB only" view
    pub fn is_glb(&self) -> bool {
        if self.name.to_lowercase().ends_with(".glb") {
            return true;
        }
        self.conversion
            .as_ref()
            .and_then(|c| c.target_format.as_deref())
            .map(|f| f.eq_ignore_ascii_case("glb"))
            .unwrap_or(false)
    }
}

/// Metadata sent alongside the binary in a multipart upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_format: Option<String>,
}

/// Running tally for a sequential batch upload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchUploadReport {
    pub succeeded: u32,
    pub failed: u32,
}

impl BatchUploadReport {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> u32 {
        self.succeeded + self.failed
    }

    pub fn summary(&self) -> String {
        format!("{} uploaded, {} failed", self.succeeded, self.failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_alias_precedence() {
        let json = ModelAssetJson {
            file_id: Some("legacy-7".to_string()),
            model_id: Some("older-3".to_string()),
            filename: Some("bridge.glb".to_string()),
            ..Default::default()
        };
        let asset = ModelAsset::from(json);
        assert_eq!(asset.id.as_str(), "legacy-7");
        assert_eq!(asset.name, "bridge.glb");
    }

    #[test]
    fn test_primary_id_wins_over_aliases() {
        let json = ModelAssetJson {
            id: Some("a-1".to_string()),
            file_id: Some("legacy-7".to_string()),
            ..Default::default()
        };
        let asset = ModelAsset::from(json);
        assert_eq!(asset.id.as_str(), "a-1");
    }

    #[test]
    fn test_missing_ids_get_temporary() {
        let asset = ModelAsset::from(ModelAssetJson::default());
        assert!(asset.id.as_str().starts_with("temp-"));
        assert_eq!(asset.name, asset.id.to_string());
    }

    #[test]
    fn test_glb_filter() {
        let direct = ModelAsset::from(ModelAssetJson {
            id: Some("a".to_string()),
            filename: Some("tower.GLB".to_string()),
            ..Default::default()
        });
        assert!(direct.is_glb());

        let converted = ModelAsset::from(ModelAssetJson {
            id: Some("b".to_string()),
            filename: Some("tower.fbx".to_string()),
            conversion: Some(ConversionInfo {
                target_format: Some("glb".to_string()),
                status: ConversionStatus::Completed,
            }),
            ..Default::default()
        });
        assert!(converted.is_glb());

        let other = ModelAsset::from(ModelAssetJson {
            id: Some("c".to_string()),
            filename: Some("tower.obj".to_string()),
            ..Default::default()
        });
        assert!(!other.is_glb());
    }

    #[test]
    fn test_batch_report_counts() {
        let mut report = BatchUploadReport::default();
        report.record_success();
        report.record_failure();
        report.record_success();
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.total(), 3);
        assert_eq!(report.summary(), "2 uploaded, 1 failed");
    }
}
