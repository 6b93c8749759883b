//! Scene instances and their placement transforms

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::AssetId;

/// Errors resolving an instance's asset reference
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("instance {instance} has no asset reference")]
    MissingAssetInfo { instance: String },
    #[error("instance {instance} has unknown asset type '{asset_type}'")]
    UnknownAssetType {
        instance: String,
        asset_type: String,
    },
}

/// Placement of an instance relative to the scene origin
///
/// `location` is a local east/north/up offset in meters, `rotation` is
/// heading/pitch/roll in degrees, `scale` is per-axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstanceTransform {
    #[serde(default)]
    pub location: [f64; 3],
    #[serde(default)]
    pub rotation: [f64; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f64; 3],
}

fn unit_scale() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self {
            location: [0.0; 3],
            rotation: [0.0; 3],
            scale: unit_scale(),
        }
    }
}

/// Closed set of asset kinds an instance can reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRef {
    Model(AssetId),
    PublicModel(AssetId),
    ThreeDTiles {
        id: AssetId,
        tileset_url: Option<String>,
    },
    GaussianSplat(AssetId),
}

impl AssetRef {
    /// Resolve the string discriminator reported by the backend
    pub fn resolve(
        instance: &str,
        asset_type: Option<&str>,
        asset_id: Option<&str>,
        tileset_url: Option<&str>,
    ) -> Result<Self, InstanceError> {
        let (Some(kind), Some(id)) = (asset_type, asset_id) else {
            return Err(InstanceError::MissingAssetInfo {
                instance: instance.to_string(),
            });
        };
        let id = AssetId::new(id);
        match kind {
            "model" => Ok(AssetRef::Model(id)),
            "public_model" => Ok(AssetRef::PublicModel(id)),
            "threeDTiles" => Ok(AssetRef::ThreeDTiles {
                id,
                tileset_url: tileset_url.map(|s| s.to_string()),
            }),
            "gaussianSplat" => Ok(AssetRef::GaussianSplat(id)),
            other => Err(InstanceError::UnknownAssetType {
                instance: instance.to_string(),
                asset_type: other.to_string(),
            }),
        }
    }

    pub fn asset_id(&self) -> &AssetId {
        match self {
            AssetRef::Model(id)
            | AssetRef::PublicModel(id)
            | AssetRef::GaussianSplat(id)
            | AssetRef::ThreeDTiles { id, .. } => id,
        }
    }
}

/// Raw instance JSON as listed by the scene endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneInstanceJson {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub transform: Option<InstanceTransform>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub tileset_url: Option<String>,
}

/// A resolved instance, ready for the viewer
#[derive(Debug, Clone)]
pub struct SceneInstance {
    pub id: String,
    pub name: String,
    pub transform: InstanceTransform,
    pub materials: Vec<String>,
    pub asset: AssetRef,
}

impl SceneInstance {
    pub fn from_json(json: SceneInstanceJson) -> Result<Self, InstanceError> {
        let asset = AssetRef::resolve(
            &json.id,
            json.asset_type.as_deref(),
            json.asset_id.as_deref(),
            json.tileset_url.as_deref(),
        )?;
        Ok(Self {
            id: json.id,
            name: json.name,
            transform: json.transform.unwrap_or_default(),
            materials: json.materials,
            asset,
        })
    }
}

/// Outcome of resolving a scene's instance list
#[derive(Debug, Default)]
pub struct LoadPlan {
    pub ready: Vec<SceneInstance>,
    pub skipped: usize,
}

/// Resolve every instance, skipping (and counting) the unresolvable ones.
/// A bad entry never fails the batch.
pub fn plan_load(instances: Vec<SceneInstanceJson>) -> LoadPlan {
    let mut plan = LoadPlan::default();
    for json in instances {
        match SceneInstance::from_json(json) {
            Ok(instance) => plan.ready.push(instance),
            Err(err) => {
                tracing::warn!("skipping instance: {}", err);
                plan.skipped += 1;
            }
        }
    }
    plan
}

/// Geographic reference coordinate of a scene, degrees and meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneOriginJson {
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub height: f64,
}

/// Scene detail as fetched from the backend
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDetail {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub origin: Option<SceneOriginJson>,
    #[serde(default)]
    pub preview_image: Option<String>,
}

/// Single-property update payload for a scene
#[derive(Debug, Clone, Serialize)]
pub struct ScenePropertyUpdate {
    pub property: String,
    pub value: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(id: &str, asset_type: Option<&str>, asset_id: Option<&str>) -> SceneInstanceJson {
        SceneInstanceJson {
            id: id.to_string(),
            name: id.to_string(),
            asset_type: asset_type.map(|s| s.to_string()),
            asset_id: asset_id.map(|s| s.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_known_asset_types() {
        let model = AssetRef::resolve("i", Some("model"), Some("a"), None).unwrap();
        assert_eq!(model, AssetRef::Model(AssetId::new("a")));

        let tiles =
            AssetRef::resolve("i", Some("threeDTiles"), Some("t"), Some("tiles/root.json"))
                .unwrap();
        assert_eq!(
            tiles,
            AssetRef::ThreeDTiles {
                id: AssetId::new("t"),
                tileset_url: Some("tiles/root.json".to_string()),
            }
        );
    }

    #[test]
    fn test_plan_skips_bad_entries_and_keeps_going() {
        let instances = vec![
            json("a", Some("model"), Some("m-1")),
            json("b", Some("hologram"), Some("x-1")),
            json("c", None, None),
            json("d", Some("public_model"), Some("p-1")),
            json("e", Some("gaussianSplat"), Some("g-1")),
        ];
        let plan = plan_load(instances);
        assert_eq!(plan.ready.len(), 3);
        assert_eq!(plan.skipped, 2);
        // List order is preserved
        assert_eq!(plan.ready[0].id, "a");
        assert_eq!(plan.ready[1].id, "d");
    }

    #[test]
    fn test_transform_defaults_to_unit_scale() {
        let t = InstanceTransform::default();
        assert_eq!(t.scale, [1.0, 1.0, 1.0]);
        assert_eq!(t.location, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_instance_json_parses_flat_transform() {
        let raw = r#"{
            "id": "inst-1",
            "name": "Water tower",
            "location": [10.0, 0.0, 0.0],
            "rotation": [90.0, 0.0, 0.0],
            "scale": [2.0, 2.0, 2.0],
            "assetId": "m-1",
            "assetType": "model"
        }"#;
        let json: SceneInstanceJson = serde_json::from_str(raw).unwrap();
        let instance = SceneInstance::from_json(json).unwrap();
        assert_eq!(instance.transform.rotation, [90.0, 0.0, 0.0]);
        assert_eq!(instance.asset, AssetRef::Model(AssetId::new("m-1")));
    }
}
