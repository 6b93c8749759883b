//! GeoForge Core - Asset, scene, and geodesy types
//!
//! This crate provides the foundational types for the GeoForge editor:
//! - Asset metadata for user uploads and the shared public catalog
//! - Scene instances with their placement transforms
//! - WGS84 geodetic / ECEF / ENU conversions and placement composition
//! - Drag payload variants for the placement workflow

pub mod asset;
pub mod catalog;
pub mod drag;
pub mod geo;
pub mod instance;
pub mod material;

pub use asset::{
    AssetId, BatchUploadReport, ConversionInfo, ConversionStatus, ModelAsset, ModelAssetJson,
    UploadMetadata,
};
pub use catalog::{
    CatalogFilter, CategoryIndex, PublicModelMetadata, PublicModelPage, PublicModelUpdate,
};
pub use drag::DragPayload;
pub use geo::{Ecef, Enu, Geodetic, Placement};
pub use instance::{
    plan_load, AssetRef, InstanceError, InstanceTransform, LoadPlan, SceneDetail, SceneInstance,
    SceneInstanceJson, SceneOriginJson, ScenePropertyUpdate,
};
pub use material::{find_material, MaterialDefinition, BUILTIN_MATERIALS};
