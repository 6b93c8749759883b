//! Built-in material palette
//!
//! Materials are defined at build time. The `shader_key` is an opaque
//! handle resolved by the rendering layer into an engine material.

/// A drag-assignable surface material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub shader_key: &'static str,
}

/// The static palette shown in the Materials tab
pub const BUILTIN_MATERIALS: &[MaterialDefinition] = &[
    MaterialDefinition {
        id: "mat-concrete",
        name: "Concrete",
        icon: "▦",
        shader_key: "concrete_rough",
    },
    MaterialDefinition {
        id: "mat-brushed-metal",
        name: "Brushed Metal",
        icon: "◪",
        shader_key: "metal_brushed",
    },
    MaterialDefinition {
        id: "mat-glass",
        name: "Tinted Glass",
        icon: "◇",
        shader_key: "glass_tinted",
    },
    MaterialDefinition {
        id: "mat-vegetation",
        name: "Vegetation",
        icon: "❋",
        shader_key: "foliage_flat",
    },
    MaterialDefinition {
        id: "mat-water",
        name: "Water",
        icon: "≈",
        shader_key: "water_calm",
    },
];

/// Look up a palette entry by id
pub fn find_material(id: &str) -> Option<&'static MaterialDefinition> {
    BUILTIN_MATERIALS.iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_material() {
        assert_eq!(find_material("mat-glass").unwrap().shader_key, "glass_tinted");
        assert!(find_material("mat-unknown").is_none());
    }

    #[test]
    fn test_palette_ids_are_unique() {
        let mut ids: Vec<_> = BUILTIN_MATERIALS.iter().map(|m| m.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), BUILTIN_MATERIALS.len());
    }
}
