//! Drag payload carried by a placement gesture

/// Drag payload key for a user-owned model id
pub const MODEL_KEY: &str = "modelId";
/// Drag payload key for a public catalog model id
pub const PUBLIC_MODEL_KEY: &str = "publicModelId";
/// Drag payload key for a material id
pub const MATERIAL_KEY: &str = "materialId";

/// What is being dragged over the viewer
///
/// Exactly one variant per gesture. When several keys are present on the
/// native event the material wins, then the user model, then the public
/// model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    Model(String),
    PublicModel(String),
    Material(String),
}

impl DragPayload {
    /// Parse the string pairs attached to a native drag event
    pub fn from_entries<'a, I>(entries: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut model = None;
        let mut public_model = None;
        let mut material = None;
        for (key, value) in entries {
            if value.is_empty() {
                continue;
            }
            match key {
                MODEL_KEY => model = Some(value.to_string()),
                PUBLIC_MODEL_KEY => public_model = Some(value.to_string()),
                MATERIAL_KEY => material = Some(value.to_string()),
                _ => {}
            }
        }
        material
            .map(DragPayload::Material)
            .or(model.map(DragPayload::Model))
            .or(public_model.map(DragPayload::PublicModel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_key_maps_to_its_variant() {
        assert_eq!(
            DragPayload::from_entries([(MODEL_KEY, "m-1")]),
            Some(DragPayload::Model("m-1".to_string()))
        );
        assert_eq!(
            DragPayload::from_entries([(PUBLIC_MODEL_KEY, "p-1")]),
            Some(DragPayload::PublicModel("p-1".to_string()))
        );
        assert_eq!(
            DragPayload::from_entries([(MATERIAL_KEY, "mat-1")]),
            Some(DragPayload::Material("mat-1".to_string()))
        );
    }

    #[test]
    fn test_precedence_material_then_model_then_public() {
        let all = [
            (PUBLIC_MODEL_KEY, "p-1"),
            (MODEL_KEY, "m-1"),
            (MATERIAL_KEY, "mat-1"),
        ];
        assert_eq!(
            DragPayload::from_entries(all),
            Some(DragPayload::Material("mat-1".to_string()))
        );

        let no_material = [(PUBLIC_MODEL_KEY, "p-1"), (MODEL_KEY, "m-1")];
        assert_eq!(
            DragPayload::from_entries(no_material),
            Some(DragPayload::Model("m-1".to_string()))
        );
    }

    #[test]
    fn test_unknown_or_empty_entries_are_ignored() {
        assert_eq!(
            DragPayload::from_entries([("text/plain", "hello"), (MODEL_KEY, "")]),
            None
        );
    }
}
