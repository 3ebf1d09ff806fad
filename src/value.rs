use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2Data {
    pub x: f32,
    pub y: f32,
}

impl From<glam::Vec2> for Vec2Data {
    fn from(v: glam::Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Vec2Data> for glam::Vec2 {
    fn from(v: Vec2Data) -> Self {
        glam::Vec2::new(v.x, v.y)
    }
}

/// A serialized public-variable value on a script component or its editing
/// proxy. `Entity` and `Asset` are identity references into host-owned data;
/// copying them copies the reference, never the referent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Vec2(Vec2Data),
    Entity(u64),
    Asset(String),
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Str(_) => "string",
            FieldValue::Vec2(_) => "vec2",
            FieldValue::Entity(_) => "entity",
            FieldValue::Asset(_) => "asset",
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, FieldValue::Entity(_) | FieldValue::Asset(_))
    }

    /// Maps a rhai value from a script's `defaults()` map onto a field value.
    /// Two-element numeric arrays become `Vec2`; unsupported shapes are
    /// rejected so the program asset can report them.
    pub fn from_dynamic(value: &rhai::Dynamic) -> Option<FieldValue> {
        if let Ok(flag) = value.as_bool() {
            return Some(FieldValue::Bool(flag));
        }
        if let Ok(int) = value.as_int() {
            return Some(FieldValue::Int(int));
        }
        if let Ok(float) = value.as_float() {
            return Some(FieldValue::Float(float));
        }
        if value.is_string() {
            return value.clone().into_string().ok().map(FieldValue::Str);
        }
        if value.is_array() {
            let items = value.clone().into_array().ok()?;
            if items.len() == 2 {
                let x = number_component(&items[0])?;
                let y = number_component(&items[1])?;
                return Some(FieldValue::Vec2(Vec2Data { x, y }));
            }
        }
        None
    }
}

fn number_component(value: &rhai::Dynamic) -> Option<f32> {
    if let Ok(float) = value.as_float() {
        return Some(float as f32);
    }
    value.as_int().ok().map(|int| int as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_scalars_map_to_field_values() {
        assert_eq!(FieldValue::from_dynamic(&rhai::Dynamic::from(true)), Some(FieldValue::Bool(true)));
        assert_eq!(FieldValue::from_dynamic(&rhai::Dynamic::from(3_i64)), Some(FieldValue::Int(3)));
        assert_eq!(
            FieldValue::from_dynamic(&rhai::Dynamic::from("hi".to_string())),
            Some(FieldValue::Str("hi".to_string()))
        );
    }

    #[test]
    fn two_element_arrays_become_vec2() {
        let pair = rhai::Dynamic::from(vec![rhai::Dynamic::from(1.5_f64), rhai::Dynamic::from(2_i64)]);
        assert_eq!(
            FieldValue::from_dynamic(&pair),
            Some(FieldValue::Vec2(Vec2Data { x: 1.5, y: 2.0 }))
        );
    }

    #[test]
    fn reference_kinds_are_flagged() {
        assert!(FieldValue::Entity(7).is_reference());
        assert!(FieldValue::Asset("a.png".to_string()).is_reference());
        assert!(!FieldValue::Float(0.0).is_reference());
    }
}
