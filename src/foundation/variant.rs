use std::collections::BTreeMap;

/// String-keyed bag of [`Variant`] values.
///
/// Used as the option bag for resource loaders and for dumped slot state.
pub type VariantMap = BTreeMap<String, Variant>;

/// Self-describing scripting value exchanged through the reflective slot
/// capability ([`AbstractSlot`](crate::AbstractSlot)).
///
/// This is the tagged-union replacement for the original framework's
/// runtime property reflection: every scriptable slot payload maps to and
/// from a `Variant`; payloads without a sensible scripting representation
/// (GPU handles) report [`Variant::Null`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Variant {
    /// Absent or unrepresentable value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// String value.
    Str(String),
    /// Ordered list of variants.
    List(Vec<Variant>),
    /// String-keyed map of variants.
    Map(VariantMap),
}

impl Variant {
    /// The value as a bool, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Variant::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The value as a float; integers coerce.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variant::Float(f) => Some(*f),
            Variant::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The value as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a list slice, if it is one.
    pub fn as_list(&self) -> Option<&[Variant]> {
        match self {
            Variant::List(items) => Some(items),
            _ => None,
        }
    }

    /// The value as a map, if it is one.
    pub fn as_map(&self) -> Option<&VariantMap> {
        match self {
            Variant::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Bool(v)
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Variant::Int(v)
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Variant::Float(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::Str(v.to_string())
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Variant::Str(v)
    }
}

/// Coarse payload type of a slot, used for inspection and to report
/// mismatches on dynamic connects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum TypeTag {
    /// Boolean payload.
    Bool,
    /// Integer payload.
    Int,
    /// Floating-point payload.
    Float,
    /// String payload.
    Str,
    /// [`Viewport`](crate::Viewport) payload.
    Viewport,
    /// [`Color`](crate::Color) payload.
    Color,
    /// Texture handle payload.
    Texture,
    /// Framebuffer handle payload.
    Framebuffer,
    /// Payload with no built-in scripting representation.
    Custom(&'static str),
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/variant.rs"]
mod tests;
