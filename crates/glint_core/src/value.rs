//! Typed property values
//!
//! Every property cell holds exactly one [`PropertyValue`]; the variant is
//! fixed at cell creation and later writes must carry the same kind.
//! Resource-backed values (textures, fonts) are opaque handles minted by the
//! scene layer; two handles are equal only when they are the same handle.

/// Opaque handle to an uploaded texture.
///
/// The renderer collaborator owns the actual GPU object; the engine only
/// moves the handle through property cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Opaque handle to a registered font face at a concrete size/weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontHandle(pub u64);

/// Discriminant for [`PropertyValue`], used for write-time type checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Float,
    Bool,
    Utf8,
    Enum,
    Texture,
    Font,
    FloatArray,
}

/// A value stored in a property cell.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    /// Scalar numeric value (the only animatable kind).
    Float(f64),
    Bool(bool),
    Utf8(String),
    /// Resolved ordinal of a scene-level enum (alignment, wrap mode, ...).
    Enum(u32),
    /// Texture handle, or `Texture(None)` before a load completes.
    Texture(Option<TextureHandle>),
    /// Font handle, or `Font(None)` before resolution.
    Font(Option<FontHandle>),
    /// Packed geometry data (polygon points).
    FloatArray(Vec<f32>),
}

impl PropertyValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            PropertyValue::Float(_) => ValueKind::Float,
            PropertyValue::Bool(_) => ValueKind::Bool,
            PropertyValue::Utf8(_) => ValueKind::Utf8,
            PropertyValue::Enum(_) => ValueKind::Enum,
            PropertyValue::Texture(_) => ValueKind::Texture,
            PropertyValue::Font(_) => ValueKind::Font,
            PropertyValue::FloatArray(_) => ValueKind::FloatArray,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Utf8(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<u32> {
        match self {
            PropertyValue::Enum(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<TextureHandle> {
        match self {
            PropertyValue::Texture(h) => *h,
            _ => None,
        }
    }

    pub fn as_font(&self) -> Option<FontHandle> {
        match self {
            PropertyValue::Font(h) => *h,
            _ => None,
        }
    }

    pub fn as_float_array(&self) -> Option<&[f32]> {
        match self {
            PropertyValue::FloatArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Utf8(v.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Utf8(v)
    }
}
