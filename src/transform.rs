/// Transform record for the loaded image
///
/// This struct stores the geometric transform and overlay choice applied
/// to an image. It is serialized to JSON and stored with saved states,
/// enabling complete non-destructive editing with undo/redo capability.

use serde::de::{Deserializer, Error as DeError};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Decorative overlay drawn on top of the composited image
///
/// The wire format matches the saved-state interchange document:
/// `null` for no overlay, `"cinematic"` or `"full-frame"` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayType {
    /// No overlay
    #[default]
    None,
    /// Two opaque horizontal letterbox bars (top and bottom)
    Cinematic,
    /// Opaque bars framing all four edges
    FullFrame,
}

impl Serialize for OverlayType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OverlayType::None => serializer.serialize_none(),
            OverlayType::Cinematic => serializer.serialize_str("cinematic"),
            OverlayType::FullFrame => serializer.serialize_str("full-frame"),
        }
    }
}

impl<'de> Deserialize<'de> for OverlayType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)?.as_deref() {
            None => Ok(OverlayType::None),
            Some("cinematic") => Ok(OverlayType::Cinematic),
            Some("full-frame") => Ok(OverlayType::FullFrame),
            Some(other) => Err(DeError::unknown_variant(
                other,
                &["cinematic", "full-frame"],
            )),
        }
    }
}

/// Configured bounds for transform fields
///
/// These are a configuration contract, not literals scattered through
/// code: callers that allow deeper zoom (e.g. wheel zoom up to 5x)
/// construct their own constraints instead of editing the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformConstraints {
    /// Minimum user scale factor (must stay above zero; offset math
    /// downstream divides by scale)
    pub min_scale: f32,
    /// Maximum user scale factor
    pub max_scale: f32,
    /// Minimum offset from center, in output-surface pixels
    pub min_offset: f32,
    /// Maximum offset from center, in output-surface pixels
    pub max_offset: f32,
}

impl Default for TransformConstraints {
    /// Slider-driven defaults: scale in [0.1, 2.0], offsets in [-200, 200]
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 2.0,
            min_offset: -200.0,
            max_offset: 200.0,
        }
    }
}

impl TransformConstraints {
    /// Wider scale range used by wheel-zoom callers (up to 5x)
    pub fn wheel_zoom() -> Self {
        Self {
            max_scale: 5.0,
            ..Self::default()
        }
    }

    /// Clamp a scale value into range; non-finite input lands on the minimum
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        if scale.is_finite() {
            scale.clamp(self.min_scale, self.max_scale)
        } else {
            self.min_scale
        }
    }

    /// Clamp an offset value into range; non-finite input lands on zero's
    /// nearest representable bound
    pub fn clamp_offset(&self, offset: f32) -> f32 {
        if offset.is_finite() {
            offset.clamp(self.min_offset, self.max_offset)
        } else {
            0.0f32.clamp(self.min_offset, self.max_offset)
        }
    }
}

/// The transform applied to the current image
///
/// All four fields are always present and within their configured bounds
/// after any mutation; partial state is never observable from outside.
/// Field names on the wire are camelCase to match the interchange format.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    /// User scale factor multiplied on top of the cover-fit base scale
    pub scale: f32,
    /// Horizontal offset from the surface center, in surface pixels
    pub offset_x: f32,
    /// Vertical offset from the surface center, in surface pixels
    pub offset_y: f32,
    /// Decorative overlay drawn after the image
    pub overlay_type: OverlayType,
}

impl Default for Transform {
    /// Identity transform: centered, unscaled, no overlay
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            overlay_type: OverlayType::None,
        }
    }
}

/// A partial update to a transform, produced by one user intent
/// (slider release, keyboard nudge, overlay selection)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformPatch {
    pub scale: Option<f32>,
    pub offset_x: Option<f32>,
    pub offset_y: Option<f32>,
    pub overlay_type: Option<OverlayType>,
}

impl TransformPatch {
    /// Patch that only changes the scale
    pub fn scale(scale: f32) -> Self {
        Self {
            scale: Some(scale),
            ..Self::default()
        }
    }

    /// Patch that only changes the offsets
    pub fn offset(offset_x: f32, offset_y: f32) -> Self {
        Self {
            offset_x: Some(offset_x),
            offset_y: Some(offset_y),
            ..Self::default()
        }
    }

    /// Patch that only changes the overlay
    pub fn overlay(overlay_type: OverlayType) -> Self {
        Self {
            overlay_type: Some(overlay_type),
            ..Self::default()
        }
    }
}

impl Transform {
    /// Merge a patch into this transform, clamping every field through
    /// the given constraints
    ///
    /// Fields absent from the patch keep their current value but are
    /// still re-clamped, so a transform restored from an import can never
    /// leak out-of-range values into live state.
    pub fn apply_clamped(&self, patch: TransformPatch, constraints: &TransformConstraints) -> Self {
        Self {
            scale: constraints.clamp_scale(patch.scale.unwrap_or(self.scale)),
            offset_x: constraints.clamp_offset(patch.offset_x.unwrap_or(self.offset_x)),
            offset_y: constraints.clamp_offset(patch.offset_y.unwrap_or(self.offset_y)),
            overlay_type: patch.overlay_type.unwrap_or(self.overlay_type),
        }
    }

    /// Re-clamp all fields without changing anything else
    pub fn clamped(&self, constraints: &TransformConstraints) -> Self {
        self.apply_clamped(TransformPatch::default(), constraints)
    }

    /// Convert to JSON string for storage
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
