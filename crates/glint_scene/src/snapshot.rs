//! Resolved frame output handed to a renderer.

use crate::fonts::FontId;
use crate::graph::NodeId;
use crate::node::{Align, Repeat, SizeMode, VAlign, Wrap};
use crate::transform::Affine2D;
use glint_core::TextureHandle;

/// One evaluated frame: every visible node in paint order with its
/// composed transform and resolved attributes. Plain data, no cell ids,
/// so a renderer consumes it without touching the property store.
#[derive(Debug)]
pub struct FrameSnapshot {
    pub timestamp_ms: f64,
    pub nodes: Vec<RenderNode>,
}

#[derive(Debug)]
pub struct RenderNode {
    pub node: NodeId,
    /// The node's `id` cell, for debugging and tooling.
    pub name: String,
    /// Composed world transform.
    pub transform: Affine2D,
    /// Passed through untouched; renderers with depth use it.
    pub z: f64,
    /// Effective opacity, parent opacities multiplied in.
    pub opacity: f64,
    pub width: f64,
    pub height: f64,
    pub attrs: RenderAttrs,
}

#[derive(Debug)]
pub enum RenderAttrs {
    Group {
        /// `[x, y, w, h]` in local coordinates, when clipping is on.
        clip_rect: Option<[f64; 4]>,
        depth: bool,
    },
    Rect {
        color: [f64; 3],
    },
    ImageView {
        texture: Option<TextureHandle>,
        /// `[left, right, top, bottom]` texture coordinates.
        tex_coords: [f64; 4],
        size_mode: SizeMode,
        repeat: Repeat,
    },
    Polygon {
        color: [f64; 3],
        filled: bool,
        dimension: u32,
        geometry: Vec<f32>,
    },
    Circle {
        color: [f64; 3],
        filled: bool,
        radius: f64,
        /// Tessellated outline, x/y pairs.
        geometry: Vec<f32>,
    },
    Text {
        text: String,
        color: [f64; 3],
        font: Option<FontId>,
        font_size: f64,
        align: Align,
        v_align: VAlign,
        wrap: Wrap,
        max_lines: u32,
    },
}
