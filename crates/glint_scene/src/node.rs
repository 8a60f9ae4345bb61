//! Scene node model: a common transform base plus a per-kind cell set.
//!
//! Nodes are plain data. Every visual attribute lives in a property cell,
//! so bindings, watchers, and animation drivers work uniformly across node
//! kinds. The kind is a tagged enum rather than a type hierarchy; traversal
//! and rendering switch on it.

use crate::graph::NodeId;
use glint_core::{CellId, OwnerId, PropertyStore, PropertyValue};

/// How an image is fitted into its view rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SizeMode {
    /// Scale to fill the view exactly, ignoring aspect ratio.
    #[default]
    Stretch = 0,
    /// Scale to fit inside the view, preserving aspect ratio.
    Contain = 1,
    /// Scale to cover the view, preserving aspect ratio.
    Cover = 2,
    /// No scaling; draw at the texture's natural size.
    Free = 3,
}

/// Texture tiling mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Repeat {
    #[default]
    NoRepeat = 0,
    Repeat = 1,
    RepeatX = 2,
    RepeatY = 3,
}

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

/// Vertical text alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VAlign {
    #[default]
    Baseline = 0,
    Top = 1,
    Middle = 2,
    Bottom = 3,
}

/// Text wrapping behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Wrap {
    #[default]
    None = 0,
    /// Break anywhere at the cell width.
    End = 1,
    /// Break at word boundaries.
    Word = 2,
}

macro_rules! enum_ordinal {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $ty {
            pub fn ordinal(self) -> u32 {
                self as u32
            }

            pub fn from_ordinal(ordinal: u32) -> Option<Self> {
                $(
                    if ordinal == $ty::$variant as u32 {
                        return Some($ty::$variant);
                    }
                )+
                None
            }
        }
    };
}

enum_ordinal!(SizeMode { Stretch, Contain, Cover, Free });
enum_ordinal!(Repeat { NoRepeat, Repeat, RepeatX, RepeatY });
enum_ordinal!(Align { Left, Center, Right });
enum_ordinal!(VAlign { Baseline, Top, Middle, Bottom });
enum_ordinal!(Wrap { None, End, Word });

/// Transform and visibility cells shared by every node kind.
#[derive(Clone, Copy, Debug)]
pub struct NodeBase {
    pub x: CellId,
    pub y: CellId,
    pub z: CellId,
    pub w: CellId,
    pub h: CellId,
    pub origin_x: CellId,
    pub origin_y: CellId,
    pub sx: CellId,
    pub sy: CellId,
    pub rx: CellId,
    pub ry: CellId,
    pub rz: CellId,
    pub opacity: CellId,
    pub visible: CellId,
    /// Free-form name for debugging and tooling.
    pub id: CellId,
}

impl NodeBase {
    fn new(store: &mut PropertyStore, owner: OwnerId) -> Self {
        let float = |store: &mut PropertyStore, v: f64| {
            store.create_cell(owner, PropertyValue::Float(v))
        };
        Self {
            x: float(store, 0.0),
            y: float(store, 0.0),
            z: float(store, 0.0),
            w: float(store, 0.0),
            h: float(store, 0.0),
            origin_x: float(store, 0.0),
            origin_y: float(store, 0.0),
            sx: float(store, 1.0),
            sy: float(store, 1.0),
            rx: float(store, 0.0),
            ry: float(store, 0.0),
            rz: float(store, 0.0),
            opacity: float(store, 1.0),
            visible: store.create_cell(owner, PropertyValue::Bool(true)),
            id: store.create_cell(owner, PropertyValue::Utf8(String::new())),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct GroupCells {
    /// `[x, y, w, h]` in local coordinates; empty array disables clipping.
    pub clip_rect: CellId,
    /// Depth-test toggle for child ordering by `z`.
    pub depth: CellId,
}

#[derive(Clone, Copy, Debug)]
pub struct RectCells {
    pub r: CellId,
    pub g: CellId,
    pub b: CellId,
}

#[derive(Clone, Copy, Debug)]
pub struct ImageViewCells {
    /// Resolved texture, usually bound to a texture proxy's cell.
    pub image: CellId,
    /// Source descriptor (path or URL); informational to the host loader.
    pub src: CellId,
    pub left: CellId,
    pub right: CellId,
    pub top: CellId,
    pub bottom: CellId,
    pub size_mode: CellId,
    pub repeat: CellId,
}

#[derive(Clone, Copy, Debug)]
pub struct PolygonCells {
    pub fill_r: CellId,
    pub fill_g: CellId,
    pub fill_b: CellId,
    pub filled: CellId,
    /// Coordinates per vertex, 2 or 3.
    pub dimension: CellId,
    /// Flat vertex array, `dimension` floats per point.
    pub geometry: CellId,
}

#[derive(Clone, Copy, Debug)]
pub struct CircleCells {
    pub radius: CellId,
    pub fill_r: CellId,
    pub fill_g: CellId,
    pub fill_b: CellId,
    pub filled: CellId,
}

#[derive(Clone, Copy, Debug)]
pub struct TextCells {
    pub text: CellId,
    pub r: CellId,
    pub g: CellId,
    pub b: CellId,
    pub font_name: CellId,
    pub font_size: CellId,
    pub font_weight: CellId,
    pub font_style: CellId,
    pub align: CellId,
    pub v_align: CellId,
    pub wrap: CellId,
    pub max_lines: CellId,
    /// Layout output: number of laid-out lines. Read-only.
    pub line_nr: CellId,
    /// Layout output: widest line in pixels. Read-only.
    pub line_w: CellId,
}

/// Kind tag plus the kind-specific cells.
#[derive(Debug)]
pub enum NodeKind {
    Group {
        cells: GroupCells,
        children: Vec<NodeId>,
    },
    Rect(RectCells),
    ImageView(ImageViewCells),
    Polygon(PolygonCells),
    Circle(CircleCells),
    Text(TextCells),
}

impl NodeKind {
    pub fn is_group(&self) -> bool {
        matches!(self, NodeKind::Group { .. })
    }
}

/// One node of the scene tree.
#[derive(Debug)]
pub struct SceneNode {
    pub base: NodeBase,
    pub kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
}

impl SceneNode {
    fn with_kind(store: &mut PropertyStore, owner: OwnerId, kind: NodeKind) -> Self {
        Self {
            base: NodeBase::new(store, owner),
            kind,
            parent: None,
        }
    }

    pub(crate) fn group(store: &mut PropertyStore, owner: OwnerId) -> Self {
        let cells = GroupCells {
            clip_rect: store.create_cell(owner, PropertyValue::FloatArray(Vec::new())),
            depth: store.create_cell(owner, PropertyValue::Bool(false)),
        };
        Self::with_kind(
            store,
            owner,
            NodeKind::Group {
                cells,
                children: Vec::new(),
            },
        )
    }

    pub(crate) fn rect(store: &mut PropertyStore, owner: OwnerId) -> Self {
        let float = |store: &mut PropertyStore, v: f64| {
            store.create_cell(owner, PropertyValue::Float(v))
        };
        let cells = RectCells {
            r: float(store, 0.0),
            g: float(store, 0.0),
            b: float(store, 0.0),
        };
        Self::with_kind(store, owner, NodeKind::Rect(cells))
    }

    pub(crate) fn image_view(store: &mut PropertyStore, owner: OwnerId) -> Self {
        let float = |store: &mut PropertyStore, v: f64| {
            store.create_cell(owner, PropertyValue::Float(v))
        };
        let cells = ImageViewCells {
            image: store.create_cell(owner, PropertyValue::Texture(None)),
            src: store.create_cell(owner, PropertyValue::Utf8(String::new())),
            // texture coordinates default to the full image
            left: float(store, 0.0),
            right: float(store, 1.0),
            top: float(store, 0.0),
            bottom: float(store, 1.0),
            size_mode: store.create_cell(
                owner,
                PropertyValue::Enum(SizeMode::default().ordinal()),
            ),
            repeat: store.create_cell(owner, PropertyValue::Enum(Repeat::default().ordinal())),
        };
        Self::with_kind(store, owner, NodeKind::ImageView(cells))
    }

    pub(crate) fn polygon(store: &mut PropertyStore, owner: OwnerId) -> Self {
        let float = |store: &mut PropertyStore, v: f64| {
            store.create_cell(owner, PropertyValue::Float(v))
        };
        let cells = PolygonCells {
            fill_r: float(store, 0.0),
            fill_g: float(store, 0.0),
            fill_b: float(store, 0.0),
            filled: store.create_cell(owner, PropertyValue::Bool(true)),
            dimension: store.create_cell(owner, PropertyValue::Enum(2)),
            geometry: store.create_cell(owner, PropertyValue::FloatArray(Vec::new())),
        };
        Self::with_kind(store, owner, NodeKind::Polygon(cells))
    }

    pub(crate) fn circle(store: &mut PropertyStore, owner: OwnerId) -> Self {
        let float = |store: &mut PropertyStore, v: f64| {
            store.create_cell(owner, PropertyValue::Float(v))
        };
        let cells = CircleCells {
            radius: float(store, 0.0),
            fill_r: float(store, 0.0),
            fill_g: float(store, 0.0),
            fill_b: float(store, 0.0),
            filled: store.create_cell(owner, PropertyValue::Bool(true)),
        };
        Self::with_kind(store, owner, NodeKind::Circle(cells))
    }

    pub(crate) fn text(store: &mut PropertyStore, owner: OwnerId) -> Self {
        let float = |store: &mut PropertyStore, v: f64| {
            store.create_cell(owner, PropertyValue::Float(v))
        };
        let cells = TextCells {
            text: store.create_cell(owner, PropertyValue::Utf8(String::new())),
            r: float(store, 1.0),
            g: float(store, 1.0),
            b: float(store, 1.0),
            font_name: store.create_cell(owner, PropertyValue::Utf8("source".to_owned())),
            font_size: float(store, 20.0),
            font_weight: float(store, 400.0),
            font_style: store.create_cell(owner, PropertyValue::Utf8("normal".to_owned())),
            align: store.create_cell(owner, PropertyValue::Enum(Align::default().ordinal())),
            v_align: store.create_cell(owner, PropertyValue::Enum(VAlign::default().ordinal())),
            wrap: store.create_cell(owner, PropertyValue::Enum(Wrap::default().ordinal())),
            max_lines: float(store, 0.0),
            line_nr: store.create_readonly(owner, PropertyValue::Float(1.0)),
            line_w: store.create_readonly(owner, PropertyValue::Float(0.0)),
        };
        Self::with_kind(store, owner, NodeKind::Text(cells))
    }
}
