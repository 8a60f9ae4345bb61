//! Glint Scene Graph
//!
//! A retained scene tree over reactive property cells, evaluated once per
//! frame into renderer-ready snapshots:
//!
//! - **Nodes**: groups, rects, image views, polygons, circles, and text,
//!   each a bundle of property cells usable with bindings, watchers, and
//!   animation drivers
//! - **Stage**: the engine instance; owns the store, drivers, tree,
//!   resources, fonts, and listeners, and drives them with `tick`
//! - **Resources**: texture and font loading stays in the host; outcomes
//!   are marshaled onto the frame loop through a cloneable sender
//!
//! # Example
//!
//! ```rust
//! use glint_animation::{Easing, Tween};
//! use glint_scene::Stage;
//!
//! let mut stage = Stage::new();
//! let root = stage.create_group();
//! let rect = stage.create_rect();
//! stage.add(root, rect).unwrap();
//! stage.set_root(root).unwrap();
//!
//! let x = stage.base(rect).unwrap().x;
//! stage
//!     .animate(x, Tween::new(200.0, 1000.0).easing(Easing::Linear))
//!     .unwrap();
//!
//! stage.tick(0.0);
//! let frame = stage.tick(500.0);
//! assert_eq!(frame.nodes.len(), 2);
//! assert_eq!(stage.store().get_f64(x), Some(100.0));
//! ```

pub mod error;
pub mod events;
pub mod fonts;
pub mod graph;
pub mod node;
pub mod resource;
pub mod snapshot;
pub mod stage;
pub mod transform;

pub use error::{ResourceError, SceneError};
pub use events::{Event, EventKind, ListenerFn, ListenerId, Modifiers};
pub use fonts::{FontId, FontRegistry, FontSpec};
pub use graph::{NodeId, SceneGraph};
pub use node::{
    Align, NodeBase, NodeKind, Repeat, SceneNode, SizeMode, VAlign, Wrap,
};
pub use resource::{LoadedTexture, ResourceSender, ResourceState, TextureId, TextureProxy};
pub use snapshot::{FrameSnapshot, RenderAttrs, RenderNode};
pub use stage::Stage;
pub use transform::Affine2D;
