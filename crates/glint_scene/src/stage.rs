//! The stage: one engine instance tying the store, animation drivers,
//! scene tree, resources, fonts, and input dispatch together.
//!
//! The host drives it with `tick(now_ms)` once per frame:
//!
//! 1. queued resource completions are applied,
//! 2. animation drivers advance and write their cells,
//! 3. text layout outputs are refreshed,
//! 4. the visible tree is evaluated into a [`FrameSnapshot`].
//!
//! Everything that mutates cells happens inside the tick on the calling
//! thread; the only cross-thread surface is [`ResourceSender`].

use crate::error::{Result, ResourceError, SceneError};
use crate::events::{Event, EventKind, ListenerFn, ListenerId, Listeners};
use crate::fonts::{FontId, FontRegistry, FontSpec};
use crate::graph::{NodeId, SceneGraph};
use crate::node::{Align, NodeBase, NodeKind, Repeat, SceneNode, SizeMode, VAlign, Wrap};
use crate::resource::{ResourceSender, ResourceTable, TextureId, TextureProxy};
use crate::snapshot::{FrameSnapshot, RenderAttrs, RenderNode};
use crate::transform::Affine2D;
use glint_animation::{AnimError, AnimId, AnimState, DriverSet, Tween};
use glint_core::{CellId, PropertyStore};

pub struct Stage {
    store: PropertyStore,
    drivers: DriverSet,
    graph: SceneGraph,
    fonts: FontRegistry,
    resources: ResourceTable,
    listeners: Listeners,
    root: Option<NodeId>,
}

impl Stage {
    pub fn new() -> Self {
        Self {
            store: PropertyStore::new(),
            drivers: DriverSet::new(),
            graph: SceneGraph::new(),
            fonts: FontRegistry::new(),
            resources: ResourceTable::new(),
            listeners: Listeners::default(),
            root: None,
        }
    }

    // =========================================================================
    // NODE FACTORIES
    // =========================================================================

    pub fn create_group(&mut self) -> NodeId {
        self.graph.insert(&mut self.store, SceneNode::group)
    }

    pub fn create_rect(&mut self) -> NodeId {
        self.graph.insert(&mut self.store, SceneNode::rect)
    }

    pub fn create_image_view(&mut self) -> NodeId {
        self.graph.insert(&mut self.store, SceneNode::image_view)
    }

    pub fn create_polygon(&mut self) -> NodeId {
        self.graph.insert(&mut self.store, SceneNode::polygon)
    }

    pub fn create_circle(&mut self) -> NodeId {
        self.graph.insert(&mut self.store, SceneNode::circle)
    }

    pub fn create_text(&mut self) -> NodeId {
        self.graph.insert(&mut self.store, SceneNode::text)
    }

    // =========================================================================
    // TREE ACCESS
    // =========================================================================

    pub fn set_root(&mut self, node: NodeId) -> Result<()> {
        if !self.graph.contains(node) {
            return Err(SceneError::DeadNode(node));
        }
        self.root = Some(node);
        Ok(())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, node: NodeId) -> Option<&SceneNode> {
        self.graph.get(node)
    }

    /// Transform/visibility cells of a node.
    pub fn base(&self, node: NodeId) -> Result<NodeBase> {
        self.graph
            .get(node)
            .map(|n| n.base)
            .ok_or(SceneError::DeadNode(node))
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn add(&mut self, group: NodeId, node: NodeId) -> Result<()> {
        self.graph.add(group, node)
    }

    pub fn remove(&mut self, group: NodeId, node: NodeId) -> Result<()> {
        self.graph.remove(group, node)
    }

    pub fn insert_before(&mut self, group: NodeId, node: NodeId, sibling: NodeId) -> Result<()> {
        self.graph.insert_before(group, node, sibling)
    }

    pub fn insert_after(&mut self, group: NodeId, node: NodeId, sibling: NodeId) -> Result<()> {
        self.graph.insert_after(group, node, sibling)
    }

    pub fn clear(&mut self, group: NodeId) -> Result<()> {
        self.graph.clear(group)
    }

    /// Destroy a subtree and all cells it owns. Bindings and animations
    /// pointing into it become inert.
    pub fn destroy(&mut self, node: NodeId) -> Result<()> {
        if self.root == Some(node) {
            self.root = None;
        }
        self.graph.destroy(&mut self.store, node)
    }

    // =========================================================================
    // PROPERTIES AND ANIMATION
    // =========================================================================

    pub fn store(&self) -> &PropertyStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PropertyStore {
        &mut self.store
    }

    /// Start a tween on a cell; the driver takes effect on the next tick.
    pub fn animate(&mut self, cell: CellId, tween: Tween) -> std::result::Result<AnimId, AnimError> {
        self.drivers.start(&self.store, cell, tween)
    }

    pub fn stop_animation(&mut self, anim: AnimId) {
        self.drivers.stop(anim);
    }

    pub fn anim_state(&self, anim: AnimId) -> Option<AnimState> {
        self.drivers.state(anim)
    }

    // =========================================================================
    // RESOURCES AND FONTS
    // =========================================================================

    pub fn create_texture(&mut self) -> TextureId {
        self.resources.create_texture(&mut self.store)
    }

    /// Mark a texture as loading; the host should then decode and report
    /// through [`loader`](Self::loader).
    pub fn begin_load(&mut self, texture: TextureId) -> std::result::Result<(), ResourceError> {
        self.resources.begin_load(texture)
    }

    pub fn texture(&self, texture: TextureId) -> Option<&TextureProxy> {
        self.resources.proxy(texture)
    }

    /// Cross-thread completion handle for external decoders.
    pub fn loader(&self) -> ResourceSender {
        self.resources.sender()
    }

    pub fn register_font(&mut self, spec: FontSpec) -> FontId {
        self.fonts.register_font(&mut self.store, spec)
    }

    pub fn resolve_font(
        &self,
        name: &str,
        weight: u32,
        style: &str,
    ) -> std::result::Result<FontId, ResourceError> {
        self.fonts.resolve(name, weight, style)
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    pub fn on(&mut self, kind: EventKind, target: Option<NodeId>, callback: ListenerFn) -> ListenerId {
        self.listeners.on(kind, target, callback)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.off(id)
    }

    /// Deliver an event to matching listeners, in registration order.
    /// Call between ticks on the frame-loop thread.
    pub fn dispatch(&mut self, event: &Event) {
        self.listeners.dispatch(event, &mut self.store);
    }

    // =========================================================================
    // FRAME LOOP
    // =========================================================================

    /// Evaluate one frame at `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> FrameSnapshot {
        self.resources.drain(&mut self.store, &mut self.fonts);
        self.drivers.advance_all(&mut self.store, now_ms);
        self.layout_text();

        let mut nodes = Vec::new();
        if let Some(root) = self.root {
            emit(
                &self.graph,
                &self.store,
                &self.fonts,
                root,
                &Affine2D::IDENTITY,
                1.0,
                &mut nodes,
            );
        }
        FrameSnapshot {
            timestamp_ms: now_ms,
            nodes,
        }
    }

    /// Refresh `line_nr`/`line_w` on every visible text node.
    fn layout_text(&mut self) {
        let Some(root) = self.root else { return };

        let mut jobs = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.graph.get(id) else { continue };
            if !self.store.get_bool(node.base.visible).unwrap_or(false) {
                continue;
            }
            match &node.kind {
                NodeKind::Group { children, .. } => stack.extend(children.iter().copied()),
                NodeKind::Text(cells) => {
                    let width = self.store.get_f64(node.base.w).unwrap_or(0.0);
                    jobs.push((*cells, width));
                }
                _ => {}
            }
        }

        for (cells, width) in jobs {
            let text = self.store.get_str(cells.text).unwrap_or("").to_owned();
            let font_size = self.store.get_f64(cells.font_size).unwrap_or(0.0);
            let wrap = self
                .store
                .get_enum(cells.wrap)
                .and_then(Wrap::from_ordinal)
                .unwrap_or_default();
            let max_lines = self.store.get_f64(cells.max_lines).unwrap_or(0.0).max(0.0) as u32;

            let (line_nr, line_w) = measure_text(&text, font_size, wrap, width, max_lines);
            let _ = self.store.set_internal(cells.line_nr, line_nr as f64);
            let _ = self.store.set_internal(cells.line_w, line_w);
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first evaluation in child order; invisible subtrees are pruned.
fn emit(
    graph: &SceneGraph,
    store: &PropertyStore,
    fonts: &FontRegistry,
    node: NodeId,
    parent_transform: &Affine2D,
    parent_opacity: f64,
    out: &mut Vec<RenderNode>,
) {
    let Some(scene_node) = graph.get(node) else { return };
    let base = scene_node.base;
    if !store.get_bool(base.visible).unwrap_or(false) {
        return;
    }

    let f = |cell| store.get_f64(cell).unwrap_or(0.0);
    let (x, y) = (f(base.x), f(base.y));
    let (w, h) = (f(base.w), f(base.h));
    let (sx, sy) = (f(base.sx), f(base.sy));
    let (origin_x, origin_y) = (f(base.origin_x), f(base.origin_y));

    // translate, rotate about the origin point, scale, shift by origin
    let local = Affine2D::translation(x, y)
        .then(&Affine2D::rotation(f(base.rz).to_radians()))
        .then(&Affine2D::scale(sx, sy))
        .then(&Affine2D::translation(-origin_x * w, -origin_y * h));
    let transform = parent_transform.then(&local);
    let opacity = parent_opacity * f(base.opacity);

    let color3 = |r, g, b| [f(r), f(g), f(b)];
    let attrs = match &scene_node.kind {
        NodeKind::Group { cells, .. } => {
            let clip_rect = store
                .get(cells.clip_rect)
                .and_then(|v| v.as_float_array())
                .filter(|a| a.len() == 4)
                .map(|a| [a[0] as f64, a[1] as f64, a[2] as f64, a[3] as f64]);
            RenderAttrs::Group {
                clip_rect,
                depth: store.get_bool(cells.depth).unwrap_or(false),
            }
        }
        NodeKind::Rect(cells) => RenderAttrs::Rect {
            color: color3(cells.r, cells.g, cells.b),
        },
        NodeKind::ImageView(cells) => RenderAttrs::ImageView {
            texture: store.get(cells.image).and_then(|v| v.as_texture()),
            tex_coords: [f(cells.left), f(cells.right), f(cells.top), f(cells.bottom)],
            size_mode: store
                .get_enum(cells.size_mode)
                .and_then(SizeMode::from_ordinal)
                .unwrap_or_default(),
            repeat: store
                .get_enum(cells.repeat)
                .and_then(Repeat::from_ordinal)
                .unwrap_or_default(),
        },
        NodeKind::Polygon(cells) => RenderAttrs::Polygon {
            color: color3(cells.fill_r, cells.fill_g, cells.fill_b),
            filled: store.get_bool(cells.filled).unwrap_or(true),
            dimension: store.get_enum(cells.dimension).unwrap_or(2),
            geometry: store
                .get(cells.geometry)
                .and_then(|v| v.as_float_array())
                .map(|a| a.to_vec())
                .unwrap_or_default(),
        },
        NodeKind::Circle(cells) => {
            let radius = f(cells.radius);
            RenderAttrs::Circle {
                color: color3(cells.fill_r, cells.fill_g, cells.fill_b),
                filled: store.get_bool(cells.filled).unwrap_or(true),
                radius,
                geometry: tessellate_circle(radius),
            }
        }
        NodeKind::Text(cells) => {
            let name = store.get_str(cells.font_name).unwrap_or("");
            let weight = f(cells.font_weight).max(0.0) as u32;
            let style = store.get_str(cells.font_style).unwrap_or("normal");
            RenderAttrs::Text {
                text: store.get_str(cells.text).unwrap_or("").to_owned(),
                color: color3(cells.r, cells.g, cells.b),
                font: fonts.resolve(name, weight, style).ok(),
                font_size: f(cells.font_size),
                align: store
                    .get_enum(cells.align)
                    .and_then(Align::from_ordinal)
                    .unwrap_or_default(),
                v_align: store
                    .get_enum(cells.v_align)
                    .and_then(VAlign::from_ordinal)
                    .unwrap_or_default(),
                wrap: store
                    .get_enum(cells.wrap)
                    .and_then(Wrap::from_ordinal)
                    .unwrap_or_default(),
                max_lines: f(cells.max_lines).max(0.0) as u32,
            }
        }
    };

    out.push(RenderNode {
        node,
        name: store.get_str(base.id).unwrap_or("").to_owned(),
        transform,
        z: f(base.z),
        opacity,
        width: w,
        height: h,
        attrs,
    });

    if let NodeKind::Group { children, .. } = &scene_node.kind {
        for child in children {
            emit(graph, store, fonts, *child, &transform, opacity, out);
        }
    }
}

const CIRCLE_SEGMENTS: usize = 64;

fn tessellate_circle(radius: f64) -> Vec<f32> {
    let mut out = Vec::with_capacity(CIRCLE_SEGMENTS * 2);
    for i in 0..CIRCLE_SEGMENTS {
        let theta = (i as f64 / CIRCLE_SEGMENTS as f64) * std::f64::consts::TAU;
        out.push((radius * theta.cos()) as f32);
        out.push((radius * theta.sin()) as f32);
    }
    out
}

/// Line count and widest-line width for a text block.
///
/// Advance width is approximated as `0.6 * font_size` per character until a
/// shaping backend is wired in; line structure (explicit newlines, end and
/// word wrapping, max_lines truncation) is exact.
fn measure_text(text: &str, font_size: f64, wrap: Wrap, width: f64, max_lines: u32) -> (usize, f64) {
    let char_w = font_size * 0.6;
    let mut lines: Vec<usize> = Vec::new();

    for raw in text.split('\n') {
        let count = raw.chars().count();
        match wrap {
            Wrap::End if char_w > 0.0 && width >= char_w => {
                let per_line = (width / char_w).floor().max(1.0) as usize;
                if count == 0 {
                    lines.push(0);
                } else {
                    let mut rest = count;
                    while rest > 0 {
                        let take = rest.min(per_line);
                        lines.push(take);
                        rest -= take;
                    }
                }
            }
            Wrap::Word if char_w > 0.0 && width >= char_w => {
                let mut current = 0usize;
                let mut any = false;
                for word in raw.split_whitespace() {
                    any = true;
                    let len = word.chars().count();
                    if current == 0 {
                        current = len;
                    } else if (current + 1 + len) as f64 * char_w <= width {
                        current += 1 + len;
                    } else {
                        lines.push(current);
                        current = len;
                    }
                }
                if any {
                    lines.push(current);
                } else {
                    lines.push(0);
                }
            }
            _ => lines.push(count),
        }
    }

    if max_lines > 0 {
        lines.truncate(max_lines as usize);
    }
    let widest = lines.iter().copied().max().unwrap_or(0);
    (lines.len().max(1), widest as f64 * char_w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Modifiers;
    use crate::resource::LoadedTexture;
    use glint_animation::Easing;
    use glint_core::{PropertyValue, TextureHandle};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn snapshot_follows_paint_order_and_prunes_invisible() {
        let mut stage = Stage::new();
        let root = stage.create_group();
        let first = stage.create_rect();
        let hidden = stage.create_group();
        let inside_hidden = stage.create_rect();
        let last = stage.create_rect();

        stage.add(root, first).unwrap();
        stage.add(root, hidden).unwrap();
        stage.add(hidden, inside_hidden).unwrap();
        stage.add(root, last).unwrap();
        stage.set_root(root).unwrap();

        let visible = stage.base(hidden).unwrap().visible;
        stage.store_mut().set(visible, false).unwrap();

        let frame = stage.tick(0.0);
        let ids: Vec<NodeId> = frame.nodes.iter().map(|n| n.node).collect();
        assert_eq!(ids, vec![root, first, last]);
    }

    #[test]
    fn transforms_compose_down_the_tree() {
        let mut stage = Stage::new();
        let root = stage.create_group();
        let child = stage.create_rect();
        stage.add(root, child).unwrap();
        stage.set_root(root).unwrap();

        let root_base = stage.base(root).unwrap();
        let child_base = stage.base(child).unwrap();
        let store = stage.store_mut();
        store.set(root_base.x, 10.0).unwrap();
        store.set(root_base.y, 20.0).unwrap();
        store.set(child_base.x, 5.0).unwrap();

        let frame = stage.tick(0.0);
        let child_node = frame.nodes.iter().find(|n| n.node == child).unwrap();
        let [_, _, _, _, tx, ty] = child_node.transform.elements;
        assert!(close(tx, 15.0) && close(ty, 20.0));
    }

    #[test]
    fn origin_and_scale_shift_the_local_frame() {
        let mut stage = Stage::new();
        let rect = stage.create_rect();
        stage.set_root(rect).unwrap();

        let base = stage.base(rect).unwrap();
        let store = stage.store_mut();
        store.set(base.w, 100.0).unwrap();
        store.set(base.h, 50.0).unwrap();
        store.set(base.origin_x, 0.5).unwrap();
        store.set(base.origin_y, 0.5).unwrap();
        store.set(base.sx, 2.0).unwrap();
        store.set(base.sy, 2.0).unwrap();

        let frame = stage.tick(0.0);
        let [a, b, c, d, tx, ty] = frame.nodes[0].transform.elements;
        assert!(close(a, 2.0) && close(d, 2.0));
        assert!(close(b, 0.0) && close(c, 0.0));
        assert!(close(tx, -100.0) && close(ty, -50.0));
    }

    #[test]
    fn opacity_multiplies_through_groups() {
        let mut stage = Stage::new();
        let root = stage.create_group();
        let child = stage.create_rect();
        stage.add(root, child).unwrap();
        stage.set_root(root).unwrap();

        let root_opacity = stage.base(root).unwrap().opacity;
        let child_opacity = stage.base(child).unwrap().opacity;
        let store = stage.store_mut();
        store.set(root_opacity, 0.5).unwrap();
        store.set(child_opacity, 0.5).unwrap();

        let frame = stage.tick(0.0);
        let child_node = frame.nodes.iter().find(|n| n.node == child).unwrap();
        assert!(close(child_node.opacity, 0.25));
    }

    #[test]
    fn binding_survives_detach_but_not_destroy() {
        let mut stage = Stage::new();
        let group = stage.create_group();
        let rect = stage.create_rect();
        stage.add(group, rect).unwrap();

        let group_w = stage.base(group).unwrap().w;
        let rect_w = stage.base(rect).unwrap().w;
        stage.store_mut().bind(rect_w, group_w).unwrap();
        stage.store_mut().set(group_w, 300.0).unwrap();
        assert_eq!(stage.store().get_f64(rect_w), Some(300.0));

        // detached but alive: still tracking
        stage.remove(group, rect).unwrap();
        stage.store_mut().set(group_w, 400.0).unwrap();
        assert_eq!(stage.store().get_f64(rect_w), Some(400.0));

        // destroyed: binding goes inert, source keeps working
        stage.destroy(rect).unwrap();
        stage.store_mut().set(group_w, 500.0).unwrap();
        assert_eq!(stage.store().get_f64(group_w), Some(500.0));
        assert!(stage.store().get(rect_w).is_none());
    }

    #[test]
    fn animation_drives_cells_through_tick() {
        let mut stage = Stage::new();
        let rect = stage.create_rect();
        stage.set_root(rect).unwrap();
        let x = stage.base(rect).unwrap().x;

        stage
            .animate(x, Tween::new(100.0, 1000.0).easing(Easing::Linear))
            .unwrap();

        stage.tick(0.0);
        let frame = stage.tick(500.0);
        assert_eq!(stage.store().get_f64(x), Some(50.0));
        let [_, _, _, _, tx, _] = frame.nodes[0].transform.elements;
        assert!(close(tx, 50.0));
    }

    #[test]
    fn animating_detached_node_keeps_running() {
        let mut stage = Stage::new();
        let group = stage.create_group();
        let rect = stage.create_rect();
        stage.add(group, rect).unwrap();
        stage.set_root(group).unwrap();
        let x = stage.base(rect).unwrap().x;

        stage
            .animate(x, Tween::new(100.0, 1000.0).easing(Easing::Linear))
            .unwrap();
        stage.tick(0.0);

        stage.remove(group, rect).unwrap();
        stage.tick(500.0);
        assert_eq!(stage.store().get_f64(x), Some(50.0));
    }

    #[test]
    fn resource_completion_lands_on_next_tick() {
        let mut stage = Stage::new();
        let image = stage.create_image_view();
        stage.set_root(image).unwrap();

        let texture = stage.create_texture();
        stage.begin_load(texture).unwrap();
        let texture_cell = stage.texture(texture).unwrap().cell;

        let NodeKind::ImageView(cells) = &stage.node(image).unwrap().kind else {
            unreachable!()
        };
        let image_cell = cells.image;
        stage.store_mut().bind(image_cell, texture_cell).unwrap();

        let fired = Rc::new(RefCell::new(0));
        let f = Rc::clone(&fired);
        stage
            .store_mut()
            .watch(
                image_cell,
                Box::new(move |_, _, _, _| *f.borrow_mut() += 1),
                false,
            )
            .unwrap();

        let sender = stage.loader();
        std::thread::spawn(move || {
            sender.complete_texture(
                texture,
                Ok(LoadedTexture {
                    handle: TextureHandle(42),
                    width: 128,
                    height: 128,
                }),
            );
        })
        .join()
        .unwrap();

        // queued, not applied yet
        assert_eq!(*fired.borrow(), 0);

        let frame = stage.tick(0.0);
        assert_eq!(*fired.borrow(), 1);
        assert_eq!(
            stage.store().get(image_cell),
            Some(&PropertyValue::Texture(Some(TextureHandle(42))))
        );
        let RenderAttrs::ImageView { texture: tex, .. } = &frame.nodes[0].attrs else {
            unreachable!()
        };
        assert_eq!(*tex, Some(TextureHandle(42)));
    }

    #[test]
    fn text_layout_outputs_update_on_tick() {
        let mut stage = Stage::new();
        let text = stage.create_text();
        stage.set_root(text).unwrap();

        let NodeKind::Text(cells) = &stage.node(text).unwrap().kind else {
            unreachable!()
        };
        let cells = *cells;
        stage
            .store_mut()
            .set(cells.text, "hello\nworld!")
            .unwrap();

        stage.tick(0.0);
        // two lines, widest is "world!" at 6 chars of 0.6 * 20px
        assert_eq!(stage.store().get_f64(cells.line_nr), Some(2.0));
        assert_eq!(stage.store().get_f64(cells.line_w), Some(6.0 * 12.0));
    }

    #[test]
    fn word_wrap_and_max_lines() {
        // width fits 10 chars at size 10 (char_w 6.0)
        let (lines, _) = measure_text("alpha beta gamma", 10.0, Wrap::Word, 60.0, 0);
        assert_eq!(lines, 2); // "alpha beta" / "gamma"

        let (lines, _) = measure_text("alpha beta gamma", 10.0, Wrap::Word, 60.0, 1);
        assert_eq!(lines, 1);

        let (lines, _) = measure_text("abcdefghijkl", 10.0, Wrap::End, 60.0, 0);
        assert_eq!(lines, 2);

        let (lines, width) = measure_text("", 10.0, Wrap::None, 0.0, 0);
        assert_eq!(lines, 1);
        assert_eq!(width, 0.0);
    }

    #[test]
    fn circle_emits_tessellated_outline() {
        let mut stage = Stage::new();
        let circle = stage.create_circle();
        stage.set_root(circle).unwrap();

        let NodeKind::Circle(cells) = &stage.node(circle).unwrap().kind else {
            unreachable!()
        };
        let radius = cells.radius;
        stage.store_mut().set(radius, 10.0).unwrap();

        let frame = stage.tick(0.0);
        let RenderAttrs::Circle {
            radius, geometry, ..
        } = &frame.nodes[0].attrs
        else {
            unreachable!()
        };
        assert_eq!(*radius, 10.0);
        assert_eq!(geometry.len(), CIRCLE_SEGMENTS * 2);
        // first point sits on the positive x axis
        assert!((geometry[0] - 10.0).abs() < 1e-4);
        assert!(geometry[1].abs() < 1e-4);
    }

    #[test]
    fn dispatch_reaches_listeners_with_store_access() {
        let mut stage = Stage::new();
        let rect = stage.create_rect();
        let x = stage.base(rect).unwrap().x;

        stage.on(
            EventKind::Press,
            Some(rect),
            Box::new(move |event, store| {
                if let Event::Press { x: px, .. } = event {
                    store.set(x, *px).unwrap();
                }
            }),
        );

        stage.dispatch(&Event::Press {
            target: Some(rect),
            x: 77.0,
            y: 0.0,
            button: 0,
        });
        assert_eq!(stage.store().get_f64(x), Some(77.0));

        stage.dispatch(&Event::KeyPress {
            keycode: 65,
            ch: Some('a'),
            modifiers: Modifiers::default(),
        });
        assert_eq!(stage.store().get_f64(x), Some(77.0));
    }

    #[test]
    fn destroyed_root_yields_empty_frames() {
        let mut stage = Stage::new();
        let root = stage.create_group();
        stage.set_root(root).unwrap();
        stage.destroy(root).unwrap();

        let frame = stage.tick(0.0);
        assert!(frame.nodes.is_empty());
        assert_eq!(stage.root(), None);
    }

    #[test]
    fn snapshot_resolves_fonts_for_text() {
        let mut stage = Stage::new();
        let text = stage.create_text();
        stage.set_root(text).unwrap();

        let face = stage.register_font(FontSpec {
            name: "source".to_owned(),
            path: "fonts/source-400.ttf".to_owned(),
            weight: 400,
            style: "normal".to_owned(),
        });

        let frame = stage.tick(0.0);
        let RenderAttrs::Text { font, .. } = &frame.nodes[0].attrs else {
            unreachable!()
        };
        assert_eq!(*font, Some(face));
    }
}
