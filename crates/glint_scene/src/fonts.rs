//! Engine-scoped font registry.
//!
//! Faces are registered up front with a name, weight, and style; text nodes
//! refer to them by name. Resolution picks the registered face with the
//! nearest weight, so asking for 350 on a family with 300 and 700 yields
//! the 300 face. No process-global state: each `Stage` owns its registry.

use crate::error::ResourceError;
use crate::resource::ResourceState;
use glint_core::{FontHandle, OwnerId, PropertyStore, PropertyValue};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a registered font face.
    pub struct FontId;
}

/// Descriptor for one font face to register.
#[derive(Clone, Debug)]
pub struct FontSpec {
    /// Family name text nodes select with `font_name`.
    pub name: String,
    /// Source path or URL, handed to the host loader.
    pub path: String,
    pub weight: u32,
    /// `"normal"` or `"italic"`.
    pub style: String,
}

pub struct FontFace {
    pub spec: FontSpec,
    pub state: ResourceState,
    pub handle: Option<FontHandle>,
    /// Read-only `Font` cell written when loading completes.
    pub cell: glint_core::CellId,
}

#[derive(Default)]
pub struct FontRegistry {
    faces: SlotMap<FontId, FontFace>,
    by_name: FxHashMap<String, Vec<FontId>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a face. A face with the same name, weight, and style
    /// replaces the existing registration with a warning.
    pub fn register_font(&mut self, store: &mut PropertyStore, spec: FontSpec) -> FontId {
        let ids = self.by_name.entry(spec.name.clone()).or_default();
        if let Some(pos) = ids.iter().position(|id| {
            let face = &self.faces[*id];
            face.spec.weight == spec.weight && face.spec.style == spec.style
        }) {
            tracing::warn!(
                name = %spec.name,
                weight = spec.weight,
                style = %spec.style,
                "font face re-registered, replacing previous"
            );
            let old = ids.remove(pos);
            if let Some(face) = self.faces.remove(old) {
                store.remove_cell(face.cell);
            }
        }

        let name = spec.name.clone();
        let cell = store.create_readonly(OwnerId::NONE, PropertyValue::Font(None));
        let id = self.faces.insert(FontFace {
            spec,
            state: ResourceState::Loading,
            handle: None,
            cell,
        });
        self.by_name.entry(name).or_default().push(id);
        id
    }

    /// Apply a load completion from the host. At most one completion per
    /// face is honored.
    pub(crate) fn complete(
        &mut self,
        store: &mut PropertyStore,
        id: FontId,
        result: Result<FontHandle, String>,
    ) {
        let Some(face) = self.faces.get_mut(id) else {
            tracing::warn!(?id, "completion for unknown font face, ignoring");
            return;
        };
        if face.state != ResourceState::Loading {
            tracing::warn!(?id, state = ?face.state, "duplicate font completion, ignoring");
            return;
        }
        match result {
            Ok(handle) => {
                face.state = ResourceState::Loaded;
                face.handle = Some(handle);
                let cell = face.cell;
                if let Err(err) = store.set_internal(cell, PropertyValue::Font(Some(handle))) {
                    tracing::warn!(?id, %err, "could not publish loaded font");
                }
            }
            Err(reason) => {
                face.state = ResourceState::Error;
                tracing::warn!(?id, %reason, "font load failed");
            }
        }
    }

    /// Pick the face for `name` whose weight is nearest to `weight`,
    /// preferring an exact style match.
    pub fn resolve(&self, name: &str, weight: u32, style: &str) -> Result<FontId, ResourceError> {
        let ids = self
            .by_name
            .get(name)
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| ResourceError::UnknownFont(name.to_owned()))?;

        let styled: Vec<FontId> = ids
            .iter()
            .copied()
            .filter(|id| self.faces[*id].spec.style == style)
            .collect();
        let candidates = if styled.is_empty() {
            ids.as_slice()
        } else {
            styled.as_slice()
        };

        candidates
            .iter()
            .copied()
            .min_by_key(|id| {
                let w = self.faces[*id].spec.weight;
                (w.abs_diff(weight), w)
            })
            .ok_or_else(|| ResourceError::UnknownFont(name.to_owned()))
    }

    pub fn face(&self, id: FontId) -> Option<&FontFace> {
        self.faces.get(id)
    }

    pub fn state(&self, id: FontId) -> Option<ResourceState> {
        self.faces.get(id).map(|face| face.state)
    }

    pub fn handle(&self, id: FontId) -> Option<FontHandle> {
        self.faces.get(id).and_then(|face| face.handle)
    }
}
