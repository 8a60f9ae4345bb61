//! Texture and font load completions, marshaled onto the frame loop.
//!
//! The engine never performs I/O itself. The host obtains a cloneable
//! [`ResourceSender`], decodes on whatever thread it likes, and reports the
//! outcome. Completions queue on a channel and are applied at the start of
//! the next tick through the normal property-write path, so all cell
//! mutation stays on the frame-loop thread.

use crate::error::ResourceError;
use crate::fonts::{FontId, FontRegistry};
use glint_core::{CellId, FontHandle, OwnerId, PropertyStore, PropertyValue, TextureHandle};
use slotmap::{new_key_type, SlotMap};
use std::sync::mpsc;

new_key_type! {
    /// Handle to a texture proxy.
    pub struct TextureId;
}

/// Lifecycle of an externally loaded resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceState {
    Unloaded,
    Loading,
    Loaded,
    Error,
}

/// Payload for a successful texture load.
#[derive(Clone, Copy, Debug)]
pub struct LoadedTexture {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
}

pub(crate) enum Completion {
    Texture {
        id: TextureId,
        result: Result<LoadedTexture, String>,
    },
    Font {
        id: FontId,
        result: Result<FontHandle, String>,
    },
}

/// Cloneable, `Send` handle for reporting load outcomes from any thread.
///
/// Sending after the owning stage is gone is harmless; the completion is
/// silently dropped.
#[derive(Clone)]
pub struct ResourceSender {
    tx: mpsc::Sender<Completion>,
}

impl ResourceSender {
    pub fn complete_texture(&self, id: TextureId, result: Result<LoadedTexture, String>) {
        let _ = self.tx.send(Completion::Texture { id, result });
    }

    pub fn complete_font(&self, id: FontId, result: Result<FontHandle, String>) {
        let _ = self.tx.send(Completion::Font { id, result });
    }
}

pub struct TextureProxy {
    pub state: ResourceState,
    pub dimensions: Option<(u32, u32)>,
    pub handle: Option<TextureHandle>,
    /// Why the load failed, when `state` is `Error`.
    pub error: Option<ResourceError>,
    /// Read-only `Texture` cell; image views bind their `image` cell here.
    pub cell: CellId,
}

pub(crate) struct ResourceTable {
    proxies: SlotMap<TextureId, TextureProxy>,
    tx: mpsc::Sender<Completion>,
    rx: mpsc::Receiver<Completion>,
}

impl ResourceTable {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            proxies: SlotMap::with_key(),
            tx,
            rx,
        }
    }

    pub fn sender(&self) -> ResourceSender {
        ResourceSender {
            tx: self.tx.clone(),
        }
    }

    pub fn create_texture(&mut self, store: &mut PropertyStore) -> TextureId {
        let cell = store.create_readonly(OwnerId::NONE, PropertyValue::Texture(None));
        self.proxies.insert(TextureProxy {
            state: ResourceState::Unloaded,
            dimensions: None,
            handle: None,
            error: None,
            cell,
        })
    }

    /// Mark a proxy as loading.
    ///
    /// A proxy can be loaded once; calling this again after the first
    /// transition fails with [`ResourceError::AlreadyCompleted`].
    pub fn begin_load(&mut self, id: TextureId) -> Result<(), ResourceError> {
        match self.proxies.get_mut(id) {
            Some(proxy) if proxy.state == ResourceState::Unloaded => {
                proxy.state = ResourceState::Loading;
                Ok(())
            }
            _ => Err(ResourceError::AlreadyCompleted),
        }
    }

    pub fn proxy(&self, id: TextureId) -> Option<&TextureProxy> {
        self.proxies.get(id)
    }

    /// Apply all queued completions. Called at the start of each tick.
    pub fn drain(&mut self, store: &mut PropertyStore, fonts: &mut FontRegistry) {
        while let Ok(completion) = self.rx.try_recv() {
            match completion {
                Completion::Texture { id, result } => self.apply_texture(store, id, result),
                Completion::Font { id, result } => fonts.complete(store, id, result),
            }
        }
    }

    fn apply_texture(
        &mut self,
        store: &mut PropertyStore,
        id: TextureId,
        result: Result<LoadedTexture, String>,
    ) {
        let Some(proxy) = self.proxies.get_mut(id) else {
            tracing::warn!(?id, "completion for unknown texture, ignoring");
            return;
        };
        if proxy.state != ResourceState::Loading {
            tracing::warn!(?id, state = ?proxy.state, "duplicate texture completion, ignoring");
            return;
        }
        match result {
            Ok(loaded) => {
                proxy.state = ResourceState::Loaded;
                proxy.dimensions = Some((loaded.width, loaded.height));
                proxy.handle = Some(loaded.handle);
                let cell = proxy.cell;
                if let Err(err) =
                    store.set_internal(cell, PropertyValue::Texture(Some(loaded.handle)))
                {
                    tracing::warn!(?id, %err, "could not publish loaded texture");
                }
            }
            Err(reason) => {
                proxy.state = ResourceState::Error;
                tracing::warn!(?id, %reason, "texture load failed");
                proxy.error = Some(ResourceError::Load(reason));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_is_deferred_until_drain() {
        let mut store = PropertyStore::new();
        let mut fonts = FontRegistry::new();
        let mut table = ResourceTable::new();

        let tex = table.create_texture(&mut store);
        table.begin_load(tex).unwrap();
        let cell = table.proxy(tex).unwrap().cell;

        let sender = table.sender();
        sender.complete_texture(
            tex,
            Ok(LoadedTexture {
                handle: TextureHandle(11),
                width: 64,
                height: 32,
            }),
        );

        // not yet applied
        assert_eq!(table.proxy(tex).unwrap().state, ResourceState::Loading);
        assert_eq!(store.get(cell), Some(&PropertyValue::Texture(None)));

        table.drain(&mut store, &mut fonts);
        assert_eq!(table.proxy(tex).unwrap().state, ResourceState::Loaded);
        assert_eq!(table.proxy(tex).unwrap().dimensions, Some((64, 32)));
        assert_eq!(
            store.get(cell),
            Some(&PropertyValue::Texture(Some(TextureHandle(11))))
        );
    }

    #[test]
    fn begin_load_transitions_once() {
        let mut store = PropertyStore::new();
        let mut table = ResourceTable::new();
        let tex = table.create_texture(&mut store);

        assert!(table.begin_load(tex).is_ok());
        assert!(matches!(
            table.begin_load(tex),
            Err(ResourceError::AlreadyCompleted)
        ));
    }

    #[test]
    fn duplicate_completion_ignored() {
        let mut store = PropertyStore::new();
        let mut fonts = FontRegistry::new();
        let mut table = ResourceTable::new();
        let tex = table.create_texture(&mut store);
        table.begin_load(tex).unwrap();

        let sender = table.sender();
        let loaded = |h| {
            Ok(LoadedTexture {
                handle: TextureHandle(h),
                width: 1,
                height: 1,
            })
        };
        sender.complete_texture(tex, loaded(1));
        sender.complete_texture(tex, loaded(2));
        table.drain(&mut store, &mut fonts);

        assert_eq!(table.proxy(tex).unwrap().handle, Some(TextureHandle(1)));
    }

    #[test]
    fn failed_load_reaches_error_state() {
        let mut store = PropertyStore::new();
        let mut fonts = FontRegistry::new();
        let mut table = ResourceTable::new();
        let tex = table.create_texture(&mut store);
        table.begin_load(tex).unwrap();
        let cell = table.proxy(tex).unwrap().cell;

        table.sender().complete_texture(tex, Err("decode failed".to_owned()));
        table.drain(&mut store, &mut fonts);

        let proxy = table.proxy(tex).unwrap();
        assert_eq!(proxy.state, ResourceState::Error);
        assert!(matches!(
            proxy.error,
            Some(ResourceError::Load(ref reason)) if reason == "decode failed"
        ));
        // the cell is untouched on failure
        assert_eq!(store.get(cell), Some(&PropertyValue::Texture(None)));
    }

    #[test]
    fn sender_works_from_another_thread() {
        let mut store = PropertyStore::new();
        let mut fonts = FontRegistry::new();
        let mut table = ResourceTable::new();
        let tex = table.create_texture(&mut store);
        table.begin_load(tex).unwrap();

        let sender = table.sender();
        std::thread::spawn(move || {
            sender.complete_texture(
                tex,
                Ok(LoadedTexture {
                    handle: TextureHandle(5),
                    width: 8,
                    height: 8,
                }),
            );
        })
        .join()
        .unwrap();

        table.drain(&mut store, &mut fonts);
        assert_eq!(table.proxy(tex).unwrap().state, ResourceState::Loaded);
    }
}
