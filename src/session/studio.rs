//! The editing session: one canonical stack plus everything needed to change and render it.
//!
//! Every mutation replaces the stack with a new snapshot and starts loads for any layer left
//! pending. Loads finish in the background; [`StudioSession::poll_loads`] folds their results in.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::cache::ImageCache;
use crate::assets::fetch::ImageFetcher;
use crate::assets::loader::ImageLoader;
use crate::assets::source::ImageSource;
use crate::encode::export::write_export;
use crate::foundation::core::{Canvas, now_ms};
use crate::foundation::error::LuminaResult;
use crate::layers::factory::LayerFactory;
use crate::layers::model::{LayerId, LayerParams, LayerPatch, Stack};
use crate::layers::preset::{Preset, PresetLibrary};
use crate::layers::store;
use crate::persist::kv::KeyValueStore;
use crate::render::backend::{
    BackendKind, Composite, CompositeBackend, CompositeSettings, create_backend,
};
use crate::session::opts::StudioOpts;

/// Interactive compositing session.
pub struct StudioSession {
    opts: StudioOpts,
    stack: Stack,
    factory: LayerFactory,
    loader: ImageLoader,
    backend: Box<dyn CompositeBackend>,
    store: Box<dyn KeyValueStore>,
    presets: PresetLibrary,
}

impl StudioSession {
    /// Open a session with a freshly generated stack of `opts.initial_layers` layers.
    pub fn new(
        opts: StudioOpts,
        images: Arc<dyn ImageSource>,
        fetcher: Arc<dyn ImageFetcher>,
        store: Box<dyn KeyValueStore>,
    ) -> LuminaResult<Self> {
        let mut session = Self::with_stack(opts, Stack::empty(), images, fetcher, store)?;
        let stack = store::initial_stack(session.opts.initial_layers, &mut session.factory);
        session.replace_stack(stack);
        Ok(session)
    }

    /// Open a session around an existing stack, e.g. one read back from disk.
    pub fn with_stack(
        opts: StudioOpts,
        stack: Stack,
        images: Arc<dyn ImageSource>,
        fetcher: Arc<dyn ImageFetcher>,
        store: Box<dyn KeyValueStore>,
    ) -> LuminaResult<Self> {
        opts.validate()?;
        let factory = match opts.seed {
            Some(seed) => LayerFactory::new(seed, images),
            None => LayerFactory::from_entropy(images),
        };
        let backend = create_backend(
            BackendKind::Cpu,
            &CompositeSettings {
                filter: opts.filter,
            },
        )?;
        let presets = PresetLibrary::load(store.as_ref(), &opts.presets_key);

        let mut session = Self {
            opts,
            stack: Stack::empty(),
            factory,
            loader: ImageLoader::new(fetcher),
            backend,
            store,
            presets,
        };
        session.replace_stack(stack);
        Ok(session)
    }

    /// Active configuration.
    pub fn opts(&self) -> &StudioOpts {
        &self.opts
    }

    /// Current stack snapshot.
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Decoded pixels known to this session.
    pub fn images(&self) -> &ImageCache {
        self.loader.cache()
    }

    /// Saved presets, oldest first.
    pub fn presets(&self) -> &PresetLibrary {
        &self.presets
    }

    /// Swap in an externally built stack. Its layers are reloaded from scratch.
    pub fn replace_stack(&mut self, stack: Stack) {
        self.commit(stack.with_pending_loads());
    }

    /// Append a layer and return its id.
    pub fn add_layer(&mut self, params: Option<LayerParams>) -> LayerId {
        let next = store::add_layer(&self.stack, params, &mut self.factory);
        let id = next
            .layers()
            .last()
            .map(|l| l.id.clone())
            .unwrap_or_else(|| LayerId(String::new()));
        self.commit(next);
        id
    }

    /// Remove a layer. The last remaining layer cannot be removed. Returns `true` on change.
    pub fn remove_layer(&mut self, id: &LayerId) -> bool {
        if self.stack.len() <= 1 {
            tracing::debug!(layer = %id, "refusing to remove the last layer");
            return false;
        }
        let next = store::remove_layer(&self.stack, id);
        self.commit(next)
    }

    /// Move the layer at `index` one step toward the bottom.
    pub fn move_up(&mut self, index: usize) -> bool {
        let next = store::move_up(&self.stack, index);
        self.commit(next)
    }

    /// Move the layer at `index` one step toward the top.
    pub fn move_down(&mut self, index: usize) -> bool {
        let next = store::move_down(&self.stack, index);
        self.commit(next)
    }

    /// Merge `patch` into the layer `id`.
    pub fn set_property(&mut self, id: &LayerId, patch: &LayerPatch) -> bool {
        let next = store::set_property(&self.stack, id, patch);
        self.commit(next)
    }

    /// Flip visibility of the layer `id`.
    pub fn toggle_visibility(&mut self, id: &LayerId) -> bool {
        let next = store::toggle_visibility(&self.stack, id);
        self.commit(next)
    }

    /// Give the layer `id` a new image, keeping its other parameters.
    pub fn refresh_layer_image(&mut self, id: &LayerId) -> bool {
        let next = store::refresh_layer_image(&self.stack, id, &mut self.factory);
        self.commit(next)
    }

    /// Grow or shrink to `count` layers. At least one layer is always kept.
    pub fn resize(&mut self, count: usize) -> bool {
        let next = store::resize(&self.stack, count.max(1), &mut self.factory);
        self.commit(next)
    }

    /// Redraw blend modes and opacities for every layer.
    pub fn remix(&mut self) -> bool {
        let next = store::remix(&self.stack, &mut self.factory);
        self.commit(next)
    }

    /// New images and parameters for every layer.
    pub fn reload_images(&mut self) -> bool {
        let next = store::reload_images(&self.stack, &mut self.factory);
        self.commit(next)
    }

    /// Every layer to `Average` at `1/n`.
    pub fn equalize(&mut self) -> bool {
        let next = store::equalize(&self.stack);
        self.commit(next)
    }

    /// Fold finished background loads into the stack. Returns `true` when anything changed.
    pub fn poll_loads(&mut self) -> bool {
        let next = self.loader.poll(&self.stack);
        let changed = !next.ptr_eq(&self.stack);
        self.stack = next;
        changed
    }

    /// Block until every visible layer has finished loading.
    pub fn settle_loads(&mut self) {
        self.stack = self.loader.settle(&self.stack);
    }

    /// Composite the current stack at preview size without waiting for pending loads.
    pub fn preview(&mut self) -> LuminaResult<Composite> {
        self.poll_loads();
        let canvas = self.opts.preview_canvas();
        self.render(canvas)
    }

    /// Composite the current stack at an arbitrary size.
    pub fn render(&mut self, canvas: Canvas) -> LuminaResult<Composite> {
        self.backend
            .composite(&self.stack, canvas, self.loader.cache())
    }

    /// Wait for loads, composite at full size and write the file into `dir`.
    #[tracing::instrument(skip(self), fields(layers = self.stack.len()))]
    pub fn export(&mut self, dir: &Path) -> LuminaResult<PathBuf> {
        self.settle_loads();
        let composite = self.render(self.opts.canvas)?;
        write_export(&composite, dir, now_ms(), self.opts.export_format)
    }

    /// Save the current stack as a named preset and persist the library.
    pub fn save_preset(&mut self, name: &str) -> LuminaResult<Preset> {
        let preset = Preset::named(
            self.factory.next_preset_id(),
            name,
            now_ms(),
            &self.stack,
        )?;
        let mut next = self.presets.clone();
        next.insert(preset.clone());
        next.save(self.store.as_mut(), &self.opts.presets_key)?;
        self.presets = next;
        tracing::info!(id = %preset.id, name = %preset.name, "saved preset");
        Ok(preset)
    }

    /// Replace the stack with a copy of preset `id`. Returns `false` for unknown ids.
    pub fn load_preset(&mut self, id: &str) -> bool {
        let Some(preset) = self.presets.get(id) else {
            tracing::debug!(id, "unknown preset");
            return false;
        };
        let stack = preset.instantiate();
        self.commit(stack);
        true
    }

    /// Delete preset `id` and persist the library. Returns `false` for unknown ids.
    pub fn delete_preset(&mut self, id: &str) -> LuminaResult<bool> {
        let mut next = self.presets.clone();
        if !next.remove(id) {
            return Ok(false);
        }
        next.save(self.store.as_mut(), &self.opts.presets_key)?;
        self.presets = next;
        Ok(true)
    }

    fn commit(&mut self, next: Stack) -> bool {
        if next.ptr_eq(&self.stack) {
            return false;
        }
        self.stack = next;
        self.loader.retain(&self.stack);
        self.loader.request(&self.stack);
        true
    }
}

impl std::fmt::Debug for StudioSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioSession")
            .field("opts", &self.opts)
            .field("layers", &self.stack.len())
            .field("presets", &self.presets.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/studio.rs"]
mod tests;
