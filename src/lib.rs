//! Lumina is a layered image compositor.
//!
//! A [`Stack`] of image [`Layer`]s is flattened bottom to top onto an opaque white canvas. Each
//! layer carries a [`BlendMode`] and an opacity; new layers receive balanced defaults from a
//! seeded distribution so the stack stays visually dense without washing out.
//!
//! # Pipeline overview
//!
//! 1. **Edit**: store operations (`add_layer`, `set_property`, `remix`, ...) take a stack and
//!    return a new snapshot; the input is never mutated.
//! 2. **Load**: pending layers are fetched and decoded in the background by an [`ImageLoader`].
//! 3. **Compile**: `Stack -> CompositePlan` picks the participating layers and collects
//!    warnings for the ones that cannot contribute.
//! 4. **Composite**: a [`CompositeBackend`] executes the plan into RGBA8 pixels.
//! 5. **Export** (optional): encode to PNG or JPEG on disk.
//!
//! [`StudioSession`] ties these together for interactive use. Preview and export use the same
//! backend, so a preview is pixel-identical to an export at the same resolution.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod encode;
mod foundation;
mod layers;
mod persist;
mod render;
mod session;

pub use assets::cache::ImageCache;
pub use assets::decode::{PreparedImage, decode_image};
#[cfg(feature = "http")]
pub use assets::fetch::HttpFetcher;
pub use assets::fetch::{DefaultFetcher, FsFetcher, ImageFetcher};
pub use assets::loader::{ImageLoader, LoadCompletion};
pub use assets::source::{DirectorySource, ImageSource, PicsumSource};
pub use encode::export::{ExportFormat, encode_composite, export_file_name, write_export};
pub use foundation::core::{Canvas, Rgba8, now_ms};
pub use foundation::error::{LuminaError, LuminaResult};
pub use foundation::math::Rng64;
pub use layers::distribute::{DENSITY_BUDGET, MAX_OPACITY, MIN_OPACITY, distribute};
pub use layers::factory::LayerFactory;
pub use layers::model::{
    BlendMode, Layer, LayerId, LayerParams, LayerPatch, LoadState, SourceRef, Stack,
};
pub use layers::preset::{PRESETS_KEY, Preset, PresetLibrary};
pub use layers::store::{
    AVERAGE_OPACITY, add_layer, equalize, initial_stack, move_down, move_up,
    refresh_layer_image, reload_images, remix, remove_layer, resize, set_property, settle_load,
    toggle_visibility,
};
pub use persist::kv::{FsKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use render::backend::{
    BackendKind, Composite, CompositeBackend, CompositeSettings, CpuCompositor, composite_stack,
    create_backend,
};
pub use render::blend::{Rgb, blend_rgb};
pub use render::composite::{merge_in_place, merge_pixel};
pub use render::plan::{
    BACKGROUND, BlendOp, CompositePlan, CompositeWarning, WarningKind, compile_plan,
};
pub use render::resample::{ResampleFilter, stretch_to_canvas};
pub use session::opts::StudioOpts;
pub use session::studio::StudioSession;
