//! Pure mutations over [`Stack`] snapshots.
//!
//! Every function takes the current snapshot and returns a new one. Unknown ids and
//! out-of-range indices are no-ops that hand back the input snapshot unchanged, so callers
//! holding a stale view never need to pre-validate.

use crate::layers::factory::LayerFactory;
use crate::layers::model::{
    BlendMode, Layer, LayerId, LayerParams, LayerPatch, LoadState, SourceRef, Stack,
};

/// Opacity forced when a layer is switched to [`BlendMode::Average`] without an explicit value.
pub const AVERAGE_OPACITY: f32 = 0.5;

/// Append one layer.
///
/// Missing blend mode or opacity in `params` are drawn with the distribution algorithm for
/// `index = len`, `total = len + 1`. Explicit values win over drawn ones.
#[tracing::instrument(skip_all, fields(len = stack.len()))]
pub fn add_layer(
    stack: &Stack,
    params: Option<LayerParams>,
    factory: &mut LayerFactory,
) -> Stack {
    let params = params.unwrap_or_default();
    let index = stack.len();
    let layer = new_layer(index, index + 1, params, factory);
    stack.iter().cloned().chain(std::iter::once(layer)).collect()
}

/// Remove the layer with `id`.
pub fn remove_layer(stack: &Stack, id: &LayerId) -> Stack {
    if stack.position(id).is_none() {
        return stack.clone();
    }
    stack.iter().filter(|l| &l.id != id).cloned().collect()
}

/// Swap the layer at `index` with the one below it (`index - 1`).
pub fn move_up(stack: &Stack, index: usize) -> Stack {
    if index == 0 || index >= stack.len() {
        return stack.clone();
    }
    swapped(stack, index, index - 1)
}

/// Swap the layer at `index` with the one above it (`index + 1`).
pub fn move_down(stack: &Stack, index: usize) -> Stack {
    if index + 1 >= stack.len() {
        return stack.clone();
    }
    swapped(stack, index, index + 1)
}

/// Merge `patch` into the layer with `id`.
///
/// Switching to [`BlendMode::Average`] without an explicit opacity forces [`AVERAGE_OPACITY`].
pub fn set_property(stack: &Stack, id: &LayerId, patch: &LayerPatch) -> Stack {
    if stack.position(id).is_none() {
        return stack.clone();
    }
    map_matching(stack, id, |l| apply_patch(l, patch))
}

/// Flip visibility of the layer with `id`.
pub fn toggle_visibility(stack: &Stack, id: &LayerId) -> Stack {
    match stack.find(id) {
        Some(layer) => set_property(stack, id, &LayerPatch::visible(!layer.is_visible)),
        None => stack.clone(),
    }
}

/// Give one layer a fresh source and reset it to pending, keeping its blend parameters.
pub fn refresh_layer_image(stack: &Stack, id: &LayerId, factory: &mut LayerFactory) -> Stack {
    if stack.position(id).is_none() {
        return stack.clone();
    }
    map_matching(stack, id, |l| {
        l.source = factory.next_source();
        l.load_state = LoadState::Pending;
    })
}

/// Grow by appending distributed layers or shrink by truncating the tail.
#[tracing::instrument(skip(stack, factory), fields(len = stack.len()))]
pub fn resize(stack: &Stack, new_count: usize, factory: &mut LayerFactory) -> Stack {
    let len = stack.len();
    if new_count == len {
        return stack.clone();
    }
    if new_count < len {
        return stack.iter().take(new_count).cloned().collect();
    }

    let mut layers: Vec<Layer> = stack.iter().cloned().collect();
    for index in len..new_count {
        layers.push(new_layer(index, new_count, LayerParams::default(), factory));
    }
    Stack::from(layers)
}

/// Build the starting stack of `count` distributed layers.
pub fn initial_stack(count: usize, factory: &mut LayerFactory) -> Stack {
    resize(&Stack::empty(), count, factory)
}

/// Re-roll blend mode and opacity of every layer; ids and sources are kept.
#[tracing::instrument(skip_all, fields(len = stack.len()))]
pub fn remix(stack: &Stack, factory: &mut LayerFactory) -> Stack {
    let total = stack.len();
    stack
        .iter()
        .enumerate()
        .map(|(index, l)| {
            let (blend_mode, opacity) = factory.distribute(index, total);
            Layer {
                blend_mode,
                opacity,
                ..l.clone()
            }
        })
        .collect()
}

/// Like [`remix`], but also assigns every layer a fresh source and resets it to pending.
#[tracing::instrument(skip_all, fields(len = stack.len()))]
pub fn reload_images(stack: &Stack, factory: &mut LayerFactory) -> Stack {
    let total = stack.len();
    stack
        .iter()
        .enumerate()
        .map(|(index, l)| {
            let (blend_mode, opacity) = factory.distribute(index, total);
            Layer {
                source: factory.next_source(),
                blend_mode,
                opacity,
                load_state: LoadState::Pending,
                ..l.clone()
            }
        })
        .collect()
}

/// Set every layer to [`BlendMode::Average`] with opacity `1 / count`.
pub fn equalize(stack: &Stack) -> Stack {
    if stack.is_empty() {
        return stack.clone();
    }
    let opacity = 1.0 / stack.len() as f32;
    stack
        .iter()
        .map(|l| Layer {
            blend_mode: BlendMode::Average,
            opacity,
            ..l.clone()
        })
        .collect()
}

/// Mark the layer with `id` as resolved, but only while it still points at `source`.
///
/// Returns `None` when the completion is stale (layer gone, source replaced, or already
/// settled), in which case the caller keeps its snapshot.
pub fn settle_load(
    stack: &Stack,
    id: &LayerId,
    source: &SourceRef,
    state: LoadState,
) -> Option<Stack> {
    let layer = stack.find(id)?;
    if &layer.source != source || layer.load_state != LoadState::Pending {
        return None;
    }
    Some(map_matching(stack, id, |l| l.load_state = state))
}

fn new_layer(
    index: usize,
    total: usize,
    params: LayerParams,
    factory: &mut LayerFactory,
) -> Layer {
    let (drawn_mode, drawn_opacity) = factory.distribute(index, total);
    let blend_mode = params.blend_mode.unwrap_or(drawn_mode);
    let opacity = match (params.blend_mode, params.opacity) {
        (_, Some(o)) => sanitize_opacity(o).unwrap_or(drawn_opacity),
        (Some(BlendMode::Average), None) => AVERAGE_OPACITY,
        _ => drawn_opacity,
    };

    Layer {
        id: factory.next_id(),
        source: params.source.unwrap_or_else(|| factory.next_source()),
        blend_mode,
        opacity,
        is_visible: true,
        display_name: params
            .display_name
            .unwrap_or_else(|| format!("Layer {}", index + 1)),
        load_state: LoadState::Pending,
    }
}

fn apply_patch(layer: &mut Layer, patch: &LayerPatch) {
    if let Some(mode) = patch.blend_mode {
        layer.blend_mode = mode;
        if mode == BlendMode::Average && patch.opacity.is_none() {
            layer.opacity = AVERAGE_OPACITY;
        }
    }
    if let Some(o) = patch.opacity.and_then(sanitize_opacity) {
        layer.opacity = o;
    }
    if let Some(v) = patch.is_visible {
        layer.is_visible = v;
    }
    if let Some(name) = &patch.display_name {
        layer.display_name = name.clone();
    }
}

fn sanitize_opacity(o: f32) -> Option<f32> {
    o.is_finite().then_some(o.clamp(0.0, 1.0))
}

fn swapped(stack: &Stack, a: usize, b: usize) -> Stack {
    let mut layers: Vec<Layer> = stack.iter().cloned().collect();
    layers.swap(a, b);
    Stack::from(layers)
}

fn map_matching(stack: &Stack, id: &LayerId, mut f: impl FnMut(&mut Layer)) -> Stack {
    stack
        .iter()
        .cloned()
        .map(|mut l| {
            if &l.id == id {
                f(&mut l);
            }
            l
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/layers/store.rs"]
mod tests;
