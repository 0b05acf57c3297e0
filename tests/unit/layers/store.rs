use std::sync::Arc;

use super::*;
use crate::assets::source::PicsumSource;

fn factory(seed: u64) -> LayerFactory {
    LayerFactory::new(seed, Arc::new(PicsumSource::default()))
}

fn ids(stack: &Stack) -> Vec<String> {
    stack.iter().map(|l| l.id.0.clone()).collect()
}

fn four() -> (Stack, LayerFactory) {
    let mut f = factory(1);
    let s = initial_stack(4, &mut f);
    (s, f)
}

#[test]
fn add_layer_appends_pending_distributed_layer() {
    let mut f = factory(7);
    let s = add_layer(&Stack::empty(), None, &mut f);
    let s = add_layer(&s, None, &mut f);
    assert_eq!(s.len(), 2);
    let top = &s.layers()[1];
    assert_eq!(top.load_state, LoadState::Pending);
    assert!(top.is_visible);
    assert_eq!(top.display_name, "Layer 2");
    assert!((0.05..=1.0).contains(&top.opacity));
    assert_ne!(s.layers()[0].id, top.id);
}

#[test]
fn add_layer_respects_explicit_params() {
    let mut f = factory(7);
    let params = LayerParams {
        blend_mode: Some(BlendMode::Multiply),
        opacity: Some(0.33),
        source: Some(SourceRef("red.png".to_string())),
        display_name: Some("Base".to_string()),
    };
    let s = add_layer(&Stack::empty(), Some(params), &mut f);
    let l = &s.layers()[0];
    assert_eq!(l.blend_mode, BlendMode::Multiply);
    assert_eq!(l.opacity, 0.33);
    assert_eq!(l.source.as_str(), "red.png");
    assert_eq!(l.display_name, "Base");
}

#[test]
fn add_layer_average_without_opacity_gets_half() {
    let mut f = factory(7);
    let params = LayerParams {
        blend_mode: Some(BlendMode::Average),
        ..LayerParams::default()
    };
    let s = add_layer(&Stack::empty(), Some(params), &mut f);
    assert_eq!(s.layers()[0].opacity, AVERAGE_OPACITY);
}

#[test]
fn add_layer_does_not_touch_previous_snapshot() {
    let (s, mut f) = four();
    let before = s.clone();
    let after = add_layer(&s, None, &mut f);
    assert_eq!(s, before);
    assert_eq!(after.len(), 5);
}

#[test]
fn remove_layer_by_id_and_unknown_is_noop() {
    let (s, _) = four();
    let victim = s.layers()[1].id.clone();
    let removed = remove_layer(&s, &victim);
    assert_eq!(removed.len(), 3);
    assert!(removed.find(&victim).is_none());

    let same = remove_layer(&s, &LayerId("missing".to_string()));
    assert!(same.ptr_eq(&s));
}

#[test]
fn remove_last_remaining_layer_is_allowed_at_store_level() {
    let mut f = factory(2);
    let s = initial_stack(1, &mut f);
    let id = s.layers()[0].id.clone();
    assert!(remove_layer(&s, &id).is_empty());
}

#[test]
fn move_up_then_down_restores_order() {
    let (s, _) = four();
    for index in 1..s.len() - 1 {
        let moved = move_up(&s, index);
        assert_ne!(ids(&moved), ids(&s));
        let back = move_down(&moved, index - 1);
        assert_eq!(ids(&back), ids(&s));
    }
}

#[test]
fn move_up_swaps_with_previous_index() {
    let (s, _) = four();
    let moved = move_up(&s, 2);
    assert_eq!(moved.layers()[1].id, s.layers()[2].id);
    assert_eq!(moved.layers()[2].id, s.layers()[1].id);
    assert_eq!(moved.layers()[1], s.layers()[2]);
}

#[test]
fn boundary_and_out_of_range_moves_are_identity() {
    let (s, _) = four();
    assert_eq!(move_up(&s, 0), s);
    assert_eq!(move_down(&s, s.len() - 1), s);
    assert_eq!(move_up(&s, 99), s);
    assert_eq!(move_down(&s, 99), s);
    assert_eq!(move_down(&Stack::empty(), 0), Stack::empty());
}

#[test]
fn set_property_merges_partial_update() {
    let (s, _) = four();
    let id = s.layers()[0].id.clone();
    let patch = LayerPatch {
        opacity: Some(0.25),
        display_name: Some("Renamed".to_string()),
        ..LayerPatch::default()
    };
    let out = set_property(&s, &id, &patch);
    let l = out.find(&id).unwrap();
    assert_eq!(l.opacity, 0.25);
    assert_eq!(l.display_name, "Renamed");
    assert_eq!(l.blend_mode, s.layers()[0].blend_mode);
    assert_eq!(out.layers()[1], s.layers()[1]);
}

#[test]
fn set_property_average_forces_half_opacity_unless_explicit() {
    let (s, _) = four();
    let id = s.layers()[2].id.clone();

    let out = set_property(&s, &id, &LayerPatch::blend_mode(BlendMode::Average));
    assert_eq!(out.find(&id).unwrap().opacity, 0.5);

    let explicit = LayerPatch {
        blend_mode: Some(BlendMode::Average),
        opacity: Some(0.8),
        ..LayerPatch::default()
    };
    let out = set_property(&s, &id, &explicit);
    assert_eq!(out.find(&id).unwrap().opacity, 0.8);
}

#[test]
fn set_property_clamps_and_ignores_non_finite_opacity() {
    let (s, _) = four();
    let id = s.layers()[0].id.clone();
    let out = set_property(&s, &id, &LayerPatch::opacity(4.0));
    assert_eq!(out.find(&id).unwrap().opacity, 1.0);
    let out = set_property(&s, &id, &LayerPatch::opacity(f32::NAN));
    assert_eq!(out.find(&id).unwrap().opacity, s.layers()[0].opacity);
}

#[test]
fn set_property_unknown_id_is_noop() {
    let (s, _) = four();
    let out = set_property(
        &s,
        &LayerId("nope".to_string()),
        &LayerPatch::opacity(0.1),
    );
    assert!(out.ptr_eq(&s));
}

#[test]
fn toggle_visibility_flips() {
    let (s, _) = four();
    let id = s.layers()[3].id.clone();
    let hidden = toggle_visibility(&s, &id);
    assert!(!hidden.find(&id).unwrap().is_visible);
    let shown = toggle_visibility(&hidden, &id);
    assert!(shown.find(&id).unwrap().is_visible);
}

#[test]
fn resize_grows_with_continuing_indices_and_shrinks_from_tail() {
    let (s, mut f) = four();
    let grown = resize(&s, 6, &mut f);
    assert_eq!(grown.len(), 6);
    assert_eq!(&ids(&grown)[..4], &ids(&s)[..]);
    assert_eq!(grown.layers()[4].display_name, "Layer 5");
    assert_eq!(grown.layers()[5].display_name, "Layer 6");

    let shrunk = resize(&grown, 2, &mut f);
    assert_eq!(ids(&shrunk), ids(&s)[..2].to_vec());

    let same = resize(&s, 4, &mut f);
    assert!(same.ptr_eq(&s));
}

#[test]
fn remix_keeps_ids_and_sources() {
    let (s, mut f) = four();
    let out = remix(&s, &mut f);
    assert_eq!(ids(&out), ids(&s));
    for (a, b) in s.iter().zip(out.iter()) {
        assert_eq!(a.source, b.source);
        assert_eq!(a.load_state, b.load_state);
        assert!((0.05..=1.0).contains(&b.opacity));
    }
}

#[test]
fn reload_images_assigns_fresh_sources_and_pending() {
    let (s, mut f) = four();
    let ready: Stack = s
        .iter()
        .cloned()
        .map(|mut l| {
            l.load_state = LoadState::Ready;
            l
        })
        .collect();
    let out = reload_images(&ready, &mut f);
    assert_eq!(ids(&out), ids(&s));
    for (a, b) in ready.iter().zip(out.iter()) {
        assert_ne!(a.source, b.source);
        assert_eq!(b.load_state, LoadState::Pending);
    }
}

#[test]
fn refresh_layer_image_only_touches_one_layer() {
    let (s, mut f) = four();
    let id = s.layers()[1].id.clone();
    let out = refresh_layer_image(&s, &id, &mut f);
    assert_ne!(out.layers()[1].source, s.layers()[1].source);
    assert_eq!(out.layers()[1].blend_mode, s.layers()[1].blend_mode);
    assert_eq!(out.layers()[0], s.layers()[0]);
}

#[test]
fn equalize_sets_average_and_uniform_opacity() {
    for n in 1..=6 {
        let mut f = factory(n as u64);
        let s = initial_stack(n, &mut f);
        let out = equalize(&s);
        for l in out.iter() {
            assert_eq!(l.blend_mode, BlendMode::Average);
            assert!((l.opacity - 1.0 / n as f32).abs() < 1e-6);
        }
    }
    assert_eq!(equalize(&Stack::empty()), Stack::empty());
}

#[test]
fn same_seed_replays_same_operations() {
    let (a, _) = four();
    let (b, _) = four();
    assert_eq!(a, b);
}

#[test]
fn settle_load_ignores_stale_completions() {
    let (s, mut f) = four();
    let id = s.layers()[0].id.clone();
    let old_source = s.layers()[0].source.clone();

    let refreshed = refresh_layer_image(&s, &id, &mut f);
    assert!(settle_load(&refreshed, &id, &old_source, LoadState::Ready).is_none());

    let new_source = refreshed.layers()[0].source.clone();
    let settled = settle_load(&refreshed, &id, &new_source, LoadState::Ready).unwrap();
    assert_eq!(settled.layers()[0].load_state, LoadState::Ready);

    assert!(settle_load(&settled, &id, &new_source, LoadState::Failed).is_none());
    assert!(settle_load(&s, &LayerId("gone".to_string()), &old_source, LoadState::Ready).is_none());
}
