use std::sync::Arc;

use super::*;
use crate::assets::source::PicsumSource;
use crate::layers::factory::LayerFactory;
use crate::layers::model::LoadState;
use crate::layers::store::initial_stack;
use crate::persist::kv::MemoryKeyValueStore;

fn stack() -> Stack {
    let mut f = LayerFactory::new(21, Arc::new(PicsumSource::default()));
    initial_stack(3, &mut f)
        .iter()
        .cloned()
        .map(|mut l| {
            l.load_state = LoadState::Ready;
            l
        })
        .collect()
}

#[test]
fn save_and_load_reproduces_visual_stack() {
    let s = stack();
    let mut lib = PresetLibrary::default();
    lib.insert(Preset::capture("p1", "Dusk", 1_700_000_000_000, &s));

    let mut kv = MemoryKeyValueStore::new();
    lib.save(&mut kv, PRESETS_KEY).unwrap();

    let loaded = PresetLibrary::load(&kv, PRESETS_KEY);
    assert_eq!(loaded.len(), 1);
    let p = loaded.get("p1").unwrap();
    assert_eq!(p.name, "Dusk");
    assert_eq!(p.timestamp_ms, 1_700_000_000_000);

    let restored = p.instantiate();
    assert!(restored.visually_equal(&s));
    assert!(restored.iter().all(|l| l.load_state == LoadState::Pending));
}

#[test]
fn instantiate_is_a_fresh_copy() {
    let s = stack();
    let p = Preset::capture("p", "x", 0, &s);
    let a = p.instantiate();
    let b = p.instantiate();
    assert!(!a.ptr_eq(&b));
    assert_eq!(a, b);
}

#[test]
fn missing_or_corrupt_payload_is_empty_library() {
    let mut kv = MemoryKeyValueStore::new();
    assert!(PresetLibrary::load(&kv, PRESETS_KEY).is_empty());

    kv.put(PRESETS_KEY, "{not json").unwrap();
    assert!(PresetLibrary::load(&kv, PRESETS_KEY).is_empty());

    kv.put(PRESETS_KEY, "{\"unexpected\": true}").unwrap();
    assert!(PresetLibrary::load(&kv, PRESETS_KEY).is_empty());
}

#[test]
fn insert_replaces_same_id_and_remove_reports() {
    let s = stack();
    let mut lib = PresetLibrary::default();
    lib.insert(Preset::capture("a", "first", 1, &s));
    lib.insert(Preset::capture("b", "second", 2, &s));
    lib.insert(Preset::capture("a", "again", 3, &s));
    assert_eq!(lib.len(), 2);
    assert_eq!(lib.presets()[1].name, "again");

    assert!(lib.remove("b"));
    assert!(!lib.remove("b"));
    assert_eq!(lib.len(), 1);
}

#[test]
fn named_trims_and_rejects_blank_names() {
    let s = stack();
    let p = Preset::named("p1", "  Dusk \n", 5, &s).unwrap();
    assert_eq!(p.name, "Dusk");
    assert_eq!(p.layers.len(), 3);
    assert!(Preset::named("p2", " \t ", 5, &s).is_err());
}
