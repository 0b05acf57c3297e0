use super::*;

fn layer(id: &str) -> Layer {
    Layer {
        id: LayerId(id.to_string()),
        source: SourceRef(format!("{id}.png")),
        blend_mode: BlendMode::Screen,
        opacity: 0.4,
        is_visible: true,
        display_name: format!("Layer {id}"),
        load_state: LoadState::Ready,
    }
}

#[test]
fn all_modes_are_distinct_and_labelled() {
    let mut seen = std::collections::HashSet::new();
    for mode in BlendMode::ALL {
        assert!(seen.insert(mode));
        assert!(!mode.label().is_empty());
    }
    assert_eq!(seen.len(), 17);
}

#[test]
fn blend_mode_serializes_kebab_case() {
    let s = serde_json::to_string(&BlendMode::ColorDodge).unwrap();
    assert_eq!(s, "\"color-dodge\"");
    let m: BlendMode = serde_json::from_str("\"soft-light\"").unwrap();
    assert_eq!(m, BlendMode::SoftLight);
}

#[test]
fn only_hsl_modes_are_non_separable() {
    let non_sep: Vec<_> = BlendMode::ALL
        .into_iter()
        .filter(|m| m.is_non_separable())
        .collect();
    assert_eq!(
        non_sep,
        vec![
            BlendMode::Hue,
            BlendMode::Saturation,
            BlendMode::Color,
            BlendMode::Luminosity
        ]
    );
}

#[test]
fn participates_requires_visible_and_ready() {
    let mut l = layer("a");
    assert!(l.participates());
    l.is_visible = false;
    assert!(!l.participates());
    l.is_visible = true;
    l.load_state = LoadState::Failed;
    assert!(!l.participates());
    l.load_state = LoadState::Pending;
    assert!(!l.participates());
}

#[test]
fn load_state_is_not_persisted() {
    let stack = Stack::from(vec![layer("a"), layer("b")]);
    let json = serde_json::to_string(&stack).unwrap();
    assert!(!json.contains("load_state"));

    let back: Stack = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), 2);
    assert!(back.iter().all(|l| l.load_state == LoadState::Pending));
    assert!(back.visually_equal(&stack));
}

#[test]
fn lookups_by_id_and_index() {
    let stack = Stack::from(vec![layer("a"), layer("b"), layer("c")]);
    assert_eq!(stack.position(&LayerId("b".to_string())), Some(1));
    assert!(stack.find(&LayerId("zz".to_string())).is_none());
    assert_eq!(stack.get(2).map(|l| l.id.as_str()), Some("c"));
    assert!(stack.get(3).is_none());
}

#[test]
fn clones_share_the_snapshot() {
    let stack = Stack::from(vec![layer("a")]);
    let clone = stack.clone();
    assert!(stack.ptr_eq(&clone));
    assert!(!stack.ptr_eq(&stack.with_pending_loads()));
}

#[test]
fn remote_sources_are_detected() {
    assert!(SourceRef("https://picsum.photos/seed/x/1/1".to_string()).is_remote());
    assert!(!SourceRef("images/a.png".to_string()).is_remote());
}
