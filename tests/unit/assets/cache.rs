use super::*;

fn img(px: [u8; 4]) -> PreparedImage {
    PreparedImage::solid(1, 1, px).unwrap()
}

#[test]
fn first_insert_wins_and_counts_once() {
    let mut cache = ImageCache::new();
    let src = SourceRef("a.png".to_string());
    assert_eq!(cache.decode_count(&src), 0);

    cache.insert(src.clone(), img([1, 2, 3, 255]));
    cache.insert(src.clone(), img([9, 9, 9, 255]));

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.decode_count(&src), 1);
    assert_eq!(cache.get(&src).unwrap().rgba8().as_slice(), &[1, 2, 3, 255]);
}

#[test]
fn lookups_are_per_source() {
    let mut cache = ImageCache::new();
    assert!(cache.is_empty());
    cache.insert(SourceRef("a".to_string()), img([0, 0, 0, 255]));
    assert!(cache.contains(&SourceRef("a".to_string())));
    assert!(!cache.contains(&SourceRef("b".to_string())));
    assert!(cache.get(&SourceRef("b".to_string())).is_none());
}

#[test]
fn retain_drops_unkept_sources_and_their_counts() {
    let mut cache = ImageCache::new();
    let keep = SourceRef("keep.png".to_string());
    let gone = SourceRef("gone.png".to_string());
    cache.insert(keep.clone(), img([1, 1, 1, 255]));
    cache.insert(gone.clone(), img([2, 2, 2, 255]));

    assert_eq!(cache.retain(|s| s == &keep), 1);
    assert_eq!(cache.len(), 1);
    assert!(cache.contains(&keep));
    assert_eq!(cache.decode_count(&gone), 0);

    cache.insert(gone.clone(), img([2, 2, 2, 255]));
    assert_eq!(cache.decode_count(&gone), 1);
}
