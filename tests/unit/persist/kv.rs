use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "lumina_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn memory_store_roundtrip() {
    let mut kv = MemoryKeyValueStore::new();
    assert_eq!(kv.get("k").unwrap(), None);
    kv.put("k", "v").unwrap();
    assert_eq!(kv.get("k").unwrap().as_deref(), Some("v"));
    kv.remove("k").unwrap();
    assert_eq!(kv.get("k").unwrap(), None);
}

#[test]
fn fs_store_missing_key_is_none_and_put_creates_dir() {
    let dir = temp_dir("kv_fs");
    let mut kv = FsKeyValueStore::new(&dir);
    assert_eq!(kv.get("lumina-presets").unwrap(), None);

    kv.put("lumina-presets", "[]").unwrap();
    assert!(dir.join("lumina-presets.json").is_file());
    assert_eq!(kv.get("lumina-presets").unwrap().as_deref(), Some("[]"));

    kv.remove("lumina-presets").unwrap();
    kv.remove("lumina-presets").unwrap();
    assert_eq!(kv.get("lumina-presets").unwrap(), None);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn fs_store_rejects_path_like_keys() {
    let kv = FsKeyValueStore::new(temp_dir("kv_keys"));
    assert!(kv.get("../escape").is_err());
    assert!(kv.get("a/b").is_err());
    assert!(kv.get("").is_err());
    assert!(kv.get(".hidden").is_err());
}
