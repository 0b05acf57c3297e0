use super::*;

#[test]
fn defaults_match_studio_layout() {
    let opts = StudioOpts::default();
    assert_eq!((opts.canvas.width, opts.canvas.height), (1200, 1600));
    assert_eq!(opts.initial_layers, 4);
    assert_eq!(opts.preview_max_edge, 600);
    assert_eq!(opts.presets_key, "lumina-presets");
    assert_eq!(opts.export_format, ExportFormat::Png);
    assert_eq!(opts.seed, None);
    opts.validate().unwrap();
}

#[test]
fn partial_json_fills_defaults() {
    let opts = StudioOpts::from_json_str(r#"{"initial_layers": 6, "seed": 9}"#).unwrap();
    assert_eq!(opts.initial_layers, 6);
    assert_eq!(opts.seed, Some(9));
    assert_eq!(opts.preview_max_edge, 600);
}

#[test]
fn unknown_fields_are_rejected() {
    let err = StudioOpts::from_json_str(r#"{"layers": 3}"#).unwrap_err();
    assert!(matches!(err, LuminaError::Serde(_)));
}

#[test]
fn zero_canvas_is_invalid() {
    let err =
        StudioOpts::from_json_str(r#"{"canvas": {"width": 0, "height": 10}}"#).unwrap_err();
    assert!(matches!(err, LuminaError::Validation(_)));
}

#[test]
fn bad_jpeg_quality_is_invalid() {
    let err = StudioOpts::from_json_str(r#"{"export_format": {"kind": "jpeg", "quality": 0}}"#)
        .unwrap_err();
    assert!(matches!(err, LuminaError::Validation(_)));
}

#[test]
fn preview_canvas_keeps_aspect() {
    let c = StudioOpts::default().preview_canvas();
    assert_eq!((c.width, c.height), (450, 600));
}

#[test]
fn from_path_reads_file() {
    let path = std::env::temp_dir().join(format!("lumina_opts_{}.json", std::process::id()));
    std::fs::write(&path, r#"{"preview_max_edge": 300}"#).unwrap();
    let opts = StudioOpts::from_path(&path).unwrap();
    assert_eq!(opts.preview_max_edge, 300);
    let _ = std::fs::remove_file(&path);

    assert!(StudioOpts::from_path(&path).is_err());
}
