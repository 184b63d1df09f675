use super::*;

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "pixelart_pipeline_{tag}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn output_names_keep_stem_and_extension() {
    let layout = OutputLayout::new("/srv/out");
    assert_eq!(
        layout.output_path_for(Path::new("/in/cat.png")).unwrap(),
        PathBuf::from("/srv/out/cat_pixelated.png")
    );
    assert_eq!(
        layout.output_path_for(Path::new("clip.tar.mp4")).unwrap(),
        PathBuf::from("/srv/out/clip.tar_pixelated.mp4")
    );
    assert_eq!(
        layout.output_path_for(Path::new("noext")).unwrap(),
        PathBuf::from("/srv/out/noext_pixelated")
    );
    assert!(layout.output_path_for(Path::new("/")).is_err());
}

#[test]
fn config_json_fills_defaults_and_validates() {
    let cfg = PipelineConfig::from_json_str(
        r#"{"params": {"pixel_size": 4, "upscale_factor": 3}, "output_dir": "out"}"#,
    )
    .unwrap();
    assert_eq!(cfg.params.pixel_size, 4);
    assert_eq!(cfg.params.n_colors, PixelationParams::default().n_colors);
    assert_eq!(cfg.params.upscale_factor, 3);
    assert_eq!(cfg.video, VideoEncodeOpts::default());
    assert_eq!(cfg.layout(), Some(OutputLayout::new("out")));

    assert_eq!(PipelineConfig::from_json_str("{}").unwrap(), PipelineConfig::default());

    let bad = PipelineConfig::from_json_str(r#"{"params": {"pixel_size": 0}}"#).unwrap_err();
    assert_eq!(bad.kind(), crate::ErrorKind::Validation);
    let bad = PipelineConfig::from_json_str(r#"{"video": {"crf": 99}}"#).unwrap_err();
    assert_eq!(bad.kind(), crate::ErrorKind::Validation);
    assert!(PipelineConfig::from_json_str("[1, 2]").is_err());
}

#[test]
fn config_loads_from_file() {
    let dir = scratch_dir("config");
    let path = dir.join("cfg.json");
    std::fs::write(&path, r#"{"params": {"n_colors": 8}, "video": {"crf": 20}}"#).unwrap();
    let cfg = PipelineConfig::load(&path).unwrap();
    assert_eq!(cfg.params.n_colors, 8);
    assert_eq!(cfg.video.crf, Some(20));

    let missing = PipelineConfig::load(&dir.join("nope.json")).unwrap_err();
    assert_eq!(missing.kind(), crate::ErrorKind::Other);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn convert_refuses_to_overwrite_its_input() {
    let dir = scratch_dir("same");
    let path = dir.join("a.png");
    image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]))
        .save(&path)
        .unwrap();
    let err = convert(
        &path,
        &dir.join(".").join("a.png"),
        None,
        &PixelationParams::default(),
        &VideoEncodeOpts::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::Validation);
    assert!(path.exists());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn convert_detects_and_routes_still_images() {
    let dir = scratch_dir("route");
    let input = dir.join("in.png");
    image::RgbImage::from_fn(16, 16, |x, y| image::Rgb([(x * 16) as u8, (y * 16) as u8, 50]))
        .save(&input)
        .unwrap();
    let output = OutputLayout::new(dir.join("out"))
        .output_path_for(&input)
        .unwrap();

    let params = PixelationParams::new(4, 3, 2).unwrap();
    let report = convert(&input, &output, None, &params, &VideoEncodeOpts::default()).unwrap();
    assert_eq!(
        report,
        ConvertReport {
            kind: MediaKind::Still,
            frames: 1,
            width: 32,
            height: 32,
            has_audio: false,
        }
    );
    assert!(output.ends_with("out/in_pixelated.png"));
    assert_eq!(image::image_dimensions(&output).unwrap(), (32, 32));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn convert_rejects_bad_params_and_unknown_media() {
    let dir = scratch_dir("reject");
    let input = dir.join("notes.txt");
    std::fs::write(&input, "plain text, not media").unwrap();

    let err = convert(
        &input,
        &dir.join("out.txt"),
        None,
        &PixelationParams::default(),
        &VideoEncodeOpts::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::Validation);

    let mut params = PixelationParams::default();
    params.upscale_factor = 0;
    let err = convert(
        &input,
        &dir.join("out.png"),
        Some(MediaKind::Still),
        &params,
        &VideoEncodeOpts::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::Validation);
    let _ = std::fs::remove_dir_all(dir);
}
