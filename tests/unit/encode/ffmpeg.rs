use super::*;

fn cfg(width: u32, height: u32, out: &str, audio: AudioPlan) -> EncodeConfig {
    EncodeConfig {
        width,
        height,
        fps: Fps::new(24000, 1001).unwrap(),
        out_path: PathBuf::from(out),
        audio,
        opts: VideoEncodeOpts::default(),
    }
}

fn args_of(cfg: &EncodeConfig) -> Vec<String> {
    cfg.ffmpeg_args()
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
    args.windows(2).any(|w| w[0] == flag && w[1] == value)
}

#[test]
fn config_validation_catches_bad_values() {
    assert!(cfg(0, 10, "out.mp4", AudioPlan::None).validate().is_err());

    let mut c = cfg(10, 10, "out.mp4", AudioPlan::None);
    c.fps = Fps { num: 0, den: 1 };
    assert!(c.validate().is_err());

    let mut c = cfg(10, 10, "out.mp4", AudioPlan::None);
    c.opts.crf = Some(80);
    assert!(c.validate().is_err());

    assert!(cfg(11, 10, "out.mp4", AudioPlan::None).validate().is_ok());
}

#[test]
fn args_carry_scaled_size_and_rational_rate() {
    let args = args_of(&cfg(64, 48, "out/clip.mp4", AudioPlan::None));
    assert_eq!(args[0], "-y");
    assert!(has_pair(&args, "-s", "64x48"));
    assert!(has_pair(&args, "-r", "24000/1001"));
    assert!(has_pair(&args, "-pix_fmt", "rgb24"));
    assert!(has_pair(&args, "-pix_fmt", "yuv420p"));
    assert!(has_pair(&args, "-c:v", "libx264"));
    assert!(has_pair(&args, "-movflags", "+faststart"));
    assert!(args.contains(&"-an".to_string()));
    assert_eq!(args.last().map(String::as_str), Some("out/clip.mp4"));
}

#[test]
fn odd_dimensions_fall_back_to_444() {
    let c = cfg(33, 20, "o.mkv", AudioPlan::None);
    assert_eq!(c.output_pix_fmt(), "yuv444p");
    let args = args_of(&c);
    assert!(has_pair(&args, "-pix_fmt", "yuv444p"));
    assert!(!args.contains(&"-movflags".to_string()));
}

#[test]
fn audio_copy_maps_second_input() {
    let plan = AudioPlan::Copy {
        source: PathBuf::from("in.mp4"),
    };
    let args = args_of(&cfg(16, 16, "o.mp4", plan));
    assert!(has_pair(&args, "-i", "in.mp4"));
    assert!(has_pair(&args, "-map", "1:a:0"));
    assert!(has_pair(&args, "-c:a", "copy"));
    assert!(args.contains(&"-shortest".to_string()));
    assert!(!args.contains(&"-an".to_string()));
}

#[test]
fn audio_plan_copies_compatible_codecs_and_reencodes_others() {
    let aac = AudioStreamInfo {
        codec_name: Some("aac".to_string()),
    };
    let opus = AudioStreamInfo {
        codec_name: Some("opus".to_string()),
    };
    let src = Path::new("in.mkv");

    assert_eq!(
        AudioPlan::for_source(src, None, OutputContainer::Mp4),
        AudioPlan::None
    );
    assert_eq!(
        AudioPlan::for_source(src, Some(&aac), OutputContainer::Mp4),
        AudioPlan::Copy {
            source: src.to_path_buf()
        }
    );
    assert_eq!(
        AudioPlan::for_source(src, Some(&aac), OutputContainer::Webm),
        AudioPlan::Reencode {
            source: src.to_path_buf(),
            codec: "libopus"
        }
    );
    assert_eq!(
        AudioPlan::for_source(src, Some(&opus), OutputContainer::Mov),
        AudioPlan::Reencode {
            source: src.to_path_buf(),
            codec: "aac"
        }
    );
}

#[test]
fn webm_uses_vp9_with_constant_quality() {
    let mut c = cfg(16, 16, "o.WEBM", AudioPlan::None);
    c.opts.crf = Some(30);
    let args = args_of(&c);
    assert!(has_pair(&args, "-c:v", "libvpx-vp9"));
    assert!(has_pair(&args, "-crf", "30"));
    assert!(has_pair(&args, "-b:v", "0"));
}

#[test]
fn no_overwrite_uses_dash_n() {
    let mut c = cfg(16, 16, "o.mp4", AudioPlan::None);
    c.opts.overwrite = false;
    assert_eq!(args_of(&c)[0], "-n");
}

#[test]
fn flatten_straight_over_black_produces_expected_rgb() {
    // Straight red @ 50% alpha => rgb becomes 128,0,0 over black.
    let src = vec![255u8, 0, 0, 128, 10, 20, 30, 255];
    let mut dst = vec![0u8; 6];
    flatten_rgba_over_black(&mut dst, &src).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 10, 20, 30]);

    let mut short = vec![0u8; 3];
    assert!(flatten_rgba_over_black(&mut short, &src).is_err());
}
