use super::*;

#[test]
fn default_canvas_is_1080p_and_valid() {
    let c = Canvas::default();
    assert_eq!((c.width, c.height), (1920, 1080));
    c.validate().unwrap();
    assert_eq!(c.rgba_len(), 1920 * 1080 * 4);
}

#[test]
fn canvas_rejects_zero_and_odd_sizes() {
    assert!(
        Canvas {
            width: 0,
            height: 10
        }
        .validate()
        .is_err()
    );
    assert!(
        Canvas {
            width: 11,
            height: 10
        }
        .validate()
        .is_err()
    );
    assert!(
        Canvas {
            width: 70_000,
            height: 10
        }
        .validate()
        .is_err()
    );
}

#[test]
fn fps_is_reduced_and_formats_as_fraction() {
    let fps = Fps::new(10, 50).unwrap();
    assert_eq!(fps, Fps { num: 1, den: 5 });
    assert_eq!(fps.to_ffmpeg_arg(), "1/5");
    assert!((fps.frame_duration_secs() - 5.0).abs() < 1e-12);
    assert!((fps.as_f64() - 0.2).abs() < 1e-12);
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(1, 0).is_err());
}

#[test]
fn parses_hex_rgb_and_rgba() {
    let c: Rgba8 = serde_json::from_value(serde_json::json!("#ffd700")).unwrap();
    assert_eq!(c, Rgba8::rgb(255, 215, 0));

    let c: Rgba8 = serde_json::from_value(serde_json::json!("000000A6")).unwrap();
    assert_eq!(c, Rgba8::rgba(0, 0, 0, 0xa6));

    assert!(serde_json::from_value::<Rgba8>(serde_json::json!("#fff")).is_err());
    assert!(serde_json::from_value::<Rgba8>(serde_json::json!("#zz0000")).is_err());
}

#[test]
fn hex_serialization_drops_opaque_alpha() {
    assert_eq!(Rgba8::rgb(26, 26, 26).to_hex(), "#1a1a1a");
    assert_eq!(Rgba8::rgba(0, 0, 0, 128).to_hex(), "#00000080");
}

#[test]
fn premul_and_lerp() {
    assert_eq!(Rgba8::rgba(255, 0, 0, 128).to_premul(), [128, 0, 0, 128]);
    let a = Rgba8::rgb(0, 0, 0);
    let b = Rgba8::rgb(200, 100, 50);
    assert_eq!(a.lerp(b, 0.0), a);
    assert_eq!(a.lerp(b, 1.0), b);
    assert_eq!(a.lerp(b, 0.5), Rgba8::rgb(100, 50, 25));
}
