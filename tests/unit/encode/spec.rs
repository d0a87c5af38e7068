use super::*;

#[test]
fn defaults_match_the_reference_render() {
    let spec = EncodingSpec::default();
    spec.validate().unwrap();
    assert_eq!(spec.output_fps, 30);
    assert_eq!(spec.codec, "libx264");
    assert_eq!(spec.pixel_format, "yuv420p");
    assert_eq!(spec.input_rate().unwrap(), Fps { num: 1, den: 5 });
}

#[test]
fn input_rate_is_reduced() {
    let spec = EncodingSpec {
        seconds_per_slide: 2.5,
        ..EncodingSpec::default()
    };
    assert_eq!(spec.input_rate().unwrap().to_ffmpeg_arg(), "2/5");

    let spec = EncodingSpec {
        seconds_per_slide: 0.5,
        ..EncodingSpec::default()
    };
    assert_eq!(spec.input_rate().unwrap(), Fps { num: 2, den: 1 });
}

#[test]
fn input_rate_is_exact_for_repeating_decimals() {
    let spec = EncodingSpec {
        seconds_per_slide: 1.0 / 3.0,
        ..EncodingSpec::default()
    };
    spec.validate().unwrap();
    assert_eq!(spec.input_rate().unwrap(), Fps { num: 3, den: 1 });

    let spec = EncodingSpec {
        seconds_per_slide: 0.123,
        ..EncodingSpec::default()
    };
    assert_eq!(spec.input_rate().unwrap().to_ffmpeg_arg(), "1000/123");

    // 1000 slides at the exact rate run 1000 * 1/3 s, not 1000 * 0.333 s.
    let spec = EncodingSpec {
        seconds_per_slide: 1.0 / 3.0,
        ..EncodingSpec::default()
    };
    let rate = spec.input_rate().unwrap();
    let duration = 1000.0 * rate.frame_duration_secs();
    assert!((duration - spec.expected_duration_secs(1000)).abs() < 1e-6);
}

#[test]
fn durations_without_an_exact_fraction_are_rejected() {
    let spec = EncodingSpec {
        seconds_per_slide: std::f64::consts::PI,
        ..EncodingSpec::default()
    };
    assert_eq!(spec.validate().unwrap_err().stage(), "config");
    assert!(spec.input_rate().is_err());

    let spec = EncodingSpec {
        seconds_per_slide: 1e9,
        ..EncodingSpec::default()
    };
    assert!(spec.validate().is_err());
}

#[test]
fn expected_duration_and_frames_scale_with_slides() {
    let spec = EncodingSpec::default();
    assert_eq!(spec.expected_duration_secs(2), 10.0);
    assert_eq!(spec.expected_output_frames(2), 300);
    assert_eq!(spec.expected_output_frames(0), 0);
}

#[test]
fn invalid_settings_are_config_errors() {
    let bad = [
        EncodingSpec {
            seconds_per_slide: 0.0,
            ..EncodingSpec::default()
        },
        EncodingSpec {
            seconds_per_slide: f64::NAN,
            ..EncodingSpec::default()
        },
        EncodingSpec {
            seconds_per_slide: 0.0001,
            ..EncodingSpec::default()
        },
        EncodingSpec {
            output_fps: 0,
            ..EncodingSpec::default()
        },
        EncodingSpec {
            codec: "lib x264".to_string(),
            ..EncodingSpec::default()
        },
        EncodingSpec {
            preset: String::new(),
            ..EncodingSpec::default()
        },
        EncodingSpec {
            crf: 52,
            ..EncodingSpec::default()
        },
    ];
    for spec in bad {
        let err = spec.validate().unwrap_err();
        assert_eq!(err.stage(), "config", "{spec:?}");
    }
}

#[test]
fn partial_json_fills_defaults() {
    let spec: EncodingSpec =
        serde_json::from_value(serde_json::json!({ "seconds_per_slide": 3.0, "crf": 18 }))
            .unwrap();
    assert_eq!(spec.seconds_per_slide, 3.0);
    assert_eq!(spec.crf, 18);
    assert_eq!(spec.preset, "medium");
}
