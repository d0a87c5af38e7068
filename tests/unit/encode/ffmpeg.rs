use super::*;
use crate::sequence::{FrameFormat, FrameStore};

fn tmp_dir(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "quotereel_ffmpeg_{tag}_{}_{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn args_follow_the_slideshow_recipe() {
    let args = FfmpegEncoder::build_args(
        &EncodingSpec::default(),
        Path::new("out/screenshots/quote_%03d.png"),
        2,
        Path::new("out/.rumi_quotes.partial.mp4"),
    )
    .unwrap();
    let args: Vec<String> = args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        args,
        [
            "-y",
            "-hide_banner",
            "-loglevel",
            "error",
            "-framerate",
            "1/5",
            "-start_number",
            "0",
            "-i",
            "out/screenshots/quote_%03d.png",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-r",
            "30",
            "-preset",
            "medium",
            "-crf",
            "23",
            "-frames:v",
            "300",
            "-movflags",
            "+faststart",
            "out/.rumi_quotes.partial.mp4",
        ]
    );
}

#[test]
fn partial_path_keeps_the_container_extension() {
    assert_eq!(
        partial_output_path(Path::new("output/rumi_quotes.mp4")),
        PathBuf::from("output/.rumi_quotes.partial.mp4")
    );
    assert_eq!(
        partial_output_path(Path::new("clip")),
        PathBuf::from(".clip.partial")
    );
}

#[test]
fn encoder_listing_is_matched_by_name_column() {
    let listing = "Encoders:\n V..... = Video\n ------\n V....D libx264              libx264 H.264 / AVC\n V....D libx264rgb           libx264 H.264 RGB\n A....D aac                  AAC\n";
    assert!(encoder_listing_contains(listing, "libx264"));
    assert!(encoder_listing_contains(listing, "aac"));
    assert!(!encoder_listing_contains(listing, "libx265"));
    assert!(!encoder_listing_contains(listing, "Video"));
}

#[test]
fn locate_fails_for_a_missing_binary() {
    let err = FfmpegEncoder::locate(FfmpegOpts {
        binary: PathBuf::from("/definitely/not/ffmpeg"),
        timeout_secs: None,
    })
    .unwrap_err();
    assert_eq!(err.stage(), "encode");
}

#[test]
fn missing_frames_fail_before_spawning() {
    let dir = tmp_dir("noframes");
    let store = FrameStore::new(dir.join("frames"), FrameFormat::Png);
    let mut seq = FrameSequence::new(&store);
    seq.push(0, store.path_for(0)).unwrap();

    let enc = FfmpegEncoder::new(FfmpegOpts::default());
    let err = enc
        .encode(&seq, &EncodingSpec::default(), &dir.join("out.mp4"))
        .unwrap_err();
    assert_eq!(err.stage(), "storage");
    let _ = std::fs::remove_dir_all(&dir);
}

#[cfg(unix)]
fn fake_ffmpeg(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt as _;

    let path = dir.join("fake-ffmpeg");
    let script = format!(
        "#!/bin/sh\ncase \"$*\" in\n  *-version*) echo 'ffmpeg version fake'; exit 0;;\n  *-encoders*) echo ' V....D libx264 fake'; exit 0;;\nesac\n{body}\n"
    );
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

#[cfg(unix)]
fn one_frame_sequence(dir: &Path) -> FrameSequence {
    let store = FrameStore::new(dir.join("frames"), FrameFormat::Png);
    let frame = crate::render::FrameRGBA::new(2, 2, vec![0, 0, 0, 255].repeat(4)).unwrap();
    let mut seq = FrameSequence::new(&store);
    seq.push(0, store.store(0, &frame).unwrap()).unwrap();
    seq
}

#[cfg(unix)]
#[test]
fn failed_encode_reports_stderr_and_keeps_the_previous_video() {
    let dir = tmp_dir("fail");
    let binary = fake_ffmpeg(&dir, "echo 'boom: invalid input' >&2\nexit 1");
    let seq = one_frame_sequence(&dir);
    let out = dir.join("video.mp4");
    std::fs::write(&out, b"previous").unwrap();

    let enc = FfmpegEncoder::locate(FfmpegOpts {
        binary,
        timeout_secs: None,
    })
    .unwrap();
    let err = enc
        .encode(&seq, &EncodingSpec::default(), &out)
        .unwrap_err();
    assert_eq!(err.stage(), "encode");
    assert!(err.to_string().contains("boom: invalid input"), "{err}");
    assert_eq!(std::fs::read(&out).unwrap(), b"previous");
    assert!(!partial_output_path(&out).exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[cfg(unix)]
#[test]
fn unknown_codec_is_rejected_before_encoding() {
    let dir = tmp_dir("codec");
    let binary = fake_ffmpeg(&dir, "exit 0");
    let seq = one_frame_sequence(&dir);
    let enc = FfmpegEncoder::new(FfmpegOpts {
        binary,
        timeout_secs: None,
    });
    let spec = EncodingSpec {
        codec: "libx265".to_string(),
        ..EncodingSpec::default()
    };
    let err = enc.encode(&seq, &spec, &dir.join("v.mp4")).unwrap_err();
    assert!(err.to_string().contains("libx265"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[cfg(unix)]
#[test]
fn hung_encode_is_killed_after_the_timeout() {
    let dir = tmp_dir("timeout");
    let binary = fake_ffmpeg(&dir, "exec sleep 30");
    let seq = one_frame_sequence(&dir);
    let enc = FfmpegEncoder::new(FfmpegOpts {
        binary,
        timeout_secs: Some(1),
    });

    let started = Instant::now();
    let err = enc
        .encode(&seq, &EncodingSpec::default(), &dir.join("v.mp4"))
        .unwrap_err();
    assert!(err.to_string().contains("timed out"), "{err}");
    assert!(started.elapsed() < Duration::from_secs(20));
    let _ = std::fs::remove_dir_all(&dir);
}

#[cfg(unix)]
#[test]
fn successful_encode_moves_the_partial_file_into_place() {
    let dir = tmp_dir("ok");
    // The last argument is the output path.
    let binary = fake_ffmpeg(&dir, "for last; do :; done\nprintf 'video' > \"$last\"");
    let seq = one_frame_sequence(&dir);
    let out = dir.join("nested").join("video.mp4");

    let enc = FfmpegEncoder::new(FfmpegOpts {
        binary,
        timeout_secs: Some(10),
    });
    let report = enc.encode(&seq, &EncodingSpec::default(), &out).unwrap();
    assert_eq!(report.output_path, out);
    assert_eq!(report.frames, 1);
    assert_eq!(report.expected_duration_secs, 5.0);
    assert_eq!(report.expected_output_frames, 150);
    assert_eq!(std::fs::read(&out).unwrap(), b"video");
    assert!(!partial_output_path(&out).exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[cfg(unix)]
#[test]
fn leftover_frames_past_the_sequence_are_capped_out() {
    let dir = tmp_dir("stale");
    // Writes its own argument list as the "video".
    let binary = fake_ffmpeg(&dir, "for last; do :; done\necho \"$*\" > \"$last\"");
    let seq = one_frame_sequence(&dir);
    let stale = FrameStore::new(dir.join("frames"), FrameFormat::Png).path_for(1);
    std::fs::copy(&seq.paths()[0], &stale).unwrap();

    let enc = FfmpegEncoder::new(FfmpegOpts {
        binary,
        timeout_secs: Some(10),
    });
    let out = dir.join("video.mp4");
    let report = enc.encode(&seq, &EncodingSpec::default(), &out).unwrap();
    assert_eq!(report.expected_output_frames, 150);

    let args = std::fs::read_to_string(&out).unwrap();
    assert!(args.contains("-frames:v 150"), "{args}");
    assert!(stale.exists());
    let _ = std::fs::remove_dir_all(&dir);
}
