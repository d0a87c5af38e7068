//! Encoding a frame sequence with the system `ffmpeg`.

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::encode::spec::EncodingSpec;
use crate::foundation::error::{QuoteReelError, QuoteReelResult};
use crate::sequence::FrameSequence;

/// Where to find `ffmpeg` and how long to let it run.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FfmpegOpts {
    /// Executable name or path.
    pub binary: PathBuf,
    /// Kill the encode after this many seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for FfmpegOpts {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            timeout_secs: None,
        }
    }
}

/// Structured success signal of an encode.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeReport {
    /// Finished video file.
    pub output_path: PathBuf,
    /// Number of slides encoded.
    pub frames: usize,
    /// `frames * seconds_per_slide`.
    pub expected_duration_secs: f64,
    /// Output frames at the configured rate.
    pub expected_output_frames: u64,
}

/// Turns a frame sequence into a single video file.
pub trait VideoEncoder {
    /// Encode `frames` into `output`, replacing any existing file only on success.
    fn encode(
        &self,
        frames: &FrameSequence,
        spec: &EncodingSpec,
        output: &Path,
    ) -> QuoteReelResult<EncodeReport>;
}

/// Return `true` when `binary -version` runs successfully.
pub fn is_ffmpeg_available(binary: &Path) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Encoder backed by the system `ffmpeg` executable.
#[derive(Clone, Debug)]
pub struct FfmpegEncoder {
    opts: FfmpegOpts,
}

impl FfmpegEncoder {
    /// Wrap `opts` without probing the executable.
    pub fn new(opts: FfmpegOpts) -> Self {
        Self { opts }
    }

    /// Check the executable runs before any frame is rendered.
    pub fn locate(opts: FfmpegOpts) -> QuoteReelResult<Self> {
        if !is_ffmpeg_available(&opts.binary) {
            return Err(QuoteReelError::encode(format!(
                "ffmpeg is required for video encoding, but '{}' could not be run",
                opts.binary.display()
            )));
        }
        Ok(Self { opts })
    }

    /// Options in use.
    pub fn opts(&self) -> &FfmpegOpts {
        &self.opts
    }

    /// Ask ffmpeg whether it was built with `codec`.
    pub fn supports_codec(&self, codec: &str) -> QuoteReelResult<bool> {
        let out = Command::new(&self.opts.binary)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| QuoteReelError::encode(format!("failed to list ffmpeg encoders: {e}")))?;
        if !out.status.success() {
            return Err(QuoteReelError::encode(format!(
                "ffmpeg -encoders exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(encoder_listing_contains(
            &String::from_utf8_lossy(&out.stdout),
            codec,
        ))
    }

    /// Full argument list for encoding the first `frames` stills of `pattern` into `output`.
    ///
    /// The image2 demuxer reads until the first missing number, so the output is capped at
    /// the expected frame count; leftover files past the sequence never reach the video.
    pub fn build_args(
        spec: &EncodingSpec,
        pattern: &Path,
        frames: usize,
        output: &Path,
    ) -> QuoteReelResult<Vec<OsString>> {
        let input_rate = spec.input_rate()?;
        let mut args: Vec<OsString> = [
            "-y",
            "-hide_banner",
            "-loglevel",
            "error",
            "-framerate",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(input_rate.to_ffmpeg_arg().into());
        args.extend(["-start_number", "0", "-i"].map(OsString::from));
        args.push(pattern.as_os_str().to_owned());
        args.push("-c:v".into());
        args.push(spec.codec.clone().into());
        args.push("-pix_fmt".into());
        args.push(spec.pixel_format.clone().into());
        args.push("-r".into());
        args.push(spec.output_fps.to_string().into());
        args.push("-preset".into());
        args.push(spec.preset.clone().into());
        args.push("-crf".into());
        args.push(spec.crf.to_string().into());
        args.push("-frames:v".into());
        args.push(spec.expected_output_frames(frames).to_string().into());
        args.extend(["-movflags", "+faststart"].map(OsString::from));
        args.push(output.as_os_str().to_owned());
        Ok(args)
    }

    fn run(&self, args: &[OsString]) -> QuoteReelResult<()> {
        tracing::debug!(binary = %self.opts.binary.display(), ?args, "spawning ffmpeg");

        let child = Command::new(&self.opts.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                QuoteReelError::encode(format!(
                    "failed to spawn '{}' (is it installed and on PATH?): {e}",
                    self.opts.binary.display()
                ))
            })?;
        let mut guard = ChildGuard(Some(child));

        let mut stderr = guard
            .child_mut()
            .and_then(|c| c.stderr.take())
            .ok_or_else(|| QuoteReelError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok::<_, std::io::Error>(stderr_bytes)
        });

        let status = guard
            .wait(self.opts.timeout_secs.map(Duration::from_secs))
            .map_err(|e| QuoteReelError::encode(format!("failed to wait for ffmpeg: {e}")))?;

        let stderr_bytes = stderr_drain
            .join()
            .map_err(|_| QuoteReelError::encode("ffmpeg stderr drain thread panicked"))?
            .map_err(|e| QuoteReelError::encode(format!("ffmpeg stderr read failed: {e}")))?;
        let stderr = String::from_utf8_lossy(&stderr_bytes);

        match status {
            None => Err(QuoteReelError::encode(format!(
                "ffmpeg timed out after {}s: {}",
                self.opts.timeout_secs.unwrap_or_default(),
                stderr.trim()
            ))),
            Some(status) if !status.success() => Err(QuoteReelError::encode(format!(
                "ffmpeg exited with status {status}: {}",
                stderr.trim()
            ))),
            Some(_) => Ok(()),
        }
    }
}

impl VideoEncoder for FfmpegEncoder {
    #[tracing::instrument(skip(self, frames, spec), fields(frames = frames.len()))]
    fn encode(
        &self,
        frames: &FrameSequence,
        spec: &EncodingSpec,
        output: &Path,
    ) -> QuoteReelResult<EncodeReport> {
        spec.validate()?;
        frames.verify_on_disk()?;

        if !self.supports_codec(&spec.codec)? {
            return Err(QuoteReelError::encode(format!(
                "ffmpeg at '{}' has no '{}' encoder",
                self.opts.binary.display(),
                spec.codec
            )));
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                QuoteReelError::storage(parent, format!("create output directory: {e}"))
            })?;
        }

        let partial = partial_output_path(output);
        let args = Self::build_args(spec, frames.pattern(), frames.len(), &partial)?;
        if let Err(e) = self.run(&args) {
            let _ = std::fs::remove_file(&partial);
            return Err(e);
        }

        match std::fs::metadata(&partial) {
            Ok(m) if m.len() > 0 => {}
            _ => {
                let _ = std::fs::remove_file(&partial);
                return Err(QuoteReelError::encode(format!(
                    "ffmpeg reported success but wrote no output to '{}'",
                    partial.display()
                )));
            }
        }
        std::fs::rename(&partial, output).map_err(|e| {
            let _ = std::fs::remove_file(&partial);
            QuoteReelError::storage(output, format!("move finished video into place: {e}"))
        })?;

        let report = EncodeReport {
            output_path: output.to_path_buf(),
            frames: frames.len(),
            expected_duration_secs: spec.expected_duration_secs(frames.len()),
            expected_output_frames: spec.expected_output_frames(frames.len()),
        };
        tracing::info!(
            path = %report.output_path.display(),
            duration_secs = report.expected_duration_secs,
            "encoded video"
        );
        Ok(report)
    }
}

/// Sibling of `output` with the same extension, so ffmpeg still infers the container.
pub(crate) fn partial_output_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let name = match output.extension() {
        Some(ext) => format!(".{stem}.partial.{}", ext.to_string_lossy()),
        None => format!(".{stem}.partial"),
    };
    output.with_file_name(name)
}

/// Scan `ffmpeg -encoders` output for an encoder named `codec`.
pub(crate) fn encoder_listing_contains(listing: &str, codec: &str) -> bool {
    listing.lines().any(|line| {
        let mut cols = line.split_whitespace();
        matches!(
            (cols.next(), cols.next()),
            (Some(flags), Some(name)) if flags.len() == 6 && name == codec
        )
    })
}

/// Kills and reaps the child on every exit path that did not wait for it.
struct ChildGuard(Option<Child>);

impl ChildGuard {
    fn child_mut(&mut self) -> Option<&mut Child> {
        self.0.as_mut()
    }

    /// Wait for exit; `Ok(None)` means the timeout fired and the child was killed.
    fn wait(&mut self, timeout: Option<Duration>) -> std::io::Result<Option<ExitStatus>> {
        let Some(child) = self.0.as_mut() else {
            return Err(std::io::Error::other("child already reaped"));
        };
        let Some(timeout) = timeout else {
            let status = child.wait()?;
            self.0 = None;
            return Ok(Some(status));
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                self.0 = None;
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                self.0 = None;
                return Ok(None);
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.0.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
