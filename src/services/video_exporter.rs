// src/services/video_exporter.rs
//
// VideoExporter pipes rendered frames into an ffmpeg child process for
// h264 encoding. Encoding runs on its own thread so the UI keeps
// ticking; the capture side copies the render texture into a staging
// buffer, strips wgpu's row padding and hands the RGBA bytes to the
// worker, which converts to RGB24 for ffmpeg's stdin.

use nannou::{image, wgpu};
use std::{
    io::Write,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
};

use crate::error::{AnimakeError, Result};

const VERBOSE: bool = false; // true to show ffmpeg stderr

pub struct VideoExporter {
    frame_tx: Option<Sender<Vec<u8>>>,
    worker: Option<JoinHandle<()>>,
    worker_done: Arc<AtomicBool>,
    frames_encoded: Arc<AtomicUsize>,
    encode_failed: Arc<AtomicBool>,

    out_path: PathBuf,
    width: u32,
    height: u32,
    frames_sent: u32,

    // GPU->CPU transfer
    staging_buffer: wgpu::Buffer,
    bytes_per_row: u32,
}

impl VideoExporter {
    /// Spawns ffmpeg and the encoder worker. Fails up front when ffmpeg
    /// is missing so the live window can keep running.
    pub fn start(
        device: &wgpu::Device,
        texture: &wgpu::Texture,
        output_dir: &Path,
        fps: u32,
    ) -> Result<Self> {
        if !is_ffmpeg_on_path() {
            return Err(AnimakeError::export(
                "ffmpeg must be installed and on PATH to export videos",
            ));
        }

        std::fs::create_dir_all(output_dir)?;
        let out_path = next_output_path(output_dir);

        let width = texture.width();
        let height = texture.height();
        let (child, stdin) = start_ffmpeg_process(&out_path, width, height, fps)?;

        let bytes_per_row = wgpu::util::align_to(width * 4, 256);
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Export staging buffer"),
            size: (bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let (frame_tx, frame_rx) = channel();
        let worker_done = Arc::new(AtomicBool::new(false));
        let frames_encoded = Arc::new(AtomicUsize::new(0));
        let encode_failed = Arc::new(AtomicBool::new(false));

        let worker = {
            let worker_done = worker_done.clone();
            let frames_encoded = frames_encoded.clone();
            let encode_failed = encode_failed.clone();
            thread::spawn(move || {
                worker_thread_function(
                    frame_rx,
                    child,
                    stdin,
                    width,
                    height,
                    frames_encoded,
                    encode_failed,
                    worker_done,
                );
            })
        };

        println!("Exporting to {}", out_path.display());

        Ok(Self {
            frame_tx: Some(frame_tx),
            worker: Some(worker),
            worker_done,
            frames_encoded,
            encode_failed,
            out_path,
            width,
            height,
            frames_sent: 0,
            staging_buffer,
            bytes_per_row,
        })
    }

    pub fn out_path(&self) -> &Path {
        &self.out_path
    }

    pub fn frames_sent(&self) -> u32 {
        self.frames_sent
    }

    pub fn frames_encoded(&self) -> usize {
        self.frames_encoded.load(Ordering::SeqCst)
    }

    /// Queues a copy of the render texture into the staging buffer.
    /// Must be followed by a queue submit and read_and_send().
    pub fn capture(&self, encoder: &mut wgpu::CommandEncoder, texture: &wgpu::Texture) {
        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &self.staging_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Maps the staging buffer, strips row padding and hands the frame
    /// to the encoder worker. Blocks until the copy has completed; the
    /// export loop is deterministic, so there is nothing to pipeline.
    pub fn read_and_send(&mut self, device: &wgpu::Device) -> Result<()> {
        let slice = self.staging_buffer.slice(..);
        let (map_tx, map_rx) = channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = map_tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);

        match map_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(AnimakeError::export(format!(
                    "failed to map staging buffer: {e:?}"
                )))
            }
            Err(_) => {
                return Err(AnimakeError::export("staging buffer mapping was dropped"));
            }
        }

        let frame = {
            let data = slice.get_mapped_range();
            unpad_rows(
                &data,
                self.bytes_per_row as usize,
                (self.width * 4) as usize,
                self.height as usize,
            )
        };
        self.staging_buffer.unmap();

        let tx = self
            .frame_tx
            .as_ref()
            .ok_or_else(|| AnimakeError::export("export already finished"))?;
        tx.send(frame)
            .map_err(|_| AnimakeError::export("encoder worker is gone"))?;
        self.frames_sent += 1;
        Ok(())
    }

    /// Signals end of input. The worker flushes remaining frames, closes
    /// ffmpeg's stdin and waits for the container to be finalized.
    pub fn finish(&mut self) {
        self.frame_tx.take();
    }

    pub fn is_done(&self) -> bool {
        self.worker_done.load(Ordering::SeqCst)
    }

    /// Joins the finished worker. Returns the output path on success.
    pub fn join(mut self) -> Result<PathBuf> {
        self.frame_tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                return Err(AnimakeError::export("encoder worker panicked"));
            }
        }
        if self.encode_failed.load(Ordering::SeqCst) {
            return Err(AnimakeError::export(format!(
                "ffmpeg failed while writing {}",
                self.out_path.display()
            )));
        }
        Ok(self.out_path.clone())
    }

    /// Aborts the export and removes the partial output file.
    pub fn cancel(mut self) {
        self.frame_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        if let Err(e) = std::fs::remove_file(&self.out_path) {
            eprintln!(
                "Could not remove partial export {}: {e}",
                self.out_path.display()
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn worker_thread_function(
    receiver: Receiver<Vec<u8>>,
    mut child: Child,
    mut stdin: ChildStdin,
    width: u32,
    height: u32,
    frames_encoded: Arc<AtomicUsize>,
    encode_failed: Arc<AtomicBool>,
    worker_done: Arc<AtomicBool>,
) {
    // recv() returns Err once the sender is dropped, which is the
    // end-of-input signal.
    while let Ok(frame_data) = receiver.recv() {
        let Some(image_buffer) = image::RgbaImage::from_raw(width, height, frame_data) else {
            eprintln!("Dropping malformed frame buffer");
            continue;
        };
        let rgb_buffer = image::DynamicImage::ImageRgba8(image_buffer).to_rgb8();
        if let Err(e) = stdin.write_all(rgb_buffer.as_raw()) {
            eprintln!("Failed to write frame to ffmpeg: {e}");
            encode_failed.store(true, Ordering::SeqCst);
            break;
        }
        frames_encoded.fetch_add(1, Ordering::SeqCst);
    }

    // Closing stdin tells ffmpeg to finalize the container.
    drop(stdin);
    match child.wait() {
        Ok(status) if status.success() => {
            if VERBOSE {
                println!("ffmpeg process completed successfully");
            }
        }
        Ok(status) => {
            eprintln!("ffmpeg exited with non-zero status: {status}");
            encode_failed.store(true, Ordering::SeqCst);
        }
        Err(e) => {
            eprintln!("Failed to wait for ffmpeg process: {e}");
            encode_failed.store(true, Ordering::SeqCst);
        }
    }
    worker_done.store(true, Ordering::SeqCst);
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn start_ffmpeg_process(
    out_path: &Path,
    width: u32,
    height: u32,
    fps: u32,
) -> Result<(Child, ChildStdin)> {
    let mut command = Command::new("ffmpeg");
    command
        .args([
            "-f",
            "rawvideo",
            "-pixel_format",
            "rgb24",
            "-video_size",
            &format!("{width}x{height}"),
            "-framerate",
            &fps.to_string(),
            "-i",
            "-",
            "-vsync",
            "cfr",
            "-r",
            &fps.to_string(),
            "-c:v",
            "libx264",
            "-preset",
            "slow",
            "-crf",
            "10",
            "-pix_fmt",
            "yuv420p",
            "-y",
        ])
        .arg(out_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(if VERBOSE {
            Stdio::inherit()
        } else {
            Stdio::null()
        });

    let mut process = command
        .spawn()
        .map_err(|e| AnimakeError::export(format!("failed to start ffmpeg: {e}")))?;
    let stdin = process
        .stdin
        .take()
        .ok_or_else(|| AnimakeError::export("failed to open stdin for ffmpeg"))?;

    Ok((process, stdin))
}

/// Picks output.mp4, output1.mp4, ... whichever does not exist yet.
pub fn next_output_path(output_dir: &Path) -> PathBuf {
    let mut index = 0;
    loop {
        let file_name = if index == 0 {
            "output.mp4".to_string()
        } else {
            format!("output{index}.mp4")
        };
        let path = output_dir.join(&file_name);
        if !path.exists() {
            return path;
        }
        index += 1;
    }
}

/// Strips wgpu's 256-byte row alignment padding from a mapped buffer.
pub fn unpad_rows(
    padded: &[u8],
    padded_row_bytes: usize,
    row_bytes: usize,
    rows: usize,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(row_bytes * rows);
    for row in 0..rows {
        let start = row * padded_row_bytes;
        out.extend_from_slice(&padded[start..start + row_bytes]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpad_rows_strips_alignment_padding() {
        // 2 rows of 3 meaningful bytes padded to 8.
        let padded = [1, 2, 3, 0, 0, 0, 0, 0, 4, 5, 6, 0, 0, 0, 0, 0];
        assert_eq!(unpad_rows(&padded, 8, 3, 2), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn unpad_rows_is_identity_without_padding() {
        let data = [9u8; 12];
        assert_eq!(unpad_rows(&data, 4, 4, 3), data.to_vec());
    }

    // Stands in for ffmpeg: reads stdin until we close it.
    fn spawn_sink() -> (Child, ChildStdin) {
        let mut child = Command::new("cat")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .unwrap();
        let stdin = child.stdin.take().unwrap();
        (child, stdin)
    }

    #[test]
    fn worker_drains_queued_frames_before_reporting_done() {
        let (child, stdin) = spawn_sink();
        let (tx, rx) = channel();
        let worker_done = Arc::new(AtomicBool::new(false));
        let frames_encoded = Arc::new(AtomicUsize::new(0));
        let encode_failed = Arc::new(AtomicBool::new(false));

        let worker = {
            let (done, encoded, failed) = (
                worker_done.clone(),
                frames_encoded.clone(),
                encode_failed.clone(),
            );
            thread::spawn(move || {
                worker_thread_function(rx, child, stdin, 2, 2, encoded, failed, done);
            })
        };

        for _ in 0..3 {
            tx.send(vec![255u8; 2 * 2 * 4]).unwrap();
        }
        // Dropping the sender is the end-of-input signal, as on quit.
        drop(tx);
        worker.join().unwrap();

        assert!(worker_done.load(Ordering::SeqCst));
        assert_eq!(frames_encoded.load(Ordering::SeqCst), 3);
        assert!(!encode_failed.load(Ordering::SeqCst));
    }

    #[test]
    fn output_files_are_numbered() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(next_output_path(dir.path()), dir.path().join("output.mp4"));

        std::fs::write(dir.path().join("output.mp4"), b"x").unwrap();
        assert_eq!(next_output_path(dir.path()), dir.path().join("output1.mp4"));

        std::fs::write(dir.path().join("output1.mp4"), b"x").unwrap();
        assert_eq!(next_output_path(dir.path()), dir.path().join("output2.mp4"));
    }
}
