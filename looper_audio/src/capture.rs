//! Capture daemon: continuously drains the input queue into the
//! session's temp recording file while the capture flag holds.
//! Mirrors `daemons.recorder` in `examples/original_source/src/daemons.py`.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use looper_core::flag::Flag;
use looper_core::frame::Frame;
use looper_core::spsc::Consumer;
use looper_file::WavFileWriter;
use tracing::{debug, warn};

/// Dedicated thread that appends input frames to the temp recording
/// file while the capture flag holds, truncating it fresh on every
/// rise. A separate stop flag pre-empts the capture flag at shutdown.
///
/// Every batch drained from the input queue is also appended to
/// `captured`, an in-memory mirror of the frames written so far. This
/// lets a caller read the in-progress take mid-recording without
/// reopening the temp WAV file, which `hound` only patches with a
/// correct header at `finalize()` — reading it before then returns a
/// zero-length file.
pub struct CaptureDaemon {
    handle: JoinHandle<()>,
}

impl CaptureDaemon {
    pub fn spawn(
        mut input: Consumer<Frame>,
        capture_flag: Flag,
        stop_flag: Flag,
        temp_path: PathBuf,
        poll_interval: Duration,
        captured: Arc<Mutex<Vec<Frame>>>,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("capture".into())
            .spawn(move || {
                loop {
                    while !capture_flag.is_set() {
                        if stop_flag.is_set() {
                            return;
                        }
                        thread::sleep(poll_interval);
                    }
                    if stop_flag.is_set() {
                        return;
                    }

                    let mut writer = match WavFileWriter::create(&temp_path) {
                        Ok(writer) => writer,
                        Err(error) => {
                            warn!(%error, "failed to open temp recording file, skipping this take");
                            capture_flag.wait_until_clear(poll_interval);
                            continue;
                        }
                    };

                    // Drop any stale blocks that queued before the flag rose.
                    while input.try_pop().is_some() {}
                    captured.lock().unwrap().clear();

                    while capture_flag.is_set() && !stop_flag.is_set() {
                        let mut batch = Vec::new();
                        while let Some(frame) = input.try_pop() {
                            batch.push(frame);
                        }
                        if batch.is_empty() {
                            thread::sleep(poll_interval);
                            continue;
                        }
                        if let Err(error) = writer.write_frames(&batch) {
                            warn!(%error, "capture write failed, frames lost");
                        }
                        captured.lock().unwrap().extend_from_slice(&batch);
                    }

                    if let Err(error) = writer.finalize() {
                        warn!(%error, "failed to finalize temp recording file");
                    }
                    debug!("capture stopped");

                    if stop_flag.is_set() {
                        return;
                    }
                }
            })
            .expect("failed to spawn capture thread");

        Self { handle }
    }

    pub fn join(self) {
        let _ = self.handle.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use looper_core::spsc::SpscRingBuffer;

    #[test]
    fn captured_snapshot_mirrors_the_finalized_file_and_resets_on_rerise() {
        let dir = tempfile::tempdir().unwrap();
        let temp_path = dir.path().join("temp_recording_file.wav");
        let poll = Duration::from_millis(2);

        let (mut producer, consumer) = SpscRingBuffer::new::<Frame>(1024);
        let capture_flag = Flag::new();
        let stop_flag = Flag::new();
        let captured = Arc::new(Mutex::new(Vec::new()));

        let daemon = CaptureDaemon::spawn(
            consumer,
            capture_flag.clone(),
            stop_flag.clone(),
            temp_path.clone(),
            poll,
            Arc::clone(&captured),
        );

        let first_take: Vec<Frame> = (0..500).map(|i| [i as f32 / 500.0, 0.0]).collect();
        capture_flag.set();
        for frame in &first_take {
            while producer.try_push(*frame).is_err() {
                thread::sleep(poll);
            }
        }
        // Wait for the daemon to drain the queue into `captured`.
        while captured.lock().unwrap().len() < first_take.len() {
            thread::sleep(poll);
        }
        assert_eq!(captured.lock().unwrap().len(), first_take.len());

        capture_flag.clear();
        // Wait for the writer to finalize before reopening the file.
        thread::sleep(poll * 10);

        let on_disk = looper_file::WavFileReader::open(&temp_path).unwrap();
        assert_eq!(on_disk.frames().len(), first_take.len());

        // A second take's rise must clear the stale snapshot, even
        // though no frames have arrived for it yet.
        capture_flag.set();
        thread::sleep(poll * 5);
        assert!(captured.lock().unwrap().is_empty());

        stop_flag.set();
        capture_flag.clear();
        daemon.join();
    }
}
