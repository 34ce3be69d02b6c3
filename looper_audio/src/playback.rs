//! Playback daemon: the producer thread that cycles over the two
//! double-buffered playback backing stores selected by the side flag,
//! pushing fixed-size blocks into the bounded queue the output
//! callback drains. Mirrors `daemons.player` in
//! `examples/original_source/src/daemons.py`, generalized from
//! "play the whole file on a beat" to "stream it block by block".

use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use looper_core::flag::Flag;
use looper_core::frame::{Frame, SILENT_FRAME};
use looper_core::spsc::{Consumer, Producer, SpscRingBuffer};
use looper_file::WavFileReader;
use tracing::{debug, warn};

/// One bit selecting which of the two playback backing stores is
/// currently being read. Flipped by the producer at end-of-file; the
/// mix engine writes the *other* store and only then lets a flip
/// happen, giving it a deadline-free window.
pub type SideFlag = Flag;

pub struct PlaybackDaemon {
    handle: JoinHandle<()>,
}

impl PlaybackDaemon {
    /// Build the bounded block queue (`blocksize * queue_depth` frames
    /// deep) and spawn the producer thread. Returns the daemon handle
    /// and the `Consumer` side to hand to
    /// [`crate::device::AudioIo::start_playback_callback`].
    pub fn spawn(
        side_flag: SideFlag,
        stop_flag: Flag,
        store_paths: [PathBuf; 2],
        blocksize: usize,
        queue_depth: usize,
        block_timeout: Duration,
    ) -> (Self, Consumer<Frame>) {
        let (mut producer, consumer) = SpscRingBuffer::new::<Frame>(blocksize.max(1) * queue_depth.max(1));

        let handle = thread::Builder::new()
            .name("playback-producer".into())
            .spawn(move || {
                loop {
                    if stop_flag.is_set() {
                        return;
                    }

                    let side = usize::from(side_flag.is_set());
                    let path = &store_paths[side];

                    match WavFileReader::open(path) {
                        Ok(reader) => {
                            let frames = reader.into_frames();
                            for block in frames.chunks(blocksize.max(1)) {
                                if stop_flag.is_set() {
                                    return;
                                }
                                push_block(&mut producer, block, block_timeout, &stop_flag);
                            }
                        }
                        Err(error) => {
                            warn!(%error, "failed to open playback backing store, emitting silence");
                            let silence = vec![SILENT_FRAME; blocksize.max(1)];
                            push_block(&mut producer, &silence, block_timeout, &stop_flag);
                        }
                    }

                    if stop_flag.is_set() {
                        return;
                    }

                    // End of stream: flip the side so the mix engine's
                    // next commit can overwrite the store we just
                    // finished reading.
                    if side_flag.is_set() {
                        side_flag.clear();
                    } else {
                        side_flag.set();
                    }
                    debug!(previous_side = side, "playback side flipped");
                }
            })
            .expect("failed to spawn playback-producer thread");

        (Self { handle }, consumer)
    }

    pub fn join(self) {
        let _ = self.handle.join();
    }
}

/// Push every frame of `block` into `producer`, retrying on a full
/// queue with `timeout` between attempts: blocking push uses
/// `blocktime` as timeout; on expiry it logs and retries. Returns
/// early if `stop_flag` is raised mid-push.
fn push_block(producer: &mut Producer<Frame>, block: &[Frame], timeout: Duration, stop_flag: &Flag) {
    for frame in block {
        let mut pending = *frame;
        let mut logged = false;
        loop {
            match producer.try_push(pending) {
                Ok(()) => break,
                Err(returned) => {
                    pending = returned;
                    if stop_flag.is_set() {
                        return;
                    }
                    if !logged {
                        warn!("playback queue full, retrying push");
                        logged = true;
                    }
                    thread::sleep(timeout);
                }
            }
        }
    }
}
