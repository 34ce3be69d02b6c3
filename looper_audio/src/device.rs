//! The audio I/O adapter: opens one `cpal` input stream and one
//! `cpal` output stream at the looper's fixed format, verifies device
//! sample rates, and exposes the capture daemon's input consumer and
//! the playback daemon's output-stream hookup.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use looper_core::frame::{Frame, SAMPLE_RATE};
use looper_core::spsc::{Consumer, SpscRingBuffer};
use tracing::{info, warn};

use crate::error::{AudioError, Result};

/// Capacity of the capture SPSC queue, in frames. Generous headroom
/// over one `cpal` callback's worth of frames so a slow capture-daemon
/// wakeup doesn't immediately overflow.
const INPUT_QUEUE_CAPACITY: usize = 1 << 16;

/// Opens and owns the looper's input and output audio streams.
pub struct AudioIo {
    _input_stream: cpal::Stream,
    output_device: cpal::Device,
    output_config: StreamConfig,
    output_stream: Option<cpal::Stream>,
}

impl AudioIo {
    /// Open the default input and output devices at 44100 Hz stereo
    /// f32. Returns [`AudioError::DeviceRateMismatch`] if either
    /// device's default sample rate differs — fatal at construction.
    pub fn open() -> Result<(Self, Consumer<Frame>)> {
        let host = cpal::default_host();

        let input_device = host.default_input_device().ok_or(AudioError::NoInputDevice)?;
        let input_config = input_device.default_input_config().map_err(|_| AudioError::NoInputDevice)?;
        Self::verify_rate(input_config.sample_rate().0)?;

        let output_device = host.default_output_device().ok_or(AudioError::NoOutputDevice)?;
        let output_config = output_device.default_output_config().map_err(|_| AudioError::NoOutputDevice)?;
        Self::verify_rate(output_config.sample_rate().0)?;

        let (mut producer, consumer) = SpscRingBuffer::new::<Frame>(INPUT_QUEUE_CAPACITY);

        let stream_config: StreamConfig = input_config.into();
        let channels = stream_config.channels.max(1) as usize;
        let input_stream = input_device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    for frame in data.chunks_exact(channels) {
                        let stereo: Frame = [frame[0], if channels > 1 { frame[1] } else { frame[0] }];
                        if producer.try_push(stereo).is_err() {
                            warn!("input overflow: capture queue full, dropping frame");
                        }
                    }
                },
                move |err| warn!(%err, "input stream error"),
                None,
            )
            .map_err(|source| AudioError::StreamBuildFailed { stream: "input", source })?;
        input_stream.play().map_err(|source| AudioError::StreamPlayFailed { stream: "input", source })?;

        info!(sample_rate = SAMPLE_RATE, "audio input stream opened");

        Ok((
            Self {
                _input_stream: input_stream,
                output_device,
                output_config: output_config.into(),
                output_stream: None,
            },
            consumer,
        ))
    }

    fn verify_rate(actual: u32) -> Result<()> {
        if actual != SAMPLE_RATE {
            return Err(AudioError::DeviceRateMismatch { expected: SAMPLE_RATE, actual });
        }
        Ok(())
    }

    /// Build and start the main output stream. Its callback dequeues
    /// one block per invocation from `consumer`, fed by the playback
    /// daemon's producer side. Underflow emits silence and is logged,
    /// never fatal (`AudioError::OutputUnderflow`).
    pub fn start_playback_callback(&mut self, mut consumer: Consumer<Frame>) -> Result<()> {
        let channels = self.output_config.channels.max(1) as usize;
        let stream = self
            .output_device
            .build_output_stream(
                &self.output_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame_slot in data.chunks_exact_mut(channels) {
                        match consumer.try_pop() {
                            Some(frame) => {
                                frame_slot[0] = frame[0];
                                if channels > 1 {
                                    frame_slot[1] = frame[1];
                                }
                            }
                            None => {
                                warn!("output underflow: emitting silence");
                                for sample in frame_slot.iter_mut() {
                                    *sample = 0.0;
                                }
                            }
                        }
                    }
                },
                move |err| warn!(%err, "output stream error"),
                None,
            )
            .map_err(|source| AudioError::StreamBuildFailed { stream: "output", source })?;
        stream.play().map_err(|source| AudioError::StreamPlayFailed { stream: "output", source })?;
        self.output_stream = Some(stream);
        Ok(())
    }

    /// Stop and drop the main output stream — part of the four-button
    /// shutdown sequence: the output stream is stopped and restarted
    /// to flush.
    pub fn stop_playback_callback(&mut self) {
        self.output_stream.take();
    }
}
