//! # looper_file
//!
//! WAV file I/O for the looper's takes and playback backing stores,
//! and the per-session directory that holds them.
//!
//! ## Supported formats
//!
//! - **WAV**: via `hound` (writing) and `wavers` (reading), fixed to
//!   stereo 32-bit float at 44100 Hz.
//!
//! ## Usage
//!
//! ```ignore
//! use looper_file::readers::wav::WavFileReader;
//! use looper_file::writers::wav::WavFileWriter;
//!
//! let reader = WavFileReader::open(Path::new("input.wav"))?;
//! let mut writer = WavFileWriter::create("output.wav")?;
//! writer.write_frames(reader.frames())?;
//! writer.finalize()?;
//! ```

pub mod error;
pub mod readers;
pub mod session;
pub mod writers;

pub use error::{FileError, Result};
pub use readers::wav::WavFileReader;
pub use session::{Session, TakeRecord};
pub use writers::wav::{write_atomic, WavFileWriter};
