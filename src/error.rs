//! Errors raised by the codec, the validator and the fold engine. Assembly parse errors live
//! with the parser in `bytecode::assembly`.

use thiserror::Error;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
pub enum VtpError {
  /// The 4-bit tag of a word (or of a `RawInstruction`) is not 0, 1 or 2.
  #[error("Invalid instruction code: {0:#x}")]
  InvalidOpcode(u8),

  #[error("Channel {channel} is out of range for a display with {n_channels} channels")]
  ChannelOutOfRange {
    channel    : u8,
    n_channels : u8
  },

  /// Seeded amplitudes and frequencies must describe the same channels.
  #[error("Channel state mismatch: {amplitudes} amplitudes but {frequencies} frequencies")]
  ChannelStateMismatch {
    amplitudes  : usize,
    frequencies : usize
  },

  #[error("Too many channels: {0} (maximum 255)")]
  TooManyChannels(usize),

  /// A byte buffer whose length is not a multiple of four.
  #[error("Unexpected end of input: {0} bytes is not a whole number of instruction words")]
  MisalignedBuffer(usize),

  #[error("Parameter A out of range: {value} (maximum {max})")]
  ParameterOutOfRange {
    value : u32,
    max   : u32
  },

  #[error("Time offset out of range: {value} (maximum {max})")]
  TimeOffsetOutOfRange {
    value : u32,
    max   : u32
  },
}

/// Wraps a `VtpError` with the zero-based position of the element of a sequence that caused it.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
#[error("Error at instruction #{}: {source}", .index + 1)]
pub struct SequenceError {
  pub index  : usize,
  pub source : VtpError
}

impl SequenceError {
  pub fn new(index: usize, source: VtpError) -> Self {
    SequenceError { index, source }
  }
}
