//! The state of a vibrotactile display after some number of instructions has been folded into it.

use std::fmt::{Display, Formatter};

use prettytable::{format as TableFormat, Table};

use crate::error::VtpError;

/**
  Per-channel amplitude and frequency plus the elapsed time. Channel `n` lives at index
  `n - 1`. The channel count is fixed at construction: folding writes into the existing slots
  and never grows or shrinks them, and `milliseconds_elapsed` only ever increases.
*/
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Accumulator {
  n_channels           : u8,
  amplitudes           : Vec<u32>,
  frequencies          : Vec<u32>,
  milliseconds_elapsed : u64
}

impl Accumulator {

  /// A display with every channel at zero amplitude and frequency, at time zero.
  pub fn new(n_channels: u8) -> Accumulator {
    Accumulator {
      n_channels,
      amplitudes           : vec![0; n_channels as usize],
      frequencies          : vec![0; n_channels as usize],
      milliseconds_elapsed : 0
    }
  }

  /**
    A display pre-seeded with the given channel state. Both vectors must have the same length,
    and that length must fit a channel count.
  */
  pub fn with_state(amplitudes: Vec<u32>, frequencies: Vec<u32>, milliseconds_elapsed: u64)
    -> Result<Accumulator, VtpError>
  {
    if amplitudes.len() != frequencies.len() {
      return Err(VtpError::ChannelStateMismatch {
        amplitudes  : amplitudes.len(),
        frequencies : frequencies.len()
      });
    }
    if amplitudes.len() > u8::MAX as usize {
      return Err(VtpError::TooManyChannels(amplitudes.len()));
    }

    Ok(Accumulator {
      n_channels: amplitudes.len() as u8,
      amplitudes,
      frequencies,
      milliseconds_elapsed
    })
  }

  pub fn n_channels(&self) -> u8 {
    self.n_channels
  }

  pub fn amplitudes(&self) -> &[u32] {
    &self.amplitudes
  }

  pub fn frequencies(&self) -> &[u32] {
    &self.frequencies
  }

  pub fn amplitudes_mut(&mut self) -> &mut [u32] {
    &mut self.amplitudes
  }

  pub fn frequencies_mut(&mut self) -> &mut [u32] {
    &mut self.frequencies
  }

  pub fn milliseconds_elapsed(&self) -> u64 {
    self.milliseconds_elapsed
  }

  pub(crate) fn advance(&mut self, milliseconds: u64) {
    self.milliseconds_elapsed = self.milliseconds_elapsed.saturating_add(milliseconds);
  }

  /// The channel state as a table with one row per channel.
  pub fn make_channel_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Channel", ubr->"Amplitude", ubr->"Frequency"]);

    for (i, (amplitude, frequency)) in self.amplitudes.iter().zip(&self.frequencies).enumerate() {
      table.add_row(row![r->format!("ch{}", i + 1), r->amplitude, r->frequency]);
    }
    table
  }
}

lazy_static! {
  pub static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for Accumulator {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "Elapsed: {} ms\n{}", self.milliseconds_elapsed, self.make_channel_table())
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_is_zeroed(){
    let accumulator = Accumulator::new(3);
    assert_eq!(accumulator.n_channels(), 3);
    assert_eq!(accumulator.amplitudes(), &[0, 0, 0]);
    assert_eq!(accumulator.frequencies(), &[0, 0, 0]);
    assert_eq!(accumulator.milliseconds_elapsed(), 0);
  }

  #[test]
  fn seeded_state(){
    let accumulator = Accumulator::with_state(vec![1, 2], vec![3, 4], 10).unwrap();
    assert_eq!(accumulator.n_channels(), 2);
    assert_eq!(accumulator.frequencies(), &[3, 4]);
    assert_eq!(accumulator.milliseconds_elapsed(), 10);

    assert_eq!(
      Accumulator::with_state(vec![1, 2], vec![3], 0),
      Err(VtpError::ChannelStateMismatch { amplitudes: 2, frequencies: 1 })
    );
    assert_eq!(
      Accumulator::with_state(vec![0; 256], vec![0; 256], 0),
      Err(VtpError::TooManyChannels(256))
    );
    assert!(Accumulator::with_state(vec![0; 255], vec![0; 255], 0).is_ok());
  }

  #[test]
  fn display_lists_channels(){
    let mut accumulator = Accumulator::new(2);
    accumulator.amplitudes_mut()[1] = 321;
    let text = accumulator.to_string();
    assert!(text.starts_with("Elapsed: 0 ms\n"));
    assert!(text.contains("ch2"));
    assert!(text.contains("321"));
  }

  #[test]
  fn channel_table_has_a_row_per_channel(){
    let accumulator = Accumulator::with_state(vec![5, 6, 7], vec![50, 60, 70], 0).unwrap();
    let table = accumulator.make_channel_table();
    assert_eq!(table.len(), 3);

    let rendered = table.to_string();
    assert!(rendered.contains("Amplitude"));
    assert!(rendered.contains("ch3"));
    assert!(rendered.contains("70"));
  }
}
