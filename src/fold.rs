/*!
  Folding applies instructions, in order, to an `Accumulator`.

  Every instruction first advances the clock by its time offset. The channel instructions then
  write their value into the selected channel, or into every channel for `ch*`. Folding stops
  at the first instruction that fails; everything before it stays applied and the failing
  instruction has no effect.

  `fold_until` applies instructions only while doing so keeps the clock at or before a target
  time, which lets a caller replay a program incrementally: fold up to `t`, drop the applied
  prefix, fold up to a later `t`, and so on. `Sampler` does exactly that at a fixed step.
*/

use std::convert::TryFrom;

use log::{debug, trace};

use crate::accumulator::Accumulator;
use crate::bytecode::{raw_time_offset, time_offset, ChannelParameters, Instruction, RawInstruction};
use crate::error::{SequenceError, VtpError};

/// Applies a single instruction to the accumulator.
pub fn fold_single(accumulator: &mut Accumulator, instruction: &Instruction) -> Result<(), VtpError> {
  match instruction {

    Instruction::IncrementTime { parameter_a } => {
      accumulator.advance(*parameter_a as u64);
    }

    Instruction::SetFrequency(parameters) => {
      check_channel(accumulator, parameters)?;
      accumulator.advance(parameters.time_offset as u64);
      write_channels(accumulator.frequencies_mut(), parameters);
    }

    Instruction::SetAmplitude(parameters) => {
      check_channel(accumulator, parameters)?;
      accumulator.advance(parameters.time_offset as u64);
      write_channels(accumulator.amplitudes_mut(), parameters);
    }

  }

  #[cfg(feature = "trace_computation")]
  trace!("{:<24} elapsed {} ms", instruction.to_string(), accumulator.milliseconds_elapsed());

  Ok(())
}

fn check_channel(accumulator: &Accumulator, parameters: &ChannelParameters) -> Result<(), VtpError> {
  match parameters.channel_select > accumulator.n_channels() {
    true  => Err(VtpError::ChannelOutOfRange {
      channel    : parameters.channel_select,
      n_channels : accumulator.n_channels()
    }),
    false => Ok(())
  }
}

fn write_channels(channels: &mut [u32], parameters: &ChannelParameters) {
  let value = parameters.parameter_a as u32;
  match parameters.is_wildcard() {
    true  => channels.iter_mut().for_each(|channel| *channel = value),
    false => channels[parameters.channel_select as usize - 1] = value
  }
}

/// Applies every instruction in order, stopping at the first one that fails.
pub fn fold(accumulator: &mut Accumulator, instructions: &[Instruction]) -> Result<(), SequenceError> {
  for (index, instruction) in instructions.iter().enumerate() {
    fold_single(accumulator, instruction).map_err(|e| SequenceError::new(index, e))?;
  }

  debug!(
    "Folded {} instructions, elapsed {} ms.",
    instructions.len(),
    accumulator.milliseconds_elapsed()
  );
  Ok(())
}

/// `fold` over instructions whose tags have not been checked. An unknown tag is `InvalidOpcode`.
pub fn fold_raw(accumulator: &mut Accumulator, instructions: &[RawInstruction]) -> Result<(), SequenceError> {
  for (index, raw) in instructions.iter().enumerate() {
    Instruction::try_from(*raw)
      .and_then(|instruction| fold_single(accumulator, &instruction))
      .map_err(|e| SequenceError::new(index, e))?;
  }
  Ok(())
}

/**
  Applies instructions from the front of `instructions` for as long as the next one would not
  move the clock past `until_ms`, and returns how many were applied. Stopping early is not an
  error. Because the comparison is against the accumulator's own clock, a target at or before
  the current elapsed time applies only instructions with a zero time offset.
*/
pub fn fold_until(accumulator: &mut Accumulator, instructions: &[Instruction], until_ms: u64)
  -> Result<usize, SequenceError>
{
  let mut applied = 0;

  for (index, instruction) in instructions.iter().enumerate() {
    let due = accumulator.milliseconds_elapsed().saturating_add(time_offset(instruction));
    if due > until_ms {
      break;
    }
    fold_single(accumulator, instruction).map_err(|e| SequenceError::new(index, e))?;
    applied += 1;
  }

  trace!("Folded {} instructions up to {} ms.", applied, until_ms);
  Ok(applied)
}

/// `fold_until` over unchecked instructions. An unknown tag has no time offset, so it is always
/// reached and fails with `InvalidOpcode`.
pub fn fold_raw_until(accumulator: &mut Accumulator, instructions: &[RawInstruction], until_ms: u64)
  -> Result<usize, SequenceError>
{
  let mut applied = 0;

  for (index, raw) in instructions.iter().enumerate() {
    let due = accumulator.milliseconds_elapsed().saturating_add(raw_time_offset(raw));
    if due > until_ms {
      break;
    }
    Instruction::try_from(*raw)
      .and_then(|instruction| fold_single(accumulator, &instruction))
      .map_err(|e| SequenceError::new(index, e))?;
    applied += 1;
  }

  trace!("Folded {} raw instructions up to {} ms.", applied, until_ms);
  Ok(applied)
}

/// The display state at a sample time.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Sample {
  pub milliseconds : u64,
  pub accumulator  : Accumulator
}

/**
  Replays a program at uniformly increasing sample times, yielding the accumulator at each
  one. The first sample is taken at the accumulator's current elapsed time, and the last once
  every instruction has been applied.
*/
pub struct Sampler<'a> {
  accumulator : Accumulator,
  remaining   : &'a [Instruction],
  applied     : usize,
  step_ms     : u64,
  next_ms     : u64,
  finished    : bool
}

impl<'a> Sampler<'a> {
  /// A `step_ms` of zero is taken as one millisecond.
  pub fn new(accumulator: Accumulator, instructions: &'a [Instruction], step_ms: u64) -> Self {
    Sampler {
      next_ms     : accumulator.milliseconds_elapsed(),
      accumulator,
      remaining   : instructions,
      applied     : 0,
      step_ms     : step_ms.max(1),
      finished    : false
    }
  }

  pub fn accumulator(&self) -> &Accumulator {
    &self.accumulator
  }

  /// The instructions not yet applied.
  pub fn remaining(&self) -> &'a [Instruction] {
    self.remaining
  }
}

impl<'a> Iterator for Sampler<'a> {
  type Item = Result<Sample, SequenceError>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished {
      return None;
    }

    let until_ms = self.next_ms;
    match fold_until(&mut self.accumulator, self.remaining, until_ms) {
      Ok(applied) => {
        self.remaining = &self.remaining[applied..];
        self.applied  += applied;
      }
      Err(e) => {
        self.finished = true;
        return Some(Err(SequenceError::new(self.applied + e.index, e.source)));
      }
    }

    self.finished = self.remaining.is_empty();
    self.next_ms  = until_ms.saturating_add(self.step_ms);

    Some(Ok(Sample { milliseconds: until_ms, accumulator: self.accumulator.clone() }))
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::decode_instructions;

  /*
    freq ch* 234
    amp ch* 123
    freq ch2 345

    freq +50ms ch2 456
    freq ch1 789

    time +2000ms
    amp ch* 234
    freq ch2 567
  */
  const TEST_WORDS: [u32; 8] = [
    0x100000ea, 0x2000007b, 0x10200159, 0x1020c9c8,
    0x10100315, 0x000007d0, 0x200000ea, 0x10200237
  ];

  fn test_program() -> Vec<Instruction> {
    decode_instructions(&TEST_WORDS).unwrap()
  }

  fn set_amplitude(channel_select: u8, parameter_a: u16) -> Instruction {
    Instruction::SetAmplitude(ChannelParameters::new(channel_select, 0, parameter_a))
  }

  #[test]
  fn fold_yields_expected_accumulation(){
    let mut accumulator = Accumulator::new(3);
    fold(&mut accumulator, &test_program()).unwrap();

    assert_eq!(accumulator.amplitudes(), &[234, 234, 234]);
    assert_eq!(accumulator.frequencies(), &[789, 567, 234]);
    assert_eq!(accumulator.milliseconds_elapsed(), 2050);
  }

  #[test]
  fn fold_with_no_instructions_does_nothing(){
    let mut accumulator = Accumulator::with_state(vec![1995; 3], vec![2311; 3], 0).unwrap();
    fold(&mut accumulator, &[]).unwrap();

    assert_eq!(accumulator.amplitudes(), &[1995, 1995, 1995]);
    assert_eq!(accumulator.frequencies(), &[2311, 2311, 2311]);
    assert_eq!(accumulator.milliseconds_elapsed(), 0);
  }

  #[test]
  fn wildcard_sets_every_channel(){
    let mut accumulator = Accumulator::new(3);
    fold_single(&mut accumulator, &set_amplitude(0, 123)).unwrap();
    assert_eq!(accumulator.amplitudes(), &[123, 123, 123]);
    assert_eq!(accumulator.frequencies(), &[0, 0, 0]);
  }

  #[test]
  fn channel_out_of_range_keeps_earlier_changes(){
    let mut accumulator = Accumulator::new(3);
    let program = [
      set_amplitude(1, 10),
      Instruction::IncrementTime { parameter_a: 5 },
      set_amplitude(3, 30),
      Instruction::SetAmplitude(ChannelParameters::new(4, 20, 40)),
      set_amplitude(2, 20),
    ];

    let result = fold(&mut accumulator, &program);
    assert_eq!(
      result,
      Err(SequenceError::new(3, VtpError::ChannelOutOfRange { channel: 4, n_channels: 3 }))
    );
    assert_eq!(accumulator.amplitudes(), &[10, 0, 30]);
    // The failing instruction does not advance the clock either.
    assert_eq!(accumulator.milliseconds_elapsed(), 5);
  }

  #[test]
  fn time_offset_advances_before_the_change(){
    let mut accumulator = Accumulator::new(1);
    let instruction = Instruction::SetFrequency(ChannelParameters::new(1, 50, 456));
    fold_single(&mut accumulator, &instruction).unwrap();
    assert_eq!(accumulator.milliseconds_elapsed(), 50);
    assert_eq!(accumulator.frequencies(), &[456]);
  }

  #[test]
  fn fold_until_stops_at_the_right_time(){
    let program = test_program();
    let mut accumulator = Accumulator::new(3);

    let applied = fold_until(&mut accumulator, &program, 0).unwrap();
    assert_eq!(applied, 3);
    assert_eq!(accumulator.milliseconds_elapsed(), 0);
    assert_eq!(accumulator.frequencies(), &[234, 345, 234]);

    let rest = &program[applied..];
    let applied = fold_until(&mut accumulator, rest, 50).unwrap();
    assert_eq!(applied, 2);
    assert_eq!(accumulator.milliseconds_elapsed(), 50);
    assert_eq!(accumulator.frequencies(), &[789, 456, 234]);

    let rest = &rest[applied..];
    assert_eq!(fold_until(&mut accumulator, rest, 2049).unwrap(), 0);
    assert_eq!(fold_until(&mut accumulator, rest, 2050).unwrap(), 3);
    assert_eq!(accumulator.milliseconds_elapsed(), 2050);
  }

  #[test]
  fn fold_until_past_does_nothing(){
    let program = test_program();
    let mut accumulator = Accumulator::new(3);
    fold(&mut accumulator, &program[..5]).unwrap();
    let before = accumulator.clone();

    // `time +2000ms` is next; a target behind the clock cannot reach it.
    assert_eq!(fold_until(&mut accumulator, &program[5..], 10).unwrap(), 0);
    assert_eq!(accumulator, before);
  }

  #[test]
  fn fold_until_reports_failures(){
    let mut accumulator = Accumulator::new(1);
    let program = [set_amplitude(1, 1), set_amplitude(2, 2)];
    assert_eq!(
      fold_until(&mut accumulator, &program, 100),
      Err(SequenceError::new(1, VtpError::ChannelOutOfRange { channel: 2, n_channels: 1 }))
    );
    assert_eq!(accumulator.amplitudes(), &[1]);
  }

  #[test]
  fn raw_instructions_with_invalid_tags(){
    let mut accumulator = Accumulator::new(2);
    let program = [
      RawInstruction::from(set_amplitude(0, 9)),
      RawInstruction { code: 0xFE, ..RawInstruction::default() },
    ];
    assert_eq!(
      fold_raw(&mut accumulator, &program),
      Err(SequenceError::new(1, VtpError::InvalidOpcode(0xFE)))
    );
    assert_eq!(accumulator.amplitudes(), &[9, 9]);
  }

  #[test]
  fn raw_fold_until_matches_typed_fold_until(){
    let program = test_program();
    let raw: Vec<RawInstruction> = program.iter().copied().map(RawInstruction::from).collect();

    for &until_ms in &[0, 50, 2049, 2050] {
      let mut typed = Accumulator::new(3);
      let mut unchecked = Accumulator::new(3);
      let applied = fold_until(&mut typed, &program, until_ms).unwrap();
      assert_eq!(fold_raw_until(&mut unchecked, &raw, until_ms).unwrap(), applied);
      assert_eq!(unchecked, typed);
    }
  }

  #[test]
  fn raw_fold_until_reaches_invalid_tags(){
    let mut accumulator = Accumulator::new(1);
    let program = [
      RawInstruction::from(set_amplitude(1, 4)),
      RawInstruction { code: 9, time_offset: 500, parameter_a: 500, ..RawInstruction::default() },
    ];
    assert_eq!(
      fold_raw_until(&mut accumulator, &program, 0),
      Err(SequenceError::new(1, VtpError::InvalidOpcode(9)))
    );
    assert_eq!(accumulator.amplitudes(), &[4]);
    assert_eq!(accumulator.milliseconds_elapsed(), 0);
  }

  #[test]
  fn sampler_steps_through_program(){
    let program = test_program();
    let samples: Vec<Sample> = Sampler::new(Accumulator::new(3), &program, 1000)
      .collect::<Result<_, _>>()
      .unwrap();

    let times: Vec<u64> = samples.iter().map(|s| s.milliseconds).collect();
    assert_eq!(times, vec![0, 1000, 2000, 3000]);

    assert_eq!(samples[0].accumulator.milliseconds_elapsed(), 0);
    assert_eq!(samples[1].accumulator.milliseconds_elapsed(), 50);
    assert_eq!(samples[1].accumulator.frequencies(), &[789, 456, 234]);
    assert_eq!(samples[2].accumulator.milliseconds_elapsed(), 50);
    assert_eq!(samples[3].accumulator.milliseconds_elapsed(), 2050);
    assert_eq!(samples[3].accumulator.amplitudes(), &[234, 234, 234]);
  }

  #[test]
  fn sampler_reports_absolute_position(){
    let program = [
      set_amplitude(1, 1),
      Instruction::IncrementTime { parameter_a: 10 },
      set_amplitude(9, 2),
    ];
    let mut sampler = Sampler::new(Accumulator::new(1), &program, 10);
    assert!(sampler.next().unwrap().is_ok());
    assert_eq!(
      sampler.next().unwrap(),
      Err(SequenceError::new(2, VtpError::ChannelOutOfRange { channel: 9, n_channels: 1 }))
    );
    assert!(sampler.next().is_none());
  }
}
