/*!
  This module is responsible for the encoding and decoding of binary instructions, and for
  moving instruction words in and out of byte buffers.

  Encoding is lenient: every field is masked to its width. `validate_instruction` is the strict
  check a caller runs first if out of range values must be rejected instead of truncated.
*/
use std::convert::TryFrom;

use log::debug;

use super::{ChannelParameters, Instruction, Opcode, RawInstruction};
use crate::error::{SequenceError, VtpError};

// If you change this you must also change `encode_instruction` and `decode_instruction`.
pub type Word = u32;

/// Size of an instruction word on the wire.
pub const WORD_SIZE: usize = 4;

const OPCODE_SHIFT         : u32  = 28;
const OPCODE_MASK          : Word = 0xF000_0000;
const FORMAT_A_MASK        : Word = 0x0FFF_FFFF;
const CHANNEL_SHIFT        : u32  = 20;
const CHANNEL_MASK         : Word = 0x0FF0_0000;
const TIME_OFFSET_SHIFT    : u32  = 10;
const TIME_OFFSET_MASK     : Word = 0x000F_FC00;
const FORMAT_B_VALUE_MASK  : Word = 0x0000_03FF;

/// Largest `parameter_a` of `IncrementTime`.
pub const MAX_TIME_PARAMETER : u32 = FORMAT_A_MASK;
/// Largest `time_offset` and `parameter_a` of the channel instructions.
pub const MAX_CHANNEL_VALUE  : u32 = FORMAT_B_VALUE_MASK;


// region Word I/O

/// Reads big-endian instruction words from `bytes`, which must hold a whole number of words.
pub fn read_instruction_words(bytes: &[u8]) -> Result<Vec<Word>, VtpError> {
  if bytes.len() % WORD_SIZE != 0 {
    return Err(VtpError::MisalignedBuffer(bytes.len()));
  }

  let words = bytes
    .chunks_exact(WORD_SIZE)
    .map(|chunk| Word::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
    .collect();
  Ok(words)
}

/// The inverse of `read_instruction_words`.
pub fn write_instruction_words(words: &[Word]) -> Vec<u8> {
  let mut bytes = Vec::with_capacity(words.len() * WORD_SIZE);
  for word in words {
    bytes.extend_from_slice(&word.to_be_bytes());
  }
  bytes
}

// endregion

// region Codec

/**
  Decodes a single instruction word. The opcode is checked before any parameter field is
  read, so an invalid word never produces a partially decoded instruction.
*/
pub fn decode_instruction(word: Word) -> Result<Instruction, VtpError> {
  let opcode = Opcode::from_code(((word & OPCODE_MASK) >> OPCODE_SHIFT) as u8)?;

  let instruction =
    match opcode {
      // [OpCode:4][ParameterA:28]
      Opcode::IncrementTime => Instruction::IncrementTime {
        parameter_a: word & FORMAT_A_MASK
      },
      // [OpCode:4][Channel:8][TimeOffset:10][ParameterA:10]
      Opcode::SetFrequency  => Instruction::SetFrequency(decode_channel_parameters(word)),
      Opcode::SetAmplitude  => Instruction::SetAmplitude(decode_channel_parameters(word)),
    };

  Ok(instruction)
}

fn decode_channel_parameters(word: Word) -> ChannelParameters {
  ChannelParameters {
    channel_select : ((word & CHANNEL_MASK)     >> CHANNEL_SHIFT)     as u8,
    time_offset    : ((word & TIME_OFFSET_MASK) >> TIME_OFFSET_SHIFT) as u16,
    parameter_a    :  (word & FORMAT_B_VALUE_MASK)                    as u16,
  }
}

/// Encodes the instruction into a word, silently masking each field to its width.
pub fn encode_instruction(instruction: &Instruction) -> Word {
  let opcode = (instruction.opcode().code() as Word) << OPCODE_SHIFT;

  match instruction {

    Instruction::IncrementTime { parameter_a } => {
      opcode | (parameter_a & FORMAT_A_MASK)
    }

    | Instruction::SetFrequency(parameters)
    | Instruction::SetAmplitude(parameters) => {
      opcode
        | ((parameters.channel_select as Word) << CHANNEL_SHIFT)
        | (((parameters.time_offset as Word) & FORMAT_B_VALUE_MASK) << TIME_OFFSET_SHIFT)
        | ((parameters.parameter_a as Word) & FORMAT_B_VALUE_MASK)
    }

  }
}

/// Encodes an instruction whose tag has not been checked yet.
pub fn encode_raw_instruction(raw: &RawInstruction) -> Result<Word, VtpError> {
  let instruction = Instruction::try_from(*raw)?;
  Ok(encode_instruction(&instruction))
}

/// Decodes every word in order, stopping at the first word with an invalid opcode.
pub fn decode_instructions(words: &[Word]) -> Result<Vec<Instruction>, SequenceError> {
  let instructions = words
    .iter()
    .enumerate()
    .map(|(index, word)| decode_instruction(*word).map_err(|e| SequenceError::new(index, e)))
    .collect::<Result<Vec<Instruction>, SequenceError>>()?;

  debug!("Decoded {} instruction words.", instructions.len());
  Ok(instructions)
}

pub fn encode_instructions(instructions: &[Instruction]) -> Vec<Word> {
  instructions.iter().map(encode_instruction).collect()
}

/// Encodes every raw instruction in order, stopping at the first invalid tag.
pub fn encode_raw_instructions(instructions: &[RawInstruction]) -> Result<Vec<Word>, SequenceError> {
  instructions
    .iter()
    .enumerate()
    .map(|(index, raw)| encode_raw_instruction(raw).map_err(|e| SequenceError::new(index, e)))
    .collect()
}

/**
  The number of milliseconds the instruction advances elapsed time by: `parameter_a` for
  `IncrementTime` and `time_offset` for the channel instructions.
*/
pub fn time_offset(instruction: &Instruction) -> u64 {
  match instruction {
    Instruction::IncrementTime { parameter_a } => *parameter_a as u64,
    | Instruction::SetFrequency(parameters)
    | Instruction::SetAmplitude(parameters) => parameters.time_offset as u64
  }
}

/// `time_offset` for an unchecked instruction. Unknown tags have no time offset.
pub fn raw_time_offset(raw: &RawInstruction) -> u64 {
  match Instruction::try_from(*raw) {
    Ok(instruction) => time_offset(&instruction),
    Err(_)          => 0
  }
}

// endregion

/**
  Checks that every field fits its wire field. The encoder would otherwise mask the value and
  emit a different instruction than the one that was written.
*/
pub fn validate_instruction(instruction: &Instruction) -> Result<(), VtpError> {
  match instruction {

    Instruction::IncrementTime { parameter_a } => {
      if *parameter_a > MAX_TIME_PARAMETER {
        return Err(VtpError::ParameterOutOfRange { value: *parameter_a, max: MAX_TIME_PARAMETER });
      }
    }

    | Instruction::SetFrequency(parameters)
    | Instruction::SetAmplitude(parameters) => {
      let parameter_a = parameters.parameter_a as u32;
      let time_offset = parameters.time_offset as u32;
      if parameter_a > MAX_CHANNEL_VALUE {
        return Err(VtpError::ParameterOutOfRange { value: parameter_a, max: MAX_CHANNEL_VALUE });
      }
      if time_offset > MAX_CHANNEL_VALUE {
        return Err(VtpError::TimeOffsetOutOfRange { value: time_offset, max: MAX_CHANNEL_VALUE });
      }
    }

  }

  Ok(())
}
