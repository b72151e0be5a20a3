use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, IntoStaticStr, EnumString};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use crate::error::VtpError;

/**
  Instruction codes of VTPv1.

  The discriminants are the values of the 4-bit opcode field of an instruction word, and the
  strum names are the assembly mnemonics. The format of the parameters is determined by the
  opcode: `IncrementTime` uses format A, the other two use format B.
*/
#[derive(
StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq, PartialEq,  Debug,            Hash
)]
#[repr(u8)]
pub enum Opcode {
  #[strum(serialize = "time")]
  IncrementTime = 0, // time +<parameter_a>ms
  #[strum(serialize = "freq")]
  SetFrequency  = 1, // freq [+<time_offset>ms] ch<n|*> <parameter_a>
  #[strum(serialize = "amp")]
  SetAmplitude  = 2, // amp  [+<time_offset>ms] ch<n|*> <parameter_a>
}

impl Opcode {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// Reads a 4-bit opcode field. Codes outside the instruction set are `InvalidOpcode`.
  pub fn from_code(code: u8) -> Result<Opcode, VtpError> {
    Opcode::try_from(code).map_err(|e| VtpError::InvalidOpcode(e.number))
  }
}


/// Channel select value addressing every channel of the display.
pub const WILDCARD_CHANNEL: u8 = 0;

/**
  Parameters of the format B instructions `SetFrequency` and `SetAmplitude`.

  The fields are wider than their wire fields (10 bits for `time_offset` and `parameter_a`).
  The assembler admits 16-bit values, the codec masks to the field width, and
  `validate_instruction` is the strict check in between.
*/
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Default)]
pub struct ChannelParameters {
  /// 0 selects every channel, otherwise a one-based channel number.
  pub channel_select : u8,
  /// Milliseconds after the current elapsed time at which the change takes effect.
  pub time_offset    : u16,
  pub parameter_a    : u16
}

impl ChannelParameters {
  pub fn new(channel_select: u8, time_offset: u16, parameter_a: u16) -> Self {
    ChannelParameters { channel_select, time_offset, parameter_a }
  }

  pub fn is_wildcard(&self) -> bool {
    self.channel_select == WILDCARD_CHANNEL
  }
}

/// A decoded VTPv1 instruction.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Instruction {
  /// [OpCode:4][ParameterA:28]
  IncrementTime {
    parameter_a: u32
  },
  /// [OpCode:4][Channel:8][TimeOffset:10][ParameterA:10]
  SetFrequency(ChannelParameters),
  /// [OpCode:4][Channel:8][TimeOffset:10][ParameterA:10]
  SetAmplitude(ChannelParameters),
}

impl Instruction {
  pub fn opcode(&self) -> Opcode {
    match self {
      Instruction::IncrementTime { .. } => Opcode::IncrementTime,
      Instruction::SetFrequency(_)      => Opcode::SetFrequency,
      Instruction::SetAmplitude(_)      => Opcode::SetAmplitude,
    }
  }
}

/**
  The assembly form of the instruction. `time` renders as `time +<n>ms`; `freq`/`amp` render
  the channel first and omit a zero time offset, e.g. `freq ch2 +50ms 456` or `amp ch* 123`.
*/
impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      Instruction::IncrementTime { parameter_a } => {
        write!(f, "{} +{}ms", self.opcode(), parameter_a)
      }

      | Instruction::SetFrequency(parameters)
      | Instruction::SetAmplitude(parameters) => {
        write!(f, "{} ", self.opcode())?;
        match parameters.is_wildcard() {
          true  => write!(f, "ch*")?,
          false => write!(f, "ch{}", parameters.channel_select)?
        }
        if parameters.time_offset > 0 {
          write!(f, " +{}ms", parameters.time_offset)?;
        }
        write!(f, " {}", parameters.parameter_a)
      }

    }
  }
}

/**
  An instruction as a bare tag plus the union of all parameter fields, the shape an instruction
  has before its tag has been checked. `code` selects which fields are meaningful: format A
  reads `parameter_a`, format B reads all three.

  This is the only way to hand the encoder an opcode outside the instruction set.
*/
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Default)]
pub struct RawInstruction {
  pub code           : u8,
  pub channel_select : u8,
  pub time_offset    : u16,
  pub parameter_a    : u32
}

impl From<Instruction> for RawInstruction {
  fn from(instruction: Instruction) -> Self {
    let code = instruction.opcode().code();
    match instruction {
      Instruction::IncrementTime { parameter_a } => RawInstruction {
        code,
        parameter_a,
        ..RawInstruction::default()
      },
      | Instruction::SetFrequency(parameters)
      | Instruction::SetAmplitude(parameters) => RawInstruction {
        code,
        channel_select : parameters.channel_select,
        time_offset    : parameters.time_offset,
        parameter_a    : parameters.parameter_a as u32
      }
    }
  }
}

impl TryFrom<RawInstruction> for Instruction {
  type Error = VtpError;

  /// Checks the tag. Format B's `parameter_a` is truncated to 16 bits.
  fn try_from(raw: RawInstruction) -> Result<Self, Self::Error> {
    let parameters =
      ChannelParameters::new(raw.channel_select, raw.time_offset, raw.parameter_a as u16);
    let instruction = match Opcode::from_code(raw.code)? {
      Opcode::IncrementTime => Instruction::IncrementTime { parameter_a: raw.parameter_a },
      Opcode::SetFrequency  => Instruction::SetFrequency(parameters),
      Opcode::SetAmplitude  => Instruction::SetAmplitude(parameters),
    };
    Ok(instruction)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;

  #[test]
  fn opcode_from_code(){
    assert_eq!(Opcode::from_code(0), Ok(Opcode::IncrementTime));
    assert_eq!(Opcode::from_code(2), Ok(Opcode::SetAmplitude));
    assert_eq!(Opcode::from_code(3), Err(VtpError::InvalidOpcode(3)));
    assert_eq!(Opcode::from_code(0xFE), Err(VtpError::InvalidOpcode(0xFE)));
  }

  #[test]
  fn opcode_mnemonics(){
    assert_eq!(Opcode::SetFrequency.to_string(), "freq");
    assert_eq!(Opcode::from_str("amp"), Ok(Opcode::SetAmplitude));
    assert!(Opcode::from_str("volume").is_err());
  }

  #[test]
  fn format_time(){
    let instruction = Instruction::IncrementTime { parameter_a: 2000 };
    assert_eq!(instruction.to_string(), "time +2000ms");
  }

  #[test]
  fn format_channel_instructions(){
    let wildcard = Instruction::SetAmplitude(ChannelParameters::new(0, 0, 123));
    assert_eq!(wildcard.to_string(), "amp ch* 123");

    let offset = Instruction::SetFrequency(ChannelParameters::new(2, 50, 456));
    assert_eq!(offset.to_string(), "freq ch2 +50ms 456");
  }

  #[test]
  fn raw_instruction_tag_is_checked(){
    let raw = RawInstruction { code: 0xFE, ..RawInstruction::default() };
    assert_eq!(Instruction::try_from(raw), Err(VtpError::InvalidOpcode(0xFE)));

    let instruction = Instruction::SetAmplitude(ChannelParameters::new(0xAA, 0x333, 0x16B));
    let raw = RawInstruction::from(instruction);
    assert_eq!(raw.code, 2);
    assert_eq!(Instruction::try_from(raw), Ok(instruction));
  }

  #[test]
  fn raw_instruction_keeps_its_format(){
    // `time` keeps all 32 bits of its parameter; only format B narrows it.
    let raw = RawInstruction { code: 0, channel_select: 3, parameter_a: 0x0ABC_DEF0, ..RawInstruction::default() };
    assert_eq!(Instruction::try_from(raw), Ok(Instruction::IncrementTime { parameter_a: 0x0ABC_DEF0 }));

    let raw = RawInstruction { code: 1, channel_select: 3, time_offset: 7, parameter_a: 0x1_0009 };
    assert_eq!(
      Instruction::try_from(raw),
      Ok(Instruction::SetFrequency(ChannelParameters::new(3, 7, 9)))
    );

    let raw = RawInstruction { code: 2, ..raw };
    assert_eq!(Instruction::try_from(raw).map(|i| i.opcode()), Ok(Opcode::SetAmplitude));
  }
}
