/*!

  VTPv1 instructions are single 32 bit words, transmitted big-endian. The top four bits are the
  opcode; the remaining 28 bits hold the parameters in one of two formats:

    Format A (time):            [OpCode:4][ParameterA:28]
    Format B (freq, amp):       [OpCode:4][Channel:8][TimeOffset:10][ParameterA:10]

  Only opcodes 0 (increment time), 1 (set frequency) and 2 (set amplitude) exist. Every other
  opcode is rejected in both directions. A channel select of 0 addresses every channel;
  otherwise channels count from 1.

  The time offset of a format B instruction is the number of milliseconds after the current
  elapsed time at which its change takes effect, so applying it also advances the clock. The
  parameter of `time` is the same quantity with no other effect.

  The human readable form of an instruction is called assembly. See `assembly` for the grammar.

*/

mod binary;
mod instruction;
pub mod assembly;

pub use binary::{
  decode_instruction, decode_instructions, encode_instruction, encode_instructions,
  encode_raw_instruction, encode_raw_instructions, read_instruction_words,
  write_instruction_words, time_offset, raw_time_offset, validate_instruction,
  Word, WORD_SIZE, MAX_TIME_PARAMETER, MAX_CHANNEL_VALUE
};
pub use instruction::{ChannelParameters, Instruction, Opcode, RawInstruction, WILDCARD_CHANNEL};
pub use assembly::{
  disassemble, disassemble_words, parse_assembly, parse_line, AssemblyLines, ParseError,
  ParseErrorKind
};
