/*!
  VTPv1 is a compact instruction protocol for multi-channel vibrotactile displays, arrays of
  actuators each with an independently settable frequency and amplitude.

  The crate provides:
    * the binary codec between 32 bit instruction words and `Instruction`s (`bytecode`),
    * the assembler and disassembler between `Instruction`s and assembly text
      (`bytecode::assembly`),
    * the fold engine that replays instructions into an `Accumulator` holding the display
      state over time (`fold`).

  ```text
  text  -> [parse_assembly]     -> Instructions -> [encode_instructions] -> words -> bytes
  bytes -> [read_instruction_words] -> words -> [decode_instructions] -> Instructions -> text
  Instructions -> [fold | fold_until | Sampler] -> Accumulator
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod accumulator;
pub mod bytecode;
pub mod chariter;
pub mod error;
pub mod fold;
pub mod token;

pub use accumulator::Accumulator;
pub use bytecode::{Instruction, Opcode, ChannelParameters, RawInstruction, Word};
pub use error::{SequenceError, VtpError};
pub use fold::{fold, fold_raw, fold_raw_until, fold_single, fold_until, Sample, Sampler};
