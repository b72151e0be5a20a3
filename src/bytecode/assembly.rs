/*!
  The human readable textual form of bytecode is called assembly. Assembly is line oriented,
  one instruction per line:

    ```text
    <line>        ::= <ws>? (<comment> | <instruction> <ws>? <comment>?)? <line_end>
    <instruction> ::= 'time' <ws> <time_offset>
                    | ('amp' | 'freq') <ws> <format_b>
    <format_b>    ::= (<time_offset> <ws>?)? <channel> <ws>? (<time_offset> <ws>?)? <number>
    <time_offset> ::= '+' <number> 'ms'
    <channel>     ::= 'ch' (<number> | '*')
    <comment>     ::= '--' [^\n]*
    ```

  Keywords are case insensitive. A format B instruction has at most one time offset, either
  before the channel or after it; an omitted offset is zero. Channel numbers count from 1, and
  `ch*` selects every channel.

  Range checks here are the ones the text itself implies: channels fit 8 bits and are nonzero,
  format B time offsets and values fit 16 bits, `time` values fit 32 bits. Whether a value fits
  its wire field is `validate_instruction`'s business.
*/

use std::iter::Enumerate;

use thiserror::Error;

use crate::bytecode::{
  decode_instructions, ChannelParameters, Instruction, Opcode, Word, WILDCARD_CHANNEL
};
use crate::error::SequenceError;
use crate::token::{Symbol, Token, Tokenizer};

const MAX_FORMAT_B_VALUE: u64 = 0xFFFF;
const MAX_CHANNEL: u64 = 0xFF;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ParseErrorKind {
  #[error("Invalid token type")]
  InvalidTokenType,
  #[error("Token too long")]
  TokenTooLong,
  #[error("Unexpected symbol")]
  UnexpectedSymbol,
  #[error("Value out of range")]
  ValueOutOfRange,
}

/// A parse error and the one-based line and column of the token that caused it.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Error)]
#[error("Error at ({line},{column}): {kind}")]
pub struct ParseError {
  pub kind   : ParseErrorKind,
  pub line   : usize,
  pub column : usize
}

/**
  Parses a single line. `Ok(None)` means the line holds no instruction: it is empty, blank or
  a comment.
*/
pub fn parse_line(text: &str, line: usize) -> Result<Option<Instruction>, ParseError> {
  let mut parser = LineParser::new(text);
  match parser.parse_instruction() {
    Ok(instruction) => Ok(instruction),
    Err(kind)       => Err(ParseError { kind, line, column: parser.tokenizer.token_column() })
  }
}

/// Parses a whole program, stopping at the first error.
pub fn parse_assembly(text: &str) -> Result<Vec<Instruction>, ParseError> {
  AssemblyLines::new(text.lines())
    .map(|result| result.map(|(_line, instruction)| instruction))
    .collect()
}

/**
  Parses instructions out of a source of lines, yielding each instruction with its one-based
  line number and skipping lines without one. Exhaustion is the end of input.
*/
pub struct AssemblyLines<I> {
  lines: Enumerate<I>
}

impl<I, S> AssemblyLines<I>
  where I: Iterator<Item = S>,
        S: AsRef<str>
{
  pub fn new(lines: I) -> Self {
    AssemblyLines { lines: lines.enumerate() }
  }
}

impl<I, S> Iterator for AssemblyLines<I>
  where I: Iterator<Item = S>,
        S: AsRef<str>
{
  type Item = Result<(usize, Instruction), ParseError>;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let (index, text) = self.lines.next()?;
      match parse_line(text.as_ref(), index + 1) {
        Ok(Some(instruction)) => return Some(Ok((index + 1, instruction))),
        Ok(None)              => continue,
        Err(e)                => return Some(Err(e))
      }
    }
  }
}

// region Disassembly

/// Renders one instruction per line.
pub fn disassemble(instructions: &[Instruction]) -> String {
  let mut text = String::new();
  for instruction in instructions {
    text.push_str(&instruction.to_string());
    text.push('\n');
  }
  text
}

pub fn disassemble_words(words: &[Word]) -> Result<String, SequenceError> {
  Ok(disassemble(&decode_instructions(words)?))
}

// endregion

/// Recursive descent over the tokens of one line. Each method starts at `tokenizer.token`.
struct LineParser<'a> {
  tokenizer: Tokenizer<'a>
}

impl<'a> LineParser<'a> {
  fn new(text: &'a str) -> Self {
    LineParser { tokenizer: Tokenizer::new(text) }
  }

  fn token(&self) -> Token {
    self.tokenizer.token
  }

  fn advance(&mut self) -> Result<Token, ParseErrorKind> {
    self.tokenizer.next_token()
  }

  fn skip_whitespace(&mut self) -> Result<(), ParseErrorKind> {
    if self.token() == Token::Whitespace {
      self.advance()?;
    }
    Ok(())
  }

  /// Fails unless the current token is `symbol`.
  fn expect_symbol(&self, symbol: Symbol) -> Result<(), ParseErrorKind> {
    match self.token() {
      Token::Symbol(s) if s == symbol => Ok(()),
      Token::Symbol(_)                => Err(ParseErrorKind::UnexpectedSymbol),
      _                               => Err(ParseErrorKind::InvalidTokenType)
    }
  }

  fn parse_instruction(&mut self) -> Result<Option<Instruction>, ParseErrorKind> {
    self.advance()?;

    // Blank space and comments carry no instruction.
    loop {
      match self.token() {
        | Token::Whitespace
        | Token::LineBreak              => { self.advance()?; }
        Token::Symbol(Symbol::Comment) => { self.tokenizer.skip_to_line_break()?; }
        _                              => break
      }
    }

    let opcode = match self.token() {
      Token::None                 => return Ok(None),
      Token::Symbol(Symbol::Time) => Opcode::IncrementTime,
      Token::Symbol(Symbol::Freq) => Opcode::SetFrequency,
      Token::Symbol(Symbol::Amp)  => Opcode::SetAmplitude,
      Token::Symbol(_)            => return Err(ParseErrorKind::UnexpectedSymbol),
      _                           => return Err(ParseErrorKind::InvalidTokenType)
    };

    if self.advance()? != Token::Whitespace {
      return Err(ParseErrorKind::InvalidTokenType);
    }
    self.advance()?;

    let instruction = match opcode {
      Opcode::IncrementTime => self.parse_format_a()?,
      Opcode::SetFrequency  => Instruction::SetFrequency(self.parse_format_b()?),
      Opcode::SetAmplitude  => Instruction::SetAmplitude(self.parse_format_b()?),
    };

    self.parse_line_end()?;
    Ok(Some(instruction))
  }

  /// `<time_offset>`
  fn parse_format_a(&mut self) -> Result<Instruction, ParseErrorKind> {
    let milliseconds = self.parse_time_offset()?;
    if milliseconds > u32::MAX as u64 {
      return Err(ParseErrorKind::ValueOutOfRange);
    }
    self.advance()?;

    Ok(Instruction::IncrementTime { parameter_a: milliseconds as u32 })
  }

  /// `(<time_offset> <ws>?)? <channel> <ws>? (<time_offset> <ws>?)? <number>`
  fn parse_format_b(&mut self) -> Result<ChannelParameters, ParseErrorKind> {
    let mut time_offset = None;

    if let Token::Symbol(Symbol::Plus) = self.token() {
      time_offset = Some(self.parse_format_b_time_offset()?);
    }

    let channel_select = self.parse_channel_select()?;
    self.advance()?;
    self.skip_whitespace()?;

    if let (None, Token::Symbol(Symbol::Plus)) = (time_offset, self.token()) {
      time_offset = Some(self.parse_format_b_time_offset()?);
    }

    let parameter_a = match self.token() {
      Token::Number(n) if n > MAX_FORMAT_B_VALUE => return Err(ParseErrorKind::ValueOutOfRange),
      Token::Number(n)                           => n as u16,
      _                                          => return Err(ParseErrorKind::InvalidTokenType)
    };
    self.advance()?;

    Ok(ChannelParameters {
      channel_select,
      time_offset: time_offset.unwrap_or(0),
      parameter_a
    })
  }

  /// A format B time offset and the optional whitespace after it.
  fn parse_format_b_time_offset(&mut self) -> Result<u16, ParseErrorKind> {
    let milliseconds = self.parse_time_offset()?;
    if milliseconds > MAX_FORMAT_B_VALUE {
      return Err(ParseErrorKind::ValueOutOfRange);
    }
    self.advance()?;
    self.skip_whitespace()?;
    Ok(milliseconds as u16)
  }

  /// `'+' <number> 'ms'`, leaving the `ms` as the current token.
  fn parse_time_offset(&mut self) -> Result<u64, ParseErrorKind> {
    self.expect_symbol(Symbol::Plus)?;

    let milliseconds = match self.advance()? {
      Token::Number(n) => n,
      _                => return Err(ParseErrorKind::InvalidTokenType)
    };

    self.advance()?;
    self.expect_symbol(Symbol::Milliseconds)?;
    Ok(milliseconds)
  }

  /// `'ch' (<number> | '*')`, leaving the number or wildcard as the current token.
  fn parse_channel_select(&mut self) -> Result<u8, ParseErrorKind> {
    self.expect_symbol(Symbol::Channel)?;

    match self.advance()? {
      Token::Number(n) if n == 0 || n > MAX_CHANNEL => Err(ParseErrorKind::ValueOutOfRange),
      Token::Number(n)                              => Ok(n as u8),
      Token::Symbol(Symbol::Wildcard)               => Ok(WILDCARD_CHANNEL),
      Token::Symbol(_)                              => Err(ParseErrorKind::UnexpectedSymbol),
      _                                             => Err(ParseErrorKind::InvalidTokenType)
    }
  }

  /// Only whitespace and a comment may follow an instruction.
  fn parse_line_end(&mut self) -> Result<(), ParseErrorKind> {
    self.skip_whitespace()?;

    match self.token() {
      | Token::LineBreak
      | Token::None                  => Ok(()),
      Token::Symbol(Symbol::Comment) => {
        self.tokenizer.skip_to_line_break()?;
        Ok(())
      }
      _                              => Err(ParseErrorKind::UnexpectedSymbol)
    }
  }
}
