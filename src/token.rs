/*!
  The tokenizer splits a line of assembly into maximal runs of characters of the same
  `CharClass`. Alphabetic and punctuation runs must be one of the `Symbol`s, digit runs are
  numbers, and a run of dashes starting with `--` opens a comment.
*/

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};

use crate::bytecode::ParseErrorKind;
use crate::chariter::{CharClass, CharIter};

/// Maximum length of a symbol or number token.
pub const MAX_TOKEN_LENGTH: usize = 15;

#[derive(StrumDisplay, EnumString, IntoStaticStr, Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Symbol {
  #[strum(serialize = "amp")]
  Amp,
  #[strum(serialize = "freq")]
  Freq,
  #[strum(serialize = "time")]
  Time,
  #[strum(serialize = "ch")]
  Channel,
  #[strum(serialize = "--")]
  Comment,
  #[strum(serialize = "ms")]
  Milliseconds,
  #[strum(serialize = "+")]
  Plus,
  #[strum(serialize = "*")]
  Wildcard
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Token {
  Symbol(Symbol),
  Number(u64),
  LineBreak,
  Whitespace,
  /// The end of the line.
  None
}

impl Display for Token{
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self{
      Token::Symbol(symbol) => write!(f, "{}", symbol),
      Token::Number(n)      => write!(f, "{}", n),
      Token::LineBreak      => write!(f, "line break"),
      Token::Whitespace     => write!(f, "whitespace"),
      Token::None           => write!(f, "end of line")
    }
  }
}

/// Reads `Token`s off a single line. The most recent token is kept in `token`.
pub struct Tokenizer<'a> {
  chars        : CharIter<'a>,
  pub token    : Token,
  /// One-based column at which `token` starts.
  token_column : usize
}

impl<'a> Tokenizer<'a> {
  pub fn new(line: &'a str) -> Self {
    Tokenizer {
      chars        : CharIter::new(line),
      token        : Token::None,
      token_column : 1
    }
  }

  pub fn token_column(&self) -> usize {
    self.token_column
  }

  /// Column of the next unread character.
  pub fn column(&self) -> usize {
    self.chars.column()
  }

  /// Reads the next token into `self.token` and returns it.
  pub fn next_token(&mut self) -> Result<Token, ParseErrorKind> {
    self.token_column = self.chars.column();

    let class = match self.chars.peek() {
      Some(c) => CharClass::of(c),
      None    => {
        self.token = Token::None;
        return Ok(self.token);
      }
    };

    let text = match self.chars.get_prefix_match(|c| CharClass::of(c) == class) {
      Some(text) => text,
      // `peek` just matched `class`.
      None       => return Err(ParseErrorKind::InvalidTokenType)
    };

    self.token = match class {

      | CharClass::Alpha
      | CharClass::Symbol => {
        check_length(text)?;
        let symbol = Symbol::from_str(&text.to_ascii_lowercase())
          .map_err(|_| ParseErrorKind::UnexpectedSymbol)?;
        Token::Symbol(symbol)
      }

      CharClass::CommentDash => {
        match text.starts_with("--") {
          true  => Token::Symbol(Symbol::Comment),
          false => return Err(ParseErrorKind::UnexpectedSymbol)
        }
      }

      CharClass::Digit => {
        check_length(text)?;
        let number = text.parse::<u64>().map_err(|_| ParseErrorKind::ValueOutOfRange)?;
        Token::Number(number)
      }

      CharClass::LineBreak  => Token::LineBreak,
      CharClass::Whitespace => Token::Whitespace,
      CharClass::Other      => return Err(ParseErrorKind::InvalidTokenType)

    };

    Ok(self.token)
  }

  /// Discards the rest of the line and reads the token that ends it.
  pub fn skip_to_line_break(&mut self) -> Result<Token, ParseErrorKind> {
    self.chars.skip_to_line_break();
    self.next_token()
  }
}

fn check_length(text: &str) -> Result<(), ParseErrorKind> {
  match text.len() > MAX_TOKEN_LENGTH {
    true  => Err(ParseErrorKind::TokenTooLong),
    false => Ok(())
  }
}
