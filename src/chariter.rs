//! A cursor over one line of assembly text that knows its column, plus the character classes
//! the tokenizer groups characters by.

use nom::{
  bytes::complete::{is_not, take_while1},
  IResult
};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum CharClass {
  Alpha,
  /// `-`, which only ever appears as the `--` comment marker.
  CommentDash,
  Digit,
  LineBreak,
  /// ASCII punctuation other than `-`.
  Symbol,
  Whitespace,
  Other
}

impl CharClass {
  pub fn of(c: char) -> CharClass {
    match c {
      c if c.is_ascii_alphabetic()  => CharClass::Alpha,
      c if c.is_ascii_digit()       => CharClass::Digit,
      '-'                           => CharClass::CommentDash,
      c if c.is_ascii_punctuation() => CharClass::Symbol,
      ' ' | '\t'                    => CharClass::Whitespace,
      '\n' | '\r'                   => CharClass::LineBreak,
      _                             => CharClass::Other
    }
  }
}

#[derive(Clone, Debug)]
pub struct CharIter<'d> {
  text     : &'d str,
  /// Byte index of the next character in `text`.
  position : usize
}

impl<'d> Iterator for CharIter<'d>{
  type Item = char;

  fn next(&mut self) -> Option<char>{
    let c = self.peek()?;
    self.position += c.len_utf8();
    Some(c)
  }
}

impl<'d> CharIter<'d>{

  pub fn new(text: &'d str) -> Self{
    CharIter{
      text,
      position: 0
    }
  }

  /// Returns the next character without consuming it.
  pub fn peek(&self) -> Option<char>{
    self.data().chars().next()
  }

  pub fn is_empty(&self) -> bool{
    self.position >= self.text.len()
  }

  /// Gives the unconsumed remainder of the line.
  pub fn data(&self) -> &'d str {
    &self.text[self.position..]
  }

  /// One-based column of the next character.
  pub fn column(&self) -> usize {
    self.text[..self.position].chars().count() + 1
  }

  /**
    Consumes the longest non-empty prefix whose characters all satisfy `pred`, returning the
    prefix. Returns `None` without consuming anything if the next character does not match.
  */
  pub fn get_prefix_match<F>(&mut self, pred: F) -> Option<&'d str>
    where F: Fn(char) -> bool
  {
    let result: IResult<&'d str, &'d str> = take_while1(pred)(self.data());
    match result {
      Ok((rest, prefix)) => {
        self.position = self.text.len() - rest.len();
        Some(prefix)
      }
      Err(_) => None
    }
  }

  /// Consumes every character up to, but not including, the next line break.
  pub fn skip_to_line_break(&mut self) {
    let result: IResult<&'d str, &'d str> = is_not("\r\n")(self.data());
    if let Ok((rest, _)) = result {
      self.position = self.text.len() - rest.len();
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn peek_and_next(){
    let mut c = CharIter::new("abcd");
    assert_eq!(c.peek(), Some('a'));
    assert_eq!(c.next(), Some('a'));
    assert_eq!(c.next(), Some('b'));
    assert_eq!(c.next(), Some('c'));
    assert_eq!(c.peek(), Some('d'));
    assert_eq!(c.next(), Some('d'));
    assert_eq!(c.next(), None);
    assert_eq!(c.next(), None);
  }

  #[test]
  fn empty_chars(){
    let mut c = CharIter::new("");
    assert!(c.is_empty());
    assert_eq!(c.next(), None);
    assert_eq!(c.column(), 1);
  }

  #[test]
  fn get_empty_prefix(){
    let mut c = CharIter::new("abc");
    let result = c.get_prefix_match(|ch: char|{ ch.is_uppercase()});
    assert_eq!(result, None);
    assert_eq!(c.data(), "abc");
  }

  #[test]
  fn get_prefix(){
    let mut c = CharIter::new("ABCDEFGabcd");
    let result = c.get_prefix_match(|ch: char|{ ch.is_uppercase()});
    assert_eq!(result, Some("ABCDEFG"));
    assert_eq!(c.column(), 8);
    assert_eq!(c.next(), Some('a'));
    assert_eq!(c.data(), "bcd");
  }

  #[test]
  fn whole_line_prefix(){
    let mut c = CharIter::new("1234");
    assert_eq!(c.get_prefix_match(|ch: char| ch.is_ascii_digit()), Some("1234"));
    assert!(c.is_empty());
  }

  #[test]
  fn skip_comment_body(){
    let mut c = CharIter::new("-- a comment\nfreq");
    c.skip_to_line_break();
    assert_eq!(c.data(), "\nfreq");
    // Nothing to skip when already at the line break.
    c.skip_to_line_break();
    assert_eq!(c.peek(), Some('\n'));
  }

  #[test]
  fn columns_count_characters(){
    let mut c = CharIter::new("äb c");
    c.next();
    c.next();
    assert_eq!(c.column(), 3);
  }

  #[test]
  fn character_classes(){
    assert_eq!(CharClass::of('F'), CharClass::Alpha);
    assert_eq!(CharClass::of('7'), CharClass::Digit);
    assert_eq!(CharClass::of('-'), CharClass::CommentDash);
    assert_eq!(CharClass::of('+'), CharClass::Symbol);
    assert_eq!(CharClass::of('*'), CharClass::Symbol);
    assert_eq!(CharClass::of('\t'), CharClass::Whitespace);
    assert_eq!(CharClass::of('\n'), CharClass::LineBreak);
    assert_eq!(CharClass::of('é'), CharClass::Other);
  }
}
