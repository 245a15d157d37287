//! RFC 4180 CSV reader.
//!
//! Handles quoted fields with embedded separators, doubled quotes and line
//! breaks, and both LF and CRLF record terminators. Blank lines are skipped.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsvError {
  #[error("unterminated quoted field starting on line {line}")]
  UnterminatedQuote { line: usize },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
  FieldStart,
  Unquoted,
  Quoted,
  /// A quote seen inside a quoted field: either an escape or the closing quote.
  QuoteInQuoted,
}

struct Reader {
  rows: Vec<Vec<String>>,
  record: Vec<String>,
  field: String,
}

impl Reader {
  fn end_field(&mut self) {
    self.record.push(std::mem::take(&mut self.field));
  }

  fn end_record(&mut self) {
    self.end_field();
    let record = std::mem::take(&mut self.record);
    if !(record.len() == 1 && record[0].is_empty()) {
      self.rows.push(record);
    }
  }
}

/// Split `text` into records of fields.
pub fn parse(text: &str) -> Result<Vec<Vec<String>>, CsvError> {
  let mut reader = Reader {
    rows: Vec::new(),
    record: Vec::new(),
    field: String::new(),
  };
  let mut state = State::FieldStart;
  let mut line = 1;
  let mut quote_line = 1;
  let mut chars = text.chars().peekable();

  while let Some(c) = chars.next() {
    if c == '\r' && chars.peek() == Some(&'\n') {
      continue;
    }
    let newline = c == '\n' || c == '\r';

    state = match (state, c) {
      (State::Quoted, '"') => State::QuoteInQuoted,
      (State::Quoted, _) => {
        reader.field.push(c);
        State::Quoted
      }
      (State::QuoteInQuoted, '"') => {
        reader.field.push('"');
        State::Quoted
      }
      (State::FieldStart, '"') => {
        quote_line = line;
        State::Quoted
      }
      (_, ',') => {
        reader.end_field();
        State::FieldStart
      }
      (_, _) if newline => {
        reader.end_record();
        State::FieldStart
      }
      // Text after a closing quote is kept verbatim.
      (_, _) => {
        reader.field.push(c);
        State::Unquoted
      }
    };

    if newline {
      line += 1;
    }
  }

  match state {
    State::Quoted => return Err(CsvError::UnterminatedQuote { line: quote_line }),
    State::FieldStart if reader.record.is_empty() => {}
    _ => reader.end_record(),
  }

  Ok(reader.rows)
}
