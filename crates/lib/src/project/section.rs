//! Text-span index over the manifest.
//!
//! The manifest is never parsed into a tree. Sections are found by their
//! begin/end comment markers, records inside a section by a small scanner
//! that understands just enough of the format (quoted strings, comments,
//! balanced braces and parentheses) to find where each record starts and
//! ends. Every insertion point the merger uses is computed here.

use std::collections::HashMap;
use std::ops::Range;

/// A required section whose markers are absent, duplicated, or out of order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSection(pub String);

/// Span of one `/* Begin X section */ … /* End X section */` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpan {
  pub name: String,
  /// Text between the two markers.
  pub body: Range<usize>,
  /// Offset where new records go: start of the end marker's line.
  pub insert_at: usize,
  /// The end marker shares its line with other content.
  pub needs_newline: bool,
  /// Indentation of existing records, if there are any.
  pub record_indent: Option<String>,
}

/// One `IDENT /* comment */ = { … };` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSpan {
  pub id: String,
  /// Whole record, identifier through the closing `;`.
  pub span: Range<usize>,
  /// Between the outer braces.
  pub body: Range<usize>,
  /// Top-level `key = value;` pairs with raw value ranges.
  fields: Vec<(String, Range<usize>)>,
}

impl RecordSpan {
  /// Raw text of a top-level value.
  pub fn raw<'t>(&self, text: &'t str, key: &str) -> Option<&'t str> {
    self
      .fields
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, range)| &text[range.clone()])
  }

  /// A top-level value with quoting removed.
  pub fn value(&self, text: &str, key: &str) -> Option<String> {
    self.raw(text, key).map(unquote)
  }

  /// The record's `isa` type.
  pub fn isa(&self, text: &str) -> Option<String> {
    self.value(text, "isa")
  }

  /// Parse the list stored under `key`, for example `files` or `children`.
  pub fn list(&self, text: &str, key: &str) -> Option<ListSpan> {
    let (_, range) = self.fields.iter().find(|(k, _)| k == key)?;
    ListSpan::parse(text, range.clone())
  }
}

/// How a list is laid out, which decides how entries are inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListLayout {
  /// Closing `)` is alone on its line; entries go on their own lines.
  Multiline { indent: String },
  /// The whole list sits on one line.
  Inline,
}

/// A `( ID /* c */, ID /* c */, )` membership list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSpan {
  pub members: Vec<String>,
  /// Offset immediately before the closing delimiter (or its line).
  pub insert_at: usize,
  pub layout: ListLayout,
  /// Where a comma must go before anything is appended, when the last
  /// member is not followed by one: offset and text to insert.
  pub separator: Option<(usize, &'static str)>,
}

impl ListSpan {
  fn parse(text: &str, range: Range<usize>) -> Option<Self> {
    let bytes = text.as_bytes();
    if bytes.get(range.start) != Some(&b'(') || range.end == 0 || bytes.get(range.end - 1) != Some(&b')') {
      return None;
    }
    let close = range.end - 1;

    let mut members = Vec::new();
    // End of the last member and its trailing comments, while no comma follows it.
    let mut unterminated = None;
    let mut cursor = Cursor::new(text, range.start + 1, close);
    loop {
      cursor.skip_trivia();
      if cursor.at_end() {
        break;
      }
      if cursor.peek() == Some(b',') {
        cursor.bump();
        unterminated = None;
        continue;
      }
      let start = cursor.pos;
      if !cursor.skip_value() {
        return None;
      }
      members.push(unquote(&text[start..cursor.pos]));
      cursor.skip_inline_comments();
      unterminated = Some(cursor.pos);
    }

    let close_line = line_start(text, close);
    let layout = if text[close_line..close].chars().all(|c| c == ' ' || c == '\t') {
      let indent = first_member_indent(text, range.start + 1, close_line)
        .unwrap_or_else(|| format!("{}\t", &text[close_line..close]));
      ListLayout::Multiline { indent }
    } else {
      ListLayout::Inline
    };
    let insert_at = match layout {
      ListLayout::Multiline { .. } => close_line,
      ListLayout::Inline => close,
    };
    let separator = unterminated.map(|at| {
      let spaced = matches!(layout, ListLayout::Inline) && !bytes[at].is_ascii_whitespace();
      (at, if spaced { ", " } else { "," })
    });

    Some(Self {
      members,
      insert_at,
      layout,
      separator,
    })
  }

  pub fn contains(&self, id: &str) -> bool {
    self.members.iter().any(|m| m == id)
  }
}

/// Offsets of every section the merger needs.
#[derive(Debug, Clone)]
pub struct SectionIndex {
  sections: HashMap<String, SectionSpan>,
}

impl SectionIndex {
  /// Locate every section in `required`, each exactly once.
  pub fn build<'n>(text: &str, required: impl IntoIterator<Item = &'n str>) -> Result<Self, MissingSection> {
    let mut sections = HashMap::new();
    for name in required {
      if sections.contains_key(name) {
        continue;
      }
      let span = find_section(text, name).ok_or_else(|| MissingSection(name.to_string()))?;
      sections.insert(name.to_string(), span);
    }
    Ok(Self { sections })
  }

  pub fn section(&self, name: &str) -> Option<&SectionSpan> {
    self.sections.get(name)
  }

  /// Records of a section, in document order.
  pub fn records(&self, text: &str, name: &str) -> Vec<RecordSpan> {
    self
      .section(name)
      .map(|span| scan_records(text, span.body.clone()))
      .unwrap_or_default()
  }
}

fn find_section(text: &str, name: &str) -> Option<SectionSpan> {
  let begin_marker = format!("/* Begin {name} section */");
  let end_marker = format!("/* End {name} section */");

  let begin = unique_match(text, &begin_marker)?;
  let end = unique_match(text, &end_marker)?;
  if end < begin {
    return None;
  }

  let body_start = begin + begin_marker.len();
  let end_line = line_start(text, end);
  let needs_newline = !text[end_line..end].chars().all(|c| c == ' ' || c == '\t');
  let insert_at = if needs_newline { end } else { end_line };

  let body = body_start..end;
  let record_indent = scan_records(text, body.clone())
    .first()
    .and_then(|r| leading_indent(text, r.span.start));

  Some(SectionSpan {
    name: name.to_string(),
    body,
    insert_at,
    needs_newline,
    record_indent,
  })
}

fn unique_match(text: &str, needle: &str) -> Option<usize> {
  let mut matches = text.match_indices(needle).map(|(i, _)| i);
  let first = matches.next()?;
  matches.next().is_none().then_some(first)
}

/// Scan all records inside `range`, skipping anything that does not look
/// like a record.
pub fn scan_records(text: &str, range: Range<usize>) -> Vec<RecordSpan> {
  let mut records = Vec::new();
  let mut cursor = Cursor::new(text, range.start, range.end);

  loop {
    cursor.skip_trivia();
    if cursor.at_end() {
      break;
    }
    let start = cursor.pos;
    match scan_record(&mut cursor) {
      Some(record) => records.push(record),
      None => {
        // Resynchronize on the next line.
        cursor.pos = start;
        cursor.skip_line();
      }
    }
  }

  records
}

fn scan_record(cursor: &mut Cursor<'_>) -> Option<RecordSpan> {
  let text = cursor.text;
  let start = cursor.pos;
  let id = cursor.read_atom()?;
  let id = unquote(&text[id]);

  cursor.skip_trivia();
  cursor.expect(b'=')?;
  cursor.skip_trivia();
  if cursor.peek() != Some(b'{') {
    return None;
  }
  let open = cursor.pos;
  if !cursor.skip_value() {
    return None;
  }
  let body = open + 1..cursor.pos - 1;
  cursor.skip_trivia();
  cursor.expect(b';')?;

  let fields = scan_fields(text, body.clone());
  Some(RecordSpan {
    id,
    span: start..cursor.pos,
    body,
    fields,
  })
}

fn scan_fields(text: &str, body: Range<usize>) -> Vec<(String, Range<usize>)> {
  let mut fields = Vec::new();
  let mut cursor = Cursor::new(text, body.start, body.end);

  loop {
    cursor.skip_trivia();
    if cursor.at_end() {
      break;
    }
    let Some(key) = cursor.read_atom() else { break };
    let key = unquote(&text[key]);
    cursor.skip_trivia();
    if cursor.expect(b'=').is_none() {
      break;
    }
    cursor.skip_trivia();
    let value_start = cursor.pos;
    if !cursor.skip_value() {
      break;
    }
    fields.push((key, value_start..cursor.pos));
    cursor.skip_trivia();
    if cursor.expect(b';').is_none() {
      break;
    }
  }

  fields
}

/// Strip surrounding quotes and resolve escapes.
pub fn unquote(raw: &str) -> String {
  let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) else {
    return raw.to_string();
  };

  let mut out = String::with_capacity(inner.len());
  let mut chars = inner.chars();
  while let Some(c) = chars.next() {
    if c != '\\' {
      out.push(c);
      continue;
    }
    match chars.next() {
      Some('n') => out.push('\n'),
      Some('t') => out.push('\t'),
      Some(other) => out.push(other),
      None => out.push('\\'),
    }
  }
  out
}

fn line_start(text: &str, pos: usize) -> usize {
  text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Whitespace before `pos` on its line, if nothing else precedes it.
fn leading_indent(text: &str, pos: usize) -> Option<String> {
  let start = line_start(text, pos);
  let prefix = &text[start..pos];
  prefix
    .chars()
    .all(|c| c == ' ' || c == '\t')
    .then(|| prefix.to_string())
}

fn first_member_indent(text: &str, from: usize, to: usize) -> Option<String> {
  let region = &text[from..to];
  let offset = region.find('\n')? + 1;
  region[offset..].lines().find_map(|line| {
    let trimmed = line.trim_start_matches([' ', '\t']);
    let trimmed = trimmed.trim_end_matches('\r');
    (!trimmed.is_empty()).then(|| line[..line.len() - line.trim_start_matches([' ', '\t']).len()].to_string())
  })
}

/// Byte cursor bounded to a region of the manifest text.
struct Cursor<'t> {
  text: &'t str,
  pos: usize,
  end: usize,
}

impl<'t> Cursor<'t> {
  fn new(text: &'t str, pos: usize, end: usize) -> Self {
    Self { text, pos, end }
  }

  fn bytes(&self) -> &'t [u8] {
    self.text.as_bytes()
  }

  fn at_end(&self) -> bool {
    self.pos >= self.end
  }

  fn peek(&self) -> Option<u8> {
    (!self.at_end()).then(|| self.bytes()[self.pos])
  }

  fn peek_at(&self, offset: usize) -> Option<u8> {
    let pos = self.pos + offset;
    (pos < self.end).then(|| self.bytes()[pos])
  }

  fn bump(&mut self) {
    self.pos += 1;
  }

  fn expect(&mut self, byte: u8) -> Option<()> {
    if self.peek() == Some(byte) {
      self.bump();
      Some(())
    } else {
      None
    }
  }

  fn skip_line(&mut self) {
    while let Some(b) = self.peek() {
      self.bump();
      if b == b'\n' {
        break;
      }
    }
  }

  /// Skip whitespace and both comment styles.
  fn skip_trivia(&mut self) {
    loop {
      match (self.peek(), self.peek_at(1)) {
        (Some(b), _) if b.is_ascii_whitespace() => self.bump(),
        (Some(b'/'), Some(b'*')) => {
          self.pos += 2;
          while !self.at_end() && !(self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/')) {
            self.bump();
          }
          self.pos = (self.pos + 2).min(self.end);
        }
        (Some(b'/'), Some(b'/')) => self.skip_line(),
        _ => break,
      }
    }
  }

  /// Skip block comments on the current line, stopping right after the last
  /// one so nothing after it is consumed.
  fn skip_inline_comments(&mut self) {
    let mut probe = self.pos;
    loop {
      let bytes = self.bytes();
      while probe < self.end && matches!(bytes[probe], b' ' | b'\t') {
        probe += 1;
      }
      if probe + 1 >= self.end || bytes[probe] != b'/' || bytes[probe + 1] != b'*' {
        return;
      }
      match self.text[probe + 2..self.end].find("*/") {
        Some(offset) => {
          probe += 2 + offset + 2;
          self.pos = probe;
        }
        None => return,
      }
    }
  }

  /// Read a bare token or a quoted string.
  fn read_atom(&mut self) -> Option<Range<usize>> {
    let start = self.pos;
    if self.peek() == Some(b'"') {
      return self.skip_quoted().then(|| start..self.pos);
    }
    while let Some(b) = self.peek() {
      let comment = b == b'/' && matches!(self.peek_at(1), Some(b'*') | Some(b'/'));
      if b.is_ascii_whitespace() || b"=;,(){}\"".contains(&b) || comment {
        break;
      }
      self.bump();
    }
    (self.pos > start).then(|| start..self.pos)
  }

  fn skip_quoted(&mut self) -> bool {
    self.bump();
    while let Some(b) = self.peek() {
      self.bump();
      match b {
        b'\\' => self.bump(),
        b'"' => return true,
        _ => {}
      }
    }
    false
  }

  /// Skip one value: an atom, a quoted string, or a balanced `(…)`/`{…}`.
  fn skip_value(&mut self) -> bool {
    match self.peek() {
      Some(open @ (b'(' | b'{')) => {
        let close = if open == b'(' { b')' } else { b'}' };
        self.bump();
        loop {
          self.skip_trivia();
          match self.peek() {
            None => return false,
            Some(b) if b == close => {
              self.bump();
              return true;
            }
            Some(b';' | b',' | b'=') => self.bump(),
            Some(_) => {
              if !self.skip_value() {
                return false;
              }
            }
          }
        }
      }
      Some(b'"') => self.skip_quoted(),
      Some(_) => self.read_atom().is_some(),
      None => false,
    }
  }
}
