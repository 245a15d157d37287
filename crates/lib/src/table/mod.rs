//! The translation table.
//!
//! The first header column holds the string keys. A column titled
//! `comment` (any case) carries translator notes; every other non-empty
//! header names a language, in column order. The first language is the
//! development language used for fallbacks.
//!
//! Rows with an empty key are skipped. A row whose key starts with `#` is a
//! comment row: its text is attached to the next entry.

pub mod csv;

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tracing::debug;

pub use csv::CsvError;

/// Errors that can occur while building a table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
  #[error("table is empty")]
  Empty,

  #[error("table header has no language columns")]
  NoLanguages,

  #[error("language '{0}' appears in more than one column")]
  DuplicateLanguage(String),

  #[error("key '{key}' on row {row} was already defined on row {first}")]
  DuplicateKey { key: String, row: usize, first: usize },

  #[error(transparent)]
  Csv(#[from] CsvError),
}

/// One translatable string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
  pub key: String,
  pub comment: Option<String>,
  /// Non-empty translations by language.
  pub values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTable {
  /// Languages written on output, in column order.
  pub languages: Vec<String>,
  /// Fallback language: the first language column of the source.
  pub development: String,
  pub entries: Vec<Entry>,
}

impl StringTable {
  /// Parse CSV text into a table.
  pub fn parse(text: &str) -> Result<Self, TableError> {
    Self::from_rows(csv::parse(text)?)
  }

  pub fn from_rows(rows: Vec<Vec<String>>) -> Result<Self, TableError> {
    let mut rows = rows.into_iter();
    let header = rows.next().ok_or(TableError::Empty)?;

    let mut comment_column = None;
    let mut language_columns = Vec::new();
    for (index, title) in header.iter().enumerate().skip(1) {
      let title = title.trim();
      if title.is_empty() {
        continue;
      }
      if title.eq_ignore_ascii_case("comment") {
        comment_column = Some(index);
      } else {
        if language_columns.iter().any(|(_, lang): &(usize, String)| lang == title) {
          return Err(TableError::DuplicateLanguage(title.to_string()));
        }
        language_columns.push((index, title.to_string()));
      }
    }
    if language_columns.is_empty() {
      return Err(TableError::NoLanguages);
    }

    let mut entries = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut pending_comment: Option<String> = None;

    // Row numbers are 1-based and count the header.
    for (row_number, row) in rows.enumerate().map(|(i, r)| (i + 2, r)) {
      let key = row.first().map(|k| k.trim()).unwrap_or_default();
      if key.is_empty() {
        continue;
      }
      if let Some(note) = key.strip_prefix('#') {
        let note = note.trim();
        if !note.is_empty() {
          pending_comment = Some(note.to_string());
        }
        continue;
      }

      if let Some(first) = seen.insert(key.to_string(), row_number) {
        return Err(TableError::DuplicateKey {
          key: key.to_string(),
          row: row_number,
          first,
        });
      }

      let column_comment = comment_column
        .and_then(|i| row.get(i))
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string);

      let values = language_columns
        .iter()
        .filter_map(|(i, lang)| {
          let value = row.get(*i)?;
          (!value.is_empty()).then(|| (lang.clone(), value.clone()))
        })
        .collect();

      entries.push(Entry {
        key: key.to_string(),
        comment: column_comment.or_else(|| pending_comment.take()),
        values,
      });
      pending_comment = None;
    }

    let languages: Vec<String> = language_columns.into_iter().map(|(_, lang)| lang).collect();
    debug!(languages = ?languages, entries = entries.len(), "parsed table");

    Ok(Self {
      development: languages[0].clone(),
      languages,
      entries,
    })
  }

  /// Restrict output to the listed languages, in the listed order. Unknown
  /// names are returned. Translations stay available for fallback.
  pub fn retain_languages(&mut self, wanted: &[String]) -> Vec<String> {
    let unknown = wanted
      .iter()
      .filter(|lang| !self.languages.contains(lang))
      .cloned()
      .collect();

    self.languages = wanted.iter().filter(|lang| self.languages.contains(lang)).cloned().collect();
    unknown
  }

  /// Translation of `entry` into `language`, optionally falling back to the
  /// development language.
  pub fn value<'a>(&'a self, entry: &'a Entry, language: &str, fallback: bool) -> Option<&'a str> {
    entry
      .values
      .get(language)
      .or_else(|| if fallback { entry.values.get(&self.development) } else { None })
      .map(String::as_str)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = "\
key,comment,en,de
# Onboarding,,,
welcome.title,,Welcome,Willkommen
welcome.body,Shown below the title,\"Hello, world\",
,,,
settings.done,,Done,Fertig
";

  #[test]
  fn parses_languages_and_entries() {
    let table = StringTable::parse(SAMPLE).unwrap();

    assert_eq!(table.languages, vec!["en", "de"]);
    assert_eq!(table.development, "en");
    let keys: Vec<&str> = table.entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["welcome.title", "welcome.body", "settings.done"]);
  }

  #[test]
  fn comment_rows_attach_to_next_entry() {
    let table = StringTable::parse(SAMPLE).unwrap();

    assert_eq!(table.entries[0].comment.as_deref(), Some("Onboarding"));
    assert_eq!(table.entries[1].comment.as_deref(), Some("Shown below the title"));
    assert_eq!(table.entries[2].comment, None);
  }

  #[test]
  fn empty_cells_are_missing_values() {
    let table = StringTable::parse(SAMPLE).unwrap();
    let body = &table.entries[1];

    assert_eq!(body.values.get("en").map(String::as_str), Some("Hello, world"));
    assert!(!body.values.contains_key("de"));
  }

  #[test]
  fn value_falls_back_to_development_language() {
    let table = StringTable::parse(SAMPLE).unwrap();
    let body = &table.entries[1];

    assert_eq!(table.value(body, "de", false), None);
    assert_eq!(table.value(body, "de", true), Some("Hello, world"));
    assert_eq!(table.value(&table.entries[0], "de", true), Some("Willkommen"));
  }

  #[test]
  fn duplicate_keys_are_rejected() {
    let result = StringTable::parse("key,en\na,1\nb,2\na,3\n");
    assert_eq!(
      result,
      Err(TableError::DuplicateKey {
        key: "a".into(),
        row: 4,
        first: 2
      })
    );
  }

  #[test]
  fn header_without_languages_is_rejected() {
    assert_eq!(StringTable::parse("key,comment\na,b\n"), Err(TableError::NoLanguages));
    assert_eq!(StringTable::parse(""), Err(TableError::Empty));
  }

  #[test]
  fn duplicate_languages_are_rejected() {
    assert_eq!(
      StringTable::parse("key,en,en\na,1,2\n"),
      Err(TableError::DuplicateLanguage("en".into()))
    );
  }

  #[test]
  fn retain_languages_filters_and_orders() {
    let mut table = StringTable::parse(SAMPLE).unwrap();
    let unknown = table.retain_languages(&["de".into(), "fr".into()]);

    assert_eq!(unknown, vec!["fr"]);
    assert_eq!(table.languages, vec!["de"]);
    assert_eq!(table.value(&table.entries[1], "de", true), Some("Hello, world"));
  }

  #[test]
  fn short_rows_are_tolerated() {
    let table = StringTable::parse("key,en,de\nonly.key\n").unwrap();
    assert_eq!(table.entries.len(), 1);
    assert!(table.entries[0].values.is_empty());
  }
}
