//! Swift accessor enum for the table's keys.

use std::collections::HashMap;

use super::GenerateError;
use crate::consts::GENERATED_NOTICE;
use crate::table::StringTable;

const SWIFT_KEYWORDS: &[&str] = &[
  "associatedtype", "break", "case", "catch", "class", "continue", "default", "defer", "deinit", "do", "else", "enum",
  "extension", "fallthrough", "false", "fileprivate", "for", "func", "guard", "if", "import", "in", "init", "inout",
  "internal", "is", "let", "nil", "open", "operator", "private", "protocol", "public", "repeat", "rethrows", "return",
  "self", "static", "struct", "subscript", "super", "switch", "throw", "throws", "true", "try", "typealias", "var",
  "where", "while",
];

#[derive(Debug, Clone)]
pub struct EnumOptions {
  /// Swift type name.
  pub name: String,
  /// Strings table the accessor looks keys up in, e.g. `Localizable.strings`.
  pub table_name: String,
}

/// Render the Swift source declaring one enum case per key.
pub fn render(table: &StringTable, options: &EnumOptions) -> Result<String, GenerateError> {
  let table_name = options.table_name.strip_suffix(".strings").unwrap_or(&options.table_name);

  let mut cases = String::new();
  let mut seen: HashMap<String, &str> = HashMap::new();
  for entry in &table.entries {
    let case = case_name(&entry.key).ok_or_else(|| GenerateError::InvalidKey(entry.key.clone()))?;
    if let Some(first) = seen.insert(case.clone(), &entry.key) {
      return Err(GenerateError::CaseCollision {
        case,
        first: first.to_string(),
        second: entry.key.clone(),
      });
    }

    if let Some(comment) = &entry.comment {
      for line in comment.lines() {
        cases.push_str(&format!("  /// {line}\n"));
      }
    }
    cases.push_str(&format!("  case {case} = \"{}\"\n", swift_escape(&entry.key)));
  }

  Ok(format!(
    "// {GENERATED_NOTICE}

import Foundation

enum {name}: String {{
{cases}
  var localized: String {{
    NSLocalizedString(rawValue, tableName: \"{table}\", bundle: .main, comment: \"\")
  }}

  func localized(_ arguments: CVarArg...) -> String {{
    String(format: localized, arguments: arguments)
  }}
}}
",
    name = options.name,
    table = swift_escape(table_name),
  ))
}

/// lowerCamelCase identifier for `key`, or `None` if it has no usable
/// characters.
pub fn case_name(key: &str) -> Option<String> {
  let mut name = String::new();
  for (i, part) in key.split(|c: char| !c.is_alphanumeric()).filter(|p| !p.is_empty()).enumerate() {
    let mut chars = part.chars();
    let Some(first) = chars.next() else { continue };
    if i == 0 {
      name.extend(first.to_lowercase());
    } else {
      name.extend(first.to_uppercase());
    }
    name.push_str(chars.as_str());
  }

  if name.is_empty() {
    return None;
  }
  if name.starts_with(|c: char| c.is_ascii_digit()) {
    name.insert(0, '_');
  }
  if SWIFT_KEYWORDS.contains(&name.as_str()) {
    name = format!("`{name}`");
  }
  Some(name)
}

fn swift_escape(text: &str) -> String {
  text.replace('\\', "\\\\").replace('"', "\\\"")
}
