//! `.strings` file rendering.

use crate::consts::GENERATED_NOTICE;
use crate::table::StringTable;

/// Render the `.strings` file for `language`.
///
/// Entries with no value (after fallback, when enabled) are left out.
pub fn render(table: &StringTable, language: &str, fallback: bool) -> String {
  let mut out = format!("/* {GENERATED_NOTICE} */\n/* Language: {language} */\n");

  for entry in &table.entries {
    let Some(value) = table.value(entry, language, fallback) else {
      continue;
    };

    out.push('\n');
    if let Some(comment) = &entry.comment {
      out.push_str(&format!("/* {} */\n", comment.replace("*/", "* /")));
    }
    out.push_str(&format!("\"{}\" = \"{}\";\n", escape(&entry.key), escape(value)));
  }

  out
}

fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '\\' => out.push_str("\\\\"),
      '"' => out.push_str("\\\""),
      '\n' => out.push_str("\\n"),
      '\t' => out.push_str("\\t"),
      '\r' => {}
      _ => out.push(c),
    }
  }
  out
}
