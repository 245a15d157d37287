//! Rendering of new manifest records and list entries.
//!
//! Everything here is a pure function of its inputs: the same descriptor and
//! identifiers always produce the same text.

use super::types::FileDescriptor;

/// File type tag for a path, inferred from its extension.
pub fn file_type(path: &str) -> &'static str {
  let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
  match ext {
    "strings" => "text.plist.strings",
    "stringsdict" => "text.plist.stringsdict",
    "xcstrings" => "text.json.xcstrings",
    "swift" => "sourcecode.swift",
    "m" => "sourcecode.c.objc",
    "h" => "sourcecode.c.h",
    "json" => "text.json",
    "plist" => "text.plist.xml",
    _ => "text",
  }
}

/// Quote a value unless it consists only of characters the format
/// accepts bare.
pub fn quote(value: &str) -> String {
  let bare = !value.is_empty()
    && value
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '+' | '.' | '/' | '-'))
    && !value.contains("//");
  if bare {
    return value.to_string();
  }

  let mut out = String::with_capacity(value.len() + 2);
  out.push('"');
  for c in value.chars() {
    match c {
      '"' => out.push_str("\\\""),
      '\\' => out.push_str("\\\\"),
      '\n' => out.push_str("\\n"),
      '\t' => out.push_str("\\t"),
      c => out.push(c),
    }
  }
  out.push('"');
  out
}

/// Text placed in the `/* … */` comment after a file-reference identifier.
pub fn reference_comment(file: &FileDescriptor) -> &str {
  file.language.as_deref().unwrap_or(&file.display_name)
}

/// Text placed in the comment after a build-file identifier.
pub fn build_file_comment(file: &FileDescriptor) -> String {
  format!("{} in {}", file.display_name, file.kind.phase_label())
}

/// A `PBXFileReference` record, without indentation or line ending.
pub fn file_reference(id: &str, file: &FileDescriptor) -> String {
  let name = match &file.language {
    Some(lang) => Some(lang.as_str()),
    None if file.path.contains('/') => Some(file.display_name.as_str()),
    None => None,
  };

  let mut record = format!(
    "{id} /* {} */ = {{isa = PBXFileReference; lastKnownFileType = {}; ",
    comment_safe(reference_comment(file)),
    file_type(&file.path)
  );
  if let Some(name) = name {
    record.push_str(&format!("name = {}; ", quote(name)));
  }
  record.push_str(&format!("path = {}; sourceTree = \"<group>\"; }};", quote(&file.path)));
  record
}

/// A `PBXBuildFile` record linking `file_ref_id` into the file's phase.
pub fn build_file(id: &str, file_ref_id: &str, file: &FileDescriptor) -> String {
  format!(
    "{id} /* {} */ = {{isa = PBXBuildFile; fileRef = {file_ref_id} /* {} */; }};",
    comment_safe(&build_file_comment(file)),
    comment_safe(reference_comment(file)),
  )
}

/// One member of a `( … )` list, without indentation or line ending.
pub fn list_entry(id: &str, comment: &str) -> String {
  format!("{id} /* {} */,", comment_safe(comment))
}

/// Comments cannot contain their own terminator.
fn comment_safe(text: &str) -> String {
  text.replace("*/", "*_/")
}
