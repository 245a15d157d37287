//! Idempotent registration of files in the manifest.
//!
//! For every requested file the merger works out which of the four pieces
//! of a registration already exist (file reference, group entry, build file,
//! phase entry) and queues only the missing ones. Nothing touches the text
//! until every file has been examined; then all queued insertions are
//! spliced in a single pass over the original text.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::document::ManifestDocument;
use super::ident::{IdSource, IdentifierAllocator};
use super::observer::{Added, PatchObserver};
use super::record;
use super::section::{ListLayout, ListSpan, MissingSection, RecordSpan, SectionIndex, SectionSpan};
use super::types::{FailedRegistration, FileDescriptor, FileKind, PatchError, PatchRequest};

const FILE_REFERENCE: &str = "PBXFileReference";
const BUILD_FILE: &str = "PBXBuildFile";
const GROUP: &str = "PBXGroup";
const VARIANT_GROUP: &str = "PBXVariantGroup";
const PROJECT: &str = "PBXProject";
const NATIVE_TARGET: &str = "PBXNativeTarget";

/// Fallback indentation for records, matching the format's own.
const RECORD_INDENT: &str = "\t\t";

/// Outcome of merging a request into a document.
#[derive(Debug)]
pub struct MergeResult {
  /// New document text, `None` when nothing needed to change.
  pub text: Option<String>,
  pub integrated: Vec<String>,
  pub unchanged: Vec<String>,
  pub failed: Vec<FailedRegistration>,
  /// Number of fragments inserted.
  pub insertions: usize,
}

/// A list anchor resolved once per batch, or the reason it is unavailable.
type Anchor = Result<ListSpan, String>;

/// Pieces missing for one file.
#[derive(Debug, Default)]
struct Needs {
  file_reference: bool,
  group_entry: bool,
  build_file: bool,
}

/// Insertions keyed by offset into the original text.
#[derive(Debug, Default)]
struct Queue {
  at: BTreeMap<usize, String>,
  count: usize,
  /// Lists whose missing trailing comma has already been queued.
  separated: HashSet<usize>,
}

impl Queue {
  fn push(&mut self, offset: usize, fragment: String) {
    self.at.entry(offset).or_default().push_str(&fragment);
    self.count += 1;
  }

  /// Append an entry to `list`, terminating its last member first if needed.
  fn push_member(&mut self, list: &ListSpan, fragment: String) {
    if let Some((at, separator)) = list.separator {
      if self.separated.insert(at) {
        self.at.entry(at).or_default().push_str(separator);
      }
    }
    self.push(list.insert_at, fragment);
  }

  fn apply(self, text: &str) -> String {
    let extra: usize = self.at.values().map(String::len).sum();
    let mut out = String::with_capacity(text.len() + extra);
    let mut last = 0;
    for (offset, fragment) in self.at {
      out.push_str(&text[last..offset]);
      out.push_str(&fragment);
      last = offset;
    }
    out.push_str(&text[last..]);
    out
  }
}

struct Context<'d> {
  doc: &'d ManifestDocument,
  file_ref_section: SectionSpan,
  build_file_section: SectionSpan,
  file_refs: Vec<RecordSpan>,
  build_files: Vec<RecordSpan>,
  /// Every identifier listed as a child of some group.
  parented: HashSet<String>,
  group: Anchor,
  phases: HashMap<FileKind, Anchor>,
}

impl<'d> Context<'d> {
  fn new(doc: &'d ManifestDocument, request: &PatchRequest, files: &[FileDescriptor]) -> Result<Self, PatchError> {
    let text = doc.text();
    let kinds: HashSet<FileKind> = files.iter().map(|f| f.kind).collect();
    let malformed = |section: &str| PatchError::Malformed {
      path: doc.path().to_path_buf(),
      section: section.to_string(),
    };

    let mut required = vec![FILE_REFERENCE, BUILD_FILE, GROUP];
    if request.group.is_none() {
      required.push(PROJECT);
    }
    if request.target.is_some() {
      required.push(NATIVE_TARGET);
    }
    for kind in [FileKind::Resource, FileKind::Source] {
      if kinds.contains(&kind) {
        required.push(kind.phase_section());
      }
    }

    let index = SectionIndex::build(text, required).map_err(|MissingSection(section)| malformed(&section))?;
    let file_ref_section = index.section(FILE_REFERENCE).cloned().ok_or_else(|| malformed(FILE_REFERENCE))?;
    let build_file_section = index.section(BUILD_FILE).cloned().ok_or_else(|| malformed(BUILD_FILE))?;

    let parented = index
      .records(text, GROUP)
      .into_iter()
      .chain(optional_records(text, VARIANT_GROUP))
      .filter_map(|g| g.list(text, "children"))
      .flat_map(|list| list.members)
      .collect();

    let phases = kinds
      .iter()
      .map(|&kind| (kind, resolve_phase(text, &index, kind, request.target.as_deref())))
      .collect();

    Ok(Self {
      doc,
      file_ref_section,
      build_file_section,
      file_refs: index.records(text, FILE_REFERENCE),
      build_files: index.records(text, BUILD_FILE),
      parented,
      group: resolve_group(text, &index, request.group.as_deref()),
      phases,
    })
  }

  fn text(&self) -> &'d str {
    self.doc.text()
  }

  fn phase(&self, kind: FileKind) -> Result<&ListSpan, String> {
    match self.phases.get(&kind) {
      Some(Ok(list)) => Ok(list),
      Some(Err(anchor)) => Err(anchor.clone()),
      None => Err(format!("files list of the {}", kind.phase_section())),
    }
  }

  fn find_reference(&self, path: &str) -> Option<&RecordSpan> {
    self
      .file_refs
      .iter()
      .find(|r| r.value(self.text(), "path").as_deref() == Some(path))
  }

  /// Whether some build file for `ref_id` is a member of `phase`.
  fn is_registered(&self, ref_id: &str, phase: &ListSpan) -> bool {
    self
      .build_files
      .iter()
      .any(|b| phase.contains(&b.id) && b.value(self.text(), "fileRef").as_deref() == Some(ref_id))
  }

  fn record_line(&self, span: &SectionSpan, record: &str) -> (usize, String) {
    let indent = span.record_indent.as_deref().unwrap_or(RECORD_INDENT);
    let newline = self.doc.newline();
    let lead = if span.needs_newline { newline } else { "" };
    (span.insert_at, format!("{lead}{indent}{record}{newline}"))
  }

  fn member_line(&self, list: &ListSpan, entry: &str) -> String {
    match &list.layout {
      ListLayout::Multiline { indent } => format!("{indent}{entry}{}", self.doc.newline()),
      ListLayout::Inline => format!("{entry} "),
    }
  }
}

/// Merge `request` into `doc`, returning the patched text if anything changed.
///
/// A missing required section aborts with [`PatchError::Malformed`]. A
/// missing anchor only fails the files that need it.
pub fn merge(
  doc: &ManifestDocument,
  request: &PatchRequest,
  source: &mut dyn IdSource,
  observer: &mut dyn PatchObserver,
) -> Result<MergeResult, PatchError> {
  let files = request.files();
  let ctx = Context::new(doc, request, &files)?;
  let text = ctx.text();

  let mut ids = IdentifierAllocator::new(text, source);
  let mut queue = Queue::default();
  let mut seen = HashSet::new();
  let mut result = MergeResult {
    text: None,
    integrated: Vec::new(),
    unchanged: Vec::new(),
    failed: Vec::new(),
    insertions: 0,
  };

  for file in &files {
    if !seen.insert(file.path.clone()) {
      let error = PatchError::DuplicateRequest {
        path: file.path.clone(),
      };
      fail(&mut result, observer, file, error);
      continue;
    }

    let existing = ctx.find_reference(&file.path);
    let phase = ctx.phase(file.kind);

    let needs = match existing {
      None => Needs {
        file_reference: true,
        group_entry: true,
        build_file: true,
      },
      Some(reference) => Needs {
        file_reference: false,
        group_entry: request.force && !ctx.parented.contains(&reference.id),
        build_file: match &phase {
          Ok(phase) => !ctx.is_registered(&reference.id, phase),
          Err(_) => true,
        },
      },
    };

    // Validate every anchor this file needs before allocating anything.
    let group = match (&ctx.group, needs.group_entry) {
      (Err(anchor), true) => {
        fail(&mut result, observer, file, mismatch(file, anchor.clone()));
        continue;
      }
      (Ok(group), true) => Some(group),
      _ => None,
    };
    let phase = match (phase, needs.build_file) {
      (Err(anchor), true) => {
        fail(&mut result, observer, file, mismatch(file, anchor));
        continue;
      }
      (Ok(phase), true) => Some(phase),
      _ => None,
    };

    if !needs.file_reference && group.is_none() && phase.is_none() {
      observer.on_already_present(&file.path);
      result.unchanged.push(file.path.clone());
      continue;
    }

    let mut added = Added::default();
    let ref_id = match existing {
      Some(reference) => reference.id.clone(),
      None => {
        let id = ids.allocate();
        let (at, line) = ctx.record_line(&ctx.file_ref_section, &record::file_reference(&id, file));
        queue.push(at, line);
        added.file_reference = Some(id.clone());
        id
      }
    };

    if let Some(group) = group {
      let line = ctx.member_line(group, &record::list_entry(&ref_id, record::reference_comment(file)));
      queue.push_member(group, line);
      added.group_entry = true;
    }

    if let Some(phase) = phase {
      let build_id = ids.allocate();
      let (at, line) = ctx.record_line(&ctx.build_file_section, &record::build_file(&build_id, &ref_id, file));
      queue.push(at, line);
      let line = ctx.member_line(phase, &record::list_entry(&build_id, &record::build_file_comment(file)));
      queue.push_member(phase, line);
      added.build_file = Some(build_id);
    }

    observer.on_integrated(&file.path, &added);
    result.integrated.push(file.path.clone());
  }

  debug!(
    insertions = queue.count,
    integrated = result.integrated.len(),
    failed = result.failed.len(),
    rejected_ids = ids.rejected(),
    "merge computed"
  );

  result.insertions = queue.count;
  if queue.count > 0 {
    result.text = Some(queue.apply(text));
  }
  Ok(result)
}

fn mismatch(file: &FileDescriptor, anchor: String) -> PatchError {
  PatchError::PatternMismatch {
    path: file.path.clone(),
    anchor,
  }
}

fn fail(result: &mut MergeResult, observer: &mut dyn PatchObserver, file: &FileDescriptor, error: PatchError) {
  observer.on_failed(&file.path, &error);
  result.failed.push(FailedRegistration {
    path: file.path.clone(),
    error,
  });
}

/// Records of a section the format may omit entirely.
fn optional_records(text: &str, name: &str) -> Vec<RecordSpan> {
  SectionIndex::build(text, [name])
    .map(|index| index.records(text, name))
    .unwrap_or_default()
}

fn resolve_group(text: &str, index: &SectionIndex, name: Option<&str>) -> Anchor {
  let groups = index.records(text, GROUP);
  let (group, anchor) = match name {
    Some(name) => (
      groups.iter().find(|g| {
        g.value(text, "name").as_deref() == Some(name) || g.value(text, "path").as_deref() == Some(name)
      }),
      format!("children list of group '{name}'"),
    ),
    None => {
      let main = index
        .records(text, PROJECT)
        .first()
        .and_then(|project| project.value(text, "mainGroup"));
      (
        main.and_then(|main| groups.iter().find(|g| g.id == main)),
        "children list of the main group".to_string(),
      )
    }
  };

  group.and_then(|g| g.list(text, "children")).ok_or(anchor)
}

fn resolve_phase(text: &str, index: &SectionIndex, kind: FileKind, target: Option<&str>) -> Anchor {
  let section = kind.phase_section();
  let phases = index.records(text, section);

  let (phase, anchor) = match target {
    Some(target) => {
      let members = index
        .records(text, NATIVE_TARGET)
        .into_iter()
        .find(|t| t.value(text, "name").as_deref() == Some(target))
        .and_then(|t| t.list(text, "buildPhases"));
      (
        members.and_then(|members| phases.iter().find(|p| members.contains(&p.id))),
        format!("files list of the {section} of target '{target}'"),
      )
    }
    None => (phases.first(), format!("files list of the {section}")),
  };

  phase.and_then(|p| p.list(text, "files")).ok_or(anchor)
}
