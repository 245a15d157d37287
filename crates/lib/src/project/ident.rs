//! Collision-free record identifiers.
//!
//! Identifiers are 24 uppercase hexadecimal characters, the width the
//! manifest format uses. A candidate is only handed out once it is known not
//! to occur anywhere in the document text (as any substring, so it cannot be
//! confused with part of an existing token) and not to have been allocated
//! earlier in the same batch.

use std::collections::HashSet;

use rand::RngCore;

/// Number of random bytes behind one identifier.
pub const IDENT_BYTES: usize = 12;

/// Length of an identifier in characters.
pub const IDENT_LEN: usize = IDENT_BYTES * 2;

/// Source of identifier randomness.
pub trait IdSource {
  fn fill(&mut self, buf: &mut [u8; IDENT_BYTES]);
}

impl<R: RngCore> IdSource for R {
  fn fill(&mut self, buf: &mut [u8; IDENT_BYTES]) {
    self.fill_bytes(buf);
  }
}

/// Mints identifiers that never collide within one patch invocation.
pub struct IdentifierAllocator<'t, 's> {
  text: &'t str,
  source: &'s mut dyn IdSource,
  allocated: HashSet<String>,
  rejected: usize,
}

impl<'t, 's> IdentifierAllocator<'t, 's> {
  pub fn new(text: &'t str, source: &'s mut dyn IdSource) -> Self {
    Self {
      text,
      source,
      allocated: HashSet::new(),
      rejected: 0,
    }
  }

  /// Return a fresh identifier, retrying on any collision.
  pub fn allocate(&mut self) -> String {
    loop {
      let mut buf = [0u8; IDENT_BYTES];
      self.source.fill(&mut buf);
      let candidate = hex::encode_upper(buf);

      if self.text.contains(&candidate) || self.allocated.contains(&candidate) {
        self.rejected += 1;
        continue;
      }

      self.allocated.insert(candidate.clone());
      return candidate;
    }
  }

  /// How many candidates were discarded because they collided.
  pub fn rejected(&self) -> usize {
    self.rejected
  }
}

/// Whether `token` has the shape of an identifier.
pub fn is_identifier(token: &str) -> bool {
  token.len() == IDENT_LEN && token.bytes().all(|b| b.is_ascii_hexdigit())
}
