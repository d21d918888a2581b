use std::collections::{BTreeSet, HashSet};

/// Per-class output buffers. One context is created for each generated class and dropped with it.
#[derive(Debug, Default)]
pub struct EmissionContext {
  pub write_lines: Vec<String>,
  pub read_lines: Vec<String>,
  pub equality_lines: Vec<String>,
  pub hash_lines: Vec<String>,
  imports: BTreeSet<String>,
  /// Names visible in the whole method body: the class's fields and the top-level locals issued so far.
  names: HashSet<String>,
  depth: usize,
}

impl EmissionContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns a suffix for loop and temporary names that no other container of the current field
  /// has used.
  pub fn next_depth(&mut self) -> usize {
    let depth = self.depth;
    self.depth += 1;
    depth
  }

  /// Restarts suffix numbering. Called before each field's write pass and read pass so both
  /// passes name their temporaries identically.
  pub fn reset_depth(&mut self) {
    self.depth = 0;
  }

  /// Marks `name` as taken, e.g. by a field of the class.
  pub fn reserve(&mut self, name: impl Into<String>) {
    self.names.insert(name.into());
  }

  /// Returns `base`, or `base` with the lowest numeric suffix from 2 that is not taken, and reserves it.
  pub fn unique_name(&mut self, base: &str) -> String {
    if self.names.insert(base.to_owned()) {
      return base.to_owned();
    }

    let mut suffix = 2;
    loop {
      let candidate = format!("{}{}", base, suffix);
      if self.names.insert(candidate.clone()) {
        return candidate;
      }
      suffix += 1;
    }
  }

  pub fn imports_mut(&mut self) -> &mut BTreeSet<String> {
    &mut self.imports
  }

  /// Imports in sorted order.
  pub fn imports(&self) -> impl Iterator<Item = &str> {
    self.imports.iter().map(String::as_str)
  }
}
