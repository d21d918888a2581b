use clap::ValueEnum;

pub const DEFAULT_MAX_NESTING_DEPTH: usize = 8;

/// What to do with a class that has a field of an unsupported type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UnsupportedPolicy {
  /// Leave the field out of both `Write` and `Read` and report a warning.
  #[default]
  Skip,
  /// Generate nothing for the class and report an error.
  Abort,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
  /// Deepest allowed chain of nested containers in a single field type.
  pub max_nesting_depth: usize,
  /// Emit `Equals` and `GetHashCode` next to `Write` and `Read`.
  pub emit_equality: bool,
  pub unsupported: UnsupportedPolicy,
}

impl Default for GeneratorConfig {
  fn default() -> Self {
    Self {
      max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
      emit_equality: true,
      unsupported: UnsupportedPolicy::default(),
    }
  }
}
