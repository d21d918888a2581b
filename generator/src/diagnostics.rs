use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
  Info,
  Warning,
  Error,
}

impl Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Severity::Info => write!(f, "info"),
      Severity::Warning => write!(f, "warning"),
      Severity::Error => write!(f, "error"),
    }
  }
}

/// Advisory message about one class, optionally narrowed to one of its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub severity: Severity,
  pub class: Option<String>,
  pub field: Option<String>,
  pub message: String,
}

impl Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: ", self.severity)?;
    match (&self.class, &self.field) {
      (Some(class), Some(field)) => write!(f, "{}.{}: ", class, field)?,
      (Some(class), None) => write!(f, "{}: ", class)?,
      (None, Some(field)) => write!(f, "{}: ", field)?,
      (None, None) => {}
    }
    write!(f, "{}", self.message)
  }
}

/// Collects diagnostics for the caller; generation never fails because of them.
#[derive(Debug, Default)]
pub struct Diagnostics {
  records: Vec<Diagnostic>,
}

impl Diagnostics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn report(&mut self, severity: Severity, class: Option<&str>, field: Option<&str>, message: impl Into<String>) {
    self.records.push(Diagnostic {
      severity,
      class: class.map(ToOwned::to_owned),
      field: field.map(ToOwned::to_owned),
      message: message.into(),
    });
  }

  pub fn warn(&mut self, class: &str, field: Option<&str>, message: impl Into<String>) {
    self.report(Severity::Warning, Some(class), field, message);
  }

  pub fn error(&mut self, class: &str, field: Option<&str>, message: impl Into<String>) {
    self.report(Severity::Error, Some(class), field, message);
  }

  pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
    self.records.iter()
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn count(&self, severity: Severity) -> usize {
    self.records.iter().filter(|it| it.severity == severity).count()
  }

  pub fn has_errors(&self) -> bool {
    self.count(Severity::Error) > 0
  }

  pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
    self.records.iter().filter(move |it| it.field.as_deref() == Some(field))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn formats_with_class_and_field() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.warn("CPacketMove", Some("Target"), "type Player is not supported");
    diagnostics.report(Severity::Info, None, None, "done");

    let lines = diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>();
    assert_eq!(lines, vec![
      "warning: CPacketMove.Target: type Player is not supported",
      "info: done",
    ]);
  }

  #[test]
  fn counts_by_severity() {
    let mut diagnostics = Diagnostics::new();
    assert!(diagnostics.is_empty());

    diagnostics.warn("A", None, "first");
    diagnostics.error("A", Some("B"), "second");

    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics.count(Severity::Warning), 1);
    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.for_field("B").count(), 1);
  }
}
