use std::fmt::{self, Debug, Display};

/// Location of a token in the schema source. `line` and `column` are zero-based.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash, Default)]
pub struct Span {
  pub start: usize,
  pub end: usize,
  pub line: usize,
  pub column: usize,
}

impl Span {
  pub fn identity() -> Self {
    Self::default()
  }

  pub fn wrap<T>(self, value: T) -> Positioned<T> {
    Positioned { value, span: self }
  }
}

impl Display for Span {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.line + 1, self.column + 1)
  }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Positioned<T> {
  pub value: T,
  pub span: Span,
}

impl<T> Positioned<T> {
  pub fn new(value: T, span: Span) -> Positioned<T> {
    Positioned { value, span }
  }

  pub fn identity(value: T) -> Positioned<T> {
    Positioned { value, span: Span::identity() }
  }

  pub fn wrap<U>(&self, value: U) -> Positioned<U> {
    self.span.wrap(value)
  }
}

impl<T: Debug> Debug for Positioned<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", self.value)
  }
}
