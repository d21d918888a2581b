//! Builds the per-class model the emitters consume.

use itertools::Itertools;
use packetgen_parser::hl::{self, Direction, ResolvedType};
use thiserror::Error;
use tracing::trace;

use crate::classify::{classify, ClassifyError, TypeDescriptor};
use crate::config::GeneratorConfig;

/// Members whose presence means the class serializes itself.
const MANUAL_METHODS: [&str; 2] = ["Write", "Read"];

/// A field as declared, before exclusion and classification.
#[derive(Debug, Clone, Copy)]
pub struct SourceField<'a> {
  pub name: &'a str,
  pub kind: &'a ResolvedType,
  pub excluded: bool,
}

/// A discovered packet class. Implemented for the parser's definitions; other discovery front ends
/// can implement it to reuse the generator.
pub trait PacketSource {
  fn namespace_name(&self) -> &str;
  fn class_name(&self) -> &str;
  fn direction(&self) -> Direction;
  /// Fields in declaration order.
  fn declared_fields(&self) -> Vec<SourceField<'_>>;
  fn declared_methods(&self) -> Vec<&str>;
}

impl PacketSource for hl::Packet {
  fn namespace_name(&self) -> &str {
    &self.namespace
  }

  fn class_name(&self) -> &str {
    &self.name
  }

  fn direction(&self) -> Direction {
    self.direction
  }

  fn declared_fields(&self) -> Vec<SourceField<'_>> {
    self.fields().map(|field| SourceField {
      name: &field.name,
      kind: &field.kind,
      excluded: field.excluded,
    }).collect_vec()
  }

  fn declared_methods(&self) -> Vec<&str> {
    self.method_names().collect_vec()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
  pub name: String,
  pub descriptor: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketModel {
  pub namespace_name: String,
  pub class_name: String,
  pub direction: Direction,
  /// Non-excluded fields in declaration order.
  pub fields: Vec<FieldDescriptor>,
  /// Names of excluded fields. They get no code but still occupy the class scope.
  pub excluded_fields: Vec<String>,
  pub has_manual_read_write: bool,
}

impl PacketModel {
  pub fn supported_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
    self.fields.iter().filter(|it| it.descriptor.is_supported())
  }

  pub fn unsupported_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
    self.fields.iter().filter(|it| !it.descriptor.is_supported())
  }

  /// Every field name the class declares, excluded ones included.
  pub fn field_names(&self) -> impl Iterator<Item = &str> {
    self.fields.iter().map(|it| it.name.as_str()).chain(self.excluded_fields.iter().map(String::as_str))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field {field}: {source}")]
pub struct ModelError {
  pub field: String,
  #[source]
  pub source: ClassifyError,
}

pub fn has_manual_read_write<S: PacketSource + ?Sized>(source: &S) -> bool {
  source.declared_methods().iter().any(|name| MANUAL_METHODS.contains(name))
}

/// Drops excluded fields, then classifies the rest.
pub fn analyze<S: PacketSource + ?Sized>(source: &S, config: &GeneratorConfig) -> Result<PacketModel, ModelError> {
  let (excluded, declared): (Vec<_>, Vec<_>) = source.declared_fields().into_iter().partition(|field| field.excluded);

  let fields = declared.into_iter()
    .map(|field| {
      let descriptor = classify(field.kind, config.max_nesting_depth).map_err(|source| ModelError {
        field: field.name.to_owned(),
        source,
      })?;
      Ok(FieldDescriptor {
        name: field.name.to_owned(),
        descriptor,
      })
    })
    .collect::<Result<Vec<_>, ModelError>>()?;

  Ok(PacketModel {
    namespace_name: source.namespace_name().to_owned(),
    class_name: source.class_name().to_owned(),
    direction: source.direction(),
    fields,
    excluded_fields: excluded.into_iter().map(|field| field.name.to_owned()).collect(),
    has_manual_read_write: has_manual_read_write(source),
  })
}

/// Returns `None` when the class implements `Write`/`Read` itself or has nothing left to
/// serialize once excluded fields are removed.
pub fn build<S: PacketSource + ?Sized>(source: &S, config: &GeneratorConfig) -> Result<Option<PacketModel>, ModelError> {
  if has_manual_read_write(source) {
    trace!("{} implements Write/Read manually", source.class_name());
    return Ok(None);
  }

  let model = analyze(source, config)?;
  if model.fields.is_empty() {
    trace!("{} has no fields to serialize", source.class_name());
    return Ok(None);
  }

  Ok(Some(model))
}
