//! Maps resolved field types onto the shapes the emitters know how to serialize.

use std::collections::BTreeSet;

use packetgen_parser::hl::{ResolvedType, ScalarKind};
use thiserror::Error;

const COLLECTIONS_NAMESPACE: &str = "System.Collections.Generic";
const GODOT_NAMESPACE: &str = "Godot";

/// A scalar the external `PacketWriter` / `PacketReader` pair handles directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primitive {
  /// `reader.Read{suffix}()`
  pub suffix: &'static str,
  pub type_name: &'static str,
  pub namespace: Option<&'static str>,
  pub value_type: bool,
}

impl Primitive {
  const fn new(suffix: &'static str, type_name: &'static str, value_type: bool) -> Self {
    Primitive { suffix, type_name, namespace: None, value_type }
  }
}

pub fn primitive(kind: ScalarKind) -> Primitive {
  match kind {
    ScalarKind::U8 => Primitive::new("Byte", "byte", true),
    ScalarKind::I8 => Primitive::new("SByte", "sbyte", true),
    ScalarKind::I16 => Primitive::new("Short", "short", true),
    ScalarKind::U16 => Primitive::new("UShort", "ushort", true),
    ScalarKind::I32 => Primitive::new("Int", "int", true),
    ScalarKind::U32 => Primitive::new("UInt", "uint", true),
    ScalarKind::I64 => Primitive::new("Long", "long", true),
    ScalarKind::U64 => Primitive::new("ULong", "ulong", true),
    ScalarKind::Bool => Primitive::new("Bool", "bool", true),
    ScalarKind::Char => Primitive::new("Char", "char", true),
    ScalarKind::String => Primitive::new("String", "string", false),
    ScalarKind::F32 => Primitive::new("Float", "float", true),
    ScalarKind::F64 => Primitive::new("Double", "double", true),
    ScalarKind::Bytes => Primitive::new("Bytes", "byte[]", false),
    ScalarKind::Vector2 => Primitive { namespace: Some(GODOT_NAMESPACE), ..Primitive::new("Vector2", "Vector2", true) },
    ScalarKind::Vector3 => Primitive { namespace: Some(GODOT_NAMESPACE), ..Primitive::new("Vector3", "Vector3", true) },
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
  Primitive(Primitive),
  FixedArray { element: Box<TypeDescriptor> },
  Sequence { element: Box<TypeDescriptor> },
  Map { key: Box<TypeDescriptor>, value: Box<TypeDescriptor> },
  Unsupported { display_name: String },
}

impl TypeDescriptor {
  pub fn is_supported(&self) -> bool {
    !matches!(self, TypeDescriptor::Unsupported { .. })
  }

  pub fn is_value_type(&self) -> bool {
    matches!(self, TypeDescriptor::Primitive(Primitive { value_type: true, .. }))
  }

  /// Name of the type in generated code, e.g. `int[][]` or `Dictionary<string, List<int>>`.
  pub fn type_name(&self) -> String {
    match self {
      TypeDescriptor::Primitive(primitive) => primitive.type_name.to_owned(),
      TypeDescriptor::FixedArray { element } => format!("{}[]", element.type_name()),
      TypeDescriptor::Sequence { element } => format!("List<{}>", element.type_name()),
      TypeDescriptor::Map { key, value } => format!("Dictionary<{}, {}>", key.type_name(), value.type_name()),
      TypeDescriptor::Unsupported { display_name } => display_name.to_owned(),
    }
  }

  /// Namespaces needed to spell [`TypeDescriptor::type_name`] in generated code.
  pub fn collect_namespaces(&self, namespaces: &mut BTreeSet<String>) {
    match self {
      TypeDescriptor::Primitive(primitive) => {
        if let Some(namespace) = primitive.namespace {
          namespaces.insert(namespace.to_owned());
        }
      }
      TypeDescriptor::FixedArray { element } => element.collect_namespaces(namespaces),
      TypeDescriptor::Sequence { element } => {
        namespaces.insert(COLLECTIONS_NAMESPACE.to_owned());
        element.collect_namespaces(namespaces);
      }
      TypeDescriptor::Map { key, value } => {
        namespaces.insert(COLLECTIONS_NAMESPACE.to_owned());
        key.collect_namespaces(namespaces);
        value.collect_namespaces(namespaces);
      }
      TypeDescriptor::Unsupported { .. } => {}
    }
  }

  /// Allocation expression for an array of this element type with `count` slots.
  /// Jagged arrays put the count in the first rank: `int[count][]`.
  pub fn array_allocation(&self, count: &str) -> String {
    let array_name = format!("{}[]", self.type_name());
    let mut stem = array_name.as_str();
    let mut ranks = 0;
    while let Some(rest) = stem.strip_suffix("[]") {
      stem = rest;
      ranks += 1;
    }

    format!("{}[{}]{}", stem, count, "[]".repeat(ranks - 1))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
  #[error("type {display_name} nests containers deeper than the limit of {limit}")]
  NestingTooDeep { display_name: String, limit: usize },
}

/// Classifies `kind`, allowing at most `max_nesting_depth` nested containers.
///
/// A container whose element, key or value is unsupported is unsupported as a whole, so emitters
/// never see a partially serializable container.
pub fn classify(kind: &ResolvedType, max_nesting_depth: usize) -> Result<TypeDescriptor, ClassifyError> {
  classify_at(kind, 0, max_nesting_depth).map_err(|limit| ClassifyError::NestingTooDeep {
    display_name: kind.display_name(),
    limit,
  })
}

fn classify_at(kind: &ResolvedType, level: usize, limit: usize) -> Result<TypeDescriptor, usize> {
  let nested = |argument: &ResolvedType| -> Result<Box<TypeDescriptor>, usize> {
    if level >= limit {
      return Err(limit);
    }
    classify_at(argument, level + 1, limit).map(Box::new)
  };

  let descriptor = match kind {
    ResolvedType::Scalar(scalar) => TypeDescriptor::Primitive(primitive(*scalar)),
    ResolvedType::Named(name) => TypeDescriptor::Unsupported { display_name: name.to_owned() },
    ResolvedType::Array(element) => TypeDescriptor::FixedArray { element: nested(element)? },
    ResolvedType::List(element) => TypeDescriptor::Sequence { element: nested(element)? },
    ResolvedType::Dictionary(key, value) => TypeDescriptor::Map { key: nested(key)?, value: nested(value)? },
  };

  let arguments = match &descriptor {
    TypeDescriptor::FixedArray { element } | TypeDescriptor::Sequence { element } => vec![element],
    TypeDescriptor::Map { key, value } => vec![key, value],
    _ => Vec::new(),
  };
  if arguments.iter().any(|it| !it.is_supported()) {
    return Ok(TypeDescriptor::Unsupported { display_name: kind.display_name() });
  }

  Ok(descriptor)
}

#[cfg(test)]
mod tests {
  use itertools::Itertools;
  use test_log::test;

  use super::*;

  fn scalar(kind: ScalarKind) -> ResolvedType {
    ResolvedType::Scalar(kind)
  }

  fn list(element: ResolvedType) -> ResolvedType {
    ResolvedType::List(Box::new(element))
  }

  fn array(element: ResolvedType) -> ResolvedType {
    ResolvedType::Array(Box::new(element))
  }

  #[test]
  fn classifies_primitives() {
    let descriptor = classify(&scalar(ScalarKind::I32), 8).unwrap();
    assert_eq!(descriptor, TypeDescriptor::Primitive(primitive(ScalarKind::I32)));
    assert_eq!(descriptor.type_name(), "int");
    assert!(descriptor.is_value_type());

    let bytes = classify(&scalar(ScalarKind::Bytes), 8).unwrap();
    assert_eq!(bytes.type_name(), "byte[]");
    assert!(!bytes.is_value_type());
  }

  #[test]
  fn primitive_suffixes_match_reader_methods() {
    let suffixes = [
      ScalarKind::U8, ScalarKind::I8, ScalarKind::I16, ScalarKind::U16, ScalarKind::I32, ScalarKind::U32,
      ScalarKind::I64, ScalarKind::U64, ScalarKind::Bool, ScalarKind::Char, ScalarKind::String, ScalarKind::F32,
      ScalarKind::F64, ScalarKind::Bytes, ScalarKind::Vector2, ScalarKind::Vector3,
    ].map(|kind| primitive(kind).suffix);

    assert_eq!(suffixes, [
      "Byte", "SByte", "Short", "UShort", "Int", "UInt", "Long", "ULong", "Bool", "Char", "String", "Float",
      "Double", "Bytes", "Vector2", "Vector3",
    ]);
  }

  #[test]
  fn classifies_nested_containers() {
    let kind = ResolvedType::Dictionary(Box::new(scalar(ScalarKind::String)), Box::new(list(array(scalar(ScalarKind::F32)))));
    let descriptor = classify(&kind, 8).unwrap();

    assert_eq!(descriptor, TypeDescriptor::Map {
      key: Box::new(TypeDescriptor::Primitive(primitive(ScalarKind::String))),
      value: Box::new(TypeDescriptor::Sequence {
        element: Box::new(TypeDescriptor::FixedArray {
          element: Box::new(TypeDescriptor::Primitive(primitive(ScalarKind::F32))),
        }),
      }),
    });
    assert_eq!(descriptor.type_name(), "Dictionary<string, List<float[]>>");
  }

  #[test]
  fn unsupported_element_makes_container_unsupported() {
    let kind = list(ResolvedType::Named("Player".to_owned()));
    assert_eq!(classify(&kind, 8).unwrap(), TypeDescriptor::Unsupported { display_name: "List<Player>".to_owned() });

    let named = ResolvedType::Named("HashSet<int>".to_owned());
    assert_eq!(classify(&named, 8).unwrap(), TypeDescriptor::Unsupported { display_name: "HashSet<int>".to_owned() });
  }

  #[test]
  fn enforces_nesting_limit() {
    let two_levels = list(list(scalar(ScalarKind::I32)));
    assert!(classify(&two_levels, 2).is_ok());

    let three_levels = list(two_levels);
    assert_eq!(classify(&three_levels, 2).unwrap_err(), ClassifyError::NestingTooDeep {
      display_name: "List<List<List<int>>>".to_owned(),
      limit: 2,
    });
  }

  #[test]
  fn collects_namespaces_for_declarations() {
    let kind = list(ResolvedType::Dictionary(Box::new(scalar(ScalarKind::I32)), Box::new(scalar(ScalarKind::Vector3))));
    let mut namespaces = BTreeSet::new();
    classify(&kind, 8).unwrap().collect_namespaces(&mut namespaces);

    assert_eq!(namespaces.into_iter().collect_vec(), vec!["Godot", "System.Collections.Generic"]);
  }

  #[test]
  fn array_allocation_puts_count_in_first_rank() {
    let int = classify(&scalar(ScalarKind::I32), 8).unwrap();
    assert_eq!(int.array_allocation("n"), "int[n]");

    let jagged = classify(&array(scalar(ScalarKind::I32)), 8).unwrap();
    assert_eq!(jagged.array_allocation("n"), "int[n][]");

    let bytes = classify(&scalar(ScalarKind::Bytes), 8).unwrap();
    assert_eq!(bytes.array_allocation("n"), "byte[n][]");

    let lists = classify(&list(array(scalar(ScalarKind::I32))), 8).unwrap();
    assert_eq!(lists.array_allocation("n"), "List<int[]>[n]");
  }
}
