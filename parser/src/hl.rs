//! Resolved definitions handed to the generator. Everything here is already free of syntax: type
//! names have been matched against the known scalar and container shapes.

use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
  U8,
  I8,
  I16,
  U16,
  I32,
  U32,
  I64,
  U64,
  Bool,
  Char,
  String,
  F32,
  F64,
  /// `byte[]`, written as one length-prefixed blob.
  Bytes,
  Vector2,
  Vector3,
}

impl ScalarKind {
  /// Name of the type as written in schema files.
  pub fn source_name(&self) -> &'static str {
    match self {
      ScalarKind::U8 => "byte",
      ScalarKind::I8 => "sbyte",
      ScalarKind::I16 => "short",
      ScalarKind::U16 => "ushort",
      ScalarKind::I32 => "int",
      ScalarKind::U32 => "uint",
      ScalarKind::I64 => "long",
      ScalarKind::U64 => "ulong",
      ScalarKind::Bool => "bool",
      ScalarKind::Char => "char",
      ScalarKind::String => "string",
      ScalarKind::F32 => "float",
      ScalarKind::F64 => "double",
      ScalarKind::Bytes => "byte[]",
      ScalarKind::Vector2 => "Vector2",
      ScalarKind::Vector3 => "Vector3",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedType {
  Scalar(ScalarKind),
  Array(Box<ResolvedType>),
  List(Box<ResolvedType>),
  Dictionary(Box<ResolvedType>, Box<ResolvedType>),
  /// Anything that is not a known scalar or container, kept by display name.
  Named(String),
}

impl ResolvedType {
  pub fn display_name(&self) -> String {
    match self {
      ResolvedType::Scalar(kind) => kind.source_name().to_owned(),
      ResolvedType::Array(element) => format!("{}[]", element.display_name()),
      ResolvedType::List(element) => format!("List<{}>", element.display_name()),
      ResolvedType::Dictionary(key, value) => format!("Dictionary<{}, {}>", key.display_name(), value.display_name()),
      ResolvedType::Named(name) => name.to_owned(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
  Client,
  Server,
}

#[derive(Debug, Clone)]
pub struct Field {
  pub name: String,
  pub kind: ResolvedType,
  pub excluded: bool,
  pub comments: Vec<String>
}

#[derive(Debug, Clone)]
pub enum Member {
  Field(Field),
  Method(String),
}

#[derive(Debug, Clone)]
pub struct Packet {
  pub namespace: String,
  pub name: String,
  pub direction: Direction,
  pub members: Vec<Member>,
  pub comments: Vec<String>
}

impl Packet {
  pub fn fields(&self) -> impl Iterator<Item = &Field> {
    self.members.iter().filter_map(|member| match member {
      Member::Field(field) => Some(field),
      Member::Method(_) => None,
    })
  }

  pub fn method_names(&self) -> impl Iterator<Item = &str> {
    self.members.iter().filter_map(|member| match member {
      Member::Method(name) => Some(name.as_str()),
      Member::Field(_) => None,
    })
  }
}

/// Opcode width as declared on the registry attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpcodeWidthDecl {
  /// No argument list was given.
  Default,
  Declared(ResolvedType),
  /// Argument list present but not a single type; holds the written arguments.
  Malformed(String),
}

#[derive(Debug, Clone)]
pub struct Registry {
  pub namespace: String,
  pub name: String,
  pub opcode_width: OpcodeWidthDecl,
}

#[derive(Debug, Clone, Default)]
pub struct Definitions {
  pub meta: Vec<Meta>,
  pub packets: Vec<Packet>,
  pub registries: Vec<Registry>,
}

impl Definitions {
  /// Appends another file's definitions, keeping discovery order.
  pub fn extend(&mut self, other: Definitions) {
    self.meta.extend(other.meta);
    self.packets.extend(other.packets);
    self.registries.extend(other.registries);
  }

  pub fn packets_in(&self, direction: Direction) -> Vec<&Packet> {
    self.packets.iter().filter(|it| it.direction == direction).collect_vec()
  }
}

#[derive(Debug, Clone)]
pub struct Meta {
  pub key: String,
  pub value: String
}
