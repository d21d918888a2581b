//! Opcode assignment. Each direction gets its own opcode space starting at zero, in discovery order.

use std::collections::HashMap;
use std::fmt::{self, Display};

use packetgen_parser::hl::{Direction, OpcodeWidthDecl, ResolvedType, ScalarKind};
use thiserror::Error;
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::model::PacketSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpcodeWidth {
  #[default]
  U8,
  I8,
  U16,
  I16,
  U32,
  I32,
  U64,
  I64,
}

impl OpcodeWidth {
  pub fn type_name(&self) -> &'static str {
    match self {
      OpcodeWidth::U8 => "byte",
      OpcodeWidth::I8 => "sbyte",
      OpcodeWidth::U16 => "ushort",
      OpcodeWidth::I16 => "short",
      OpcodeWidth::U32 => "uint",
      OpcodeWidth::I32 => "int",
      OpcodeWidth::U64 => "ulong",
      OpcodeWidth::I64 => "long",
    }
  }

  /// Number of non-negative opcodes the width can hold.
  pub fn capacity(&self) -> u128 {
    match self {
      OpcodeWidth::U8 => 1 << 8,
      OpcodeWidth::I8 => 1 << 7,
      OpcodeWidth::U16 => 1 << 16,
      OpcodeWidth::I16 => 1 << 15,
      OpcodeWidth::U32 => 1 << 32,
      OpcodeWidth::I32 => 1 << 31,
      OpcodeWidth::U64 => 1 << 64,
      OpcodeWidth::I64 => 1 << 63,
    }
  }

  pub fn from_scalar(kind: ScalarKind) -> Option<Self> {
    match kind {
      ScalarKind::U8 => Some(OpcodeWidth::U8),
      ScalarKind::I8 => Some(OpcodeWidth::I8),
      ScalarKind::U16 => Some(OpcodeWidth::U16),
      ScalarKind::I16 => Some(OpcodeWidth::I16),
      ScalarKind::U32 => Some(OpcodeWidth::U32),
      ScalarKind::I32 => Some(OpcodeWidth::I32),
      ScalarKind::U64 => Some(OpcodeWidth::U64),
      ScalarKind::I64 => Some(OpcodeWidth::I64),
      _ => None,
    }
  }

  /// Resolves the declared width, falling back to `byte` with a warning when the declaration is
  /// not a single integer type.
  pub fn resolve(decl: &OpcodeWidthDecl, diagnostics: &mut Diagnostics, registry_name: &str) -> Self {
    let declared = match decl {
      OpcodeWidthDecl::Default => return OpcodeWidth::default(),
      OpcodeWidthDecl::Declared(ResolvedType::Scalar(kind)) => OpcodeWidth::from_scalar(*kind),
      OpcodeWidthDecl::Declared(_) => None,
      OpcodeWidthDecl::Malformed(_) => None,
    };

    declared.unwrap_or_else(|| {
      let written = match decl {
        OpcodeWidthDecl::Declared(kind) => format!("({})", kind.display_name()),
        OpcodeWidthDecl::Malformed(arguments) => arguments.to_owned(),
        OpcodeWidthDecl::Default => String::new(),
      };
      diagnostics.warn(registry_name, None, format!("opcode width {} is not an integer type, using byte", written));
      OpcodeWidth::default()
    })
  }
}

impl Display for OpcodeWidth {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.type_name())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
  pub namespace: String,
  pub type_name: String,
  pub opcode: u64,
}

/// Opcode info for one direction. The generated registry derives its opcode-keyed lookup from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionTable {
  entries: Vec<RegistryEntry>,
}

impl DirectionTable {
  /// Entries in opcode order.
  pub fn entries(&self) -> &[RegistryEntry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryModel {
  pub opcode_width: OpcodeWidth,
  pub client: DirectionTable,
  pub server: DirectionTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
  #[error("{count} {direction:?} packets do not fit in opcode width {width} (capacity {capacity})")]
  OpcodeOverflow {
    direction: Direction,
    count: usize,
    width: OpcodeWidth,
    capacity: u128,
  },
  #[error("packet name {name} is declared in both {first} and {second}")]
  DuplicatePacket {
    name: String,
    first: String,
    second: String,
  },
}

/// Assigns opcodes `0..n` to each direction's packets in the order given.
pub fn build<S: PacketSource>(client: &[&S], server: &[&S], opcode_width: OpcodeWidth) -> Result<RegistryModel, RegistryError> {
  let mut seen = HashMap::<&str, &str>::new();
  for source in client.iter().chain(server.iter()) {
    if let Some(first) = seen.insert(source.class_name(), source.namespace_name()) {
      return Err(RegistryError::DuplicatePacket {
        name: source.class_name().to_owned(),
        first: first.to_owned(),
        second: source.namespace_name().to_owned(),
      });
    }
  }

  Ok(RegistryModel {
    opcode_width,
    client: assign(Direction::Client, client, opcode_width)?,
    server: assign(Direction::Server, server, opcode_width)?,
  })
}

fn assign<S: PacketSource>(direction: Direction, sources: &[&S], width: OpcodeWidth) -> Result<DirectionTable, RegistryError> {
  if sources.len() as u128 > width.capacity() {
    return Err(RegistryError::OpcodeOverflow {
      direction,
      count: sources.len(),
      width,
      capacity: width.capacity(),
    });
  }

  let entries = sources.iter().zip(0u64..).map(|(source, opcode)| {
    debug!("{:?} opcode {} -> {}", direction, opcode, source.class_name());
    RegistryEntry {
      namespace: source.namespace_name().to_owned(),
      type_name: source.class_name().to_owned(),
      opcode,
    }
  }).collect();

  Ok(DirectionTable { entries })
}
