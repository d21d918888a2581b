//! Generates `Write`/`Read` serialization and an opcode registry for packet classes.

pub mod classify;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod model;
pub mod registry;
pub mod target;

use std::collections::HashSet;

use packetgen_parser::hl::{self, Direction};
use tracing::{debug, info};

use crate::config::{GeneratorConfig, UnsupportedPolicy};
use crate::context::EmissionContext;
use crate::diagnostics::Diagnostics;
use crate::error::GenerateError;
use crate::model::PacketSource;
use crate::registry::{OpcodeWidth, RegistryError};
use crate::target::csharp;

/// One output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
  pub file_name: String,
  pub source: String,
}

/// Generates the serialization unit for one class, or `None` when there is nothing to generate.
/// Problems with individual fields are reported to `diagnostics`.
pub fn generate_packet<S: PacketSource + ?Sized>(source: &S, config: &GeneratorConfig, diagnostics: &mut Diagnostics) -> Option<GeneratedUnit> {
  let class_name = source.class_name();

  let model = match model::build(source, config) {
    Ok(Some(model)) => model,
    Ok(None) => return None,
    Err(error) => {
      diagnostics.error(class_name, Some(error.field.as_str()), error.source.to_string());
      return None;
    }
  };

  for field in model.unsupported_fields() {
    let type_name = field.descriptor.type_name();
    match config.unsupported {
      UnsupportedPolicy::Skip => diagnostics.warn(class_name, Some(field.name.as_str()), format!("type {} is not supported, field skipped", type_name)),
      UnsupportedPolicy::Abort => diagnostics.error(class_name, Some(field.name.as_str()), format!("type {} is not supported", type_name)),
    }
  }
  if config.unsupported == UnsupportedPolicy::Abort && model.unsupported_fields().next().is_some() {
    return None;
  }

  if model.supported_fields().next().is_none() {
    debug!("{} has no supported fields", class_name);
    return None;
  }

  let mut ctx = EmissionContext::new();
  emit::emit_packet(&mut ctx, &model, config.emit_equality);

  debug!("generated {} ({} fields)", class_name, model.supported_fields().count());
  Some(GeneratedUnit {
    file_name: csharp::unit_file_name(class_name),
    source: csharp::packet_source(&model, &ctx, config.emit_equality),
  })
}

/// Generates the registry unit. Every discovered packet is registered, including those with
/// hand-written serialization.
pub fn generate_registry(registry: &hl::Registry, definitions: &hl::Definitions, diagnostics: &mut Diagnostics) -> Result<GeneratedUnit, RegistryError> {
  let width = OpcodeWidth::resolve(&registry.opcode_width, diagnostics, &registry.name);
  let model = crate::registry::build(
    &definitions.packets_in(Direction::Client),
    &definitions.packets_in(Direction::Server),
    width,
  )?;

  info!("registry {}: {} client and {} server packets, opcode width {}", registry.name, model.client.len(), model.server.len(), width);
  Ok(GeneratedUnit {
    file_name: csharp::unit_file_name(&registry.name),
    source: csharp::registry_source(&model, &registry.namespace, &registry.name),
  })
}

/// Generates every packet unit followed by every registry unit.
pub fn generate_all(definitions: &hl::Definitions, config: &GeneratorConfig, diagnostics: &mut Diagnostics) -> Result<Vec<GeneratedUnit>, GenerateError> {
  let mut units = Vec::new();
  for packet in &definitions.packets {
    if let Some(unit) = generate_packet(packet, config, diagnostics) {
      units.push(unit);
    }
  }
  for registry in &definitions.registries {
    units.push(generate_registry(registry, definitions, diagnostics)?);
  }

  let mut names = HashSet::new();
  for unit in &units {
    if !names.insert(unit.file_name.as_str()) {
      return Err(GenerateError::DuplicateUnit { file_name: unit.file_name.to_owned() });
    }
  }

  Ok(units)
}
