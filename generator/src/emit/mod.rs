//! Line emitters. Every emitter appends to one buffer of an [`EmissionContext`]; indentation of the
//! enclosing method body is added by the target.

use tracing::trace;

use crate::context::EmissionContext;
use crate::model::{FieldDescriptor, PacketModel};

pub mod equality;
pub mod read;
pub mod write;

/// Indentation added for each nested loop body.
pub const NESTED_INDENT: &str = "    ";

/// Emits every supported field of `model` in declaration order. All field names, emitted or not,
/// are reserved first so no top-level local of `Read` shadows a field.
pub fn emit_packet(ctx: &mut EmissionContext, model: &PacketModel, emit_equality: bool) {
  for name in model.field_names() {
    ctx.reserve(name);
  }

  for field in model.supported_fields() {
    emit_field(ctx, field, emit_equality);
  }
}

/// Emits write, read and (optionally) equality code for one supported field.
pub fn emit_field(ctx: &mut EmissionContext, field: &FieldDescriptor, emit_equality: bool) {
  trace!("emitting {} as {}", field.name, field.descriptor.type_name());

  field.descriptor.collect_namespaces(ctx.imports_mut());

  ctx.reset_depth();
  write::emit(ctx, &field.descriptor, &field.name, "", 0);

  ctx.reset_depth();
  read::emit(ctx, &field.descriptor, &field.name, &field.name, "", 0);

  if emit_equality {
    equality::emit(ctx, &field.descriptor, &field.name);
  }
}
