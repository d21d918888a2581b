use crate::classify::TypeDescriptor;
use crate::context::EmissionContext;

/// Appends the `Equals` conjunct and the `GetHashCode` fold step for one field.
/// Reference-typed fields go through the null-safe static forms.
pub fn emit(ctx: &mut EmissionContext, descriptor: &TypeDescriptor, field: &str) {
  if descriptor.is_value_type() {
    ctx.equality_lines.push(format!("{field}.Equals(other.{field})"));
    ctx.hash_lines.push(format!("hash = hash * 397 ^ {field}.GetHashCode();"));
  } else {
    ctx.equality_lines.push(format!("Equals({field}, other.{field})"));
    ctx.hash_lines.push(format!("hash = hash * 397 ^ ({field}?.GetHashCode() ?? 0);"));
  }
}
