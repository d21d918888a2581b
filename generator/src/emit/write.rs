use crate::classify::TypeDescriptor;
use crate::context::EmissionContext;

use super::NESTED_INDENT;

/// Appends statements writing `value` to `ctx.write_lines`. `depth` is the container nesting level
/// of `value` within its field; 0 for the field itself.
pub fn emit(ctx: &mut EmissionContext, descriptor: &TypeDescriptor, value: &str, indent: &str, depth: usize) {
  match descriptor {
    TypeDescriptor::Primitive(_) => {
      ctx.write_lines.push(format!("{indent}writer.Write({value});"));
    }
    TypeDescriptor::FixedArray { element } => emit_indexed(ctx, element, value, "Length", indent, depth),
    TypeDescriptor::Sequence { element } => emit_indexed(ctx, element, value, "Count", indent, depth),
    TypeDescriptor::Map { key, value: mapped } => {
      let n = ctx.next_depth();
      let entry = format!("kv{n}");
      let nested = format!("{indent}{NESTED_INDENT}");

      begin_region(ctx, value, indent, depth);
      ctx.write_lines.push(format!("{indent}writer.Write({value}.Count);"));
      ctx.write_lines.push(String::new());
      ctx.write_lines.push(format!("{indent}foreach (var {entry} in {value})"));
      ctx.write_lines.push(format!("{indent}{{"));

      emit(ctx, key, &format!("{entry}.Key"), &nested, depth + 1);
      ctx.write_lines.push(String::new());
      emit(ctx, mapped, &format!("{entry}.Value"), &nested, depth + 1);

      ctx.write_lines.push(format!("{indent}}}"));
      end_region(ctx, indent, depth);
    }
    TypeDescriptor::Unsupported { .. } => {}
  }
}

fn emit_indexed(ctx: &mut EmissionContext, element: &TypeDescriptor, value: &str, length: &str, indent: &str, depth: usize) {
  let n = ctx.next_depth();
  let index = format!("i{n}");
  let count = format!("{value}.{length}");

  begin_region(ctx, value, indent, depth);
  ctx.write_lines.push(format!("{indent}writer.Write({count});"));
  ctx.write_lines.push(String::new());
  ctx.write_lines.push(format!("{indent}for (int {index} = 0; {index} < {count}; {index}++)"));
  ctx.write_lines.push(format!("{indent}{{"));

  emit(ctx, element, &format!("{value}[{index}]"), &format!("{indent}{NESTED_INDENT}"), depth + 1);

  ctx.write_lines.push(format!("{indent}}}"));
  end_region(ctx, indent, depth);
}

fn begin_region(ctx: &mut EmissionContext, value: &str, indent: &str, depth: usize) {
  if depth == 0 {
    ctx.write_lines.push(format!("{indent}#region {value}"));
  }
}

fn end_region(ctx: &mut EmissionContext, indent: &str, depth: usize) {
  if depth == 0 {
    ctx.write_lines.push(format!("{indent}#endregion"));
  }
}
