use heck::ToLowerCamelCase;

use crate::classify::TypeDescriptor;
use crate::context::EmissionContext;

use super::NESTED_INDENT;

/// Appends statements reading into `target` to `ctx.read_lines`, mirroring [`super::write::emit`]
/// statement for statement. `root` is the field name, used to name the top-level count.
pub fn emit(ctx: &mut EmissionContext, descriptor: &TypeDescriptor, target: &str, root: &str, indent: &str, depth: usize) {
  match descriptor {
    TypeDescriptor::Primitive(primitive) => {
      ctx.read_lines.push(format!("{indent}{target} = reader.Read{}();", primitive.suffix));
    }
    TypeDescriptor::FixedArray { element } => {
      let n = ctx.next_depth();
      let count = count_name(ctx, root, n, depth);
      descriptor.collect_namespaces(ctx.imports_mut());

      begin_region(ctx, target, indent, depth);
      ctx.read_lines.push(format!("{indent}int {count} = reader.ReadInt();"));
      ctx.read_lines.push(format!("{indent}{target} = new {};", element.array_allocation(&count)));
      emit_loop(ctx, element, target, root, indent, depth, n, &count, |target, index, element| {
        format!("{target}[{index}] = {element};")
      });
      end_region(ctx, indent, depth);
    }
    TypeDescriptor::Sequence { element } => {
      let n = ctx.next_depth();
      let count = count_name(ctx, root, n, depth);
      descriptor.collect_namespaces(ctx.imports_mut());

      begin_region(ctx, target, indent, depth);
      ctx.read_lines.push(format!("{indent}{target} = new {}();", descriptor.type_name()));
      ctx.read_lines.push(format!("{indent}int {count} = reader.ReadInt();"));
      emit_loop(ctx, element, target, root, indent, depth, n, &count, |target, _, element| {
        format!("{target}.Add({element});")
      });
      end_region(ctx, indent, depth);
    }
    TypeDescriptor::Map { key, value } => {
      let n = ctx.next_depth();
      let count = count_name(ctx, root, n, depth);
      let index = format!("i{n}");
      let key_var = format!("key{n}");
      let value_var = format!("value{n}");
      let nested = format!("{indent}{NESTED_INDENT}");
      descriptor.collect_namespaces(ctx.imports_mut());

      begin_region(ctx, target, indent, depth);
      ctx.read_lines.push(format!("{indent}{target} = new {}();", descriptor.type_name()));
      ctx.read_lines.push(format!("{indent}int {count} = reader.ReadInt();"));
      ctx.read_lines.push(String::new());
      ctx.read_lines.push(format!("{indent}for (int {index} = 0; {index} < {count}; {index}++)"));
      ctx.read_lines.push(format!("{indent}{{"));
      ctx.read_lines.push(format!("{nested}{} {key_var};", key.type_name()));
      ctx.read_lines.push(format!("{nested}{} {value_var};", value.type_name()));
      ctx.read_lines.push(String::new());

      emit(ctx, key, &key_var, root, &nested, depth + 1);
      ctx.read_lines.push(String::new());
      emit(ctx, value, &value_var, root, &nested, depth + 1);
      ctx.read_lines.push(String::new());

      ctx.read_lines.push(format!("{nested}{target}.Add({key_var}, {value_var});"));
      ctx.read_lines.push(format!("{indent}}}"));
      end_region(ctx, indent, depth);
    }
    TypeDescriptor::Unsupported { .. } => {}
  }
}

/// Emits the counted loop shared by arrays and sequences. Primitive elements are read inline;
/// anything else is read into an `element{n}` temporary first. `store` renders the statement that
/// puts an element expression into `target`.
#[allow(clippy::too_many_arguments)]
fn emit_loop(
  ctx: &mut EmissionContext,
  element: &TypeDescriptor,
  target: &str,
  root: &str,
  indent: &str,
  depth: usize,
  n: usize,
  count: &str,
  store: impl Fn(&str, &str, &str) -> String,
) {
  let index = format!("i{n}");
  let nested = format!("{indent}{NESTED_INDENT}");

  ctx.read_lines.push(String::new());
  ctx.read_lines.push(format!("{indent}for (int {index} = 0; {index} < {count}; {index}++)"));
  ctx.read_lines.push(format!("{indent}{{"));

  match element {
    TypeDescriptor::Primitive(primitive) => {
      let read = format!("reader.Read{}()", primitive.suffix);
      ctx.read_lines.push(format!("{nested}{}", store(target, &index, &read)));
    }
    _ => {
      let element_var = format!("element{n}");
      ctx.read_lines.push(format!("{nested}{} {element_var};", element.type_name()));

      emit(ctx, element, &element_var, root, &nested, depth + 1);

      ctx.read_lines.push(String::new());
      ctx.read_lines.push(format!("{nested}{}", store(target, &index, &element_var)));
    }
  }

  ctx.read_lines.push(format!("{indent}}}"));
}

/// The top-level count is named after the field (`Values` reads into `valuesCount`) and lives in
/// the method scope, so it must not shadow a field or another field's count. Nested ones use the
/// depth suffix.
fn count_name(ctx: &mut EmissionContext, root: &str, n: usize, depth: usize) -> String {
  if depth == 0 {
    ctx.unique_name(&format!("{}Count", root.to_lower_camel_case()))
  } else {
    format!("count{n}")
  }
}

fn begin_region(ctx: &mut EmissionContext, target: &str, indent: &str, depth: usize) {
  if depth == 0 {
    ctx.read_lines.push(format!("{indent}#region {target}"));
  }
}

fn end_region(ctx: &mut EmissionContext, indent: &str, depth: usize) {
  if depth == 0 {
    ctx.read_lines.push(format!("{indent}#endregion"));
  }
}
