use std::collections::BTreeSet;

use itertools::Itertools;
use packetgen_parser::hl::Direction;

use crate::context::EmissionContext;
use crate::model::PacketModel;
use crate::registry::{DirectionTable, RegistryModel};

const INDENT_METHOD: &str = "        ";
const INDENT_BLOCK: &str = "            ";

pub fn unit_file_name(class_name: &str) -> String {
  format!("{}.g.cs", class_name)
}

/// Pushes `line` with `indent`, leaving blank lines empty.
fn push_line(builder: &mut String, indent: &str, line: &str) {
  if !line.is_empty() {
    builder.push_str(indent);
    builder.push_str(line);
  }
  builder.push('\n');
}

fn push_usings<'a>(builder: &mut String, namespaces: impl Iterator<Item = &'a str>) {
  let mut any = false;
  for namespace in namespaces {
    builder.push_str(&format!("using {};\n", namespace));
    any = true;
  }
  if any {
    builder.push('\n');
  }
}

/// Renders the partial class for a packet from the lines collected in `ctx`.
pub fn packet_source(model: &PacketModel, ctx: &EmissionContext, emit_equality: bool) -> String {
  let mut builder = String::new();

  push_usings(&mut builder, ctx.imports());
  builder.push_str(&format!("namespace {};\n\n", model.namespace_name));
  builder.push_str(&format!("public partial class {}\n", model.class_name));
  builder.push_str("{\n");

  builder.push_str("    public override void Write(PacketWriter writer)\n");
  builder.push_str("    {\n");
  for line in &ctx.write_lines {
    push_line(&mut builder, INDENT_METHOD, line);
  }
  builder.push_str("    }\n\n");

  builder.push_str("    public override void Read(PacketReader reader)\n");
  builder.push_str("    {\n");
  for line in &ctx.read_lines {
    push_line(&mut builder, INDENT_METHOD, line);
  }
  builder.push_str("    }\n");

  if emit_equality {
    builder.push('\n');
    builder.push_str("    public override bool Equals(object obj)\n");
    builder.push_str("    {\n");
    builder.push_str(&format!("        if (obj == null || obj is not {} other)\n", model.class_name));
    builder.push_str("            return false;\n\n");
    builder.push_str("        return ");
    builder.push_str(&ctx.equality_lines.iter().join(&format!(" &&\n{}", INDENT_BLOCK)));
    builder.push_str(";\n");
    builder.push_str("    }\n\n");

    builder.push_str("    public override int GetHashCode()\n");
    builder.push_str("    {\n");
    builder.push_str("        unchecked\n");
    builder.push_str("        {\n");
    builder.push_str("            int hash = 17;\n\n");
    for line in &ctx.hash_lines {
      push_line(&mut builder, INDENT_BLOCK, line);
    }
    builder.push('\n');
    builder.push_str("            return hash;\n");
    builder.push_str("        }\n");
    builder.push_str("    }\n");
  }

  builder.push_str("}\n");
  builder
}

fn push_table(builder: &mut String, direction: Direction, table: &DirectionTable, width: &str) {
  let (prefix, base) = match direction {
    Direction::Client => ("Client", "ClientPacket"),
    Direction::Server => ("Server", "ServerPacket"),
  };

  builder.push_str(&format!("        {}PacketInfo = new Dictionary<Type, PacketInfo<{}>>()\n", prefix, base));
  builder.push_str("        {\n");
  let entries = table.entries().iter().map(|entry| {
    let mut entry_builder = String::new();
    entry_builder.push_str("            {\n");
    entry_builder.push_str(&format!("                typeof({}),\n", entry.type_name));
    entry_builder.push_str(&format!("                new PacketInfo<{}>\n", base));
    entry_builder.push_str("                {\n");
    entry_builder.push_str(&format!("                    Opcode = {},\n", entry.opcode));
    entry_builder.push_str(&format!("                    Instance = new {}()\n", entry.type_name));
    entry_builder.push_str("                }\n");
    entry_builder.push_str("            }");
    entry_builder
  }).join(",\n");
  if !entries.is_empty() {
    builder.push_str(&entries);
    builder.push('\n');
  }
  builder.push_str("        };\n\n");
  builder.push_str(&format!(
    "        {}PacketTypes = {}PacketInfo.ToDictionary(kvp => ({})kvp.Value.Opcode, kvp => kvp.Key);\n",
    prefix, prefix, width
  ));
}

/// Renders the static registry class. Packet namespaces other than the registry's own are imported.
pub fn registry_source(model: &RegistryModel, namespace: &str, class_name: &str) -> String {
  let width = model.opcode_width.type_name();
  let packet_namespaces = model.client.entries().iter()
    .chain(model.server.entries())
    .map(|entry| entry.namespace.as_str())
    .filter(|it| *it != namespace)
    .collect::<BTreeSet<_>>();

  let mut builder = String::new();
  push_usings(&mut builder, ["System", "System.Collections.Generic", "System.Linq"].into_iter().chain(packet_namespaces));

  builder.push_str(&format!("namespace {};\n\n", namespace));
  builder.push_str(&format!("public static partial class {}\n", class_name));
  builder.push_str("{\n");
  builder.push_str("    public static readonly Dictionary<Type, PacketInfo<ClientPacket>> ClientPacketInfo;\n");
  builder.push_str(&format!("    public static readonly Dictionary<{}, Type> ClientPacketTypes;\n", width));
  builder.push_str("    public static readonly Dictionary<Type, PacketInfo<ServerPacket>> ServerPacketInfo;\n");
  builder.push_str(&format!("    public static readonly Dictionary<{}, Type> ServerPacketTypes;\n\n", width));

  builder.push_str(&format!("    static {}()\n", class_name));
  builder.push_str("    {\n");
  push_table(&mut builder, Direction::Client, &model.client, width);
  builder.push('\n');
  push_table(&mut builder, Direction::Server, &model.server, width);
  builder.push_str("    }\n");
  builder.push_str("}\n");
  builder
}

#[cfg(test)]
mod tests {
  use packetgen_parser::hl::{Packet, ResolvedType, ScalarKind};
  use test_log::test;

  use super::*;
  use crate::classify::classify;
  use crate::emit::emit_packet;
  use crate::model::FieldDescriptor;
  use crate::registry::{self, OpcodeWidth};

  fn model(fields: Vec<(&str, ResolvedType)>) -> PacketModel {
    PacketModel {
      namespace_name: "Game.Packets".to_owned(),
      class_name: "CPacketLogin".to_owned(),
      direction: Direction::Client,
      fields: fields.into_iter().map(|(name, kind)| FieldDescriptor {
        name: name.to_owned(),
        descriptor: classify(&kind, 8).unwrap(),
      }).collect(),
      excluded_fields: Vec::new(),
      has_manual_read_write: false,
    }
  }

  fn render(model: &PacketModel, emit_equality: bool) -> String {
    let mut ctx = EmissionContext::new();
    emit_packet(&mut ctx, model, emit_equality);
    packet_source(model, &ctx, emit_equality)
  }

  #[test]
  fn file_name_has_generated_suffix() {
    assert_eq!(unit_file_name("CPacketLogin"), "CPacketLogin.g.cs");
  }

  #[test]
  fn renders_packet_class() {
    let model = model(vec![
      ("Id", ResolvedType::Scalar(ScalarKind::I32)),
      ("Name", ResolvedType::Scalar(ScalarKind::String)),
    ]);

    assert_eq!(render(&model, true), "\
namespace Game.Packets;

public partial class CPacketLogin
{
    public override void Write(PacketWriter writer)
    {
        writer.Write(Id);
        writer.Write(Name);
    }

    public override void Read(PacketReader reader)
    {
        Id = reader.ReadInt();
        Name = reader.ReadString();
    }

    public override bool Equals(object obj)
    {
        if (obj == null || obj is not CPacketLogin other)
            return false;

        return Id.Equals(other.Id) &&
            Equals(Name, other.Name);
    }

    public override int GetHashCode()
    {
        unchecked
        {
            int hash = 17;

            hash = hash * 397 ^ Id.GetHashCode();
            hash = hash * 397 ^ (Name?.GetHashCode() ?? 0);

            return hash;
        }
    }
}
");
  }

  #[test]
  fn renders_usings_and_skips_equality() {
    let model = model(vec![("Values", ResolvedType::List(Box::new(ResolvedType::Scalar(ScalarKind::I32))))]);
    let source = render(&model, false);

    assert!(source.starts_with("using System.Collections.Generic;\n\nnamespace Game.Packets;\n"));
    assert!(source.contains("        int valuesCount = reader.ReadInt();\n\n        for (int i0 = 0; i0 < valuesCount; i0++)\n"));
    assert!(!source.contains("Equals"));
    assert!(source.lines().all(|line| line == line.trim_end()));
  }

  #[test]
  fn rendering_is_deterministic() {
    let model = model(vec![
      ("Position", ResolvedType::Scalar(ScalarKind::Vector2)),
      ("Scores", ResolvedType::Dictionary(
        Box::new(ResolvedType::Scalar(ScalarKind::String)),
        Box::new(ResolvedType::List(Box::new(ResolvedType::Scalar(ScalarKind::F32)))),
      )),
    ]);

    let first = render(&model, true);
    assert_eq!(first, render(&model, true));
    assert!(first.starts_with("using Godot;\nusing System.Collections.Generic;\n\n"));
  }

  #[test]
  fn renders_registry() {
    let mut login = Packet {
      namespace: "Game.Packets".to_owned(),
      name: "CPacketLogin".to_owned(),
      direction: Direction::Client,
      members: Vec::new(),
      comments: Vec::new(),
    };
    let pong = Packet { name: "SPacketPong".to_owned(), direction: Direction::Server, ..login.clone() };
    login.namespace = "Game.Auth".to_owned();

    let model = registry::build(&[&login], &[&pong], OpcodeWidth::U16).unwrap();
    let source = registry_source(&model, "Game.Packets", "PacketRegistry");

    assert_eq!(source, "\
using System;
using System.Collections.Generic;
using System.Linq;
using Game.Auth;

namespace Game.Packets;

public static partial class PacketRegistry
{
    public static readonly Dictionary<Type, PacketInfo<ClientPacket>> ClientPacketInfo;
    public static readonly Dictionary<ushort, Type> ClientPacketTypes;
    public static readonly Dictionary<Type, PacketInfo<ServerPacket>> ServerPacketInfo;
    public static readonly Dictionary<ushort, Type> ServerPacketTypes;

    static PacketRegistry()
    {
        ClientPacketInfo = new Dictionary<Type, PacketInfo<ClientPacket>>()
        {
            {
                typeof(CPacketLogin),
                new PacketInfo<ClientPacket>
                {
                    Opcode = 0,
                    Instance = new CPacketLogin()
                }
            }
        };

        ClientPacketTypes = ClientPacketInfo.ToDictionary(kvp => (ushort)kvp.Value.Opcode, kvp => kvp.Key);

        ServerPacketInfo = new Dictionary<Type, PacketInfo<ServerPacket>>()
        {
            {
                typeof(SPacketPong),
                new PacketInfo<ServerPacket>
                {
                    Opcode = 0,
                    Instance = new SPacketPong()
                }
            }
        };

        ServerPacketTypes = ServerPacketInfo.ToDictionary(kvp => (ushort)kvp.Value.Opcode, kvp => kvp.Key);
    }
}
");
  }
}
