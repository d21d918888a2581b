pub mod span;
pub mod hl;

use std::collections::HashMap;
use std::{iter, slice::Iter};

use itertools::{Itertools, MultiPeek, PeekingNext};
use once_cell::sync::Lazy;
use regex::Regex;
use span::{Positioned, Span};
use thiserror::Error;
use tracing::{debug, trace};

use crate::hl::{Direction, Meta, OpcodeWidthDecl, ResolvedType, ScalarKind};

/// Namespace used when a schema file carries no `meta namespace`.
pub const DEFAULT_NAMESPACE: &str = "Framework.Netcode";

const EXCLUDE_ATTRIBUTE: &str = "NetExclude";
const REGISTRY_ATTRIBUTE: &str = "PacketRegistry";
const CLIENT_BASE: &str = "ClientPacket";
const SERVER_BASE: &str = "ServerPacket";

static NAMESPACE_PATTERN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("namespace pattern is valid")
});

static SCALAR_TYPES: Lazy<HashMap<&'static str, ScalarKind>> = Lazy::new(|| {
  HashMap::from([
    ("byte", ScalarKind::U8),
    ("sbyte", ScalarKind::I8),
    ("short", ScalarKind::I16),
    ("ushort", ScalarKind::U16),
    ("int", ScalarKind::I32),
    ("uint", ScalarKind::U32),
    ("long", ScalarKind::I64),
    ("ulong", ScalarKind::U64),
    ("bool", ScalarKind::Bool),
    ("char", ScalarKind::Char),
    ("string", ScalarKind::String),
    ("float", ScalarKind::F32),
    ("double", ScalarKind::F64),
    ("Vector2", ScalarKind::Vector2),
    ("Godot.Vector2", ScalarKind::Vector2),
    ("Vector3", ScalarKind::Vector3),
    ("Godot.Vector3", ScalarKind::Vector3),
  ])
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
  #[error("unrecognized character {ch:?} at {span}")]
  UnrecognizedCharacter { ch: char, span: Span },

  #[error("unterminated string starting at {span}")]
  UnterminatedString { span: Span },

  #[error("unexpected token {found} at {span}, expected {expected}")]
  UnexpectedToken { found: String, expected: String, span: Span },

  #[error("unexpected end of input, expected {expected}")]
  UnexpectedEof { expected: String },

  #[error("invalid namespace {value:?} at {span}")]
  InvalidNamespace { value: String, span: Span },
}

impl SyntaxError {
  fn unexpected(token: &Positioned<Token>, expected: &str) -> Self {
    SyntaxError::UnexpectedToken {
      found: format!("{:?}", token.value),
      expected: expected.to_owned(),
      span: token.span,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delimiter {
  BraceOpen,
  BraceClose,
  ParenOpen,
  ParenClose,
  BracketOpen,
  BracketClose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comment {
  LineDoc(String)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
  Meta,
  Class,
  Fn,

  Ident(String),
  String(String),
  Delimiter(Delimiter),
  Eq,
  Colon,
  Semi,
  Comma,
  Gt,
  Lt,
  Dot,

  Comment(Comment),
}

pub type Tokens<'a> = MultiPeek<Iter<'a, Positioned<Token>>>;

fn peek_char<I: Iterator<Item = (usize, char)>>(iter: &mut MultiPeek<I>) -> Option<char> {
  let ch = iter.peek().map(|&(_, ch)| ch);
  iter.reset_peek();
  ch
}

pub fn tokenizer(input: &str) -> Result<Vec<Positioned<Token>>, SyntaxError> {
  let mut tokens: Vec<Positioned<Token>> = Vec::new();
  let mut iter = itertools::multipeek(input.chars().enumerate());

  let mut line: usize = 0;
  let mut column: usize = 0;

  while let Some((pos, ch)) = iter.next() {
    let span = Span { start: pos, end: pos, line, column };

    if ch == '\n' {
      line += 1;
      column = 0;
      continue;
    }

    if ch == '/' && peek_char(&mut iter) == Some('/') {
      let body = iter::from_fn(|| iter.peeking_next(|(_, c)| *c != '\n').map(|(_, c)| c))
        .collect::<String>();
      if let Some(doc) = body.strip_prefix("//") {
        let span = Span { end: pos + body.chars().count(), ..span };
        tokens.push(Positioned::new(Token::Comment(Comment::LineDoc(doc.trim().to_owned())), span));
      }
      column += body.chars().count() + 1;
      continue;
    }

    let mut width = 1;
    match ch {
      ch if ch.is_whitespace() => {}
      '"' => {
        let mut string = String::new();
        loop {
          match iter.next() {
            Some((_, '"')) => break,
            Some((_, '\n')) | None => return Err(SyntaxError::UnterminatedString { span }),
            Some((_, ch)) => string.push(ch),
          }
        }
        width = string.chars().count() + 2;
        let span = Span { end: pos + width - 1, ..span };
        tokens.push(Positioned::new(Token::String(string), span));
      }
      '=' => tokens.push(span.wrap(Token::Eq)),
      '{' => tokens.push(span.wrap(Token::Delimiter(Delimiter::BraceOpen))),
      '}' => tokens.push(span.wrap(Token::Delimiter(Delimiter::BraceClose))),
      '(' => tokens.push(span.wrap(Token::Delimiter(Delimiter::ParenOpen))),
      ')' => tokens.push(span.wrap(Token::Delimiter(Delimiter::ParenClose))),
      '[' => tokens.push(span.wrap(Token::Delimiter(Delimiter::BracketOpen))),
      ']' => tokens.push(span.wrap(Token::Delimiter(Delimiter::BracketClose))),
      ':' => tokens.push(span.wrap(Token::Colon)),
      ';' => tokens.push(span.wrap(Token::Semi)),
      ',' => tokens.push(span.wrap(Token::Comma)),
      '>' => tokens.push(span.wrap(Token::Gt)),
      '<' => tokens.push(span.wrap(Token::Lt)),
      '.' => tokens.push(span.wrap(Token::Dot)),
      ch if ch.is_ascii_alphabetic() || ch == '_' => {
        let s = iter::once(ch)
          .chain(iter::from_fn(|| {
            iter.by_ref().peeking_next(|(_, s)| s.is_ascii_alphanumeric() || *s == '_').map(|(_, c)| c)
          }))
          .collect::<String>();

        width = s.len();
        let span = Span { end: pos + s.len() - 1, ..span };
        let token = match s.as_str() {
          "meta" => Token::Meta,
          "class" => Token::Class,
          "fn" => Token::Fn,
          _ => Token::Ident(s),
        };
        tokens.push(span.wrap(token));
      }
      _ => return Err(SyntaxError::UnrecognizedCharacter { ch, span }),
    }

    column += width;
  }

  Ok(tokens)
}

#[derive(Debug)]
pub struct Program {
  pub body: Vec<ProgramItem>,
}

#[derive(Debug)]
pub enum ProgramItem {
  Meta(MetaDeclaration),
  Class(ClassDeclaration),
}

#[derive(Debug, Clone)]
pub struct CommentLit(pub String);

#[derive(Debug, Clone)]
pub struct Identifier(pub String);

#[derive(Debug)]
pub struct StringLit(pub String);

#[derive(Debug)]
pub struct MetaDeclaration {
  pub key: Positioned<Identifier>,
  pub value: Positioned<StringLit>,
}

#[derive(Debug)]
pub struct ClassDeclaration {
  pub name: Positioned<Identifier>,
  pub base: Option<Type>,
  pub attributes: Vec<AttributeDeclaration>,
  pub members: Vec<MemberDeclaration>,
  pub comments: Vec<CommentLit>,
}

/// `[Name]` or `[Name(arg, ...)]`. `args` is `None` when no parentheses were written.
#[derive(Debug)]
pub struct AttributeDeclaration {
  pub name: Positioned<Identifier>,
  pub args: Option<Vec<Type>>,
}

#[derive(Debug)]
pub enum MemberDeclaration {
  Field(FieldDeclaration),
  Method(MethodDeclaration),
}

#[derive(Debug)]
pub struct FieldDeclaration {
  pub name: Positioned<Identifier>,
  pub kind: Type,
  pub attributes: Vec<AttributeDeclaration>,
  pub comments: Vec<CommentLit>,
}

#[derive(Debug)]
pub struct MethodDeclaration {
  pub name: Positioned<Identifier>,
  pub comments: Vec<CommentLit>,
}

#[derive(Debug)]
pub enum Type {
  /// Possibly qualified name, segments joined with `.`.
  Ident {
    ty: Positioned<Identifier>,
  },
  Generic {
    ty: Positioned<Identifier>,
    params: Vec<Type>,
  },
  Array {
    element: Box<Type>,
  },
}

fn peek_token<'a>(input: &mut Tokens<'a>) -> Option<&'a Positioned<Token>> {
  input.reset_peek();
  let token = input.peek().copied();
  input.reset_peek();
  token
}

macro_rules! next_token {
  ($input:expr, $expected:expr) => {
    match $input.next() {
      Some(token) => token,
      None => return Err(SyntaxError::UnexpectedEof { expected: $expected.to_owned() }),
    }
  };
}

macro_rules! consume_token {
  ($input:expr, $token:pat) => {{
    let token = next_token!($input, stringify!($token));
    match &token.value {
      $token => token,
      _ => return Err(SyntaxError::unexpected(token, stringify!($token))),
    }
  }};
}

macro_rules! consume_ident {
  ($input:expr) => {{
    let token = next_token!($input, "Token::Ident");
    match &token.value {
      Token::Ident(value) => token.span.wrap(Identifier(value.to_owned())),
      _ => return Err(SyntaxError::unexpected(token, "Token::Ident")),
    }
  }};
}

pub fn parse_program(input: &mut Tokens) -> Result<Program, SyntaxError> {
  let mut body = Vec::new();
  let mut comments = Vec::new();
  let mut attributes = Vec::new();
  while let Some(token) = peek_token(input) {
    match &token.value {
      Token::Comment(Comment::LineDoc(text)) => {
        trace!("comment {:?}", text);
        comments.push(CommentLit(text.to_owned()));
        input.next();
      }
      Token::Meta if !attributes.is_empty() => return Err(SyntaxError::unexpected(token, "Class after attributes")),
      Token::Meta => {
        body.push(ProgramItem::Meta(parse_meta(input)?));
        comments.clear();
      }
      Token::Delimiter(Delimiter::BracketOpen) => {
        attributes.extend(parse_attributes(input)?);
      }
      Token::Class => {
        let attributes = std::mem::take(&mut attributes);
        body.push(ProgramItem::Class(parse_class(input, attributes, &comments)?));
        comments.clear();
      }
      _ => return Err(SyntaxError::unexpected(token, "Meta, Class or attribute")),
    }
  }

  if !attributes.is_empty() {
    return Err(SyntaxError::UnexpectedEof { expected: "Class after attributes".to_owned() });
  }

  Ok(Program {
    body
  })
}

pub fn parse_meta(input: &mut Tokens) -> Result<MetaDeclaration, SyntaxError> {
  consume_token!(input, Token::Meta);
  let key = consume_ident!(input);
  consume_token!(input, Token::Eq);

  let token = next_token!(input, "Token::String");
  let value = match &token.value {
    Token::String(value) => token.span.wrap(StringLit(value.to_owned())),
    _ => return Err(SyntaxError::unexpected(token, "Token::String")),
  };

  consume_token!(input, Token::Semi);

  Ok(MetaDeclaration {
    key,
    value,
  })
}

/// Parses zero or more `[...]` groups; each group may hold comma separated attributes.
pub fn parse_attributes(input: &mut Tokens) -> Result<Vec<AttributeDeclaration>, SyntaxError> {
  let mut attributes = Vec::new();
  while let Some(Token::Delimiter(Delimiter::BracketOpen)) = peek_token(input).map(|it| &it.value) {
    input.next();
    loop {
      let name = parse_qualified_ident(input)?;
      let args = match peek_token(input).map(|it| &it.value) {
        Some(Token::Delimiter(Delimiter::ParenOpen)) => {
          input.next();
          Some(parse_type_list(input, Delimiter::ParenClose)?)
        }
        _ => None,
      };
      attributes.push(AttributeDeclaration { name, args });

      let token = next_token!(input, "Comma or BracketClose");
      match &token.value {
        Token::Comma => continue,
        Token::Delimiter(Delimiter::BracketClose) => break,
        _ => return Err(SyntaxError::unexpected(token, "Comma or BracketClose")),
      }
    }
  }

  Ok(attributes)
}

pub fn parse_class(input: &mut Tokens, attributes: Vec<AttributeDeclaration>, comments: &[CommentLit]) -> Result<ClassDeclaration, SyntaxError> {
  consume_token!(input, Token::Class);
  let name = consume_ident!(input);

  let base = match peek_token(input).map(|it| &it.value) {
    Some(Token::Colon) => {
      input.next();
      Some(parse_type(input)?)
    }
    _ => None,
  };

  consume_token!(input, Token::Delimiter(Delimiter::BraceOpen));

  let mut members = Vec::new();
  let mut member_comments = Vec::new();
  loop {
    let token = match peek_token(input) {
      Some(token) => token,
      None => return Err(SyntaxError::UnexpectedEof { expected: "BraceClose".to_owned() }),
    };
    trace!("class body: {:?}", token.value);

    match &token.value {
      Token::Comment(Comment::LineDoc(text)) => {
        member_comments.push(CommentLit(text.to_owned()));
        input.next();
      }
      Token::Delimiter(Delimiter::BraceClose) => break,
      _ => {
        let member_attributes = parse_attributes(input)?;
        members.push(parse_member(input, member_attributes, &member_comments)?);
        member_comments.clear();
      }
    }
  }

  consume_token!(input, Token::Delimiter(Delimiter::BraceClose));

  Ok(ClassDeclaration {
    name,
    base,
    attributes,
    members,
    comments: comments.to_vec(),
  })
}

pub fn parse_member(input: &mut Tokens, attributes: Vec<AttributeDeclaration>, comments: &[CommentLit]) -> Result<MemberDeclaration, SyntaxError> {
  let token = match peek_token(input) {
    Some(token) => token,
    None => return Err(SyntaxError::UnexpectedEof { expected: "Fn or Ident".to_owned() }),
  };

  match &token.value {
    Token::Fn => {
      input.next();
      let name = consume_ident!(input);
      consume_token!(input, Token::Semi);
      Ok(MemberDeclaration::Method(MethodDeclaration {
        name,
        comments: comments.to_vec(),
      }))
    }
    Token::Ident(_) => {
      let name = consume_ident!(input);
      consume_token!(input, Token::Colon);
      let kind = parse_type(input)?;
      consume_token!(input, Token::Semi);
      Ok(MemberDeclaration::Field(FieldDeclaration {
        name,
        kind,
        attributes,
        comments: comments.to_vec(),
      }))
    }
    _ => Err(SyntaxError::unexpected(token, "Fn or Ident")),
  }
}

fn parse_qualified_ident(input: &mut Tokens) -> Result<Positioned<Identifier>, SyntaxError> {
  let first = consume_ident!(input);
  let mut segments = vec![first.value.0.to_owned()];
  while let Some(Token::Dot) = peek_token(input).map(|it| &it.value) {
    input.next();
    segments.push(consume_ident!(input).value.0);
  }

  Ok(first.wrap(Identifier(segments.join("."))))
}

fn parse_type_list(input: &mut Tokens, close: Delimiter) -> Result<Vec<Type>, SyntaxError> {
  let mut params = Vec::new();
  loop {
    if let Some(Token::Delimiter(delimiter)) = peek_token(input).map(|it| &it.value) {
      if *delimiter == close {
        input.next();
        return Ok(params);
      }
    }

    params.push(parse_type(input)?);

    let token = next_token!(input, "Comma or closing delimiter");
    match &token.value {
      Token::Comma => {}
      Token::Delimiter(delimiter) if *delimiter == close => return Ok(params),
      _ => return Err(SyntaxError::unexpected(token, "Comma or closing delimiter")),
    }
  }
}

fn parse_generic_params(input: &mut Tokens) -> Result<Vec<Type>, SyntaxError> {
  consume_token!(input, Token::Lt);
  let mut params = Vec::new();
  loop {
    params.push(parse_type(input)?);

    let token = next_token!(input, "Comma or Gt");
    match &token.value {
      Token::Comma => {}
      Token::Gt => return Ok(params),
      _ => return Err(SyntaxError::unexpected(token, "Comma or Gt")),
    }
  }
}

pub fn parse_type(input: &mut Tokens) -> Result<Type, SyntaxError> {
  let ty = parse_qualified_ident(input)?;

  let mut kind = match peek_token(input).map(|it| &it.value) {
    Some(Token::Lt) => {
      let params = parse_generic_params(input)?;
      trace!("parsed generic {} with {} params", ty.value.0, params.len());
      Type::Generic { ty, params }
    }
    _ => Type::Ident { ty },
  };

  while let Some(Token::Delimiter(Delimiter::BracketOpen)) = peek_token(input).map(|it| &it.value) {
    input.next();
    consume_token!(input, Token::Delimiter(Delimiter::BracketClose));
    kind = Type::Array { element: Box::new(kind) };
  }

  Ok(kind)
}

pub fn type_to_hl(kind: &Type) -> String {
  match kind {
    Type::Ident { ty } => ty.value.0.to_owned(),
    Type::Generic { ty, params } => {
      let params = params.iter().map(type_to_hl).join(", ");
      format!("{}<{}>", ty.value.0, params)
    }
    Type::Array { element } => format!("{}[]", type_to_hl(element)),
  }
}

/// Resolves type syntax into the shape the generator classifies. This is the only place where type
/// names are compared as strings.
pub fn resolve_type(kind: &Type) -> ResolvedType {
  match kind {
    Type::Ident { ty } => match SCALAR_TYPES.get(ty.value.0.as_str()) {
      Some(scalar) => ResolvedType::Scalar(*scalar),
      None => ResolvedType::Named(ty.value.0.to_owned()),
    },
    Type::Array { element } => match &**element {
      Type::Ident { ty } if ty.value.0 == "byte" => ResolvedType::Scalar(ScalarKind::Bytes),
      element => ResolvedType::Array(Box::new(resolve_type(element))),
    },
    Type::Generic { ty, params } => match (simple_name(&ty.value.0), params.as_slice()) {
      ("List", [element]) => ResolvedType::List(Box::new(resolve_type(element))),
      ("Dictionary", [key, value]) => ResolvedType::Dictionary(Box::new(resolve_type(key)), Box::new(resolve_type(value))),
      _ => ResolvedType::Named(type_to_hl(kind)),
    },
  }
}

fn simple_name(name: &str) -> &str {
  name.rsplit('.').next().unwrap_or(name)
}

fn is_attribute(attribute: &AttributeDeclaration, name: &str) -> bool {
  let simple = simple_name(&attribute.name.value.0);
  simple == name || simple.strip_suffix("Attribute") == Some(name)
}

fn resolve_direction(base: &Type) -> Option<Direction> {
  match base {
    Type::Ident { ty } => match simple_name(&ty.value.0) {
      CLIENT_BASE => Some(Direction::Client),
      SERVER_BASE => Some(Direction::Server),
      _ => None,
    },
    _ => None,
  }
}

fn resolve_opcode_width(attribute: &AttributeDeclaration) -> OpcodeWidthDecl {
  match attribute.args.as_deref() {
    None => OpcodeWidthDecl::Default,
    Some([width]) => OpcodeWidthDecl::Declared(resolve_type(width)),
    Some(args) => OpcodeWidthDecl::Malformed(format!("({})", args.iter().map(type_to_hl).join(", "))),
  }
}

pub fn field_to_definition(input: &FieldDeclaration) -> hl::Field {
  hl::Field {
    name: input.name.value.0.to_owned(),
    kind: resolve_type(&input.kind),
    excluded: input.attributes.iter().any(|it| is_attribute(it, EXCLUDE_ATTRIBUTE)),
    comments: convert_comments(&input.comments),
  }
}

pub fn class_to_packet(input: &ClassDeclaration, namespace: &str) -> Option<hl::Packet> {
  let direction = input.base.as_ref().and_then(resolve_direction)?;

  let members = input.members.iter().map(|member| match member {
    MemberDeclaration::Field(field) => hl::Member::Field(field_to_definition(field)),
    MemberDeclaration::Method(method) => hl::Member::Method(method.name.value.0.to_owned()),
  }).collect_vec();

  Some(hl::Packet {
    namespace: namespace.to_owned(),
    name: input.name.value.0.to_owned(),
    direction,
    members,
    comments: convert_comments(&input.comments),
  })
}

pub fn class_to_registry(input: &ClassDeclaration, namespace: &str) -> Option<hl::Registry> {
  let attribute = input.attributes.iter().find(|it| is_attribute(it, REGISTRY_ATTRIBUTE))?;

  Some(hl::Registry {
    namespace: namespace.to_owned(),
    name: input.name.value.0.to_owned(),
    opcode_width: resolve_opcode_width(attribute),
  })
}

/// Converts a parsed file into packet and registry definitions, in declaration order.
pub fn program_to_definitions(input: &Program) -> Result<hl::Definitions, SyntaxError> {
  let meta = convert_meta(input.body.iter().filter_map(|item| match item {
    ProgramItem::Meta(meta) => Some(meta),
    _ => None,
  }));

  let namespace_decl = input.body.iter().find_map(|item| match item {
    ProgramItem::Meta(meta) if meta.key.value.0 == "namespace" => Some(&meta.value),
    _ => None,
  });
  let namespace = match namespace_decl {
    Some(value) if NAMESPACE_PATTERN.is_match(&value.value.0) => value.value.0.to_owned(),
    Some(value) => return Err(SyntaxError::InvalidNamespace { value: value.value.0.to_owned(), span: value.span }),
    None => DEFAULT_NAMESPACE.to_owned(),
  };

  let mut definitions = hl::Definitions {
    meta,
    packets: Vec::new(),
    registries: Vec::new(),
  };
  for item in &input.body {
    let ProgramItem::Class(class) = item else { continue };

    if let Some(registry) = class_to_registry(class, &namespace) {
      definitions.registries.push(registry);
    }
    match class_to_packet(class, &namespace) {
      Some(packet) => definitions.packets.push(packet),
      None => debug!("class {} is not a packet", class.name.value.0),
    }
  }

  Ok(definitions)
}

/// Tokenizes, parses and resolves one schema file.
pub fn parse_definitions(content: &str) -> Result<hl::Definitions, SyntaxError> {
  let tokens = tokenizer(content)?;
  let mut iter = itertools::multipeek(&tokens);
  let program = parse_program(&mut iter)?;
  program_to_definitions(&program)
}

pub fn convert_comments(comments: &[CommentLit]) -> Vec<String> {
  comments.iter().map(|it| it.0.to_owned()).collect_vec()
}

pub fn convert_meta<'a>(meta: impl Iterator<Item = &'a MetaDeclaration>) -> Vec<Meta> {
  meta.map(|it| {
    Meta {
      key: it.key.value.0.to_owned(),
      value: it.value.value.0.to_owned(),
    }
  }).collect_vec()
}

#[cfg(test)]
mod tests {
  use test_log::test;
  use tracing::{debug, info};

  use super::*;
  use crate::hl::Member;

  fn ident(name: &str) -> Type {
    Type::Ident { ty: Positioned::identity(Identifier(name.to_owned())) }
  }

  #[test]
  fn it_works() {
    let tokens = tokenizer(r#"
      meta namespace = "Game.Packets";

      /// Player movement
      /// sent every tick
      class CPacketMove : ClientPacket {
        /// Where the player is
        Position: Godot.Vector2;
        Values: List<int>;
        Grid: int[][];
        Scores: Dictionary<string, List<int>>;
        [NetExclude] Cached: int;
        // not a doc comment
      }

      class SPacketHello : ServerPacket {
        Motd: string;
        fn Write;
      }

      [PacketRegistry(ushort)]
      class PacketRegistry {}
    "#).unwrap();
    for token in &tokens {
      debug!("{:?}", token);
    }

    let mut iter = itertools::multipeek(&tokens);
    let ast = parse_program(&mut iter).unwrap();
    info!("{:?}", ast);
    assert_eq!(ast.body.len(), 4);

    let definitions = program_to_definitions(&ast).unwrap();
    assert_eq!(definitions.packets.len(), 2);
    assert_eq!(definitions.registries.len(), 1);

    let movement = &definitions.packets[0];
    assert_eq!(movement.namespace, "Game.Packets");
    assert_eq!(movement.name, "CPacketMove");
    assert_eq!(movement.direction, Direction::Client);
    assert_eq!(movement.comments, vec!["Player movement", "sent every tick"]);

    let fields = movement.members.iter().filter_map(|it| match it {
      Member::Field(field) => Some(field),
      _ => None,
    }).collect_vec();
    assert_eq!(fields.len(), 5);
    assert_eq!(fields[0].kind, ResolvedType::Scalar(ScalarKind::Vector2));
    assert_eq!(fields[0].comments, vec!["Where the player is"]);
    assert_eq!(fields[1].kind, ResolvedType::List(Box::new(ResolvedType::Scalar(ScalarKind::I32))));
    assert_eq!(fields[2].kind, ResolvedType::Array(Box::new(ResolvedType::Array(Box::new(ResolvedType::Scalar(ScalarKind::I32))))));
    assert!(matches!(fields[3].kind, ResolvedType::Dictionary(_, _)));
    assert!(fields[4].excluded);
    assert!(!fields[3].excluded);

    let hello = &definitions.packets[1];
    assert_eq!(hello.direction, Direction::Server);
    assert!(matches!(&hello.members[1], Member::Method(name) if name == "Write"));

    let registry = &definitions.registries[0];
    assert_eq!(registry.name, "PacketRegistry");
    assert_eq!(registry.opcode_width, OpcodeWidthDecl::Declared(ResolvedType::Scalar(ScalarKind::U16)));
  }

  #[test]
  fn type_to_string() {
    assert_eq!(type_to_hl(&ident("int")), "int");
    assert_eq!(type_to_hl(&Type::Array { element: Box::new(ident("int")) }), "int[]");
    assert_eq!(type_to_hl(&Type::Generic {
      ty: Positioned::identity(Identifier("Dictionary".to_owned())),
      params: vec![
        ident("string"),
        Type::Generic {
          ty: Positioned::identity(Identifier("List".to_owned())),
          params: vec![ident("Foo")],
        },
      ],
    }), "Dictionary<string, List<Foo>>");
    assert_eq!(type_to_hl(&Type::Array {
      element: Box::new(Type::Generic {
        ty: Positioned::identity(Identifier("List".to_owned())),
        params: vec![ident("int")],
      }),
    }), "List<int>[]");
  }

  #[test]
  fn resolves_byte_array_as_raw_bytes() {
    let bytes = Type::Array { element: Box::new(ident("byte")) };
    assert_eq!(resolve_type(&bytes), ResolvedType::Scalar(ScalarKind::Bytes));

    let jagged = Type::Array { element: Box::new(bytes) };
    assert_eq!(resolve_type(&jagged), ResolvedType::Array(Box::new(ResolvedType::Scalar(ScalarKind::Bytes))));
  }

  #[test]
  fn resolves_unknown_generics_as_named() {
    let set = Type::Generic {
      ty: Positioned::identity(Identifier("HashSet".to_owned())),
      params: vec![ident("int")],
    };
    assert_eq!(resolve_type(&set), ResolvedType::Named("HashSet<int>".to_owned()));

    let list_with_two = Type::Generic {
      ty: Positioned::identity(Identifier("List".to_owned())),
      params: vec![ident("int"), ident("int")],
    };
    assert_eq!(resolve_type(&list_with_two), ResolvedType::Named("List<int, int>".to_owned()));
  }

  #[test]
  fn registry_width_declarations() {
    let definitions = parse_definitions(r#"
      [PacketRegistry] class A {}
      [PacketRegistry()] class B {}
      [PacketRegistryAttribute(byte, int)] class C {}
    "#).unwrap();

    assert_eq!(definitions.registries[0].opcode_width, OpcodeWidthDecl::Default);
    assert_eq!(definitions.registries[1].opcode_width, OpcodeWidthDecl::Malformed("()".to_owned()));
    assert_eq!(definitions.registries[2].opcode_width, OpcodeWidthDecl::Malformed("(byte, int)".to_owned()));
  }

  #[test]
  fn non_packet_classes_are_skipped() {
    let definitions = parse_definitions("class Helper : Object { Value: int; }").unwrap();
    assert!(definitions.packets.is_empty());
    assert!(definitions.registries.is_empty());
  }

  #[test]
  fn default_namespace_is_used_without_meta() {
    let definitions = parse_definitions("class CPing : ClientPacket { Time: long; }").unwrap();
    assert_eq!(definitions.packets[0].namespace, DEFAULT_NAMESPACE);
  }

  #[test]
  fn invalid_namespace_is_rejected() {
    let error = parse_definitions(r#"meta namespace = "Game..Packets";"#).unwrap_err();
    assert!(matches!(error, SyntaxError::InvalidNamespace { .. }));
  }

  #[test]
  fn reports_position_of_unexpected_token() {
    let error = parse_definitions("class CPing : ClientPacket {\n  Time long;\n}").unwrap_err();
    match error {
      SyntaxError::UnexpectedToken { span, .. } => {
        assert_eq!(span.line, 1);
        assert_eq!(span.column, 7);
      }
      other => panic!("unexpected error {:?}", other),
    }
  }

  #[test]
  fn reports_unterminated_string() {
    let error = tokenizer("meta namespace = \"Game;\n").unwrap_err();
    assert!(matches!(error, SyntaxError::UnterminatedString { .. }));
  }

  #[test]
  fn reports_eof_inside_class() {
    let error = parse_definitions("class CPing : ClientPacket {").unwrap_err();
    assert!(matches!(error, SyntaxError::UnexpectedEof { .. }));
  }

  #[test]
  fn attributes_must_be_followed_by_a_class() {
    let error = parse_definitions(r#"
      [PacketRegistry]
      meta namespace = "Game.Netcode";
      class PacketRegistry {}
    "#).unwrap_err();
    match error {
      SyntaxError::UnexpectedToken { found, expected, span } => {
        assert_eq!(found, "Meta");
        assert_eq!(expected, "Class after attributes");
        assert_eq!(span.line, 2);
      }
      other => panic!("unexpected error {:?}", other),
    }

    let error = parse_definitions("class CPing : ClientPacket {}\n[PacketRegistry]").unwrap_err();
    assert!(matches!(error, SyntaxError::UnexpectedEof { expected } if expected == "Class after attributes"));
  }

  #[test]
  fn rejects_unknown_characters() {
    let error = tokenizer("class A { Value: int?; }").unwrap_err();
    assert_eq!(error, SyntaxError::UnrecognizedCharacter { ch: '?', span: Span { start: 20, end: 20, line: 0, column: 20 } });
  }
}
