use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use packetgen_generator::config::{GeneratorConfig, UnsupportedPolicy, DEFAULT_MAX_NESTING_DEPTH};
use packetgen_generator::diagnostics::{Diagnostics, Severity};
use packetgen_generator::{generate_all, GeneratedUnit};
use packetgen_parser::hl::Definitions;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

const SCHEMA_EXTENSION: &str = "packet";

#[derive(Parser, Debug)]
#[command(version)]
struct Args {
  #[command(subcommand)]
  command: Actions,
}

#[derive(Subcommand, Debug)]
enum Actions {
  /// Generate `.g.cs` units for every schema under `input`.
  Generate {
    input: PathBuf,

    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    options: GeneratorOptions,
  },
  /// Parse and analyze without writing anything.
  Check {
    input: PathBuf,

    #[command(flatten)]
    options: GeneratorOptions,
  },
}

#[derive(ClapArgs, Debug)]
struct GeneratorOptions {
  #[arg(long, default_value_t = DEFAULT_MAX_NESTING_DEPTH)]
  max_nesting_depth: usize,

  /// Do not generate `Equals` and `GetHashCode`.
  #[arg(long)]
  no_equality: bool,

  #[arg(long, value_enum, default_value_t = UnsupportedPolicy::Skip)]
  unsupported: UnsupportedPolicy,
}

impl From<&GeneratorOptions> for GeneratorConfig {
  fn from(options: &GeneratorOptions) -> Self {
    GeneratorConfig {
      max_nesting_depth: options.max_nesting_depth,
      emit_equality: !options.no_equality,
      unsupported: options.unsupported,
    }
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();
  match &args.command {
    Actions::Generate { input, output, options } => {
      let units = run(input, &options.into())?;
      write_units(output, &units)?;
      info!("wrote {} units into {:?}", units.len(), output);
    }
    Actions::Check { input, options } => {
      let units = run(input, &options.into())?;
      info!("{} units would be generated", units.len());
    }
  }

  Ok(())
}

fn run(input: &Path, config: &GeneratorConfig) -> Result<Vec<GeneratedUnit>> {
  let definitions = discover(input)?;
  info!("discovered {} packets and {} registries", definitions.packets.len(), definitions.registries.len());

  let mut diagnostics = Diagnostics::new();
  let result = generate_all(&definitions, config, &mut diagnostics);
  report(&diagnostics);

  let units = result?;
  if diagnostics.has_errors() {
    bail!("generation finished with {} errors", diagnostics.count(Severity::Error));
  }
  Ok(units)
}

/// Parses every schema under `input_root` in file name order.
fn discover(input_root: &Path) -> Result<Definitions> {
  let mut definitions = Definitions::default();
  for entry in WalkDir::new(input_root).sort_by_file_name() {
    let entry = entry.with_context(|| format!("failed to walk {:?}", input_root))?;
    let path = entry.path();
    let relative_path = path.strip_prefix(input_root).unwrap_or(path);
    if is_path_hidden(relative_path) {
      continue;
    }

    if !entry.file_type().is_file() || !path.extension().is_some_and(|it| it == SCHEMA_EXTENSION) {
      continue;
    }

    debug!("parsing {:?}", path);
    let content = fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
    let parsed = packetgen_parser::parse_definitions(&content).with_context(|| format!("failed to parse {:?}", path))?;
    definitions.extend(parsed);
  }

  Ok(definitions)
}

fn write_units(output_root: &Path, units: &[GeneratedUnit]) -> Result<()> {
  fs::create_dir_all(output_root).with_context(|| format!("failed to create {:?}", output_root))?;
  for unit in units {
    let output_path = output_root.join(&unit.file_name);
    debug!("writing {:?}", output_path);
    fs::write(&output_path, &unit.source).with_context(|| format!("failed to write {:?}", output_path))?;
  }

  Ok(())
}

fn report(diagnostics: &Diagnostics) {
  for diagnostic in diagnostics.iter() {
    match diagnostic.severity {
      Severity::Info => info!("{}", diagnostic),
      Severity::Warning => warn!("{}", diagnostic),
      Severity::Error => error!("{}", diagnostic),
    }
  }
}

fn is_path_hidden<P: AsRef<Path>>(path: P) -> bool {
  path.as_ref().components().any(|component| {
    if let Some(name) = component.as_os_str().to_str() {
      name.starts_with('.')
    } else {
      false
    }
  })
}
