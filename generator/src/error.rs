use thiserror::Error;

use crate::registry::RegistryError;

#[derive(Debug, Error)]
pub enum GenerateError {
  #[error("more than one generated unit is named {file_name}")]
  DuplicateUnit { file_name: String },
  #[error(transparent)]
  Registry(#[from] RegistryError),
}
