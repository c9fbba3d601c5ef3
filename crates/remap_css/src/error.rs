use thiserror::Error;

pub type RemapResult<T> = std::result::Result<T, RemapError>;

#[derive(Error, Debug)]
pub enum RemapError {
  #[error("{}", .0)]
  Mapping(#[from] MappingError),

  #[error("invalid ignore selector pattern {pattern:?}: {source}")]
  IgnorePattern {
    pattern: String,
    #[source]
    source: regex::Error,
  },
}

/// Contract violations found while compiling a mapping table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
  #[error("unknown mapping category ${category} in key {key:?}")]
  UnknownCategory { key: String, category: String },

  #[error("mapping key {key:?} does not name a color")]
  NotAColor { key: String },

  #[error("unsupported token {token:?} in mapping value for key {key:?}")]
  UnsupportedToken { key: String, token: String },

  #[error("mapping key {key:?} is not a declaration")]
  InvalidDeclaration { key: String },

  #[error("mapping value {value:?} for key {key:?} is not a declaration list")]
  InvalidReplacement { key: String, value: String },
}

/// Why a shorthand could not be split into longhands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShorthandError {
  #[error("{property} is not an expandable shorthand")]
  NotShorthand { property: String },

  #[error("{property} has more than one value in {value:?}")]
  MultipleValues { property: String, value: String },

  #[error("cannot tell which longhand {component:?} belongs to in {property}: {value}")]
  Ambiguous {
    property: String,
    value: String,
    component: String,
  },
}
