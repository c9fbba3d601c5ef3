//! Rewrites stylesheet declarations according to a mapping table.
//!
//! A mapping table pairs declarations or colors with their replacements:
//!
//! ```json
//! {
//!   "color: red": "color: blue",
//!   "$border: #ccc": "#333",
//!   "$value: $monochrome": "$invert"
//! }
//! ```
//!
//! [`remap`] keeps only the rules that had at least one declaration replaced,
//! optionally scoped under a per-source prefix, so the result can be layered
//! on top of the original stylesheet.

pub mod cleanup;
pub mod color;
pub mod declaration;
mod error;
pub mod mapping;
pub mod media;
pub mod memo;
pub mod normalize;
pub mod output;
pub mod provenance;
mod remap;
pub mod resolve;
pub mod selector;
pub mod shorthand;
pub mod validate;

pub use color::{invert, is_color, normalize_color, parse_color, CanonicalColor};
pub use declaration::Declaration;
pub use error::{MappingError, RemapError, RemapResult, ShorthandError};
pub use mapping::{compile, compile_with, CompiledMappingTable, MappingSpec};
pub use media::{matches, ColorScheme, DeviceProfile};
pub use memo::Caches;
pub use normalize::{normalize, stringify_key, NormalizedDeclaration};
pub use provenance::ProvenanceLabel;
pub use remap::{remap, remap_with_caches, RemapOptions, RemapOutput, Source};
pub use resolve::{Resolution, ResolutionState, ResolveOptions, Resolver};
pub use shorthand::{expand_shorthand, is_shorthand_property};
pub use validate::is_valid_declaration;
