//! Shader variant catalog.
//!
//! Enumerates every compute-shader variant the Vulkan backend needs as a
//! [`CompileJob`]: a unique name, a template, preprocessor defines and
//! compiler settings. The catalog is a pure function of [`CatalogConfig`];
//! the generator crate turns it into build rules and embedded artifacts.

pub mod capabilities;
pub mod catalog;
pub mod families;
pub mod job;
pub mod tables;
pub mod types;
pub mod variant;

pub use capabilities::Capabilities;
pub use catalog::{build_catalog, Catalog, CatalogBuilder, CatalogConfig, CatalogError};
pub use job::{CompileJob, Defines};
pub use tables::LookupTable;
pub use types::DataType;
pub use variant::{MathPath, Part, TargetEnv, VariantKey};
