//! Build-time generator for the Vulkan shader catalog.
//!
//! A run either writes a CMake build graph that compiles every catalog job
//! with glslc, or reads the compiled `.spv` files back and embeds them into
//! a C++ header/source pair. See [`pipeline::run`].

pub mod build_graph;
pub mod config;
pub mod embed;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod pipeline;
pub mod writer;

pub use config::{GeneratorConfig, Mode};
pub use error::GeneratorError;
pub use pipeline::{run, RunSummary};
pub use writer::{write_if_changed, WriteOutcome};
