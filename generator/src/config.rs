//! Generator configuration.
//!
//! Values come from an optional TOML file and are then overridden by
//! command-line flags:
//!
//! ```toml
//! glslc = "/usr/bin/glslc"
//! input-dir = "vulkan-shaders"
//! output-dir = "build/vulkan-shaders.spv"
//! target-hpp = "build/ggml-vulkan-shaders.hpp"
//! target-cpp = "build/ggml-vulkan-shaders.cpp"
//! target-cmake = "build/vulkan-shaders/CMakeLists.txt"
//! no-embed = false
//!
//! [catalog]
//! types = ["f32", "f16", "q4_0"]
//! debug-info = true
//! ```
//!
//! Capabilities are not configurable here: they are fixed when the generator
//! is built (see [`Capabilities::detected`]).

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use catalog::{Capabilities, CatalogConfig, DataType};
use serde::Deserialize;

use crate::error::GeneratorError;

/// What a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Embed already compiled shaders into the two C++ units.
    Embed,
    /// Emit the build graph; its aggregate target re-runs the generator in
    /// [`Mode::Embed`].
    BuildGraph,
    /// Emit the build graph and stub C++ units that load shaders from disk.
    BuildGraphWithStubs,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Shader compiler executable.
    pub glslc: PathBuf,
    /// Directory holding the `.comp` templates.
    pub input_dir: PathBuf,
    /// Directory for compiled `.spv` files.
    pub output_dir: PathBuf,
    pub target_hpp: PathBuf,
    pub target_cpp: PathBuf,
    /// Where to write `CMakeLists.txt`; selects the build graph modes.
    pub target_cmake: Option<PathBuf>,
    pub no_embed: bool,
    /// Optional JSON dump of the catalog.
    pub catalog_json: Option<PathBuf>,
    pub types: Vec<DataType>,
    pub debug_info: bool,
    pub capabilities: Capabilities,
    /// The invocation, recorded in the build graph header.
    pub command_line: Vec<String>,
    /// This executable, re-invoked by the embed step.
    pub generator_exe: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let catalog = CatalogConfig::default();
        GeneratorConfig {
            glslc: PathBuf::from("glslc"),
            input_dir: catalog.input_dir,
            output_dir: catalog.output_dir,
            target_hpp: PathBuf::from("ggml-vulkan-shaders.hpp"),
            target_cpp: PathBuf::from("ggml-vulkan-shaders.cpp"),
            target_cmake: None,
            no_embed: false,
            catalog_json: None,
            types: catalog.types,
            debug_info: catalog.debug_info,
            capabilities: catalog.capabilities,
            command_line: Vec::new(),
            generator_exe: PathBuf::from("shadergen"),
        }
    }
}

/// On-disk layout of a config file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    glslc: Option<PathBuf>,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    target_hpp: Option<PathBuf>,
    target_cpp: Option<PathBuf>,
    target_cmake: Option<PathBuf>,
    no_embed: Option<bool>,
    catalog_json: Option<PathBuf>,
    catalog: Option<CatalogSection>,
}

/// `[catalog]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct CatalogSection {
    types: Option<Vec<DataType>>,
    debug_info: Option<bool>,
}

/// Parse config file contents over the defaults.
pub fn parse_config(content: &str) -> Result<GeneratorConfig, String> {
    let raw: RawConfig =
        toml::from_str(content).map_err(|e| format!("Failed to parse generator config: {}", e))?;

    let mut config = GeneratorConfig::default();
    if let Some(glslc) = raw.glslc {
        config.glslc = glslc;
    }
    if let Some(dir) = raw.input_dir {
        config.input_dir = dir;
    }
    if let Some(dir) = raw.output_dir {
        config.output_dir = dir;
    }
    if let Some(path) = raw.target_hpp {
        config.target_hpp = path;
    }
    if let Some(path) = raw.target_cpp {
        config.target_cpp = path;
    }
    config.target_cmake = raw.target_cmake;
    config.no_embed = raw.no_embed.unwrap_or(false);
    config.catalog_json = raw.catalog_json;

    if let Some(section) = raw.catalog {
        if let Some(types) = section.types {
            config.set_types(&types);
        }
        if let Some(debug_info) = section.debug_info {
            config.debug_info = debug_info;
        }
    }
    Ok(config)
}

impl GeneratorConfig {
    pub fn from_file(path: &Path) -> Result<Self, GeneratorError> {
        let content = std::fs::read_to_string(path).map_err(|e| GeneratorError::io(path, e))?;
        parse_config(&content)
            .map_err(|e| GeneratorError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Replace the type list, dropping repeats but keeping first-seen order.
    pub fn set_types(&mut self, types: &[DataType]) {
        self.types.clear();
        for &t in types {
            if !self.types.contains(&t) {
                self.types.push(t);
            }
        }
    }

    /// Record the invocation for the build graph header. Arguments that
    /// aren't UTF-8 are converted lossily.
    pub fn record_command_line<I>(&mut self, args: I)
    where
        I: IntoIterator<Item = OsString>,
    {
        self.command_line = args
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
    }

    pub fn mode(&self) -> Mode {
        match (&self.target_cmake, self.no_embed) {
            (None, _) => Mode::Embed,
            (Some(_), false) => Mode::BuildGraph,
            (Some(_), true) => Mode::BuildGraphWithStubs,
        }
    }

    /// Check for flag combinations that can't run.
    pub fn validate(&self) -> Result<(), String> {
        if self.no_embed && self.target_cmake.is_none() {
            return Err("--no-embed requires --target-cmake to be specified".to_string());
        }

        if self.types.is_empty() {
            return Err("no shader types configured".to_string());
        }
        if let Some(t) = self.types.iter().find(|t| !DataType::SUPPORTED.contains(t)) {
            return Err(format!("'{}' is not a primary shader type", t));
        }

        Ok(())
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            types: self.types.clone(),
            capabilities: self.capabilities,
            debug_info: self.debug_info,
        }
    }

    /// Catalog settings the embed step needs to rebuild the same catalog.
    pub fn forwarded_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.types != DataType::SUPPORTED {
            let types: Vec<&str> = self.types.iter().map(|t| t.as_str()).collect();
            args.push("--types".to_string());
            args.push(types.join(","));
        }
        if self.debug_info {
            args.push("--debug-info".to_string());
        }
        args
    }

    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Mode: {:?}\n", self.mode()));
        s.push_str(&format!("Compiler: {}\n", self.glslc.display()));
        s.push_str(&format!("Input: {}\n", self.input_dir.display()));
        s.push_str(&format!("Output: {}\n", self.output_dir.display()));
        s.push_str(&format!("Types: {}\n", self.types.len()));
        s.push_str(&format!("Capabilities: {}\n", self.capabilities.summary()));
        s.push_str(&format!("Debug info: {}\n", self.debug_info));
        s
    }
}
