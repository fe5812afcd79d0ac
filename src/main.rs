//! shadergen - Vulkan compute shader build generator
//!
//! # Usage
//!
//! ```bash
//! # Emit the build graph; building it compiles every shader and embeds them
//! shadergen --glslc glslc --input-dir vulkan-shaders --output-dir build/spv \
//!     --target-hpp build/ggml-vulkan-shaders.hpp --target-cpp build/ggml-vulkan-shaders.cpp \
//!     --target-cmake build/vulkan-shaders/CMakeLists.txt
//!
//! # Load shaders from disk at runtime instead of embedding them
//! shadergen ... --target-cmake build/vulkan-shaders/CMakeLists.txt --no-embed
//!
//! # Embed already compiled shaders
//! shadergen --input-dir vulkan-shaders --output-dir build/spv \
//!     --target-hpp out.hpp --target-cpp out.cpp
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process;

use catalog::DataType;
use generator::logging;
use generator::{GeneratorConfig, GeneratorError};

#[derive(Parser)]
#[command(name = "shadergen")]
#[command(version = "0.1.0")]
#[command(about = "Generate the Vulkan shader build graph and embedded shader sources", long_about = None)]
struct Cli {
    /// Shader compiler executable
    #[arg(long)]
    glslc: Option<PathBuf>,

    /// Directory with the .comp shader templates
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Directory for compiled .spv files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Generated declarations unit
    #[arg(long)]
    target_hpp: Option<PathBuf>,

    /// Generated definitions unit
    #[arg(long)]
    target_cpp: Option<PathBuf>,

    /// Write a CMake build graph here instead of embedding
    #[arg(long)]
    target_cmake: Option<PathBuf>,

    /// Emit stub units that load shaders from disk (needs --target-cmake)
    #[arg(long)]
    no_embed: bool,

    /// TOML config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also dump the catalog as JSON
    #[arg(long)]
    catalog_json: Option<PathBuf>,

    /// Restrict the typed shader families to these types (comma separated)
    #[arg(long, value_delimiter = ',', value_parser = parse_type)]
    types: Vec<DataType>,

    /// Compile shaders with debug info
    #[arg(long)]
    debug_info: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_type(s: &str) -> Result<DataType, String> {
    DataType::from_token(s).ok_or_else(|| format!("unknown shader type '{}'", s))
}

fn load_config(cli: Cli) -> Result<GeneratorConfig, GeneratorError> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };

    if let Some(glslc) = cli.glslc {
        config.glslc = glslc;
    }
    if let Some(dir) = cli.input_dir {
        config.input_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(path) = cli.target_hpp {
        config.target_hpp = path;
    }
    if let Some(path) = cli.target_cpp {
        config.target_cpp = path;
    }
    if cli.target_cmake.is_some() {
        config.target_cmake = cli.target_cmake;
    }
    if cli.catalog_json.is_some() {
        config.catalog_json = cli.catalog_json;
    }
    config.no_embed |= cli.no_embed;
    config.debug_info |= cli.debug_info;
    if !cli.types.is_empty() {
        config.set_types(&cli.types);
    }

    config.record_command_line(std::env::args_os());
    if let Ok(exe) = std::env::current_exe() {
        config.generator_exe = exe;
    }
    Ok(config)
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose > 0 {
        logging::init_with_level(logging::level_for_verbosity(cli.verbose));
    } else {
        logging::init_from_env();
    }

    let result = load_config(cli).and_then(|config| generator::run(&config));

    match result {
        Ok(summary) => log::info!("done: {:?}", summary),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
