//! One generator run, from config to files on disk.

use std::fs;
use std::path::Path;

use catalog::{build_catalog, Catalog};
use log::{debug, info};

use crate::build_graph::{render_cmake, EmbedInvocation};
use crate::config::{GeneratorConfig, Mode};
use crate::embed::{read_artifacts, render_embedded, render_stubs};
use crate::error::GeneratorError;
use crate::manifest::write_manifest;
use crate::writer::WriteOutcome;

/// What a run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Jobs in the catalog.
    pub jobs: usize,
    /// Artifacts embedded; zero outside [`Mode::Embed`].
    pub embedded: usize,
    pub cmake: Option<WriteOutcome>,
    pub hpp: Option<WriteOutcome>,
    pub cpp: Option<WriteOutcome>,
    pub manifest: Option<WriteOutcome>,
}

fn create_dir(dir: &Path) -> Result<(), GeneratorError> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    debug!("creating {}", dir.display());
    fs::create_dir_all(dir).map_err(|e| GeneratorError::io(dir, e))
}

pub fn run(config: &GeneratorConfig) -> Result<RunSummary, GeneratorError> {
    config.validate().map_err(GeneratorError::Config)?;
    debug!("{}", config.summary());

    if !config.input_dir.is_dir() {
        return Err(GeneratorError::InputDirMissing(config.input_dir.clone()));
    }
    create_dir(&config.output_dir)?;
    if let Some(parent) = config.target_cmake.as_deref().and_then(Path::parent) {
        create_dir(parent)?;
    }

    let catalog = build_catalog(&config.catalog_config())?;
    debug!(
        "{} shader variants ({})",
        catalog.len(),
        config.capabilities.summary()
    );

    let mut summary = RunSummary {
        jobs: catalog.len(),
        ..RunSummary::default()
    };

    if let Some(path) = &config.catalog_json {
        summary.manifest = Some(write_manifest(&catalog, path)?);
    }

    match config.mode() {
        Mode::Embed => {
            let artifacts = read_artifacts(&catalog)?;
            info!(
                "embedding {} of {} shaders",
                artifacts.len(),
                catalog.len()
            );
            summary.embedded = artifacts.len();
            let units = render_embedded(&catalog, &artifacts, &config.target_hpp)?;
            let (hpp, cpp) = units.write(&config.target_hpp, &config.target_cpp)?;
            summary.hpp = Some(hpp);
            summary.cpp = Some(cpp);
        }
        Mode::BuildGraph => {
            let embed = EmbedInvocation {
                generator: config.generator_exe.clone(),
                glslc: config.glslc.clone(),
                input_dir: config.input_dir.clone(),
                output_dir: config.output_dir.clone(),
                target_hpp: config.target_hpp.clone(),
                target_cpp: config.target_cpp.clone(),
                extra_args: config.forwarded_args(),
            };
            summary.cmake = Some(write_cmake(config, &catalog, Some(&embed))?);
        }
        Mode::BuildGraphWithStubs => {
            let units = render_stubs(&catalog, &config.target_hpp)?;
            let (hpp, cpp) = units.write(&config.target_hpp, &config.target_cpp)?;
            summary.hpp = Some(hpp);
            summary.cpp = Some(cpp);
            summary.cmake = Some(write_cmake(config, &catalog, None)?);
        }
    }

    Ok(summary)
}

fn write_cmake(
    config: &GeneratorConfig,
    catalog: &Catalog,
    embed: Option<&EmbedInvocation>,
) -> Result<WriteOutcome, GeneratorError> {
    // mode() only returns the build graph modes with a target set
    let path = match &config.target_cmake {
        Some(path) => path,
        None => return Err(GeneratorError::Config("no --target-cmake given".to_string())),
    };
    let cmake = render_cmake(&config.command_line, &config.glslc, catalog, embed);
    let outcome = cmake.write(path).map_err(|e| GeneratorError::io(path, e))?;
    info!("{} {:?}", path.display(), outcome);
    Ok(outcome)
}
