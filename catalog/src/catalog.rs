//! Catalog construction.
//!
//! Families push jobs into a [`CatalogBuilder`]; [`CatalogBuilder::finish`]
//! sorts them by name into an immutable [`Catalog`]. Names are the only
//! identity the embedder and the runtime see, so a duplicate is rejected at
//! insertion time instead of silently merging two variants.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info};

use crate::capabilities::Capabilities;
use crate::families;
use crate::job::{CompileJob, Defines};
use crate::tables::{self, LookupTable};
use crate::types::DataType;
use crate::variant::VariantKey;

/// Inputs that fully determine a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    /// Directory holding the `.comp` shader templates.
    pub input_dir: PathBuf,
    /// Directory the compiled `.spv` files are written to.
    pub output_dir: PathBuf,
    /// Types the typed families are generated for.
    pub types: Vec<DataType>,
    pub capabilities: Capabilities,
    /// Pass `-g` to the shader compiler.
    pub debug_info: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("vulkan-shaders"),
            output_dir: PathBuf::from("/tmp"),
            types: DataType::SUPPORTED.to_vec(),
            capabilities: Capabilities::detected(),
            debug_info: false,
        }
    }
}

impl CatalogConfig {
    pub fn with_types(mut self, types: &[DataType]) -> Self {
        self.types = types.to_vec();
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// Errors raised while building a catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// Two enumerations produced the same job name.
    DuplicateName {
        name: String,
        first_template: String,
        second_template: String,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::DuplicateName {
                name,
                first_template,
                second_template,
            } => write!(
                f,
                "duplicate shader variant '{}' (from {} and {})",
                name, first_template, second_template
            ),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Accumulates jobs for one catalog.
pub struct CatalogBuilder<'a> {
    config: &'a CatalogConfig,
    jobs: Vec<CompileJob>,
    index: HashMap<String, usize>,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(config: &'a CatalogConfig) -> Self {
        CatalogBuilder {
            config,
            jobs: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.config.capabilities
    }

    /// Configured types, in configuration order.
    pub fn types(&self) -> Vec<DataType> {
        self.config.types.clone()
    }

    pub fn has_type(&self, t: DataType) -> bool {
        self.config.types.contains(&t)
    }

    /// Request a variant compiled from `template` with `defines`.
    pub fn add(
        &mut self,
        key: VariantKey,
        template: impl Into<String>,
        defines: Defines,
    ) -> Result<(), CatalogError> {
        let template = template.into();
        let name = key.name();

        if let Some(&existing) = self.index.get(&name) {
            return Err(CatalogError::DuplicateName {
                name,
                first_template: self.jobs[existing].template.clone(),
                second_template: template,
            });
        }

        if let Some(rule) = key.no_opt_rule() {
            debug!("{}: optimizer disabled ({})", name, rule.reason);
        }

        let job = CompileJob {
            input_path: self.config.input_dir.join(&template),
            output_path: self.config.output_dir.join(format!("{}.spv", name)),
            target_env: key.target_env(),
            optimize: key.optimize(),
            debug_info: self.config.debug_info,
            name: name.clone(),
            template,
            defines,
            key,
        };

        self.index.insert(name, self.jobs.len());
        self.jobs.push(job);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Freeze the catalog, ordered by name.
    pub fn finish(self) -> Catalog {
        let mut jobs = self.jobs;
        jobs.sort_by(|a, b| a.name.cmp(&b.name));
        Catalog {
            config: self.config.clone(),
            jobs: jobs.into_iter().map(|job| (job.name.clone(), job)).collect(),
        }
    }
}

/// The complete, name-sorted set of compile jobs.
#[derive(Debug, Clone)]
pub struct Catalog {
    config: CatalogConfig,
    jobs: IndexMap<String, CompileJob>,
}

impl Catalog {
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs in name order.
    pub fn jobs(&self) -> impl Iterator<Item = &CompileJob> {
        self.jobs.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&CompileJob> {
        self.jobs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    pub fn contains_key(&self, key: &VariantKey) -> bool {
        self.contains(&key.name())
    }

    /// Name to compiled-output path, in name order.
    pub fn output_paths(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.jobs
            .values()
            .map(|job| (job.name.as_str(), job.output_path.as_path()))
    }

    /// Dispatch tables the runtime indexes by feature flags.
    pub fn lookup_tables(&self) -> Vec<LookupTable> {
        tables::lookup_tables(&self.config)
    }
}

/// Enumerate every family for `config`.
pub fn build_catalog(config: &CatalogConfig) -> Result<Catalog, CatalogError> {
    info!(
        "Generating shader catalog for {} types (capabilities: {})",
        config.types.len(),
        config.capabilities.summary()
    );

    let mut builder = CatalogBuilder::new(config);
    families::enumerate_all(&mut builder)?;
    let catalog = builder.finish();

    info!("Catalog contains {} shader variants", catalog.len());
    Ok(catalog)
}
