//! JSON dump of a catalog, for inspecting what a build will compile
//! without reading the generated `CMakeLists.txt`.

use std::collections::BTreeMap;
use std::path::Path;

use catalog::{Catalog, CompileJob};
use serde::{Deserialize, Serialize};

use crate::error::GeneratorError;
use crate::writer::{write_if_changed, WriteOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestCapabilities {
    pub coopmat: bool,
    pub coopmat2: bool,
    pub integer_dot: bool,
    pub bfloat16: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub template: String,
    pub output: String,
    pub defines: BTreeMap<String, String>,
    pub optimize: bool,
    pub flags: Vec<String>,
}

impl From<&CompileJob> for ManifestEntry {
    fn from(job: &CompileJob) -> Self {
        ManifestEntry {
            name: job.name.clone(),
            template: job.template.clone(),
            output: job.output_path.display().to_string(),
            defines: job
                .defines
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            optimize: job.optimize,
            flags: job.flags(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogManifest {
    pub capabilities: ManifestCapabilities,
    pub types: Vec<String>,
    pub jobs: Vec<ManifestEntry>,
}

impl CatalogManifest {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let config = catalog.config();
        let caps = config.capabilities;
        CatalogManifest {
            capabilities: ManifestCapabilities {
                coopmat: caps.coopmat,
                coopmat2: caps.coopmat2,
                integer_dot: caps.integer_dot,
                bfloat16: caps.bfloat16,
            },
            types: config.types.iter().map(|t| t.as_str().to_string()).collect(),
            jobs: catalog.jobs().map(ManifestEntry::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, GeneratorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, GeneratorError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Write the manifest for `catalog` to `path`, leaving an identical file alone.
pub fn write_manifest(catalog: &Catalog, path: &Path) -> Result<WriteOutcome, GeneratorError> {
    let mut json = CatalogManifest::from_catalog(catalog).to_json()?;
    json.push('\n');
    write_if_changed(path, json.as_bytes()).map_err(|e| GeneratorError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{build_catalog, Capabilities, CatalogConfig, DataType};

    fn small_catalog() -> Catalog {
        let config = CatalogConfig::default()
            .with_types(&[DataType::F32, DataType::Q4_0])
            .with_capabilities(Capabilities::none());
        build_catalog(&config).unwrap()
    }

    #[test]
    fn test_manifest_mirrors_catalog() {
        let catalog = small_catalog();
        let manifest = CatalogManifest::from_catalog(&catalog);
        assert_eq!(manifest.jobs.len(), catalog.len());
        assert_eq!(manifest.types, vec!["f32", "q4_0"]);
        assert!(!manifest.capabilities.coopmat);

        let names: Vec<&str> = manifest.jobs.iter().map(|e| e.name.as_str()).collect();
        let expected: Vec<&str> = catalog.names().collect();
        assert_eq!(names, expected);

        let norm = manifest.jobs.iter().find(|e| e.name == "norm_f32").unwrap();
        assert_eq!(norm.template, "norm.comp");
        assert_eq!(norm.flags, catalog.get("norm_f32").unwrap().flags());
    }

    #[test]
    fn test_json_parses_back() {
        let manifest = CatalogManifest::from_catalog(&small_catalog());
        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"name\": \"norm_f32\""));
        assert_eq!(CatalogManifest::from_json(&json).unwrap(), manifest);
        assert!(CatalogManifest::from_json("{\"jobs\": 3}").is_err());
    }
}
