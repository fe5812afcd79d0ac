//! Artifact embedder.
//!
//! Produces the declarations unit (`.hpp`) and definitions unit (`.cpp`) the
//! Vulkan backend links against: one `<job>_data` / `<job>_len` pair per
//! compiled shader, plus the dispatch tables from
//! [`Catalog::lookup_tables`].
//!
//! In stub mode the header carries the `.spv` file name instead of the bytes
//! and the backend loads shaders from [`SHADER_DIR_MACRO`] at runtime.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use catalog::{Catalog, LookupTable};
use log::{info, warn};

use crate::error::GeneratorError;
use crate::writer::{write_if_changed, WriteOutcome};

/// Bytes per line in embedded array literals.
pub const BYTES_PER_LINE: usize = 12;

/// Macro naming the shader directory in stub mode.
pub const SHADER_DIR_MACRO: &str = "GGML_VK_SHADER_DIR";

/// A compiled shader read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedArtifact {
    pub name: String,
    pub data: Vec<u8>,
}

impl EmbeddedArtifact {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Read every job's output. Missing, unreadable and empty files are logged
/// and left out; only a missing output directory fails the run.
pub fn read_artifacts(catalog: &Catalog) -> Result<Vec<EmbeddedArtifact>, GeneratorError> {
    let output_dir = &catalog.config().output_dir;
    if !output_dir.is_dir() {
        return Err(GeneratorError::OutputDirMissing(output_dir.clone()));
    }

    let mut artifacts = Vec::with_capacity(catalog.len());
    for (name, path) in catalog.output_paths() {
        match fs::read(path) {
            Ok(data) if data.is_empty() => warn!("skipping {}: {} is empty", name, path.display()),
            Ok(data) => artifacts.push(EmbeddedArtifact {
                name: name.to_string(),
                data,
            }),
            Err(e) => warn!("skipping {}: cannot read {}: {}", name, path.display(), e),
        }
    }
    Ok(artifacts)
}

/// The two generated units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedUnits {
    pub header: String,
    pub source: String,
}

impl EmbedUnits {
    fn new(hpp_name: &str) -> Self {
        EmbedUnits {
            header: "#include <cstdint>\n\n".to_string(),
            source: format!("#include \"{}\"\n\n", escape_c_string(hpp_name)),
        }
    }

    pub fn write(
        &self,
        target_hpp: &Path,
        target_cpp: &Path,
    ) -> Result<(WriteOutcome, WriteOutcome), GeneratorError> {
        let hpp = write_if_changed(target_hpp, self.header.as_bytes())
            .map_err(|e| GeneratorError::io(target_hpp, e))?;
        let cpp = write_if_changed(target_cpp, self.source.as_bytes())
            .map_err(|e| GeneratorError::io(target_cpp, e))?;
        info!(
            "{} {:?}, {} {:?}",
            target_hpp.display(),
            hpp,
            target_cpp.display(),
            cpp
        );
        Ok((hpp, cpp))
    }
}

fn escape_c_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// File name component of `path` as text.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `0x..,` literals, [`BYTES_PER_LINE`] per line.
pub fn byte_literal(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 5);
    for (i, byte) in data.iter().enumerate() {
        out.push_str(&format!("0x{:x},", byte));
        if (i + 1) % BYTES_PER_LINE == 0 {
            out.push('\n');
        }
    }
    out
}

/// Parse the body of a byte array literal back into bytes.
pub fn decode_byte_literal(literal: &str) -> Option<Vec<u8>> {
    literal
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))?;
            u8::from_str_radix(digits, 16).ok()
        })
        .collect()
}

/// Find `<name>_data` in a definitions unit and decode its bytes.
pub fn find_embedded(source: &str, name: &str) -> Option<Vec<u8>> {
    let marker = format!("const unsigned char {}_data[", name);
    let start = source.find(&marker)?;
    let rest = &source[start..];
    let open = rest.find('{')?;
    let close = rest.find("};")?;
    decode_byte_literal(&rest[open + 1..close])
}

/// Nest row-major `items` into C brace initializers for `dims`.
fn nested_initializer(dims: &[usize], items: &[String]) -> String {
    if dims.len() <= 1 {
        return format!("{{{}}}", items.join(", "));
    }
    let stride: usize = dims[1..].iter().product();
    let inner: Vec<String> = items
        .chunks(stride)
        .map(|chunk| nested_initializer(&dims[1..], chunk))
        .collect();
    format!("{{{}}}", inner.join(", "))
}

/// Append declarations and definitions for every lookup table. Entries
/// whose artifact is absent become `nullptr` / `0`.
fn append_tables(
    units: &mut EmbedUnits,
    catalog: &Catalog,
    tables: &[LookupTable],
    present: &HashSet<&str>,
) -> Result<(), GeneratorError> {
    for table in tables {
        let shape = table.shape();
        let mut data = Vec::with_capacity(table.entries.len());
        let mut len = Vec::with_capacity(table.entries.len());
        for key in &table.entries {
            let name = key.name();
            if !catalog.contains(&name) {
                return Err(GeneratorError::UnknownTableEntry {
                    table: table.symbol.clone(),
                    entry: name,
                });
            }
            if present.contains(name.as_str()) {
                data.push(format!("{}_data", name));
                len.push(format!("{}_len", name));
            } else {
                data.push("nullptr".to_string());
                len.push("0".to_string());
            }
        }

        units.header.push_str(&format!(
            "extern const void * {}_data{};\n",
            table.symbol, shape
        ));
        units.header.push_str(&format!(
            "extern const uint64_t {}_len{};\n",
            table.symbol, shape
        ));
        units.source.push_str(&format!(
            "const void * {}_data{} = {};\n",
            table.symbol,
            shape,
            nested_initializer(&table.dims, &data)
        ));
        units.source.push_str(&format!(
            "const uint64_t {}_len{} = {};\n",
            table.symbol,
            shape,
            nested_initializer(&table.dims, &len)
        ));
    }
    Ok(())
}

/// Units with the artifacts' bytes embedded. Jobs without an artifact get
/// no symbol.
pub fn render_embedded(
    catalog: &Catalog,
    artifacts: &[EmbeddedArtifact],
    target_hpp: &Path,
) -> Result<EmbedUnits, GeneratorError> {
    let mut units = EmbedUnits::new(&file_name(target_hpp));
    let mut present = HashSet::with_capacity(artifacts.len());

    let mut sorted: Vec<&EmbeddedArtifact> = artifacts.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    for artifact in sorted {
        if artifact.is_empty() {
            warn!("skipping {}: no data", artifact.name);
            continue;
        }
        let (name, size) = (&artifact.name, artifact.len());
        units.header.push_str(&format!(
            "extern const unsigned char {}_data[{}];\n",
            name, size
        ));
        units
            .header
            .push_str(&format!("const uint64_t {}_len = {};\n\n", name, size));

        units.source.push_str(&format!(
            "const unsigned char {}_data[{}] = {{\n",
            name, size
        ));
        units.source.push_str(&byte_literal(&artifact.data));
        units.source.push_str("\n};\n\n");
        present.insert(name.as_str());
    }

    append_tables(&mut units, catalog, &catalog.lookup_tables(), &present)?;
    Ok(units)
}

/// Units that point at `.spv` files under the output directory instead of
/// embedding them. Never touches the artifacts.
pub fn render_stubs(catalog: &Catalog, target_hpp: &Path) -> Result<EmbedUnits, GeneratorError> {
    let mut units = EmbedUnits::new(&file_name(target_hpp));
    let shader_dir = &catalog.config().output_dir;
    units.header.push_str(&format!(
        "#define {} \"{}\"\n\n",
        SHADER_DIR_MACRO,
        escape_c_string(&shader_dir.display().to_string())
    ));

    let mut present = HashSet::with_capacity(catalog.len());
    for (name, path) in catalog.output_paths() {
        units.header.push_str(&format!(
            "inline constexpr char const * {}_data = \"{}\";\n",
            name,
            escape_c_string(&file_name(path))
        ));
        units
            .header
            .push_str(&format!("const uint64_t {}_len = 0;\n\n", name));
        present.insert(name);
    }

    append_tables(&mut units, catalog, &catalog.lookup_tables(), &present)?;
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{CatalogConfig, DataType, VariantKey};

    #[test]
    fn test_byte_literal_wraps_at_twelve() {
        let data: Vec<u8> = (0..13).collect();
        let text = byte_literal(&data);
        assert_eq!(
            text,
            "0x0,0x1,0x2,0x3,0x4,0x5,0x6,0x7,0x8,0x9,0xa,0xb,\n0xc,"
        );
        assert_eq!(decode_byte_literal(&text), Some(data));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode_byte_literal("0x1,0xzz,"), None);
        assert_eq!(decode_byte_literal("12,"), None);
        assert_eq!(decode_byte_literal(""), Some(vec![]));
        assert_eq!(decode_byte_literal("0x100,"), None);
    }

    #[test]
    fn test_nested_initializer() {
        let items: Vec<String> = (0..8).map(|i| i.to_string()).collect();
        assert_eq!(
            nested_initializer(&[2, 2, 2], &items),
            "{{{0, 1}, {2, 3}}, {{4, 5}, {6, 7}}}"
        );
        assert_eq!(nested_initializer(&[3], &items[..3]), "{0, 1, 2}");
    }

    fn catalog_with(output_dir: &Path) -> Catalog {
        let config = CatalogConfig {
            output_dir: output_dir.to_path_buf(),
            ..CatalogConfig::default()
        }
        .with_types(&[DataType::F32])
        .with_capabilities(catalog::Capabilities::none());
        catalog::build_catalog(&config).expect("catalog builds")
    }

    #[test]
    fn test_absent_table_entries_become_null() {
        let catalog = catalog_with(Path::new("/nonexistent"));
        let artifacts = vec![EmbeddedArtifact {
            name: "add_f32_f32_f32".to_string(),
            data: vec![3, 2, 0x23, 7],
        }];
        let units = render_embedded(&catalog, &artifacts, Path::new("out/shaders.hpp")).unwrap();

        assert!(units.source.starts_with("#include \"shaders.hpp\"\n\n"));
        assert!(units
            .header
            .contains("extern const unsigned char add_f32_f32_f32_data[4];\nconst uint64_t add_f32_f32_f32_len = 4;\n"));
        assert!(units.header.contains("extern const void * add_data[2][2][2][2];"));
        assert!(units
            .source
            .contains("const void * add_data[2][2][2][2] = {{{{add_f32_f32_f32_data, nullptr}, {nullptr, nullptr}}"));
        assert!(units
            .source
            .contains("const uint64_t add_len[2][2][2][2] = {{{{add_f32_f32_f32_len, 0}, {0, 0}}"));
        assert!(units.source.contains("const void * arr_dmmv_f32_f16_f32_data[3] = {nullptr, nullptr, nullptr};"));
        assert!(!units.header.contains("sub_f32_f32_f32_data["));
        assert_eq!(find_embedded(&units.source, "add_f32_f32_f32"), Some(vec![3, 2, 0x23, 7]));
    }

    #[test]
    fn test_unknown_table_entry_is_fatal() {
        let catalog = catalog_with(Path::new("/nonexistent"));
        let bogus = LookupTable {
            symbol: "bogus".to_string(),
            dims: vec![1],
            entries: vec![VariantKey::new("not_a_shader")],
        };
        let mut units = EmbedUnits::new("x.hpp");
        let err = append_tables(&mut units, &catalog, &[bogus], &HashSet::new()).unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::UnknownTableEntry { ref table, ref entry }
                if table == "bogus" && entry == "not_a_shader"
        ));
    }

    #[test]
    fn test_stubs_name_files_not_bytes() {
        let catalog = catalog_with(Path::new("/build/spv"));
        let units = render_stubs(&catalog, Path::new("shaders.hpp")).unwrap();
        assert!(units
            .header
            .starts_with("#include <cstdint>\n\n#define GGML_VK_SHADER_DIR \"/build/spv\"\n\n"));
        assert!(units
            .header
            .contains("inline constexpr char const * norm_f32_data = \"norm_f32.spv\";\nconst uint64_t norm_f32_len = 0;\n"));
        assert!(!units.source.contains("unsigned char"));
        assert!(!units.source.contains("0x"));
        assert!(!units.source.contains("nullptr"));
    }

    #[test]
    fn test_missing_output_dir_is_fatal() {
        let catalog = catalog_with(Path::new("/nonexistent/shadergen/spv"));
        assert!(matches!(
            read_artifacts(&catalog),
            Err(GeneratorError::OutputDirMissing(_))
        ));
    }
}
