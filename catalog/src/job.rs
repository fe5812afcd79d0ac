//! Compile jobs and their preprocessor defines.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::variant::{TargetEnv, VariantKey};

/// Preprocessor defines for one job, ordered by macro name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Defines {
    entries: BTreeMap<String, String>,
}

impl Defines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Layer `overlay` on top of `self`. On duplicate keys the overlay wins.
    pub fn merged(&self, overlay: &Defines) -> Defines {
        let mut result = self.clone();
        for (key, value) in &overlay.entries {
            result.entries.insert(key.clone(), value.clone());
        }
        result
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Build a [`Defines`] from `key => value` pairs.
///
/// ```
/// let d = catalog::defines! { "A_TYPE" => "float", "D_TYPE" => "float16_t" };
/// assert_eq!(d.get("A_TYPE"), Some("float"));
/// ```
#[macro_export]
macro_rules! defines {
    () => {
        $crate::Defines::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut defines = $crate::Defines::new();
        $( defines.set($key, $value); )+
        defines
    }};
}

/// One requested compiled kernel variant.
#[derive(Debug, Clone)]
pub struct CompileJob {
    pub key: VariantKey,
    /// Unique within a catalog; derived from `key`.
    pub name: String,
    /// Shader source file name, relative to the input directory.
    pub template: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub defines: Defines,
    pub target_env: TargetEnv,
    pub optimize: bool,
    pub debug_info: bool,
}

impl CompileJob {
    /// Compiler flags, excluding input/output paths.
    pub fn flags(&self) -> Vec<String> {
        let mut flags = vec![
            "-fshader-stage=compute".to_string(),
            self.target_env.flag().to_string(),
        ];
        if self.optimize {
            flags.push("-O".to_string());
        }
        if self.debug_info {
            flags.push("-g".to_string());
        }
        for (key, value) in self.defines.iter() {
            flags.push(format!("-D{}={}", key, value));
        }
        flags
    }

    /// Dependency file the compiler writes next to the output.
    pub fn depfile_path(&self) -> PathBuf {
        let mut path = self.output_path.clone().into_os_string();
        path.push(".d");
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;
    use crate::variant::MathPath;

    fn job(key: VariantKey, defines: Defines, debug_info: bool) -> CompileJob {
        let name = key.name();
        CompileJob {
            target_env: key.target_env(),
            optimize: key.optimize(),
            output_path: PathBuf::from("/out").join(format!("{}.spv", name)),
            input_path: PathBuf::from("/in/mul_mm.comp"),
            template: "mul_mm.comp".to_string(),
            key,
            name,
            defines,
            debug_info,
        }
    }

    #[test]
    fn test_merge_later_source_wins() {
        let base = defines! { "FLOAT_TYPE" => "float", "ACC_TYPE" => "float" };
        let overlay = defines! { "FLOAT_TYPE" => "float16_t", "D_TYPE" => "float" };
        let merged = base.merged(&overlay);
        assert_eq!(merged.get("FLOAT_TYPE"), Some("float16_t"));
        assert_eq!(merged.get("ACC_TYPE"), Some("float"));
        assert_eq!(merged.len(), 3);
        // base is untouched
        assert_eq!(base.get("FLOAT_TYPE"), Some("float"));
    }

    #[test]
    fn test_flags_order() {
        let key = VariantKey::new("matmul").ty(DataType::F16);
        let j = job(key, defines! { "Z" => "1", "A" => "2" }, true);
        assert_eq!(
            j.flags(),
            vec![
                "-fshader-stage=compute",
                "--target-env=vulkan1.2",
                "-O",
                "-g",
                "-DA=2",
                "-DZ=1",
            ]
        );
    }

    #[test]
    fn test_flags_without_optimization() {
        let key = VariantKey::new("matmul")
            .ty(DataType::F16)
            .path(MathPath::Coopmat1);
        let j = job(key, Defines::new(), false);
        assert_eq!(
            j.flags(),
            vec!["-fshader-stage=compute", "--target-env=vulkan1.2"]
        );
    }

    #[test]
    fn test_depfile_next_to_output() {
        let j = job(VariantKey::new("norm").ty(DataType::F32), Defines::new(), false);
        assert_eq!(j.depfile_path(), PathBuf::from("/out/norm_f32.spv.d"));
    }
}
