//! Shader compiler capabilities that gate whole groups of variants.
//!
//! The gates are decided when the generator itself is built (cargo features
//! mirror what the build system probed from the shader compiler). The catalog
//! builder never looks at the features directly: it receives a
//! [`Capabilities`] value, so any combination can be enumerated in tests.

/// Optional compiler/hardware paths the catalog may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities {
    /// `GL_KHR_cooperative_matrix`
    pub coopmat: bool,
    /// `GL_NV_cooperative_matrix2`, requires the Vulkan 1.3 environment
    pub coopmat2: bool,
    /// `GL_EXT_integer_dot_product`
    pub integer_dot: bool,
    /// `GL_EXT_bfloat16`
    pub bfloat16: bool,
}

impl Capabilities {
    /// Capabilities compiled into this generator binary.
    pub fn detected() -> Self {
        Capabilities {
            coopmat: cfg!(feature = "coopmat"),
            coopmat2: cfg!(feature = "coopmat2"),
            integer_dot: cfg!(feature = "integer-dot"),
            bfloat16: cfg!(feature = "bfloat16"),
        }
    }

    pub const fn none() -> Self {
        Capabilities {
            coopmat: false,
            coopmat2: false,
            integer_dot: false,
            bfloat16: false,
        }
    }

    pub const fn all() -> Self {
        Capabilities {
            coopmat: true,
            coopmat2: true,
            integer_dot: true,
            bfloat16: true,
        }
    }

    /// Every combination of the four gates, for exhaustive checks.
    pub fn combinations() -> impl Iterator<Item = Capabilities> {
        (0u8..16).map(|bits| Capabilities {
            coopmat: bits & 1 != 0,
            coopmat2: bits & 2 != 0,
            integer_dot: bits & 4 != 0,
            bfloat16: bits & 8 != 0,
        })
    }

    /// Short human-readable summary for logs.
    pub fn summary(&self) -> String {
        let mut enabled = Vec::new();
        if self.coopmat {
            enabled.push("coopmat");
        }
        if self.coopmat2 {
            enabled.push("coopmat2");
        }
        if self.integer_dot {
            enabled.push("integer-dot");
        }
        if self.bfloat16 {
            enabled.push("bfloat16");
        }
        if enabled.is_empty() {
            "none".to_string()
        } else {
            enabled.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinations_are_distinct() {
        let all: Vec<_> = Capabilities::combinations().collect();
        assert_eq!(all.len(), 16);
        assert!(all.contains(&Capabilities::none()));
        assert!(all.contains(&Capabilities::all()));
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_summary() {
        assert_eq!(Capabilities::none().summary(), "none");
        assert_eq!(
            Capabilities::all().summary(),
            "coopmat, coopmat2, integer-dot, bfloat16"
        );
    }
}
