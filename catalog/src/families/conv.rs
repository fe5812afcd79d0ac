//! Convolution, im2col and pooling.

use log::trace;

use super::{add_fixed, excluded_by, Exclusion, FixedKernel};
use crate::catalog::{CatalogBuilder, CatalogError};
use crate::defines;
use crate::types::{glsl, DataType};
use crate::variant::{MathPath, Part, VariantKey};

/// One implicit-GEMM conv2d build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv2dVariant {
    /// Kernel weights are f16 rather than f32.
    pub f16_weights: bool,
    pub unroll: bool,
    pub path: MathPath,
}

pub const CONV2D_EXCLUSIONS: &[Exclusion<Conv2dVariant>] = &[
    Exclusion {
        reason: "cooperative matrix 2 support not compiled in",
        excludes: |v, caps| v.path == MathPath::Coopmat2 && !caps.coopmat2,
    },
    Exclusion {
        reason: "the cooperative matrix 2 build is always unrolled and unsuffixed",
        excludes: |v, _| v.path == MathPath::Coopmat2 && !v.unroll,
    },
];

pub fn conv2d_key(v: Conv2dVariant) -> VariantKey {
    let mut key = VariantKey::new("conv2d");
    if v.f16_weights {
        key = key.ty(DataType::F16);
    }
    key.ty(DataType::F32)
        .tag_if(v.unroll && v.path != MathPath::Coopmat2, "unroll")
        .path(v.path)
}

const F32: Part = Part::Type(DataType::F32);
const F16: Part = Part::Type(DataType::F16);
const RTE: Part = Part::Tag("rte");
const WHCN: Part = Part::Tag("whcn");
const CWHN: Part = Part::Tag("cwhn");

const FIXED: &[FixedKernel] = &[
    FixedKernel {
        op: "im2col",
        parts: &[F32],
        template: "im2col.comp",
        defines: &[("A_TYPE", "float"), ("D_TYPE", "float")],
        with_base: true,
    },
    FixedKernel {
        op: "im2col",
        parts: &[F32, F16],
        template: "im2col.comp",
        defines: &[("A_TYPE", "float"), ("D_TYPE", "float16_t")],
        with_base: true,
    },
    FixedKernel {
        op: "im2col",
        parts: &[F32, F16, RTE],
        template: "im2col.comp",
        defines: &[("A_TYPE", "float"), ("D_TYPE", "float16_t"), ("RTE16", "1")],
        with_base: true,
    },
    FixedKernel {
        op: "im2col_3d",
        parts: &[F32],
        template: "im2col_3d.comp",
        defines: &[("A_TYPE", "float"), ("D_TYPE", "float")],
        with_base: true,
    },
    FixedKernel {
        op: "im2col_3d",
        parts: &[F32, F16],
        template: "im2col_3d.comp",
        defines: &[("A_TYPE", "float"), ("D_TYPE", "float16_t")],
        with_base: true,
    },
    FixedKernel {
        op: "im2col_3d",
        parts: &[F32, F16, RTE],
        template: "im2col_3d.comp",
        defines: &[("A_TYPE", "float"), ("D_TYPE", "float16_t"), ("RTE16", "1")],
        with_base: true,
    },
    FixedKernel {
        op: "conv_transpose_1d",
        parts: &[F32],
        template: "conv_transpose_1d.comp",
        defines: &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")],
        with_base: false,
    },
    FixedKernel {
        op: "pool2d",
        parts: &[F32],
        template: "pool2d.comp",
        defines: &[("A_TYPE", "float"), ("D_TYPE", "float")],
        with_base: true,
    },
    FixedKernel {
        op: "conv2d_dw",
        parts: &[WHCN, F32],
        template: "conv2d_dw.comp",
        defines: &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float"), ("WHCN", "1")],
        with_base: true,
    },
    FixedKernel {
        op: "conv2d_dw",
        parts: &[CWHN, F32],
        template: "conv2d_dw.comp",
        defines: &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float"), ("CWHN", "1")],
        with_base: true,
    },
    FixedKernel {
        op: "conv2d_dw",
        parts: &[WHCN, F16, F32],
        template: "conv2d_dw.comp",
        defines: &[("A_TYPE", "float16_t"), ("B_TYPE", "float"), ("D_TYPE", "float"), ("WHCN", "1")],
        with_base: true,
    },
    FixedKernel {
        op: "conv2d_dw",
        parts: &[CWHN, F16, F32],
        template: "conv2d_dw.comp",
        defines: &[("A_TYPE", "float16_t"), ("B_TYPE", "float"), ("D_TYPE", "float"), ("CWHN", "1")],
        with_base: true,
    },
];

fn conv2d(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    let caps = builder.capabilities();
    for path in [MathPath::Fp16, MathPath::Coopmat2] {
        for f16_weights in [false, true] {
            for unroll in [true, false] {
                let variant = Conv2dVariant { f16_weights, unroll, path };
                if let Some(rule) = excluded_by(CONV2D_EXCLUSIONS, &variant, caps) {
                    trace!("skip conv2d {:?}: {}", variant, rule.reason);
                    continue;
                }
                let mut defines = defines! {
                    "A_TYPE" => glsl::float_or_half(f16_weights),
                    "B_TYPE" => glsl::FLOAT,
                    "D_TYPE" => glsl::FLOAT,
                    "USE_COLLECTIVES" => "1",
                    "UNROLL" => if unroll { "[[unroll]]" } else { "" },
                };
                if path == MathPath::Coopmat2 {
                    defines.set("COOPMAT2", "1");
                }
                builder.add(conv2d_key(variant), "conv2d_mm.comp", defines)?;
            }
        }
    }
    Ok(())
}

pub fn enumerate(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    conv2d(builder)?;
    add_fixed(builder, FIXED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capabilities;
    use crate::catalog::CatalogConfig;

    fn build(caps: Capabilities) -> crate::Catalog {
        let config = CatalogConfig::default().with_capabilities(caps);
        let mut builder = CatalogBuilder::new(&config);
        enumerate(&mut builder).unwrap();
        builder.finish()
    }

    #[test]
    fn test_conv2d_names() {
        let catalog = build(Capabilities::none());
        let names: Vec<_> = catalog.names().filter(|n| n.starts_with("conv2d_f")).collect();
        assert_eq!(
            names,
            vec![
                "conv2d_f16_f32",
                "conv2d_f16_f32_unroll",
                "conv2d_f32",
                "conv2d_f32_unroll",
            ]
        );
        assert_eq!(catalog.get("conv2d_f32").unwrap().defines.get("UNROLL"), Some(""));
        assert_eq!(
            catalog.get("conv2d_f16_f32_unroll").unwrap().defines.get("UNROLL"),
            Some("[[unroll]]")
        );
    }

    #[test]
    fn test_conv2d_coopmat2() {
        let catalog = build(Capabilities::all());
        let job = catalog.get("conv2d_f16_f32_cm2").unwrap();
        assert_eq!(job.defines.get("COOPMAT2"), Some("1"));
        assert_eq!(job.defines.get("UNROLL"), Some("[[unroll]]"));
        assert_eq!(job.target_env.flag(), "--target-env=vulkan1.3");
        assert!(!catalog.contains("conv2d_f16_f32_unroll_cm2"));
    }

    #[test]
    fn test_fixed_shapes() {
        let catalog = build(Capabilities::none());
        assert!(catalog.contains("im2col_3d_f32_f16_rte"));
        assert!(catalog.contains("conv2d_dw_cwhn_f16_f32"));
        assert_eq!(catalog.get("pool2d_f32").unwrap().defines.get("FLOAT_TYPE"), Some("float"));
        assert!(!catalog.get("conv_transpose_1d_f32").unwrap().defines.contains("FLOAT_TYPE"));
    }
}
