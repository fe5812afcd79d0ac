//! Flash attention variants.
//!
//! Queries are always f32 and K/V are f16 or quantized. The cooperative
//! matrix 2 path dequantizes any K/V type in-shader; the scalar and
//! cooperative matrix 1 paths only cover f16 and two legacy quants.

use log::trace;

use super::{base_defines, excluded_by, Exclusion};
use crate::catalog::{CatalogBuilder, CatalogError};
use crate::defines;
use crate::job::Defines;
use crate::types::{glsl, DataType};
use crate::variant::{MathPath, VariantKey};

/// One K/V type on one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttentionVariant {
    pub kv: DataType,
    pub path: MathPath,
}

/// K/V types the scalar and cooperative matrix 1 shaders support.
pub const SCALAR_KV_TYPES: [DataType; 3] = [DataType::F16, DataType::Q4_0, DataType::Q8_0];

pub const PATHS: [MathPath; 3] = [MathPath::Coopmat2, MathPath::Coopmat1, MathPath::Fp16];

pub const EXCLUSIONS: &[Exclusion<AttentionVariant>] = &[
    Exclusion {
        reason: "K/V are never f32",
        excludes: |v, _| v.kv == DataType::F32,
    },
    Exclusion {
        reason: "bf16 K/V is not supported",
        excludes: |v, _| v.kv == DataType::Bf16,
    },
    Exclusion {
        reason: "cooperative matrix 2 support not compiled in",
        excludes: |v, caps| v.path == MathPath::Coopmat2 && !caps.coopmat2,
    },
    Exclusion {
        reason: "cooperative matrix support not compiled in",
        excludes: |v, caps| v.path == MathPath::Coopmat1 && !caps.coopmat,
    },
    Exclusion {
        reason: "only f16, q4_0 and q8_0 have non-coopmat2 shaders",
        excludes: |v, _| v.path != MathPath::Coopmat2 && !SCALAR_KV_TYPES.contains(&v.kv),
    },
];

pub fn key(kv: DataType, path: MathPath, f16acc: bool) -> VariantKey {
    VariantKey::new("flash_attn")
        .ty(DataType::F32)
        .ty(DataType::F16)
        .ty(kv)
        .path(path)
        .f16acc(f16acc)
}

fn accumulator_defines(f16acc: bool) -> Defines {
    let mut defines = base_defines().merged(&defines! {
        "ACC_TYPE" => glsl::float_or_half(f16acc),
        "ACC_TYPEV4" => if f16acc { "f16vec4" } else { "vec4" },
    });
    if f16acc {
        defines.set("ACC_TYPE_MAX", "\"float16_t(65504.0)\"");
    }
    defines
}

fn variant_defines(variant: AttentionVariant) -> Defines {
    let mut defines = defines! { "Q_TYPE" => glsl::FLOAT, "D_TYPE" => glsl::FLOAT };
    let kv = variant.kv;
    if kv != DataType::F16 {
        defines.set(kv.define_key(), "1");
        defines.set("BLOCK_SIZE", format!("QUANT_K_{}", kv.upper()));
        if variant.path == MathPath::Coopmat2 {
            defines.set("DEQUANTFUNC", format!("dequantFunc{}", kv.upper()));
        }
    }
    if variant.path == MathPath::Coopmat1 {
        defines.set("COOPMAT", "1");
    }
    defines
}

fn template(path: MathPath) -> &'static str {
    match path {
        MathPath::Coopmat2 => "flash_attn_cm2.comp",
        MathPath::Coopmat1 => "flash_attn_cm1.comp",
        MathPath::Fp16 | MathPath::Fp32 => "flash_attn.comp",
    }
}

pub fn enumerate(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    let caps = builder.capabilities();
    for f16acc in [false, true] {
        let base = accumulator_defines(f16acc);
        for kv in builder.types() {
            for path in PATHS {
                let variant = AttentionVariant { kv, path };
                if let Some(rule) = excluded_by(EXCLUSIONS, &variant, caps) {
                    trace!("skip flash attention {:?}: {}", variant, rule.reason);
                    continue;
                }
                builder.add(
                    key(kv, path, f16acc),
                    template(path),
                    base.merged(&variant_defines(variant)),
                )?;
            }
        }
    }

    builder.add(
        VariantKey::new("fa_split_k_reduce"),
        "flash_attn_split_k_reduce.comp",
        Defines::new(),
    )
}
