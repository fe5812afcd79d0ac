//! Activation functions, gated linear units and softmax.

use super::{add_fixed, FixedKernel};
use crate::catalog::{CatalogBuilder, CatalogError};
use crate::defines;
use crate::types::{glsl, DataType};
use crate::variant::{Part, VariantKey};

/// Unary activations, each built for f16 and f32.
pub const UNARY_OPS: [&str; 10] = [
    "exp",
    "gelu",
    "gelu_erf",
    "gelu_quick",
    "silu",
    "relu",
    "tanh",
    "sigmoid",
    "hardsigmoid",
    "hardswish",
];

/// Gated linear units, each built for f16 and f32 with and without
/// round-to-nearest-even stores.
pub const GLU_OPS: [&str; 6] = [
    "geglu",
    "reglu",
    "swiglu",
    "swiglu_oai",
    "geglu_erf",
    "geglu_quick",
];

const F32: Part = Part::Type(DataType::F32);
const F16: Part = Part::Type(DataType::F16);

const FIXED: &[FixedKernel] = &[
    FixedKernel {
        op: "leaky_relu",
        parts: &[F32],
        template: "leaky_relu.comp",
        defines: &[("A_TYPE", "float"), ("D_TYPE", "float")],
        with_base: false,
    },
    FixedKernel {
        op: "silu_back",
        parts: &[F32],
        template: "silu_back.comp",
        defines: &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")],
        with_base: false,
    },
    FixedKernel {
        op: "soft_max",
        parts: &[F32],
        template: "soft_max.comp",
        defines: &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")],
        with_base: true,
    },
    FixedKernel {
        op: "soft_max",
        parts: &[F32, F16],
        template: "soft_max.comp",
        defines: &[("A_TYPE", "float"), ("B_TYPE", "float16_t"), ("D_TYPE", "float")],
        with_base: true,
    },
    FixedKernel {
        op: "soft_max_back",
        parts: &[F32],
        template: "soft_max_back.comp",
        defines: &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")],
        with_base: true,
    },
];

pub fn enumerate(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    for op in UNARY_OPS {
        let template = format!("{}.comp", op);
        for half in [true, false] {
            let t = if half { DataType::F16 } else { DataType::F32 };
            let storage = glsl::float_or_half(half);
            builder.add(
                VariantKey::new(op).ty(t),
                template.as_str(),
                defines! { "A_TYPE" => storage, "D_TYPE" => storage },
            )?;
        }
    }

    for rte in [false, true] {
        for op in GLU_OPS {
            for half in [true, false] {
                let t = if half { DataType::F16 } else { DataType::F32 };
                let storage = glsl::float_or_half(half);
                builder.add(
                    VariantKey::new(op).ty(t).tag_if(rte, "rte"),
                    format!("{}.comp", op),
                    defines! {
                        "A_TYPE" => storage,
                        "D_TYPE" => storage,
                        "RTE16" => if rte { "1" } else { "0" },
                    },
                )?;
            }
        }
    }

    add_fixed(builder, FIXED)
}
