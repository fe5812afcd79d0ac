//! Masking, embeddings, recurrent (RWKV) and optimizer kernels.

use super::{add_fixed, FixedKernel};
use crate::catalog::{CatalogBuilder, CatalogError};
use crate::types::DataType;
use crate::variant::Part;

const F32: Part = Part::Type(DataType::F32);

const A_F32: &[(&str, &str)] = &[("A_TYPE", "float")];

const KERNELS: &[FixedKernel] = &[
    FixedKernel {
        op: "diag_mask_inf",
        parts: &[F32],
        template: "diag_mask_inf.comp",
        defines: &[("A_TYPE", "float"), ("D_TYPE", "float")],
        with_base: false,
    },
    FixedKernel {
        op: "timestep_embedding",
        parts: &[F32],
        template: "timestep_embedding.comp",
        defines: &[("A_TYPE", "float"), ("D_TYPE", "float")],
        with_base: true,
    },
    FixedKernel { op: "rwkv_wkv6", parts: &[F32], template: "wkv6.comp", defines: A_F32, with_base: true },
    FixedKernel { op: "rwkv_wkv7", parts: &[F32], template: "wkv7.comp", defines: A_F32, with_base: true },
    FixedKernel {
        op: "opt_step_adamw",
        parts: &[F32],
        template: "opt_step_adamw.comp",
        defines: A_F32,
        with_base: true,
    },
    FixedKernel {
        op: "opt_step_sgd",
        parts: &[F32],
        template: "opt_step_sgd.comp",
        defines: A_F32,
        with_base: true,
    },
];

pub fn enumerate(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    add_fixed(builder, KERNELS)
}
