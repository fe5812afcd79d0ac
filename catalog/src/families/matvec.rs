//! Matrix-vector multiply (`mul_mat_vec`) variants.

use super::base_defines;
use crate::catalog::{CatalogBuilder, CatalogError};
use crate::defines;
use crate::job::Defines;
use crate::types::{glsl, DataType};
use crate::variant::VariantKey;

/// Final reduction strategy of a matvec workgroup. The order is the axis
/// order of the `arr_dmmv_*` dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reduction {
    SharedMemory,
    Subgroup,
    SubgroupNoShmem,
}

impl Reduction {
    pub const ALL: [Reduction; 3] = [
        Reduction::SharedMemory,
        Reduction::Subgroup,
        Reduction::SubgroupNoShmem,
    ];

    fn apply(self, key: VariantKey) -> VariantKey {
        match self {
            Reduction::SharedMemory => key,
            Reduction::Subgroup => key.tag("subgroup"),
            Reduction::SubgroupNoShmem => key.tag("subgroup").tag("no_shmem"),
        }
    }

    fn define(self) -> Option<&'static str> {
        match self {
            Reduction::SharedMemory => None,
            Reduction::Subgroup => Some("USE_SUBGROUP_ADD"),
            Reduction::SubgroupNoShmem => Some("USE_SUBGROUP_ADD_NO_SHMEM"),
        }
    }
}

/// `mul_mat_vec_<a>_<b>_f32[_subgroup[_no_shmem]]`.
pub fn dmmv_key(a: DataType, b: DataType, reduction: Reduction) -> VariantKey {
    reduction.apply(VariantKey::new("mul_mat_vec").ty(a).ty(b).ty(DataType::F32))
}

/// Shader source for A type `t`: k-quants and the small iq formats have
/// dedicated sources.
pub fn template(t: DataType) -> String {
    let s = t.as_str();
    if t.is_k_quant() || s.starts_with("iq1_") || s.starts_with("iq2_") || s.starts_with("iq3_") {
        format!("mul_mat_vec_{}.comp", s)
    } else {
        "mul_mat_vec.comp".to_string()
    }
}

fn b_defines(b: DataType) -> Defines {
    if b == DataType::F16 {
        defines! { "B_TYPE" => glsl::FLOAT16, "B_TYPE_VEC2" => "f16vec2", "B_TYPE_VEC4" => "f16vec4" }
    } else {
        defines! { "B_TYPE" => glsl::FLOAT, "B_TYPE_VEC2" => "vec2", "B_TYPE_VEC4" => "vec4" }
    }
}

pub fn enumerate(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    let base = base_defines();
    let integer_dot = builder.capabilities().integer_dot;

    for a in builder.types() {
        let template = template(a);
        let typed = base.merged(&defines! { a.define_key() => "1", "D_TYPE" => glsl::FLOAT });

        for b in [DataType::F32, DataType::F16] {
            for reduction in Reduction::ALL {
                let mut defines = typed.merged(&b_defines(b));
                if let Some(switch) = reduction.define() {
                    defines.set(switch, "1");
                }
                builder.add(dmmv_key(a, b, reduction), template.as_str(), defines)?;
            }
        }

        builder.add(
            VariantKey::new("mul_mat_vec_id").ty(a).ty(DataType::F32),
            template.as_str(),
            typed
                .merged(&b_defines(DataType::F32))
                .with("MUL_MAT_ID", "1"),
        )?;

        if integer_dot && a.is_legacy_quant() {
            let q8 = typed.merged(&defines! {
                "FLOAT_TYPE" => glsl::FLOAT,
                "FLOAT_TYPE_VEC2" => "vec2",
                "ACC_TYPE" => glsl::FLOAT,
            });
            for reduction in Reduction::ALL {
                let mut defines = q8.clone();
                if let Some(switch) = reduction.define() {
                    defines.set(switch, "1");
                }
                builder.add(
                    dmmv_key(a, DataType::Q8_1, reduction),
                    "mul_mat_vecq.comp",
                    defines,
                )?;
            }
        }
    }

    let permuted = defines! {
        "A_TYPE" => glsl::FLOAT16,
        "A_TYPE_VEC4" => "f16vec4",
        "B_TYPE" => glsl::FLOAT,
        "B_TYPE_VEC4" => "vec4",
        "D_TYPE" => glsl::FLOAT,
    };
    builder.add(
        VariantKey::new("mul_mat_vec_p021")
            .ty(DataType::F16)
            .ty(DataType::F32)
            .tag("subgroup_add"),
        "mul_mat_vec_p021.comp",
        permuted.clone().with("USE_SUBGROUP_ADD", "1"),
    )?;
    builder.add(
        VariantKey::new("mul_mat_vec_p021").ty(DataType::F16).ty(DataType::F32),
        "mul_mat_vec_p021.comp",
        permuted.clone(),
    )?;
    builder.add(
        VariantKey::new("mul_mat_vec_nc").ty(DataType::F16).ty(DataType::F32),
        "mul_mat_vec_nc.comp",
        permuted,
    )?;

    Ok(())
}
