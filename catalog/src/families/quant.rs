//! Block dequantization to f16 and the q8_1 activation quantizer.

use super::base_defines;
use crate::catalog::{CatalogBuilder, CatalogError};
use crate::defines;
use crate::types::{glsl, DataType};
use crate::variant::VariantKey;

/// `dequant_<t>`; f16 and bf16 are converted by the copy kernels instead.
pub fn dequant_key(t: DataType) -> Option<VariantKey> {
    match t {
        DataType::F16 | DataType::Bf16 => None,
        _ => Some(VariantKey::new("dequant").ty(t)),
    }
}

/// `quantize_q8_1[_x4][_subgroup]`.
pub fn quantize_key(x4: bool, subgroup: bool) -> VariantKey {
    VariantKey::new("quantize")
        .ty(DataType::Q8_1)
        .tag_if(x4, "x4")
        .tag_if(subgroup, "subgroup")
}

pub fn enumerate(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    let base = base_defines();
    for t in builder.types() {
        let Some(key) = dequant_key(t) else {
            continue;
        };
        builder.add(
            key,
            format!("dequant_{}.comp", t),
            base.merged(&defines! { t.define_key() => "1", "D_TYPE" => glsl::FLOAT16 }),
        )?;
    }

    for x4 in [false, true] {
        for subgroup in [false, true] {
            let mut defines = defines! {};
            if x4 {
                defines.set("QBLOCK_X4", "1");
            }
            if subgroup {
                defines.set("USE_SUBGROUPS", "1");
            }
            builder.add(quantize_key(x4, subgroup), "quantize_q8_1.comp", defines)?;
        }
    }
    Ok(())
}
