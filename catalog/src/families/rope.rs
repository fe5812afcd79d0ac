//! Rotary position embedding kernels.

use crate::catalog::{CatalogBuilder, CatalogError};
use crate::defines;
use crate::types::{glsl, DataType};
use crate::variant::VariantKey;

/// Rope flavours; each has its own shader source.
pub const MODES: [&str; 4] = ["rope_norm", "rope_neox", "rope_multi", "rope_vision"];

pub fn enumerate(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    for op in MODES {
        let template = format!("{}.comp", op);
        builder.add(
            VariantKey::new(op).ty(DataType::F32),
            template.as_str(),
            defines! { "A_TYPE" => glsl::FLOAT, "D_TYPE" => glsl::FLOAT },
        )?;
        // only an f16 destination needs the rounding choice
        for rte in [false, true] {
            let mut defines = defines! { "A_TYPE" => glsl::FLOAT16, "D_TYPE" => glsl::FLOAT16 };
            if rte {
                defines.set("RTE16", "1");
            }
            builder.add(
                VariantKey::new(op).ty(DataType::F16).tag_if(rte, "rte"),
                template.as_str(),
                defines,
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogConfig;

    #[test]
    fn test_rope_variants() {
        let config = CatalogConfig::default();
        let mut builder = CatalogBuilder::new(&config);
        enumerate(&mut builder).unwrap();
        let catalog = builder.finish();

        assert_eq!(catalog.len(), 12);
        let job = catalog.get("rope_vision_f16_rte").unwrap();
        assert_eq!(job.template, "rope_vision.comp");
        assert_eq!(job.defines.get("RTE16"), Some("1"));
        assert!(!catalog.get("rope_neox_f16").unwrap().defines.contains("RTE16"));
        assert!(!catalog.contains("rope_norm_f32_rte"));
    }
}
