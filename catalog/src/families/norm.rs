//! Normalization kernels.

use super::{add_fixed, FixedKernel};
use crate::catalog::{CatalogBuilder, CatalogError};
use crate::types::DataType;
use crate::variant::Part;

const F32: Part = Part::Type(DataType::F32);

const AD: &[(&str, &str)] = &[("A_TYPE", "float"), ("D_TYPE", "float")];
const ABD: &[(&str, &str)] = &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")];

const KERNELS: &[FixedKernel] = &[
    FixedKernel { op: "norm", parts: &[F32], template: "norm.comp", defines: AD, with_base: true },
    FixedKernel { op: "group_norm", parts: &[F32], template: "group_norm.comp", defines: AD, with_base: true },
    FixedKernel { op: "rms_norm", parts: &[F32], template: "rms_norm.comp", defines: ABD, with_base: true },
    FixedKernel {
        op: "rms_norm_partials",
        parts: &[F32],
        template: "rms_norm_partials.comp",
        defines: ABD,
        with_base: true,
    },
    FixedKernel { op: "rms_norm_back", parts: &[F32], template: "rms_norm_back.comp", defines: ABD, with_base: true },
    FixedKernel { op: "l2_norm", parts: &[F32], template: "l2_norm.comp", defines: AD, with_base: true },
];

pub fn enumerate(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    add_fixed(builder, KERNELS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogConfig;

    #[test]
    fn test_norms_carry_base_float_type() {
        let config = CatalogConfig::default();
        let mut builder = CatalogBuilder::new(&config);
        enumerate(&mut builder).unwrap();
        let catalog = builder.finish();

        assert_eq!(catalog.len(), 6);
        for job in catalog.jobs() {
            assert_eq!(job.defines.get("FLOAT_TYPE"), Some("float"), "{}", job.name);
        }
        assert_eq!(catalog.get("rms_norm_f32").unwrap().defines.get("B_TYPE"), Some("float"));
    }
}
