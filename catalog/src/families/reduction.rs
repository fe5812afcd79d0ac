//! Reductions, sorting and the split-k combine pass.

use super::{add_fixed, FixedKernel};
use crate::catalog::{CatalogBuilder, CatalogError};
use crate::types::DataType;
use crate::variant::Part;

const F32: Part = Part::Type(DataType::F32);
const I32: Part = Part::Type(DataType::I32);

const KERNELS: &[FixedKernel] = &[
    FixedKernel {
        op: "argsort",
        parts: &[F32],
        template: "argsort.comp",
        defines: &[("A_TYPE", "float")],
        with_base: false,
    },
    FixedKernel {
        op: "argmax",
        parts: &[F32],
        template: "argmax.comp",
        defines: &[("A_TYPE", "float"), ("D_TYPE", "int")],
        with_base: true,
    },
    FixedKernel {
        op: "sum_rows",
        parts: &[F32],
        template: "sum_rows.comp",
        defines: &[("A_TYPE", "float"), ("D_TYPE", "float")],
        with_base: true,
    },
    FixedKernel {
        op: "count_equal",
        parts: &[I32],
        template: "count_equal.comp",
        defines: &[("A_TYPE", "int"), ("B_TYPE", "int"), ("D_TYPE", "int")],
        with_base: true,
    },
    FixedKernel {
        op: "split_k_reduce",
        parts: &[],
        template: "mul_mat_split_k_reduce.comp",
        defines: &[],
        with_base: false,
    },
];

pub fn enumerate(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    add_fixed(builder, KERNELS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogConfig;

    #[test]
    fn test_reductions() {
        let config = CatalogConfig::default();
        let mut builder = CatalogBuilder::new(&config);
        enumerate(&mut builder).unwrap();
        let catalog = builder.finish();

        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.get("argmax_f32").unwrap().defines.get("D_TYPE"), Some("int"));
        assert!(catalog.get("split_k_reduce").unwrap().defines.is_empty());
        assert!(catalog.contains("count_equal_i32"));
    }
}
