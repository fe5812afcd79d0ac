//! Element-wise arithmetic.
//!
//! The binary ops are generated over every combination of operand and
//! result precision plus the round-to-even switch; the runtime reaches them
//! through the `<op>_data[2][2][2][2]` tables.

use super::{add_fixed, FixedKernel};
use crate::catalog::{CatalogBuilder, CatalogError};
use crate::defines;
use crate::types::{glsl, DataType};
use crate::variant::{Part, VariantKey};

/// Ops with a precision-specialized binary kernel, in table order.
pub const BINARY_OPS: [&str; 5] = ["add", "sub", "mul", "div", "add_rms"];

/// One point of the binary-op axes. Field order is the table axis order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinaryPrecision {
    pub src0_f16: bool,
    pub src1_f16: bool,
    pub dst_f16: bool,
    pub rte: bool,
}

impl BinaryPrecision {
    /// All 16 points, row-major in axis order.
    pub fn all() -> Vec<BinaryPrecision> {
        let mut result = Vec::with_capacity(16);
        for src0_f16 in [false, true] {
            for src1_f16 in [false, true] {
                for dst_f16 in [false, true] {
                    for rte in [false, true] {
                        result.push(BinaryPrecision {
                            src0_f16,
                            src1_f16,
                            dst_f16,
                            rte,
                        });
                    }
                }
            }
        }
        result
    }
}

fn float_type(f16: bool) -> DataType {
    if f16 {
        DataType::F16
    } else {
        DataType::F32
    }
}

/// `<op>_<src0>_<src1>_<dst>[_rte]`.
pub fn binary_key(op: &'static str, p: BinaryPrecision) -> VariantKey {
    VariantKey::new(op)
        .ty(float_type(p.src0_f16))
        .ty(float_type(p.src1_f16))
        .ty(float_type(p.dst_f16))
        .tag_if(p.rte, "rte")
}

const F32: Part = Part::Type(DataType::F32);
const F16: Part = Part::Type(DataType::F16);
const I32: Part = Part::Type(DataType::I32);

const ABD_F32: &[(&str, &str)] = &[
    ("A_TYPE", "float"),
    ("B_TYPE", "float"),
    ("D_TYPE", "float"),
    ("FLOAT_TYPE", "float"),
];
const AD_F32: &[(&str, &str)] = &[("A_TYPE", "float"), ("D_TYPE", "float")];
const AD_F32_FLOAT: &[(&str, &str)] = &[
    ("A_TYPE", "float"),
    ("D_TYPE", "float"),
    ("FLOAT_TYPE", "float"),
];

const FIXED: &[FixedKernel] = &[
    FixedKernel { op: "sub", parts: &[F32], template: "sub.comp", defines: ABD_F32, with_base: false },
    FixedKernel { op: "acc", parts: &[F32], template: "acc.comp", defines: ABD_F32, with_base: false },
    FixedKernel { op: "mul", parts: &[F32], template: "mul.comp", defines: ABD_F32, with_base: false },
    FixedKernel { op: "div", parts: &[F32], template: "div.comp", defines: ABD_F32, with_base: false },
    FixedKernel { op: "repeat", parts: &[F32], template: "repeat.comp", defines: AD_F32, with_base: false },
    FixedKernel { op: "repeat_back", parts: &[F32], template: "repeat_back.comp", defines: AD_F32, with_base: false },
    FixedKernel { op: "scale", parts: &[F32], template: "scale.comp", defines: AD_F32_FLOAT, with_base: false },
    FixedKernel { op: "sqr", parts: &[F32], template: "square.comp", defines: AD_F32_FLOAT, with_base: false },
    FixedKernel { op: "sqrt", parts: &[F32], template: "sqrt.comp", defines: AD_F32_FLOAT, with_base: false },
    FixedKernel { op: "sin", parts: &[F32], template: "sin.comp", defines: AD_F32_FLOAT, with_base: false },
    FixedKernel { op: "cos", parts: &[F32], template: "cos.comp", defines: AD_F32_FLOAT, with_base: false },
    FixedKernel { op: "clamp", parts: &[F32], template: "clamp.comp", defines: AD_F32_FLOAT, with_base: false },
    FixedKernel { op: "pad", parts: &[F32], template: "pad.comp", defines: AD_F32, with_base: false },
    FixedKernel {
        op: "concat",
        parts: &[F32],
        template: "concat.comp",
        defines: &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")],
        with_base: false,
    },
    FixedKernel {
        op: "concat",
        parts: &[F16],
        template: "concat.comp",
        defines: &[
            ("A_TYPE", "float16_t"),
            ("B_TYPE", "float16_t"),
            ("D_TYPE", "float16_t"),
            ("OPTIMIZATION_ERROR_WORKAROUND", "1"),
        ],
        with_base: false,
    },
    FixedKernel {
        op: "concat",
        parts: &[I32],
        template: "concat.comp",
        defines: &[("A_TYPE", "int"), ("B_TYPE", "int"), ("D_TYPE", "int")],
        with_base: false,
    },
    FixedKernel {
        op: "upscale",
        parts: &[F32],
        template: "upscale.comp",
        defines: &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")],
        with_base: false,
    },
    FixedKernel { op: "roll", parts: &[F32], template: "roll.comp", defines: AD_F32, with_base: true },
    FixedKernel {
        op: "add_id",
        parts: &[F32],
        template: "add_id.comp",
        defines: &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")],
        with_base: true,
    },
    FixedKernel {
        op: "multi_add",
        parts: &[F32],
        template: "multi_add.comp",
        defines: &[
            ("A_TYPE", "float"),
            ("B_TYPE", "float"),
            ("D_TYPE", "float"),
            ("FLOAT_TYPE", "float"),
            ("RTE16", "1"),
            ("ADD_RMS", "0"),
        ],
        with_base: false,
    },
    FixedKernel {
        op: "multi_add_rms",
        parts: &[F32],
        template: "multi_add.comp",
        defines: &[
            ("A_TYPE", "float"),
            ("B_TYPE", "float"),
            ("D_TYPE", "float"),
            ("FLOAT_TYPE", "float"),
            ("RTE16", "1"),
            ("ADD_RMS", "1"),
        ],
        with_base: false,
    },
];

pub fn enumerate(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    for op in BINARY_OPS {
        // add_rms is add with a fused sum of squares
        let template = format!("{}.comp", if op == "add_rms" { "add" } else { op });
        for p in BinaryPrecision::all() {
            builder.add(
                binary_key(op, p),
                template.as_str(),
                defines! {
                    "A_TYPE" => glsl::float_or_half(p.src0_f16),
                    "B_TYPE" => glsl::float_or_half(p.src1_f16),
                    "D_TYPE" => glsl::float_or_half(p.dst_f16),
                    "FLOAT_TYPE" => glsl::FLOAT,
                    "RTE16" => if p.rte { "1" } else { "0" },
                    "ADD_RMS" => if op == "add_rms" { "1" } else { "0" },
                },
            )?;
        }
    }

    add_fixed(builder, FIXED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogConfig;

    #[test]
    fn test_sixteen_variants_per_op() {
        let config = CatalogConfig::default();
        let mut builder = CatalogBuilder::new(&config);
        enumerate(&mut builder).unwrap();
        let catalog = builder.finish();

        for op in BINARY_OPS {
            let count = BinaryPrecision::all()
                .into_iter()
                .filter(|p| catalog.contains_key(&binary_key(op, *p)))
                .count();
            assert_eq!(count, 16, "{}", op);
        }

        let job = catalog.get("add_rms_f16_f32_f16_rte").unwrap();
        assert_eq!(job.template, "add.comp");
        assert_eq!(job.defines.get("ADD_RMS"), Some("1"));
        assert_eq!(job.defines.get("A_TYPE"), Some("float16_t"));
        assert_eq!(job.defines.get("B_TYPE"), Some("float"));
        assert_eq!(job.defines.get("RTE16"), Some("1"));

        // the plain f32 kernels sit beside the precision grid
        assert!(catalog.contains("sub_f32"));
        assert!(catalog.contains("sub_f32_f32_f32"));
    }

    #[test]
    fn test_axis_order() {
        let all = BinaryPrecision::all();
        assert_eq!(binary_key("mul", all[0]).name(), "mul_f32_f32_f32");
        assert_eq!(binary_key("mul", all[1]).name(), "mul_f32_f32_f32_rte");
        assert_eq!(binary_key("mul", all[2]).name(), "mul_f32_f32_f16");
        assert_eq!(binary_key("mul", all[8]).name(), "mul_f16_f32_f32");
        assert_eq!(binary_key("mul", all[15]).name(), "mul_f16_f16_f16_rte");
    }
}
