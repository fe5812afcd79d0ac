//! Data movement: plain and contiguous copies, row gather/scatter and
//! conversions to and from quantized blocks.

use super::base_defines;
use crate::catalog::{CatalogBuilder, CatalogError};
use crate::defines;
use crate::job::Defines;
use crate::types::{glsl, DataType};
use crate::variant::VariantKey;

/// (source, destination) pairs of the `cpy_*` kernels.
pub const COPY_PAIRS: [(DataType, DataType); 7] = [
    (DataType::F32, DataType::F32),
    (DataType::F32, DataType::F16),
    (DataType::F16, DataType::F16),
    (DataType::F16, DataType::F32),
    (DataType::F32, DataType::Bf16),
    (DataType::F32, DataType::I32),
    (DataType::I32, DataType::F32),
];

/// (source, destination) pairs of the `contig_cpy_*` kernels.
pub const CONTIG_COPY_PAIRS: [(DataType, DataType); 7] = [
    (DataType::F32, DataType::F32),
    (DataType::F32, DataType::I32),
    (DataType::I32, DataType::F32),
    (DataType::F32, DataType::F16),
    (DataType::F16, DataType::F16),
    (DataType::F16, DataType::F32),
    (DataType::F32, DataType::Bf16),
];

/// Quantized formats with f32 <-> block conversion kernels.
pub const QUANT_COPY_TYPES: [DataType; 6] = [
    DataType::Q4_0,
    DataType::Q4_1,
    DataType::Q5_0,
    DataType::Q5_1,
    DataType::Q8_0,
    DataType::Iq4Nl,
];

/// Destination formats of `set_rows`.
pub const SET_ROWS_TYPES: [DataType; 9] = [
    DataType::F32,
    DataType::F16,
    DataType::Bf16,
    DataType::Q4_0,
    DataType::Q4_1,
    DataType::Q5_0,
    DataType::Q5_1,
    DataType::Q8_0,
    DataType::Iq4Nl,
];

/// Defines for a plain conversion kernel from `src` to `dst`.
fn conversion_defines(src: DataType, dst: DataType) -> Defines {
    let storage = |t: DataType| match t {
        DataType::F16 => glsl::FLOAT16,
        DataType::I32 => glsl::INT,
        DataType::Bf16 => "uint16_t",
        _ => glsl::FLOAT,
    };
    let mut defines = defines! { "A_TYPE" => storage(src), "D_TYPE" => storage(dst) };
    if dst == DataType::Bf16 {
        defines.set("DATA_D_BF16", "1");
    }
    // f16 sources hit a compiler optimization bug
    if src == DataType::F16 {
        defines.set("OPTIMIZATION_ERROR_WORKAROUND", "1");
    }
    defines
}

fn copies(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    for (src, dst) in COPY_PAIRS {
        builder.add(
            VariantKey::new("cpy").ty(src).ty(dst),
            "copy.comp",
            conversion_defines(src, dst),
        )?;
    }
    for (src, dst) in CONTIG_COPY_PAIRS {
        builder.add(
            VariantKey::new("contig_cpy").ty(src).ty(dst),
            "contig_copy.comp",
            conversion_defines(src, dst),
        )?;
    }

    for t in QUANT_COPY_TYPES {
        if !builder.has_type(t) {
            continue;
        }
        let defines = defines! {
            t.define_key() => "1",
            "D_TYPE" => glsl::FLOAT,
            "FLOAT_TYPE" => glsl::FLOAT,
        };
        builder.add(
            VariantKey::new("cpy").ty(DataType::F32).ty(t),
            "copy_to_quant.comp",
            defines.clone(),
        )?;
        builder.add(
            VariantKey::new("cpy").ty(DataType::F32).ty(t).tag("rte"),
            "copy_to_quant.comp",
            defines.clone().with("RTE16", "1"),
        )?;
        builder.add(
            VariantKey::new("cpy").ty(t).ty(DataType::F32),
            "copy_from_quant.comp",
            defines,
        )?;
    }
    Ok(())
}

fn get_rows(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    let base = base_defines();
    for t in builder.types() {
        if t.is_k_quant() {
            continue;
        }
        let template = if t.is_float() {
            "get_rows.comp"
        } else {
            "get_rows_quant.comp"
        };
        let typed = base.merged(&defines! { t.define_key() => "1", "B_TYPE" => glsl::INT });

        let mut half_out = typed.clone().with("D_TYPE", glsl::FLOAT16);
        if t == DataType::F16 {
            half_out.set("OPTIMIZATION_ERROR_WORKAROUND", "1");
        }
        builder.add(VariantKey::new("get_rows").ty(t), template, half_out)?;
        builder.add(
            VariantKey::new("get_rows").ty(t).ty(DataType::F32),
            template,
            typed.with("D_TYPE", glsl::FLOAT),
        )?;
    }
    Ok(())
}

fn set_rows(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    for t in SET_ROWS_TYPES {
        if !builder.has_type(t) {
            continue;
        }
        let defines = defines! {
            "SET_ROWS" => "1",
            t.define_key() => "1",
            "B_TYPE" => "uvec2",
            "D_TYPE" => glsl::FLOAT,
            "FLOAT_TYPE" => glsl::FLOAT,
        };
        builder.add(
            VariantKey::new("set_rows").ty(t),
            "copy_to_quant.comp",
            defines.clone(),
        )?;
        builder.add(
            VariantKey::new("set_rows").ty(t).tag("rte"),
            "copy_to_quant.comp",
            defines.with("RTE16", "1"),
        )?;
    }
    Ok(())
}

pub fn enumerate(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    copies(builder)?;
    get_rows(builder)?;
    set_rows(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogConfig;

    fn build(types: &[DataType]) -> crate::Catalog {
        let config = CatalogConfig::default().with_types(types);
        let mut builder = CatalogBuilder::new(&config);
        enumerate(&mut builder).unwrap();
        builder.finish()
    }

    #[test]
    fn test_conversion_defines() {
        let catalog = build(&DataType::SUPPORTED);
        let bf16 = catalog.get("cpy_f32_bf16").unwrap();
        assert_eq!(bf16.defines.get("D_TYPE"), Some("uint16_t"));
        assert_eq!(bf16.defines.get("DATA_D_BF16"), Some("1"));
        assert!(!bf16.optimize);

        let f16 = catalog.get("contig_cpy_f16_f32").unwrap();
        assert_eq!(f16.defines.get("OPTIMIZATION_ERROR_WORKAROUND"), Some("1"));
        assert!(!catalog
            .get("cpy_f32_f16")
            .unwrap()
            .defines
            .contains("OPTIMIZATION_ERROR_WORKAROUND"));
        assert_eq!(catalog.get("cpy_i32_f32").unwrap().defines.get("A_TYPE"), Some("int"));
    }

    #[test]
    fn test_get_rows_skips_k_quants() {
        let catalog = build(&DataType::SUPPORTED);
        assert!(catalog.contains("get_rows_q4_0"));
        assert!(catalog.contains("get_rows_iq4_xs_f32"));
        assert!(!catalog.contains("get_rows_q4_k"));
        assert_eq!(catalog.get("get_rows_f16").unwrap().template, "get_rows.comp");
        assert_eq!(catalog.get("get_rows_q8_0").unwrap().template, "get_rows_quant.comp");
    }

    #[test]
    fn test_typed_copies_follow_configured_types() {
        let catalog = build(&[DataType::F32, DataType::Q8_0]);
        assert!(catalog.contains("cpy_f32_q8_0_rte"));
        assert!(catalog.contains("cpy_q8_0_f32"));
        assert!(!catalog.contains("cpy_f32_q4_0"));
        assert!(catalog.contains("set_rows_f32"));
        assert!(!catalog.contains("set_rows_f16"));
        // storage conversions are always present
        assert!(catalog.contains("cpy_f16_f16"));
    }
}
