//! Dispatch tables the runtime indexes by feature flags instead of by name.

use crate::catalog::CatalogConfig;
use crate::families::elementwise::{binary_key, BinaryPrecision, BINARY_OPS};
use crate::families::matvec::{dmmv_key, Reduction};
use crate::types::DataType;
use crate::variant::VariantKey;

/// A fixed-shape array of job references, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    /// Symbol stem; the emitted arrays are `<symbol>_data` and `<symbol>_len`.
    pub symbol: String,
    pub dims: Vec<usize>,
    pub entries: Vec<VariantKey>,
}

impl LookupTable {
    /// `[2][2]...` suffix of the array declarations.
    pub fn shape(&self) -> String {
        self.dims.iter().map(|d| format!("[{}]", d)).collect()
    }

    /// Entry at a row-major index tuple.
    pub fn at(&self, index: &[usize]) -> Option<&VariantKey> {
        if index.len() != self.dims.len() {
            return None;
        }
        let mut flat = 0;
        for (i, d) in index.iter().zip(&self.dims) {
            if i >= d {
                return None;
            }
            flat = flat * d + i;
        }
        self.entries.get(flat)
    }
}

/// B operand types that get a matvec dispatch table for A type `a`.
pub fn dmmv_b_types(a: DataType, integer_dot: bool) -> Vec<DataType> {
    let mut b_types = vec![DataType::F16, DataType::F32];
    if integer_dot && a.is_legacy_quant() {
        b_types.push(DataType::Q8_1);
    }
    b_types
}

pub fn lookup_tables(config: &CatalogConfig) -> Vec<LookupTable> {
    let mut tables = Vec::new();

    for op in BINARY_OPS {
        tables.push(LookupTable {
            symbol: op.to_string(),
            dims: vec![2, 2, 2, 2],
            entries: BinaryPrecision::all()
                .into_iter()
                .map(|p| binary_key(op, p))
                .collect(),
        });
    }

    let integer_dot = config.capabilities.integer_dot;
    for b in [DataType::F16, DataType::F32, DataType::Q8_1] {
        for &a in &config.types {
            if !dmmv_b_types(a, integer_dot).contains(&b) {
                continue;
            }
            tables.push(LookupTable {
                symbol: format!("arr_dmmv_{}_{}_f32", a, b),
                dims: vec![3],
                entries: Reduction::ALL.iter().map(|&r| dmmv_key(a, b, r)).collect(),
            });
        }
    }

    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capabilities;

    #[test]
    fn test_binary_tables() {
        let config = CatalogConfig::default().with_types(&[]);
        let tables = lookup_tables(&config);
        assert_eq!(tables.len(), 5);

        let add_rms = &tables[4];
        assert_eq!(add_rms.symbol, "add_rms");
        assert_eq!(add_rms.shape(), "[2][2][2][2]");
        assert_eq!(add_rms.entries.len(), 16);
        assert_eq!(add_rms.at(&[1, 0, 1, 1]).unwrap().name(), "add_rms_f16_f32_f16_rte");
        assert_eq!(add_rms.at(&[0, 0, 0, 0]).unwrap().name(), "add_rms_f32_f32_f32");
        assert!(add_rms.at(&[2, 0, 0, 0]).is_none());
        assert!(add_rms.at(&[0, 0]).is_none());
    }

    #[test]
    fn test_dmmv_tables() {
        let config = CatalogConfig::default()
            .with_types(&[DataType::F32, DataType::Q4_0])
            .with_capabilities(Capabilities {
                integer_dot: true,
                ..Capabilities::none()
            });
        let symbols: Vec<_> = lookup_tables(&config)
            .into_iter()
            .skip(5)
            .map(|t| t.symbol)
            .collect();
        assert_eq!(
            symbols,
            vec![
                "arr_dmmv_f32_f16_f32",
                "arr_dmmv_q4_0_f16_f32",
                "arr_dmmv_f32_f32_f32",
                "arr_dmmv_q4_0_f32_f32",
                "arr_dmmv_q4_0_q8_1_f32",
            ]
        );
    }

    #[test]
    fn test_dmmv_axis_order() {
        let config = CatalogConfig::default()
            .with_types(&[DataType::Q4K])
            .with_capabilities(Capabilities::none());
        let table = lookup_tables(&config).pop().unwrap();
        let names: Vec<_> = table.entries.iter().map(VariantKey::name).collect();
        assert_eq!(
            names,
            vec![
                "mul_mat_vec_q4_k_f32_f32",
                "mul_mat_vec_q4_k_f32_f32_subgroup",
                "mul_mat_vec_q4_k_f32_f32_subgroup_no_shmem",
            ]
        );
    }
}
