//! Tensor data types that appear in shader variant names.
//!
//! Every token here is both a name component (`q4_0` in
//! `matmul_q4_0_f32_aligned`) and, for the types a kernel reads as operand A,
//! the suffix of a `DATA_A_*` preprocessor switch in the shader sources.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// A tensor element type, plain or block-quantized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum DataType {
    F32,
    F16,
    Bf16,
    I32,
    Q4_0,
    Q4_1,
    Q5_0,
    Q5_1,
    Q8_0,
    Q8_1,
    Q2K,
    Q3K,
    Q4K,
    Q5K,
    Q6K,
    Iq1S,
    Iq1M,
    Iq2Xxs,
    Iq2Xs,
    Iq2S,
    Iq3Xxs,
    Iq3S,
    Iq4Xs,
    Iq4Nl,
    Mxfp4,
}

impl DataType {
    /// The types a full catalog is generated for, in their canonical order.
    ///
    /// `q8_1` and `i32` only ever show up as secondary operands and are not
    /// part of this list.
    pub const SUPPORTED: [DataType; 23] = [
        DataType::F32,
        DataType::F16,
        DataType::Q4_0,
        DataType::Q4_1,
        DataType::Q5_0,
        DataType::Q5_1,
        DataType::Q8_0,
        DataType::Q2K,
        DataType::Q3K,
        DataType::Q4K,
        DataType::Q5K,
        DataType::Q6K,
        DataType::Iq1S,
        DataType::Iq1M,
        DataType::Iq2Xxs,
        DataType::Iq2Xs,
        DataType::Iq2S,
        DataType::Iq3Xxs,
        DataType::Iq3S,
        DataType::Iq4Xs,
        DataType::Iq4Nl,
        DataType::Mxfp4,
        DataType::Bf16,
    ];

    /// Formats eligible for integer-dot acceleration.
    pub const LEGACY_QUANTS: [DataType; 5] = [
        DataType::Q4_0,
        DataType::Q4_1,
        DataType::Q5_0,
        DataType::Q5_1,
        DataType::Q8_0,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            DataType::F32 => "f32",
            DataType::F16 => "f16",
            DataType::Bf16 => "bf16",
            DataType::I32 => "i32",
            DataType::Q4_0 => "q4_0",
            DataType::Q4_1 => "q4_1",
            DataType::Q5_0 => "q5_0",
            DataType::Q5_1 => "q5_1",
            DataType::Q8_0 => "q8_0",
            DataType::Q8_1 => "q8_1",
            DataType::Q2K => "q2_k",
            DataType::Q3K => "q3_k",
            DataType::Q4K => "q4_k",
            DataType::Q5K => "q5_k",
            DataType::Q6K => "q6_k",
            DataType::Iq1S => "iq1_s",
            DataType::Iq1M => "iq1_m",
            DataType::Iq2Xxs => "iq2_xxs",
            DataType::Iq2Xs => "iq2_xs",
            DataType::Iq2S => "iq2_s",
            DataType::Iq3Xxs => "iq3_xxs",
            DataType::Iq3S => "iq3_s",
            DataType::Iq4Xs => "iq4_xs",
            DataType::Iq4Nl => "iq4_nl",
            DataType::Mxfp4 => "mxfp4",
        }
    }

    /// Upper-case token, as used in macro names (`Q4_K`, `IQ2_XXS`).
    pub fn upper(self) -> String {
        self.as_str().to_ascii_uppercase()
    }

    /// The `DATA_A_<TYPE>` switch that selects this type in a shader.
    pub fn define_key(self) -> String {
        format!("DATA_A_{}", self.upper())
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::F32 | DataType::F16 | DataType::Bf16)
    }

    pub fn is_quantized(self) -> bool {
        !self.is_float() && self != DataType::I32
    }

    pub fn is_legacy_quant(self) -> bool {
        Self::LEGACY_QUANTS.contains(&self)
    }

    pub fn is_k_quant(self) -> bool {
        self.as_str().ends_with("_k")
    }

    pub fn is_iq_quant(self) -> bool {
        self.as_str().starts_with("iq")
    }

    /// Elements loaded per thread by the matmul shaders for a quantized A
    /// operand. Narrow-block formats load wide.
    pub fn matmul_load_vec(self) -> u32 {
        match self {
            DataType::Q4_0
            | DataType::Q4_1
            | DataType::Iq1S
            | DataType::Iq1M
            | DataType::Iq2Xxs
            | DataType::Iq2Xs
            | DataType::Iq2S => 8,
            DataType::Q5_0
            | DataType::Q5_1
            | DataType::Q8_0
            | DataType::Iq3Xxs
            | DataType::Iq3S
            | DataType::Iq4Nl
            | DataType::Mxfp4 => 4,
            _ => 2,
        }
    }

    /// Look a token up in the full list of known types.
    pub fn from_token(token: &str) -> Option<DataType> {
        ALL.iter().copied().find(|t| t.as_str() == token)
    }
}

const ALL: [DataType; 25] = [
    DataType::F32,
    DataType::F16,
    DataType::Bf16,
    DataType::I32,
    DataType::Q4_0,
    DataType::Q4_1,
    DataType::Q5_0,
    DataType::Q5_1,
    DataType::Q8_0,
    DataType::Q8_1,
    DataType::Q2K,
    DataType::Q3K,
    DataType::Q4K,
    DataType::Q5K,
    DataType::Q6K,
    DataType::Iq1S,
    DataType::Iq1M,
    DataType::Iq2Xxs,
    DataType::Iq2Xs,
    DataType::Iq2S,
    DataType::Iq3Xxs,
    DataType::Iq3S,
    DataType::Iq4Xs,
    DataType::Iq4Nl,
    DataType::Mxfp4,
];

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::from_token(s).ok_or_else(|| format!("unknown data type '{}'", s))
    }
}

impl TryFrom<String> for DataType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// GLSL spelling of a scalar element type.
pub mod glsl {
    pub const FLOAT: &str = "float";
    pub const FLOAT16: &str = "float16_t";
    pub const INT: &str = "int";

    /// `float16_t` when `half` is set, `float` otherwise.
    pub fn float_or_half(half: bool) -> &'static str {
        if half {
            FLOAT16
        } else {
            FLOAT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_round_trip_through_parse() {
        for t in ALL {
            assert_eq!(t.as_str().parse::<DataType>().unwrap(), t);
        }
        assert!("q9_9".parse::<DataType>().is_err());
    }

    #[test]
    fn test_type_classes() {
        assert!(!DataType::F16.is_quantized());
        assert!(!DataType::Bf16.is_quantized());
        assert!(DataType::Iq4Nl.is_quantized());
        assert!(DataType::Q4K.is_k_quant());
        assert!(!DataType::Q4_0.is_k_quant());
        assert!(DataType::Iq2Xxs.is_iq_quant());
        assert!(DataType::Q8_0.is_legacy_quant());
        assert!(!DataType::Q2K.is_legacy_quant());
    }

    #[test]
    fn test_define_key_is_upper_case() {
        assert_eq!(DataType::Iq2Xxs.define_key(), "DATA_A_IQ2_XXS");
        assert_eq!(DataType::Q4K.define_key(), "DATA_A_Q4_K");
    }

    #[test]
    fn test_load_widths() {
        assert_eq!(DataType::Q4_0.matmul_load_vec(), 8);
        assert_eq!(DataType::Q8_0.matmul_load_vec(), 4);
        assert_eq!(DataType::Q6K.matmul_load_vec(), 2);
        assert_eq!(DataType::Iq4Xs.matmul_load_vec(), 2);
    }

    #[test]
    fn test_supported_list_has_no_secondary_types() {
        assert!(!DataType::SUPPORTED.contains(&DataType::Q8_1));
        assert!(!DataType::SUPPORTED.contains(&DataType::I32));
        assert_eq!(DataType::SUPPORTED.last(), Some(&DataType::Bf16));
    }
}
