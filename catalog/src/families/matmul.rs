//! Matrix multiply (`mul_mm`) variants, plain and with id-gather.
//!
//! A configuration is one point of id-mode × math path × accumulator. Each
//! configuration then emits the float-operand variants, the bf16 pair, one
//! aligned/unaligned pair per (A type, B type) and the integer-dot variant
//! for legacy quants.

use log::trace;

use super::{excluded_by, Exclusion};
use crate::capabilities::Capabilities;
use crate::catalog::{CatalogBuilder, CatalogError};
use crate::defines;
use crate::job::Defines;
use crate::types::{glsl, DataType};
use crate::variant::{MathPath, VariantKey};

/// How the B operand rows are selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdMode {
    None,
    /// `mul_mat_id`: expert rows gathered through an id tensor.
    Gather,
    /// Id-gather with the subgroup-based row compaction.
    GatherSubgroup,
}

impl IdMode {
    pub const ALL: [IdMode; 3] = [IdMode::None, IdMode::Gather, IdMode::GatherSubgroup];

    pub fn op(self) -> &'static str {
        match self {
            IdMode::None => "matmul",
            IdMode::Gather => "matmul_id",
            IdMode::GatherSubgroup => "matmul_id_subgroup",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatmulConfig {
    pub id: IdMode,
    pub path: MathPath,
    pub f16acc: bool,
}

pub const PATHS: [MathPath; 4] = [
    MathPath::Fp32,
    MathPath::Fp16,
    MathPath::Coopmat1,
    MathPath::Coopmat2,
];

pub const CONFIG_EXCLUSIONS: &[Exclusion<MatmulConfig>] = &[
    Exclusion {
        reason: "fp32 shaders only accumulate in fp32",
        excludes: |c, _| c.path == MathPath::Fp32 && c.f16acc,
    },
    Exclusion {
        reason: "plain id-gather has no cooperative matrix variant",
        excludes: |c, _| c.id == IdMode::Gather && c.path.is_coopmat(),
    },
    Exclusion {
        reason: "cooperative matrix support not compiled in",
        excludes: |c, caps| c.path == MathPath::Coopmat1 && !caps.coopmat,
    },
    Exclusion {
        reason: "cooperative matrix 2 support not compiled in",
        excludes: |c, caps| c.path == MathPath::Coopmat2 && !caps.coopmat2,
    },
];

/// One (A type, B type) pair within a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operands {
    pub config: MatmulConfig,
    pub a: DataType,
    pub b: DataType,
}

/// B operand types tried for every A type.
pub const B_TYPES: [DataType; 3] = [DataType::F32, DataType::F16, DataType::Q8_1];

pub const OPERAND_EXCLUSIONS: &[Exclusion<Operands>] = &[
    Exclusion {
        reason: "bf16 is emitted by its own block",
        excludes: |o, _| o.a == DataType::Bf16,
    },
    Exclusion {
        reason: "cooperative matrix 2 matmuls take an f16 B operand only",
        excludes: |o, _| o.b == DataType::F32 && o.config.path == MathPath::Coopmat2,
    },
    Exclusion {
        reason: "float A with f16 B is emitted by the float-operand block",
        excludes: |o, _| o.b == DataType::F16 && matches!(o.a, DataType::F32 | DataType::F16),
    },
    Exclusion {
        reason: "integer dot support not compiled in",
        excludes: |o, caps| o.b == DataType::Q8_1 && !caps.integer_dot,
    },
    Exclusion {
        reason: "integer dot matmul has no id-gather or cooperative matrix variant",
        excludes: |o, _| {
            o.b == DataType::Q8_1 && (o.config.id != IdMode::None || o.config.path.is_coopmat())
        },
    },
    Exclusion {
        reason: "integer dot matmul only covers legacy quants",
        excludes: |o, _| o.b == DataType::Q8_1 && !o.a.is_legacy_quant(),
    },
];

pub const BF16_EXCLUSIONS: &[Exclusion<MatmulConfig>] = &[Exclusion {
    reason: "native bf16 needs compiler support; scalar paths promote to float",
    excludes: |c, caps| c.path.is_coopmat() && !caps.bfloat16,
}];

/// Every configuration that survives [`CONFIG_EXCLUSIONS`].
pub fn configs(caps: Capabilities) -> Vec<MatmulConfig> {
    let mut result = Vec::new();
    for id in IdMode::ALL {
        for path in PATHS {
            for f16acc in [false, true] {
                let config = MatmulConfig { id, path, f16acc };
                match excluded_by(CONFIG_EXCLUSIONS, &config, caps) {
                    Some(rule) => trace!("skip matmul {:?}: {}", config, rule.reason),
                    None => result.push(config),
                }
            }
        }
    }
    result
}

pub fn key(config: MatmulConfig) -> VariantKey {
    VariantKey::new(config.id.op())
        .path(config.path)
        .f16acc(config.f16acc)
}

/// Per-configuration values shared by all variants.
struct Shape {
    config: MatmulConfig,
    template: &'static str,
    load_vec: &'static str,
    aligned_b_f32: &'static str,
    aligned_b_f16: &'static str,
    base: Defines,
}

impl Shape {
    fn new(config: MatmulConfig) -> Self {
        let cm2 = config.path == MathPath::Coopmat2;
        let fp16 = config.path.uses_fp16();

        let mut base = defines! {
            "FLOAT_TYPE_VEC2" => if fp16 { "f16vec2" } else { "vec2" },
            "ACC_TYPE" => glsl::float_or_half(config.f16acc),
        };
        match config.id {
            IdMode::None => {}
            IdMode::Gather => base.set("MUL_MAT_ID", "1"),
            IdMode::GatherSubgroup => {
                base.set("MUL_MAT_ID", "1");
                base.set("MUL_MAT_ID_USE_SUBGROUPS", "1");
            }
        }
        if fp16 {
            base.set("FLOAT16", "1");
        }
        if config.f16acc {
            base.set("ACC_TYPE_MAX", "\"float16_t(65504.0)\"");
        }
        if config.path == MathPath::Coopmat1 {
            base.set("COOPMAT", "1");
        }

        Shape {
            config,
            template: if cm2 { "mul_mm_cm2.comp" } else { "mul_mm.comp" },
            load_vec: if cm2 { "1" } else if fp16 { "8" } else { "4" },
            aligned_b_f32: if cm2 { "float" } else if fp16 { "mat2x4" } else { "vec4" },
            aligned_b_f16: if cm2 {
                "float16_t"
            } else if fp16 {
                "f16mat2x4"
            } else {
                "f16vec4"
            },
            base,
        }
    }

    /// Element type the shader computes in for A type `t`.
    fn float_type(&self, t: DataType) -> &'static str {
        let path = self.config.path;
        if t == DataType::Bf16 {
            return if path.is_coopmat() { "bfloat16_t" } else { glsl::FLOAT };
        }
        glsl::float_or_half(path.uses_fp16())
    }

    fn add(
        &self,
        builder: &mut CatalogBuilder<'_>,
        key: VariantKey,
        template: &str,
        defines: Defines,
    ) -> Result<(), CatalogError> {
        builder.add(key, template, self.base.merged(&defines))
    }

    /// `_f32_f16` and `_f16`, which name a float A operand without a
    /// separate B suffix.
    fn float_operands(&self, builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
        let float_type = self.float_type(DataType::F16);
        let operands: [(DataType, VariantKey); 2] = [
            (DataType::F32, key(self.config).ty(DataType::F32).ty(DataType::F16)),
            (DataType::F16, key(self.config).ty(DataType::F16)),
        ];
        for (a, base_key) in operands {
            if !builder.has_type(a) {
                continue;
            }
            self.add(
                builder,
                base_key.clone(),
                self.template,
                defines! {
                    "FLOAT_TYPE" => float_type,
                    a.define_key() => "1",
                    "B_TYPE" => glsl::FLOAT16,
                    "D_TYPE" => glsl::FLOAT,
                },
            )?;
            self.add(
                builder,
                base_key.tag("aligned"),
                self.template,
                defines! {
                    "FLOAT_TYPE" => float_type,
                    a.define_key() => "1",
                    "LOAD_VEC_A" => self.load_vec,
                    "LOAD_VEC_B" => self.load_vec,
                    "B_TYPE" => self.aligned_b_f16,
                    "B_TYPE32" => self.aligned_b_f32,
                    "D_TYPE" => glsl::FLOAT,
                    "ALIGNED" => "1",
                },
            )?;
        }
        Ok(())
    }

    fn bf16(&self, builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
        if !builder.has_type(DataType::Bf16) {
            return Ok(());
        }
        if let Some(rule) = excluded_by(BF16_EXCLUSIONS, &self.config, builder.capabilities()) {
            trace!("skip bf16 matmul {:?}: {}", self.config, rule.reason);
            return Ok(());
        }

        let cm2 = self.config.path == MathPath::Coopmat2;
        let to_float = if self.config.path.is_coopmat() {
            "uintBitsToBFloat16EXT"
        } else {
            "bf16_to_fp32"
        };
        let float_type = self.float_type(DataType::Bf16);
        let base_key = key(self.config).ty(DataType::Bf16);

        self.add(
            builder,
            base_key.clone().tag("aligned"),
            self.template,
            defines! {
                "FLOAT_TYPE" => float_type,
                "TO_FLOAT_TYPE" => to_float,
                "DATA_A_BF16" => "1",
                "LOAD_VEC_A" => if cm2 { "1" } else { "4" },
                "LOAD_VEC_B" => "4",
                "B_TYPE" => if cm2 { "bfloat16_t" } else { "u16vec4" },
                "B_TYPE32" => "vec4",
                "D_TYPE" => glsl::FLOAT,
                "B_IS_FLOAT" => "1",
                "DATA_B_BF16" => "1",
                "ALIGNED" => "1",
            },
        )?;
        self.add(
            builder,
            base_key,
            self.template,
            defines! {
                "FLOAT_TYPE" => float_type,
                "TO_FLOAT_TYPE" => to_float,
                "DATA_A_BF16" => "1",
                "LOAD_VEC_A" => "1",
                "B_TYPE" => if cm2 { "bfloat16_t" } else { "uint16_t" },
                "D_TYPE" => glsl::FLOAT,
                "B_IS_FLOAT" => "1",
                "DATA_B_BF16" => "1",
            },
        )
    }

    fn typed_operands(&self, builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
        let cm2 = self.config.path == MathPath::Coopmat2;
        for a in builder.types() {
            // float A loads one element at a time unaligned
            let load_vec_quant = a.matmul_load_vec().to_string();
            let (load_vec_a_unaligned, load_vec_a) = if cm2 || a.is_float() {
                ("1".to_string(), self.load_vec.to_string())
            } else {
                (load_vec_quant.clone(), load_vec_quant)
            };

            for b in B_TYPES {
                let operands = Operands {
                    config: self.config,
                    a,
                    b,
                };
                if let Some(rule) =
                    excluded_by(OPERAND_EXCLUSIONS, &operands, builder.capabilities())
                {
                    trace!("skip matmul {:?}: {}", operands, rule.reason);
                    continue;
                }

                let base_key = key(self.config).ty(a).ty(b);
                let float_type = self.float_type(a);

                if b == DataType::Q8_1 {
                    self.add(
                        builder,
                        base_key,
                        "mul_mmq.comp",
                        defines! {
                            "FLOAT_TYPE" => float_type,
                            a.define_key() => "1",
                            "D_TYPE" => glsl::FLOAT,
                        },
                    )?;
                    continue;
                }

                let (b_unaligned, b_aligned) = if b == DataType::F16 {
                    (glsl::FLOAT16, self.aligned_b_f16)
                } else {
                    (glsl::FLOAT, self.aligned_b_f32)
                };
                self.add(
                    builder,
                    base_key.clone(),
                    self.template,
                    defines! {
                        "FLOAT_TYPE" => float_type,
                        a.define_key() => "1",
                        "LOAD_VEC_A" => load_vec_a_unaligned.as_str(),
                        "B_TYPE" => b_unaligned,
                        "D_TYPE" => glsl::FLOAT,
                    },
                )?;
                self.add(
                    builder,
                    base_key.tag("aligned"),
                    self.template,
                    defines! {
                        "FLOAT_TYPE" => float_type,
                        a.define_key() => "1",
                        "LOAD_VEC_A" => load_vec_a.as_str(),
                        "LOAD_VEC_B" => self.load_vec,
                        "B_TYPE" => b_aligned,
                        "B_TYPE32" => self.aligned_b_f32,
                        "D_TYPE" => glsl::FLOAT,
                        "ALIGNED" => "1",
                    },
                )?;
            }
        }
        Ok(())
    }
}

pub fn enumerate(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    for config in configs(builder.capabilities()) {
        let shape = Shape::new(config);
        shape.float_operands(builder)?;
        shape.bf16(builder)?;
        shape.typed_operands(builder)?;
    }
    Ok(())
}
