//! Structured identity of a shader variant.
//!
//! A [`VariantKey`] is what a family enumerates; the job name, the target
//! environment and the optimization decision are all derived from it here
//! and nowhere else. Lookup tables build keys with the same constructors the
//! families use, so a table entry and the job it points at can't disagree on
//! spelling.

use std::fmt;

use crate::types::DataType;

/// Arithmetic path a variant is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MathPath {
    /// Scalar shader without half-precision arithmetic.
    Fp32,
    /// Scalar shader using `float16_t`; the default for most kernels.
    Fp16,
    /// Cooperative matrix (`KHR`) path.
    Coopmat1,
    /// Cooperative matrix 2 (`NV`) path.
    Coopmat2,
}

impl MathPath {
    /// Name suffix appended after the accumulator suffix.
    pub fn suffix(self) -> &'static str {
        match self {
            MathPath::Fp32 => "_fp32",
            MathPath::Fp16 => "",
            MathPath::Coopmat1 => "_cm1",
            MathPath::Coopmat2 => "_cm2",
        }
    }

    pub fn is_coopmat(self) -> bool {
        matches!(self, MathPath::Coopmat1 | MathPath::Coopmat2)
    }

    /// Whether the scalar parts of the shader use `float16_t`.
    pub fn uses_fp16(self) -> bool {
        self != MathPath::Fp32
    }
}

/// One `_`-separated component of a variant name after the op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Part {
    Type(DataType),
    Tag(&'static str),
}

impl Part {
    fn as_str(self) -> &'static str {
        match self {
            Part::Type(t) => t.as_str(),
            Part::Tag(tag) => tag,
        }
    }
}

/// Vulkan environment a shader is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetEnv {
    Vulkan12,
    Vulkan13,
}

impl TargetEnv {
    pub fn flag(self) -> &'static str {
        match self {
            TargetEnv::Vulkan12 => "--target-env=vulkan1.2",
            TargetEnv::Vulkan13 => "--target-env=vulkan1.3",
        }
    }
}

/// A variant whose compiled output is known to break under the optimizer.
pub struct NoOptRule {
    pub reason: &'static str,
    pub matches: fn(&VariantKey) -> bool,
}

fn is_coopmat1(key: &VariantKey) -> bool {
    key.path == MathPath::Coopmat1
}

fn mentions_bf16(key: &VariantKey) -> bool {
    key.mentions(DataType::Bf16)
}

/// Compiler-bug workarounds, checked in order.
pub const NO_OPT_RULES: &[NoOptRule] = &[
    NoOptRule {
        reason: "spirv-opt breaks cooperative matrix shaders (llama.cpp#10734)",
        matches: is_coopmat1,
    },
    NoOptRule {
        reason: "spirv-opt breaks bf16 shaders (llama.cpp#15344)",
        matches: mentions_bf16,
    },
];

/// Full identity of one compiled variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pub op: &'static str,
    pub parts: Vec<Part>,
    pub f16acc: bool,
    pub path: MathPath,
}

impl VariantKey {
    pub fn new(op: &'static str) -> Self {
        VariantKey {
            op,
            parts: Vec::new(),
            f16acc: false,
            path: MathPath::Fp16,
        }
    }

    pub fn ty(mut self, t: DataType) -> Self {
        self.parts.push(Part::Type(t));
        self
    }

    pub fn tag(mut self, tag: &'static str) -> Self {
        self.parts.push(Part::Tag(tag));
        self
    }

    pub fn tag_if(self, cond: bool, tag: &'static str) -> Self {
        if cond {
            self.tag(tag)
        } else {
            self
        }
    }

    pub fn path(mut self, path: MathPath) -> Self {
        self.path = path;
        self
    }

    pub fn f16acc(mut self, f16acc: bool) -> Self {
        self.f16acc = f16acc;
        self
    }

    /// The job name: op, parts, accumulator suffix, then path suffix.
    pub fn name(&self) -> String {
        let mut name = String::from(self.op);
        for part in &self.parts {
            name.push('_');
            name.push_str(part.as_str());
        }
        if self.f16acc {
            name.push_str("_f16acc");
        }
        name.push_str(self.path.suffix());
        name
    }

    pub fn mentions(&self, t: DataType) -> bool {
        self.parts.contains(&Part::Type(t))
    }

    pub fn target_env(&self) -> TargetEnv {
        if self.path == MathPath::Coopmat2 {
            TargetEnv::Vulkan13
        } else {
            TargetEnv::Vulkan12
        }
    }

    /// The first rule that disables optimization for this key, if any.
    pub fn no_opt_rule(&self) -> Option<&'static NoOptRule> {
        NO_OPT_RULES.iter().find(|rule| (rule.matches)(self))
    }

    pub fn optimize(&self) -> bool {
        self.no_opt_rule().is_none()
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
