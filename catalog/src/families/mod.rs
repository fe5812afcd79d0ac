//! Per-family enumeration rules.
//!
//! Each family exposes `enumerate`, which pushes its jobs into the builder.
//! Axis combinations a family must skip are listed as [`Exclusion`] data next
//! to the axes they filter; kernels with a single fixed shape are listed as
//! [`FixedKernel`] tables.

pub mod activation;
pub mod attention;
pub mod conv;
pub mod copy;
pub mod elementwise;
pub mod matmul;
pub mod matvec;
pub mod misc;
pub mod norm;
pub mod quant;
pub mod reduction;
pub mod rope;

use crate::capabilities::Capabilities;
use crate::catalog::{CatalogBuilder, CatalogError};
use crate::defines;
use crate::job::Defines;
use crate::variant::{Part, VariantKey};

/// A combination of axis values a family does not generate.
pub struct Exclusion<T> {
    pub reason: &'static str,
    pub excludes: fn(&T, Capabilities) -> bool,
}

/// The first exclusion that rejects `value`, if any.
pub fn excluded_by<'a, T>(
    rules: &'a [Exclusion<T>],
    value: &T,
    caps: Capabilities,
) -> Option<&'a Exclusion<T>> {
    rules.iter().find(|rule| (rule.excludes)(value, caps))
}

/// A kernel with one fixed shape.
pub struct FixedKernel {
    pub op: &'static str,
    pub parts: &'static [Part],
    pub template: &'static str,
    pub defines: &'static [(&'static str, &'static str)],
    /// Layer the defines over [`base_defines`].
    pub with_base: bool,
}

impl FixedKernel {
    pub fn key(&self) -> VariantKey {
        let mut key = VariantKey::new(self.op);
        key.parts.extend_from_slice(self.parts);
        key
    }

    pub fn defines(&self) -> Defines {
        let mut own = Defines::new();
        for (key, value) in self.defines {
            own.set(*key, *value);
        }
        if self.with_base {
            base_defines().merged(&own)
        } else {
            own
        }
    }
}

/// Defines shared by most shaders that don't set their own float type.
pub fn base_defines() -> Defines {
    defines! { "FLOAT_TYPE" => "float" }
}

pub(crate) fn add_fixed(
    builder: &mut CatalogBuilder<'_>,
    kernels: &[FixedKernel],
) -> Result<(), CatalogError> {
    for kernel in kernels {
        builder.add(kernel.key(), kernel.template, kernel.defines())?;
    }
    Ok(())
}

/// Run every family in a fixed order.
pub fn enumerate_all(builder: &mut CatalogBuilder<'_>) -> Result<(), CatalogError> {
    matmul::enumerate(builder)?;
    attention::enumerate(builder)?;
    matvec::enumerate(builder)?;
    quant::enumerate(builder)?;
    copy::enumerate(builder)?;
    norm::enumerate(builder)?;
    elementwise::enumerate(builder)?;
    activation::enumerate(builder)?;
    rope::enumerate(builder)?;
    conv::enumerate(builder)?;
    reduction::enumerate(builder)?;
    misc::enumerate(builder)?;
    Ok(())
}
