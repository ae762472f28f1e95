//! Allocation and other record-only ops.
//!
//! These ops never touch pixels. An allocation records how values were
//! distributed before a LUT (so GPU paths can pick texture domains); the
//! file and look markers record where a run of ops came from.
//!
//! Allocation styles:
//! - **Uniform**: `[min, max]` maps linearly to `[0, 1]`
//! - **Lg2**: `log2(x + offset)` over `[min, max]` stops, then the same fit
//!
//! [`AllocationData::shaping_ops`] gives the pixel ops realizing the
//! allocation, for callers that want the shaping itself.

use std::fmt;
use std::str::FromStr;

use vfx_core::format_sig7;

use crate::log_op::LogData;
use crate::matrix::MatrixData;
use crate::op_data::OpParams;
use crate::{OpError, OpKind, OpResult};

/// Allocation style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Allocation {
    /// Linear fit of `[min, max]`.
    #[default]
    Uniform,
    /// Log2 then linear fit.
    Lg2,
}

impl Allocation {
    /// Style name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Lg2 => "lg2",
        }
    }

    /// Variables used when none are given.
    pub const fn default_vars(self) -> &'static [f64] {
        match self {
            Self::Uniform => &[0.0, 1.0],
            Self::Lg2 => &[-10.0, 6.0],
        }
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Allocation {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uniform" => Ok(Self::Uniform),
            "lg2" => Ok(Self::Lg2),
            _ => Err(OpError::UnknownStyle { context: "Allocation", name: s.to_string() }),
        }
    }
}

/// Parameters of an allocation record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AllocationData {
    /// Style.
    pub allocation: Allocation,
    /// `[min, max]` or, for lg2, `[min, max, offset]`. Empty means defaults.
    pub vars: Vec<f64>,
}

impl AllocationData {
    /// Allocation with explicit variables.
    pub fn new(allocation: Allocation, vars: impl Into<Vec<f64>>) -> Self {
        Self { allocation, vars: vars.into() }
    }

    /// Variables with defaults filled in: `(min, max, offset)`.
    pub fn resolved_vars(&self) -> (f64, f64, f64) {
        let vars = if self.vars.is_empty() { self.allocation.default_vars() } else { &self.vars[..] };
        let get = |i: usize| vars.get(i).copied().unwrap_or(0.0);
        (get(0), get(1), get(2))
    }

    /// Checks the variable count and ordering.
    pub fn validate(&self) -> OpResult<()> {
        let max_vars = match self.allocation {
            Allocation::Uniform => 2,
            Allocation::Lg2 => 3,
        };
        let n = self.vars.len();
        if n != 0 && !(2..=max_vars).contains(&n) {
            return Err(OpError::DimensionMismatch {
                kind: OpKind::Allocation,
                param: "vars".into(),
                expected: if max_vars == 2 { "0 or 2".into() } else { "0, 2 or 3".into() },
                actual: n,
            });
        }
        if let Some(v) = self.vars.iter().find(|v| !v.is_finite()) {
            return Err(OpError::invalid(OpKind::Allocation, "vars", *v, "must be finite"));
        }
        let (min, max, _) = self.resolved_vars();
        if !(min < max) {
            return Err(OpError::invalid(
                OpKind::Allocation,
                "vars",
                min,
                format!("min must be below max {}", format_sig7(max)),
            ));
        }
        Ok(())
    }

    /// Pixel ops that shape values into `[0, 1]` the way the allocation
    /// describes. Lg2 clamps non-positive values at the log.
    pub fn shaping_ops(&self) -> Vec<OpParams> {
        let (min, max, offset) = self.resolved_vars();
        let s = 1.0 / (max - min);
        let fit = MatrixData::scale_offset([s, s, s, 1.0], [-min * s, -min * s, -min * s, 0.0]);
        match self.allocation {
            Allocation::Uniform => vec![OpParams::Matrix(fit)],
            Allocation::Lg2 => {
                let mut ops = Vec::with_capacity(3);
                if offset != 0.0 {
                    ops.push(OpParams::Matrix(MatrixData::scale_offset(
                        [1.0; 4],
                        [offset, offset, offset, 0.0],
                    )));
                }
                ops.push(OpParams::Log(LogData::log2()));
                ops.push(OpParams::Matrix(fit));
                ops
            }
        }
    }

    pub(crate) fn cache_id(&self) -> String {
        let (min, max, offset) = self.resolved_vars();
        format!("Allocation {} {} {} {}", self.allocation, format_sig7(min), format_sig7(max), format_sig7(offset))
    }
}
