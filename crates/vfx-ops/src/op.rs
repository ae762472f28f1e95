//! Runtime op: an [`OpData`] bound to a CPU renderer and a cache identifier.
//!
//! An [`Op`] starts out mutable. [`Op::finalize`] validates the data, folds
//! an inverse direction into the parameters where the kind allows it, picks
//! the renderer specialization and fixes the cache identifier. From then on
//! the op is read-only and may be applied from any number of threads.

use vfx_core::TransformDirection;

use crate::cdl::CdlRenderer;
use crate::fixed_function::FixedFunctionRenderer;
use crate::gamma::GammaRenderer;
use crate::log_op::LogRenderer;
use crate::lut1d::Lut1DRenderer;
use crate::lut3d::Lut3DRenderer;
use crate::matrix::MatrixRenderer;
use crate::op_data::{OpData, OpKind, OpParams};
use crate::range::RangeRenderer;
use crate::{OpError, OpResult, OptimizationFlags};

/// CPU kernel of one op, processing packed RGBA in place.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum Renderer {
    Matrix(MatrixRenderer),
    Range(RangeRenderer),
    Log(LogRenderer),
    Gamma(GammaRenderer),
    Lut1D(Lut1DRenderer),
    Lut3D(Lut3DRenderer),
    Cdl(CdlRenderer),
    FixedFunction(FixedFunctionRenderer),
    /// Record ops leave pixels alone.
    Null,
}

impl Renderer {
    /// Picks the kernel for validated `data`.
    ///
    /// Kinds with an analytic inverse must already be resolved to forward;
    /// `fast` selects the baked path for inverse LUTs.
    pub fn new(data: &OpData, fast: bool) -> OpResult<Self> {
        let direction = data.direction;
        if !direction.is_forward() && data.has_analytic_inverse() && !data.kind().is_record() {
            return Err(OpError::ContractViolation(format!(
                "{} renderer built from an unresolved inverse",
                data.kind()
            )));
        }
        Ok(match &data.params {
            OpParams::Matrix(m) => Self::Matrix(MatrixRenderer::new(m)),
            OpParams::Range(r) => Self::Range(RangeRenderer::new(r)),
            OpParams::Log(l) => Self::Log(LogRenderer::new(l, direction)),
            OpParams::Gamma(g) => Self::Gamma(GammaRenderer::new(g)),
            OpParams::Lut1D(l) => Self::Lut1D(Lut1DRenderer::new(l, direction, fast, data.file_in_depth)),
            OpParams::Lut3D(l) => Self::Lut3D(Lut3DRenderer::new(l, direction, fast)?),
            OpParams::Cdl(c) => Self::Cdl(CdlRenderer::new(c)),
            OpParams::FixedFunction(f) => Self::FixedFunction(FixedFunctionRenderer::new(f)),
            OpParams::Allocation(_) | OpParams::FileNoOp { .. } | OpParams::LookNoOp { .. } => Self::Null,
        })
    }

    /// Processes packed RGBA pixels in place.
    #[inline]
    pub fn apply(&self, pixels: &mut [f32]) {
        match self {
            Self::Matrix(r) => r.apply(pixels),
            Self::Range(r) => r.apply(pixels),
            Self::Log(r) => r.apply(pixels),
            Self::Gamma(r) => r.apply(pixels),
            Self::Lut1D(r) => r.apply(pixels),
            Self::Lut3D(r) => r.apply(pixels),
            Self::Cdl(r) => r.apply(pixels),
            Self::FixedFunction(r) => r.apply(pixels),
            Self::Null => {}
        }
    }
}

#[derive(Debug, Clone)]
struct Finalized {
    renderer: Renderer,
    cache_id: String,
}

/// One stage of an [`OpVec`](crate::OpVec).
#[derive(Debug, Clone)]
pub struct Op {
    data: OpData,
    finalized: Option<Finalized>,
}

impl Op {
    /// Mutable op around `data`.
    pub fn new(data: OpData) -> Self {
        Self { data, finalized: None }
    }

    /// Parameters.
    pub fn data(&self) -> &OpData {
        &self.data
    }

    /// Mutable parameters; clears the finalized state.
    pub fn data_mut(&mut self) -> &mut OpData {
        self.finalized = None;
        &mut self.data
    }

    /// Consumes the op, returning its parameters.
    pub fn into_data(self) -> OpData {
        self.data
    }

    /// Kind tag.
    pub fn kind(&self) -> OpKind {
        self.data.kind()
    }

    /// Evaluation direction.
    pub fn direction(&self) -> TransformDirection {
        self.data.direction
    }

    /// Whether [`finalize`](Self::finalize) has succeeded since the last
    /// change.
    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    /// Cache identifier, once finalized.
    pub fn cache_id(&self) -> Option<&str> {
        self.finalized.as_ref().map(|f| f.cache_id.as_str())
    }

    /// Whether an inverse LUT in this op evaluates on the baked path.
    pub fn uses_fast_inverse(&self, flags: OptimizationFlags) -> bool {
        uses_fast_inverse(&self.data, flags)
    }

    /// Validates, resolves the direction, binds the renderer and assigns
    /// the cache identifier.
    pub fn finalize(&mut self, flags: OptimizationFlags) -> OpResult<()> {
        self.data.validate()?;
        let data = self.data.clone().resolve_direction()?;
        let fast = uses_fast_inverse(&data, flags);
        let renderer = Renderer::new(&data, fast)?;
        let mut cache_id = data.cache_id();
        if !data.direction.is_forward() && matches!(data.kind(), OpKind::Lut1D | OpKind::Lut3D) {
            cache_id.push_str(if fast { " inv:fast" } else { " inv:exact" });
        }
        self.data = data;
        self.finalized = Some(Finalized { renderer, cache_id });
        Ok(())
    }

    /// Processes packed RGBA pixels in place.
    pub fn apply(&self, pixels: &mut [f32]) -> OpResult<()> {
        let finalized = self
            .finalized
            .as_ref()
            .ok_or_else(|| OpError::ContractViolation(format!("{} op applied before finalize", self.kind())))?;
        finalized.renderer.apply(pixels);
        Ok(())
    }

    pub(crate) fn renderer(&self) -> Option<&Renderer> {
        self.finalized.as_ref().map(|f| &f.renderer)
    }
}

pub(crate) fn uses_fast_inverse(data: &OpData, flags: OptimizationFlags) -> bool {
    if data.direction.is_forward() {
        return false;
    }
    match &data.params {
        OpParams::Lut1D(l) => l.inversion.is_fast(flags),
        OpParams::Lut3D(l) => l.inversion.is_fast(flags),
        _ => false,
    }
}
