//! Lowering of transforms into ops.
//!
//! Every transform kind has one builder arm that reads its fields and
//! appends op records in the combined direction. Nothing is validated here;
//! [`OpVec::finalize`] checks every record.

use vfx_core::{BitDepth, TransformDirection};
use vfx_math::Mat4;
use vfx_ops::{
    AllocationData, CdlData, CdlStyle, FixedFunctionData, GammaData, GammaParams, GammaStyle, LogData, LogParams,
    Lut1DData, Lut3DData, MatrixData, OpData, OpParams, OpVec, RangeData,
};

use crate::builtin_transforms;
use crate::transform::*;
use crate::{OcioError, OcioResult};

/// Lowers `transform` into a new open op sequence.
pub fn lower(transform: &Transform, direction: TransformDirection) -> OcioResult<OpVec> {
    let mut ops = OpVec::new();
    build_ops(&mut ops, transform, direction)?;
    Ok(ops)
}

/// Appends the ops of `transform`, evaluated in `direction` relative to the
/// transform's own direction.
pub fn build_ops(ops: &mut OpVec, transform: &Transform, direction: TransformDirection) -> OcioResult<()> {
    let dir = combine(transform.direction(), direction);
    match transform {
        Transform::Matrix(t) => {
            let data = MatrixData::new(Mat4::from_row_array(t.matrix), t.offset);
            ops.append(OpParams::Matrix(data), dir)?;
        }
        Transform::Range(t) => build_range(ops, t, dir)?,
        Transform::Log(t) => {
            ops.append(OpParams::Log(LogData::uniform(t.base, LogParams::default())), dir)?;
        }
        Transform::LogAffine(t) => {
            ops.append(OpParams::Log(LogData { base: t.base, channels: affine_params(t) }), dir)?;
        }
        Transform::LogCamera(t) => {
            let mut channels = affine_params(&t.affine);
            for (c, params) in channels.iter_mut().enumerate() {
                *params = params.with_lin_break(t.lin_side_break[c]);
                if let Some(slope) = t.linear_slope {
                    *params = params.with_linear_slope(slope[c]);
                }
            }
            ops.append(OpParams::Log(LogData { base: t.affine.base, channels }), dir)?;
        }
        Transform::Exponent(t) => {
            let style = match t.negative_style {
                NegativeStyle::Clamp => GammaStyle::BasicFwd,
                NegativeStyle::Mirror => GammaStyle::BasicMirrorFwd,
                NegativeStyle::PassThru => GammaStyle::BasicPassThruFwd,
                NegativeStyle::Linear => {
                    return Err(OcioError::InvalidTransform {
                        transform: transform.type_name(),
                        reason: "linear negative style needs an offset; use ExponentWithLinearTransform".into(),
                    });
                }
            };
            let params = t.value.map(GammaParams::basic);
            ops.append(OpParams::Gamma(GammaData::new(style, params)), dir)?;
        }
        Transform::ExponentWithLinear(t) => {
            let style = match t.negative_style {
                NegativeStyle::Linear => GammaStyle::MonCurveFwd,
                NegativeStyle::Mirror => GammaStyle::MonCurveMirrorFwd,
                other => {
                    return Err(OcioError::InvalidTransform {
                        transform: transform.type_name(),
                        reason: format!("negative style {other:?} is not supported, only Linear or Mirror"),
                    });
                }
            };
            let params = std::array::from_fn(|c| GammaParams::moncurve(t.gamma[c], t.offset[c]));
            ops.append(OpParams::Gamma(GammaData::new(style, params)), dir)?;
        }
        Transform::Cdl(t) => {
            let style = match t.style {
                CdlTransformStyle::Asc => CdlStyle::AscFwd,
                CdlTransformStyle::NoClamp => CdlStyle::NoClampFwd,
            };
            let data = CdlData::new(t.slope, t.offset, t.power, t.saturation, style);
            ops.append(OpParams::Cdl(data), dir)?;
        }
        Transform::Lut1D(t) => {
            let data = Lut1DData::new(t.lut.clone()).with_inversion(t.inversion);
            // File depths describe the stored table, which sits on the
            // output side of a forward lookup.
            let (file_in, file_out) = if dir.is_forward() {
                (BitDepth::F32, t.file_out_depth)
            } else {
                (t.file_out_depth, BitDepth::F32)
            };
            ops.push(OpData::new(OpParams::Lut1D(data)).with_direction(dir).with_file_depths(file_in, file_out))?;
        }
        Transform::Lut3D(t) => {
            let data = Lut3DData::new(t.lut.clone()).with_inversion(t.inversion);
            ops.append(OpParams::Lut3D(data), dir)?;
        }
        Transform::FixedFunction(t) => {
            let data = FixedFunctionData::new(t.style, t.params.clone());
            ops.append(OpParams::FixedFunction(data), dir)?;
        }
        Transform::Allocation(t) => {
            let shaping = AllocationData::new(t.allocation, t.vars.clone()).shaping_ops();
            if dir.is_forward() {
                for params in shaping {
                    ops.append(params, dir)?;
                }
            } else {
                for params in shaping.into_iter().rev() {
                    ops.append(params, dir)?;
                }
            }
        }
        Transform::Group(t) => {
            match &t.source {
                Some(GroupSource::File(path)) => {
                    ops.append(OpParams::FileNoOp { path: path.clone() }, TransformDirection::Forward)?
                }
                Some(GroupSource::Look(look)) => {
                    ops.append(OpParams::LookNoOp { look: look.clone() }, TransformDirection::Forward)?
                }
                None => {}
            }
            if dir.is_forward() {
                for child in &t.transforms {
                    build_ops(ops, child, TransformDirection::Forward)?;
                }
            } else {
                for child in t.transforms.iter().rev() {
                    build_ops(ops, child, TransformDirection::Inverse)?;
                }
            }
        }
        Transform::Builtin(t) => builtin_transforms::build(ops, t.index(), dir)?,
    }
    Ok(())
}

fn combine(own: TransformDirection, requested: TransformDirection) -> TransformDirection {
    if requested.is_forward() { own } else { own.inverse() }
}

fn affine_params(t: &LogAffineTransform) -> [LogParams; 3] {
    std::array::from_fn(|c| {
        LogParams::new(t.log_side_slope[c], t.log_side_offset[c], t.lin_side_slope[c], t.lin_side_offset[c])
    })
}

fn build_range(ops: &mut OpVec, t: &RangeTransform, dir: TransformDirection) -> OcioResult<()> {
    let data = RangeData::from_bounds(t.min_in, t.max_in, t.min_out, t.max_out);
    match t.style {
        RangeStyle::Clamp => ops.append(OpParams::Range(data), dir)?,
        RangeStyle::NoClamp => {
            data.validate()?;
            ops.append(OpParams::Matrix(data.to_matrix()?), dir)?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfx_ops::{OpKind, OptimizationFlags};

    fn kinds(ops: &OpVec) -> Vec<OpKind> {
        ops.iter().map(|op| op.kind()).collect()
    }

    fn dirs(ops: &OpVec) -> Vec<TransformDirection> {
        ops.iter().map(|op| op.direction()).collect()
    }

    #[test]
    fn inverse_group_reverses_and_flips() {
        let group = Transform::group(vec![
            MatrixTransform::scale([2.0, 2.0, 2.0, 1.0]).into(),
            LogTransform::new(10.0).into(),
            ExponentTransform::new(2.2).into(),
        ]);
        let ops = lower(&group, TransformDirection::Inverse).unwrap();
        assert_eq!(kinds(&ops), [OpKind::Gamma, OpKind::Log, OpKind::Matrix]);
        assert!(dirs(&ops).iter().all(|d| !d.is_forward()));

        // An inverse group requested inverse is forward again.
        let ops = lower(&group.inverse(), TransformDirection::Inverse).unwrap();
        assert_eq!(kinds(&ops), [OpKind::Matrix, OpKind::Log, OpKind::Gamma]);
    }

    #[test]
    fn nested_group_directions_compose() {
        let mut inner = GroupTransform::new(vec![LogTransform::new(2.0).into()]);
        inner.direction = TransformDirection::Inverse;
        let outer = Transform::group(vec![inner.into(), MatrixTransform::default().into()]);
        let ops = lower(&outer, TransformDirection::Forward).unwrap();
        assert_eq!(dirs(&ops), [TransformDirection::Inverse, TransformDirection::Forward]);
        let ops = lower(&outer, TransformDirection::Inverse).unwrap();
        assert_eq!(kinds(&ops), [OpKind::Matrix, OpKind::Log]);
        assert_eq!(dirs(&ops), [TransformDirection::Inverse, TransformDirection::Forward]);
    }

    #[test]
    fn exponent_negative_styles() {
        let mut t = ExponentTransform::new(2.0);
        t.negative_style = NegativeStyle::Linear;
        assert!(matches!(
            lower(&t.into(), TransformDirection::Forward),
            Err(OcioError::InvalidTransform { transform: "ExponentTransform", .. })
        ));

        let mut t = ExponentWithLinearTransform::new(2.4, 0.055);
        t.negative_style = NegativeStyle::Clamp;
        assert!(lower(&t.clone().into(), TransformDirection::Forward).is_err());
        t.negative_style = NegativeStyle::Mirror;
        let ops = lower(&t.into(), TransformDirection::Forward).unwrap();
        let OpParams::Gamma(g) = &ops.ops()[0].data().params else { panic!("expected gamma") };
        assert_eq!(g.style, GammaStyle::MonCurveMirrorFwd);
        assert_eq!(g.params[0], GammaParams::moncurve(2.4, 0.055));
    }

    #[test]
    fn unclamped_range_lowers_to_matrix() {
        let t = RangeTransform::new(0.0, 2.0, 0.0, 1.0).with_style(RangeStyle::NoClamp);
        let mut ops = lower(&t.into(), TransformDirection::Forward).unwrap();
        assert_eq!(kinds(&ops), [OpKind::Matrix]);
        ops.finalize(OptimizationFlags::NONE).unwrap();
        let mut px = [4.0f32, -2.0, 1.0, 1.0];
        ops.apply(&mut px).unwrap();
        assert_eq!(px, [2.0, -1.0, 0.5, 1.0]);

        let open = RangeTransform { min_in: Some(0.0), min_out: Some(0.0), style: RangeStyle::NoClamp, ..Default::default() };
        assert!(lower(&open.into(), TransformDirection::Forward).is_err());
    }

    #[test]
    fn camera_log_carries_break() {
        let mut t = LogCameraTransform::new([0.0078125; 3]);
        t.affine.log_side_slope = [1.0 / 17.52; 3];
        t.affine.log_side_offset = [9.72 / 17.52; 3];
        t.linear_slope = Some([10.54; 3]);
        let ops = lower(&t.into(), TransformDirection::Forward).unwrap();
        let OpParams::Log(log) = &ops.ops()[0].data().params else { panic!("expected log") };
        assert_eq!(log.channels[2].lin_side_break, Some(0.0078125));
        assert_eq!(log.channels[2].linear_slope, Some(10.54));
    }

    #[test]
    fn allocation_inverse_reverses_shaping() {
        let t = AllocationTransform { allocation: vfx_ops::Allocation::Lg2, vars: vec![-8.0, 5.0, 0.001], ..Default::default() };
        let fwd = lower(&t.clone().into(), TransformDirection::Forward).unwrap();
        let inv = lower(&t.into(), TransformDirection::Inverse).unwrap();
        assert_eq!(kinds(&fwd), [OpKind::Matrix, OpKind::Log, OpKind::Matrix]);
        assert_eq!(inv.len(), 3);
        assert_eq!(inv.ops()[0].data(), &fwd.ops()[2].data().inverse());
    }

    #[test]
    fn group_source_marker_leads() {
        let g = GroupTransform::new(vec![MatrixTransform::default().into()]).with_source(GroupSource::Look("warm".into()));
        let ops = lower(&g.clone().into(), TransformDirection::Inverse).unwrap();
        assert_eq!(kinds(&ops), [OpKind::LookNoOp, OpKind::Matrix]);

        let g = GroupTransform { source: Some(GroupSource::File("shot.cube".into())), ..g };
        let ops = lower(&g.into(), TransformDirection::Forward).unwrap();
        assert_eq!(&ops.ops()[0].data().params, &OpParams::FileNoOp { path: "shot.cube".into() });
    }

    #[test]
    fn lut1d_file_depth_follows_direction() {
        let mut t = Lut1DTransform::new(vfx_lut::Lut1D::identity(16).unwrap());
        t.file_out_depth = BitDepth::UInt10;
        let fwd = lower(&t.clone().into(), TransformDirection::Forward).unwrap();
        assert_eq!(fwd.ops()[0].data().file_out_depth, BitDepth::UInt10);
        let inv = lower(&t.into(), TransformDirection::Inverse).unwrap();
        assert_eq!(inv.ops()[0].data().file_in_depth, BitDepth::UInt10);
    }
}
