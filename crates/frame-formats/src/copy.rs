use crate::format::{PixelFormat, PlaneSpec};

/// Failures raised while validating or copying an incoming frame.
///
/// Validation is all-or-nothing: any of these is reported before a
/// single destination byte is written, so a failed push never leaves a
/// torn image behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CopyError {
    #[error("source buffer too small: need at least {required} bytes, got {actual}")]
    SourceTooSmall { required: usize, actual: usize },
    #[error("stride {stride} smaller than row width {row_bytes} for plane {plane}")]
    StrideTooSmall {
        plane: usize,
        stride: usize,
        row_bytes: usize,
    },
    #[error("expected {expected} planes/strides, got {actual}")]
    StrideCountMismatch { expected: usize, actual: usize },
    #[error("plane {plane} geometry overflows addressable size")]
    SizeOverflow { plane: usize },
    #[error("null source address")]
    NullAddress,
}

/// Non-owning view of one incoming frame: a contiguous byte buffer with
/// optional explicit per-plane strides. Omitted strides mean tight
/// packing for the declared format and width. Plane `i + 1` starts
/// `rows_i * stride_i` bytes after plane `i`; only the final row of the
/// final plane may be short, so a tightly packed buffer of exactly
/// [`PixelFormat::min_frame_len`] bytes is always accepted.
#[derive(Debug, Clone, Copy)]
pub struct FrameData<'a> {
    pub data: &'a [u8],
    pub strides: Option<&'a [usize]>,
}

impl<'a> FrameData<'a> {
    /// Tightly packed frame (no row padding).
    pub fn tight(data: &'a [u8]) -> Self {
        Self { data, strides: None }
    }

    pub fn with_strides(data: &'a [u8], strides: &'a [usize]) -> Self {
        Self {
            data,
            strides: Some(strides),
        }
    }
}

/// One source plane delivered separately from its siblings.
#[derive(Debug, Clone, Copy)]
pub struct SourcePlane<'a> {
    pub data: &'a [u8],
    pub stride: usize,
}

/// A fully validated single-plane copy, ready to execute against a
/// destination plane. Produced by [`plan_copy`] / [`plan_copy_planes`];
/// once a plan exists, the copy itself cannot fail on the source side.
#[derive(Debug)]
pub struct PlaneCopy<'a> {
    pub spec: PlaneSpec,
    src: &'a [u8],
    src_stride: usize,
}

impl PlaneCopy<'_> {
    /// Copy this plane into `dst`, honoring the destination stride.
    ///
    /// Destination sizing is the host allocator's guarantee; violating
    /// it is a programming bug, not a runtime error path.
    pub fn copy_into(&self, dst: &mut [u8], dst_stride: usize) {
        let PlaneSpec { row_bytes, rows } = self.spec;
        if rows == 0 {
            return;
        }
        assert!(
            dst_stride >= row_bytes,
            "destination stride {dst_stride} below row width {row_bytes}"
        );
        assert!(
            dst.len() >= (rows - 1) * dst_stride + row_bytes,
            "destination plane too small for {rows} rows"
        );

        if self.src_stride == dst_stride {
            // Identical layout: one bulk copy is byte-equivalent.
            let len = (rows - 1) * dst_stride + row_bytes;
            dst[..len].copy_from_slice(&self.src[..len]);
            return;
        }

        // Strides differ (GPU row pitch is often padded); a bulk copy
        // would shear the image, so go row by row.
        for row in 0..rows {
            let src_start = row * self.src_stride;
            let dst_start = row * dst_stride;
            dst[dst_start..dst_start + row_bytes]
                .copy_from_slice(&self.src[src_start..src_start + row_bytes]);
        }
    }
}

/// Resolve explicit strides against the format's plane specs, or fall
/// back to tight packing.
fn resolve_strides(
    specs: &[PlaneSpec],
    strides: Option<&[usize]>,
) -> Result<Vec<usize>, CopyError> {
    match strides {
        None => Ok(specs.iter().map(|s| s.row_bytes).collect()),
        Some(strides) => {
            if strides.len() != specs.len() {
                return Err(CopyError::StrideCountMismatch {
                    expected: specs.len(),
                    actual: strides.len(),
                });
            }
            for (plane, (&stride, spec)) in strides.iter().zip(specs).enumerate() {
                if stride < spec.row_bytes {
                    return Err(CopyError::StrideTooSmall {
                        plane,
                        stride,
                        row_bytes: spec.row_bytes,
                    });
                }
            }
            Ok(strides.to_vec())
        }
    }
}

/// Validate a contiguous frame and split it into per-plane copies.
pub fn plan_copy<'a>(
    format: PixelFormat,
    width: u32,
    height: u32,
    frame: FrameData<'a>,
) -> Result<Vec<PlaneCopy<'a>>, CopyError> {
    let specs = format.plane_specs(width, height);
    let strides = resolve_strides(&specs, frame.strides)?;

    // Strides come straight from the caller; every extent is computed
    // checked so a pathological value is a rejection, not a fault.
    let mut required = 0usize;
    let mut offsets = Vec::with_capacity(specs.len());
    for (i, (spec, &stride)) in specs.iter().zip(&strides).enumerate() {
        offsets.push(required);
        if spec.rows == 0 {
            continue;
        }
        let last = i == specs.len() - 1;
        let extent = if last {
            (spec.rows - 1)
                .checked_mul(stride)
                .and_then(|v| v.checked_add(spec.row_bytes))
        } else {
            spec.rows.checked_mul(stride)
        };
        required = extent
            .and_then(|extent| required.checked_add(extent))
            .ok_or(CopyError::SizeOverflow { plane: i })?;
    }
    if frame.data.len() < required {
        return Err(CopyError::SourceTooSmall {
            required,
            actual: frame.data.len(),
        });
    }

    Ok(specs
        .into_iter()
        .zip(strides)
        .zip(offsets)
        .map(|((spec, stride), offset)| {
            let end = offset
                .saturating_add(spec.rows.saturating_mul(stride))
                .min(frame.data.len());
            PlaneCopy {
                spec,
                src: &frame.data[offset..end],
                src_stride: stride,
            }
        })
        .collect())
}

/// Validate separately delivered source planes and build the same plan
/// as [`plan_copy`].
pub fn plan_copy_planes<'a>(
    format: PixelFormat,
    width: u32,
    height: u32,
    planes: &[SourcePlane<'a>],
) -> Result<Vec<PlaneCopy<'a>>, CopyError> {
    let specs = format.plane_specs(width, height);
    if planes.len() != specs.len() {
        return Err(CopyError::StrideCountMismatch {
            expected: specs.len(),
            actual: planes.len(),
        });
    }

    for (plane, (spec, src)) in specs.iter().zip(planes).enumerate() {
        if src.stride < spec.row_bytes {
            return Err(CopyError::StrideTooSmall {
                plane,
                stride: src.stride,
                row_bytes: spec.row_bytes,
            });
        }
        if spec.rows == 0 {
            continue;
        }
        let required = (spec.rows - 1)
            .checked_mul(src.stride)
            .and_then(|v| v.checked_add(spec.row_bytes))
            .ok_or(CopyError::SizeOverflow { plane })?;
        if src.data.len() < required {
            return Err(CopyError::SourceTooSmall {
                required,
                actual: src.data.len(),
            });
        }
    }

    Ok(specs
        .into_iter()
        .zip(planes)
        .map(|(spec, src)| PlaneCopy {
            spec,
            src: src.data,
            src_stride: src.stride,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tight_minimum_length_is_accepted() {
        let data = vec![0u8; PixelFormat::Nv12.min_frame_len(64, 48)];
        let plan = plan_copy(PixelFormat::Nv12, 64, 48, FrameData::tight(&data)).unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn one_byte_short_is_rejected() {
        let min = PixelFormat::Nv12.min_frame_len(64, 48);
        let data = vec![0u8; min - 1];
        let err = plan_copy(PixelFormat::Nv12, 64, 48, FrameData::tight(&data)).unwrap_err();
        assert_eq!(
            err,
            CopyError::SourceTooSmall {
                required: min,
                actual: min - 1
            }
        );
    }

    #[test]
    fn undersized_stride_is_a_config_error() {
        let data = vec![0u8; 1 << 20];
        let strides = [64usize * 4 - 1];
        let err = plan_copy(
            PixelFormat::Rgba,
            64,
            48,
            FrameData::with_strides(&data, &strides),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CopyError::StrideTooSmall {
                plane: 0,
                stride: 255,
                row_bytes: 256
            }
        );
    }

    #[test]
    fn stride_count_must_match_plane_count() {
        let data = vec![0u8; 1 << 20];
        let strides = [64usize, 64];
        let err = plan_copy(
            PixelFormat::Yuv420p,
            64,
            48,
            FrameData::with_strides(&data, &strides),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CopyError::StrideCountMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn padded_source_stride_skips_padding_bytes() {
        // 4x2 RGBA with 8 bytes of row padding in the source.
        let row_bytes = 4 * 4;
        let src_stride = row_bytes + 8;
        let mut data = vec![0xEEu8; src_stride * 2];
        for row in 0..2 {
            for b in 0..row_bytes {
                data[row * src_stride + b] = (row * 16 + b) as u8;
            }
        }
        // Last row may be short-stride; trim to the accepted minimum.
        data.truncate(src_stride + row_bytes);

        let strides = [src_stride];
        let plan = plan_copy(
            PixelFormat::Rgba,
            4,
            2,
            FrameData::with_strides(&data, &strides),
        )
        .unwrap();

        let dst_stride = 64;
        let mut dst = vec![0u8; dst_stride * 2];
        plan[0].copy_into(&mut dst, dst_stride);

        for row in 0..2 {
            for b in 0..row_bytes {
                assert_eq!(
                    dst[row * dst_stride + b],
                    (row * 16 + b) as u8,
                    "row {row} byte {b}"
                );
            }
            // Padding stays untouched.
            assert!(dst[row * dst_stride + row_bytes..(row + 1) * dst_stride]
                .iter()
                .all(|&b| b == 0));
        }
    }

    #[test]
    fn matching_strides_take_the_bulk_path() {
        let data: Vec<u8> = (0..PixelFormat::Rgba.min_frame_len(8, 8))
            .map(|i| (i % 251) as u8)
            .collect();
        let plan = plan_copy(PixelFormat::Rgba, 8, 8, FrameData::tight(&data)).unwrap();
        let mut dst = vec![0u8; data.len()];
        plan[0].copy_into(&mut dst, 8 * 4);
        assert_eq!(dst, data);
    }

    #[test]
    fn separate_planes_validate_each_plane() {
        let y = vec![0x10u8; 64 * 48];
        let uv = vec![0x80u8; 64 * 24 - 1];
        let planes = [
            SourcePlane { data: &y, stride: 64 },
            SourcePlane { data: &uv, stride: 64 },
        ];
        let err = plan_copy_planes(PixelFormat::Nv12, 64, 48, &planes).unwrap_err();
        assert_eq!(
            err,
            CopyError::SourceTooSmall {
                required: 64 * 24,
                actual: 64 * 24 - 1
            }
        );
    }

    #[test]
    fn overflowing_stride_is_rejected_not_fatal() {
        let data = vec![0u8; 1 << 10];
        let strides = [usize::MAX / 4];
        let err = plan_copy(
            PixelFormat::Rgba,
            16,
            16,
            FrameData::with_strides(&data, &strides),
        )
        .unwrap_err();
        assert_eq!(err, CopyError::SizeOverflow { plane: 0 });
    }

    #[test]
    fn overflowing_plane_stride_is_rejected_not_fatal() {
        let y = vec![0u8; 64 * 48];
        let uv = vec![0u8; 64 * 24];
        let planes = [
            SourcePlane { data: &y, stride: 64 },
            SourcePlane {
                data: &uv,
                stride: usize::MAX / 2,
            },
        ];
        let err = plan_copy_planes(PixelFormat::Nv12, 64, 48, &planes).unwrap_err();
        assert_eq!(err, CopyError::SizeOverflow { plane: 1 });
    }

    #[test]
    fn separate_planes_count_must_match() {
        let y = vec![0u8; 64 * 48];
        let planes = [SourcePlane { data: &y, stride: 64 }];
        let err = plan_copy_planes(PixelFormat::Nv12, 64, 48, &planes).unwrap_err();
        assert_eq!(
            err,
            CopyError::StrideCountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }
}
