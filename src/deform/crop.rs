//! Output sub-regions.
use std::ops::{Range, RangeFull};

use crate::error::{DeformError, Result};

/// Selection along one axis of the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Crop {
    /// The whole axis
    #[default]
    Full,
    /// The half-open range `[start, stop)`
    Range { start: usize, stop: usize },
}

impl From<Range<usize>> for Crop {
    fn from(r: Range<usize>) -> Self {
        Crop::Range {
            start: r.start,
            stop: r.end,
        }
    }
}

impl From<RangeFull> for Crop {
    fn from(_: RangeFull) -> Self {
        Crop::Full
    }
}

impl Crop {
    /// Resolve to `(start, stop)` on an axis of `extent` samples.
    ///
    /// # Errors
    /// * If the range is empty or reversed
    /// * If the range extends past the end of the axis
    pub fn bounds(&self, extent: usize) -> Result<(usize, usize)> {
        match *self {
            Crop::Full => Ok((0, extent)),
            Crop::Range { start, stop } => {
                if start >= stop {
                    return Err(DeformError::invalid_crop(format!(
                        "start {start} must be less than stop {stop}"
                    )));
                }
                if stop > extent {
                    return Err(DeformError::invalid_crop(format!(
                        "stop {stop} exceeds extent {extent}"
                    )));
                }
                Ok((start, stop))
            }
        }
    }
}

/// The part of the full output frame that is actually computed.
///
/// Output samples are indexed locally from zero; adding the offset gives
/// their index in the full frame, which is where the identity coordinate
/// and the displacement are both evaluated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    /// Shape of the computed output
    dims: Vec<usize>,

    /// Index of the first computed sample in the full frame
    offset: Vec<usize>,

    /// Shape of the full frame
    full: Vec<usize>,
}

impl Region {
    /// Resolve an optional per-axis crop against the full shape.
    ///
    /// # Errors
    /// * If the crop does not have one entry per axis
    /// * If any entry is out of bounds for its axis
    pub fn new(full: &[usize], crop: Option<&[Crop]>) -> Result<Self> {
        let Some(crop) = crop else {
            return Ok(Self {
                dims: full.to_vec(),
                offset: vec![0; full.len()],
                full: full.to_vec(),
            });
        };

        if crop.len() != full.len() {
            return Err(DeformError::invalid_crop(format!(
                "{} crop entries given for {} dimensions",
                crop.len(),
                full.len()
            )));
        }

        let mut dims = Vec::with_capacity(full.len());
        let mut offset = Vec::with_capacity(full.len());
        for (axis, (c, &extent)) in crop.iter().zip(full).enumerate() {
            let (start, stop) = c.bounds(extent).map_err(|e| match e {
                DeformError::InvalidCrop(msg) => {
                    DeformError::invalid_crop(format!("axis {axis}: {msg}"))
                }
                e => e,
            })?;
            dims.push(stop - start);
            offset.push(start);
        }

        Ok(Self {
            dims,
            offset,
            full: full.to_vec(),
        })
    }

    /// Number of dimensions
    pub fn ndims(&self) -> usize {
        self.full.len()
    }

    /// Shape of the computed output
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Index of the first computed sample in the full frame
    pub fn offset(&self) -> &[usize] {
        &self.offset
    }

    /// Shape of the full frame
    pub fn full_dims(&self) -> &[usize] {
        &self.full
    }

    /// Number of computed samples
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    /// Whether no samples are computed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the region is smaller than the full frame
    pub fn is_cropped(&self) -> bool {
        self.dims != self.full
    }

    /// Shift a local output index into the full frame, in place.
    #[inline]
    pub fn to_full_index(&self, loc: &mut [usize]) {
        for (l, o) in loc.iter_mut().zip(&self.offset) {
            *l += o;
        }
    }
}
