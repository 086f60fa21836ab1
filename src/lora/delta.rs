//! Low-rank weight delta for a single target tensor

use super::adapter::AdapterError;
use crate::tensor::NamedTensor;

/// Additive low-rank correction `ΔW = (alpha / r) · up @ down`
///
/// `down` has shape `[r, in]` and `up` has shape `[out, r]`, both stored
/// row-major as f32 regardless of how the adapter was serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterDelta {
    target: String,
    down: Vec<f32>,
    up: Vec<f32>,
    rank: usize,
    d_in: usize,
    d_out: usize,
    alpha: f32,
}

impl AdapterDelta {
    /// Create a delta from row-major factor buffers
    ///
    /// # Errors
    ///
    /// Returns an error if either factor is not rank-2, the inner (rank)
    /// dimensions disagree, a buffer does not match its shape, or `alpha`
    /// is not finite.
    pub fn new(
        target: impl Into<String>,
        down: Vec<f32>,
        down_shape: &[usize],
        up: Vec<f32>,
        up_shape: &[usize],
        alpha: f32,
    ) -> Result<Self, AdapterError> {
        let target = target.into();

        let (rank, d_in) = match *down_shape {
            [r, d_in] => (r, d_in),
            _ => {
                return Err(AdapterError::DimensionMismatch {
                    expected: format!("2-D down factor for {target}"),
                    actual: format!("{down_shape:?}"),
                })
            }
        };
        let (d_out, up_rank) = match *up_shape {
            [d_out, r] => (d_out, r),
            _ => {
                return Err(AdapterError::DimensionMismatch {
                    expected: format!("2-D up factor for {target}"),
                    actual: format!("{up_shape:?}"),
                })
            }
        };

        if rank == 0 || d_in == 0 || d_out == 0 {
            return Err(AdapterError::Validation(format!(
                "{target}: rank and factor dimensions must be positive (down {down_shape:?}, up {up_shape:?})"
            )));
        }
        if up_rank != rank {
            return Err(AdapterError::DimensionMismatch {
                expected: format!("up factor [_, {rank}] for {target}"),
                actual: format!("{up_shape:?}"),
            });
        }
        if down.len() != rank * d_in || up.len() != d_out * rank {
            return Err(AdapterError::Validation(format!(
                "{target}: factor buffers hold {} and {} values for shapes {down_shape:?} and {up_shape:?}",
                down.len(),
                up.len()
            )));
        }
        if !alpha.is_finite() {
            return Err(AdapterError::Validation(format!("{target}: alpha must be finite, got {alpha}")));
        }

        Ok(Self { target, down, up, rank, d_in, d_out, alpha })
    }

    /// Create a delta from stored factor tensors, up-casting them to f32
    ///
    /// # Errors
    ///
    /// Returns an error if a factor is not floating point or the factor
    /// shapes are inconsistent.
    pub fn from_tensors(
        target: impl Into<String>,
        down: &NamedTensor,
        up: &NamedTensor,
        alpha: f32,
    ) -> Result<Self, AdapterError> {
        Self::new(target, down.to_f32()?, down.shape(), up.to_f32()?, up.shape(), alpha)
    }

    /// Name of the base tensor this delta applies to
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Rank `r`
    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Alpha scaling constant
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Effective scale `alpha / r`
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.alpha / self.rank as f32
    }

    /// Input dimension (columns of `down`)
    #[must_use]
    pub fn d_in(&self) -> usize {
        self.d_in
    }

    /// Output dimension (rows of `up`)
    #[must_use]
    pub fn d_out(&self) -> usize {
        self.d_out
    }

    /// Shape `[out, in]` of the weight this delta corrects
    #[must_use]
    pub fn delta_shape(&self) -> [usize; 2] {
        [self.d_out, self.d_in]
    }

    /// Add `scale · up @ down` into a row-major `[out, in]` f32 buffer
    ///
    /// Each entry's dot product over the rank dimension is summed in f64
    /// before the scaled result is added to the buffer. Every term is
    /// evaluated, so non-finite factors reach the output.
    pub(crate) fn accumulate_into(&self, acc: &mut [f32]) {
        debug_assert_eq!(acc.len(), self.d_out * self.d_in);

        let scale = f64::from(self.alpha) / self.rank as f64;

        let mut row = vec![0.0f64; self.d_in];
        for i in 0..self.d_out {
            row.iter_mut().for_each(|v| *v = 0.0);
            for k in 0..self.rank {
                let u = f64::from(self.up[i * self.rank + k]);
                let down_row = &self.down[k * self.d_in..(k + 1) * self.d_in];
                for (acc_j, &d) in row.iter_mut().zip(down_row) {
                    *acc_j += u * f64::from(d);
                }
            }
            let out_row = &mut acc[i * self.d_in..(i + 1) * self.d_in];
            for (out, &sum) in out_row.iter_mut().zip(&row) {
                *out = (f64::from(*out) + scale * sum) as f32;
            }
        }
    }
}
