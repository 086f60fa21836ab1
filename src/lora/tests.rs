//! Tests for low-rank adapter deltas

use super::*;
use crate::tensor::{DType, NamedTensor};
use approx::assert_abs_diff_eq;
use proptest::prelude::*;

fn delta(d_out: usize, d_in: usize, rank: usize, alpha: f32) -> AdapterDelta {
    AdapterDelta::new(
        "w",
        vec![1.0; rank * d_in],
        &[rank, d_in],
        vec![1.0; d_out * rank],
        &[d_out, rank],
        alpha,
    )
    .unwrap()
}

#[test]
fn test_scale_is_alpha_over_rank() {
    let d = delta(4, 4, 8, 16.0);
    assert_abs_diff_eq!(d.scale(), 2.0);
    assert_eq!(d.delta_shape(), [4, 4]);
}

#[test]
fn test_accumulate_all_ones() {
    // r=2, alpha=2: each entry gains (2/2) * (1*1 + 1*1) = 2
    let d = delta(4, 4, 2, 2.0);
    let mut acc = vec![1.0f32; 16];
    d.accumulate_into(&mut acc);
    assert!(acc.iter().all(|&v| v == 3.0));
}

#[test]
fn test_accumulate_matches_naive_product() {
    // up = [[1, 2], [3, 4], [5, 6]], down = [[1, 0, -1], [2, 1, 0]]
    let d = AdapterDelta::new(
        "w",
        vec![1.0, 0.0, -1.0, 2.0, 1.0, 0.0],
        &[2, 3],
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        &[3, 2],
        4.0,
    )
    .unwrap();

    let mut acc = vec![0.0f32; 9];
    d.accumulate_into(&mut acc);

    // scale = 2; up @ down = [[5, 2, -1], [11, 4, -3], [17, 6, -5]]
    let expected = [10.0, 4.0, -2.0, 22.0, 8.0, -6.0, 34.0, 12.0, -10.0];
    for (got, want) in acc.iter().zip(expected) {
        assert_abs_diff_eq!(*got, want, epsilon = 1e-6);
    }
}

#[test]
fn test_zero_alpha_is_noop() {
    let d = delta(2, 3, 1, 0.0);
    let mut acc = vec![0.25f32; 6];
    d.accumulate_into(&mut acc);
    assert_eq!(acc, vec![0.25; 6]);
}

#[test]
fn test_zero_up_row_still_propagates_nan() {
    // up row 0 is zero, down holds a NaN: 0 * NaN is NaN in the dense product
    let d = AdapterDelta::new(
        "w",
        vec![f32::NAN, 1.0],
        &[1, 2],
        vec![0.0, 1.0],
        &[2, 1],
        1.0,
    )
    .unwrap();

    let mut acc = vec![1.0f32; 4];
    d.accumulate_into(&mut acc);

    assert!(acc[0].is_nan());
    assert_eq!(acc[1], 1.0);
    assert!(acc[2].is_nan());
    assert_eq!(acc[3], 2.0);
}

#[test]
fn test_rank_mismatch_rejected() {
    let err = AdapterDelta::new("w", vec![0.0; 8], &[2, 4], vec![0.0; 12], &[4, 3], 1.0)
        .unwrap_err();
    assert!(matches!(err, AdapterError::DimensionMismatch { .. }));
}

#[test]
fn test_zero_rank_rejected() {
    let err = AdapterDelta::new("w", vec![], &[0, 4], vec![], &[4, 0], 1.0).unwrap_err();
    assert!(matches!(err, AdapterError::Validation(_)));
}

#[test]
fn test_non_matrix_factor_rejected() {
    let err =
        AdapterDelta::new("w", vec![0.0; 4], &[4], vec![0.0; 4], &[4, 1], 1.0).unwrap_err();
    assert!(matches!(err, AdapterError::DimensionMismatch { .. }));
}

#[test]
fn test_buffer_length_checked() {
    let err = AdapterDelta::new("w", vec![0.0; 7], &[2, 4], vec![0.0; 8], &[4, 2], 1.0)
        .unwrap_err();
    assert!(matches!(err, AdapterError::Validation(_)));
}

#[test]
fn test_non_finite_alpha_rejected() {
    let err = AdapterDelta::new("w", vec![0.0; 4], &[1, 4], vec![0.0; 4], &[4, 1], f32::NAN)
        .unwrap_err();
    assert!(matches!(err, AdapterError::Validation(_)));
}

#[test]
fn test_from_half_precision_tensors() {
    let down = NamedTensor::from_f32("a", vec![1, 2], DType::F16, &[0.5, 0.25]).unwrap();
    let up = NamedTensor::from_f32("b", vec![2, 1], DType::BF16, &[2.0, 4.0]).unwrap();
    let d = AdapterDelta::from_tensors("layer.weight", &down, &up, 1.0).unwrap();

    assert_eq!(d.target(), "layer.weight");
    assert_eq!(d.rank(), 1);
    assert_eq!((d.d_out(), d.d_in()), (2, 2));

    let mut acc = vec![0.0f32; 4];
    d.accumulate_into(&mut acc);
    assert_eq!(acc, vec![1.0, 0.5, 2.0, 1.0]);
}

#[test]
fn test_from_integer_tensor_rejected() {
    let down = NamedTensor::new("a", vec![1, 2], DType::I32, vec![0u8; 8]).unwrap();
    let up = NamedTensor::from_f32("b", vec![2, 1], DType::F32, &[1.0, 1.0]).unwrap();
    let err = AdapterDelta::from_tensors("w", &down, &up, 1.0).unwrap_err();
    assert!(matches!(err, AdapterError::Tensor(_)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Zero factors contribute nothing regardless of alpha
    #[test]
    fn prop_zero_up_factor_is_noop(
        d_out in 1usize..8,
        d_in in 1usize..8,
        rank in 1usize..4,
        alpha in -32.0f32..32.0,
        base in proptest::collection::vec(-4.0f32..4.0, 64),
    ) {
        let d = AdapterDelta::new(
            "w",
            vec![1.0; rank * d_in],
            &[rank, d_in],
            vec![0.0; d_out * rank],
            &[d_out, rank],
            alpha,
        ).unwrap();

        let mut acc: Vec<f32> = base[..d_out * d_in].to_vec();
        d.accumulate_into(&mut acc);
        prop_assert_eq!(&acc[..], &base[..d_out * d_in]);
    }

    /// Doubling alpha doubles the contribution
    #[test]
    fn prop_delta_linear_in_alpha(
        rank in 1usize..4,
        alpha in 0.5f32..8.0,
        value in -2.0f32..2.0,
    ) {
        let make = |a: f32| AdapterDelta::new(
            "w",
            vec![value; rank * 3],
            &[rank, 3],
            vec![1.0; 2 * rank],
            &[2, rank],
            a,
        ).unwrap();

        let mut single = vec![0.0f32; 6];
        make(alpha).accumulate_into(&mut single);
        let mut double = vec![0.0f32; 6];
        make(2.0 * alpha).accumulate_into(&mut double);

        for (s, d) in single.iter().zip(&double) {
            prop_assert!((2.0 * s - d).abs() <= 1e-4 * d.abs().max(1.0));
        }
    }
}
