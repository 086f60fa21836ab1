//! Element conversion between stored bytes and f32 working buffers

use super::DType;

/// Decode little-endian tensor bytes into f32 values
///
/// Handles f16, bf16, f32 and f64 storage. Returns `None` for
/// non-floating-point dtypes.
pub(crate) fn decode_f32(dtype: DType, data: &[u8]) -> Option<Vec<f32>> {
    match dtype {
        DType::F32 => Some(bytemuck::pod_collect_to_vec::<u8, f32>(data)),
        DType::F16 => Some(
            data.chunks_exact(2)
                .map(|chunk| {
                    let bits = u16::from_le_bytes([chunk[0], chunk[1]]);
                    half::f16::from_bits(bits).to_f32()
                })
                .collect(),
        ),
        DType::BF16 => Some(
            data.chunks_exact(2)
                .map(|chunk| {
                    let bits = u16::from_le_bytes([chunk[0], chunk[1]]);
                    half::bf16::from_bits(bits).to_f32()
                })
                .collect(),
        ),
        DType::F64 => Some(
            data.chunks_exact(8)
                .map(|chunk| {
                    let mut bytes = [0u8; 8];
                    bytes.copy_from_slice(chunk);
                    f64::from_le_bytes(bytes) as f32
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Encode f32 values into little-endian bytes of the given dtype
///
/// Narrowing conversions round to nearest even. Returns `None` for
/// non-floating-point dtypes.
pub(crate) fn encode_f32(dtype: DType, values: &[f32]) -> Option<Vec<u8>> {
    match dtype {
        DType::F32 => Some(bytemuck::cast_slice(values).to_vec()),
        DType::F16 => Some(
            values
                .iter()
                .flat_map(|&v| half::f16::from_f32(v).to_bits().to_le_bytes())
                .collect(),
        ),
        DType::BF16 => Some(
            values
                .iter()
                .flat_map(|&v| half::bf16::from_f32(v).to_bits().to_le_bytes())
                .collect(),
        ),
        DType::F64 => Some(values.iter().flat_map(|&v| f64::from(v).to_le_bytes()).collect()),
        _ => None,
    }
}
