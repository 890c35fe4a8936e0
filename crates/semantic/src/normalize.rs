/// In-place L2 normalization. Zero vectors are left untouched.
pub(crate) fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn scales_to_unit_length() {
        let mut v = vec![3.0f32, -4.0];
        l2_normalize_in_place(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] + 0.8).abs() < 1e-6);
        assert!((norm(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_and_empty_are_noops() {
        let mut zero = vec![0.0f32; 4];
        l2_normalize_in_place(&mut zero);
        assert_eq!(zero, vec![0.0; 4]);

        let mut empty: Vec<f32> = Vec::new();
        l2_normalize_in_place(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn model_sized_vector_is_idempotent() {
        let mut v: Vec<f32> = (0..1536).map(|i| (i % 17) as f32 - 8.0).collect();
        l2_normalize_in_place(&mut v);
        let once = v.clone();
        l2_normalize_in_place(&mut v);
        for (a, b) in v.iter().zip(once.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
