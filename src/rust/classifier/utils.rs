use ndarray::Array1;
use std::cmp::Ordering;

pub(crate) fn normalize_vector(vec: &Array1<f32>) -> Array1<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if norm > 1e-10 {
        vec / norm
    } else {
        Array1::zeros(vec.len())
    }
}

/// Index and value of the first maximal element. `None` for an empty slice.
pub(crate) fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let mut iter = values.iter().copied().enumerate();
    let first = iter.next()?;
    Some(iter.fold(first, |best, (i, v)| if v > best.1 { (i, v) } else { best }))
}

/// Indices ordered by descending value. Equal values keep their original order.
pub(crate) fn rank_descending(values: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].partial_cmp(&values[a]).unwrap_or(Ordering::Equal));
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_vector() {
        let v = Array1::from(vec![3.0f32, 4.0]);
        let n = normalize_vector(&v);
        assert!((n[0] - 0.6).abs() < 1e-6);
        assert!((n[1] - 0.8).abs() < 1e-6);

        let zero = normalize_vector(&Array1::zeros(3));
        assert!(zero.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_argmax_first_wins() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), Some((0, 0.4)));
        assert_eq!(argmax(&[0.1, 0.2, 0.7]), Some((2, 0.7)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_rank_is_stable() {
        assert_eq!(rank_descending(&[0.2, 0.5, 0.2, 0.1]), vec![1, 0, 2, 3]);
        assert_eq!(rank_descending(&[0.25, 0.25, 0.25, 0.25]), vec![0, 1, 2, 3]);
    }
}
