//! Chi-square tests for the statistics gathered from sampling and traversals.
use ndarray::prelude::*;
use num_traits::{Float, NumAssignOps, ToPrimitive};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// A result of a Chi-square test.
#[derive(Clone, Copy, Debug)]
pub struct Chi2Statistic<V> {
    pub chi2: V,
    pub dof: usize,
    pub p_value: V,
}

/// Calculates the chi-square statistic of `observed` counts against `expected` ones.
///
/// `dof` defaults to the number of cells minus one.
pub fn chi2<V>(observed: &[V], expected: &[V], dof: Option<usize>) -> Chi2Statistic<V>
where
    V: Float + NumAssignOps + From<f64>,
{
    assert_eq!(observed.len(), expected.len(), "Dimensions must match");

    let mut chi2: V = 0.0.into();
    for (&obs, &exp) in observed.iter().zip(expected) {
        let diff = obs - exp;
        chi2 += diff * diff / exp;
    }

    let dof = dof.unwrap_or(observed.len() - 1);
    let dist = ChiSquared::new(dof as f64).unwrap();
    let p_value = dist.sf(chi2.to_f64().unwrap()).into();

    Chi2Statistic { chi2, dof, p_value }
}

/// Tests whether `observed` counts are spread evenly over their cells.
pub fn chi2_uniformity<'a, V, A>(observed: A) -> Chi2Statistic<V>
where
    V: 'a + Float + NumAssignOps + From<f64>,
    A: AsArray<'a, V>,
{
    let observed: ArrayView1<V> = observed.into();
    let observed = observed.to_vec();
    let mean = observed.iter().fold(V::zero(), |acc, &v| acc + v) / (observed.len() as f64).into();
    chi2(&observed, &vec![mean; observed.len()], None)
}

/// Tests whether the row and the column variables of a contingency table are independent.
pub fn chi2_independence<V>(contingency: &Array2<V>) -> Chi2Statistic<V>
where
    V: Float + NumAssignOps + From<f64>,
{
    let row_sums = contingency.sum_axis(Axis(1));
    let col_sums = contingency.sum_axis(Axis(0));
    let total = row_sums.sum();

    let mut observed = Vec::with_capacity(contingency.len());
    let mut expected = Vec::with_capacity(contingency.len());
    for ((row, col), &count) in contingency.indexed_iter() {
        observed.push(count);
        expected.push(row_sums[row] * col_sums[col] / total);
    }

    let dof = (contingency.nrows() - 1) * (contingency.ncols() - 1);
    chi2(&observed, &expected, Some(dof))
}

/// Counts co-occurrences of categories in two equally long series.
///
/// Every cell is smoothed by a small constant if any of them is empty.
pub fn make_contingency_matrix<T, C>(
    x: &Array1<T>,
    y: &Array1<T>,
    num_categories: usize,
) -> Array2<C>
where
    T: ToPrimitive,
    C: Float + NumAssignOps + From<f64>,
{
    assert_eq!(x.len(), y.len(), r#""x" and "y" must have equal length"#);

    let mut contingency = Array2::<C>::zeros((num_categories, num_categories));
    for (xv, yv) in x.iter().zip(y) {
        let (xi, yi) = (xv.to_usize().unwrap(), yv.to_usize().unwrap());
        contingency[[xi, yi]] += 1.0_f64.into();
    }
    if contingency.iter().any(|count| count.is_zero()) {
        contingency.mapv_inplace(|count| count + 0.1_f64.into());
    }
    contingency
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chi2_uniformity() {
        let even = array![100.0, 101.0, 99.0, 100.0];
        assert!(chi2_uniformity(&even).p_value > 0.9);

        let skewed = array![400.0, 0.0, 0.0, 0.0];
        assert!(chi2_uniformity(&skewed).p_value < 1e-6);
    }

    #[test]
    fn test_chi2_independence() {
        let independent = array![[50.0, 50.0], [50.0, 50.0]];
        let statistic = chi2_independence(&independent);
        assert_eq!(statistic.dof, 1);
        assert!(statistic.p_value > 0.99);

        let dependent = array![[100.0, 0.1], [0.1, 100.0]];
        assert!(chi2_independence(&dependent).p_value < 1e-6);
    }

    #[test]
    fn test_make_contingency_matrix() {
        let x = array![0_usize, 1, 1];
        let y = array![1_usize, 1, 0];
        let contingency: Array2<f64> = make_contingency_matrix(&x, &y, 2);
        assert_eq!(contingency, array![[0.1, 1.1], [1.1, 1.1]]);
    }
}
