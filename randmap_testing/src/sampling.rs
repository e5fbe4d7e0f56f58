//! Statistics of sampling and traversal gathered through the core traits.
use crate::stat::chi2_uniformity;
use ndarray::{Array1, Array2};
use randmap_core::{Sample, Traverse};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Which generator a sampler or a traversal draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flavour {
    Uniform,
    Fast,
}

/// Samples `trials` keys and counts how often each of them came up.
///
/// # Panics
///
/// If any sampling attempt fails.
pub fn key_frequencies<M, K, V>(map: &M, flavour: Flavour, trials: usize) -> HashMap<K, usize>
where
    M: Sample<K, V> + ?Sized,
    K: Hash + Eq + Clone,
{
    let mut frequencies = HashMap::new();
    for _ in 0..trials {
        let key = match flavour {
            Flavour::Uniform => map.sample_key(),
            Flavour::Fast => map.fast_sample_key(),
        }
        .unwrap();
        *frequencies.entry(key.clone()).or_insert(0) += 1;
    }
    frequencies
}

/// Samples `trials` values and counts how often each of them came up.
pub fn value_frequencies<M, K, V>(map: &M, flavour: Flavour, trials: usize) -> HashMap<V, usize>
where
    M: Sample<K, V> + ?Sized,
    V: Hash + Eq + Clone,
{
    let mut frequencies = HashMap::new();
    for _ in 0..trials {
        let value = match flavour {
            Flavour::Uniform => map.sample_value(),
            Flavour::Fast => map.fast_sample_value(),
        }
        .unwrap();
        *frequencies.entry(value.clone()).or_insert(0) += 1;
    }
    frequencies
}

/// Asserts that every one of `items` has been seen within a factor of `factor` from `expected`.
pub fn assert_frequencies_within_band<T: Hash + Eq + Debug>(
    frequencies: &HashMap<T, usize>,
    items: impl IntoIterator<Item = T>,
    expected: f64,
    factor: f64,
) {
    for item in items {
        let count = frequencies.get(&item).copied().unwrap_or(0) as f64;
        assert!(
            count >= expected / factor && count <= expected * factor,
            "{item:?} came up {count} times, expected about {expected}"
        );
    }
}

/// Asserts that `items` have been seen equally often, up to the significance level `alpha`.
pub fn assert_uniform_frequencies<T: Hash + Eq + Debug>(
    frequencies: &HashMap<T, usize>,
    items: impl IntoIterator<Item = T>,
    alpha: f64,
) {
    let counts: Array1<f64> = items
        .into_iter()
        .map(|item| frequencies.get(&item).copied().unwrap_or(0) as f64)
        .collect();
    let statistic = chi2_uniformity(&counts);
    assert!(
        statistic.p_value > alpha,
        "Frequencies are not uniform: {statistic:?}"
    );
}

/// Traverses `map` `traversals` times and counts the positions of every key.
///
/// Cell `[i, j]` of the result is the number of traversals that visited `keys[i]` at position `j`.
pub fn traversal_positions<M, K, V>(
    map: &M,
    keys: &[K],
    flavour: Flavour,
    traversals: usize,
) -> Array2<f64>
where
    M: Traverse<K, V>,
    K: Hash + Eq + Debug,
{
    let index: HashMap<&K, usize> = keys.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let mut positions = Array2::zeros((keys.len(), keys.len()));
    for _ in 0..traversals {
        let iter = match flavour {
            Flavour::Uniform => map.iter(),
            Flavour::Fast => map.fast_iter(),
        };
        for (position, (key, _)) in iter.enumerate() {
            let Some(&row) = index.get(key) else {
                panic!("Unexpected key: {key:?}");
            };
            positions[[row, position]] += 1.0;
        }
    }
    positions
}

/// Asserts that every cell of `positions` lies within `[low, high]`.
pub fn assert_positions_within_band(positions: &Array2<f64>, low: f64, high: f64) {
    for ((key, position), &count) in positions.indexed_iter() {
        assert!(
            (low..=high).contains(&count),
            "Key #{key} was visited at position {position} {count} times"
        );
    }
}

/// Asserts that `visited` contains every one of `expected` exactly once and nothing else.
pub fn assert_visits_exactly_once<T: Hash + Eq + Debug>(
    visited: impl IntoIterator<Item = T>,
    expected: impl IntoIterator<Item = T>,
) {
    let mut counts: HashMap<T, isize> = expected.into_iter().map(|item| (item, 1)).collect();
    for item in visited {
        let count = counts.entry(item).or_insert(0);
        *count -= 1;
    }
    let wrong: Vec<_> = counts.iter().filter(|(_, &count)| count != 0).collect();
    assert!(
        wrong.is_empty(),
        "Skipped (1) or extra (< 0) visits: {wrong:?}"
    );
}
