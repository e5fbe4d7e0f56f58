//! Generic checks for map implementations and macros generating them per key type.
use crate::generate::Generate;
use crate::sampling::assert_visits_exactly_once;
use rand::Rng;
use randmap_core::{HashMap, Sample, Traverse};
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

/// Generates `size` entries with distinct keys.
pub fn generate_map_data<R, K, V>(
    rng: &mut R,
    size: usize,
    key_params: &K::GenerateParams,
    val_params: &V::GenerateParams,
) -> Box<[(K, V)]>
where
    R: Rng,
    K: Eq + Hash + Clone + Generate<R>,
    V: Generate<R>,
{
    K::generate_unique(rng, key_params, size)
        .into_iter()
        .map(|key| {
            let value = V::generate(rng, val_params);
            (key, value)
        })
        .collect()
}

/// Checks that `map` holds exactly `data` and nothing else.
pub fn check_map_get<R, K, V, M>(rng: &mut R, map: &M, data: &[(K, V)])
where
    R: Rng,
    K: Eq + Hash + Debug + Generate<R>,
    V: PartialEq + Debug,
    M: HashMap<K, V>,
{
    assert_eq!(map.len(), data.len());
    assert_eq!(map.is_empty(), data.is_empty());
    for (key, value) in data {
        assert_eq!(map.get(key), Some(value), "Key: {key:?}");
    }

    let keys: HashSet<&K> = data.iter().map(|(k, _)| k).collect();
    let params = K::GenerateParams::default();
    let mut num_missing = 0;
    while num_missing < data.len().div_ceil(3) {
        let key = K::generate(rng, &params);
        if !keys.contains(&key) {
            assert_eq!(map.get(&key), None, "Key: {key:?}");
            num_missing += 1;
        }
    }
}

/// Checks that both samplers of `map` only return its own entries.
pub fn check_map_sample<K, V, M>(map: &M, data: &[(K, V)])
where
    K: Debug,
    V: PartialEq + Debug,
    M: HashMap<K, V> + Sample<K, V>,
{
    for _ in 0..100 {
        for (key, value) in [map.sample_entry().unwrap(), map.fast_sample_entry().unwrap()] {
            assert_eq!(map.get(key), Some(value), "Sampled a foreign key: {key:?}");
        }
    }
    if data.is_empty() {
        assert!(map.sample_entry().is_err());
    }
}

/// Checks that both traversals of `map` visit every entry of `data` exactly once.
pub fn check_map_traverse<K, V, M>(map: &M, data: &[(K, V)])
where
    K: Eq + Hash + Debug,
    M: Traverse<K, V>,
{
    let expected = || data.iter().map(|(k, _)| k);
    assert_visits_exactly_once(map.iter().map(|(k, _)| k), expected());
    assert_visits_exactly_once(map.fast_iter().map(|(k, _)| k), expected());
}

/// Generates a test of the read API, the samplers and the traversals of a map type for integer
/// keys of the given type.
#[macro_export]
macro_rules! generate_map_int_tests {
    ($Map:ident, $factory:expr, $type:ty) => {
        $crate::compose_idents!(test_fn = [test_map_int_, $type], {
            #[test]
            fn test_fn() {
                use $crate::*;

                let mut rng = rand::rng();
                let size: usize = if <$type>::BITS >= u32::BITS {
                    9999
                } else {
                    (1_usize << <$type>::BITS) / 2
                };

                // Zero is kept out of the map to probe for the default-valued key.
                let data: Box<[($type, u128)]> = generate_map_data::<_, $type, u128>(
                    &mut rng,
                    size,
                    &Default::default(),
                    &Default::default(),
                )
                .into_vec()
                .into_iter()
                .filter(|(key, _)| *key != 0 as $type)
                .collect();
                let map: $Map<$type, u128> = $factory(data.clone());

                check_map_get(&mut rng, &map, &data);
                assert_eq!(map.get(&(0 as $type)), None);
                check_map_sample(&map, &data);
                check_map_traverse(&map, &data);
            }
        });
    };
}

/// Generates a test of the read API, the samplers and the traversals of a map type for string
/// keys.
#[macro_export]
macro_rules! generate_map_str_tests {
    ($Map:ident, $factory:expr) => {
        #[test]
        fn test_map_str() {
            use $crate::*;

            let mut rng = rand::rng();
            let data: Box<[(String, u128)]> = generate_map_data::<_, String, u128>(
                &mut rng,
                9999,
                &StringParams::default(),
                &Default::default(),
            );
            let map: $Map<String, u128> = $factory(data.clone());

            check_map_get(&mut rng, &map, &data);
            assert_eq!(map.get(&String::new()), None);
            check_map_sample(&map, &data);
            check_map_traverse(&map, &data);
        }
    };
}

/// Generates [`generate_map_int_tests`] for every primitive integer type and
/// [`generate_map_str_tests`].
#[macro_export]
macro_rules! generate_map_tests {
    ($Map:ident, $factory:expr) => {
        $crate::generate_map_int_tests!($Map, $factory, u8);
        $crate::generate_map_int_tests!($Map, $factory, i8);
        $crate::generate_map_int_tests!($Map, $factory, u16);
        $crate::generate_map_int_tests!($Map, $factory, i16);
        $crate::generate_map_int_tests!($Map, $factory, u32);
        $crate::generate_map_int_tests!($Map, $factory, i32);
        $crate::generate_map_int_tests!($Map, $factory, u64);
        $crate::generate_map_int_tests!($Map, $factory, i64);
        $crate::generate_map_int_tests!($Map, $factory, u128);
        $crate::generate_map_int_tests!($Map, $factory, i128);
        $crate::generate_map_str_tests!($Map, $factory);
    };
}
