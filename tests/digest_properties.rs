use hashed_kv::{Config, DigestPrimitive, EntryCodec, Error, HashAlgorithm, HashedMap};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use sha2::{Digest as _, Sha256};
use std::hash::Hash;

fn map_with_window<K, V>(size: usize) -> HashedMap<K, V>
where
    K: Eq + Hash + Serialize,
    V: Serialize,
{
    HashedMap::with_options(DigestPrimitive::sha256(), size, EntryCodec::Bincode).unwrap()
}

#[test]
fn oversized_window_is_a_configuration_error() {
    let result: Result<HashedMap<String, String>, Error> =
        HashedMap::with_options(DigestPrimitive::sha256(), 200, EntryCodec::Bincode);
    assert!(matches!(result, Err(Error::Configuration { .. })));
}

#[test]
fn widest_window_keeps_working() {
    let mut map: HashedMap<u32, u32> = map_with_window(16);
    let empty = map.digest().unwrap();
    for i in 0..40u32 {
        map.insert(i, i).unwrap();
    }
    for i in 0..40u32 {
        map.remove(&i).unwrap();
    }
    assert_eq!(map.digest().unwrap(), empty);
}

#[test]
fn empty_map_digest_is_hash_of_nothing() {
    let mut map: HashedMap<String, String> = HashedMap::new();
    assert_eq!(map.digest().unwrap(), Sha256::digest(b"").to_vec());
}

#[test]
fn grow_then_shrink_retraces_every_digest() {
    let mut map = HashedMap::new();
    let mut history = vec![map.digest().unwrap()];

    for i in 0..1026u32 {
        map.insert(i, i.wrapping_mul(7)).unwrap();
        history.push(map.digest().unwrap());
    }
    assert_eq!(map.engine().current_depth(), 11);

    for i in (0..1026u32).rev() {
        history.pop();
        assert_eq!(map.remove(&i).unwrap(), Some(i.wrapping_mul(7)));
        assert_eq!(
            &map.digest().unwrap(),
            history.last().unwrap(),
            "digest mismatch after removing {}",
            i
        );
    }
    assert!(map.is_empty());
}

#[test]
fn remove_undoes_insert_at_every_size_and_window() {
    for window in 1..=4 {
        let mut map: HashedMap<String, String> = map_with_window(window);
        for n in 0..40 {
            let before = map.digest().unwrap();
            map.insert("transient".to_string(), format!("{}", n)).unwrap();
            map.remove("transient").unwrap();
            assert_eq!(map.digest().unwrap(), before, "window {} size {}", window, n);
            map.insert(format!("key{}", n), format!("value{}", n)).unwrap();
        }
    }
}

#[test]
fn warm_set_always_holds_current_depth() {
    for window in 1..=5 {
        let mut map: HashedMap<u32, u32> = map_with_window(window);
        for n in 0..70u32 {
            map.insert(n, n).unwrap();
            let engine = map.engine();
            assert!(engine.warm_depths().contains(&engine.current_depth()));
            assert!(engine.warm_depths().len() <= window);
        }
    }
}

#[test]
fn shuffled_builds_agree() {
    let entries: Vec<(String, String)> = (0..300)
        .map(|i| (format!("user:{:04}", i), format!("profile-{}", i * 3)))
        .collect();
    let config = Config {
        algorithm: HashAlgorithm::Sha512,
        ..Config::default()
    };

    let mut reference = HashedMap::from_entries(&config, entries.clone()).unwrap();
    let expected = reference.digest().unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..3 {
        let mut shuffled = entries.clone();
        shuffled.shuffle(&mut rng);
        let mut map = HashedMap::from_entries(&config, shuffled).unwrap();
        assert_eq!(map.digest().unwrap(), expected);
    }
}

#[test]
fn overwrite_matches_fresh_insert() {
    let mut overwritten = HashedMap::new();
    overwritten.insert("a", 1).unwrap();
    overwritten.insert("b", 2).unwrap();
    overwritten.insert("a", 3).unwrap();

    let mut fresh = HashedMap::new();
    fresh.insert("b", 2).unwrap();
    fresh.insert("a", 3).unwrap();

    assert_eq!(overwritten.digest().unwrap(), fresh.digest().unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn digest_depends_only_on_contents(
        ops in prop::collection::vec((0u8..48, any::<u16>(), any::<bool>()), 0..120),
        window in 1usize..5,
    ) {
        let mut map: HashedMap<u8, u16> = map_with_window(window);
        let mut model = std::collections::BTreeMap::new();
        for (key, value, is_insert) in ops {
            if is_insert {
                map.insert(key, value).unwrap();
                model.insert(key, value);
            } else {
                prop_assert_eq!(map.remove(&key).unwrap(), model.remove(&key));
            }
        }

        let mut rebuilt: HashedMap<u8, u16> = map_with_window(3);
        for (key, value) in &model {
            rebuilt.insert(*key, *value).unwrap();
        }
        prop_assert_eq!(map.len(), model.len());
        prop_assert_eq!(map.digest().unwrap(), rebuilt.digest().unwrap());
    }
}
