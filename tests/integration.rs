/*
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use swisstable::error::Error;
use swisstable::map::SwissMap;
use swisstable::set::SwissSet;
use swisstable::sharded::{ShardedMap, ShardedSet};

#[test]
fn map_matches_a_reference_hashmap_under_a_mixed_workload() {
    let mut reference = HashMap::new();
    let mut map: SwissMap<i64, i64> = SwissMap::new();
    let mut rng: u64 = 0x9E3779B97F4A7C15;

    for step in 0..5000i64 {
        match step % 3 {
            0 => {
                let key = rng_next(&mut rng) as i64 % 500;
                reference.insert(key, step);
                map.put(key, step).unwrap();
            }
            1 => {
                let key = rng_next(&mut rng) as i64 % 500;
                assert_eq!(reference.remove(&key), map.remove(&key));
            }
            _ => {
                let key = rng_next(&mut rng) as i64 % 500;
                assert_eq!(reference.get(&key), map.get(&key));
            }
        }
    }
    assert_eq!(reference.len(), map.len());
    for (k, v) in &reference {
        assert_eq!(map.get(k), Some(v));
    }
}

fn rng_next(state: &mut u64) -> u64 {
    // xorshift64, deterministic and dependency-free for this harness
    *state ^= *state << 13;
    *state ^= *state >> 7;
    *state ^= *state << 17;
    *state
}

#[test]
fn set_rejects_duplicates_and_supports_null_element() {
    let mut set: SwissSet<Option<&str>> = SwissSet::new();
    assert!(set.add(Some("a")).unwrap());
    assert!(!set.add(Some("a")).unwrap());
    assert!(set.add(None).unwrap());
    assert!(set.contains(&None));
    assert_eq!(set.len(), 2);
}

#[test]
fn map_iterator_removal_does_not_disturb_untouched_entries() {
    let mut map: SwissMap<i32, i32> = SwissMap::new();
    map.put_all((0..200).map(|i| (i, i))).unwrap();
    {
        let mut it = map.iter_remove();
        while let Some((k, _)) = it.next() {
            if *k % 10 == 0 {
                it.remove().unwrap();
            }
        }
    }
    assert_eq!(map.len(), 180);
    for i in 0..200 {
        if i % 10 == 0 {
            assert_eq!(map.get(&i), None);
        } else {
            assert_eq!(map.get(&i), Some(&i));
        }
    }
}

#[test]
fn sharded_map_is_usable_from_many_threads_at_once() {
    let map: Arc<ShardedMap<i32, i32>> = Arc::new(ShardedMap::with_shard_count(16));
    let writers: Vec<_> = (0..16)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for i in 0..500 {
                    map.put(t * 10_000 + i, i).unwrap();
                }
            })
        })
        .collect();
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for _ in 0..2000 {
                    let _ = map.get(&0);
                }
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(map.len(), 16 * 500);
}

#[test]
fn sharded_set_snapshot_iteration_sees_every_element_once() {
    let set: ShardedSet<i32> = ShardedSet::with_shard_count(4);
    set.add_all(0..1000).unwrap();
    let mut seen: Vec<i32> = set.iter().collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..1000).collect::<Vec<_>>());
}

#[test]
fn sharded_map_null_key_is_rejected_before_any_shard_is_touched() {
    let map: ShardedMap<Option<i32>, i32> = ShardedMap::with_shard_count(4);
    assert_eq!(map.put(None, 1), Err(Error::NullKeyRejected));
    assert_eq!(map.len(), 0);
}

#[test]
fn sharded_map_iterator_removal_does_not_disturb_untouched_entries() {
    let map: ShardedMap<i32, i32> = ShardedMap::with_shard_count(4);
    map.put_all((0..200).map(|i| (i, i))).unwrap();
    {
        let mut it = map.iter();
        while let Some((k, _)) = it.next() {
            if k % 10 == 0 {
                it.remove_current().unwrap();
            }
        }
    }
    assert_eq!(map.len(), 180);
    for i in 0..200 {
        if i % 10 == 0 {
            assert!(map.get(&i).is_none());
        } else {
            assert_eq!(map.get(&i).as_deref(), Some(&i));
        }
    }
}
