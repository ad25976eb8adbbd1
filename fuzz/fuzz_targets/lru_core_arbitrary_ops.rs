#![no_main]

use std::time::{Duration, Instant};

use libfuzzer_sys::fuzz_target;
use restcache::policy::lru::{LruCore, Probe};

// Fuzz arbitrary operation sequences on LruCore
//
// Interleaves insert, probe, peek, remove, sweep, purge, resize and clock
// advances over a small key space, checking index/list agreement after
// every step.
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let capacity = data[0] as usize % 16;
    let ttl = Duration::from_secs(u64::from(data[1] % 8));
    let mut core: LruCore<u8> = LruCore::with_ttl(capacity, ttl);
    let start = Instant::now();
    let mut elapsed = Duration::ZERO;

    let mut idx = 2;
    while idx + 1 < data.len() {
        let op = data[idx] % 8;
        let arg = data[idx + 1];
        let key = format!("k{}", arg % 24);
        let now = start + elapsed;

        match op {
            0 => {
                let before = core.len();
                let evicted = core.insert(key.as_str().into(), arg, now);
                if core.capacity() == 0 {
                    assert!(core.is_empty());
                } else {
                    assert_eq!(core.recency_rank(&key), Some(0));
                    assert!(evicted <= 1);
                    assert!(core.len() <= before + 1);
                }
            },
            1 => match core.probe(&key, now) {
                Probe::Hit(_) => assert_eq!(core.recency_rank(&key), Some(0)),
                Probe::Expired | Probe::Absent => assert!(!core.contains(&key)),
            },
            2 => {
                let rank = core.recency_rank(&key);
                let _ = core.peek(&key, now);
                assert_eq!(core.recency_rank(&key), rank);
            },
            3 => {
                core.remove(&key);
                assert!(!core.contains(&key));
            },
            4 => {
                let delay = Duration::from_secs(u64::from(arg % 4));
                if core.sweep(now, delay).is_some() {
                    assert_eq!(core.last_sweep(), Some(now));
                }
            },
            5 => {
                core.purge_expired(now);
                for key in core.keys_by_recency() {
                    assert!(core.peek(&key, now).is_some());
                }
            },
            6 => {
                core.set_capacity(arg as usize % 16);
            },
            7 => {
                elapsed += Duration::from_secs(u64::from(arg % 5));
            },
            _ => unreachable!(),
        }

        core.check_invariants().unwrap();
        idx += 2;
    }
});
