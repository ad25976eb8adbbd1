#![no_main]

use libfuzzer_sys::fuzz_target;
use restcache::ds::FixedRing;

// Fuzz arbitrary operation sequences on FixedRing
//
// Tests random sequences of insert, get, contains, remove and clear, checking
// occupancy and write index bounds after each step.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let capacity = data[0] as usize % 32;
    let mut ring: FixedRing<u8, u16> = FixedRing::new(capacity);

    let mut idx = 1;
    while idx + 2 < data.len() {
        let op = data[idx] % 5;
        let key = data[idx + 1] % 48;
        let value = u16::from(data[idx + 2]);

        match op {
            0 => {
                let was_present = ring.contains(&key);
                let before = ring.len();
                let displaced = ring.insert(key, value);
                if capacity == 0 {
                    assert!(ring.is_empty());
                } else {
                    assert_eq!(ring.get(&key), Some(&value));
                    if was_present {
                        assert!(displaced.is_none());
                        assert_eq!(ring.len(), before);
                    } else if let Some((old, _)) = displaced {
                        assert_ne!(old, key);
                        assert!(!ring.contains(&old));
                        assert_eq!(ring.len(), before);
                    }
                }
            },
            1 => {
                let _ = ring.get(&key);
            },
            2 => {
                assert_eq!(ring.contains(&key), ring.position(&key).is_some());
            },
            3 => {
                ring.remove(&key);
                assert!(!ring.contains(&key));
            },
            4 => {
                if value % 16 == 0 {
                    ring.clear();
                    assert!(ring.is_empty());
                }
            },
            _ => unreachable!(),
        }

        assert!(ring.len() <= ring.capacity());
        ring.check_invariants().unwrap();
        idx += 3;
    }
});
