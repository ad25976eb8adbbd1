#![no_main]

use libfuzzer_sys::fuzz_target;
use restcache::ds::IntrusiveList;

// Fuzz arbitrary operation sequences on IntrusiveList
//
// Tests random sequences of push_front, pop_back, move_to_front, remove and
// clear, using stale ids as well as live ones.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let mut list: IntrusiveList<u32> = IntrusiveList::new();
    let mut all_ids = Vec::new();

    let mut idx = 0;
    while idx + 1 < data.len() {
        let op = data[idx] % 6;
        let value = u32::from(data[idx + 1]);

        match op {
            0 => {
                let id = list.push_front(value);
                all_ids.push(id);
                assert_eq!(list.iter_entries().next(), Some((id, &value)));
            },
            1 => {
                let old_len = list.len();
                match list.pop_back() {
                    Some(_) => assert_eq!(list.len(), old_len - 1),
                    None => assert_eq!(old_len, 0),
                }
            },
            2 => {
                if !all_ids.is_empty() {
                    let id = all_ids[value as usize % all_ids.len()];
                    if list.move_to_front(id) {
                        assert_eq!(list.iter_entries().next().map(|(first, _)| first), Some(id));
                    } else {
                        assert!(list.get(id).is_none());
                    }
                }
            },
            3 => {
                if !all_ids.is_empty() {
                    let id = all_ids[value as usize % all_ids.len()];
                    let was_present = list.get(id).is_some();
                    assert_eq!(list.remove(id).is_some(), was_present);
                    assert!(list.get(id).is_none());
                }
            },
            4 => {
                let order: Vec<u32> = list.iter().copied().collect();
                let ids: Vec<_> = list.iter_entries().map(|(id, _)| id).collect();
                assert_eq!(order.len(), list.len());
                assert_eq!(ids.len(), list.len());
                for (id, value) in ids.iter().zip(&order) {
                    assert_eq!(list.get(*id), Some(value));
                }
            },
            5 => {
                if value % 8 == 0 {
                    list.clear();
                    assert!(list.is_empty());
                }
            },
            _ => unreachable!(),
        }

        list.check_links().unwrap();
        idx += 2;
    }
});
