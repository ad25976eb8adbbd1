pub mod fixed_ring;
pub mod intrusive_list;
pub mod keyed_lock;
pub mod slot_arena;

pub use fixed_ring::FixedRing;
pub use intrusive_list::IntrusiveList;
pub use keyed_lock::{KeyGuard, KeyedLock};
pub use slot_arena::{SlotArena, SlotId};
