pub mod lru;
pub mod none;
pub mod ring;
pub mod wrapper;
