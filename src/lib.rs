pub mod error;
pub mod generator;
pub mod loader;
pub mod map;
pub mod quadtree;
pub mod region_file;
pub mod storage;

pub use error::MapError;
pub use map::Map;
pub use quadtree::Point;
pub use storage::Storage;

pub type Coord = i64;
pub type Depth = u32;
