use core::fmt::Debug;

use crate::Coord;

/// A cell coordinate. `(0, 0)` is the top-left corner of a map, `x` grows to the right and `y`
/// grows downwards.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub const fn new(x: Coord, y: Coord) -> Self {
        Point { x, y }
    }

    /// Origin of child quadrant `(dx, dy)` when `self` is measured in units of the parent's size.
    pub const fn child(&self, dx: Coord, dy: Coord) -> Self {
        Point {
            x: 2 * self.x + dx,
            y: 2 * self.y + dy,
        }
    }
}

impl From<(Coord, Coord)> for Point {
    fn from((x, y): (Coord, Coord)) -> Self {
        Point { x, y }
    }
}

impl Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
