use crate::Coord;

/// One quadrant of a square region.
///
/// The discriminant doubles as the index of the quadrant in a branch's children, which are always
/// stored as `[nw, ne, sw, se]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    TopLeft = 0,
    TopRight = 1,
    BottomLeft = 2,
    BottomRight = 3,
}

impl Direction {
    /// Every quadrant, in child order.
    pub const ALL: [Direction; 4] = [
        Direction::TopLeft,
        Direction::TopRight,
        Direction::BottomLeft,
        Direction::BottomRight,
    ];

    /// Select the quadrant of a square of sidelength `side` containing `(x, y)`.
    ///
    /// The split happens at `half = side / 2` on each axis independently: coordinates strictly
    /// below `half` fall left (or top), everything else falls right (or bottom).
    pub const fn select(x: u64, y: u64, side: u64) -> Self {
        let half = side / 2;

        match (x < half, y < half) {
            (true, true) => Direction::TopLeft,
            (false, true) => Direction::TopRight,
            (true, false) => Direction::BottomLeft,
            (false, false) => Direction::BottomRight,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Offset of this quadrant's origin, in units of the quadrant's sidelength.
    pub const fn offset(self) -> (Coord, Coord) {
        match self {
            Direction::TopLeft => (0, 0),
            Direction::TopRight => (1, 0),
            Direction::BottomLeft => (0, 1),
            Direction::BottomRight => (1, 1),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Direction;

    #[test]
    fn select_corners() {
        assert_eq!(Direction::select(0, 0, 8), Direction::TopLeft);
        assert_eq!(Direction::select(7, 0, 8), Direction::TopRight);
        assert_eq!(Direction::select(0, 7, 8), Direction::BottomLeft);
        assert_eq!(Direction::select(7, 7, 8), Direction::BottomRight);
    }

    #[test]
    fn select_boundary() {
        // `half` itself belongs to the right/bottom quadrant
        assert_eq!(Direction::select(3, 3, 8), Direction::TopLeft);
        assert_eq!(Direction::select(4, 3, 8), Direction::TopRight);
        assert_eq!(Direction::select(3, 4, 8), Direction::BottomLeft);
        assert_eq!(Direction::select(4, 4, 8), Direction::BottomRight);
    }

    #[test]
    fn select_unit_side() {
        // half is 0, so every coordinate goes bottom right
        assert_eq!(Direction::select(0, 0, 1), Direction::BottomRight);
    }

    #[test]
    fn index_matches_offset() {
        for (i, d) in Direction::ALL.into_iter().enumerate() {
            let (dx, dy) = d.offset();

            assert_eq!(d.index(), i);
            assert_eq!(Direction::select(dx as u64, dy as u64, 2), d);
        }
    }
}
