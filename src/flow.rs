//! Flow algebra (component C2, spec §4.2).
//!
//! Flow is an absolute direction expressed as a multiple of 90 degrees.
//! Relative directions are resolved against an incoming absolute flow
//! before anything downstream (chain finder, placement, router) sees them.

/// An absolute compass direction, stored as degrees clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flow(pub u16);

impl Flow {
    pub const NORTH: Flow = Flow(0);
    pub const EAST: Flow = Flow(90);
    pub const SOUTH: Flow = Flow(180);
    pub const WEST: Flow = Flow(270);

    /// The engine's default flow when nothing else pins one down.
    pub const DEFAULT: Flow = Flow::EAST;

    pub fn normalize(deg: i32) -> Flow {
        Flow((deg.rem_euclid(360)) as u16)
    }

    pub fn as_side(self) -> Side {
        match self.0 {
            0 => Side::North,
            90 => Side::East,
            180 => Side::South,
            270 => Side::West,
            other => {
                // Non-axis-aligned flow is invalid input; snap to nearest side.
                let snapped = ((other as i32 + 45) / 90 * 90).rem_euclid(360);
                Flow(snapped as u16).as_side()
            }
        }
    }

    pub fn opposite(self) -> Flow {
        Flow::normalize(self.0 as i32 + 180)
    }
}

impl Default for Flow {
    fn default() -> Self {
        Flow::DEFAULT
    }
}

/// One of the four grid sides, used wherever a port or boundary needs a
/// concrete direction rather than a raw degree count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    North,
    South,
    East,
    West,
}

impl Side {
    pub fn as_flow(self) -> Flow {
        match self {
            Side::North => Flow::NORTH,
            Side::East => Flow::EAST,
            Side::South => Flow::SOUTH,
            Side::West => Flow::WEST,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::South => Side::North,
            Side::East => Side::West,
            Side::West => Side::East,
        }
    }

    /// Unit step (dx, dy) for moving one cell toward this side, with the
    /// grid's y axis growing downward/south (screen convention).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Side::North => (0, -1),
            Side::South => (0, 1),
            Side::East => (1, 0),
            Side::West => (-1, 0),
        }
    }
}

/// A direction as written on an edge's `flow`/`start`/`end` attribute:
/// either pinned absolute, or relative to whatever flow is incoming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Absolute(Flow),
    Forward,
    Right,
    Back,
    Left,
}

impl Direction {
    /// `_flow_as_direction(in, dir)` from spec §4.2.
    pub fn resolve(self, incoming: Flow) -> Flow {
        match self {
            Direction::Absolute(f) => f,
            Direction::Forward => incoming,
            Direction::Right => Flow::normalize(incoming.0 as i32 + 90),
            Direction::Back => Flow::normalize(incoming.0 as i32 + 180),
            Direction::Left => Flow::normalize(incoming.0 as i32 - 90),
        }
    }

    /// `_flow_as_side(in, dir)` from spec §4.2.
    pub fn resolve_side(self, incoming: Flow) -> Side {
        self.resolve(incoming).as_side()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_directions_resolve_against_incoming_flow() {
        let east = Flow::EAST;
        assert_eq!(Direction::Forward.resolve(east), east);
        assert_eq!(Direction::Right.resolve(east), Flow::SOUTH);
        assert_eq!(Direction::Back.resolve(east), Flow::WEST);
        assert_eq!(Direction::Left.resolve(east), Flow::NORTH);
    }

    #[test]
    fn absolute_direction_ignores_incoming() {
        assert_eq!(Direction::Absolute(Flow::NORTH).resolve(Flow::EAST), Flow::NORTH);
    }

    #[test]
    fn flow_as_side_round_trips_the_four_axes() {
        assert_eq!(Flow::NORTH.as_side(), Side::North);
        assert_eq!(Flow::EAST.as_side(), Side::East);
        assert_eq!(Flow::SOUTH.as_side(), Side::South);
        assert_eq!(Flow::WEST.as_side(), Side::West);
    }

    #[test]
    fn side_delta_uses_screen_convention() {
        assert_eq!(Side::South.delta(), (0, 1));
        assert_eq!(Side::North.delta(), (0, -1));
    }

    #[test]
    fn opposite_is_involutive() {
        for s in [Side::North, Side::South, Side::East, Side::West] {
            assert_eq!(s.opposite().opposite(), s);
        }
    }
}
