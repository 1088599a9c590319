/// One of the four input channels a note can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Left,
    Down,
    Up,
    Right,
}

impl Lane {
    /// All lanes in evaluation order.
    pub const ALL: [Lane; 4] = [Lane::Left, Lane::Down, Lane::Up, Lane::Right];

    /// Map an upstream direction value. Anything outside 0..=3 is unmappable.
    pub fn from_direction(direction: i64) -> Option<Self> {
        match direction {
            0 => Some(Lane::Left),
            1 => Some(Lane::Down),
            2 => Some(Lane::Up),
            3 => Some(Lane::Right),
            _ => None,
        }
    }

    /// Direction value / `keyCode` on the wire.
    pub fn direction(self) -> u8 {
        match self {
            Lane::Left => 0,
            Lane::Down => 1,
            Lane::Up => 2,
            Lane::Right => 3,
        }
    }

    /// Lane name used in the action line.
    pub fn key_name(self) -> &'static str {
        match self {
            Lane::Left => "left",
            Lane::Down => "down",
            Lane::Up => "up",
            Lane::Right => "right",
        }
    }

    /// Index into per-lane arrays.
    pub fn index(self) -> usize {
        self.direction() as usize
    }
}
