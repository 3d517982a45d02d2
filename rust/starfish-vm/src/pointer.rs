//! Instruction pointer state and the direction transition table.

use strum::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

/// The reflecting instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirror {
    /// `/`
    Slash,
    /// `\`
    Backslash,
    /// `|`
    Vertical,
    /// `_`
    Horizontal,
    /// `#`
    Cross,
}

impl Mirror {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '/' => Some(Mirror::Slash),
            '\\' => Some(Mirror::Backslash),
            '|' => Some(Mirror::Vertical),
            '_' => Some(Mirror::Horizontal),
            '#' => Some(Mirror::Cross),
            _ => None,
        }
    }
}

impl Direction {
    /// Arrow instructions set the direction outright.
    pub fn from_arrow(c: char) -> Option<Self> {
        match c {
            '>' => Some(Direction::Right),
            'v' => Some(Direction::Down),
            '<' => Some(Direction::Left),
            '^' => Some(Direction::Up),
            _ => None,
        }
    }

    /// `(row, col)` offset of one step.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::Right => (0, 1),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Up => (-1, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Right | Direction::Left)
    }

    pub fn reflect(self, mirror: Mirror) -> Direction {
        use Direction::*;
        match (mirror, self) {
            (Mirror::Slash, Right) => Up,
            (Mirror::Slash, Down) => Left,
            (Mirror::Slash, Left) => Down,
            (Mirror::Slash, Up) => Right,

            (Mirror::Backslash, Right) => Down,
            (Mirror::Backslash, Down) => Right,
            (Mirror::Backslash, Left) => Up,
            (Mirror::Backslash, Up) => Left,

            (Mirror::Vertical, Right) => Left,
            (Mirror::Vertical, Left) => Right,
            (Mirror::Vertical, vertical) => vertical,

            (Mirror::Horizontal, Down) => Up,
            (Mirror::Horizontal, Up) => Down,
            (Mirror::Horizontal, horizontal) => horizontal,

            (Mirror::Cross, Right) => Left,
            (Mirror::Cross, Down) => Up,
            (Mirror::Cross, Left) => Right,
            (Mirror::Cross, Up) => Down,
        }
    }
}

/// The program counter: where the IP is, where it is heading, and the
/// modes that change how the next cell is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pointer {
    pub row: i64,
    pub col: i64,
    pub direction: Direction,
    /// Active quote character while in string mode.
    pub quote: Option<char>,
    /// Deep-sea mode (`u`): only movement instructions execute.
    pub submerged: bool,
    /// Last horizontal heading, consulted by the hook mirror.
    pub last_horizontal: Direction,
    /// Whether the next horizontal hit on the hook mirror turns up.
    pub hooked: bool,
}

impl Default for Pointer {
    fn default() -> Self {
        Self::new()
    }
}

impl Pointer {
    pub fn new() -> Self {
        Self {
            row: 0,
            col: 0,
            direction: Direction::Right,
            quote: None,
            submerged: false,
            last_horizontal: Direction::Right,
            hooked: false,
        }
    }

    pub fn in_string_mode(&self) -> bool {
        self.quote.is_some()
    }

    pub fn turned(mut self, direction: Direction) -> Self {
        self.direction = direction;
        if direction.is_horizontal() {
            self.last_horizontal = direction;
        }
        self
    }

    pub fn moved_to(mut self, row: i64, col: i64) -> Self {
        self.row = row;
        self.col = col;
        self
    }

    /// The hook mirror: vertical motion resumes the last horizontal heading;
    /// horizontal motion alternately turns down, then up.
    pub fn hooked_turn(self) -> Self {
        if self.direction.is_horizontal() {
            let mut next = if self.hooked {
                self.turned(Direction::Up)
            } else {
                self.turned(Direction::Down)
            };
            next.hooked = !self.hooked;
            next
        } else {
            let heading = self.last_horizontal;
            self.turned(heading)
        }
    }

    /// Step one cell and wrap toroidally onto a `width` x `height` grid.
    pub fn advance(&mut self, width: usize, height: usize) {
        let (dr, dc) = self.direction.delta();
        self.row = (self.row + dr).rem_euclid(height.max(1) as i64);
        self.col = (self.col + dc).rem_euclid(width.max(1) as i64);
    }
}
