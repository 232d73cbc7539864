//! The six cube faces and their direction mappings.

use std::fmt;
use std::str::FromStr;

/// One face of the output cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Back,
    Left,
    Front,
    Right,
    Top,
    Bottom,
}

impl Face {
    /// All faces in output order.
    pub const ALL: [Face; 6] = [
        Face::Back,
        Face::Left,
        Face::Front,
        Face::Right,
        Face::Top,
        Face::Bottom,
    ];

    /// Short code used in tile file names.
    pub fn prefix(self) -> &'static str {
        match self {
            Face::Back => "b",
            Face::Left => "l",
            Face::Front => "f",
            Face::Right => "r",
            Face::Top => "u",
            Face::Bottom => "d",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Face::Back => "Back",
            Face::Left => "Left",
            Face::Front => "Front",
            Face::Right => "Right",
            Face::Top => "Top",
            Face::Bottom => "Bottom",
        }
    }

    /// Direction vector for the normalized face coordinate `(a, b)`.
    ///
    /// `a` runs left to right and `b` top to bottom, both in `[-1, 1)`.
    /// The vector is not normalized; only its angles are used.
    #[inline]
    pub fn direction(self, a: f64, b: f64) -> [f64; 3] {
        match self {
            Face::Back => [-1.0, -a, -b],
            Face::Left => [a, -1.0, -b],
            Face::Front => [1.0, a, -b],
            Face::Right => [-a, 1.0, -b],
            Face::Top => [b, a, 1.0],
            Face::Bottom => [-b, a, -1.0],
        }
    }

    /// Cell `(column, row)` this face occupies in the 4×3 horizontal cross.
    pub fn cross_cell(self) -> (u32, u32) {
        match self {
            Face::Back => (0, 1),
            Face::Left => (1, 1),
            Face::Front => (2, 1),
            Face::Right => (3, 1),
            Face::Top => (2, 0),
            Face::Bottom => (2, 2),
        }
    }

    /// Face occupying cross cell `(column, row)`, if any.
    pub fn at_cross_cell(column: u32, row: u32) -> Option<Face> {
        Face::ALL.into_iter().find(|f| f.cross_cell() == (column, row))
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown face name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown face '{0}' (expected back, left, front, right, top, bottom or b, l, f, r, u, d)")]
pub struct ParseFaceError(pub String);

impl FromStr for Face {
    type Err = ParseFaceError;

    /// Accepts full names or tile prefixes, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Face::ALL
            .into_iter()
            .find(|f| f.prefix() == lower || f.name().eq_ignore_ascii_case(&lower))
            .ok_or_else(|| ParseFaceError(s.to_string()))
    }
}
