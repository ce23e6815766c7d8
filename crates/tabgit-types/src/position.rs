use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// A cell coordinate: zero-based row and column.
///
/// Serializes as the string `"row,col"` so it can key JSON maps; the sparse
/// cell grid of a sheet is a map from `Position` to cell hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: u32,
    pub col: u32,
}

impl Position {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({},{})", self.row, self.col)
    }
}

impl FromStr for Position {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = s
            .split_once(',')
            .ok_or_else(|| TypeError::InvalidPosition(s.to_string()))?;
        let row = row
            .trim()
            .parse()
            .map_err(|_| TypeError::InvalidPosition(s.to_string()))?;
        let col = col
            .trim()
            .parse()
            .map_err(|_| TypeError::InvalidPosition(s.to_string()))?;
        Ok(Self { row, col })
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PositionVisitor;

        impl Visitor<'_> for PositionVisitor {
            type Value = Position;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a \"row,col\" string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Position, E> {
                v.parse().map_err(|e: TypeError| E::custom(e.to_string()))
            }
        }

        deserializer.deserialize_str(PositionVisitor)
    }
}
