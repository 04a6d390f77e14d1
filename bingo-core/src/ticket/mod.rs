pub mod codec;
pub mod render;

pub use codec::{
    decode_number_set, decode_ticket, decode_user_ticket, encode_number_set, encode_ticket,
};
pub use render::{completed_rows, format_strikethrough, format_ticket, struck_cells};

use crate::error::{BingoError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const ROWS: usize = 3;
pub const COLUMNS: usize = 9;
pub const MIN_NUMBER: u32 = 1;
pub const MAX_NUMBER: u32 = 90;
/// Populated cells in every row of a well-formed ticket.
pub const NUMBERS_PER_ROW: usize = 5;

/// Column a bingo number belongs to.
pub fn column_of(number: u32) -> usize {
    ((number - 1) / 10) as usize
}

/// Unordered set of small non-negative integers, iterated in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumberSet(BTreeSet<u32>);

impl NumberSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, number: u32) -> bool {
        self.0.insert(number)
    }

    pub fn contains(&self, number: u32) -> bool {
        self.0.contains(&number)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn max(&self) -> Option<u32> {
        self.0.iter().next_back().copied()
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl FromIterator<u32> for NumberSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for NumberSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numbers: Vec<String> = self.iter().map(|n| n.to_string()).collect();
        write!(f, "[{}]", numbers.join(" "))
    }
}

/// A 3x9 bingo card. A zero cell is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    rows: [[u8; COLUMNS]; ROWS],
}

impl Ticket {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a ticket from raw rows, validating every populated cell.
    pub fn from_rows(rows: [[u8; COLUMNS]; ROWS]) -> Result<Self> {
        let mut ticket = Self::empty();
        for (row, cells) in rows.iter().enumerate() {
            for (column, &number) in cells.iter().enumerate() {
                if number == 0 {
                    continue;
                }
                if column_of_checked(row, u32::from(number))? != column {
                    return Err(BingoError::malformed_row(
                        row,
                        format!("{} does not belong in column {}", number, column),
                    ));
                }
                ticket.place(row, u32::from(number))?;
            }
        }
        Ok(ticket)
    }

    /// Place `number` in its column of `row`.
    pub fn place(&mut self, row: usize, number: u32) -> Result<()> {
        if row >= ROWS {
            return Err(BingoError::malformed_row(row, "row index out of range"));
        }
        let column = column_of_checked(row, number)?;
        let cell = &mut self.rows[row][column];
        if *cell != 0 {
            return Err(BingoError::malformed_row(
                row,
                format!("{} collides with {} in column {}", number, cell, column),
            ));
        }
        // bounded by MAX_NUMBER
        *cell = number as u8;
        Ok(())
    }

    pub fn rows(&self) -> &[[u8; COLUMNS]; ROWS] {
        &self.rows
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<u32> {
        match self.rows.get(row)?.get(column)? {
            0 => None,
            &n => Some(u32::from(n)),
        }
    }

    pub fn row_numbers(&self, row: usize) -> NumberSet {
        self.rows
            .get(row)
            .map(|cells| {
                cells
                    .iter()
                    .filter(|&&n| n != 0)
                    .map(|&n| u32::from(n))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn numbers(&self) -> NumberSet {
        (0..ROWS).flat_map(|row| self.row_numbers(row).to_vec()).collect()
    }
}

fn column_of_checked(row: usize, number: u32) -> Result<usize> {
    if !(MIN_NUMBER..=MAX_NUMBER).contains(&number) {
        return Err(BingoError::malformed_row(
            row,
            format!("number {} outside {}..={}", number, MIN_NUMBER, MAX_NUMBER),
        ));
    }
    Ok(column_of(number))
}
