//! Binary shapes used by the game contract.
//!
//! A number set is a big-endian unsigned integer whose bit `i` marks number
//! `i` as present. A ticket is three rows, each a 4-byte big-endian length
//! followed by that row's number set.

use super::{NumberSet, Ticket, COLUMNS, ROWS};
use crate::error::{BingoError, Result};

const LENGTH_PREFIX: usize = 4;

/// Leading bytes of each `getUserTickets` item before the ticket payload.
const USER_TICKET_PREFIX: usize = 4;

/// Bits past the range of `u32` numbers are ignored.
pub fn decode_number_set(bytes: &[u8]) -> NumberSet {
    let mut set = NumberSet::new();
    for (position, byte) in bytes.iter().rev().enumerate() {
        let Some(base) = bit_base(position) else {
            break;
        };
        for bit in 0..8u32 {
            if byte & (1 << bit) != 0 {
                set.insert(base + bit);
            }
        }
    }
    set
}

/// Number carried by bit 0 of the byte `position` places from the end.
fn bit_base(position: usize) -> Option<u32> {
    let base = u32::try_from(position).ok()?.checked_mul(8)?;
    base.checked_add(7).map(|_| base)
}

/// Minimal big-endian form; the empty set encodes to no bytes.
pub fn encode_number_set(set: &NumberSet) -> Vec<u8> {
    let Some(max) = set.max() else {
        return Vec::new();
    };

    let len = (max / 8 + 1) as usize;
    let mut bytes = vec![0u8; len];
    for number in set.iter() {
        let index = len - 1 - (number / 8) as usize;
        bytes[index] |= 1 << (number % 8);
    }
    bytes
}

pub fn decode_ticket(bytes: &[u8]) -> Result<Ticket> {
    let mut ticket = Ticket::empty();
    let mut rest = bytes;

    for row in 0..ROWS {
        if rest.len() < LENGTH_PREFIX {
            return Err(BingoError::TruncatedTicket {
                row,
                declared: LENGTH_PREFIX,
                remaining: rest.len(),
            });
        }
        let (prefix, tail) = rest.split_at(LENGTH_PREFIX);
        let declared = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        if declared > tail.len() {
            return Err(BingoError::TruncatedTicket {
                row,
                declared,
                remaining: tail.len(),
            });
        }
        let (segment, tail) = tail.split_at(declared);
        rest = tail;

        let numbers = decode_number_set(segment);
        if numbers.len() > COLUMNS {
            return Err(BingoError::malformed_row(
                row,
                format!("{} numbers in a {}-column row", numbers.len(), COLUMNS),
            ));
        }
        for number in numbers.iter() {
            ticket.place(row, number)?;
        }
    }

    if !rest.is_empty() {
        tracing::debug!("Ignoring {} trailing bytes after ticket", rest.len());
    }

    Ok(ticket)
}

pub fn encode_ticket(ticket: &Ticket) -> Vec<u8> {
    let mut bytes = Vec::new();
    for row in 0..ROWS {
        let segment = encode_number_set(&ticket.row_numbers(row));
        bytes.extend_from_slice(&(segment.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&segment);
    }
    bytes
}

/// Decode one item of the `getUserTickets` contract view.
pub fn decode_user_ticket(item: &[u8]) -> Result<Ticket> {
    if item.len() < USER_TICKET_PREFIX {
        return Err(BingoError::TruncatedTicket {
            row: 0,
            declared: USER_TICKET_PREFIX,
            remaining: item.len(),
        });
    }
    decode_ticket(&item[USER_TICKET_PREFIX..])
}
