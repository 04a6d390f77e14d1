use super::{NumberSet, Ticket, COLUMNS, NUMBERS_PER_ROW, ROWS};

const SEPARATOR: &str = "----------------------------";
const EMPTY_CELL: &str = "  ";
const ROW_COMPLETE: &str = " ✅";

/// Monospace grid of the ticket, wrapped in a code span.
pub fn format_ticket(ticket: &Ticket) -> String {
    render(ticket, None)
}

/// Grid with every extracted number struck through (MarkdownV2) and a marker
/// on rows with all five numbers drawn.
pub fn format_strikethrough(ticket: &Ticket, extracted: &NumberSet) -> String {
    render(ticket, Some(extracted))
}

/// `(row, column)` of every populated cell whose number was extracted.
pub fn struck_cells(ticket: &Ticket, extracted: &NumberSet) -> Vec<(usize, usize)> {
    let mut cells = Vec::new();
    for row in 0..ROWS {
        for column in 0..COLUMNS {
            if let Some(number) = ticket.cell(row, column) {
                if extracted.contains(number) {
                    cells.push((row, column));
                }
            }
        }
    }
    cells
}

pub fn completed_rows(ticket: &Ticket, extracted: &NumberSet) -> Vec<usize> {
    (0..ROWS)
        .filter(|&row| struck_in_row(ticket, extracted, row) == NUMBERS_PER_ROW)
        .collect()
}

fn struck_in_row(ticket: &Ticket, extracted: &NumberSet, row: usize) -> usize {
    ticket
        .row_numbers(row)
        .iter()
        .filter(|&n| extracted.contains(n))
        .count()
}

fn render(ticket: &Ticket, extracted: Option<&NumberSet>) -> String {
    let mut out = String::with_capacity(256);
    out.push('`');
    out.push_str(SEPARATOR);
    out.push('\n');

    for row in 0..ROWS {
        out.push('|');
        let mut struck = 0;
        for column in 0..COLUMNS {
            match ticket.cell(row, column) {
                None => out.push_str(EMPTY_CELL),
                Some(number) if extracted.map_or(false, |set| set.contains(number)) => {
                    struck += 1;
                    out.push_str(&format!("`~{:02}~`", number));
                }
                Some(number) => out.push_str(&format!("{:02}", number)),
            }
            out.push('|');
        }
        if extracted.is_some() && struck == NUMBERS_PER_ROW {
            out.push_str(ROW_COMPLETE);
        }
        out.push('\n');
        out.push_str(SEPARATOR);
        out.push('\n');
    }

    out.push('`');
    out
}
