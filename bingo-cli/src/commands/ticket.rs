use anyhow::Context as _;
use bingo_core::ticket::{
    completed_rows, decode_number_set, decode_ticket, format_strikethrough, format_ticket, ROWS,
};

pub fn show_ticket(ticket_hex: &str, extracted_hex: Option<&str>) -> anyhow::Result<()> {
    let bytes = hex::decode(ticket_hex.trim()).context("Ticket is not valid hex")?;
    let ticket = decode_ticket(&bytes)?;

    for row in 0..ROWS {
        println!("Row {}: {}", row + 1, ticket.row_numbers(row));
    }
    println!();

    match extracted_hex {
        Some(extracted_hex) => {
            let bytes = hex::decode(extracted_hex.trim())
                .context("Extracted numbers are not valid hex")?;
            let extracted = decode_number_set(&bytes);
            println!("Extracted: {}", extracted);
            println!("{}", format_strikethrough(&ticket, &extracted));

            let lines = completed_rows(&ticket, &extracted);
            if !lines.is_empty() {
                println!("Completed rows: {:?}", lines.iter().map(|r| r + 1).collect::<Vec<_>>());
            }
        }
        None => println!("{}", format_ticket(&ticket)),
    }

    Ok(())
}
