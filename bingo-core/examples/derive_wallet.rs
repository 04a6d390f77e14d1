use bingo_core::ticket::{decode_number_set, encode_ticket, format_strikethrough, format_ticket};
use bingo_core::{PlayerWallet, Seed, Ticket};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let phrase = std::env::var("BINGO_SEED").unwrap_or_else(|_| {
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about"
            .to_string()
    });
    let seed = Seed::from_mnemonic(&phrase)?;

    println!("Deriving player wallets...");
    for player_id in [0u64, 1, 42, (1 << 32) | 7] {
        let wallet = PlayerWallet::derive(&seed, player_id)?;
        println!("Player {:>12}: {}", player_id, wallet.address);
    }

    // Build a ticket and show its wire form
    let mut ticket = Ticket::empty();
    for (row, numbers) in [[4, 18, 27, 51, 66], [10, 32, 45, 70, 89], [13, 29, 56, 63, 90]]
        .iter()
        .enumerate()
    {
        for &number in numbers {
            ticket.place(row, number)?;
        }
    }
    println!("\nTicket bytes: {}", hex::encode(encode_ticket(&ticket)));
    println!("{}", format_ticket(&ticket));

    let extracted = decode_number_set(&hex::decode("0400000000000000000000010000")?);
    println!("\nExtracted: {}", extracted);
    println!("{}", format_strikethrough(&ticket, &extracted));

    Ok(())
}
