use super::Context;
use anyhow::Context as _;
use bingo_core::wallet::{to_pem, DerivationPath, OPERATOR_PLAYER_ID};
use bingo_core::PlayerWallet;
use comfy_table::{presets::UTF8_FULL, Table};
use std::path::Path;

pub async fn show_addresses(ctx: &Context, players: &[u64]) -> anyhow::Result<()> {
    let seed = ctx.seed().await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Player", "Path", "Address"]);

    for &player in players {
        let wallet = PlayerWallet::derive(&seed, player)?;
        let label = if player == OPERATOR_PLAYER_ID {
            format!("{} (operator)", player)
        } else {
            player.to_string()
        };
        table.add_row(vec![
            label,
            DerivationPath::for_player(player).to_string(),
            wallet.address.to_string(),
        ]);
    }

    println!("{}", table);
    Ok(())
}

pub async fn export_pem(ctx: &Context, player: u64, output: Option<&Path>) -> anyhow::Result<()> {
    let seed = ctx.seed().await?;
    let wallet = PlayerWallet::derive(&seed, player)?;
    let pem = to_pem(&wallet.signing_key(&seed)?)?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &pem)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wallet of player {} written to {}", player, path.display());
            println!("Address: {}", wallet.address);
        }
        None => print!("{}", pem),
    }

    eprintln!("WARNING: the PEM file contains the private key. Keep it safe!");
    Ok(())
}
