use super::Context;
use bingo_core::ticket::format_ticket;
use bingo_core::{BingoConfig, ElasticIndexer, GameStatus, ProxyClient};
use bingo_game::{GameRoundMonitor, LogNotifier};
use comfy_table::{presets::UTF8_FULL, Table};
use std::sync::Arc;
use tokio::sync::watch;

async fn connect(config: &BingoConfig) -> bingo_game::Result<GameRoundMonitor> {
    let ledger = Arc::new(ProxyClient::new(&config.network.proxy)?);
    let indexer = Arc::new(ElasticIndexer::new(&config.network.indexer)?);
    let notifier = Arc::new(LogNotifier::new());
    GameRoundMonitor::from_config(config, ledger, indexer, notifier).await
}

pub async fn run(ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.config().await?;
    let monitor = Arc::new(connect(&config).await?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl-C");
                shutdown_tx.send_replace(true);
            }
            Err(e) => tracing::warn!("Cannot listen for Ctrl-C: {}", e),
        }
    });

    println!("Bingo bot running for group {}. Press Ctrl-C to stop.", config.bot.group);
    monitor.run(shutdown_rx).await?;
    println!("Stopped.");
    Ok(())
}

pub async fn show_round(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let config = ctx.config().await?;
    let monitor = connect(&config).await?;
    let round = monitor.refresh_round().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&round)?);
        return Ok(());
    }
    let denomination = monitor.round_denomination(&round).await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Round".to_string(), format!("#{}", round.round)]);
    table.add_row(vec!["Status".to_string(), round.status.to_string()]);
    table.add_row(vec![
        "Ticket price".to_string(),
        format!(
            "{} {}",
            denomination.format(round.ticket_price),
            round.ticker_label()
        ),
    ]);
    table.add_row(vec![
        "Tickets bought".to_string(),
        round.round_tickets.to_string(),
    ]);
    table.add_row(vec![
        "Numbers to extract".to_string(),
        round.numbers_to_extract.to_string(),
    ]);
    table.add_row(vec![
        "Prize multipliers".to_string(),
        format!(
            "Bingo x{}, Two lines x{}, One line x{}",
            round.multipliers.bingo, round.multipliers.two_lines, round.multipliers.one_line
        ),
    ]);
    table.add_row(vec![
        "Round duration".to_string(),
        format!("{} seconds", round.round_duration_secs),
    ]);
    if round.status == GameStatus::Running {
        table.add_row(vec!["Deadline".to_string(), round.deadline.to_rfc2822()]);
    }
    table.add_row(vec![
        "Last extracted".to_string(),
        round.last_extracted.to_string(),
    ]);

    println!("{}", table);
    println!();
    println!("{}", monitor.statistics_text().await?);
    Ok(())
}

pub async fn buy(ctx: &Context, player: u64, count: u32) -> anyhow::Result<()> {
    let config = ctx.config().await?;
    let monitor = Arc::new(connect(&config).await?);
    monitor.refresh_round().await?;

    let wallet = monitor.register_player(player)?;
    println!("Buying {} ticket(s) for player {} ({})", count, player, wallet.address);

    let purchases = monitor.buy_tickets(player, count).await?;
    for purchase in purchases {
        println!("Submitted {}", purchase.hash);
        match purchase.handle.await? {
            Ok(Some(ticket)) => println!("{}", format_ticket(&ticket)),
            Ok(None) => println!("Transaction {} failed", purchase.hash),
            Err(e) => println!("Transaction {}: {}", purchase.hash, e),
        }
    }
    Ok(())
}
