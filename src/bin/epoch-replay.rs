#![forbid(unsafe_code)]
//! Replays one epoch from a scenario file and shows what was accepted

use clap::Parser;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};
use epochledger::cli::load_scenario_from_config;
use epochledger::ledger::TxHandler;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "epoch-replay", about = "Apply a hand-written epoch to its genesis pool")]
struct Args {
    /// Configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Scenario file (overrides replay.scenario)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Print a JSON summary instead of tables
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let (config, built) = load_scenario_from_config(&args.config, args.scenario.as_deref())?;

    let mut handler = TxHandler::new(&built.pool);
    // Verdicts are per position: a resubmitted transaction shares its hash
    let verdicts: Vec<bool> = built
        .candidates
        .iter()
        .map(|tx| handler.accept_tx(tx))
        .collect();
    let accepted_count = verdicts.iter().filter(|accepted| **accepted).count();

    let label = |position: usize| {
        built
            .label_at(position)
            .map(str::to_string)
            .unwrap_or_else(|| built.candidates[position].hash_str())
    };
    let mut utxos = handler.pool().all_utxos();
    utxos.sort_by_key(|utxo| built.describe(utxo));

    if args.json {
        let pool: Vec<_> = utxos
            .iter()
            .filter_map(|utxo| {
                handler.pool().get_tx_output(utxo).map(|output| {
                    serde_json::json!({
                        "utxo": built.describe(utxo),
                        "value": output.value,
                        "owner": built
                            .owner_name(&output.owner)
                            .map(str::to_string)
                            .unwrap_or_else(|| output.owner.to_hex()),
                    })
                })
            })
            .collect();
        let summary = serde_json::json!({
            "candidates": built.candidates.len(),
            "accepted": (0..verdicts.len())
                .filter(|position| verdicts[*position])
                .map(label)
                .collect::<Vec<_>>(),
            "pool": pool,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "EpochLedger Replay".bright_cyan().bold());
    println!("{}", "------------------".bright_cyan());
    println!();

    let mut epoch_table = Table::new();
    epoch_table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Transaction").add_attribute(Attribute::Bold),
            Cell::new("Inputs").add_attribute(Attribute::Bold),
            Cell::new("Outputs").add_attribute(Attribute::Bold),
            Cell::new("Result").add_attribute(Attribute::Bold),
        ]);
    for (position, tx) in built.candidates.iter().enumerate() {
        let result = if verdicts[position] {
            Cell::new("accepted").fg(TableColor::Green)
        } else {
            Cell::new("rejected").fg(TableColor::Red)
        };
        epoch_table.add_row(vec![
            Cell::new(position),
            Cell::new(label(position)),
            Cell::new(tx.inputs.len()),
            Cell::new(tx.outputs.iter().map(|o| i128::from(o.value)).sum::<i128>()),
            result,
        ]);
    }
    println!("{}", epoch_table);
    println!(
        "{}",
        format!(
            "Accepted {} of {} candidates",
            accepted_count,
            built.candidates.len()
        )
        .bright_green()
    );

    if config.replay.show_pool {
        let mut pool_table = Table::new();
        pool_table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["UTXO", "Owner", "Value"]);
        for utxo in &utxos {
            if let Some(output) = handler.pool().get_tx_output(utxo) {
                pool_table.add_row(vec![
                    Cell::new(built.describe(utxo)),
                    Cell::new(
                        built
                            .owner_name(&output.owner)
                            .map(str::to_string)
                            .unwrap_or_else(|| output.owner.to_hex()),
                    ),
                    Cell::new(output.value),
                ]);
            }
        }
        println!();
        println!("{}", "Resulting pool".bright_cyan().underline());
        println!("{}", pool_table);
        println!(
            "{}",
            format!("Total value: {}", handler.pool().total_value()).yellow()
        );
    }

    Ok(())
}
