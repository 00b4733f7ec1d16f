#![forbid(unsafe_code)]
//! Terminal front end for hashledger: a scripted demo and an interactive shell.

use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use hashledger::blockchain::{Block, Blockchain};
use hashledger::config::{load_config, DEFAULT_CONFIG_PATH};
use hashledger::error::ChainError;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::Level;

#[derive(Parser)]
#[command(name = "hashledger", version, about = "Hash-linked ledger with proof-of-work and tamper detection")]
struct Cli {
    /// Path to the TOML configuration file (optional)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the configured difficulty (leading zero hex digits)
    #[arg(long, global = true)]
    difficulty: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mine a few blocks, validate, optionally tamper and validate again
    Demo {
        /// Payload for each block to mine (repeatable)
        #[arg(long = "data", default_values_t = ["A".to_string(), "B".to_string()])]
        data: Vec<String>,

        /// Tamper with a block after mining, as INDEX=TEXT
        #[arg(long, value_parser = parse_tamper)]
        tamper: Option<(u64, String)>,
    },
    /// Interactive session over a single in-memory chain
    Shell,
}

fn parse_tamper(raw: &str) -> Result<(u64, String), String> {
    let (index, data) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=TEXT, got '{}'", raw))?;
    let index = index
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid block index '{}': {}", index, e))?;
    Ok((index, data.to_string()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .init();

    let mut config = load_config(&cli.config)?;
    if let Some(difficulty) = cli.difficulty {
        config.chain.difficulty = difficulty;
    }
    let mut chain = Blockchain::from_config(&config)?;

    let genesis = chain.create_genesis_block()?;
    println!("{} {}", "⛓️  Genesis block created. Hash:".bright_green(), genesis.hash);

    match cli.command {
        Command::Demo { data, tamper } => run_demo(&mut chain, &data, tamper),
        Command::Shell => run_shell(&mut chain),
    }
}

fn run_demo(
    chain: &mut Blockchain,
    payloads: &[String],
    tamper: Option<(u64, String)>,
) -> Result<(), Box<dyn std::error::Error>> {
    for data in payloads {
        mine_and_report(chain, data)?;
    }

    print_ledger(chain);
    print_validation(chain);

    if let Some((index, data)) = tamper {
        tamper_and_report(chain, index, &data)?;
        print_ledger(chain);
        print_validation(chain);
    }
    Ok(())
}

fn run_shell(chain: &mut Blockchain) -> Result<(), Box<dyn std::error::Error>> {
    print_help();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{} ", ">".bright_cyan().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let (command, rest) = match line.trim().split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line.trim(), ""),
        };

        let outcome = match command {
            "" => Ok(()),
            "add" => mine_and_report(chain, rest).map(|_| ()),
            "validate" => {
                print_validation(chain);
                Ok(())
            }
            "audit" => {
                print_audit(chain);
                Ok(())
            }
            "tamper" => match rest.split_once(char::is_whitespace) {
                Some((index, data)) => match index.parse::<u64>() {
                    Ok(index) => tamper_and_report(chain, index, data.trim()),
                    Err(_) => {
                        eprintln!("{}", format!("Invalid block index: {}", index).yellow());
                        Ok(())
                    }
                },
                None => {
                    eprintln!("{}", "Usage: tamper <index> <data>".yellow());
                    Ok(())
                }
            },
            "show" => {
                print_ledger(chain);
                Ok(())
            }
            "export" => chain.to_json().map(|json| println!("{}", json)),
            "help" => {
                print_help();
                Ok(())
            }
            "quit" | "exit" => break,
            other => {
                eprintln!("{}", format!("Unknown command '{}', try 'help'", other).yellow());
                Ok(())
            }
        };

        // Bad input and aborted mining are reported, the session carries on.
        if let Err(e) = outcome {
            report_error(&e);
        }
    }
    Ok(())
}

fn mine_and_report(chain: &mut Blockchain, data: &str) -> Result<Block, ChainError> {
    let candidate = chain.build_candidate_block(data)?;

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(format!(
        "⛏️  Mining block #{} (difficulty {})...",
        candidate.index,
        chain.difficulty()
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let started = Instant::now();
    let result = chain
        .mine_block(candidate)
        .and_then(|mined| chain.add_block(mined).cloned());
    spinner.finish_and_clear();

    let block = result?;
    println!(
        "{} {}",
        format!("✅ Block #{} mined in {:.3}s!", block.index, started.elapsed().as_secs_f64()).bright_green(),
        format!("nonce={} hash={}", block.nonce, block.hash).dimmed()
    );
    Ok(block)
}

fn tamper_and_report(chain: &mut Blockchain, index: u64, data: &str) -> Result<(), ChainError> {
    let old = chain.tamper_block(index, data)?;
    println!(
        "{}",
        format!("⚠️  Block #{} data changed from '{}' to '{}'!", index, old, data).bright_red()
    );
    Ok(())
}

fn report_error(err: &ChainError) {
    match err {
        ChainError::EmptyData => eprintln!("{}", "Data is required.".yellow()),
        other => eprintln!("{} {}", "error:".red().bold(), other),
    }
}

fn print_validation(chain: &Blockchain) {
    if chain.is_chain_valid() {
        println!("{}", "✅ Blockchain is valid!".bright_green().bold());
    } else {
        println!("{}", "❌ Blockchain is NOT valid!".bright_red().bold());
        print_audit(chain);
    }
}

fn print_audit(chain: &Blockchain) {
    let faults = chain.audit();
    if faults.is_empty() {
        println!("{}", "No faults found.".green());
    }
    for fault in faults {
        let line = format!("  - {}", fault);
        if fault.breaks_integrity() {
            println!("{}", line.red());
        } else {
            println!("{}", line.yellow());
        }
    }
}

fn print_ledger(chain: &Blockchain) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Timestamp", "Data", "Nonce", "Previous Hash", "Hash"]);

    for block in chain.blocks() {
        table.add_row(vec![
            block.index.to_string(),
            block.timestamp.clone(),
            block.data.clone(),
            block.nonce.to_string(),
            short_hash(&block.previous_hash),
            short_hash(&block.hash),
        ]);
    }

    println!("\n{}", "📜 Ledger".bright_cyan().bold());
    println!("{}\n", table);
}

fn short_hash(hash: &str) -> String {
    match hash.get(..16) {
        Some(prefix) if hash.len() > 16 => format!("{}…", prefix),
        _ => hash.to_string(),
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_green().underline());
    println!("  {} <data>           mine and append a block", "add".bright_white());
    println!("  {}                 check chain integrity", "validate".bright_white());
    println!("  {}                    list every fault found", "audit".bright_white());
    println!("  {} <index> <data>  overwrite a block's data", "tamper".bright_white());
    println!("  {}                     print the ledger", "show".bright_white());
    println!("  {}                   dump blocks as JSON", "export".bright_white());
    println!("  {}                     leave the shell", "quit".bright_white());
}
