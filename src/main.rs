// Entry point for both halves of the ledger: the server and the one-shot
// client commands that talk to it
use clap::Parser;
use log::{error, info, LevelFilter};
use sealchain::cli::{Command as CliCommand, Opt};
use sealchain::{
    Command, CommandDispatcher, KeyStore, Ledger, LedgerClient, Server, GLOBAL_CONFIG,
};
use std::path::Path;
use std::process;

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();
    if let Some(addr) = opt.addr {
        GLOBAL_CONFIG.set_ledger_addr(addr);
    }

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: CliCommand) -> Result<(), Box<dyn std::error::Error>> {
    let ledger_command = match command {
        CliCommand::StartServer { genesis_difficulty } => {
            if let Some(difficulty) = genesis_difficulty {
                GLOBAL_CONFIG.set_genesis_difficulty(difficulty);
            }
            return start_server();
        }
        CliCommand::Keygen => {
            let keys = load_keys()?;
            println!("Identity: {}", keys.identity());
            println!("e: {}", keys.get_e());
            println!("n: {}", keys.get_n());
            return Ok(());
        }
        CliCommand::Status => Command::Status,
        CliCommand::Append {
            difficulty,
            payload,
        } => Command::Append {
            difficulty,
            payload,
        },
        CliCommand::Validate => Command::Validate,
        CliCommand::View => Command::View,
        CliCommand::Corrupt {
            block_index,
            new_payload,
        } => Command::Corrupt {
            block_index,
            new_payload,
        },
        CliCommand::Repair => Command::Repair,
    };

    let keys = load_keys()?;
    let mut client = LedgerClient::connect(&GLOBAL_CONFIG.get_ledger_addr(), keys)?;
    let result = client.send(&ledger_command)?;
    println!("{result}");
    client.close()?;
    Ok(())
}

fn start_server() -> Result<(), Box<dyn std::error::Error>> {
    let difficulty = GLOBAL_CONFIG.get_genesis_difficulty()?;
    let dispatcher = CommandDispatcher::new(
        GLOBAL_CONFIG.get_mining_timeout()?,
        GLOBAL_CONFIG.get_hash_rate_window()?,
    );

    // The genesis block is mined before the listener accepts anyone
    let ledger = Ledger::new(difficulty)?;
    info!("Ledger ready with chain hash {}", ledger.get_chain_hash());

    let mut server = Server::new(ledger, dispatcher);
    server.run(&GLOBAL_CONFIG.get_ledger_addr())?;
    Ok(())
}

fn load_keys() -> Result<sealchain::KeyPair, Box<dyn std::error::Error>> {
    let keys = KeyStore::load_or_generate(
        Path::new(sealchain::wallet::KEY_FILE),
        GLOBAL_CONFIG.get_key_bits()?,
        GLOBAL_CONFIG.get_key_certainty()?,
    )?;
    Ok(keys)
}
