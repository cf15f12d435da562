use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sealchain")]
pub struct Opt {
    /// Ledger server address (overrides LEDGER_ADDRESS)
    #[arg(long, global = true)]
    pub addr: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "startserver", about = "Mine the genesis block and serve the ledger")]
    StartServer {
        #[arg(long, help = "Difficulty of the genesis block")]
        genesis_difficulty: Option<u32>,
    },
    #[command(name = "keygen", about = "Create the client key pair if it does not exist")]
    Keygen,
    #[command(name = "status", about = "View basic ledger status")]
    Status,
    #[command(name = "append", about = "Add a transaction to the ledger")]
    Append {
        #[arg(help = "Number of leading hex zeros the block hash needs")]
        difficulty: u32,
        #[arg(help = "Transaction text")]
        payload: String,
    },
    #[command(name = "validate", about = "Verify the ledger")]
    Validate,
    #[command(name = "view", about = "Print the whole ledger as JSON")]
    View,
    #[command(name = "corrupt", about = "Overwrite a block's payload without re-mining")]
    Corrupt {
        #[arg(help = "Index of the block to corrupt")]
        block_index: u64,
        #[arg(help = "New payload for the block")]
        new_payload: String,
    },
    #[command(name = "repair", about = "Hide the corruption by repairing the ledger")]
    Repair,
}
