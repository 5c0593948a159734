//! # CLI Application
//!
//! CLI definition and command dispatch using clap.

use clap::{Args, Parser, Subcommand};

use super::commands::{cmd_decrypt, cmd_encrypt, cmd_genkey, cmd_init};
use super::output;
use super::print_banner;
use crate::core::config::CipherSuite;
use crate::core::error::Result;

/// triad - streaming AEAD file encryption (AES-GCM, AES-SIV, ChaCha20-Poly1305)
#[derive(Parser)]
#[command(
    name = "triad",
    version = env!("CARGO_PKG_VERSION"),
    about = "Streaming AEAD file encryption: AES-GCM, AES-SIV, ChaCha20-Poly1305",
    long_about = None,
    after_help = "Examples:\n  \
        triad genkey -s chacha20-poly1305 > key.hex\n  \
        triad encrypt -s chacha20-poly1305 -k $(cat key.hex) -n 000102030405060708090a0b -i notes.txt -o notes.enc\n  \
        triad decrypt -c triad.toml -n 000102030405060708090a0b -i notes.enc -o notes.txt\n  \
        triad init > triad.toml",
    styles = get_styles(),
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt and authenticate a file
    #[command(visible_alias = "seal")]
    Encrypt(CryptoArgs),

    /// Verify and decrypt a file
    #[command(visible_alias = "open")]
    Decrypt(CryptoArgs),

    /// Generate a random key for a cipher suite
    #[command(visible_alias = "key")]
    Genkey {
        /// Cipher suite the key is for
        #[arg(short, long, default_value = "aes-256-gcm")]
        suite: CipherSuite,
    },

    /// Print a config template
    Init,
}

/// Arguments shared by encrypt and decrypt
#[derive(Args, Debug)]
pub struct CryptoArgs {
    /// Config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Cipher suite (overrides the config file)
    #[arg(short, long)]
    pub suite: Option<CipherSuite>,

    /// Key in hex (overrides the config file)
    #[arg(short, long)]
    pub key: Option<String>,

    /// Nonce in hex (optional for AES-SIV)
    #[arg(short, long, default_value = "")]
    pub nonce: String,

    /// Associated data in hex
    #[arg(short, long, default_value = "")]
    pub aad: String,

    /// Input file ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    pub input: String,

    /// Output file ("-" for stdout)
    #[arg(short, long, default_value = "-")]
    pub output: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,
}

fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            clap::builder::styling::AnsiColor::BrightCyan
                .on_default()
                .bold(),
        )
        .header(
            clap::builder::styling::AnsiColor::BrightCyan
                .on_default()
                .bold(),
        )
        .literal(clap::builder::styling::AnsiColor::BrightGreen.on_default())
        .placeholder(clap::builder::styling::AnsiColor::Cyan.on_default())
        .valid(clap::builder::styling::AnsiColor::BrightGreen.on_default())
        .invalid(clap::builder::styling::AnsiColor::BrightRed.on_default())
}

/// Run the CLI application
pub fn run() -> Result<()> {
    // Show banner if no args
    if std::env::args().len() < 2 {
        print_banner();
        let _ = Cli::try_parse();
        std::process::exit(1);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Encrypt(args) => cmd_encrypt(&args),
        Commands::Decrypt(args) => cmd_decrypt(&args),
        Commands::Genkey { suite } => cmd_genkey(suite),
        Commands::Init => cmd_init(),
    }
}

/// Print error and exit
pub fn exit_with_error(e: impl std::fmt::Display) -> ! {
    output::print_error(e);
    std::process::exit(1);
}
