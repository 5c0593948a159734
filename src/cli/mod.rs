//! # CLI Module
//!
//! Command-line interface for the `triad` binary.

mod app;
mod commands;
pub mod output;
mod stream;

pub use app::{exit_with_error, run, CryptoArgs};
pub use commands::{cmd_decrypt, cmd_encrypt, cmd_genkey, cmd_init};
pub use stream::Session;

/// Print banner shown when run without arguments
pub fn print_banner() {
    eprintln!(
        r#"
  ████████╗██████╗ ██╗ █████╗ ██████╗
  ╚══██╔══╝██╔══██╗██║██╔══██╗██╔══██╗
     ██║   ██████╔╝██║███████║██║  ██║
     ██║   ██╔══██╗██║██╔══██║██║  ██║
     ██║   ██║  ██║██║██║  ██║██████╔╝
     ╚═╝   ╚═╝  ╚═╝╚═╝╚═╝  ╚═╝╚═════╝  v{}

AES-GCM / AES-SIV / ChaCha20-Poly1305 file encryption
"#,
        env!("CARGO_PKG_VERSION")
    );
}
