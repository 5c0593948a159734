//! # triad - Streaming AEAD File Encryption

fn main() {
    if let Err(e) = triad::cli::run() {
        triad::cli::exit_with_error(e);
    }
}
