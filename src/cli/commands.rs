//! # CLI Commands
//!
//! Implementation of all CLI commands.

use std::fs::File;
use std::io::{self, Read, Write};

use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

use super::app::CryptoArgs;
use super::output::{format_size, print_success, print_warning};
use super::stream::Session;
use crate::core::config::{example_config, CipherSuite, Config};
use crate::core::error::{ConfigError, Result, TriadError};

/// `RUST_LOG` wins over `level`, which comes from `[logging]` in the config.
fn setup_logging(verbose: bool, quiet: bool, level: &str) {
    if verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .format_timestamp_millis()
            .init();
    } else if !quiet {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
            .format_target(false)
            .format_timestamp(None)
            .init();
    }
}

fn load_config(args: &CryptoArgs) -> Result<Config> {
    Ok(match args.config {
        Some(ref path) => Config::load(path)?,
        None => Config::default(),
    })
}

/// Suite and key from the command line, falling back to the config file.
fn resolve_key(mut config: Config, args: &CryptoArgs) -> Result<(CipherSuite, Zeroizing<Vec<u8>>)> {
    if let Some(suite) = args.suite {
        config.crypto.cipher = suite;
    }
    if let Some(ref hex) = args.key {
        config.crypto.key = Some(hex.clone());
        config.crypto.key_file = None;
    }
    let key = config.crypto.get_key()?;
    Ok((config.crypto.cipher, key))
}

fn decode_arg(name: &str, hex: &str) -> Result<Vec<u8>> {
    hex::decode(hex.trim()).map_err(|e| TriadError::Encoding(format!("{}: {}", name, e)))
}

fn open_input(path: &str) -> Result<Box<dyn Read>> {
    if path == "-" {
        Ok(Box::new(io::stdin().lock()))
    } else {
        Ok(Box::new(File::open(path)?))
    }
}

fn write_output(path: &str, data: &[u8]) -> Result<()> {
    if path == "-" {
        let mut stdout = io::stdout().lock();
        stdout.write_all(data)?;
        stdout.flush()?;
    } else {
        File::create(path)?.write_all(data)?;
    }
    Ok(())
}

fn prepare(args: &CryptoArgs) -> Result<(CipherSuite, Session)> {
    let config = load_config(args)?;
    setup_logging(args.verbose, args.quiet, &config.logging.level);
    let (suite, key) = resolve_key(config, args)?;
    let nonce = decode_arg("nonce", &args.nonce)?;
    let aad = decode_arg("aad", &args.aad)?;

    if nonce.is_empty() && !suite.tag_first() {
        return Err(TriadError::Config(ConfigError::ParseError(format!(
            "{} requires a nonce (-n)",
            suite
        ))));
    }
    if nonce.is_empty() {
        log::debug!("{}: deterministic mode", suite);
    }

    let mut session = Session::new(suite, &key)?;
    session.setup(&nonce, &aad)?;
    log::debug!("{}: {} bytes of associated data", suite, aad.len());
    Ok((suite, session))
}

/// Encrypt a file
pub fn cmd_encrypt(args: &CryptoArgs) -> Result<()> {
    let (suite, mut session) = prepare(args)?;
    let sealed = session.seal_stream(open_input(&args.input)?)?;
    write_output(&args.output, &sealed)?;

    log::info!("sealed {} bytes with {}", sealed.len(), suite);
    if !args.quiet && args.output != "-" {
        print_success(&format!(
            "Encrypted with {} ({}) -> {}",
            suite,
            format_size(sealed.len() as u64),
            args.output
        ));
    }
    Ok(())
}

/// Decrypt a file. Output is written only after the tag verifies.
pub fn cmd_decrypt(args: &CryptoArgs) -> Result<()> {
    let (suite, mut session) = prepare(args)?;
    let plaintext = match session.open_stream(open_input(&args.input)?) {
        Ok(plaintext) => plaintext,
        Err(e) => {
            log::warn!("{}: rejected {}", suite, args.input);
            return Err(e);
        }
    };
    write_output(&args.output, &plaintext)?;

    if !args.quiet && args.output != "-" {
        print_success(&format!(
            "Verified and decrypted {} -> {}",
            format_size(plaintext.len() as u64),
            args.output
        ));
    }
    Ok(())
}

/// Fresh key material for `suite` from the OS generator
fn generate_key(suite: CipherSuite) -> Result<Zeroizing<Vec<u8>>> {
    let mut key = Zeroizing::new(vec![0u8; suite.key_size()]);
    OsRng
        .try_fill_bytes(&mut key)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    Ok(key)
}

/// Generate a random key for `suite`
pub fn cmd_genkey(suite: CipherSuite) -> Result<()> {
    let key = generate_key(suite)?;
    println!("{}", Zeroizing::new(hex::encode(&*key)).as_str());
    if console::user_attended_stderr() {
        print_warning(&format!("{} key: keep it secret", suite));
    }
    Ok(())
}

/// Create config template
pub fn cmd_init() -> Result<()> {
    print!("{}", example_config());
    Ok(())
}
