//! Sia Ledger CLI Example
//!
//! This example demonstrates how to drive the Sia app on a Ledger device
//! over USB HID.
//!
//! # Prerequisites
//!
//! - A Ledger device (Nano S, Nano X, or Stax) with the Sia app installed
//!   and open
//! - On Linux: udev rules granting access to the Ledger USB device
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `list` | List attached Ledger devices |
//! | `version` | Show the Sia app version |
//! | `addr <index>` | Derive and confirm the address for a key index |
//! | `pubkey <index>` | Derive and confirm the public key for a key index |
//! | `hash <hex> <index>` | Sign a 32-byte hex hash with a key index |
//! | `txn <file> <sig index> <key index>` | Sign a Sia-encoded transaction |
//!
//! The `txn` command also accepts `--sighash` (display and return the
//! hash instead of signing; no key index needed) and `--change <index>`
//! (key index of the change address, hidden during on-screen review).
//!
//! Pass `--apdu` before the command to print every APDU exchange.
//!
//! # Quick Start
//!
//! ```bash
//! cargo run --example sialedger -- version
//! cargo run --example sialedger -- addr 0
//! cargo run --example sialedger -- hash $(printf 'aa%.0s' {1..32}) 5
//! cargo run --example sialedger -- txn txn.bin 0 0 --change 7
//! ```

use std::env;
use std::fs;

use sia_ledger_signer_core::device::{HidTransport, NO_CHANGE_INDEX, SiaSession};
use sia_ledger_signer_core::{Error, Hash};

fn main() {
    let mut args: Vec<String> = env::args().skip(1).collect();

    if take_flag(&mut args, "--apdu") {
        tracing_subscriber::fmt()
            .with_env_filter("sia_ledger_signer_core=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    if args.is_empty() {
        print_help();
        return;
    }

    match args[0].as_str() {
        "list" => cmd_list(),
        "version" => cmd_version(),
        "addr" => cmd_addr(&args[1..]),
        "pubkey" => cmd_pubkey(&args[1..]),
        "hash" => cmd_hash(&args[1..]),
        "txn" => cmd_txn(args[1..].to_vec()),
        "--help" | "-h" | "help" => print_help(),
        other => {
            eprintln!("Unknown command: {other}");
            print_help();
        }
    }
}

fn print_help() {
    println!(
        r"Sia Ledger CLI

USAGE:
    sialedger [--apdu] <COMMAND>

COMMANDS:
    list                               List attached Ledger devices
    version                            Show the Sia app version
    addr <index>                       Derive the address for a key index
    pubkey <index>                     Derive the public key for a key index
    hash <hex> <index>                 Sign a 32-byte hex hash
    txn <file> <sig index> <key index> Sign a Sia-encoded transaction
        [--sighash] [--change <index>]
    help                               Show this help message

EXAMPLES:
    cargo run --example sialedger -- addr 0
    cargo run --example sialedger -- txn txn.bin 0 0 --change 7
"
    );
}

/// Removes `flag` from `args` if present, reporting whether it was.
fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    match args.iter().position(|a| a == flag) {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    }
}

/// Removes `--name <value>` from `args` and returns the value.
fn take_value(args: &mut Vec<String>, name: &str) -> Option<String> {
    let i = args.iter().position(|a| a == name)?;
    if i + 1 >= args.len() {
        return None;
    }
    args.remove(i);
    Some(args.remove(i))
}

fn open_session() -> Option<SiaSession> {
    match HidTransport::connect() {
        Ok(transport) => Some(SiaSession::new(Box::new(transport))),
        Err(e) => {
            report(&e);
            None
        }
    }
}

fn parse_index(s: &str) -> Option<u32> {
    match s.parse() {
        Ok(index) => Some(index),
        Err(_) => {
            eprintln!("Couldn't parse index: {s:?}");
            None
        }
    }
}

fn report(err: &Error) {
    match err {
        Error::UserRefused => eprintln!("User refused the request on the device."),
        Error::DeviceNotFound => {
            eprintln!("No Ledger device found. Is it plugged in and unlocked?");
        }
        Error::InstructionNotSupported | Error::ClassNotSupported => {
            eprintln!("The device rejected the command. Is the Sia app open?");
        }
        other => eprintln!("Error: {other}"),
    }
}

fn cmd_list() {
    match HidTransport::list_devices() {
        Ok(devices) if devices.is_empty() => {
            println!("No Ledger devices found.");
            println!("\nMake sure your Ledger is plugged in and unlocked.");
        }
        Ok(devices) => {
            for device in devices {
                println!("{device}");
            }
        }
        Err(e) => report(&e),
    }
}

fn cmd_version() {
    let Some(mut session) = open_session() else {
        return;
    };
    match session.version() {
        Ok(version) => println!("Sia app version: {version}"),
        Err(e) => report(&e),
    }
}

fn cmd_addr(args: &[String]) {
    let [index] = args else {
        print_help();
        return;
    };
    let Some(index) = parse_index(index) else {
        return;
    };
    let Some(mut session) = open_session() else {
        return;
    };

    println!("Confirm the address on the device...");
    match session.address(index) {
        Ok(info) => println!("{}", info.address),
        Err(e) => report(&e),
    }
}

fn cmd_pubkey(args: &[String]) {
    let [index] = args else {
        print_help();
        return;
    };
    let Some(index) = parse_index(index) else {
        return;
    };
    let Some(mut session) = open_session() else {
        return;
    };

    println!("Confirm the public key on the device...");
    match session.public_key(index) {
        Ok(info) => println!("{}", info.public_key),
        Err(e) => report(&e),
    }
}

fn cmd_hash(args: &[String]) {
    let [hash_hex, index] = args else {
        print_help();
        return;
    };
    let hash: Hash = match hash_hex.parse() {
        Ok(hash) => hash,
        Err(e) => {
            eprintln!("Couldn't parse hash: {e}");
            return;
        }
    };
    let Some(index) = parse_index(index) else {
        return;
    };
    let Some(mut session) = open_session() else {
        return;
    };

    println!("Confirm the hash on the device...");
    match session.sign_hash(&hash, index) {
        Ok(sig) => println!("{sig}"),
        Err(e) => report(&e),
    }
}

fn cmd_txn(mut args: Vec<String>) {
    let sighash_only = take_flag(&mut args, "--sighash");
    let change_index = match take_value(&mut args, "--change") {
        Some(v) => match parse_index(&v) {
            Some(index) => index,
            None => return,
        },
        None => NO_CHANGE_INDEX,
    };

    let (file, sig_index, key_index) = match (sighash_only, args.as_slice()) {
        (true, [file, sig_index]) => (file, sig_index, None),
        (false, [file, sig_index, key_index]) => (file, sig_index, Some(key_index)),
        _ => {
            print_help();
            return;
        }
    };

    let txn = match fs::read(file) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Couldn't read transaction: {e}");
            return;
        }
    };
    let Ok(sig_index) = sig_index.parse::<u16>() else {
        eprintln!("Couldn't parse signature index: {sig_index:?}");
        return;
    };

    let Some(mut session) = open_session() else {
        return;
    };

    println!("Review the transaction on the device...");
    if let Some(key_index) = key_index {
        let Some(key_index) = parse_index(key_index) else {
            return;
        };
        match session.sign_txn(&txn, sig_index, key_index, change_index) {
            Ok(sig) => println!("{sig}"),
            Err(e) => report(&e),
        }
    } else {
        match session.txn_hash(&txn, sig_index, change_index) {
            Ok(hash) => println!("{hash}"),
            Err(e) => report(&e),
        }
    }
}
