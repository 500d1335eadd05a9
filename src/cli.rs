//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a ROM size: non-zero and within the 16-bit address space
fn parse_rom_size(s: &str) -> Result<u32, String> {
    let size = parse_hex_u32(s)?;
    if size == 0 || size > 0x1_0000 {
        return Err(format!("ROM size must be between 1 and 65536, got {}", size));
    }
    Ok(size)
}

#[derive(Parser)]
#[command(name = "eeburn")]
#[command(author, version, about = "Parallel EEPROM programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Serial port device
    #[arg(long, default_value = "/dev/ttyUSB0", global = true)]
    pub port: String,

    /// Port speed in baud
    #[arg(long, default_value_t = 115200, global = true)]
    pub speed: u32,

    /// How long to wait for each reply, in milliseconds
    #[arg(long, default_value_t = 5000, global = true)]
    pub timeout_ms: u32,

    /// Size of the device in bytes (hex with 0x prefix or decimal)
    #[arg(long, default_value = "32768", value_parser = parse_rom_size, global = true)]
    pub rom_size: u32,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a file of S1 records, then verify it
    Write {
        /// File of S1 records
        input: PathBuf,

        /// Erase the chip before writing
        #[arg(long)]
        erase: bool,
    },

    /// Verify the device against a file of S1 records
    Verify {
        /// File of S1 records
        input: PathBuf,
    },

    /// Erase the whole device
    Erase,
}
