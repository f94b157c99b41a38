//! CLI argument parsing

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::protocol::CONTROL_MIN_SIZE;

/// Parse the feature request size as decimal or 0x-prefixed hex. Zero and
/// anything too small to hold the control-frame header are rejected here,
/// before any device is opened.
fn parse_request_size(s: &str) -> Result<usize, String> {
    let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))?
    } else {
        s.parse::<usize>()
            .map_err(|e| format!("Invalid number: {}", e))?
    };
    if value < CONTROL_MIN_SIZE {
        return Err(format!(
            "Request size must be at least {} bytes",
            CONTROL_MIN_SIZE
        ));
    }
    Ok(value)
}

#[derive(Parser, Debug)]
#[command(name = "pbtpflash")]
#[command(author, version, about = "Pinebook touchpad firmware flasher", long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["write", "read"])))]
pub struct Cli {
    /// Write firmware from file to the device
    #[arg(short, long, value_name = "FILE")]
    pub write: Option<PathBuf>,

    /// Read firmware from the device to file
    #[arg(short, long, value_name = "FILE")]
    pub read: Option<PathBuf>,

    /// Feature request size in bytes (decimal or 0x-hex); depends on the
    /// hardware revision, see documentation
    #[arg(short = 's', long = "request_size", value_parser = parse_request_size)]
    pub request_size: usize,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_mode_parses() {
        let cli = Cli::try_parse_from(["pbtpflash", "-r", "out.bin", "-s", "6"]).unwrap();
        assert_eq!(cli.read.as_deref().unwrap().to_str(), Some("out.bin"));
        assert!(cli.write.is_none());
        assert_eq!(cli.request_size, 6);
    }

    #[test]
    fn hex_request_size_parses() {
        let cli =
            Cli::try_parse_from(["pbtpflash", "-w", "fw.bin", "--request_size", "0x8"]).unwrap();
        assert_eq!(cli.request_size, 8);
    }

    #[test]
    fn request_size_is_mandatory() {
        assert!(Cli::try_parse_from(["pbtpflash", "-r", "out.bin"]).is_err());
    }

    #[test]
    fn zero_and_negative_request_sizes_fail() {
        assert!(Cli::try_parse_from(["pbtpflash", "-r", "o", "-s", "0"]).is_err());
        assert!(Cli::try_parse_from(["pbtpflash", "-r", "o", "-s", "-6"]).is_err());
    }

    #[test]
    fn read_and_write_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["pbtpflash", "-r", "a", "-w", "b", "-s", "6"]).is_err());
    }

    #[test]
    fn one_of_read_or_write_is_required() {
        assert!(Cli::try_parse_from(["pbtpflash", "-s", "6"]).is_err());
    }

    #[test]
    fn repeated_mode_flag_fails() {
        assert!(Cli::try_parse_from(["pbtpflash", "-w", "a", "-w", "b", "-s", "6"]).is_err());
    }
}
