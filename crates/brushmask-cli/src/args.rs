//! Command line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect and convert brush mask region payloads.
#[derive(Debug, Parser)]
#[command(name = "brushmask", version, about)]
pub struct Cli {
    /// Brush configuration file (JSON).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a payload to a PNG at natural image size.
    Decode {
        /// Region payload (JSON).
        payload: PathBuf,
        /// PNG file to write.
        output: PathBuf,
        /// Fill color, overriding the configured one.
        #[arg(long)]
        color: Option<String>,
    },
    /// Encode a PNG mask as a region payload on stdout.
    ///
    /// Pixels with alpha > 0 are painted; images without alpha use any
    /// non-zero channel.
    Encode {
        /// PNG mask.
        input: PathBuf,
        /// Image rotation in degrees to record in the payload.
        #[arg(long, default_value_t = 0.0)]
        rotation: f64,
        /// Pretty-print the payload.
        #[arg(long)]
        pretty: bool,
    },
    /// Print size, coverage and bounding box of a payload.
    Info {
        /// Region payload (JSON).
        payload: PathBuf,
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decode() {
        let cli = Cli::parse_from([
            "brushmask",
            "decode",
            "mask.json",
            "out.png",
            "--color",
            "#00ff00",
            "--config",
            "brush.json",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("brush.json")));
        match cli.command {
            Command::Decode {
                payload,
                output,
                color,
            } => {
                assert_eq!(payload, PathBuf::from("mask.json"));
                assert_eq!(output, PathBuf::from("out.png"));
                assert_eq!(color.as_deref(), Some("#00ff00"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_encode_defaults() {
        let cli = Cli::parse_from(["brushmask", "encode", "mask.png"]);
        match cli.command {
            Command::Encode {
                rotation, pretty, ..
            } => {
                assert_eq!(rotation, 0.0);
                assert!(!pretty);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["brushmask"]).is_err());
    }
}
