//! `fsync`: send and decode FleetSync frames from the command line.
//!
//! Frames are written to the configured port (a serial device node or any
//! file), or to stdout when none is set. Decoded messages are printed to
//! stdout as JSON lines; logs go to stderr.

mod config;
mod error;

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use fleetsync_protocol::{
    Address, Encoder, InboundMessage, IoTransport, LogObserver, MessageReader,
    Parser as FrameParser,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::{CliError, CliResult};

/// Bytes read from the input per call while listening.
const READ_CHUNK_SIZE: usize = 256;

#[derive(Parser, Debug)]
#[command(name = "fsync", version, about = "Send and decode FleetSync radio frames")]
struct Cli {
    /// YAML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serial device or file to write frames to (default: stdout).
    #[arg(short, long, global = true)]
    port: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `fleetsync_protocol=trace`.
    #[arg(long, global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a text message.
    Text {
        /// Fleet number (0-999).
        #[arg(long, required_unless_present = "broadcast")]
        fleet: Option<u16>,

        /// Device number within the fleet (0-9999).
        #[arg(long, required_unless_present = "broadcast")]
        device: Option<u16>,

        /// Send to every radio instead of one unit.
        #[arg(long)]
        broadcast: bool,

        /// Append the sequence number before ETX.
        #[arg(long)]
        append_sequence: bool,

        /// Message text.
        body: String,
    },

    /// Ask a radio for its GNSS position.
    Poll {
        /// Fleet number (0-999).
        #[arg(long)]
        fleet: u16,

        /// Device number within the fleet (0-9999).
        #[arg(long)]
        device: u16,
    },

    /// Decode hex-encoded frames, e.g. `02443230303138313403`.
    Decode {
        /// Frames as hex strings.
        #[arg(required = true)]
        frames: Vec<String>,
    },

    /// Decode a byte stream until end of input.
    Listen {
        /// Serial device or capture file to read (default: stdin).
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

/// Recipient of a text message. Broadcasts need no address.
fn text_address(fleet: Option<u16>, device: Option<u16>) -> CliResult<Address> {
    match (fleet, device) {
        (Some(fleet), Some(device)) => Ok(Address::new(fleet, device)?),
        _ => Ok(Address::BROADCAST),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    init_logging(&config.log_filter(cli.log_filter.as_deref()));

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli, config: Config) -> CliResult<()> {
    let port = cli.port.or(config.port.clone());

    match cli.command {
        Command::Text {
            fleet,
            device,
            broadcast,
            append_sequence,
            body,
        } => {
            let mut encoder_config = config.encoder.clone();
            encoder_config.append_sequence |= append_sequence;
            let mut encoder =
                Encoder::with_config(open_port(port.as_deref())?, encoder_config);

            let written = encoder.encode_text(&body, text_address(fleet, device)?, broadcast)?;
            info!("sent {} bytes", written);
        }

        Command::Poll { fleet, device } => {
            let address = Address::new(fleet, device)?;
            let mut encoder = Encoder::with_config(open_port(port.as_deref())?, config.encoder);
            let written = encoder.encode_gnss_poll(address)?;
            info!("sent {} bytes", written);
        }

        Command::Decode { frames } => {
            let parser = FrameParser::new();
            let mut out = io::stdout().lock();
            let mut failures = 0;
            for frame in &frames {
                let raw = hex::decode(frame.trim())?;
                match parser.parse(&raw, Utc::now()) {
                    Ok(message) => print_message(&mut out, &message)?,
                    Err(e) => {
                        warn!("{}: {}", frame, e);
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                return Err(CliError::DecodeFailures(failures));
            }
        }

        Command::Listen { input } => {
            let source: Box<dyn Read> = match &input {
                Some(path) => Box::new(File::open(path)?),
                None => Box::new(io::stdin()),
            };
            listen(source, &mut io::stdout().lock())?;
        }
    }

    Ok(())
}

fn open_port(path: Option<&Path>) -> CliResult<IoTransport<Box<dyn Write>>> {
    let writer: Box<dyn Write> = match path {
        Some(path) => {
            debug!("opening {}", path.display());
            Box::new(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?,
            )
        }
        None => Box::new(io::stdout()),
    };
    Ok(IoTransport::new(writer))
}

/// Decode `source` until end of input, writing each message to `out`.
fn listen(mut source: impl Read, out: &mut impl Write) -> CliResult<()> {
    let parser = FrameParser::new().with_observer(LogObserver);
    let mut reader = MessageReader::with_parser(parser);
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let n = match source.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        reader.feed(&chunk[..n]);

        let received_at = Utc::now();
        while let Some(result) = reader.try_next(received_at) {
            // Failures are already reported by the observer.
            if let Ok(message) = result {
                print_message(out, &message)?;
            }
        }
    }

    info!("end of input");
    Ok(())
}

fn print_message(out: &mut impl Write, message: &InboundMessage) -> CliResult<()> {
    let line = serde_json::to_string(message)?;
    writeln!(out, "{}", line)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_text_requires_address_unless_broadcast() {
        assert!(Cli::try_parse_from(["fsync", "text", "hello"]).is_err());
        assert!(Cli::try_parse_from(["fsync", "text", "--broadcast", "hello"]).is_ok());

        let cli = Cli::try_parse_from(["fsync", "text", "--fleet", "100", "--device", "1000", "hi"])
            .unwrap();
        match cli.command {
            Command::Text { fleet, device, .. } => {
                assert_eq!(
                    text_address(fleet, device).unwrap(),
                    Address::new(100, 1000).unwrap()
                );
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_port_and_log_filter() {
        let cli = Cli::try_parse_from([
            "fsync",
            "poll",
            "--fleet",
            "1",
            "--device",
            "2",
            "-p",
            "/dev/ttyUSB0",
            "--log-filter",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.port, Some(PathBuf::from("/dev/ttyUSB0")));
        assert_eq!(
            Config::default().log_filter(cli.log_filter.as_deref()),
            "debug"
        );
    }

    #[test]
    fn test_text_address_out_of_range() {
        assert!(matches!(
            text_address(Some(1000), Some(1)),
            Err(CliError::Protocol(_))
        ));
        assert_eq!(text_address(None, None).unwrap(), Address::BROADCAST);
    }

    #[test]
    fn test_poll_to_file() {
        let path = std::env::temp_dir().join(format!("fsync-poll-{}.bin", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let cli = Cli::try_parse_from([
            "fsync",
            "--port",
            path.to_str().unwrap(),
            "poll",
            "--fleet",
            "123",
            "--device",
            "1234",
        ])
        .unwrap();
        run(cli, Config::default()).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"\x02R31231234\x03");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_decode_reports_failures() {
        let cli = Cli::try_parse_from(["fsync", "decode", "02443230303138313403", "02464f4f03"])
            .unwrap();
        assert!(matches!(
            run(cli, Config::default()),
            Err(CliError::DecodeFailures(1))
        ));
    }

    #[test]
    fn test_listen_over_capture() {
        let capture: &[u8] = b"\x02D2001814\x03garbage$\x020\x03\x02FOO\x03";
        let mut out = Vec::new();
        listen(capture, &mut out).unwrap();

        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);

        assert_eq!(lines[0]["kind"], "IdentificationD");
        assert_eq!(lines[0]["fleet_id"], 200);
        assert_eq!(lines[0]["device_id"], 1814);
        assert_eq!(lines[0]["raw_text"], "D2001814");

        assert_eq!(lines[1]["kind"], "Acknowledgement");
        assert_eq!(lines[1]["acknowledged"], true);
        assert_eq!(lines[1]["raw_text"], "0");
    }

    #[test]
    fn test_listen_empty_input() {
        let mut out = Vec::new();
        listen(io::empty(), &mut out).unwrap();
        assert!(out.is_empty());
    }
}
