use anyhow::Context;
use clap::{Parser, Subcommand};
use p1_dsmr::dsmr::frame::{checksum_range, frame_from_dump};
use p1_dsmr::logging::log_warn;
use p1_dsmr::{
    calculate_crc16, connect, init_logger, log_info, run, DsmrConfig, LogSink, P1Reader,
    SensorConfig,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "p1-dsmr")]
#[command(about = "CLI tool for DSMR/P1 smart meter telegrams")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read telegrams from a serial port and log the configured sensors
    Listen {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        port: Option<String>,
        #[arg(short, long)]
        baudrate: Option<u32>,
        #[arg(long)]
        validity_ms: Option<u64>,
        #[arg(long)]
        interval_ms: Option<u64>,
        /// OBIS key to publish (repeatable)
        #[arg(long = "obis")]
        obis: Vec<String>,
    },
    /// Parse a captured byte dump and print the readings
    Parse {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the CRC16 of the first telegram in a file
    Checksum { file: PathBuf },
}

#[derive(Serialize)]
struct ParseReport<'a> {
    readings: Vec<(&'a str, Option<f64>)>,
    stats: &'a p1_dsmr::ReaderStats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();

    match cli.command {
        Commands::Listen {
            config,
            port,
            baudrate,
            validity_ms,
            interval_ms,
            obis,
        } => {
            let mut config = match config {
                Some(path) => DsmrConfig::from_json_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => DsmrConfig::default(),
            };
            if let Some(port) = port {
                config.serial.port = port;
            }
            if let Some(baudrate) = baudrate {
                config.serial.baudrate = baudrate;
            }
            if let Some(validity_ms) = validity_ms {
                config.obis_validity_ms = validity_ms;
            }
            if let Some(interval_ms) = interval_ms {
                config.update_interval_ms = interval_ms;
            }
            config.sensors.extend(obis.into_iter().map(|obis| SensorConfig {
                name: String::new(),
                obis,
            }));
            config.validate()?;
            if config.sensors.is_empty() {
                log_warn("No sensors configured; telegrams will be parsed but nothing is published");
            }

            let mut reader = P1Reader::new(config.obis_validity_ms);
            for sensor in &config.sensors {
                reader.register(&sensor.obis, LogSink::new(sensor.display_name()));
            }

            let mut port = connect(&config.serial)
                .with_context(|| format!("opening {}", config.serial.port))?;
            run(&mut port, &mut reader, config.update_interval()).await?;
            log_info("P1 stream ended");
        }
        Commands::Parse { file, json } => {
            let data =
                std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let mut reader = P1Reader::new(0);
            reader.feed(&data);

            let store = reader.store();
            let report = ParseReport {
                readings: store
                    .entries()
                    .into_iter()
                    .map(|(key, reading)| (key, reading.value))
                    .collect(),
                stats: reader.stats(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for (key, value) in &report.readings {
                    match value {
                        Some(v) => println!("{key:<14} {v}"),
                        None => println!("{key:<14} unavailable"),
                    }
                }
                println!("{:?}", report.stats);
            }
        }
        Commands::Checksum { file } => {
            let data =
                std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let range = checksum_range(&data)
                .with_context(|| format!("no '/'...'!' telegram in {}", file.display()))?;
            let calculated = calculate_crc16(range);
            println!("{calculated:04X}");
            match frame_from_dump(&data) {
                Ok(frame) => match frame.verify() {
                    Ok(()) => log_info("Received checksum matches"),
                    Err(e) => log_warn(&e.to_string()),
                },
                Err(e) => log_warn(&e.to_string()),
            }
        }
    }

    Ok(())
}
