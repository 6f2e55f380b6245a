//! ForgeKV CLI
//!
//! Command-line interface over a ForgeKV data directory. Every invocation
//! opens the memtable, replays the WAL, then runs one command.

use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use forgekv::{Config, Entry, MemTable};
use tracing_subscriber::{fmt, EnvFilter};

/// ForgeKV CLI
#[derive(Parser, Debug)]
#[command(name = "forgekv-cli")]
#[command(about = "CLI for the ForgeKV memtable and write-ahead log")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./forgekv_data")]
    data_dir: String,

    /// Compress values inside the WAL
    #[arg(long)]
    compress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get the latest record for a key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,

        /// Record version (defaults to unix millis)
        #[arg(long)]
        version: Option<i64>,
    },

    /// Write a tombstone for a key
    Del {
        /// The key to delete
        key: String,

        /// Record version (defaults to unix millis)
        #[arg(long)]
        version: Option<i64>,
    },

    /// List records with start <= key <= end
    Scan {
        start: String,
        end: String,
    },

    /// Print every WAL record in file order
    Dump,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,forgekv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .wal_compression(args.compress)
        .build();

    let memtable = match MemTable::open(&config) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("Failed to open memtable: {}", e);
            process::exit(1);
        }
    };

    memtable.recovery();
    if let Some(report) = memtable.recovery_report() {
        if let Some(err) = &report.error {
            tracing::warn!(
                "WAL replay incomplete after {} entries: {}",
                report.entries_replayed,
                err
            );
        }
    }

    if let Err(e) = run(&memtable, args.command) {
        tracing::error!("{}", e);
        process::exit(1);
    }

    if memtable.should_flush(config.memtable_size_limit) {
        eprintln!(
            "note: memtable holds {} bytes, over the {} byte flush threshold",
            memtable.size(),
            config.memtable_size_limit
        );
    }
}

fn run(memtable: &MemTable, command: Commands) -> forgekv::Result<()> {
    match command {
        Commands::Get { key } => match memtable.get(&key) {
            Some(entry) => print_entry(&entry),
            None => println!("(nil)"),
        },
        Commands::Set { key, value, version } => {
            let version = version.unwrap_or_else(now_millis);
            memtable.set(Entry::new(key, value.into_bytes(), version))?;
            println!("OK");
        }
        Commands::Del { key, version } => {
            let version = version.unwrap_or_else(now_millis);
            memtable.delete(key, version)?;
            println!("OK");
        }
        Commands::Scan { start, end } => {
            for entry in memtable.scan(&start, &end) {
                print_entry(&entry);
            }
        }
        Commands::Dump => {
            for (i, entry) in memtable.wal().read_all()?.iter().enumerate() {
                print!("{:>6}  ", i);
                print_entry(entry);
            }
        }
    }
    Ok(())
}

fn print_entry(entry: &Entry) {
    if entry.tombstone {
        println!("{}\t(deleted)\tv{}", entry.key, entry.version);
    } else {
        println!(
            "{}\t{}\tv{}",
            entry.key,
            String::from_utf8_lossy(&entry.value),
            entry.version
        );
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
