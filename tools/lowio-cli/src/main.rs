//! lowio - CLI front end for the low-level I/O facade
//!
//! Commands:
//! - `lowio write <name> <text>` - Write text into a file under the base directory
//! - `lowio read <name>` - Print the contents of a file
//! - `lowio info` - Show base directory, capacity and flag values

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use lowio_posix::{
    IoConfig, LowLevelIo, MAX_FILENO, O_APPEND, O_CREAT, O_RDONLY, O_RDWR, O_TRUNC, O_WRONLY,
    SEEK_SET,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lowio")]
#[command(version)]
#[command(about = "lowio - bounded POSIX-style file I/O", long_about = None)]
struct Cli {
    /// Base directory (overrides the config file and LOWIO_BASE_DIR)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write text into a file
    Write {
        /// File name, relative to the base directory
        name: String,

        /// Text to write
        text: String,

        /// Append to the end of the file
        #[arg(short, long, conflicts_with_all = ["truncate", "offset"])]
        append: bool,

        /// Discard existing content first
        #[arg(short, long)]
        truncate: bool,

        /// Absolute offset to start writing at
        #[arg(long)]
        offset: Option<i64>,
    },

    /// Print the contents of a file
    Read {
        /// File name, relative to the base directory
        name: String,

        /// Maximum number of bytes to read
        #[arg(short, long, default_value_t = 4096)]
        count: usize,

        /// Absolute offset to start reading at
        #[arg(long)]
        offset: Option<i64>,
    },

    /// Show base directory and constants
    Info,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let mut io = LowLevelIo::from_config(&config).context("Failed to set up base directory")?;

    match cli.command {
        Commands::Write {
            name,
            text,
            append,
            truncate,
            offset,
        } => {
            write_file(&mut io, &name, text.as_bytes(), append, truncate, offset)?;
        }

        Commands::Read {
            name,
            count,
            offset,
        } => {
            read_file(&mut io, &name, count, offset)?;
        }

        Commands::Info => {
            show_info(&io, &config)?;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<IoConfig> {
    let mut config = match &cli.config {
        Some(path) => IoConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => IoConfig::default(),
    };

    if let Some(dir) = &cli.base_dir {
        config.base_dir = Some(dir.clone());
    }

    Ok(config)
}

fn write_file(
    io: &mut LowLevelIo,
    name: &str,
    data: &[u8],
    append: bool,
    truncate: bool,
    offset: Option<i64>,
) -> anyhow::Result<()> {
    let mut mode = O_WRONLY | O_CREAT;
    if append {
        mode |= O_APPEND;
    } else if truncate {
        mode |= O_TRUNC;
    }

    let fd = io.try_open(name, mode, 0o644)? as i64;
    log::debug!("Opened '{}' as handle {}", name, fd);

    if let Some(offset) = offset {
        io.try_lseek(fd, offset, SEEK_SET)
            .with_context(|| format!("Failed to seek to {offset}"))?;
    }

    let written = io.try_write(fd, data, data.len() as i64)?;
    io.try_close(fd)?;

    println!(
        "{} Wrote {} bytes to {}",
        "✅".green(),
        written,
        io.base_dir().join(name).display()
    );

    Ok(())
}

fn read_file(
    io: &mut LowLevelIo,
    name: &str,
    count: usize,
    offset: Option<i64>,
) -> anyhow::Result<()> {
    let path = io.base_dir().join(name);
    if !path.is_file() {
        anyhow::bail!("'{}' does not exist", path.display());
    }

    let fd = io.try_open(name, O_RDONLY, 0)? as i64;

    if let Some(offset) = offset {
        io.try_lseek(fd, offset, SEEK_SET)
            .with_context(|| format!("Failed to seek to {offset}"))?;
    }

    let mut buf = vec![0u8; count];
    let read = io.try_read(fd, &mut buf)?;
    io.try_close(fd)?;

    log::info!("Read {} bytes from {}", read, path.display());
    println!("{}", String::from_utf8_lossy(&buf[..read]));

    Ok(())
}

fn show_info(io: &LowLevelIo, config: &IoConfig) -> anyhow::Result<()> {
    println!("{}", "lowio - bounded POSIX-style file I/O".bold().green());
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("\nBase directory: {}", io.base_dir().display());
    println!(
        "Handles: {} of {} open (valid range 0..{})",
        io.table().open_count(),
        io.table().capacity(),
        MAX_FILENO
    );

    println!("\nOpen flags:");
    for (flag, value) in [
        ("O_RDONLY", O_RDONLY),
        ("O_WRONLY", O_WRONLY),
        ("O_RDWR", O_RDWR),
        ("O_CREAT", O_CREAT),
        ("O_TRUNC", O_TRUNC),
        ("O_APPEND", O_APPEND),
    ] {
        println!("  {:<9} {:#06x}", flag, value);
    }

    println!("\nEffective config:");
    print!("{}", toml::to_string_pretty(config)?);

    Ok(())
}
