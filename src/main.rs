use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use wadutil::{classify, extract_file_name, lump_name_from_path, Entry, Wad, WadError, WadKind};

#[derive(Parser)]
#[command(name = "wadutil", about = "Inspect and edit IWAD/PWAD files")]
struct Cli {
    /// WAD file to operate on
    path: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty WAD (PWAD unless -i)
    New {
        #[arg(short, long)]
        iwad: bool,
    },
    /// List the lump directory
    Ls {
        /// Human-readable sizes (`-h` is taken by --help)
        #[arg(short = 'H', long)]
        human: bool,
        /// Print the directory as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show WAD type and directory size
    #[command(alias = "wad")]
    Info,
    /// Show one lump, by position or by name
    Lump {
        lump: String,
        #[arg(short = 'H', long)]
        human: bool,
    },
    /// Write a lump's bytes to a file named after the lump
    Extract {
        #[arg(allow_negative_numbers = true)]
        position: i64,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Append a file as a new lump named after the file
    Add {
        file: PathBuf,
    },
    /// Remove the lump at a position
    Rm {
        #[arg(allow_negative_numbers = true)]
        position: i64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&directives))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // `new` never reads the existing file.
    if let Commands::New { iwad } = cli.command {
        let kind = if iwad { WadKind::Iwad } else { WadKind::Pwad };
        Wad::create_empty(&cli.path, kind)?;
        println!("created new wad");
        return Ok(());
    }

    let mut wad = Wad::open(&cli.path)?;

    match cli.command {
        Commands::New { .. } => unreachable!(),

        // ── Ls ───────────────────────────────────────────────────────────────
        Commands::Ls { human, json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(wad.directory())?);
                return Ok(());
            }
            println!("total {}", size_str(wad.total_size(), human));
            for entry in wad.entries() {
                println!("{:<7}{:<8}  {:>11}", entry.position(), entry.name(), size_str(entry.size() as i64, human));
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info => {
            println!("type: {}", wad.kind());
            println!("directory size: {}", wad.len());
        }

        // ── Lump ─────────────────────────────────────────────────────────────
        Commands::Lump { lump, human } => {
            let entry = match lump.parse::<i64>() {
                Ok(n) => wad.entry(position(&wad, n)?)?,
                Err(_) => wad.find(&lump.to_uppercase())?,
            };
            println!("name: {}", entry.name());
            println!("size: {}", size_str(entry.size() as i64, human));
            println!("type: {}", classify(&wad, entry.position()));
            if human {
                println!("pointer: 0x{:08X}", entry.offset());
            } else {
                println!("pointer: {}", entry.offset());
            }
        }

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { position: n, output_dir } => {
            let entry: Entry = wad.entry(position(&wad, n)?)?.clone();
            let data = wad.read_lump(&entry)?;
            let file_name = extract_file_name(entry.name())?;
            std::fs::create_dir_all(&output_dir)?;
            std::fs::write(output_dir.join(file_name), data)?;
            println!("{} extracted", entry.name());
        }

        // ── Add ──────────────────────────────────────────────────────────────
        Commands::Add { file } => {
            let data = std::fs::read(&file)?;
            let name = lump_name_from_path(&file)
                .ok_or_else(|| format!("cannot derive a lump name from {}", file.display()))?;
            println!("adding lump {name}");
            println!("{} bytes", data.len());
            println!("rebuilding wad, this may take a while...");
            wad.append(&name, &data)?;
        }

        // ── Rm ───────────────────────────────────────────────────────────────
        Commands::Rm { position: n } => {
            let at = position(&wad, n)?;
            let name = wad.entry(at)?.name().to_owned();
            println!("rebuilding wad, this may take a while...");
            wad.remove(at)?;
            println!("{name} removed");
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn position(wad: &Wad, n: i64) -> Result<usize, WadError> {
    usize::try_from(n).map_err(|_| WadError::OutOfRange { position: n, len: wad.len() })
}

/// `RUST_LOG`-style directives; warnings only when none are given.
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives)
}

/// Byte count, or with `human` a binary-unit size rounded to two decimals
/// (`1.5 KiB`, `2 KiB`).
fn size_str(bytes: i64, human: bool) -> String {
    if !human {
        return bytes.to_string();
    }
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64 / 1024.0;
    for unit in ["KiB", "MiB"] {
        if size < 1024.0 {
            return format!("{} {unit}", round2(size));
        }
        size /= 1024.0;
    }
    format!("{} GiB", round2(size))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
