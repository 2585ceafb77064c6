use clap::Parser;
use romdisk::emit::{emit, EmitOptions, Lang, DEFAULT_BYTES_PER_LINE, DEFAULT_PREFIX};
use romdisk::encoder::{encode, EncodeOptions};
use romdisk::logging::env_filter;
use romdisk::sector::verify;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "romdisk", version, about = "Pack a disk image into ROM-embeddable sparse tables")]
struct Cli {
    /// Raw image to pack
    image: PathBuf,
    /// Output language
    #[arg(short, long, value_enum, default_value_t = Lang::C)]
    lang: Lang,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Prefix for generated symbols
    #[arg(short, long, default_value = DEFAULT_PREFIX)]
    prefix: String,
    /// Stream byte literals per source line
    #[arg(long, default_value_t = DEFAULT_BYTES_PER_LINE)]
    bytes_per_line: usize,
    /// Print a JSON size summary instead of generated output
    #[arg(long)]
    info: bool,
    /// Decode the packed tables and compare with the input before writing
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries generated source; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(env_filter())
        .init();

    let cli = Cli::parse();

    let data = std::fs::read(&cli.image)?;
    let image = encode(&data, &EncodeOptions::default())?;

    if cli.verify {
        verify(&data, &image)?;
        tracing::info!("verified {} sectors against {}", image.total_sectors(), cli.image.display());
    }

    if cli.info {
        let mut json = serde_json::to_string_pretty(&image.summary())?;
        json.push('\n');
        return write_output(cli.output.as_ref(), json.as_bytes());
    }

    let opts = EmitOptions {
        lang:           cli.lang,
        prefix:         cli.prefix,
        bytes_per_line: cli.bytes_per_line,
    };
    let mut rendered = Vec::new();
    emit(&image, &opts, &mut rendered)?;
    write_output(cli.output.as_ref(), &rendered)
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn write_output(path: Option<&PathBuf>, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            std::fs::write(path, bytes)?;
            tracing::info!("wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
