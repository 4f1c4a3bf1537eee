use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use z80asm::{hex_dump, parse_literal, AsmConfig, Assembler};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Assemble Z80 source into a raw binary image"
)]
struct Opts {
    #[arg(value_name = "SOURCE")]
    input: PathBuf,
    /// Write output here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Emit a space-separated hex dump instead of raw bytes
    #[arg(long)]
    hex: bool,
    /// Origin to use when the source has no `org` line (hex or dec)
    #[arg(long, value_parser = parse_origin)]
    org: Option<u16>,
    /// Fail on a redeclared label instead of keeping the last one
    #[arg(long)]
    strict_labels: bool,
    /// JSON file with assembler settings; flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn parse_origin(s: &str) -> Result<u16, String> {
    let value = parse_literal(s).map_err(|e| e.to_string())?;
    u16::try_from(value).map_err(|_| format!("{value} is not a 16-bit address"))
}

fn load_config(opts: &Opts) -> Result<AsmConfig> {
    let mut cfg = match &opts.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => AsmConfig::default(),
    };
    if opts.org.is_some() {
        cfg.origin = opts.org;
    }
    if opts.strict_labels {
        cfg.allow_label_redefinition = false;
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let cfg = load_config(&opts)?;

    let source = std::fs::read_to_string(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;
    let asm = Assembler::z80(cfg)
        .assemble(&source)
        .with_context(|| format!("assembling {}", opts.input.display()))?;

    let bytes = if opts.hex {
        let mut dump = hex_dump(&asm.code);
        dump.push('\n');
        dump.into_bytes()
    } else {
        asm.code
    };

    match &opts.output {
        Some(path) => std::fs::write(path, bytes)
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(&bytes)?;
            out.flush()?;
        }
    }
    Ok(())
}
