use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use z80asm::{parse_literal, AsmConfig, Assembler};
use z80asm_listing::{build_report, render_text, symbol_table};

#[derive(Parser, Debug)]
#[command(author, version, about = "Z80 assembly listing and symbol export", long_about = None)]
struct Cli {
    /// Source file to assemble
    #[arg(value_name = "SOURCE")]
    input: String,
    /// Output format: text or json
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Origin to use when the source has no `org` line (hex or dec)
    #[arg(long)]
    org: Option<String>,
    /// Export symbols to JSON (Vec<{ name, ip, addr }>)
    #[arg(long, value_name = "FILE")]
    symbols_out: Option<String>,
    /// Write the listing to file instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_org(s: &str) -> Result<u16> {
    let value = parse_literal(s)?;
    u16::try_from(value).with_context(|| format!("{value} is not a 16-bit address"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = AsmConfig {
        origin: cli.org.as_deref().map(parse_org).transpose()?,
        ..AsmConfig::default()
    };

    let source = std::fs::read_to_string(&cli.input).with_context(|| format!("reading {}", cli.input))?;
    let asm = Assembler::z80(cfg).assemble(&source)?;

    if let Some(path) = &cli.symbols_out {
        let json = serde_json::to_string_pretty(&symbol_table(&asm))?;
        std::fs::write(path, json).with_context(|| format!("writing {path}"))?;
    }

    let buf = match cli.format {
        OutputFormat::Text => render_text(&asm),
        OutputFormat::Json => serde_json::to_string_pretty(&build_report(&asm))? + "\n",
    };
    if let Some(path) = cli.out {
        std::fs::write(&path, buf).with_context(|| format!("writing {path}"))?;
    } else {
        print!("{buf}");
    }
    Ok(())
}
