use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use svga_dxbc::{
    create_dxbc, diag, parse_shader, validate_shader, DxbcContainer, FourCC, ShaderInfo,
    SignatureElement,
};

#[derive(Debug, Parser)]
#[command(name = "svga-dxbc")]
#[command(about = "Inspect VGPU10 shader bytecode and wrap it in DXBC containers")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse raw bytecode and write a DXBC container.
    Wrap {
        /// Raw token stream, optionally followed by a guest signature block.
        input: PathBuf,

        /// Container output path.
        #[arg(short, long)]
        output: PathBuf,

        /// Length of the bytecode within the input; the rest is read as guest signatures.
        #[arg(long, value_name = "BYTES")]
        code_size: Option<usize>,

        /// Print the container to stdout as a C byte array.
        #[arg(long)]
        hexdump: bool,
    },

    /// Print the header, blobs and signatures of a DXBC container.
    Inspect { input: PathBuf },

    /// Write the SHDR token stream of a DXBC container.
    Extract {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Check raw bytecode for structural errors.
    Validate { input: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli.command)
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read {}", path.display()))
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Wrap {
            input,
            output,
            code_size,
            hexdump: dump,
        } => {
            let bytes = read(&input)?;
            let (info, code) = match code_size {
                Some(size) => {
                    let info = ShaderInfo::bind_guest_shader(&bytes, size)
                        .with_context(|| format!("bind {}", input.display()))?;
                    (info, &bytes[..size])
                }
                None => {
                    let info = parse_shader(&bytes)
                        .with_context(|| format!("parse {}", input.display()))?;
                    (info, &bytes[..])
                }
            };
            let dxbc = create_dxbc(&info, code).context("build DXBC container")?;
            fs::write(&output, &dxbc).with_context(|| format!("write {}", output.display()))?;
            info!(
                output = %output.display(),
                len = dxbc.len(),
                "wrote container"
            );
            if dump {
                print!("{}", hexdump(&dxbc));
            }
        }
        Commands::Inspect { input } => {
            let bytes = read(&input)?;
            let container = DxbcContainer::parse(&bytes)
                .with_context(|| format!("parse container {}", input.display()))?;
            println!("{}", container.debug_summary());
            println!(
                "checksum {}",
                if container.checksum_matches() {
                    "ok"
                } else {
                    "MISMATCH"
                }
            );
            for (label, signature) in [
                ("ISGN", container.input_signature()),
                ("OSGN", container.output_signature()),
            ] {
                if let Some(signature) = signature {
                    let elements = signature.with_context(|| format!("decode {label}"))?;
                    print!("{}", describe_signature(label, &elements));
                }
            }
            if container.find_blob(FourCC::SHDR).is_some() {
                let code = container.shader_code()?;
                let info = parse_shader(code).context("parse SHDR token stream")?;
                println!(
                    "SHDR {} program, {} tokens, {} inputs, {} outputs",
                    diag::program_type_name(info.program_type as u32),
                    code.len() / 4,
                    info.input_signature.len(),
                    info.output_signature.len()
                );
            }
        }
        Commands::Extract { input, output } => {
            let bytes = read(&input)?;
            let container = DxbcContainer::parse(&bytes)
                .with_context(|| format!("parse container {}", input.display()))?;
            let code = container.shader_code()?;
            fs::write(&output, code).with_context(|| format!("write {}", output.display()))?;
        }
        Commands::Validate { input } => {
            let bytes = read(&input)?;
            if let Err(err) = validate_shader(&bytes) {
                bail!("{}: {err}", input.display());
            }
            println!("{}: ok ({} tokens)", input.display(), bytes.len() / 4);
        }
    }
    Ok(())
}

fn describe_signature(label: &str, elements: &[SignatureElement]) -> String {
    let mut out = format!("{label} ({} elements)\n", elements.len());
    for e in elements {
        let _ = writeln!(
            out,
            "  r{:<2} {}{} mask={:#x} rw={:#x} sv={} type={}",
            e.register,
            e.semantic_name,
            e.semantic_index,
            e.mask,
            e.read_write_mask,
            diag::system_name(e.system_value),
            e.component_type
        );
    }
    out
}

/// Formats `bytes` as a C array initializer, 16 bytes per row.
fn hexdump(bytes: &[u8]) -> String {
    let mut out = String::from("{\n");
    for row in bytes.chunks(16) {
        out.push_str("    ");
        for b in row {
            let _ = write!(out, "0x{b:02x}, ");
        }
        out.truncate(out.trim_end().len());
        out.push('\n');
    }
    out.push_str("};\n");
    out
}
