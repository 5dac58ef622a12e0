//! PE payload CLI.
//!
//! Embeds, extracts, and lists named payloads stored in the Security Data
//! Directory of a PE image.

use clap::{Parser, Subcommand};
use miette::{miette, Context, IntoDiagnostic, Result};
use pe_payload::{embed_payload_file, list_payload_file, read_payload_file};
use std::io::Write as _;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pe-payload")]
#[command(about = "Embed named payloads in the PE security directory")]
#[command(long_about = "
pe-payload - embed and retrieve named payloads in PE images

Payloads are stored in the trailing space of the security data directory
(the Authenticode certificate area) so the image stays loadable; the PE
checksum is recomputed on every write.

EXAMPLES:
    # Embed a license string
    pe-payload write myapp.exe --name license --payload \"ABC-123\"

    # Embed a file, choosing the output path
    pe-payload write myapp.exe --name blob --payload-file blob.bin --out patched.exe

    # Read it back
    pe-payload read myapp.exe.out --name license

    # Enumerate embedded payloads
    pe-payload list myapp.exe.out

ENVIRONMENT VARIABLES:
    RUST_LOG        Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    /// Squelch informational logging
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed a payload into a PE file
    Write {
        /// The PE file to embed into
        #[arg(value_name = "INPUT_FILE")]
        input_file: PathBuf,

        /// Payload name (catalog key)
        #[arg(short, long, value_name = "NAME")]
        name: String,

        /// Payload given inline on the command line
        #[arg(short, long, value_name = "STRING", conflicts_with = "payload_file")]
        payload: Option<String>,

        /// Payload read from a file
        #[arg(long, value_name = "FILE")]
        payload_file: Option<PathBuf>,

        /// Output file path (defaults to <INPUT_FILE>.out)
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        out: Option<PathBuf>,
    },

    /// Read a payload back from a PE file
    Read {
        /// The PE file to read from
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Payload name (catalog key)
        #[arg(short, long, value_name = "NAME")]
        name: String,

        /// Write the payload bytes here instead of stdout
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        out: Option<PathBuf>,
    },

    /// List the payload names embedded in a PE file
    List {
        /// The PE file to inspect
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "error" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Write {
            input_file,
            name,
            payload,
            payload_file,
            out,
        } => {
            let payload = match (payload, payload_file) {
                (Some(inline), None) => inline.into_bytes(),
                (None, Some(path)) => std::fs::read(&path)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("reading payload file {}", path.display()))?,
                _ => {
                    return Err(miette!(
                        "exactly one of --payload or --payload-file is required"
                    ))
                }
            };
            let out = out.unwrap_or_else(|| default_output_path(&input_file));
            embed_payload_file(&input_file, &out, &name, &payload)?;
            Ok(())
        }
        Commands::Read { file, name, out } => {
            let payload = read_payload_file(&file, &name)?;
            match out {
                Some(path) => std::fs::write(&path, &payload)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("writing payload to {}", path.display()))?,
                None => {
                    std::io::stdout().write_all(&payload).into_diagnostic()?;
                }
            }
            Ok(())
        }
        Commands::List { file } => {
            for name in list_payload_file(&file)? {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut os = input.as_os_str().to_os_string();
    os.push(".out");
    PathBuf::from(os)
}
