use std::{
    fs,
    path::{Path, PathBuf},
};

use async_std::task;
use clap::{Parser, Subcommand};
use crypto_pipeline::{
    file_name::append_extension, model::CryptoOptions, service::CryptoExchangeService,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Prepare outbound and recover inbound exchange messages")]
struct Cli {
    /// Signer options file (JSON): tool path, store scope and certificate
    /// thumbprints
    #[arg(long, default_value = "signer-options.json")]
    options: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Archive, sign and encrypt a file for sending
    Pack {
        input_file: PathBuf,

        /// Output file, defaults to <input stem>.zip.sgn.enc next to the input
        #[arg(long)]
        output_file: Option<PathBuf>,
    },
    /// Decrypt, verify and unarchive a received file
    Unpack {
        input_file: PathBuf,

        /// Directory for the recovered file, defaults to the input's directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    task::block_on(async {
        let args = Cli::parse();
        let options: CryptoOptions = serde_json::from_str(&fs::read_to_string(&args.options)?)?;
        let service = CryptoExchangeService::new(options);

        match args.command {
            Command::Pack {
                input_file,
                output_file,
            } => {
                let logical_file_name = base_file_name(&input_file)?;
                let data = fs::read(&input_file)?;
                let packed = service.process_outbound(&data, &logical_file_name).await?;

                let output_file = output_file
                    .unwrap_or_else(|| input_file.with_file_name(default_packed_name(&logical_file_name)));
                fs::write(&output_file, packed)?;
                println!(
                    "Packed {} -> {}",
                    input_file.display(),
                    output_file.display()
                );
            }
            Command::Unpack {
                input_file,
                output_dir,
            } => {
                let data = fs::read(&input_file)?;
                let (recovered, logical_file_name) = service.process_inbound(&data).await?;

                let output_dir = output_dir.unwrap_or_else(|| {
                    input_file
                        .parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from("."))
                });
                let output_file = output_dir.join(&logical_file_name);
                fs::write(&output_file, recovered)?;
                println!(
                    "Unpacked {} -> {}",
                    input_file.display(),
                    output_file.display()
                );
            }
        }

        Ok(())
    })
}

fn base_file_name(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| format!("Input path has no file name: {}", path.display()).into())
}

/// Default name for a packed file: the input's stem with the pipeline's
/// extensions stacked on top, `<stem>.zip.sgn.enc`.
fn default_packed_name(logical_file_name: &str) -> String {
    let stem = Path::new(logical_file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| logical_file_name.to_string());
    append_extension(
        &append_extension(&append_extension(&stem, ".zip"), ".sgn"),
        ".enc",
    )
}
