use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use dlpunpack::export::ExportOptions;
use dlpunpack::export::batch::{
    BatchSummary, discover_inputs, dump_catalog, dump_scene, export_scene_obj, pack_catalog,
    run_batch,
};
use dlpunpack::models::library::LibraryKind;
use tracing_subscriber::EnvFilter;

/// Decode ARTS DLP scene files and library catalogs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log at debug level. `RUST_LOG` takes precedence when set.
    #[clap(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a `.log` text dump next to each DLP file.
    Dump {
        /// DLP files or directories to search for `*.dlp`
        #[clap(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the dumps instead of next to each input
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert DLP files to Wavefront `.obj` + `.mtl`.
    Obj {
        /// DLP files or directories to search for `*.dlp`
        #[clap(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the exported files instead of next to each input
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Directory holding `TEX16O`/`TEX16A`. Defaults to each DLP's directory.
        #[clap(long)]
        texture_root: Option<PathBuf>,
    },
    /// Dump `MATERIAL.DB`, `TEXTURE.DB` or `PHYSICS.DB` catalogs.
    Catalog {
        /// Catalog files
        #[clap(required = true)]
        files: Vec<PathBuf>,

        /// Record type, when the file name doesn't tell
        #[clap(short, long, value_enum)]
        kind: Option<CatalogKind>,

        /// Also write a `.csv` table
        #[clap(long)]
        csv: bool,

        /// Directory for the dumps instead of next to each input
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Rebuild `.DB` catalogs from `.csv` tables written by `catalog --csv`.
    Pack {
        /// CSV tables
        #[clap(required = true)]
        files: Vec<PathBuf>,

        /// Record type, when the file name doesn't tell
        #[clap(short, long, value_enum)]
        kind: Option<CatalogKind>,

        /// Directory for the catalogs instead of next to each table
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CatalogKind {
    Material,
    Texture,
    Physics,
}

impl From<CatalogKind> for LibraryKind {
    fn from(kind: CatalogKind) -> Self {
        match kind {
            CatalogKind::Material => LibraryKind::Material,
            CatalogKind::Texture => LibraryKind::Texture,
            CatalogKind::Physics => LibraryKind::Physics,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn run(command: Command) -> Result<BatchSummary, rootcause::Report<dlpunpack::export::ExportError>> {
    let summary = match command {
        Command::Dump { inputs, output } => {
            let options = ExportOptions::builder().maybe_output_dir(output).build();
            let files = discover_inputs(&inputs)?;
            run_batch(&files, |path| dump_scene(path, &options))
        }
        Command::Obj {
            inputs,
            output,
            texture_root,
        } => {
            let options = ExportOptions::builder()
                .maybe_output_dir(output)
                .maybe_texture_root(texture_root)
                .build();
            let files = discover_inputs(&inputs)?;
            run_batch(&files, |path| export_scene_obj(path, &options))
        }
        Command::Catalog {
            files,
            kind,
            csv,
            output,
        } => {
            let options = ExportOptions::builder()
                .maybe_output_dir(output)
                .write_csv(csv)
                .build();
            let kind = kind.map(LibraryKind::from);
            run_batch(&files, |path| dump_catalog(path, kind, &options))
        }
        Command::Pack {
            files,
            kind,
            output,
        } => {
            let options = ExportOptions::builder().maybe_output_dir(output).build();
            let kind = kind.map(LibraryKind::from);
            run_batch(&files, |path| pack_catalog(path, kind, &options))
        }
    };
    Ok(summary)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args.command) {
        Ok(summary) if summary.failed == 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(report) => {
            tracing::error!("{report}");
            ExitCode::FAILURE
        }
    }
}
