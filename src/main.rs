use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use mdoc::FsImageResolver;

#[derive(Parser)]
#[command(name = "mdoc")]
#[command(about = "Convert Markdown files to styled PDF documents")]
struct Cli {
    /// Input Markdown file
    input: PathBuf,

    /// Output file (defaults to input name with .pdf or .typ extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML style configuration (defaults to the bundled one)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the intermediate Typst markup instead of a PDF
    #[arg(long)]
    typst: bool,
}

fn main() {
    // RUST_LOG overrides the default level
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let config = mdoc::load_config(cli.config.as_deref())
        .unwrap_or_else(|e| fail(format!("Error: {}", e)));
    log::debug!("document type {:?}", config.document_type);

    // Read input file
    let markdown = fs::read_to_string(&cli.input)
        .unwrap_or_else(|e| fail(format!("Error reading {}: {}", cli.input.display(), e)));

    // Images are resolved next to the input file
    let base_dir = cli
        .input
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let images = FsImageResolver::new(base_dir);

    let (bytes, extension) = if cli.typst {
        let markup = mdoc::markdown_to_typst_with(&markdown, &config, &images);
        (markup.into_bytes(), "typ")
    } else {
        let pdf = mdoc::markdown_to_pdf(&markdown, &config, &images)
            .unwrap_or_else(|e| fail(format!("Error: {}", e)));
        (pdf, "pdf")
    };

    // Determine output path
    let output = cli
        .output
        .unwrap_or_else(|| cli.input.with_extension(extension));

    if let Err(e) = fs::write(&output, bytes) {
        fail(format!("Error writing {}: {}", output.display(), e));
    }

    println!("Created {}", output.display());
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}
