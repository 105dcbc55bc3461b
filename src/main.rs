//! girdoc: generate API documentation from GObject-Introspection repositories.
//!
//! Every documented declaration of the GIR namespace becomes one page, doc
//! comments are rendered with cross-references resolved across the included
//! repositories, and a sections file decides page order and grouping:
//!
//! `girdoc Gtk-3.0.gir -o docs -I /usr/share/gir-1.0 -f slate`

mod gir;
mod grammar;
mod model;
mod naming;
mod pages;
mod render;
mod resolve;
mod scanner;
mod sections;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "girdoc",
    about = "Generate API documentation from GObject-Introspection repositories"
)]
struct Cli {
    /// GIR file to document
    girfile: PathBuf,

    /// Directory to write output to
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Naming convention of the output: c or python
    #[arg(short = 'l', long, default_value = "python")]
    language: String,

    /// Output format: slate (default), markdown, html
    #[arg(short = 'f', long, default_value = "slate")]
    format: String,

    /// Include paths for other GIR files
    #[arg(short = 'I', long = "add-include-path")]
    include_paths: Vec<PathBuf>,

    /// Include paths for {{ file }} inclusion in doc comments
    #[arg(short = 'M', long = "markdown-include-path")]
    markdown_include_paths: Vec<PathBuf>,

    /// Generate and write out a sections file
    #[arg(short = 's', long = "write-sections-file")]
    write_sections: bool,

    /// Sections file to use for ordering
    #[arg(short = 'u', long = "sections-file")]
    sections_file: Option<PathBuf>,

    /// Namespace searched first when resolving references.
    /// Can be specified multiple times.
    #[arg(long = "search-order")]
    search_order: Vec<String>,

    /// Render class members as pages of their own instead of merging them
    #[arg(long)]
    no_aggregation: bool,

    /// Generate online links
    #[arg(short = 'O', long)]
    online_links: bool,

    /// Link to installed gtk-doc documentation
    #[arg(short = 'g', long)]
    link_to_gtk_doc: bool,

    /// Link every word that names a known symbol
    #[arg(short = 'R', long)]
    resolve_implicit_links: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let output = cli.output.as_deref().context("--output is required")?;
    let convention = naming::Convention::from_language(&cli.language)
        .with_context(|| format!("unknown language: {}. Use c or python", cli.language))?;
    let formatter = render::create_formatter(&cli.format)?;

    for (set, flag) in [
        (cli.online_links, "--online-links"),
        (cli.link_to_gtk_doc, "--link-to-gtk-doc"),
        (cli.resolve_implicit_links, "--resolve-implicit-links"),
    ] {
        if set {
            debug!("{} is accepted but has no effect", flag);
        }
    }

    fs::create_dir_all(output)
        .with_context(|| format!("failed to create output directory: {}", output.display()))?;

    let mut tree = model::Tree::new();
    let root = gir::load(&cli.girfile, &cli.include_paths, &mut tree)?;
    info!(
        "loaded {} namespace(s) from {}",
        tree.namespaces().len(),
        cli.girfile.display()
    );

    let names = naming::NameFormatter::new(convention);
    let sections = match &cli.sections_file {
        Some(path) if !cli.write_sections => sections::SectionTree::load(path)?,
        _ => sections::write_generated(&tree, root, names, output)?.0,
    };

    let scanner = scanner::DocScanner::new().context("failed to build the doc grammar")?;
    let resolver = resolve::Resolver::new(&tree, &cli.search_order);
    let options = pages::Options {
        include_dirs: cli.markdown_include_paths.clone(),
        aggregate: !cli.no_aggregation,
        convention,
    };

    let mut renderer = pages::PageRenderer::new(
        &tree,
        root,
        &resolver,
        formatter.as_ref(),
        &scanner,
        &sections,
        &options,
    );
    renderer.render(output)?;
    renderer.render_index(output)?;
    info!(
        "wrote {} page(s) to {}",
        renderer.created_pages().len(),
        output.display()
    );

    Ok(())
}

/// WARN by default; `-v` or `DOCTOOL_DEBUG` raise the level.
fn init_tracing(verbose: bool) -> Result<()> {
    let level = match std::env::var("DOCTOOL_DEBUG") {
        Ok(value) if value.eq_ignore_ascii_case("info") => Level::INFO,
        Ok(_) => Level::DEBUG,
        Err(_) if verbose => Level::DEBUG,
        Err(_) => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
