//! pagestruct CLI - PDF layout reconstruction tool

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use pagestruct::{
    read_input, read_input_file, render, DocumentInput, DocumentLayout, ElementType, JsonFormat,
    LayoutEngine, LayoutOptions, PageSelection, PageStatus,
};

#[derive(Parser)]
#[command(name = "pagestruct")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Reconstruct headings, paragraphs, lists and tables from decoded PDF pages", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct the layout of decoded pages and write JSON
    Layout {
        /// Input JSON with decoded pages ("-" for stdin)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Process pages one after another
        #[arg(long)]
        sequential: bool,

        /// Skip table detection
        #[arg(long)]
        no_tables: bool,

        /// Skip list splitting and grouping
        #[arg(long)]
        no_lists: bool,

        /// Ignore vector graphics
        #[arg(long)]
        no_graphics: bool,

        /// Override the detected base font size
        #[arg(long, value_name = "PT")]
        base_font_size: Option<f32>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Output a flat element array instead of pages
        #[arg(long)]
        elements: bool,

        /// Print per-type element counts to stderr
        #[arg(long)]
        summary: bool,
    },

    /// Show information about an input file
    Info {
        /// Input JSON with decoded pages ("-" for stdin)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Layout {
            input,
            output,
            pages,
            sequential,
            no_tables,
            no_lists,
            no_graphics,
            base_font_size,
            compact,
            elements,
            summary,
        } => build_options(pages.as_deref(), sequential, no_tables, no_lists, no_graphics, base_font_size)
            .and_then(|options| {
                let format = if compact {
                    JsonFormat::Compact
                } else {
                    JsonFormat::Pretty
                };
                cmd_layout(&input, output.as_deref(), options, format, elements, summary)
            }),
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn build_options(
    pages: Option<&str>,
    sequential: bool,
    no_tables: bool,
    no_lists: bool,
    no_graphics: bool,
    base_font_size: Option<f32>,
) -> Result<LayoutOptions, Box<dyn std::error::Error>> {
    let page_selection = if let Some(p) = pages {
        PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?
    } else {
        PageSelection::All
    };

    let mut options = LayoutOptions::new()
        .with_pages(page_selection)
        .with_parallel(!sequential)
        .with_tables(!no_tables)
        .with_lists(!no_lists)
        .with_graphics(!no_graphics);
    if let Some(size) = base_font_size {
        options = options.with_base_font_size(size);
    }
    Ok(options)
}

fn load(input: &Path) -> Result<DocumentInput, Box<dyn std::error::Error>> {
    let document = if input == Path::new("-") {
        read_input(io::stdin().lock())?
    } else {
        read_input_file(input)?
    };
    info!("Loaded {} pages from {}", document.pages.len(), input.display());
    Ok(document)
}

fn cmd_layout(
    input: &Path,
    output: Option<&Path>,
    options: LayoutOptions,
    format: JsonFormat,
    elements: bool,
    summary: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = load(input)?;
    debug!("Layout options: {:?}", options);
    let engine = LayoutEngine::new(options);

    let layout = if engine.options().parallel {
        engine.process_document(&document)
    } else {
        process_with_progress(&engine, &document)?
    };

    let json = if elements {
        render::elements_to_json(&layout, format)?
    } else {
        render::to_json(&layout, format)?
    };

    if let Some(path) = output {
        fs::write(path, &json)?;
        eprintln!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    if summary {
        print_summary(&layout);
    }
    Ok(())
}

/// Sequential processing, one progress tick per page.
fn process_with_progress(
    engine: &LayoutEngine,
    document: &DocumentInput,
) -> Result<DocumentLayout, Box<dyn std::error::Error>> {
    let metrics = engine.metrics_for(&document.pages);
    let first_page = document.pages.iter().map(|p| p.page_num).min();
    let selected: Vec<_> = document
        .pages
        .iter()
        .filter(|p| engine.options().pages.includes(p.page_num))
        .collect();

    let pb = ProgressBar::new(selected.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut pages = Vec::with_capacity(selected.len());
    for page in selected {
        pb.set_message(format!("page {}", page.page_num));
        pages.push(engine.process_page(page, &metrics, first_page == Some(page.page_num)));
        pb.inc(1);
    }
    pages.sort_by_key(|p| p.page_num);
    pb.finish_with_message("Done!");

    Ok(DocumentLayout { pages })
}

fn print_summary(layout: &DocumentLayout) {
    let counts = layout.count_by_type();
    let count = |t: ElementType| counts.get(&t).copied().unwrap_or(0);

    eprintln!();
    eprintln!("{}", "Layout Summary".cyan().bold());
    eprintln!("{}", "─".repeat(40).dimmed());
    eprintln!("{}: {}", "Pages".bold(), layout.pages.len());
    eprintln!("{}: {}", "Headings".bold(), count(ElementType::Heading));
    eprintln!("{}: {}", "Paragraphs".bold(), count(ElementType::Paragraph));
    eprintln!("{}: {}", "Lists".bold(), count(ElementType::List));
    eprintln!("{}: {}", "Tables".bold(), count(ElementType::Table));

    let failed = layout.failed_pages();
    if !failed.is_empty() {
        eprintln!("{}: {:?}", "Failed pages".red().bold(), failed);
    }
    let cancelled = layout
        .pages
        .iter()
        .filter(|p| p.status == PageStatus::Cancelled)
        .count();
    if cancelled > 0 {
        eprintln!("{}: {}", "Cancelled pages".yellow().bold(), cancelled);
    }
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let document = load(input)?;
    let engine = LayoutEngine::new(LayoutOptions::default());
    let metrics = engine.metrics_for(&document.pages);

    println!("{}", "Input Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Pages".bold(), document.pages.len());

    let text_items: usize = document.pages.iter().map(|p| p.text_items.len()).sum();
    let operators: usize = document.pages.iter().map(|p| p.operator_list.len()).sum();
    println!("{}: {}", "Text items".bold(), text_items);
    println!("{}: {}", "Graphics operators".bold(), operators);

    println!();
    println!("{}", "Typography".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let structure = metrics.structure();
    println!("{}: {:.1}pt", "Base font size".bold(), metrics.base_font_size());
    println!(
        "{}: {:?}",
        "Heading sizes".bold(),
        metrics.font_stats().heading_sizes
    );
    println!("{}: {}", "Distinct sizes".bold(), structure.distinct_sizes);
    println!(
        "{}: {}",
        "Uniform fonts".bold(),
        if structure.homogeneous { "Yes" } else { "No" }
    );

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pagestruct".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF layout reconstruction tool");
    println!();
    println!("License: MIT");
}
