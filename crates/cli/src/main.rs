use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use clearly_core::{Clearly, ClearlyConfig, ConfigLoader, Document, SiteConfigMap};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

mod echo;

use echo::{
    format_size, print_article_details, print_banner, print_field, print_info, print_step, print_success,
    print_timing, print_warning,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the extracted article
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Html,
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(format!("Invalid format: {}. Valid options: json, html, text", s)),
        }
    }
}

/// Extract the readable article from an HTML document
#[derive(Parser, Debug)]
#[command(name = "clearly")]
#[command(author = "Clearly Contributors")]
#[command(version)]
#[command(about = "Extract the readable article from HTML documents", long_about = None)]
struct Args {
    /// Local HTML file, or "-" for stdin (the default)
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    /// URL the page was loaded from, used for relative links and site rules
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// Site configuration JSON file (default: ~/.config/clearly/siteconfig.json)
    #[arg(short, long, value_name = "FILE")]
    site_config: Option<PathBuf>,

    /// Output format (json, html, text)
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Characters of text needed to accept an extraction attempt
    #[arg(long, default_value = "500", value_name = "NUM")]
    char_threshold: usize,

    /// Number of top candidates to track
    #[arg(long, default_value = "5", value_name = "NUM")]
    nb_top_candidates: usize,

    /// Maximum number of elements to parse (0 = unlimited)
    #[arg(long, default_value = "0", value_name = "NUM")]
    max_elems: usize,

    /// Class to keep in the output HTML (repeatable)
    #[arg(long = "keep-class", value_name = "CLASS")]
    keep_class: Vec<String>,

    /// Language assumed when detection finds nothing
    #[arg(long, default_value = "en", value_name = "LOCALE")]
    locale: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "clearly_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

fn load_site_config(path: Option<&PathBuf>) -> anyhow::Result<SiteConfigMap> {
    match path {
        Some(path) => ConfigLoader::load_file(path)
            .with_context(|| format!("Failed to load site config: {}", path.display())),
        None => ConfigLoader::default().load().context("Failed to load default site config"),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let started = Instant::now();
    let mut timings = Vec::new();

    let html = if args.input == "-" {
        if args.verbose {
            print_step(1, 4, "Reading from stdin");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
        buffer
    } else {
        if args.verbose {
            print_step(1, 4, &format!("Reading from file {}", args.input.bright_white()));
        }
        fs::read_to_string(&args.input).with_context(|| format!("Failed to read file: {}", args.input))?
    };

    if args.verbose {
        print_field("Size", &format_size(html.len()));
        eprintln!();
        print_step(2, 4, "Parsing HTML document");
    }

    let step = Instant::now();
    let doc = match &args.url {
        Some(url) => Document::parse_with_url(&html, url),
        None => Document::parse(&html),
    }
    .context("Failed to parse HTML")?;
    timings.push(("Parse", step.elapsed()));

    let site_config = load_site_config(args.site_config.as_ref())?;

    if args.verbose {
        if let Some(title) = doc.title() {
            print_field("Title", &title);
        }
        print_field("Elements", &doc.element_count().to_string());
        print_field("Site rules", &site_config.len().to_string());
        eprintln!();
        print_step(3, 4, "Extracting main content");
    }

    let config = ClearlyConfig::builder()
        .char_threshold(args.char_threshold)
        .nb_top_candidates(args.nb_top_candidates)
        .max_elems_to_parse(args.max_elems)
        .classes_to_preserve(args.keep_class.clone())
        .default_locale(args.locale.as_str())
        .debug(args.verbose)
        .build();
    let reader = Clearly::with_config(config).with_site_config(site_config);

    let step = Instant::now();
    let article = reader.parse_document(&doc).context("Failed to extract content")?;
    timings.push(("Extract", step.elapsed()));

    let Some(article) = article else {
        print_warning("No readable content found");
        anyhow::bail!("could not extract an article from {}", args.input);
    };

    if args.verbose {
        print_article_details(&article);
        for (label, duration) in &timings {
            print_timing(label, *duration);
        }
        print_timing("Total", started.elapsed());
        eprintln!();
    }

    let output = match args.format {
        OutputFormat::Json => article.to_json_pretty().context("Failed to serialize article")?,
        OutputFormat::Html => article.html,
        OutputFormat::Text => article.to_text(),
    };

    if args.verbose {
        print_step(4, 4, "Writing output");
        print_field("Format", &format!("{:?}", args.format));
        eprintln!();
    }

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(())
}
