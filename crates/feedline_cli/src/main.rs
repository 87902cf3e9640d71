//! FEEDLINE CLI
//!
//! Render feed pages from an events file and canonicalize XML documents.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use feedline_feed::{cursor_from_link, FeedService, LinkBuilder};
use feedline_log::{Cursor, CursorLimits, InMemoryEventLog};
use feedline_xml::{CanonicalizeConfig, Canonicalizer};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "feedline")]
#[command(about = "FEEDLINE - paginated Atom feeds over an event log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one feed page
    Render(RenderArgs),
    /// Strip insignificant whitespace from an XML document
    Compact {
        /// XML file, `-` for stdin
        input: String,
    },
    /// Indent an XML document one node per line
    Pretty {
        /// XML file, `-` for stdin
        input: String,
        /// Spaces per level
        #[arg(long, default_value_t = 2)]
        indent: usize,
    },
}

#[derive(clap::Args)]
struct RenderArgs {
    /// JSON array of {"position", "payload"} events
    #[arg(short, long)]
    events: PathBuf,
    /// Page start
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    position: i64,
    /// Entries per page
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    page_size: i64,
    /// Stop boundary, -1 for none
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    stop_at: i64,
    /// Take the cursor from a link emitted by an earlier page
    #[arg(long, conflicts_with_all = ["position", "page_size", "stop_at"])]
    link: Option<String>,
    /// Origin used in feed links
    #[arg(long, default_value = "http://localhost:8080")]
    base_url: String,
    /// Feed path used in feed links
    #[arg(long, default_value = "/api/feed")]
    path: String,
    /// Feed title
    #[arg(long, default_value = feedline_feed::service::DEFAULT_TITLE)]
    title: String,
    /// Print the indented form
    #[arg(long)]
    pretty: bool,
}

impl RenderArgs {
    fn cursor(&self) -> Result<Cursor> {
        let limits = CursorLimits::default();
        let cursor = match &self.link {
            Some(link) => cursor_from_link(link, &limits)
                .wrap_err_with(|| format!("reading cursor from {}", link))?,
            None => {
                let cursor = Cursor::from_raw(self.position, self.page_size, self.stop_at)?;
                limits.check(&cursor)?;
                cursor
            }
        };
        Ok(cursor)
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .wrap_err("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(input).wrap_err_with(|| format!("reading {}", input))
}

async fn render(args: &RenderArgs) -> Result<String> {
    let json = std::fs::read_to_string(&args.events)
        .wrap_err_with(|| format!("reading {}", args.events.display()))?;
    let log = InMemoryEventLog::from_json(&json)
        .wrap_err_with(|| format!("parsing {}", args.events.display()))?;

    let cursor = args.cursor()?;
    tracing::debug!(position = %cursor.position, page_size = %cursor.page_size, "rendering page");

    let service = FeedService::new(Arc::new(log), LinkBuilder::new(&args.base_url, &args.path))
        .with_title(args.title.clone());
    let page = service.page(cursor).await?;

    if args.pretty {
        Ok(page.pretty(service.canonicalizer())?)
    } else {
        let mut xml = page.into_xml();
        xml.push('\n');
        Ok(xml)
    }
}

async fn run(command: Commands) -> Result<String> {
    match command {
        Commands::Render(args) => render(&args).await,
        Commands::Compact { input } => {
            let xml = read_input(&input)?;
            let mut out = Canonicalizer::new()
                .compact(&xml)
                .wrap_err_with(|| format!("compacting {}", input))?;
            out.push('\n');
            Ok(out)
        }
        Commands::Pretty { input, indent } => {
            let xml = read_input(&input)?;
            let out = Canonicalizer::with_config(CanonicalizeConfig { indent })
                .pretty(&xml)
                .wrap_err_with(|| format!("pretty-printing {}", input))?;
            Ok(out)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feedline=warn")),
        )
        .init();

    let cli = Cli::parse();
    let out = run(cli.command).await?;
    print!("{}", out);
    Ok(())
}
