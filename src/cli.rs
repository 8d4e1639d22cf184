use std::cmp;
use std::error::Error;
#[cfg(feature = "web")]
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use atty::Stream;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, CellAlignment, Table, presets::UTF8_FULL};
use pokedex_rs::config::{DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE};
use pokedex_rs::{
    BrowserConfig, BrowserEvent, CatalogBrowser, CatalogEntry, CatalogSource, TranslationLookup,
    TranslationTables, Trigger,
};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "pokedex",
    about = "Browse the PokeAPI catalog with Japanese names and types",
    version
)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    /// Log request and store activity to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Listing endpoint; the page size is appended as `limit`.
    #[arg(long, global = true, env = "POKEDEX_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Number of references requested per listing page.
    #[arg(long, global = true, env = "POKEDEX_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// JSON list of {"en", "ja"} pairs replacing the built-in name table.
    #[arg(long, global = true, requires = "types_table")]
    names_table: Option<PathBuf>,

    /// JSON object of type -> localized type replacing the built-in table.
    #[arg(long, global = true, requires = "names_table")]
    types_table: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and filter catalog pages.
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// Resolve a name (and optionally a type) through the translation tables.
    Lookup {
        /// English name, matched case-insensitively.
        name: String,
        /// Type identifier, matched exactly.
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Serve the catalog over a JSON API.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Load one or more pages, then print the (optionally filtered) view.
    Browse {
        /// Number of listing pages to load.
        #[arg(short, long, default_value_t = 1)]
        pages: usize,
        /// Free-text filter applied after loading.
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Interactive session: type to filter, `:more` to load the next page.
    Repl,
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let as_json = cli.json;
    let lookup = Arc::new(load_tables(&cli)?);
    let config = BrowserConfig::default()
        .with_base_url(cli.base_url.clone())
        .with_page_size(cli.page_size);

    match cli.command {
        Command::Lookup { name, kind } => handle_lookup(lookup.as_ref(), &name, kind, as_json),
        Command::Catalog(CatalogCommand::Browse { pages, query }) => {
            runtime()?.block_on(handle_browse(config, lookup, pages, query, as_json))
        }
        Command::Catalog(CatalogCommand::Repl) => runtime()?.block_on(handle_repl(config, lookup)),
        #[cfg(feature = "web")]
        Command::Serve { addr } => runtime()?.block_on(handle_serve(config, lookup, addr)),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "pokedex_rs=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

fn load_tables(cli: &Cli) -> Result<TranslationTables, Box<dyn Error>> {
    match (&cli.names_table, &cli.types_table) {
        (Some(names), Some(types)) => Ok(TranslationTables::from_paths(names, types)?),
        _ => Ok(TranslationTables::embedded().clone()),
    }
}

fn handle_lookup(
    lookup: &TranslationTables,
    name: &str,
    kind: Option<String>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let localized_name = lookup.localized_name(name);
    let localized_type = kind.as_deref().map(|kind| lookup.localized_type(kind));

    if as_json {
        let payload = json!({
            "name": name,
            "localized_name": localized_name,
            "type": kind,
            "localized_type": localized_type.flatten(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        let localized = lookup.localize(name, kind.as_deref().unwrap_or_default());
        println!("{name} -> {}", localized.name);
        if let Some(kind) = &kind {
            println!("{kind} -> {}", localized.kind);
        }
    }
    Ok(())
}

async fn handle_browse(
    config: BrowserConfig,
    lookup: Arc<TranslationTables>,
    pages: usize,
    query: Option<String>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let mut browser = pokedex_rs::http_browser(&config, lookup)?;
    for _ in 0..cmp::max(1, pages) {
        if browser.trigger_next_page() == Trigger::Exhausted {
            break;
        }
        for event in browser.settle().await {
            if let BrowserEvent::PageFailed { url, reason } = event {
                return Err(format!("Failed to load {url}: {reason}").into());
            }
        }
    }
    if let Some(query) = query {
        browser.set_query(query);
    }

    let view = browser.view();
    if as_json {
        let payload = json!({
            "query": browser.store().query().as_str(),
            "total": browser.total(),
            "loaded": browser.store().len(),
            "exhausted": browser.is_exhausted(),
            "stats": browser.stats(),
            "entries": view,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_entry_table(&view);
        print_status(&browser);
    }
    Ok(())
}

enum ReplInput {
    Line(Option<String>),
    Completion(pokedex_rs::browser::Completion),
}

async fn handle_repl(
    config: BrowserConfig,
    lookup: Arc<TranslationTables>,
) -> Result<(), Box<dyn Error>> {
    let mut browser = pokedex_rs::http_browser(&config, lookup)?;
    let interactive = atty::is(Stream::Stdin) && atty::is(Stream::Stdout);
    if interactive {
        println!("Type to filter (empty line clears), :more loads the next page, :quit exits.");
    }
    browser.trigger_next_page();
    println!("now loading...");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let input = tokio::select! {
            line = lines.next_line() => ReplInput::Line(line?),
            Some(completion) = browser.recv_completion() => ReplInput::Completion(completion),
        };
        match input {
            ReplInput::Line(None) => break,
            ReplInput::Line(Some(line)) => match line.as_str() {
                ":quit" | ":q" => break,
                ":more" => match browser.trigger_next_page() {
                    Trigger::Started | Trigger::AlreadyLoading => println!("now loading..."),
                    Trigger::Exhausted => println!("No more entries to load."),
                },
                ":status" => print_status(&browser),
                query => {
                    browser.set_query(query);
                    print_entry_table(&browser.view());
                }
            },
            ReplInput::Completion(completion) => {
                match browser.apply(completion) {
                    BrowserEvent::PageFailed { reason, .. } => {
                        println!("Failed to load page ({reason}); :more retries.");
                    }
                    BrowserEvent::PageLoaded { references, .. } => {
                        println!("Fetching {references} entries...");
                    }
                    _ => {}
                }
                if browser.is_idle() {
                    print_entry_table(&browser.view());
                    print_status(&browser);
                }
            }
        }
    }
    Ok(())
}

#[cfg(feature = "web")]
async fn handle_serve(
    config: BrowserConfig,
    lookup: Arc<TranslationTables>,
    addr: SocketAddr,
) -> Result<(), Box<dyn Error>> {
    let browser = pokedex_rs::http_browser(&config, lookup)?;
    let handle = pokedex_rs::service::spawn(browser);
    pokedex_rs::web::serve(pokedex_rs::web::WebConfig { addr }, handle).await?;
    Ok(())
}

fn print_status<S, L>(browser: &CatalogBrowser<S, L>)
where
    S: CatalogSource,
    L: TranslationLookup + 'static,
{
    let store = browser.store();
    let loaded = match browser.total() {
        Some(total) => format!("{} of {total}", store.len()),
        None => store.len().to_string(),
    };
    let query = store.query().as_str();
    let filter = if query.is_empty() {
        String::new()
    } else {
        format!(", {} matching \"{query}\"", store.view_len())
    };
    let more = if browser.is_exhausted() {
        "end of catalog"
    } else {
        ":more for the next page"
    };
    println!("Loaded {loaded}{filter} ({more}).");
}

fn print_entry_table(rows: &[&CatalogEntry]) {
    if rows.is_empty() {
        println!("No entries to show.");
        return;
    }
    println!("{}", entry_table(rows));
}

fn entry_table(rows: &[&CatalogEntry]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "NAME", "名前", "TYPE", "タイプ"]);
    for entry in rows {
        table.add_row(vec![
            Cell::new(entry.id).set_alignment(CellAlignment::Right),
            Cell::new(&entry.name),
            Cell::new(&entry.localized_name),
            Cell::new(&entry.kind),
            Cell::new(&entry.localized_type),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use unicode_width::UnicodeWidthStr;

    fn entry(
        id: u32,
        name: &str,
        localized_name: &str,
        kind: &str,
        localized_type: &str,
    ) -> CatalogEntry {
        CatalogEntry {
            id,
            name: name.to_string(),
            image: None,
            icon_image: None,
            kind: kind.to_string(),
            localized_name: localized_name.to_string(),
            localized_type: localized_type.to_string(),
        }
    }

    #[test]
    fn table_columns_align_for_mixed_width_kana() {
        let rows = [
            entry(1, "bulbasaur", "フシギダネ", "grass", "くさ"),
            entry(25, "pikachu", "ﾋﾟｶﾁｭｳ", "electric", "でんき"),
            entry(132, "ditto", "メタモン", "normal", "ノーマル"),
        ];
        let refs: Vec<&CatalogEntry> = rows.iter().collect();
        let rendered = entry_table(&refs).to_string();
        let widths: Vec<usize> = rendered.lines().map(UnicodeWidthStr::width).collect();
        assert!(widths.len() > rows.len());
        assert!(widths.iter().all(|width| *width == widths[0]), "{rendered}");
        assert!(rendered.contains("ﾋﾟｶﾁｭｳ"));
    }
}
