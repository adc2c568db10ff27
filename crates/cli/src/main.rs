use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::Level;

use dashwire_api::{ApiClient, ResponseCache};
use dashwire_engine::{auto_format, extract_fields, get_nested_value};
use dashwire_registry::TemplateCatalog;
use dashwire_types::{DisplayMode, FormatHint, SelectedField, Theme, Widget};
use dashwire_util::DashboardStore;

mod render;

#[derive(Parser)]
#[command(name = "dashwire", version, about = "Wire JSON APIs into terminal dashboard widgets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Flatten a sample document into its selectable field catalog
    Fields {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Resolve one field path against a document
    Get {
        path: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        /// Formatting hint: auto, currency, percentage, number, date
        #[arg(long, default_value = "auto")]
        format: String,
    },
    /// Manage dashboard widgets
    Widget {
        #[command(subcommand)]
        command: WidgetCommand,
    },
    /// Browse and apply built-in dashboard templates
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },
    /// Export, import, or inspect the dashboard configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Fetch every widget once and render the dashboard
    Render,
    /// Render repeatedly on the widgets' refresh cadence until interrupted
    Watch,
}

#[derive(Subcommand)]
enum WidgetCommand {
    /// Add a widget, selecting fields from the endpoint's live catalog
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        /// Display mode: card, table, chart
        #[arg(long, default_value = "card")]
        mode: String,
        /// Refresh period in seconds
        #[arg(long)]
        refresh: Option<u64>,
        /// Field path to select (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,
    },
    /// List configured widgets
    List,
    /// Remove a widget by id
    Remove { id: String },
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// List the built-in templates
    List,
    /// Append a template's widgets to the dashboard
    Apply { id: String },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print or write the configuration as shareable JSON
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace the configuration from an exported document
    Import { path: PathBuf },
    /// Print the configuration file location
    Path,
    /// Set the dashboard theme: light, dark
    Theme { value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Fields { url, file } => cmd_fields(url, file).await,
        Command::Get { path, url, file, format } => cmd_get(path, url, file, &format).await,
        Command::Widget { command } => cmd_widget(command).await,
        Command::Template { command } => cmd_template(command),
        Command::Config { command } => cmd_config(command),
        Command::Render => cmd_render().await,
        Command::Watch => cmd_watch().await,
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .try_init();
}

/// Fetch a document from a URL or read it from a local file.
async fn load_document(url: Option<String>, file: Option<PathBuf>) -> Result<Value> {
    match (url, file) {
        (Some(url), None) => {
            let client = ApiClient::new()?;
            let outcome = client.test_connection(&url).await;
            match outcome.data {
                Some(data) => Ok(data),
                None => bail!(outcome.message),
            }
        }
        (None, Some(path)) => {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&content).with_context(|| format!("parse {} as JSON", path.display()))
        }
        _ => bail!("provide exactly one of --url or --file"),
    }
}

async fn cmd_fields(url: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let doc = load_document(url, file).await?;
    let fields = extract_fields(&doc, "");
    if fields.is_empty() {
        println!("No selectable fields in the response.");
        return Ok(());
    }

    let path_width = fields.iter().map(|field| field.path.len()).max().unwrap_or(4).max(4);
    println!("{:<path_width$}  {:<7}  VALUE", "PATH", "TYPE");
    for field in &fields {
        println!(
            "{:<path_width$}  {:<7}  {}",
            field.path,
            field.kind.to_string(),
            preview(&field.value)
        );
    }
    println!("\n{} fields", fields.len());
    Ok(())
}

/// One-line preview of a leaf value for the catalog listing.
fn preview(value: &Value) -> String {
    let text = match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > 60 {
        format!("{}...", text.chars().take(60).collect::<String>())
    } else {
        text
    }
}

async fn cmd_get(path: String, url: Option<String>, file: Option<PathBuf>, format: &str) -> Result<()> {
    let hint = parse_format(format)?;
    let doc = load_document(url, file).await?;

    match get_nested_value(&doc, &path) {
        Some(value) if value.is_object() || value.is_array() => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Some(value) => println!("{}", auto_format(value, hint)),
        None => println!("N/A"),
    }
    Ok(())
}

async fn cmd_widget(command: WidgetCommand) -> Result<()> {
    let store = DashboardStore::new()?;
    match command {
        WidgetCommand::Add {
            name,
            url,
            mode,
            refresh,
            fields,
        } => {
            let display_mode = parse_mode(&mode)?;
            let doc = load_document(Some(url.clone()), None).await?;
            let catalog = extract_fields(&doc, "");

            let mut selected_fields = Vec::with_capacity(fields.len());
            for requested in &fields {
                let Some(descriptor) = catalog.iter().find(|field| &field.path == requested) else {
                    bail!(
                        "field '{requested}' not found in the response; run `dashwire fields --url {url}` to list available paths"
                    );
                };
                selected_fields.push(SelectedField {
                    path: descriptor.path.clone(),
                    kind: descriptor.kind,
                    value: descriptor.value.clone(),
                    label: None,
                    format: None,
                });
            }

            let id = store.add_widget(Widget {
                id: String::new(),
                name,
                api_url: url,
                refresh_interval: refresh,
                display_mode,
                selected_fields,
                cache_max_age: None,
                created_at: None,
            })?;
            println!("Added widget {id}");
        }
        WidgetCommand::List => {
            let widgets = store.widgets();
            if widgets.is_empty() {
                println!("No widgets configured. Add one with `dashwire widget add` or `dashwire template apply`.");
                return Ok(());
            }
            for widget in widgets {
                println!(
                    "{}  {:<5}  {} ({} fields)\n    {}",
                    widget.id,
                    mode_label(widget.display_mode),
                    widget.name,
                    widget.selected_fields.len(),
                    widget.api_url
                );
            }
        }
        WidgetCommand::Remove { id } => {
            if store.remove_widget(&id)? {
                println!("Removed widget {id}");
            } else {
                bail!("no widget with id {id}");
            }
        }
    }
    Ok(())
}

fn cmd_template(command: TemplateCommand) -> Result<()> {
    let catalog = TemplateCatalog::from_embedded()?;
    match command {
        TemplateCommand::List => {
            for template in &catalog.templates {
                println!(
                    "{:<24}  {} — {} ({} widgets)",
                    template.id,
                    template.name,
                    template.description,
                    template.widgets.len()
                );
            }
        }
        TemplateCommand::Apply { id } => {
            let Some(template) = catalog.template_by_id(&id) else {
                bail!("no template with id {id}; run `dashwire template list`");
            };
            let store = DashboardStore::new()?;
            for widget in &template.widgets {
                let assigned = store.add_widget(widget.clone())?;
                println!("Added widget {assigned}: {}", widget.name);
            }
        }
    }
    Ok(())
}

fn cmd_config(command: ConfigCommand) -> Result<()> {
    let store = DashboardStore::new()?;
    match command {
        ConfigCommand::Export { out } => {
            let exported = store.export_config()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, exported).with_context(|| format!("write {}", path.display()))?;
                    println!("Exported configuration to {}", path.display());
                }
                None => println!("{exported}"),
            }
        }
        ConfigCommand::Import { path } => {
            let content = std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
            store.import_config(&content)?;
            println!("Imported {} widgets", store.widgets().len());
        }
        ConfigCommand::Path => println!("{}", store.path().display()),
        ConfigCommand::Theme { value } => {
            let theme = match value.as_str() {
                "light" => Theme::Light,
                "dark" => Theme::Dark,
                other => bail!("unknown theme '{other}'; expected light or dark"),
            };
            store.set_theme(theme)?;
            println!("Theme set to {value}");
        }
    }
    Ok(())
}

async fn cmd_render() -> Result<()> {
    let store = DashboardStore::new()?;
    let client = ApiClient::new()?;
    let cache = ResponseCache::new();
    render_dashboard(&store, &client, &cache).await;
    Ok(())
}

async fn cmd_watch() -> Result<()> {
    let store = DashboardStore::new()?;
    let client = ApiClient::new()?;
    let cache = ResponseCache::new();

    loop {
        render_dashboard(&store, &client, &cache).await;

        let period = store
            .widgets()
            .iter()
            .filter_map(|widget| widget.refresh_interval)
            .min()
            .unwrap_or(60);
        println!("-- refreshing in {period}s (ctrl-c to stop) --");

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(period)) => {}
            _ = tokio::signal::ctrl_c() => {
                println!("stopped");
                return Ok(());
            }
        }
    }
}

async fn render_dashboard(store: &DashboardStore, client: &ApiClient, cache: &ResponseCache) {
    let widgets = store.widgets();
    if widgets.is_empty() {
        println!("No widgets configured. Add one with `dashwire widget add` or `dashwire template apply`.");
        return;
    }

    for widget in &widgets {
        println!("{}  [{}]", widget.name, mode_label(widget.display_mode));
        let max_age = Duration::from_millis(widget.cache_max_age_ms());
        match client.fetch(&widget.api_url, cache, max_age).await {
            Ok(doc) => print!("{}", render::render_widget(widget, &doc)),
            Err(error) => println!("  Error loading data: {error}"),
        }
        println!();
    }
}

fn parse_format(text: &str) -> Result<FormatHint> {
    Ok(match text {
        "auto" => FormatHint::Auto,
        "currency" => FormatHint::Currency,
        "percentage" => FormatHint::Percentage,
        "number" => FormatHint::Number,
        "date" => FormatHint::Date,
        other => bail!("unknown format '{other}'; expected auto, currency, percentage, number, or date"),
    })
}

fn parse_mode(text: &str) -> Result<DisplayMode> {
    Ok(match text {
        "card" => DisplayMode::Card,
        "table" => DisplayMode::Table,
        "chart" => DisplayMode::Chart,
        other => bail!("unknown display mode '{other}'; expected card, table, or chart"),
    })
}

fn mode_label(mode: DisplayMode) -> &'static str {
    match mode {
        DisplayMode::Card => "card",
        DisplayMode::Table => "table",
        DisplayMode::Chart => "chart",
    }
}
