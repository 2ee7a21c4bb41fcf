mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands, TemplateAction};
use salute_app::{extract_names, Config, Runtime, NO_NAMES_FOUND};
use salute_page::{ClipboardWriter, FallbackClipboard, MemoryClipboard};
use salute_storage::Database;
use salute_template::{validate, Direction};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting salute");

    match cli.command {
        Commands::Template { action } => match action {
            TemplateAction::Show => show_template(config).await,
            TemplateAction::Set { text } => set_template(config, &text).await,
        },
        Commands::Extract { html_file } => {
            let html = read_page(&html_file)?;
            match extract_names(&html) {
                Ok(names) => names.iter().for_each(|name| println!("{}", name)),
                Err(notice) => println!("{}", notice),
            }
            Ok(())
        }
        Commands::Pick { name, page, rtl } => pick(config, name, page.as_deref(), rtl).await,
        Commands::Demo { pages, template } => demo(config, pages, &template).await,
    }
}

fn read_page(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

async fn show_template(config: Config) -> Result<()> {
    let runtime = Runtime::start(config).await?;
    let template = runtime.settings().load().await;
    println!("{}", template);
    if let Some(warning) = validate(template.as_str()) {
        eprintln!("warning: {}", warning);
    }
    runtime.shutdown().await;
    Ok(())
}

async fn set_template(config: Config, text: &str) -> Result<()> {
    let runtime = Runtime::start(config).await?;
    let outcome = runtime.settings().edit(text).await;
    runtime.shutdown().await;

    if let Some(warning) = outcome.warning {
        eprintln!("warning: {}", warning);
    }
    if outcome.template.is_empty() {
        bail!("The template is empty");
    }
    if !outcome.saved {
        bail!("Failed to save template");
    }
    println!("Template saved.");
    Ok(())
}

async fn pick(config: Config, name: Option<String>, page: Option<&Path>, rtl: bool) -> Result<()> {
    let html = page.map(read_page).transpose()?;

    let direction = match (&html, rtl) {
        (_, true) => Direction::Rtl,
        (Some(html), false) => Direction::resolve(
            salute_extract::document_dir(html).as_deref(),
            &salute_extract::visible_text(html),
        ),
        (None, false) => Direction::Ltr,
    };

    let name = match (name, &html) {
        (Some(name), _) => name,
        (None, Some(html)) => match extract_names(html) {
            Ok(names) => names.into_iter().next().context(NO_NAMES_FOUND)?,
            Err(notice) => bail!(notice),
        },
        (None, None) => bail!("Give a name or a page to take it from"),
    };

    let runtime = Runtime::start(config).await?;
    let page = runtime.open_page(direction, Arc::new(FallbackClipboard::system()));
    let selection = page
        .controller
        .select(name)
        .await
        .context("Page stopped before handling the selection")?;

    println!("{}", selection.message);
    let view = page.feedback.current();
    if let Some(status) = view.status_message() {
        eprintln!("{}: {}", view.name, status);
    }
    runtime.shutdown().await;
    Ok(())
}

/// Runs against an in-memory database so the real template is untouched.
async fn demo(config: Config, pages: usize, template: &str) -> Result<()> {
    let db = Database::open_in_memory().context("Failed to open in-memory database")?;
    let runtime = Runtime::with_backend(Arc::new(db), config).await;
    let settings = runtime.settings();
    let mut name_log = settings.name_log();

    let clipboard: Arc<dyn ClipboardWriter> = Arc::new(FallbackClipboard::new(
        Arc::new(MemoryClipboard::new()),
        None,
    ));
    let open: Vec<_> = (0..pages.max(1))
        .map(|_| runtime.open_page(Direction::Ltr, clipboard.clone()))
        .collect();

    for page in &open {
        if let Some(selection) = page.controller.select("Maria").await {
            println!("{} before: {}", page.id, selection.message);
        }
    }

    let outcome = settings.edit(template).await;
    if let Some(warning) = outcome.warning {
        eprintln!("warning: {}", warning);
    }
    match outcome.relayed {
        Some(Ok(ack)) => println!("Coordinator: {:?}", ack),
        Some(Err(e)) => println!("Coordinator unreachable: {}", e),
        None => println!("Empty template ignored"),
    }

    for page in &open {
        if let Some(selection) = page.controller.select("Maria").await {
            println!("{} after:  {}", page.id, selection.message);
        }
    }

    let mut clicks = 0;
    while name_log.try_recv().is_ok() {
        clicks += 1;
    }
    println!("{} name clicks observed", clicks);

    drop(settings);
    runtime.shutdown().await;
    Ok(())
}
