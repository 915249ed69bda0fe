use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vocab::export::EXPORT_FILENAME;
use vocab::persist::FileStorage;
use vocab::sources::source_for;
use vocab::store::ALL;
use vocab::study::{run_session, StudySession};
use vocab::{App, Config, ContentMode, SortKey, Theme, UiLanguage, VocabEntry};

#[derive(Parser, Debug)]
#[command(about = "Bilingual vocabulary deck")]
struct Args {
    /// Directory for persisted state
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Default CSV source (path, URL or `builtin`)
    #[arg(long, global = true)]
    source: Option<String>,
    /// Enable import, export and reset
    #[arg(long, global = true, default_value = "false")]
    admin: bool,
    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(clap::Args, Debug, Default)]
struct Filters {
    /// Free-text search
    #[arg(short, long, default_value = "")]
    query: String,
    #[arg(short, long, default_value = ALL)]
    category: String,
    #[arg(short, long, default_value = ALL)]
    tag: String,
    /// Overrides the saved sort preference
    #[arg(short, long, value_enum)]
    sort: Option<SortKey>,
    /// Only favorited entries
    #[arg(short, long, default_value = "false")]
    favorites: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List entries matching the filters
    List(Filters),
    /// Show one entry in full
    Show { id: String },
    /// List categories
    Categories,
    /// List tags
    Tags,
    /// Toggle an entry's favorite flag
    Fav { id: String },
    /// Flashcard session over the filtered entries
    Study(Filters),
    /// Replace the collection from a CSV/JSON file or URL
    Import { location: String },
    /// Write the collection as CSV
    Export { path: Option<PathBuf> },
    /// Show or change preferences
    Prefs {
        #[arg(long, value_enum)]
        theme: Option<Theme>,
        #[arg(long, value_enum)]
        ui_language: Option<UiLanguage>,
        #[arg(long, value_enum)]
        content: Option<ContentMode>,
        #[arg(long, value_enum)]
        sort: Option<SortKey>,
    },
    /// Forget the stored collection and reload the default source
    Reset,
}

fn apply_filters(app: &mut App, filters: Filters) {
    let query = &mut app.store.query;
    query.query = filters.query;
    query.category = filters.category;
    query.tag = filters.tag;
    query.favorites_only = filters.favorites;
    query.sort = filters.sort.unwrap_or(app.prefs.sort);
}

fn print_entry(out: &mut impl Write, app: &App, entry: &VocabEntry) -> io::Result<()> {
    let mode = app.prefs.content_mode;
    let star = if app.favorites.is_favorite(entry) { "★" } else { " " };
    writeln!(out, "{star} {:<28} {}", entry.id, mode.title(entry))?;
    writeln!(out, "    {}", mode.definition(entry))
}

fn print_details(out: &mut impl Write, entry: &VocabEntry) -> io::Result<()> {
    let fields = [
        ("中文", &entry.title_zh),
        ("English", &entry.title_en),
        ("释义", &entry.def_zh),
        ("Definition", &entry.def_en),
        ("Category", &entry.category),
        ("Example", &entry.example),
        ("Details", &entry.details),
    ];
    writeln!(out, "{}", entry.id)?;
    for (label, value) in fields {
        if let Some(value) = value {
            writeln!(out, "  {label:<10} {value}")?;
        }
    }
    if !entry.tags.is_empty() {
        writeln!(out, "  {:<10} {}", "Tags", entry.tags.join(", "))?;
    }
    for image in &entry.images {
        writeln!(out, "  {:<10} {image}", "Image")?;
    }
    if let Some(frequency) = entry.frequency {
        writeln!(out, "  {:<10} {frequency}", "Frequency")?;
    }
    Ok(())
}

fn require_admin(app: &App, action: &str) -> Result<()> {
    if !app.config.admin {
        bail!("{action} needs admin mode (--admin or VOCAB_ADMIN=1)");
    }
    Ok(())
}

fn run(mut app: App, command: Cmd) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Cmd::List(filters) => {
            apply_filters(&mut app, filters);
            let view = app.view();
            for entry in &view {
                print_entry(&mut out, &app, entry)?;
            }
            writeln!(out, "{} of {} entries", view.len(), app.store.len())?;
        }
        Cmd::Show { id } => {
            let entry = app
                .store
                .get(&id)
                .with_context(|| format!("No entry with id {id}"))?;
            print_details(&mut out, entry)?;
        }
        Cmd::Categories => {
            for category in app.store.categories() {
                writeln!(out, "{category}")?;
            }
        }
        Cmd::Tags => {
            for tag in app.store.tags() {
                writeln!(out, "{tag}")?;
            }
        }
        Cmd::Fav { id } => {
            if app.store.get(&id).is_none() {
                tracing::warn!(%id, "toggling favorite for an id not in the collection");
            }
            let now = app.toggle_favorite(&id).context("Failed to save favorites")?;
            writeln!(out, "{id} {}", if now { "favorited" } else { "unfavorited" })?;
        }
        Cmd::Study(filters) => {
            apply_filters(&mut app, filters);
            let deck = app.store.study_deck(app.view());
            let mut session = StudySession::new(deck)?;
            writeln!(
                out,
                "Starting session with {} cards. Type '\\h' for commands.",
                session.len()
            )?;
            let stdin = io::stdin();
            let answered = run_session(
                &mut session,
                &mut stdin.lock(),
                &mut out,
                app.prefs.content_mode,
                &mut app.favorites,
                app.storage.as_ref(),
            )?;
            writeln!(out, "Reviewed {answered} cards.")?;
        }
        Cmd::Import { location } => {
            require_admin(&app, "import")?;
            let source = source_for(&location);
            let count = app
                .import(source.as_ref())
                .with_context(|| format!("Failed to import {location}; collection unchanged"))?;
            writeln!(out, "Imported {count} entries from {}", source.name())?;
        }
        Cmd::Export { path } => {
            require_admin(&app, "export")?;
            let path = path.unwrap_or_else(|| PathBuf::from(EXPORT_FILENAME));
            let csv = app.export().context("Failed to serialize collection")?;
            fs::write(&path, csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            writeln!(out, "Exported {} entries to {}", app.store.len(), path.display())?;
        }
        Cmd::Prefs {
            theme,
            ui_language,
            content,
            sort,
        } => {
            if theme.is_some() || ui_language.is_some() || content.is_some() || sort.is_some() {
                app.prefs
                    .update(app.storage.as_ref(), |p| {
                        if let Some(theme) = theme {
                            p.theme = theme;
                        }
                        if let Some(lang) = ui_language {
                            p.ui_language = lang;
                        }
                        if let Some(content) = content {
                            p.content_mode = content;
                        }
                        if let Some(sort) = sort {
                            p.sort = sort;
                        }
                    })
                    .context("Failed to save preferences")?;
            }
            let json = serde_json::to_string_pretty(&app.prefs)?;
            writeln!(out, "{json}")?;
        }
        Cmd::Reset => {
            require_admin(&app, "reset")?;
            app.reset().context("Failed to reload default source")?;
            if let Some(notice) = &app.notice {
                eprintln!("{notice}");
            }
            writeln!(out, "Collection reset to {} entries", app.store.len())?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::new();
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(source) = args.source {
        config.default_source = source;
    }
    config.admin |= args.admin;

    let storage = Box::new(FileStorage::new(config.data_dir.clone()));
    let app = App::open(config, storage).context("Failed to load vocabulary")?;
    if let Some(notice) = &app.notice {
        eprintln!("{notice}");
    }

    let command = args.command.unwrap_or(Cmd::List(Filters {
        category: ALL.to_string(),
        tag: ALL.to_string(),
        ..Filters::default()
    }));
    run(app, command)
}
