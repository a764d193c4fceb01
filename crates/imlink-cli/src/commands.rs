//! Command handlers.

use std::path::{Path, PathBuf};

use imlink_bookmarks::{ImportSession, Progress};
use imlink_core::{
    darker_color, export_to_file, import_json, normalize_tag_title, pastelize, validate_title,
    ImlinkConfig, ImlinkError, Link, LinkPatch, LinkStore, NewLink, Result, SqliteLinkStore,
    StoreError, Tag, TagId, EXPORT_FILE_NAME,
};
use tracing::{debug, info, warn};

use crate::{AddArgs, BookmarksArgs, Cli, Commands, SearchArgs, TagCommand, UpdateArgs};

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    // Pure computations need no database.
    if let Commands::Color { hex, darker } = &cli.command {
        return color(hex, *darker);
    }

    let store = open_store(&config, cli.db.as_deref())?;
    match cli.command {
        Commands::Add(args) => add(&store, &config, args),
        Commands::Update(args) => update(&store, &config, args),
        Commands::List => {
            let links = store.get_all_links()?;
            print_links(&store, &links)
        }
        Commands::Delete { id } => {
            store.delete_link(id)?;
            println!("Deleted link {}", id);
            Ok(())
        }
        Commands::Search(args) => search(&store, args),
        Commands::Tag(cmd) => tag(&store, cmd),
        Commands::Export { out } => {
            let path = out.unwrap_or_else(|| PathBuf::from(EXPORT_FILE_NAME));
            export_to_file(&store, &path)?;
            println!("Exported to {}", path.display());
            Ok(())
        }
        Commands::Import { file } => import(&store, &file),
        Commands::Bookmarks(args) => bookmarks(&store, &config, args),
        Commands::Color { .. } => Ok(()),
    }
}

fn load_config(path: Option<&Path>) -> Result<ImlinkConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match ImlinkConfig::default_path() {
            Some(p) => p,
            None => return Ok(ImlinkConfig::default()),
        },
    };
    let config = ImlinkConfig::load(&path)?;
    debug!(path = %path.display(), app_name = %config.app_name, "loaded config");
    Ok(config)
}

fn open_store(config: &ImlinkConfig, db: Option<&Path>) -> Result<SqliteLinkStore> {
    let store = match db {
        Some(path) => SqliteLinkStore::open(path)?,
        None => SqliteLinkStore::open_named(&config.data_dir(), &config.app_name)?,
    };
    Ok(store)
}

/// Map `--tag` values to tag ids. A value matching a tag id is used as is;
/// otherwise it is looked up by (normalized) title.
pub(crate) fn resolve_tags<S: LinkStore + ?Sized>(
    store: &S,
    values: &[String],
) -> Result<Vec<TagId>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let tags = store.get_all_tags()?;
    values
        .iter()
        .map(|value| {
            let title = normalize_tag_title(value);
            tags.iter()
                .find(|t| t.id == *value)
                .or_else(|| tags.iter().find(|t| t.title == title))
                .map(|t| t.id.clone())
                .ok_or_else(|| ImlinkError::from(StoreError::NotFound(format!("tag {}", value))))
        })
        .collect()
}

fn add<S: LinkStore>(store: &S, config: &ImlinkConfig, args: AddArgs) -> Result<()> {
    let color = pastelize(args.color.as_deref().unwrap_or(&config.default_color))?;
    let tags = resolve_tags(store, &args.tags)?;
    let link = NewLink::new(args.title.trim(), args.url.trim())
        .with_description(args.description)
        .with_color(color)
        .with_tags(tags);
    link.validate(config.title_max_len)?;

    let id = store.add_link(link)?;
    println!("Added link {}", id);
    Ok(())
}

fn update<S: LinkStore>(store: &S, config: &ImlinkConfig, args: UpdateArgs) -> Result<()> {
    let tags = if args.clear_tags {
        Some(Vec::new())
    } else if args.tags.is_empty() {
        None
    } else {
        Some(resolve_tags(store, &args.tags)?)
    };
    let patch = LinkPatch {
        title: args.title.map(|t| t.trim().to_string()),
        description: args.description,
        url: args.url.map(|u| u.trim().to_string()),
        color: args.color.as_deref().map(pastelize).transpose()?,
        tags,
    };
    if patch.is_empty() {
        println!("Nothing to update");
        return Ok(());
    }
    if let Some(title) = &patch.title {
        validate_title(title, config.title_max_len)?;
    }

    store.update_link(args.id, patch)?;
    println!("Updated link {}", args.id);
    Ok(())
}

fn search<S: LinkStore>(store: &S, args: SearchArgs) -> Result<()> {
    let tag_ids = resolve_tags(store, &args.tags)?;
    let links = store.search_links(&args.query, &tag_ids)?;
    debug!(query = %args.query, tags = tag_ids.len(), hits = links.len(), "search");
    print_links(store, &links)
}

fn tag<S: LinkStore>(store: &S, cmd: TagCommand) -> Result<()> {
    match cmd {
        TagCommand::Add { title } => {
            let id = store.add_tag(&title)?;
            println!("Added tag {} ({})", normalize_tag_title(&title), id);
        }
        TagCommand::Rename { id, title } => {
            store.update_tag(&id, &title)?;
            println!("Renamed tag {}", id);
        }
        TagCommand::Delete { id } => {
            store.delete_tag(&id)?;
            println!("Deleted tag {}", id);
        }
        TagCommand::List => {
            for Tag { id, title, .. } in store.get_all_tags()? {
                println!("{}  {}", id, title);
            }
        }
    }
    Ok(())
}

fn import<S: LinkStore>(store: &S, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)?;
    let report = import_json(store, &json)?;

    println!(
        "Imported {} links and {} tags",
        report.links_imported, report.tags_imported
    );
    for failure in &report.failures {
        if failure.duplicate_url {
            eprintln!("warning: {} #{} skipped: {}", failure.kind, failure.index, failure.reason);
        } else {
            eprintln!("error: {} #{} failed: {}", failure.kind, failure.index, failure.reason);
        }
    }
    Ok(())
}

fn bookmarks<S: LinkStore>(store: &S, config: &ImlinkConfig, args: BookmarksArgs) -> Result<()> {
    let html = std::fs::read_to_string(&args.file)?;
    let mut session =
        ImportSession::from_document(&html).map_err(|e| ImlinkError::Parse(e.to_string()))?;

    if !args.save {
        for staged in session.staged() {
            println!("{}  {}", staged.bookmark.title, staged.bookmark.url);
        }
        println!("{} bookmarks", session.staged().len());
        return Ok(());
    }

    let tags = resolve_tags(store, &args.tags)?;
    session.set_color(args.color.as_deref().unwrap_or(&config.default_color))?;
    if !session.start() {
        println!("No bookmarks to import");
        return Ok(());
    }

    loop {
        session.set_description(args.description.clone().unwrap_or_default());
        session.set_tags(tags.clone());
        let progress = match session.save_current(store) {
            Ok(progress) => progress,
            Err(e) if e.is_duplicate_url() => {
                warn!("Skipping bookmark: {}", e);
                eprintln!("warning: {}", e);
                session.skip()
            }
            Err(e) => return Err(e.into()),
        };
        if let Progress::Finished { saved, skipped } = progress {
            info!(saved, skipped, "bookmarks imported");
            println!("Saved {} bookmarks, skipped {}", saved, skipped);
            return Ok(());
        }
    }
}

fn color(hex: &str, darker: Option<f64>) -> Result<()> {
    let pastel = pastelize(hex)?;
    println!("{}", pastel);
    if let Some(factor) = darker {
        println!("{}", darker_color(&pastel, factor));
    }
    Ok(())
}

fn print_links<S: LinkStore>(store: &S, links: &[Link]) -> Result<()> {
    for link in links {
        let tags: Vec<String> = store
            .get_tags_by_ids(&link.tags)?
            .into_iter()
            .map(|t| t.title)
            .collect();
        println!("{:>4}  {}  <{}>", link.id, link.title, link.url);
        if !link.description.is_empty() {
            println!("      {}", link.description);
        }
        if !tags.is_empty() {
            println!("      [{}]", tags.join(", "));
        }
    }
    println!("{} links", links.len());
    Ok(())
}
