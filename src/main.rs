use std::sync::Arc;

use clap::{Parser, Subcommand};

use wayfind::app::{ConsoleSurface, run_guidance};
use wayfind::config::Config;
use wayfind::directory::{Catalog, CategoryFilter, Location, filter_by_category, filter_by_text};
use wayfind::error::{AppError, AppResult};
use wayfind::geo::{Coordinates, distance_meters, format_distance};
use wayfind::navigation::{FixedPosition, NavigationOptions, NavigationSession, resolve_origin};
use wayfind::providers::{MapboxDirections, MapboxGeocoder};
use wayfind::route::RoutePlanner;
use wayfind::search::{SearchOptions, SearchSession, SearchStatus};

#[derive(Debug, Parser)]
#[command(name = "wayfind", version, about = "Find places on campus and walk there")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List directory entries.
    List {
        /// academic, administrative, facility or all.
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        filter: Option<String>,
    },
    /// Search the directory and the geocoder.
    Search {
        query: String,
        /// Proximity anchor as `lat,lon`.
        #[arg(long)]
        near: Option<Coordinates>,
    },
    /// Plan a walking route and follow it step by step.
    Navigate {
        destination: String,
        /// Start point as `lat,lon` or a directory id or name.
        #[arg(long)]
        from: Option<String>,
    },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        eprintln!("{}: {err}", err.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let config = Config::load()?;
    wayfind::logging::init_with_config(&config.logging);
    let catalog = Arc::new(Catalog::builtin());

    match cli.command {
        Command::List { category, filter } => {
            list(&catalog, category.as_deref(), filter.as_deref())
        }
        Command::Search { query, near } => search(&config, catalog, &query, near).await,
        Command::Navigate { destination, from } => {
            navigate(&config, catalog, &destination, from.as_deref()).await
        }
    }
}

fn list(catalog: &Catalog, category: Option<&str>, filter: Option<&str>) -> AppResult<()> {
    let category = match category {
        Some(raw) => CategoryFilter::parse(raw)
            .ok_or_else(|| AppError::invalid_argument(format!("unknown category: {raw}")))?,
        None => CategoryFilter::All,
    };
    let by_category = filter_by_category(catalog.locations(), category);
    let visible = filter_by_text(&by_category, filter.unwrap_or_default());

    if visible.is_empty() {
        println!("No results");
    }
    for location in &visible {
        println!("{}", describe(location));
    }
    Ok(())
}

async fn search(
    config: &Config,
    catalog: Arc<Catalog>,
    query: &str,
    near: Option<Coordinates>,
) -> AppResult<()> {
    let anchor = match near {
        Some(anchor) => anchor,
        None => config.search.anchor_coordinates()?,
    };
    let mut session = search_session(config, catalog)?;
    let results = session.search(query, anchor).await?;

    if session.status() == SearchStatus::Failed {
        eprintln!("Search is unavailable right now");
    }
    if results.is_empty() {
        println!("No results");
    }
    for location in results.iter() {
        let distance = distance_meters(anchor, location.coordinates);
        println!("{}  ({} away)", describe(location), format_distance(distance));
    }
    Ok(())
}

async fn navigate(
    config: &Config,
    catalog: Arc<Catalog>,
    destination: &str,
    from: Option<&str>,
) -> AppResult<()> {
    let manual_start = from.map(|raw| parse_start(&catalog, raw)).transpose()?;
    // A terminal has no location fix; only a manual start can supply the origin.
    let origin = resolve_origin(manual_start, &FixedPosition(None));

    let destination = match catalog.find(destination) {
        Some(location) => location.clone(),
        None => geocode_destination(config, Arc::clone(&catalog), destination).await?,
    };

    let directions = MapboxDirections::from_config(&config.provider)?;
    let options = NavigationOptions::from_config(&config.navigation);
    let surface = ConsoleSurface::stdout(options.walking_speed_m_per_min);
    let mut session = NavigationSession::new(RoutePlanner::new(Arc::new(directions)), options)
        .with_surface(Arc::new(surface));

    session.start(origin, &destination).await?;
    println!("Keys: n/Right next, p/Left previous, q/Esc stop");
    run_guidance(&mut session).await
}

fn search_session(config: &Config, catalog: Arc<Catalog>) -> AppResult<SearchSession> {
    let geocoder = MapboxGeocoder::from_config(&config.provider)?;
    Ok(SearchSession::new(
        catalog,
        Arc::new(geocoder),
        SearchOptions::from_config(&config.search),
    ))
}

async fn geocode_destination(
    config: &Config,
    catalog: Arc<Catalog>,
    query: &str,
) -> AppResult<Location> {
    let anchor = config.search.anchor_coordinates()?;
    let mut session = search_session(config, catalog)?;
    let results = session.search(query, anchor).await?;
    results
        .first()
        .cloned()
        .ok_or_else(|| AppError::invalid_argument(format!("no place matches {query:?}")))
}

fn parse_start(catalog: &Catalog, raw: &str) -> AppResult<Coordinates> {
    if let Ok(coordinates) = Coordinates::parse(raw) {
        return Ok(coordinates);
    }
    catalog
        .find(raw)
        .map(|location| location.coordinates)
        .ok_or_else(|| {
            AppError::invalid_argument(format!(
                "start point must be `lat,lon` or a directory entry: {raw}"
            ))
        })
}

fn describe(location: &Location) -> String {
    format!(
        "{:>6}  {:<32} {:<14} {}",
        location.id.as_str(),
        location.name,
        location.category.id(),
        location.kind
    )
}
