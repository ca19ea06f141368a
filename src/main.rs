use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use property_scout::config::Config;
use property_scout::display::compute_display_list;
use property_scout::filters::{AccessSelector, FilterSpec, KindSelector};
use property_scout::geolocation::{resolve_viewer_location, FixedLocation, NoGeolocation};
use property_scout::listings::{JsonFileCatalog, ListingSource, PlaceholderCatalog};
use property_scout::models::{Coordinates, Feature, ListingKind};
use property_scout::validation::{PhotoData, ValidationInput};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "property-scout", about = "Browse listings and check upload locations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Filter listings and order them by distance
    List(ListArgs),
    /// Check that a photo matches its coordinates
    Validate(ValidateArgs),
}

#[derive(Args)]
struct ListArgs {
    /// JSON file with an array of listings (built-in catalog if omitted)
    #[arg(long)]
    listings: Option<PathBuf>,
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long, default_value = "")]
    min_price: String,
    #[arg(long, default_value = "")]
    max_price: String,
    /// sale or rent
    #[arg(long)]
    kind: Option<ListingKind>,
    #[arg(long, default_value = "")]
    bedrooms: String,
    #[arg(long, default_value = "")]
    bathrooms: String,
    #[arg(long)]
    garage: bool,
    #[arg(long)]
    negotiable: bool,
    /// vehicle or narrow_way
    #[arg(long, value_parser = parse_access)]
    accessibility: Option<AccessSelector>,
    #[arg(long)]
    water: bool,
    #[arg(long)]
    electricity: bool,
    /// Required amenity, e.g. "Pet Friendly" (repeatable)
    #[arg(long = "feature")]
    features: Vec<Feature>,
    /// Address must contain this text
    #[arg(long, default_value = "")]
    location: String,
    /// Viewer position as LAT,LNG
    #[arg(long, value_parser = parse_coordinates, allow_hyphen_values = true)]
    near: Option<Coordinates>,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ValidateArgs {
    #[arg(long)]
    photo: PathBuf,
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,
}

fn parse_access(raw: &str) -> Result<AccessSelector, String> {
    match raw.trim().to_lowercase().as_str() {
        "any" => Ok(AccessSelector::Any),
        "vehicle" => Ok(AccessSelector::Vehicle),
        "narrow_way" | "narrow-way" => Ok(AccessSelector::NarrowWay),
        other => Err(format!("unknown accessibility '{other}'")),
    }
}

fn parse_coordinates(raw: &str) -> Result<Coordinates, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| "expected LAT,LNG".to_string())?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("latitude: {e}"))?;
    let lng: f64 = lng.trim().parse().map_err(|e| format!("longitude: {e}"))?;
    Ok(Coordinates::new(lat, lng))
}

impl ListArgs {
    fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            min_price: self.min_price.clone(),
            max_price: self.max_price.clone(),
            listing_type: self.kind.map(KindSelector::from).unwrap_or_default(),
            bedrooms: self.bedrooms.clone(),
            bathrooms: self.bathrooms.clone(),
            garage: self.garage,
            negotiable: self.negotiable,
            accessibility: self.accessibility.unwrap_or_default(),
            water: self.water,
            electricity: self.electricity,
            selected_features: self.features.iter().copied().collect(),
            location: self.location.clone(),
        }
    }
}

async fn run_list(args: ListArgs) -> Result<()> {
    let source: Box<dyn ListingSource> = match &args.listings {
        Some(path) => Box::new(JsonFileCatalog::new(path)),
        None => Box::new(PlaceholderCatalog),
    };
    let all = source.fetch().await?;
    info!("Loaded {} listings from {}", all.len(), source.source_name());

    let viewer = match args.near {
        Some(here) => resolve_viewer_location(&FixedLocation(here)).await,
        None => resolve_viewer_location(&NoGeolocation).await,
    };

    let list = compute_display_list(&all, &args.filter_spec(), &args.search, &viewer);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    println!("{}", list.status.label());
    println!();

    if list.is_empty() {
        println!("No properties match your current search or filters.");
        return Ok(());
    }

    for (i, entry) in list.entries.iter().enumerate() {
        let listing = &entry.listing;
        println!("{}. {} ({})", i + 1, listing.title, listing.price_label());
        println!("   {}", listing.address);
        println!(
            "   {} bd, {} ba, {} sq ft, for {}",
            listing.bedrooms, listing.bathrooms, listing.area, listing.kind
        );
        if let Some(km) = entry.distance_km {
            println!("   {:.1} km away", km);
        }
        if !listing.features.is_empty() {
            let features: Vec<&str> = listing.features.iter().map(|f| f.as_str()).collect();
            println!("   Features: {}", features.join(", "));
        }
        println!("   ID: {}", listing.id);
        println!();
    }

    let map = list.map_view(None);
    println!(
        "Map: {} markers centered on {} (zoom {})",
        map.markers.len(),
        map.center,
        map.zoom
    );

    Ok(())
}

async fn run_validate(args: ValidateArgs) -> Result<()> {
    let config = Config::from_env();
    let validator = config.location_validator();
    if !validator.is_available() {
        bail!("AI location validation is unavailable: set GOOGLE_API_KEY");
    }

    let photo = PhotoData::load(&args.photo).await?;
    let input = ValidationInput::new(photo.to_data_uri(), Coordinates::new(args.lat, args.lng));

    info!("Validating {} at {}, {}", args.photo.display(), args.lat, args.lng);
    let result = validator.validate(&input).await;

    if result.is_valid_location {
        println!("✅ Location validated: {}", result.formatted_address);
    } else {
        println!("❌ Location validation issue: {}", result.formatted_address);
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to encode result")?
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::List(args) => run_list(args).await,
        Command::Validate(args) => run_validate(args).await,
    }
}
