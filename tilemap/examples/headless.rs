//! This example resolves a place name with Nominatim, loads the tiles covering it into an
//! in-memory surface and prints what the map would draw.
//!
//! ```text
//! cargo run --example headless -- Bremen ocm
//! ```

use tilemap::geocoder::{Geocoder, NominatimGeocoder};
use tilemap::render::{MemorySurface, SurfaceItem};
use tilemap::{PassStatus, TileMapBuilder, TileMapConfig};

#[tokio::main]
async fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let place = args.next().unwrap_or_else(|| "Bremen".to_string());
    let style = args.next().unwrap_or_else(|| "osm".to_string());

    if let Err(err) = run(&place, &style).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run(place: &str, style: &str) -> Result<(), tilemap::error::TileMapError> {
    let config = TileMapConfig::default();
    let geocoder = NominatimGeocoder::new(&config.user_agent)?;
    let bbox = geocoder.resolve_place(place).await?;
    println!("{place}: {bbox:?}");

    let surface = MemorySurface::new();
    surface.add_user_content("place marker");

    let mut map = TileMapBuilder::new(config)
        .with_bounding_box(bbox)
        .build(surface.clone())?;
    let report = map.set_style(style)?.wait().await?;

    println!(
        "pass {} at zoom {}: {} tiles loaded, {} unavailable",
        report.pass,
        report.zoom,
        report.fetched,
        report.failed.len()
    );
    if let PassStatus::Aborted(reason) = &report.status {
        println!("pass aborted: {reason}");
    }

    for item in surface.stack() {
        match item {
            SurfaceItem::Tile(key, band) => println!("  {key} ({band:?})"),
            SurfaceItem::UserContent(name) => println!("  <{name}>"),
        }
    }

    Ok(())
}
