use anyhow::{bail, Context};
use clap::Parser;
use log::warn;

use deckview::map::Layer;
use deckview::{
    ApiClient, ApiConfig, MapConfig, MapSurface, Overlay, PageRequest, SceneSurface, TripId, TripList,
    TripListState, TripViewer,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse DeckBrain trips and render their tracks")]
struct Args {
    /// Core API base URL (default: $DECKBRAIN_API_URL or http://localhost:8000)
    #[arg(long)]
    api_url: Option<String>,

    /// Device whose trips are listed (default: $DECKBRAIN_DEFAULT_DEVICE_ID)
    #[arg(long)]
    device_id: Option<String>,

    /// Trip to render (default: first listed trip)
    #[arg(long)]
    trip: Option<TripId>,

    /// Also fetch the track of this tow
    #[arg(long)]
    tow: Option<i64>,

    /// Request the trip track without tow features
    #[arg(long)]
    no_tows: bool,

    /// Max number of trips to list
    #[arg(long)]
    limit: Option<u32>,

    /// Number of trips to skip
    #[arg(long)]
    offset: Option<u32>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let env_config = ApiConfig::from_env();
    let config = ApiConfig::new(
        args.api_url.as_deref().unwrap_or(&env_config.api_url),
        args.device_id
            .as_deref()
            .unwrap_or(&env_config.default_device_id),
    );
    let client = ApiClient::new(&config).context("invalid API configuration")?;

    let mut list = TripList::new(&config).with_page(PageRequest {
        limit: args.limit,
        offset: args.offset,
    });
    let state = list.load(&client).await.clone();
    match state {
        TripListState::Failed(message) => {
            let hint = list.hint().unwrap_or_default();
            bail!("{}\n{}", message, hint);
        }
        TripListState::Empty => {
            println!("No trips found for device {}", list.device_id());
            return Ok(());
        }
        TripListState::Loading | TripListState::Populated(_) => {}
    }

    let trip_id = match args.trip {
        Some(id) => id,
        None => list.trips().first().map(|t| t.id).context("no trips listed")?,
    };
    println!("Trips for {}:", list.device_id());
    for entry in list.entries(Some(trip_id)) {
        println!(
            "{} {:>6}  {:<24} {:<22} {:>7} {:>9}",
            if entry.selected { ">" } else { " " },
            entry.trip_id,
            entry.title,
            entry.started,
            entry.duration.unwrap_or_default(),
            entry.distance.unwrap_or_default(),
        );
    }

    let trip = list
        .select(trip_id)
        .with_context(|| format!("trip {} is not in the list", trip_id))?;

    match client.get_trip_detail(trip_id).await {
        Ok(detail) if !detail.tows.is_empty() => {
            println!("\nTows:");
            for tow in &detail.tows {
                println!(
                    "  #{} {} ({} m avg)",
                    tow.tow_number.map(i64::from).unwrap_or(tow.id),
                    tow.name.as_deref().unwrap_or(""),
                    tow.avg_depth_m
                        .map(|d| format!("{:.1}", d))
                        .unwrap_or_else(|| "?".to_string()),
                );
            }
        }
        Ok(_) => {}
        Err(e) => warn!("Trip detail unavailable: {}", e),
    }

    let mut viewer =
        TripViewer::new(client.clone(), MapConfig::default()).with_tows(!args.no_tows);
    viewer.mount(SceneSurface::default);
    viewer.select_trip(Some(trip));
    viewer.settle().await;

    if let Some(panel) = viewer.trip_panel() {
        println!("\n{}", panel.title);
        for line in [panel.duration, panel.distance].into_iter().flatten() {
            println!("  {}", line);
        }
    }

    match viewer.overlay() {
        Overlay::Error(message) => bail!(message),
        Overlay::Loading => bail!("track fetch did not complete"),
        Overlay::None => {}
    }

    if let Some(surface) = viewer.map().surface() {
        let viewport = surface.viewport();
        println!(
            "\nMap centered at ({:.4}, {:.4}) zoom {}",
            viewport.center.lat, viewport.center.lng, viewport.zoom
        );
        for (_, layer) in surface.layers() {
            match layer {
                Layer::Tiles(tiles) => println!("  tiles    {}", tiles.url_template),
                Layer::Polyline(line) => println!(
                    "  line     {} points, {}{}",
                    line.points.len(),
                    line.style.color,
                    line.popup
                        .as_ref()
                        .map(|p| format!(" \"{}\"", p.title))
                        .unwrap_or_default()
                ),
                Layer::CircleMarker(marker) => println!(
                    "  marker   ({:.4}, {:.4}) {}",
                    marker.position.lat, marker.position.lng, marker.style.fill_color
                ),
            }
        }
    }
    if let Some(report) = viewer.last_render() {
        for skipped in &report.skipped {
            println!("  skipped  {}", skipped);
        }
    }

    if let Some(tow_id) = args.tow {
        let tow_track = client
            .get_tow_track(trip_id, tow_id)
            .await
            .with_context(|| format!("tow {} of trip {}", tow_id, trip_id))?;
        let points: usize = tow_track.features.iter().map(|f| f.position_count()).sum();
        println!("\nTow {} track: {} features, {} points", tow_id, tow_track.len(), points);
    }

    Ok(())
}
