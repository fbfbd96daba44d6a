use std::rc::Rc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use drainage::config::{ApiConfig, NetworkStyles};
use drainage::http::HttpNetworkApi;
use drainage::interaction::InteractionController;
use drainage::notify::TracingSink;
use drainage::registry::{EntityRegistry, shared};
use drainage::selection::{SelectionCell, SelectionStore};
use drainage::sync::{ReloadReport, SyncOrchestrator};
use foundation::math::{Ecef, ecef_to_geodetic};
use scene::World;
use scene::input::InputEvent;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Loads a drainage network into an offscreen globe viewer")]
struct Args {
    /// Network API base URL (default: DRAINAGE_API_BASE or http://127.0.0.1:8080/swmm)
    #[arg(long)]
    api_base: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Boundary GeoJSON path relative to the API base
    #[arg(long)]
    boundary_path: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reload the network and print what was built
    Summary,

    /// Fly to an entity by name and print its attributes
    Locate {
        #[arg(long)]
        name: String,
    },

    /// Click a screen position and print the resulting selection
    Pick {
        #[arg(long)]
        x: f64,

        #[arg(long)]
        y: f64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = ApiConfig::from_env()?;
    if let Some(base) = args.api_base {
        config.base_url = base;
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(path) = args.boundary_path {
        config.boundary_path = path;
    }
    info!("loading network from {}", config.base_url);

    let registry = shared(EntityRegistry::new(World::new(), NetworkStyles::default()));
    let selection = Rc::new(SelectionCell::new());
    let notifier = Rc::new(TracingSink);
    let sync = SyncOrchestrator::new(
        registry.clone(),
        HttpNetworkApi::new(config)?,
        selection.clone(),
        notifier.clone(),
    );
    let mut controller = InteractionController::new(registry.clone(), selection.clone(), notifier);
    controller.start();

    let report = sync.reload().await?;

    match args.command.unwrap_or(Command::Summary) {
        Command::Summary => {
            print_report(&report);
            let frame = registry.borrow().host().resolve_frame();
            println!(
                "frame: {} points, {} lines, {} polygons",
                frame.points.len(),
                frame.lines.len(),
                frame.polygons.len()
            );
        }
        Command::Locate { name } => {
            let located = controller.locate(&name)?;
            let geo = ecef_to_geodetic(Ecef::from(located.focus));
            println!(
                "{} at lon {:.6} lat {:.6}",
                located.id,
                geo.lon_deg(),
                geo.lat_deg()
            );
            print_selection(selection.as_ref());
        }
        Command::Pick { x, y } => {
            controller.handle_input(InputEvent::click(x, y));
            print_selection(selection.as_ref());
        }
    }

    controller.stop();
    Ok(())
}

fn print_report(report: &ReloadReport) {
    println!(
        "junctions {}, outfalls {}, conduits {}, subcatchments {}, boundary overlays {}",
        report.junctions,
        report.outfalls,
        report.conduits,
        report.subcatchments,
        report.boundary_overlays
    );
    if !report.skipped_lines.is_empty() {
        println!("skipped conduits: {}", report.skipped_lines.join(", "));
    }
    if !report.skipped_polygons.is_empty() {
        println!("skipped subcatchments: {}", report.skipped_polygons.join(", "));
    }
}

fn print_selection(selection: &dyn SelectionStore) {
    let state = selection.state();
    match state.active {
        Some(active) => {
            println!("selected {}", active.id);
            for (key, value) in active.properties.iter() {
                println!("  {key}: {value}");
            }
        }
        None => match state.last_coordinate {
            Some(c) => println!(
                "nothing selected; clicked lon {:.6} lat {:.6} height {:.1}",
                c.lon, c.lat, c.height
            ),
            None => println!("nothing selected"),
        },
    }
}
