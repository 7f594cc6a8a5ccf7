use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Geoflow - Terrain profiles and map prints from remote geoprocessing services
#[derive(Parser, Debug)]
#[command(name = "geoflow")]
#[command(about = "Terrain profiles and map prints from remote geoprocessing services", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./geoflow.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Status poll interval in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract a terrain or elevation profile along a line
    Profile(ProfileArgs),

    /// Render the current view through the print service
    Print(PrintArgs),

    /// Convert between view resolution and standard print scales
    Scale(ScaleArgs),

    /// Transform a point between reference systems
    Transform(TransformArgs),

    /// List the registered reference systems
    Crs(CrsArgs),

    /// Show resolved configuration values and their sources
    Config,
}

/// Profile service selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileKind {
    /// Point samples from the terrain profile service
    Terrain,
    /// Polyline samples from the elevation profile service
    Elevation,
}

#[derive(Parser, Debug)]
pub struct ProfileArgs {
    /// Which profile service to use
    #[arg(long, value_enum, default_value = "terrain")]
    pub kind: ProfileKind,

    /// Reference system of the coordinates (e.g., EPSG:25833)
    #[arg(long, default_value = "EPSG:25833")]
    pub crs: String,

    /// Line vertices as "x,y;x,y;..."
    #[arg(long, allow_hyphen_values = true)]
    pub coords: String,

    /// Override the profile service URL
    #[arg(long, value_name = "URL")]
    pub service_url: Option<String>,

    /// Print every sample, not just the summary
    #[arg(long)]
    pub points: bool,
}

#[derive(Parser, Debug)]
pub struct PrintArgs {
    /// View center as "x,y"
    #[arg(long, allow_hyphen_values = true)]
    pub center: String,

    /// Reference system of the view (e.g., EPSG:3857)
    #[arg(long, default_value = "EPSG:25833")]
    pub crs: String,

    /// View resolution in map units per pixel
    #[arg(long)]
    pub resolution: Option<f64>,

    /// View rotation in radians
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub rotation: f64,

    /// Layout token (a4p, a4l, a3p, a3l)
    #[arg(long, default_value = "a4p")]
    pub layout: String,

    /// Background layer id (e.g., topo, toporaster, sjokartraster)
    #[arg(long, default_value = "topo")]
    pub background: String,

    /// Print resolution in dots per inch
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Title printed on the map
    #[arg(long)]
    pub title: Option<String>,

    /// Build and show the payload without submitting it
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum number of status checks
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct ScaleArgs {
    /// View resolution in map units per pixel
    #[arg(long, conflicts_with = "scale", required_unless_present = "scale")]
    pub resolution: Option<f64>,

    /// Scale denominator to convert back to a resolution
    #[arg(long)]
    pub scale: Option<f64>,

    /// Reference system whose units and family apply
    #[arg(long, default_value = "EPSG:25833")]
    pub crs: String,

    /// Screen dots per inch (defaults to the 0.28 mm pixel)
    #[arg(long)]
    pub dpi: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct TransformArgs {
    /// Source reference system
    #[arg(long)]
    pub from: String,

    /// Target reference system
    #[arg(long)]
    pub to: String,

    /// X (easting or longitude)
    #[arg(allow_hyphen_values = true)]
    pub x: f64,

    /// Y (northing or latitude)
    #[arg(allow_hyphen_values = true)]
    pub y: f64,
}

#[derive(Parser, Debug)]
pub struct CrsArgs {
    /// Include the PROJ definition of each system
    #[arg(long)]
    pub verbose: bool,
}
