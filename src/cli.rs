//! Command-line options for the `basingrid` binary, defined with `clap`.

use basin_grid::crs::Crs;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Catchment validation, grid weighting and subsetting for gridded datasets
#[derive(Parser, Debug)]
#[command(name = "basingrid", version, about, long_about = None)]
pub struct Args {
    /// Settings file (YAML or JSON) with policy and subset options
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of threads for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print axes, layers and value ranges of a NetCDF file
    Inspect {
        /// Path to the NetCDF file
        file: PathBuf,
    },

    /// Run the catchment policy checks and print the report
    Validate {
        #[command(flatten)]
        catchment: CatchmentArgs,
    },

    /// Compute the catchment weight grid for a dataset's grid
    Weights {
        #[command(flatten)]
        catchment: CatchmentArgs,

        /// NetCDF file providing the grid
        #[arg(short, long)]
        file: PathBuf,

        /// Write the weight grid to this NetCDF file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Basin-average a layer over the catchment
    Average {
        #[command(flatten)]
        catchment: CatchmentArgs,

        /// NetCDF file holding the layer
        #[arg(short, long)]
        file: PathBuf,

        /// Layer to average
        #[arg(short, long)]
        layer: String,

        /// Also compute anomalies against the temporal mean
        #[arg(long, default_value_t = false)]
        anomalies: bool,
    },

    /// Cut a dataset down to the catchment and write it
    Subset {
        #[command(flatten)]
        catchment: CatchmentArgs,

        #[command(flatten)]
        subset: SubsetArgs,

        /// NetCDF file to subset
        #[arg(short, long)]
        file: PathBuf,

        /// Output NetCDF file
        #[arg(short, long)]
        output: PathBuf,

        /// Start of the time window (YYYY-MM-DD[THH:MM:SS])
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// End of the time window, inclusive
        #[arg(long, requires = "start")]
        end: Option<String>,
    },

    /// Extract catalog datasets for the catchment
    Download {
        #[command(flatten)]
        catchment: CatchmentArgs,

        #[command(flatten)]
        subset: SubsetArgs,

        /// Dataset catalog (YAML)
        #[arg(long)]
        catalog: PathBuf,

        /// Root directory of the dataset store
        #[arg(long)]
        store: PathBuf,

        /// Output base directory
        #[arg(short, long)]
        output: PathBuf,

        /// Dataset to extract, formatted as <category>/<subcategory>. All datasets when omitted.
        #[arg(long, value_parser = parse_dataset_arg)]
        dataset: Option<(String, String)>,

        /// Start of the time window for temporal datasets
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// End of the time window, inclusive
        #[arg(long, requires = "start")]
        end: Option<String>,

        /// Comma-separated layers to keep
        #[arg(long, value_delimiter = ',')]
        variables: Option<Vec<String>>,
    },
}

/// Where the catchment comes from: a GeoJSON file or an explicit extent
#[derive(ClapArgs, Debug, Clone)]
pub struct CatchmentArgs {
    /// GeoJSON file with the catchment features
    #[arg(long, required_unless_present = "extent", conflicts_with = "extent")]
    pub catchment: Option<PathBuf>,

    /// Bounding box formatted as <minx>,<miny>,<maxx>,<maxy>
    #[arg(long, value_parser = parse_extent_arg, allow_hyphen_values = true)]
    pub extent: Option<[f64; 4]>,

    /// CRS of --extent
    #[arg(long, value_parser = parse_crs_arg, default_value = "EPSG:4326")]
    pub extent_crs: Crs,

    /// Reproject the catchment to this CRS before validation
    #[arg(long, value_parser = parse_crs_arg)]
    pub target_crs: Option<Crs>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct SubsetArgs {
    /// Mask cells outside the catchment boundary
    #[arg(long, default_value_t = false)]
    pub clip: bool,

    /// Grid cells of padding around the catchment bounds
    #[arg(long)]
    pub buffer_cells: Option<usize>,
}

fn parse_extent_arg(s: &str) -> Result<[f64; 4], String> {
    let values = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("Invalid extent value: {e}"))?;
    match values.as_slice() {
        &[minx, miny, maxx, maxy] => Ok([minx, miny, maxx, maxy]),
        _ => Err("Invalid format: Expected '<minx>,<miny>,<maxx>,<maxy>'.".to_string()),
    }
}

fn parse_crs_arg(s: &str) -> Result<Crs, String> {
    s.parse::<Crs>().map_err(|e| e.to_string())
}

fn parse_dataset_arg(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.split('/').collect();
    match parts.as_slice() {
        [cat, sub] if !cat.is_empty() && !sub.is_empty() => {
            Ok((cat.to_string(), sub.to_string()))
        }
        _ => Err("Invalid format: Expected '<category>/<subcategory>'.".to_string()),
    }
}
