//! Command-line interface of `fesom-diag`, defined with `clap`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use fesom_diag::data::How;
use fesom_diag::diagnostics::Hemisphere;
use fesom_diag::netcdf_io::DEFAULT_RUNID;
use std::path::PathBuf;

/// Diagnostics for FESOM2 ocean model output
#[derive(Parser, Debug)]
#[command(
    version,
    name = "fesom-diag",
    about = "Sea-ice integrals, Hovmöller matrices and mesh diagnostics for FESOM2 output"
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarise a mesh and, optionally, the records of a results directory
    Info {
        #[command(flatten)]
        mesh: MeshArgs,

        /// Results directory to list
        #[arg(short, long)]
        results: Option<PathBuf>,

        /// Run identifier in the results file names
        #[arg(long, default_value = DEFAULT_RUNID)]
        runid: String,
    },

    /// Compute mesh diagnostics, or check a precomputed diagnostics file
    Meshdiag {
        #[command(flatten)]
        mesh: MeshArgs,

        /// Precomputed diagnostics file to read instead of computing
        #[arg(long)]
        meshdiag: Option<PathBuf>,

        /// Path to save the diagnostics as NetCDF
        #[arg(long)]
        output_netcdf: Option<PathBuf>,
    },

    /// Sea-ice extent, area or volume per time step
    Ice {
        #[command(flatten)]
        data: DataArgs,

        /// Integral to compute
        #[arg(long, value_enum, default_value_t = IceKind::Area)]
        kind: IceKind,

        /// Hemisphere to integrate over
        #[arg(long, value_enum, default_value_t = HemisphereArg::North)]
        hemisphere: HemisphereArg,

        /// Concentration threshold for the extent
        #[arg(long, default_value_t = 0.15)]
        threshold: f64,

        /// Path to save the time series as NetCDF
        #[arg(long)]
        output_netcdf: Option<PathBuf>,
    },

    /// Area-weighted horizontal mean per depth level and time step
    Hovm {
        #[command(flatten)]
        data: DataArgs,

        /// Precomputed diagnostics file with the node areas per level
        #[arg(long)]
        meshdiag: Option<PathBuf>,

        /// Path to save the matrix as NetCDF
        #[arg(long)]
        output_netcdf: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct MeshArgs {
    /// Mesh directory with nod2d.out, elem2d.out and aux3d.out
    #[arg(short, long)]
    pub mesh: PathBuf,

    /// Euler angles of the rotated grid, formatted as <alpha>,<beta>,<gamma>
    #[arg(long, value_parser = parse_abg, conflicts_with = "geographic")]
    pub abg: Option<[f64; 3]>,

    /// Node coordinates are already geographic
    #[arg(long)]
    pub geographic: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    #[command(flatten)]
    pub mesh: MeshArgs,

    /// Results directory
    #[arg(short, long)]
    pub results: PathBuf,

    /// Variable name, e.g. a_ice or temp
    #[arg(long)]
    pub variable: String,

    /// Years, formatted as 1948, 1948,1950 or 1948-1950
    #[arg(short, long, value_parser = parse_years)]
    pub years: ::std::vec::Vec<i32>,

    /// Depth in metres; the nearest level is selected
    #[arg(long)]
    pub depth: Option<f64>,

    /// Time treatment: mean, max, min or ori
    #[arg(long, default_value = "mean", value_parser = parse_how)]
    pub how: How,

    /// Run identifier in the results file names
    #[arg(long, default_value = DEFAULT_RUNID)]
    pub runid: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceKind {
    Extent,
    Area,
    Volume,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HemisphereArg {
    North,
    South,
}

impl From<HemisphereArg> for Hemisphere {
    fn from(arg: HemisphereArg) -> Self {
        match arg {
            HemisphereArg::North => Hemisphere::North,
            HemisphereArg::South => Hemisphere::South,
        }
    }
}

fn parse_how(s: &str) -> Result<How, String> {
    s.parse::<How>().map_err(|e| e.to_string())
}

fn parse_years(s: &str) -> Result<Vec<i32>, String> {
    let mut years = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start: i32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("Invalid start year in '{part}'"))?;
                let end: i32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("Invalid end year in '{part}'"))?;
                if end < start {
                    return Err(format!("Invalid year range '{part}': end before start"));
                }
                years.extend(start..=end);
            }
            None => years.push(
                part.parse()
                    .map_err(|_| format!("Invalid year '{part}'"))?,
            ),
        }
    }
    if years.is_empty() {
        return Err("Expected at least one year".to_string());
    }
    Ok(years)
}

fn parse_abg(s: &str) -> Result<[f64; 3], String> {
    let parts: Vec<&str> = s.split(',').collect();
    match parts.as_slice() {
        [a, b, g] => {
            let angle = |v: &str| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid angle '{v}'"))
            };
            Ok([angle(a)?, angle(b)?, angle(g)?])
        }
        _ => Err("Invalid format: Expected '<alpha>,<beta>,<gamma>'.".to_string()),
    }
}
