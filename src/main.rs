//! Entry point for `fesom-diag`.
//! Parses the command line, loads the mesh and dispatches to the diagnostics.

use clap::Parser;
use fesom_diag::data::{get_data, DataOptions};
use fesom_diag::diagnostics::{hovm_data, hovm_mean, ice_area_with, ice_ext_with, ice_vol_with, IceOptions};
use fesom_diag::field::FieldData;
use fesom_diag::mesh::{load_mesh, Mesh, MeshConfig};
use fesom_diag::meshdiag::{get_meshdiag, MeshDiag};
use fesom_diag::metadata::{list_records, print_mesh_summary, print_records};
use fesom_diag::netcdf_io::NetCDFWriter;
use fesom_diag::parallel::ParallelConfig;
use fesom_diag::Result;
use ndarray::s;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{Cli, Command, DataArgs, IceKind, MeshArgs};

fn init_logging(verbose: bool) {
    let default = if verbose { "fesom_diag=debug" } else { "fesom_diag=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn mesh_config(args: &MeshArgs) -> MeshConfig {
    if args.geographic {
        MeshConfig::geographic()
    } else {
        args.abg
            .map_or_else(MeshConfig::default, |abg| MeshConfig { abg: Some(abg) })
    }
}

fn open_mesh(args: &MeshArgs) -> Result<Mesh> {
    let mesh = load_mesh(&args.mesh, &mesh_config(args))?;
    println!(
        "Loaded mesh {} ({} nodes, {} elements)",
        args.mesh.display(),
        mesh.n2d,
        mesh.e2d
    );
    Ok(mesh)
}

fn read_field(args: &DataArgs, mesh: &Mesh) -> Result<FieldData> {
    let options = DataOptions {
        depth: args.depth,
        how: args.how,
        compute: true,
        runid: args.runid.clone(),
        records: None,
    };
    get_data(&args.results, &args.variable, args.years.clone(), mesh, &options)
}

fn print_meshdiag(diag: &MeshDiag) {
    println!("\n Mesh diagnostics");
    println!("====================");
    println!("    levels = {}, layers = {}", diag.nz(), diag.nz1());
    println!("    surface area = {:.6e} m2", diag.surface_area().sum());
    println!("    ocean volume = {:.6e} m3", diag.total_volume());
    for (k, (depth, area)) in diag
        .zbar
        .iter()
        .zip(diag.nod_area.rows())
        .enumerate()
    {
        println!("    {k:>3} {depth:>8.1} m  {:.6e} m2", area.sum());
    }
}

fn run(cli: Cli) -> Result<()> {
    ParallelConfig::new(cli.threads).setup_global_pool()?;

    match cli.command {
        Command::Info {
            mesh,
            results,
            runid,
        } => {
            let mesh = open_mesh(&mesh)?;
            print_mesh_summary(&mesh);
            if let Some(results) = results {
                print_records(&list_records(&results, &runid)?);
            }
        }

        Command::Meshdiag {
            mesh,
            meshdiag,
            output_netcdf,
        } => {
            let mesh = open_mesh(&mesh)?;
            let diag = get_meshdiag(&mesh, meshdiag.as_deref())?;
            match output_netcdf {
                Some(path) => {
                    NetCDFWriter::new(&path).write_meshdiag(&diag)?;
                    println!("✅ Saved mesh diagnostics to {}", path.display());
                }
                None => print_meshdiag(&diag),
            }
        }

        Command::Ice {
            data,
            kind,
            hemisphere,
            threshold,
            output_netcdf,
        } => {
            let mesh = open_mesh(&data.mesh)?;
            let field = read_field(&data, &mesh)?;
            let options = IceOptions {
                hemisphere: hemisphere.into(),
                extent_threshold: threshold,
                ..IceOptions::default()
            };
            let series = match kind {
                IceKind::Extent => ice_ext_with(&field, &mesh, &options)?,
                IceKind::Area => ice_area_with(&field, &mesh, &options)?,
                IceKind::Volume => ice_vol_with(&field, &mesh, &options)?,
            };
            match output_netcdf {
                Some(path) => {
                    NetCDFWriter::new(&path).write_time_series(&series)?;
                    println!("✅ Saved {} to {}", series.name, path.display());
                }
                None => {
                    println!("\n {} ({})", series.name, series.units);
                    for (i, value) in series.values.iter().enumerate() {
                        println!("    {i:>4} {value:.6e}");
                    }
                }
            }
        }

        Command::Hovm {
            data,
            meshdiag,
            output_netcdf,
        } => {
            let mesh = open_mesh(&data.mesh)?;
            let diag = get_meshdiag(&mesh, meshdiag.as_deref())?;
            let field = read_field(&data, &mesh)?;
            let hovm = hovm_data(&field, &mesh, Some(&diag))?;
            println!(
                "Hovmöller matrix of {}: {} x {}, mean {:.6}",
                data.variable,
                hovm.nrows(),
                hovm.ncols(),
                hovm_mean(&hovm)
            );
            if let Some(path) = output_netcdf {
                // Fields on levels (nz) rather than layers (nz1)
                let depths = if hovm.ncols() == diag.nz1() {
                    diag.z.view()
                } else {
                    diag.zbar.slice(s![..hovm.ncols()])
                };
                NetCDFWriter::new(&path).write_hovmoller(&data.variable, &hovm, None, depths)?;
                println!("✅ Saved result to {}", path.display());
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fesom-diag failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
