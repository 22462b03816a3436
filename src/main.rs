//! Entry point for the `basingrid` command-line tool.
//! Parses arguments, installs logging, loads settings and dispatches subcommands.

use basin_grid::prelude::*;
use basin_grid::{metadata, netcdf_io};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Args, CatchmentArgs, Command, SubsetArgs};

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn catchment_source(args: &CatchmentArgs) -> Result<CatchmentSource> {
    match (&args.catchment, &args.extent) {
        (Some(path), _) => Ok(CatchmentSource::File(path.clone())),
        (None, Some(extent)) => Ok(CatchmentSource::Extent {
            extent: extent.to_vec(),
            crs: args.extent_crs,
        }),
        (None, None) => Err(BasinGridError::ConfigError(
            "either --catchment or --extent is required".to_string(),
        )),
    }
}

fn load(args: &CatchmentArgs, settings: &Settings) -> Result<Catchment> {
    load_catchment(&catchment_source(args)?, args.target_crs, &settings.policy)
}

fn subset_options(args: &SubsetArgs, settings: &Settings) -> SubsetOptions {
    let mut options = settings.subset.clone();
    if let Some(cells) = args.buffer_cells {
        options = options.with_buffer_cells(cells);
    }
    if args.clip {
        options = options.with_clip(true);
    }
    options
}

fn time_range(start: &Option<String>, end: &Option<String>) -> Result<Option<TimeRange>> {
    match (start, end) {
        (Some(start), Some(end)) => Ok(Some(TimeRange::parse(start, end)?)),
        _ => Ok(None),
    }
}

fn print_report(report: &ValidationReport) {
    println!("\nCatchment validation");
    println!("====================");
    for entry in report.entries() {
        let mark = if entry.passed { "✅" } else { "❌" };
        println!(
            "{mark} {:<15} {:>14.4}  {}",
            entry.check.as_str(),
            entry.measured,
            entry.message
        );
    }
}

fn run(args: Args) -> Result<()> {
    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    if args.threads.is_some() {
        settings.threads = args.threads;
    }
    settings.validate()?;

    ParallelConfig::new(settings.threads).setup_global_pool()?;
    ParallelInfo::detect().log();

    match args.command {
        Command::Inspect { file } => {
            let dataset = netcdf_io::read_dataset(&file)?;
            println!("File: {}", file.display());
            print!("{}", metadata::describe_dataset(&dataset));
        }

        Command::Validate { catchment } => {
            let prepared = prepare_catchment(
                &catchment_source(&catchment)?,
                catchment.target_crs,
                &settings.policy,
            )?;
            println!("Geometry type: {}", prepared.class);
            println!("Source: {}", prepared.provenance);
            print_report(&prepared.report);
            let accepted = prepared.into_catchment()?;
            let bounds = accepted.bounds()?;
            println!(
                "\nCatchment accepted: {} bounds [{:.4}, {:.4}, {:.4}, {:.4}]",
                accepted.crs(),
                bounds.min_x(),
                bounds.min_y(),
                bounds.max_x(),
                bounds.max_y()
            );
        }

        Command::Weights {
            catchment,
            file,
            output,
        } => {
            let catchment = load(&catchment, &settings)?;
            let dataset = netcdf_io::read_dataset(&file)?;
            let weights = compute_dataset_weights(&dataset, &catchment)?;
            let (rows, cols) = weights.shape();
            println!("Weight grid: {rows} x {cols}");
            println!("Non-zero cells: {}", weights.nonzero_cells);
            println!("Effective cells: {:.4}", weights.effective_cells);
            if let Some(output) = output {
                netcdf_io::write_weights(&weights, dataset.crs(), &output)?;
                println!("✅ Saved weights to {}", output.display());
            }
        }

        Command::Average {
            catchment,
            file,
            layer,
            anomalies,
        } => {
            let catchment = load(&catchment, &settings)?;
            let dataset = netcdf_io::read_dataset(&file)?;
            let weights = compute_dataset_weights(&dataset, &catchment)?;
            match basin_average(&dataset, &layer, &weights)? {
                BasinAverage::Scalar(value) => {
                    println!("Basin average of '{layer}': {value:.6}");
                    if anomalies {
                        println!("No time dimension, anomalies skipped");
                    }
                }
                BasinAverage::Series(series) => {
                    println!("Basin average of '{layer}' over '{}':", series.time_name);
                    for (t, v) in series.times.iter().zip(series.values.iter()) {
                        println!("  {t:>12}  {v:.6}");
                    }
                    println!("Summary: {}", series.summary());
                    if anomalies {
                        let result = compute_anomalies(&series, &series.time_name)?;
                        let (mean, std, max_pos, max_neg) = result.stats.as_tuple();
                        println!("Anomalies:");
                        println!("  mean:         {mean:.6}");
                        println!("  std:          {std:.6}");
                        println!("  max positive: {max_pos:.6}");
                        println!("  max negative: {max_neg:.6}");
                    }
                }
            }
        }

        Command::Subset {
            catchment,
            subset,
            file,
            output,
            start,
            end,
        } => {
            let catchment = load(&catchment, &settings)?;
            let options = subset_options(&subset, &settings);
            let dataset = netcdf_io::read_dataset(&file)?;
            let catchment = match dataset.crs() {
                Some(crs) => catchment.reproject(crs)?,
                None => catchment,
            };
            let bounds = catchment.bounds()?;
            let result = spatial_subset(&dataset, &bounds, Some(&catchment), &options)?;
            if result.is_degraded() {
                println!("⚠️  Degraded subset: {}", result.outcome);
            }
            let mut reduced = result.into_owned();
            if let Some(range) = time_range(&start, &end)? {
                reduced = temporal_subset(&reduced, &range)?;
            }
            netcdf_io::write_dataset(&reduced, &output)?;
            println!("✅ Saved subset to {}", output.display());
        }

        Command::Download {
            catchment,
            subset,
            catalog,
            store,
            output,
            dataset,
            start,
            end,
            variables,
        } => {
            let catchment = load(&catchment, &settings)?;
            let options = subset_options(&subset, &settings);
            let catalog = DatasetCatalog::from_file(&catalog)?;
            let range = time_range(&start, &end)?;
            let downloader =
                Downloader::new(catalog, catchment, LocalNetcdfStore::new(store), output, options);

            match dataset {
                Some((category, subcategory)) => {
                    let record = downloader.download_dataset(
                        &category,
                        &subcategory,
                        range.as_ref(),
                        variables.as_deref(),
                    )?;
                    println!(
                        "✅ {category}/{subcategory} -> {} ({})",
                        record.output_path.display(),
                        record.outcome
                    );
                }
                None => {
                    let statuses = downloader.download_all(range.as_ref());
                    let failed = statuses.iter().filter(|s| s.result.is_err()).count();
                    for status in &statuses {
                        match &status.result {
                            Ok(record) => println!(
                                "✅ {}/{} -> {}",
                                status.category,
                                status.subcategory,
                                record.output_path.display()
                            ),
                            Err(e) => {
                                println!("❌ {}/{}: {e}", status.category, status.subcategory)
                            }
                        }
                    }
                    println!(
                        "\n{} of {} datasets downloaded",
                        statuses.len() - failed,
                        statuses.len()
                    );
                }
            }
            println!("Log: {}", downloader.log_file().display());
        }
    }

    Ok(())
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);
    info!("basingrid {}", env!("CARGO_PKG_VERSION"));
    run(args)?;
    Ok(())
}
