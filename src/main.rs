#[macro_use]
extern crate clap;

use {
    anyhow::{bail, Context, Result},
    log::{error, info},
    openwf::{
        bcs::{head_records, temperature_records, write_records},
        database::BoreholeDatabase,
        deck::{export_ensemble, DeckConfig},
        heatflow::{heat_flow_from_results, temperature_gradient},
        inversion::load_data,
        lithology::{
            load_block, load_ensemble, load_topography, mask_topo, surface_temperature, topomask,
        },
        parameters::Parameters,
        rejection::{rejection_sample, rmse},
        results::SimulationResults,
        units::UnitTable,
    },
    simplelog::{Config as LogConfig, LevelFilter, TermLogger, TerminalMode},
    std::{
        fs::{create_dir_all, File},
        io::prelude::*,
        path::PathBuf,
    },
};

#[quit::main]
fn main() {
    let matches = clap_app!(openwf =>
        (version: crate_version!())
        (@arg PARAMETERS: -p --parameters +takes_value +required "Path to file containing workflow parameters.")
        (@subcommand data =>
            (about: "Exports borehole temperatures from the database as a SHEMAT-Suite data file.")
        )
        (@subcommand bcs =>
            (about: "Derives head and temperature boundary condition records from the model topography.")
        )
        (@subcommand export =>
            (about: "Exports one SHEMAT-Suite input file per Monte Carlo realization plus the shemade.job list.")
        )
        (@subcommand heatflow =>
            (about: "Computes conductive heat flow and the temperature gradient from a simulation output file.")
        )
        (@subcommand reject =>
            (about: "Rejection-samples the ensemble by RMSE between simulated and observed temperatures.")
        )
    )
    .get_matches();

    TermLogger::init(
        LevelFilter::Debug,
        LogConfig::default(),
        TerminalMode::Mixed,
    )
    .expect("Failed to initialize logger");

    let params = {
        // Should never panic as clap should return an error if the argument was not supplied
        let path = matches
            .value_of("PARAMETERS")
            .expect("Path to parameters file not supplied");

        let file = File::open(path).unwrap_or_else(|e| {
            error!("Failed to open {}: \"{}\"", path, e);
            quit::with_code(1);
        });

        let params = serde_yaml::from_reader::<_, Parameters>(file).unwrap_or_else(|e| {
            error!("Failed to parse parameters from {}: \"{}\"", path, e);
            quit::with_code(1);
        });

        info!(
            "Successfully loaded workflow parameters from \"{}\": \n{:#?}",
            path, params
        );

        params
    };

    run_subcommand(matches.subcommand_name(), params).unwrap_or_else(|e| {
        error!("Error: \"{:#}\"", e);
        quit::with_code(1);
    });
}

fn run_subcommand(subcmd: Option<&str>, params: Parameters) -> Result<()> {
    let subcmd = match subcmd {
        Some(s) => s,
        None => bail!("No subcommand selected"),
    };

    let out = params.environment.output_directory.clone();
    create_dir_all(&out)?;

    info!("Starting {}", subcmd);

    match subcmd {
        "data" => {
            let db = BoreholeDatabase::open(&params.environment.database)?;
            db.export_shemat_data(&params.data, out.join("shemat_data.txt"))?;
        }
        "bcs" => {
            let dtm = load_topography(&params.environment.topography, &params.grid)?;
            let base = load_block(&params.environment.base_lithology, &params.grid)?;
            let mask = mask_topo(&dtm, &params.grid);
            let (ids, air) = topomask(&base, &mask);

            let head = head_records(&ids, air, &dtm, &params.grid);
            write_records(out.join("head_bcd.txt"), &head)?;

            let surface = surface_temperature(&dtm, &params.physical);
            let temperature = temperature_records(&ids, air, &surface);
            write_records(out.join("temp_bcd.txt"), &temperature)?;

            info!(
                "Wrote {} head and {} temperature records for air unit {}",
                head.len(),
                temperature.len(),
                air
            );
        }
        "export" => {
            let dtm = load_topography(&params.environment.topography, &params.grid)?;
            let base = load_block(&params.environment.base_lithology, &params.grid)?;
            let mask = mask_topo(&dtm, &params.grid);
            let ensemble = load_ensemble(&params.environment.ensemble_directory, &params.grid)?;

            let units = match &params.environment.units {
                Some(path) => UnitTable::from_file(path)?,
                None => {
                    let max_id = base.iter().map(|x| x.round() as i32).max().unwrap_or(0);
                    info!("No unit table given, using default petrophysical properties");
                    UnitTable::with_defaults(max_id.max(0) as usize)
                }
            };

            // Boundary condition and data files from earlier stages, when present
            let existing = |name: &str| -> Option<PathBuf> {
                let path = out.join(name);
                if path.is_file() {
                    Some(path)
                } else {
                    None
                }
            };
            let config = DeckConfig {
                head_bcs: existing("head_bcd.txt"),
                top_temperature_bcs: existing("temp_bcd.txt"),
                basal_heat_flow_bcs: None,
                data: existing("shemat_data.txt"),
                borehole_logs: None,
                ..Default::default()
            };

            export_ensemble(&params, &base, &ensemble, &mask, &units, &config)?;
        }
        "heatflow" => {
            let path = params
                .environment
                .results_directory
                .join(format!("{}_final.h5", params.environment.model_name));
            let results = SimulationResults::open_rw(&path)?;

            let hf = heat_flow_from_results(&results)?;
            results.add_dataset("qx", &hf.qx)?;
            results.add_dataset("qy", &hf.qy)?;
            results.add_dataset("qz", &hf.qz)?;

            let temp = results.read("temp")?;
            let z = results.z()?;
            results.add_dataset("tgrad", &temperature_gradient(&temp, &z, false))?;

            info!("Appended qx, qy, qz and tgrad to {}", path.display());
        }
        "reject" => {
            let mut paths = std::fs::read_dir(&params.environment.results_directory)
                .with_context(|| {
                    format!(
                        "reading results directory {}",
                        params.environment.results_directory.display()
                    )
                })?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().map_or(false, |ext| ext == "dat"))
                .collect::<Vec<_>>();
            paths.sort();
            if paths.is_empty() {
                bail!(
                    "no .dat data node files in {}",
                    params.environment.results_directory.display()
                );
            }

            let mut series = Vec::with_capacity(paths.len());
            for path in &paths {
                let nodes = load_data(path)?;
                let calc: Vec<f64> = nodes.iter().map(|n| n.calc).collect();
                let obs: Vec<f64> = nodes.iter().map(|n| n.obs).collect();
                series.push(rmse(&calc, &obs)?);
            }

            let (accepted, _) = rejection_sample(&series, &params.rejection);

            let mut f = File::create(out.join("accepted.txt"))?;
            for index in &accepted {
                writeln!(f, "{}\t{}", index, paths[*index].display())?;
            }
            info!(
                "Accepted {} of {} realizations",
                accepted.len(),
                series.len()
            );
        }
        _ => {
            // Should be unreachable due to clap catching this error
            bail!("Unrecognized subcommand");
        }
    }

    info!("Finished {}", subcmd);

    Ok(())
}
