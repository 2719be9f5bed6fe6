use {
    crate::{
        bcs::read_for_embedding,
        lithology::{encode_uindex, topomask},
        parameters::{LateralBoundaries, Parameters},
        units::UnitTable,
        utils::fortran_real,
    },
    anyhow::{Context, Result},
    log::info,
    ndarray::{Array2, Array3},
    rayon::prelude::*,
    std::{fs::File, io::Write, path::PathBuf},
};

/// Input files and options shared by every deck of an export.
#[derive(Debug, Clone)]
pub struct DeckConfig {
    /// Requested output formats, any of hdf, vtk and plt
    pub file_output: String,
    /// Head Dirichlet records (e.g. head by topography)
    pub head_bcs: Option<PathBuf>,
    /// Top temperature Dirichlet records (e.g. temperature by topography)
    pub top_temperature_bcs: Option<PathBuf>,
    /// Basal heat flow Neumann records
    pub basal_heat_flow_bcs: Option<PathBuf>,
    /// Calibration data records (borehole temperatures)
    pub data: Option<PathBuf>,
    /// Positions of synthetic borehole logs to record during simulation
    pub borehole_logs: Option<Vec<(f64, f64)>>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        DeckConfig {
            file_output: "hdf vtk".to_string(),
            head_bcs: None,
            top_temperature_bcs: None,
            basal_heat_flow_bcs: None,
            data: None,
            borehole_logs: None,
        }
    }
}

/// Boundary, data and log sections resolved once per export.
#[derive(Debug, Clone)]
struct Sections {
    file_output: String,
    head_bcs: String,
    top_temperature_bcs: String,
    basal_heat_flow_bcs: String,
    lateral_bcs: String,
    data: String,
    borehole_logs: String,
}

fn build_sections(params: &Parameters, config: &DeckConfig) -> Result<Sections> {
    let grid = &params.grid;
    let (_, _, dz) = grid.spacing();

    let head_bcs = match &config.head_bcs {
        Some(path) => {
            let (contents, lines) = read_for_embedding(path)?;
            format!("# head bcd, records={}\n{}", lines, contents.trim_end())
        }
        None => format!(
            "# head bcd, simple=top, error=ignore\n{}*{}",
            grid.nx * grid.ny,
            fortran_real(grid.nz as f64 * dz)
        ),
    };

    let top_temperature_bcs = match &config.top_temperature_bcs {
        Some(path) => {
            let (contents, lines) = read_for_embedding(path)?;
            format!("# temp bcd, records={}\n{}", lines, contents.trim_end())
        }
        None => "# temp bcd, simple=top, error=ignore, value=init".to_string(),
    };

    let basal_heat_flow_bcs = match &config.basal_heat_flow_bcs {
        Some(path) => {
            let (contents, _) = read_for_embedding(path)?;
            format!(
                "# temp bcn, simple=base, error=ignore\n{}",
                contents.trim_end()
            )
        }
        None => format!(
            "# temp bcn, simple=base, error=ignore\n{}*{}",
            grid.nx * grid.ny,
            fortran_real(params.physical.basal_heat_flow)
        ),
    };

    let lateral_bcs = match params.physical.lateral_boundaries {
        LateralBoundaries::Closed => "!noflow lateral boundaries".to_string(),
        LateralBoundaries::Open => "\
# head bcd, simple=back, error=ignore, value=init
# temp bcd, simple=back, error=ignore, value=init
# head bcd, simple=front, error=ignore, value=init
# temp bcd, simple=front, error=ignore, value=init"
            .to_string(),
    };

    let data = match &config.data {
        Some(path) => {
            let (contents, lines) = read_for_embedding(path)?;
            // The first line of the data file is a header
            format!(
                "# data, records={}\n{}",
                lines.saturating_sub(1),
                contents.trim_end()
            )
        }
        None => "!# data, records=0".to_string(),
    };

    let borehole_logs = match &config.borehole_logs {
        Some(logs) if !logs.is_empty() => {
            let mut s = format!("# borehole logs, records={}\n", logs.len());
            for (hole, (x, y)) in logs.iter().enumerate() {
                s.push_str(&format!("{}, {}, borehole{}\n", x, y, hole));
            }
            s.trim_end().to_string()
        }
        _ => "!# borehole logs, records=0".to_string(),
    };

    Ok(Sections {
        file_output: config.file_output.clone(),
        head_bcs,
        top_temperature_bcs,
        basal_heat_flow_bcs,
        lateral_bcs,
        data,
        borehole_logs,
    })
}

fn render_with(
    params: &Parameters,
    ids: &Array3<i32>,
    units: &UnitTable,
    sections: &Sections,
    title: &str,
) -> String {
    let grid = &params.grid;
    let (dx, dy, dz) = grid.spacing();

    let heat_transport = if params.physical.conduction_only {
        "temp"
    } else {
        "temp head"
    };

    format!(
        "!==========>>>>> INFO
# Title
{title}

# linfo
1 2 1 1

# runmode
1

# timestep control
0
1           1           0           0

# tunit
1

# time periods, records=1
0      60000000    200      lin

# output times, records=10
1
6000000
12000000
18000000
24000000
30000000
36000000
42000000
48000000
54000000

# file output: {file_output}

# active {heat_transport}

# PROPS=bas

# USER=none


# grid
{nx} {ny} {nz}

# delx
{nx}*{dx}

# dely
{ny}*{dy}

# delz
{nz}*{dz}

{borehole_logs}

!==========>>>>> NONLINEAR SOLVER
# nlsolve
50 0

!==========>>>>> FLOW
# lsolvef (linear solver control)
1.d-8 64 500
# nliterf (nonlinear iteration control)
1.0d-6 1.0

!==========>>>>> TEMPERATURE
# lsolvet (linear solver control)
1.d-4 64 500
# nlitert (nonlinear iteration control)
1.0d-2 1.0

!==========>>>>> INITIAL VALUES
# temp init HDF5=temp_init.h5

# head init HDF5=head_init.h5

!==========>>>>> UNIT DESCRIPTION
!!
# units
{units}
!==========>>>>>   define boundary properties
{top_temperature_bcs}

{basal_heat_flow_bcs}

{head_bcs}

{lateral_bcs}

{data}

# uindex
{uindex}
",
        title = title,
        heat_transport = heat_transport,
        file_output = sections.file_output,
        nx = grid.nx,
        ny = grid.ny,
        nz = grid.nz,
        dx = fortran_real(dx),
        dy = fortran_real(dy),
        dz = fortran_real(dz),
        borehole_logs = sections.borehole_logs,
        units = units.render(),
        top_temperature_bcs = sections.top_temperature_bcs,
        basal_heat_flow_bcs = sections.basal_heat_flow_bcs,
        head_bcs = sections.head_bcs,
        lateral_bcs = sections.lateral_bcs,
        data = sections.data,
        uindex = encode_uindex(ids),
    )
}

/// Renders a complete SHEMAT-Suite input deck for a conductive (or
/// coupled) heat transport simulation of one lithology realization.
pub fn render_deck(
    params: &Parameters,
    ids: &Array3<i32>,
    units: &UnitTable,
    config: &DeckConfig,
    title: &str,
) -> Result<String> {
    let sections = build_sections(params, config)?;
    Ok(render_with(params, ids, units, &sections, title))
}

/// Renders and writes one deck into the output directory; the file is
/// named after the model title, as SHEMAT-Suite expects.
pub fn write_deck(
    params: &Parameters,
    ids: &Array3<i32>,
    units: &UnitTable,
    config: &DeckConfig,
    title: &str,
) -> Result<PathBuf> {
    let deck = render_deck(params, ids, units, config, title)?;
    let path = params.environment.output_directory.join(title);
    std::fs::create_dir_all(&params.environment.output_directory)?;
    File::create(&path)
        .with_context(|| format!("creating {}", path.display()))?
        .write_all(deck.as_bytes())?;
    info!("Exported SHEMAT-Suite input {}", path.display());
    Ok(path)
}

/// Exports one deck per Monte Carlo realization plus the `shemade.job`
/// list, masking each realization with the topography. Returns the
/// exported model names (base model last, matching the job file).
pub fn export_ensemble(
    params: &Parameters,
    base: &Array3<f64>,
    ensemble: &Array2<f64>,
    mask: &Array3<bool>,
    units: &UnitTable,
    config: &DeckConfig,
) -> Result<Vec<String>> {
    std::fs::create_dir_all(&params.environment.output_directory)?;
    let sections = build_sections(params, config)?;
    let grid = &params.grid;
    let model_name = &params.environment.model_name;

    let realizations = ensemble.nrows();
    let mut names = (0..realizations)
        .into_par_iter()
        .map(|c| {
            let block = Array3::from_shape_vec(
                (grid.nx, grid.ny, grid.nz),
                ensemble.row(c).to_vec(),
            )?;
            let (ids, air) = topomask(&block, mask);

            let mut unit_table = units.clone();
            unit_table.push_air(air, params.physical.air_conductivity);

            let title = format!("{}_{}", model_name, c);
            let deck = render_with(params, &ids, &unit_table, &sections, &title);
            let path = params.environment.output_directory.join(&title);
            File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?
                .write_all(deck.as_bytes())?;

            Ok(title)
        })
        .collect::<Result<Vec<String>>>()?;

    // The base model closes the job list
    let (base_ids, air) = topomask(base, mask);
    let mut unit_table = units.clone();
    unit_table.push_air(air, params.physical.air_conductivity);
    let deck = render_with(params, &base_ids, &unit_table, &sections, model_name);
    let base_path = params.environment.output_directory.join(model_name);
    File::create(&base_path)?.write_all(deck.as_bytes())?;
    names.push(model_name.clone());

    let job_path = params.environment.output_directory.join("shemade.job");
    let mut job = File::create(&job_path)?;
    for name in &names {
        writeln!(job, "{}", name)?;
    }

    info!(
        "Exported {} SHEMAT-Suite models and {}",
        names.len(),
        job_path.display()
    );

    Ok(names)
}
