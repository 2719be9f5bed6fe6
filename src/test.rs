use {
    crate::{
        bcs::{head_records, temperature_records, write_records},
        database::{BoreholeDatabase, BoreholeInfo, TemperatureRecord},
        deck::{export_ensemble, DeckConfig},
        lithology::{load_block, load_ensemble, load_topography, mask_topo, surface_temperature, topomask},
        parameters::{DataSelection, Grid, Parameters},
        rejection::{rejection_sample, rmse},
        units::UnitTable,
        utils::write_r8,
    },
    lazy_static::lazy_static,
    ndarray::Array3,
    tempdir::TempDir,
};

fn pipeline_params(root: &std::path::Path) -> Parameters {
    let mut params = Parameters::default();
    params.environment.output_directory = root.join("output");
    params.environment.model_name = "pipeline_model".to_string();
    params.environment.database = root.join("boreholes.db");
    params.environment.topography = root.join("topography.r8");
    params.environment.base_lithology = root.join("base_lithology.r8");
    params.environment.ensemble_directory = root.join("ensemble");
    params.grid = Grid {
        nx: 4,
        ny: 4,
        nz: 5,
        xmin: 0.0,
        xmax: 400.0,
        ymin: 0.0,
        ymax: 400.0,
        zmin: -300.0,
        zmax: 200.0,
    };
    params.data = DataSelection {
        boreholes: vec![1],
        method: None,
    };
    params
}

/// Runs the preprocessing chain on a synthetic model: database export,
/// boundary conditions, ensemble deck export.
fn run_pipeline(root: &std::path::Path) -> Parameters {
    let params = pipeline_params(root);
    let grid = &params.grid;
    std::fs::create_dir_all(&params.environment.output_directory).unwrap();
    std::fs::create_dir_all(&params.environment.ensemble_directory).unwrap();

    // Ground at 120 m a.s.l.: only the top cell layer (centre 150 m) is air
    write_r8(&params.environment.topography, &vec![120.0; 16]).unwrap();

    let base = Array3::from_shape_fn((4, 4, 5), |(_, _, k)| match k {
        0 | 1 => 1.0,
        2 | 3 => 2.0,
        _ => 3.0,
    });
    write_r8(
        &params.environment.base_lithology,
        base.as_slice().unwrap(),
    )
    .unwrap();

    for c in 0..2 {
        let mut realization = base.clone();
        if c == 1 {
            // Shift one unit boundary, like a Monte Carlo draw would
            realization
                .index_axis_mut(ndarray::Axis(2), 2)
                .fill(1.0);
        }
        write_r8(
            params
                .environment
                .ensemble_directory
                .join(format!("real_{}.r8", c)),
            realization.as_slice().unwrap(),
        )
        .unwrap();
    }

    let db = BoreholeDatabase::create(&params.environment.database).unwrap();
    db.insert_borehole(&BoreholeInfo {
        nr: 1,
        name: "synthetic".to_string(),
        x: 200.0,
        y: 200.0,
        z: 120.0,
        depth: Some(400.0),
        restriction: None,
    })
    .unwrap();
    for (depth, temp) in &[(100.0, 14.0), (200.0, 17.5), (300.0, 21.0)] {
        db.insert_temperature(&TemperatureRecord {
            nr: 1,
            depth: *depth,
            depth_asl: Some(120.0 - *depth),
            temperature: *temp,
            method: Some("HRT".to_string()),
        })
        .unwrap();
    }
    let data_path = params.environment.output_directory.join("shemat_data.txt");
    db.export_shemat_data(&params.data, &data_path).unwrap();

    let dtm = load_topography(&params.environment.topography, grid).unwrap();
    let block = load_block(&params.environment.base_lithology, grid).unwrap();
    let mask = mask_topo(&dtm, grid);
    let (ids, air) = topomask(&block, &mask);

    let head = head_records(&ids, air, &dtm, grid);
    write_records(
        params.environment.output_directory.join("head_bcd.txt"),
        &head,
    )
    .unwrap();
    let surface = surface_temperature(&dtm, &params.physical);
    write_records(
        params.environment.output_directory.join("temp_bcd.txt"),
        &temperature_records(&ids, air, &surface),
    )
    .unwrap();

    let ensemble = load_ensemble(&params.environment.ensemble_directory, grid).unwrap();
    let config = DeckConfig {
        head_bcs: Some(params.environment.output_directory.join("head_bcd.txt")),
        top_temperature_bcs: Some(params.environment.output_directory.join("temp_bcd.txt")),
        basal_heat_flow_bcs: None,
        data: Some(data_path),
        borehole_logs: None,
        ..Default::default()
    };
    export_ensemble(
        &params,
        &block,
        &ensemble,
        &mask,
        &UnitTable::with_defaults(3),
        &config,
    )
    .unwrap();

    params
}

lazy_static! {
    static ref WORKSPACE: (TempDir, Parameters) = {
        let tempdir = TempDir::new("openwf-pipeline").unwrap();
        let params = run_pipeline(tempdir.path());
        (tempdir, params)
    };
}

#[test]
fn exports_a_deck_per_realization_and_the_job_list() {
    let (_, params) = &*WORKSPACE;
    let out = &params.environment.output_directory;

    for name in &["pipeline_model_0", "pipeline_model_1", "pipeline_model"] {
        assert!(out.join(name).is_file(), "{} missing", name);
    }

    let job = std::fs::read_to_string(out.join("shemade.job")).unwrap();
    assert_eq!(job, "pipeline_model_0\npipeline_model_1\npipeline_model\n");
}

#[test]
fn decks_embed_boundary_conditions_and_data() {
    let (_, params) = &*WORKSPACE;
    let out = &params.environment.output_directory;

    let deck = std::fs::read_to_string(out.join("pipeline_model_0")).unwrap();

    // 16 air cells, one per column of the 4x4 top layer
    assert!(deck.contains("# head bcd, records=16\n"));
    assert!(deck.contains("# temp bcd, records=16\n"));
    // Head is ground elevation above model base: 120 - (-300)
    assert!(deck.contains("1, 1, 5, 420.000, 0"));
    // Three temperature records behind the header line
    assert!(deck.contains("# data, records=3\n"));
    assert!(deck.contains("# active temp\n"));
    // Base model units plus the air unit
    assert!(deck.contains("!unit_3 \n"));
    assert!(deck.contains("!air \n"));
}

#[test]
fn realizations_differ_only_in_the_unit_field() {
    let (_, params) = &*WORKSPACE;
    let out = &params.environment.output_directory;

    let deck0 = std::fs::read_to_string(out.join("pipeline_model_0")).unwrap();
    let deck1 = std::fs::read_to_string(out.join("pipeline_model_1")).unwrap();

    let uindex = |deck: &str| {
        deck.split("# uindex\n")
            .nth(1)
            .map(|s| s.trim().to_string())
            .unwrap()
    };
    assert_ne!(uindex(&deck0), uindex(&deck1));

    let head = |deck: &str| {
        deck.split("!==========>>>>>   define boundary properties")
            .nth(1)
            .map(|s| s.to_string())
            .unwrap()
    };
    let boundary0 = head(&deck0);
    let boundary1 = head(&deck1);
    let strip_uindex = |s: &str| s.split("# uindex").next().unwrap().to_string();
    assert_eq!(strip_uindex(&boundary0), strip_uindex(&boundary1));
}

#[test]
fn exported_data_file_matches_database_contents() {
    let (_, params) = &*WORKSPACE;
    let data = std::fs::read_to_string(
        params.environment.output_directory.join("shemat_data.txt"),
    )
    .unwrap();

    let lines: Vec<&str> = data.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "# x y z temperature");
    assert_eq!(lines[1], "200 200 20 14");
}

#[test]
fn rejection_keeps_the_better_realization() {
    // Simulated logs: realization 0 close to the observations, 1 far off
    let observed = [14.0, 17.5, 21.0];
    let calc0 = [14.1, 17.4, 21.2];
    let calc1 = [18.0, 24.0, 29.5];

    let series = vec![
        rmse(&calc0, &observed).unwrap(),
        rmse(&calc1, &observed).unwrap(),
    ];
    let (accepted, _) = rejection_sample(&series, &crate::parameters::RejectionParams::default());

    assert!(accepted.contains(&0));
    assert!(!accepted.contains(&1));
}
