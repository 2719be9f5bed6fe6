use {
    criterion::{black_box, criterion_group, criterion_main, Benchmark, Criterion},
    ndarray::Array3,
    openwf::{
        deck::{render_deck, DeckConfig},
        heatflow::conductive_heat_flow,
        lithology::encode_uindex,
        parameters::{Grid, Parameters},
        units::UnitTable,
    },
};

fn bench_grid() -> Grid {
    Grid {
        nx: 64,
        ny: 64,
        nz: 64,
        xmin: 0.0,
        xmax: 16_000.0,
        ymin: 0.0,
        ymax: 16_000.0,
        zmin: -6500.0,
        zmax: 1000.0,
    }
}

fn layered_ids() -> Array3<i32> {
    Array3::from_shape_fn((64, 64, 64), |(i, j, k)| ((i + j + k) / 24) as i32 + 1)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench(
        "uindex",
        Benchmark::new("encode_64", |b| {
            let ids = layered_ids();
            b.iter(|| encode_uindex(black_box(&ids)))
        })
        .sample_size(20),
    );

    c.bench(
        "deck",
        Benchmark::new("render_64", |b| {
            let mut params = Parameters::default();
            params.grid = bench_grid();
            let ids = layered_ids();
            let units = UnitTable::with_defaults(9);

            b.iter(|| {
                render_deck(
                    black_box(&params),
                    &ids,
                    &units,
                    &DeckConfig::default(),
                    "bench_model",
                )
                .unwrap()
            })
        })
        .sample_size(10),
    );

    c.bench(
        "heatflow",
        Benchmark::new("conductive_64", |b| {
            let temp = Array3::from_shape_fn((64, 64, 64), |(k, j, i)| {
                100.0 - 1.5 * k as f64 + 0.01 * (i + j) as f64
            });
            let conductivity = Array3::from_elem((64, 64, 64), 2.5);
            let spacing = Array3::from_elem((64, 64, 64), 117.0);

            b.iter(|| {
                conductive_heat_flow(
                    black_box(&temp),
                    (&conductivity, &conductivity, &conductivity),
                    (&spacing, &spacing, &spacing),
                )
            })
        })
        .sample_size(10),
    );
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
