use {
    crate::{
        parameters::{Grid, Physical},
        utils::read_r8,
    },
    anyhow::{bail, ensure, Context, Result},
    ndarray::{Array2, Array3},
    std::path::Path,
};

/// Rounds a raw lithology solution to integer unit ids.
pub fn round_ids(block: &[f64]) -> Vec<i32> {
    block.iter().map(|x| x.round() as i32).collect()
}

/// Loads a digital terrain model raster (nx * ny ground elevations).
pub fn load_topography<P: AsRef<Path>>(path: P, grid: &Grid) -> Result<Array2<f64>> {
    let values = read_r8(&path)?;
    ensure!(
        values.len() == grid.nx * grid.ny,
        "{}: expected {}x{} elevations, found {} values",
        path.as_ref().display(),
        grid.nx,
        grid.ny,
        values.len()
    );
    Ok(Array2::from_shape_vec((grid.nx, grid.ny), values)?)
}

/// Loads a raw lithology block in model shape.
pub fn load_block<P: AsRef<Path>>(path: P, grid: &Grid) -> Result<Array3<f64>> {
    let values = read_r8(&path)?;
    ensure!(
        values.len() == grid.cells(),
        "{}: expected {} cells, found {} values",
        path.as_ref().display(),
        grid.cells(),
        values.len()
    );
    Ok(Array3::from_shape_vec((grid.nx, grid.ny, grid.nz), values)?)
}

/// Cells above the ground surface: cell centre elevation exceeds the DTM.
pub fn mask_topo(dtm: &Array2<f64>, grid: &Grid) -> Array3<bool> {
    let z = grid.z_centres();
    Array3::from_shape_fn((grid.nx, grid.ny, grid.nz), |(i, j, k)| {
        z[k] > dtm[[i, j]]
    })
}

/// Masks a lithology block with topography; masked cells receive a new id
/// for air, one above the highest unit id. Returns the block and the air id.
pub fn topomask(block: &Array3<f64>, mask: &Array3<bool>) -> (Array3<i32>, i32) {
    let mut ids = block.mapv(|x| x.round() as i32);
    let air = ids.iter().cloned().max().unwrap_or(0) + 1;
    ndarray::Zip::from(&mut ids).and(mask).apply(|id, &m| {
        if m {
            *id = air;
        }
    });
    (ids, air)
}

/// Surface temperature in Celsius estimated from the lapse rate.
pub fn surface_temperature(dtm: &Array2<f64>, physical: &Physical) -> Array2<f64> {
    dtm.mapv(|z| physical.sea_level_temperature - physical.lapse_rate * z - crate::constants::KELVIN)
}

/// Loads every realization grid in a directory, sorted by file name,
/// into one (n_realizations, n_cells) array.
pub fn load_ensemble<P: AsRef<Path>>(dir: P, grid: &Grid) -> Result<Array2<f64>> {
    let mut paths = std::fs::read_dir(dir.as_ref())
        .with_context(|| format!("reading ensemble directory {}", dir.as_ref().display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map_or(false, |ext| ext == "r8"))
        .collect::<Vec<_>>();
    paths.sort();

    if paths.is_empty() {
        bail!(
            "no .r8 realizations found in {}",
            dir.as_ref().display()
        );
    }

    let mut blocks = Vec::with_capacity(paths.len() * grid.cells());
    for path in &paths {
        let block = read_r8(path)?;
        ensure!(
            block.len() == grid.cells(),
            "{}: expected {} cells, found {} values",
            path.display(),
            grid.cells(),
            block.len()
        );
        blocks.extend_from_slice(&block);
    }

    Ok(Array2::from_shape_vec((paths.len(), grid.cells()), blocks)?)
}

/// Flattens a block in Fortran order (x varying fastest), the ordering
/// SHEMAT-Suite expects for the `# uindex` field.
pub fn flatten_fortran(ids: &Array3<i32>) -> Vec<i32> {
    let (nx, ny, nz) = ids.dim();
    let mut out = Vec::with_capacity(nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                out.push(ids[[i, j, k]]);
            }
        }
    }
    out
}

/// Run-length encodes the unit index field as `count*id` groups.
pub fn encode_uindex(ids: &Array3<i32>) -> String {
    let flat = flatten_fortran(ids);
    let mut groups: Vec<String> = Vec::new();

    let mut iter = flat.iter();
    if let Some(&first) = iter.next() {
        let mut current = first;
        let mut count = 1usize;
        for &id in iter {
            if id == current {
                count += 1;
            } else {
                groups.push(format!("{}*{}", count, current));
                current = id;
                count = 1;
            }
        }
        groups.push(format!("{}*{}", count, current));
    }

    groups.join(" ")
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::{parameters::Physical, utils::write_r8},
        ndarray::Array3,
        tempdir::TempDir,
    };

    fn small_grid() -> Grid {
        Grid {
            nx: 2,
            ny: 2,
            nz: 4,
            xmin: 0.0,
            xmax: 200.0,
            ymin: 0.0,
            ymax: 200.0,
            zmin: 0.0,
            zmax: 400.0,
        }
    }

    #[test]
    fn rounding() {
        assert_eq!(round_ids(&[0.9, 1.2, 2.51, 3.0]), vec![1, 1, 3, 3]);
    }

    #[test]
    fn mask_marks_cells_above_ground() {
        let grid = small_grid();
        // Ground at 250 m: cell centres 50, 150, 250, 350 -> only the top cell is air
        let dtm = Array2::from_elem((2, 2), 250.0);
        let mask = mask_topo(&dtm, &grid);

        for i in 0..2 {
            for j in 0..2 {
                assert_eq!(mask[[i, j, 0]], false);
                assert_eq!(mask[[i, j, 2]], false);
                assert_eq!(mask[[i, j, 3]], true);
            }
        }
    }

    #[test]
    fn air_unit_is_max_plus_one() {
        let grid = small_grid();
        let dtm = Array2::from_elem((2, 2), 250.0);
        let mask = mask_topo(&dtm, &grid);

        let block = Array3::from_shape_fn((2, 2, 4), |(_, _, k)| (k + 1) as f64);
        let (ids, air) = topomask(&block, &mask);

        assert_eq!(air, 5);
        assert_eq!(ids[[0, 0, 3]], 5);
        assert_eq!(ids[[0, 0, 0]], 1);
    }

    #[test]
    fn surface_temperature_lapse() {
        let dtm = Array2::from_elem((1, 1), 1000.0);
        let t = surface_temperature(&dtm, &Physical::default());
        approx::assert_abs_diff_eq!(t[[0, 0]], 8.35, epsilon = 1.0E-12);
    }

    #[test]
    fn fortran_order_runs_along_x_first() {
        let ids = Array3::from_shape_fn((2, 2, 2), |(i, j, k)| (i + 10 * j + 100 * k) as i32);
        assert_eq!(
            flatten_fortran(&ids),
            vec![0, 1, 10, 11, 100, 101, 110, 111]
        );
    }

    #[test]
    fn uindex_encoding() {
        let ids = Array3::from_shape_fn((2, 2, 2), |(_, _, k)| if k == 0 { 1 } else { 2 });
        assert_eq!(encode_uindex(&ids), "4*1 4*2");

        let single = Array3::from_elem((2, 1, 1), 7);
        assert_eq!(encode_uindex(&single), "2*7");
    }

    #[test]
    fn ensemble_concatenation() {
        let grid = small_grid();
        let tempdir = TempDir::new("openwf").unwrap();

        write_r8(tempdir.path().join("real_1.r8"), &vec![2.0; 16]).unwrap();
        write_r8(tempdir.path().join("real_0.r8"), &vec![1.0; 16]).unwrap();
        std::fs::write(tempdir.path().join("notes.txt"), "ignored").unwrap();

        let ensemble = load_ensemble(tempdir.path(), &grid).unwrap();
        assert_eq!(ensemble.dim(), (2, 16));
        // Sorted by name: real_0 first
        assert_eq!(ensemble[[0, 0]], 1.0);
        assert_eq!(ensemble[[1, 0]], 2.0);
    }

    #[test]
    fn ensemble_rejects_wrong_cell_count() {
        let grid = small_grid();
        let tempdir = TempDir::new("openwf").unwrap();
        write_r8(tempdir.path().join("real_0.r8"), &vec![1.0; 7]).unwrap();

        assert!(load_ensemble(tempdir.path(), &grid).is_err());
    }
}
