use {
    crate::parameters::Grid,
    anyhow::{Context, Result},
    ndarray::{Array2, Array3},
    std::{fmt, fs::File, io::Write, path::Path},
};

/// One cell-wise boundary condition record with 1-based (Fortran) indices.
#[derive(Debug, Clone, PartialEq)]
pub struct BcRecord {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub value: f64,
    pub direction: i32,
}

impl fmt::Display for BcRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {:.3}, {}",
            self.i, self.j, self.k, self.value, self.direction
        )
    }
}

/// Hydraulic head records for all air cells: head equals the ground
/// elevation expressed as height above the model base.
pub fn head_records(
    ids: &Array3<i32>,
    air: i32,
    dtm: &Array2<f64>,
    grid: &Grid,
) -> Vec<BcRecord> {
    records_at_air(ids, air, |i, j| dtm[[i, j]] - grid.zmin)
}

/// Top temperature records for all air cells, from the lapse-rate
/// surface temperature field.
pub fn temperature_records(
    ids: &Array3<i32>,
    air: i32,
    surface_temperature: &Array2<f64>,
) -> Vec<BcRecord> {
    records_at_air(ids, air, |i, j| surface_temperature[[i, j]])
}

fn records_at_air<F: Fn(usize, usize) -> f64>(
    ids: &Array3<i32>,
    air: i32,
    value: F,
) -> Vec<BcRecord> {
    let (nx, ny, nz) = ids.dim();
    let mut records = Vec::new();
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                if ids[[i, j, k]] == air {
                    records.push(BcRecord {
                        i: i + 1,
                        j: j + 1,
                        k: k + 1,
                        value: value(i, j),
                        direction: 0,
                    });
                }
            }
        }
    }
    records
}

pub fn write_records<P: AsRef<Path>>(path: P, records: &[BcRecord]) -> Result<()> {
    let mut f = File::create(path.as_ref())
        .with_context(|| format!("creating {}", path.as_ref().display()))?;
    for record in records {
        writeln!(f, "{}", record)?;
    }
    Ok(())
}

/// Reads a boundary condition file for embedding into a deck, returning
/// its contents and the number of records.
pub fn read_for_embedding<P: AsRef<Path>>(path: P) -> Result<(String, usize)> {
    let contents = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("reading boundary condition file {}", path.as_ref().display()))?;
    let lines = contents.lines().count();
    Ok((contents, lines))
}
