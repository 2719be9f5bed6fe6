use {
    anyhow::{anyhow, Context, Result},
    ndarray::{Array2, Array3, ArrayD, Axis},
    std::{collections::HashMap, path::Path},
};

/// Known SHEMAT-Suite output parameters and their meaning.
pub const PARAMETER_CATALOG: &[(&str, &str)] = &[
    ("comp", "compressibility"),
    ("delx", "discretization in x direction in meter"),
    ("dely", "discretization in y direction in meter"),
    ("delz", "discretization in z direction in meter"),
    ("head", "hydraulic potential in meter"),
    ("kx", "log-permeability (square meter) in x direction"),
    ("ky", "log-permeability (square meter) in y direction"),
    ("kz", "log-permeability (square meter) in z direction"),
    ("lx", "thermal conductivity in x direction in watt per meter and kelvin"),
    ("ly", "thermal conductivity in y direction in watt per meter and kelvin"),
    ("lz", "thermal conductivity in z direction in watt per meter and kelvin"),
    ("por", "porosity"),
    ("pres", "pressure"),
    ("q", "source term"),
    ("rc", "volumetric heat capacity"),
    ("rhof", "density water in kilogram per cubic meter"),
    ("temp", "temperature in degrees celsius"),
    ("temp_bcd", "temperature dirichlet boundary condition in degrees celsius"),
    ("temp_bcn", "temperature neumann boundary condition"),
    ("uindex", "rock unit index - geological unit present in the cell"),
    ("visf", "fluid viscosity"),
    ("vx", "velocity in x direction in meters per second"),
    ("vy", "velocity in y direction in meters per second"),
    ("vz", "velocity in z direction in meters per second"),
    ("x", "x coordinate in meters"),
    ("y", "y coordinate in meters"),
    ("z", "z coordinate in meters"),
];

/// Axis of a 2D cut through the model cube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliceDirection {
    X,
    Y,
    Z,
}

/// What `extract` pulls out of a simulation file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extraction {
    /// Full 3D fields
    Cube,
    /// 2D cuts through the middle of the model
    MidSlice(SliceDirection),
}

/// Extracted parameter fields together with the grid axes.
#[derive(Debug)]
pub struct Extracted {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub fields: HashMap<String, ArrayD<f64>>,
}

/// A SHEMAT-Suite simulation output file. Datasets are stored as
/// (nz, ny, nx) cubes, z index first.
pub struct SimulationResults {
    file: hdf5::File,
}

impl SimulationResults {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = hdf5::File::open(path.as_ref())
            .with_context(|| format!("opening simulation file {}", path.as_ref().display()))?;
        Ok(Self { file })
    }

    /// Opens for reading and writing, e.g. to append computed fields.
    pub fn open_rw<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = hdf5::File::open_rw(path.as_ref())
            .with_context(|| format!("opening simulation file {}", path.as_ref().display()))?;
        Ok(Self { file })
    }

    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = hdf5::File::create(path.as_ref())
            .with_context(|| format!("creating simulation file {}", path.as_ref().display()))?;
        Ok(Self { file })
    }

    /// Catalog entries present in this file.
    pub fn available_parameters(&self) -> Result<Vec<(String, &'static str)>> {
        let members = self.file.member_names()?;
        Ok(PARAMETER_CATALOG
            .iter()
            .filter(|(name, _)| members.iter().any(|m| m == name))
            .map(|(name, description)| (name.to_string(), *description))
            .collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.file.link_exists(name)
    }

    /// Reads a full (nz, ny, nx) parameter cube.
    pub fn read(&self, name: &str) -> Result<Array3<f64>> {
        let dataset = self.file.dataset(name).map_err(|_| {
            anyhow!(
                "unable to open '{}': not in the file; see available_parameters",
                name
            )
        })?;
        let cube = dataset
            .read_dyn::<f64>()?
            .into_dimensionality::<ndarray::Ix3>()
            .with_context(|| format!("dataset '{}' is not a 3D cube", name))?;
        Ok(cube)
    }

    /// Cell-centre x coordinates, taken along the first row of the `x` cube.
    pub fn x(&self) -> Result<Vec<f64>> {
        let cube = self.read("x")?;
        Ok(cube.index_axis(Axis(0), 0).index_axis(Axis(0), 0).to_vec())
    }

    pub fn y(&self) -> Result<Vec<f64>> {
        let cube = self.read("y")?;
        Ok(cube
            .index_axis(Axis(0), 0)
            .index_axis(Axis(1), 0)
            .to_vec())
    }

    pub fn z(&self) -> Result<Vec<f64>> {
        let cube = self.read("z")?;
        Ok(cube
            .index_axis(Axis(1), 0)
            .index_axis(Axis(1), 0)
            .to_vec())
    }

    /// Appends a computed field to the file.
    pub fn add_dataset(&self, name: &str, values: &Array3<f64>) -> Result<()> {
        self.file
            .new_dataset_builder()
            .with_data(values.view())
            .create(name)
            .with_context(|| format!("writing dataset '{}'", name))?;
        Ok(())
    }

    /// A 2D cut of a parameter at the given cell index.
    pub fn slice(
        &self,
        name: &str,
        direction: SliceDirection,
        index: usize,
    ) -> Result<Array2<f64>> {
        let cube = self.read(name)?;
        let axis = match direction {
            SliceDirection::X => Axis(2),
            SliceDirection::Y => Axis(1),
            SliceDirection::Z => Axis(0),
        };
        anyhow::ensure!(
            index < cube.len_of(axis),
            "cell {} out of range for '{}' in {:?} direction",
            index,
            name,
            direction
        );
        Ok(cube.index_axis(axis, index).to_owned())
    }

    /// Extracts named parameters as cubes or mid-model cuts, together
    /// with the grid axes.
    pub fn extract(&self, parameters: &[&str], mode: Extraction) -> Result<Extracted> {
        let x = self.x()?;
        let y = self.y()?;
        let z = self.z()?;

        let mut fields = HashMap::new();
        for name in parameters {
            let field: ArrayD<f64> = match mode {
                Extraction::Cube => self.read(name)?.into_dyn(),
                Extraction::MidSlice(direction) => {
                    let mid = match direction {
                        SliceDirection::X => x.len() / 2,
                        SliceDirection::Y => y.len() / 2,
                        SliceDirection::Z => z.len() / 2,
                    };
                    self.slice(name, direction, mid)?.into_dyn()
                }
            };
            fields.insert(name.to_string(), field);
        }

        Ok(Extracted { x, y, z, fields })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use {super::*, crate::parameters::Grid, ndarray::Array3};

    /// Writes a small synthetic simulation file the way SHEMAT-Suite
    /// lays out its output: (nz, ny, nx) cubes including coordinates.
    pub fn write_synthetic(path: &std::path::Path, grid: &Grid) -> SimulationResults {
        let results = SimulationResults::create(path).unwrap();
        let (nx, ny, nz) = (grid.nx, grid.ny, grid.nz);
        let (dx, dy, dz) = grid.spacing();

        let x = Array3::from_shape_fn((nz, ny, nx), |(_, _, i)| dx * (i as f64 + 0.5));
        let y = Array3::from_shape_fn((nz, ny, nx), |(_, j, _)| dy * (j as f64 + 0.5));
        let z = Array3::from_shape_fn((nz, ny, nx), |(k, _, _)| dz * (k as f64 + 0.5));
        results.add_dataset("x", &x).unwrap();
        results.add_dataset("y", &y).unwrap();
        results.add_dataset("z", &z).unwrap();

        // Linear conductive profile: 100 °C at the base, cooling upward
        let temp = Array3::from_shape_fn((nz, ny, nx), |(k, _, _)| 100.0 - 10.0 * k as f64);
        results.add_dataset("temp", &temp).unwrap();

        for name in &["delx", "dely", "delz"] {
            let d = match *name {
                "delx" => dx,
                "dely" => dy,
                _ => dz,
            };
            results
                .add_dataset(name, &Array3::from_elem((nz, ny, nx), d))
                .unwrap();
        }

        for name in &["lx", "ly", "lz"] {
            results
                .add_dataset(name, &Array3::from_elem((nz, ny, nx), 2.0))
                .unwrap();
        }

        results
            .add_dataset("uindex", &Array3::from_elem((nz, ny, nx), 1.0))
            .unwrap();

        results
    }

    pub fn small_grid() -> Grid {
        Grid {
            nx: 4,
            ny: 3,
            nz: 5,
            xmin: 0.0,
            xmax: 400.0,
            ymin: 0.0,
            ymax: 300.0,
            zmin: 0.0,
            zmax: 500.0,
        }
    }
}
