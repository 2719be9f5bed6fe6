use {serde::Deserialize, std::path::PathBuf};

/// Workflow parameters
#[derive(Debug, PartialEq, Default, Deserialize)]
pub struct Parameters {
    pub environment: Environment,
    pub grid: Grid,
    pub physical: Physical,
    pub data: DataSelection,
    pub rejection: RejectionParams,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Environment {
    /// Directory receiving every generated file
    pub output_directory: PathBuf,
    /// Base name for exported SHEMAT-Suite models
    pub model_name: String,
    /// Borehole temperature database
    pub database: PathBuf,
    /// Digital terrain model raster (.r8, nx*ny elevations in m a.s.l.)
    pub topography: PathBuf,
    /// Lithology block of the base model (.r8, nx*ny*nz unit ids)
    pub base_lithology: PathBuf,
    /// Directory of Monte Carlo lithology realizations (.r8)
    pub ensemble_directory: PathBuf,
    /// Directory of SHEMAT-Suite simulation outputs
    pub results_directory: PathBuf,
    /// Petrophysical unit table (YAML); defaults are used when absent
    pub units: Option<PathBuf>,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            output_directory: PathBuf::from("output"),
            model_name: "geo_model".to_string(),
            database: PathBuf::from("boreholes.db"),
            topography: PathBuf::from("topography.r8"),
            base_lithology: PathBuf::from("base_lithology.r8"),
            ensemble_directory: PathBuf::from("ensemble"),
            results_directory: PathBuf::from("results"),
            units: None,
        }
    }
}

/// Regular model grid; z is elevation above sea level and may be negative.
#[derive(Debug, PartialEq, Deserialize)]
pub struct Grid {
    /// Cells in x direction
    pub nx: usize,
    /// Cells in y direction
    pub ny: usize,
    /// Cells in z direction
    pub nz: usize,
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
}

impl Default for Grid {
    fn default() -> Self {
        Grid {
            nx: 50,
            ny: 50,
            nz: 20,
            xmin: 0.0,
            xmax: 20_000.0,
            ymin: 0.0,
            ymax: 20_000.0,
            zmin: -6500.0,
            zmax: 1000.0,
        }
    }
}

impl Grid {
    pub fn cells(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Cell spacing (dx, dy, dz)
    pub fn spacing(&self) -> (f64, f64, f64) {
        (
            (self.xmax - self.xmin) / self.nx as f64,
            (self.ymax - self.ymin) / self.ny as f64,
            (self.zmax - self.zmin) / self.nz as f64,
        )
    }

    pub fn x_centres(&self) -> Vec<f64> {
        let (dx, _, _) = self.spacing();
        (0..self.nx)
            .map(|i| self.xmin + dx * (i as f64 + 0.5))
            .collect()
    }

    pub fn y_centres(&self) -> Vec<f64> {
        let (_, dy, _) = self.spacing();
        (0..self.ny)
            .map(|j| self.ymin + dy * (j as f64 + 0.5))
            .collect()
    }

    pub fn z_centres(&self) -> Vec<f64> {
        let (_, _, dz) = self.spacing();
        (0..self.nz)
            .map(|k| self.zmin + dz * (k as f64 + 0.5))
            .collect()
    }

    /// Cell containing a world coordinate, or None outside the extent.
    pub fn cell_of(&self, x: f64, y: f64, z: f64) -> Option<(usize, usize, usize)> {
        let (dx, dy, dz) = self.spacing();

        let index = |v: f64, min: f64, d: f64, n: usize| -> Option<usize> {
            let i = ((v - min) / d).floor();
            if i < 0.0 || i as usize >= n {
                None
            } else {
                Some(i as usize)
            }
        };

        Some((
            index(x, self.xmin, dx, self.nx)?,
            index(y, self.ymin, dy, self.ny)?,
            index(z, self.zmin, dz, self.nz)?,
        ))
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Physical {
    /// Basal heat flow in W/m^2 (Neumann boundary condition)
    pub basal_heat_flow: f64,
    /// Temperature at sea level in Kelvin
    pub sea_level_temperature: f64,
    /// Atmospheric lapse rate in K/m
    pub lapse_rate: f64,
    /// Thermal conductivity of the air unit; high to mimic outward radiation
    pub air_conductivity: f64,
    /// Simulate conductive heat transport only (`temp` vs `temp head`)
    pub conduction_only: bool,
    pub lateral_boundaries: LateralBoundaries,
}

impl Default for Physical {
    fn default() -> Self {
        Physical {
            basal_heat_flow: 0.07,
            sea_level_temperature: 288.0,
            lapse_rate: 0.0065,
            air_conductivity: 100.0,
            conduction_only: true,
            lateral_boundaries: LateralBoundaries::Closed,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LateralBoundaries {
    Closed,
    Open,
}

/// Borehole subset used for calibration data export.
#[derive(Debug, PartialEq, Deserialize)]
pub struct DataSelection {
    /// Database ids of boreholes passing quality assessment
    pub boreholes: Vec<i64>,
    /// Measurement method filter, e.g. HRT for continuous logs
    pub method: Option<String>,
}

impl Default for DataSelection {
    fn default() -> Self {
        DataSelection {
            boreholes: vec![9, 10, 12, 21, 77, 78, 108, 111, 112, 113, 116, 122, 128, 139],
            method: Some("HRT".to_string()),
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct RejectionParams {
    /// Assumed data uncertainty driving the acceptance probability
    pub uncertainty: f64,
    /// RNG seed, fixed for reproducible ensembles
    pub seed: u64,
    /// Use the ensemble median RMSE as starting reference instead of the first member
    pub median: bool,
}

impl Default for RejectionParams {
    fn default() -> Self {
        RejectionParams {
            uncertainty: 0.01,
            seed: 0,
            median: true,
        }
    }
}

#[cfg(test)]
mod test {
    use {super::*, std::fs::File};

    #[test]
    fn defaults() {
        assert_eq!(
            Parameters::default(),
            serde_yaml::from_reader::<_, Parameters>(
                File::open("src/testdata/defaults.yaml").unwrap()
            )
            .unwrap()
        );
    }

    #[test]
    fn spacing() {
        let grid = Grid::default();
        let (dx, dy, dz) = grid.spacing();
        assert_eq!(dx, 400.0);
        assert_eq!(dy, 400.0);
        assert_eq!(dz, 375.0);
    }

    #[test]
    fn cell_lookup() {
        let grid = Grid::default();
        assert_eq!(grid.cell_of(200.0, 200.0, -6400.0), Some((0, 0, 0)));
        assert_eq!(grid.cell_of(19_999.0, 200.0, 999.0), Some((49, 0, 19)));
        assert_eq!(grid.cell_of(-1.0, 200.0, 0.0), None);
        assert_eq!(grid.cell_of(200.0, 200.0, 1001.0), None);
    }
}
