use {
    crate::{
        constants::{
            AIR_PERMEABILITY, AIR_POROSITY, DEFAULT_CONDUCTIVITY, DEFAULT_PERMEABILITY,
            DEFAULT_POROSITY, UNIT_COMPRESSIBILITY, UNIT_DISPERSIVITY, UNIT_HEAT_CAPACITY,
            UNIT_HEAT_PRODUCTION,
        },
        utils::fortran_real,
    },
    anyhow::{ensure, Context, Result},
    serde::Deserialize,
    std::{fs::File, path::Path},
};

/// Petrophysical description of one geological unit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Unit {
    pub name: String,
    pub id: i32,
    pub porosity: f64,
    /// Permeability in m^2
    pub permeability: f64,
    /// Vertical thermal conductivity in W/(m K)
    pub conductivity: f64,
}

/// The `# units` table of a SHEMAT-Suite model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnitTable {
    pub units: Vec<Unit>,
}

impl UnitTable {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("opening unit table {}", path.as_ref().display()))?;
        let table: UnitTable = serde_yaml::from_reader(file)
            .with_context(|| format!("parsing unit table {}", path.as_ref().display()))?;
        ensure!(!table.units.is_empty(), "unit table is empty");
        Ok(table)
    }

    /// Fallback table with default petrophysical properties for units 1..=n.
    pub fn with_defaults(n: usize) -> Self {
        UnitTable {
            units: (1..=n as i32)
                .map(|id| Unit {
                    name: format!("unit_{}", id),
                    id,
                    porosity: DEFAULT_POROSITY,
                    permeability: DEFAULT_PERMEABILITY,
                    conductivity: DEFAULT_CONDUCTIVITY,
                })
                .collect(),
        }
    }

    /// Appends the air unit covering cells above the topography.
    pub fn push_air(&mut self, id: i32, conductivity: f64) {
        self.units.push(Unit {
            name: "air".to_string(),
            id,
            porosity: AIR_POROSITY,
            permeability: AIR_PERMEABILITY,
            conductivity,
        });
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Renders the table rows for the deck, one unit per line in id order.
    pub fn render(&self) -> String {
        let mut sorted: Vec<&Unit> = self.units.iter().collect();
        sorted.sort_by_key(|u| u.id);

        let mut out = String::new();
        for unit in sorted {
            out.push_str(&format!(
                "{}    1.d0  1.d0  {}\t {}  1.d0  1.d0  {}\t{}  {}  {}  {}\t!{} \n",
                fortran_real(unit.porosity),
                fortran_real(unit.permeability),
                fortran_real(UNIT_COMPRESSIBILITY),
                fortran_real(unit.conductivity),
                fortran_real(0.0),
                fortran_real(UNIT_HEAT_CAPACITY),
                fortran_real(UNIT_HEAT_PRODUCTION),
                fortran_real(UNIT_DISPERSIVITY),
                unit.name,
            ));
        }
        out
    }
}
