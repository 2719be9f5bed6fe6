use {
    crate::parameters::DataSelection,
    anyhow::{bail, ensure, Context, Result},
    log::info,
    rusqlite::{params, Connection, ToSql},
    std::{fs::File, io::Write, path::Path},
};

/// General information about one borehole.
#[derive(Debug, Clone, PartialEq)]
pub struct BoreholeInfo {
    pub nr: i64,
    pub name: String,
    pub x: f64,
    pub y: f64,
    /// Wellhead elevation in m a.s.l.
    pub z: f64,
    pub depth: Option<f64>,
    /// Data restriction; confidential records can be removed wholesale
    pub restriction: Option<String>,
}

/// One temperature measurement in a borehole.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureRecord {
    pub nr: i64,
    /// Measured depth below wellhead in m
    pub depth: f64,
    /// Elevation of the measurement in m a.s.l.
    pub depth_asl: Option<f64>,
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Measurement method, e.g. HRT for continuous logs, BHT for bottom-hole values
    pub method: Option<String>,
}

/// SQLite store of borehole temperature measurements for the study area.
pub struct BoreholeDatabase {
    conn: Connection,
}

impl BoreholeDatabase {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        ensure!(
            path.as_ref().is_file(),
            "borehole database {} does not exist",
            path.as_ref().display()
        );
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("opening database {}", path.as_ref().display()))?;
        Ok(Self { conn })
    }

    /// Empty in-memory database with the borehole schema, used by tests
    /// and for compiling new databases.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("testdata/schema.sql"))?;
        Ok(Self { conn })
    }

    /// Creates a database file with the borehole schema.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("creating database {}", path.as_ref().display()))?;
        conn.execute_batch(include_str!("testdata/schema.sql"))?;
        Ok(Self { conn })
    }

    /// Names of all tables in the database.
    pub fn tables(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    /// Column names of a table.
    pub fn columns(&self, table: &str) -> Result<Vec<String>> {
        ensure!(
            table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_'),
            "invalid table name: {}",
            table
        );
        let stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {} LIMIT 0", table))?;
        Ok(stmt.column_names().iter().map(|s| s.to_string()).collect())
    }

    pub fn insert_borehole(&self, info: &BoreholeInfo) -> Result<()> {
        self.conn.execute(
            "INSERT INTO borehole_information_temperatures
             (Nr, Namenach, X, Y, Z, Tiefe_m, Restriktion)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                info.nr,
                info.name,
                info.x,
                info.y,
                info.z,
                info.depth,
                info.restriction
            ],
        )?;
        Ok(())
    }

    pub fn insert_temperature(&self, record: &TemperatureRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO temperature_data (Nr, Depth, Depth_asl, Temperature, Method)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.nr,
                record.depth,
                record.depth_asl,
                record.temperature,
                record.method
            ],
        )?;
        Ok(())
    }

    pub fn borehole(&self, nr: i64) -> Result<Option<BoreholeInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT Nr, Namenach, X, Y, Z, Tiefe_m, Restriktion
             FROM borehole_information_temperatures WHERE Nr = ?1",
        )?;
        let mut rows = stmt.query(params![nr])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::info_from_row(row)?)),
            None => Ok(None),
        }
    }

    pub fn boreholes(&self) -> Result<Vec<BoreholeInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT Nr, Namenach, X, Y, Z, Tiefe_m, Restriktion
             FROM borehole_information_temperatures ORDER BY Nr",
        )?;
        let infos = stmt
            .query_map([], |row| {
                Ok(BoreholeInfo {
                    nr: row.get(0)?,
                    name: row.get(1)?,
                    x: row.get(2)?,
                    y: row.get(3)?,
                    z: row.get(4)?,
                    depth: row.get(5)?,
                    restriction: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(infos)
    }

    fn info_from_row(row: &rusqlite::Row) -> Result<BoreholeInfo> {
        Ok(BoreholeInfo {
            nr: row.get(0)?,
            name: row.get(1)?,
            x: row.get(2)?,
            y: row.get(3)?,
            z: row.get(4)?,
            depth: row.get(5)?,
            restriction: row.get(6)?,
        })
    }

    /// Temperature log of one borehole, optionally restricted to a
    /// measurement method, ordered by depth.
    pub fn temperatures(&self, nr: i64, method: Option<&str>) -> Result<Vec<TemperatureRecord>> {
        self.temperatures_for(&[nr], method)
    }

    /// Temperature logs of several boreholes at once.
    pub fn temperatures_for(
        &self,
        nrs: &[i64],
        method: Option<&str>,
    ) -> Result<Vec<TemperatureRecord>> {
        if nrs.is_empty() {
            bail!("no borehole numbers given");
        }

        let placeholders = vec!["?"; nrs.len()].join(",");
        let mut sql = format!(
            "SELECT Nr, Depth, Depth_asl, Temperature, Method
             FROM temperature_data WHERE Nr IN ({})",
            placeholders
        );
        if method.is_some() {
            sql.push_str(" AND Method = ?");
        }
        sql.push_str(" ORDER BY Nr, Depth");

        let mut values: Vec<&dyn ToSql> = nrs.iter().map(|nr| nr as &dyn ToSql).collect();
        if let Some(m) = method.as_ref() {
            values.push(m as &dyn ToSql);
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(&values[..], |row| {
                Ok(TemperatureRecord {
                    nr: row.get(0)?,
                    depth: row.get(1)?,
                    depth_asl: row.get(2)?,
                    temperature: row.get(3)?,
                    method: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Distinct borehole numbers appearing in the temperature data.
    pub fn distinct_boreholes(&self) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT Nr FROM temperature_data ORDER BY Nr")?;
        let nrs = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(nrs)
    }

    /// Writes the calibration data file consumed by the deck exporter:
    /// a comment header followed by `x y z temperature` rows. The
    /// measurement elevation falls back to wellhead elevation minus depth
    /// when no Depth_asl is stored. Returns the number of records.
    pub fn export_shemat_data<P: AsRef<Path>>(
        &self,
        selection: &DataSelection,
        path: P,
    ) -> Result<usize> {
        let records = self.temperatures_for(&selection.boreholes, selection.method.as_deref())?;

        let mut f = File::create(path.as_ref())?;
        writeln!(f, "# x y z temperature")?;
        let mut written = 0;
        for record in &records {
            let info = self
                .borehole(record.nr)?
                .with_context(|| format!("borehole {} missing from information table", record.nr))?;
            let z = record.depth_asl.unwrap_or(info.z - record.depth);
            writeln!(f, "{} {} {} {}", info.x, info.y, z, record.temperature)?;
            written += 1;
        }

        info!(
            "Exported {} temperature records from {} boreholes to {}",
            written,
            selection.boreholes.len(),
            path.as_ref().display()
        );

        Ok(written)
    }
}
