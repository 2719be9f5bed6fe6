use {
    anyhow::{bail, ensure, Context, Result},
    ndarray::Array2,
    std::{collections::BTreeMap, path::Path},
};

/// One calibration data node from a SHEMAT-Suite forward or inverse run:
/// simulated (`calc`) and observed (`obs`) values at a model cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DataNode {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub calc: f64,
    pub obs: f64,
    pub unit: i32,
    pub borehole: Option<String>,
}

/// Loads a SHEMAT-Suite data node file: two comment lines, a header
/// line naming the columns, then whitespace-separated rows.
pub fn load_data<P: AsRef<Path>>(path: P) -> Result<Vec<DataNode>> {
    let contents = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("reading data file {}", path.as_ref().display()))?;
    let mut lines = contents.lines().skip(2);

    let header = match lines.next() {
        Some(line) => line,
        None => bail!("{}: missing header line", path.as_ref().display()),
    };
    let mut columns: Vec<&str> = header.split_whitespace().collect();
    // The header starts with a comment marker occupying the first field
    if matches!(columns.first(), Some(&"%") | Some(&"#")) {
        columns.remove(0);
    }

    let position = |name: &str| -> Result<usize> {
        columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .with_context(|| format!("{}: no '{}' column", path.as_ref().display(), name))
    };
    let ci = position("i")?;
    let cj = position("j")?;
    let ck = position("k")?;
    let ccalc = position("calc")?;
    let cobs = position("obs")?;
    let cunit = position("unit")?;
    let cname = columns
        .iter()
        .position(|c| c.eq_ignore_ascii_case("Borehole_Name"));

    let mut nodes = Vec::new();
    for (n, line) in lines.enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let parse = |c: usize| -> Result<f64> {
            fields
                .get(c)
                .with_context(|| format!("line {}: missing column {}", n + 4, c + 1))?
                .parse::<f64>()
                .with_context(|| format!("line {}: not a number", n + 4))
        };

        nodes.push(DataNode {
            i: parse(ci)? as usize,
            j: parse(cj)? as usize,
            k: parse(ck)? as usize,
            calc: parse(ccalc)?,
            obs: parse(cobs)?,
            unit: parse(cunit)? as i32,
            borehole: cname.and_then(|c| fields.get(c).map(|s| s.to_string())),
        });
    }

    ensure!(
        !nodes.is_empty(),
        "{}: no data nodes found",
        path.as_ref().display()
    );
    Ok(nodes)
}

/// Parameter blocks of a gradient-based inversion, keyed by their
/// `#` header lines. Each block line holds floats up to a `unit` marker.
pub fn read_parameter_file<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, Array2<f64>>> {
    let contents = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("reading parameter file {}", path.as_ref().display()))?;

    let mut sections = BTreeMap::new();
    let mut name: Option<String> = None;
    let mut rows: Vec<Vec<f64>> = Vec::new();

    let mut finish = |name: &Option<String>, rows: &mut Vec<Vec<f64>>| -> Result<()> {
        if let Some(name) = name {
            if !rows.is_empty() {
                let width = rows[0].len();
                ensure!(
                    rows.iter().all(|r| r.len() == width),
                    "section '{}' has ragged rows",
                    name
                );
                let flat: Vec<f64> = rows.iter().flatten().cloned().collect();
                sections.insert(
                    name.clone(),
                    Array2::from_shape_vec((rows.len(), width), flat)?,
                );
            }
            rows.clear();
        }
        Ok(())
    };

    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') || trimmed.starts_with('%') {
            finish(&name, &mut rows)?;
            name = Some(trimmed.trim_start_matches('%').trim().to_string());
            continue;
        }
        if trimmed.is_empty() || name.is_none() {
            continue;
        }

        let mut values = Vec::new();
        for token in trimmed.split_whitespace() {
            if token.eq_ignore_ascii_case("unit") {
                break;
            }
            values.push(
                token
                    .parse::<f64>()
                    .with_context(|| format!("unparsable value '{}' in parameter file", token))?,
            );
        }
        if !values.is_empty() {
            rows.push(values);
        }
    }
    finish(&name, &mut rows)?;

    ensure!(
        !sections.is_empty(),
        "{}: no parameter sections found",
        path.as_ref().display()
    );
    Ok(sections)
}

/// First section whose header contains the pattern.
pub fn section<'a>(
    sections: &'a BTreeMap<String, Array2<f64>>,
    pattern: &str,
) -> Option<&'a Array2<f64>> {
    sections
        .iter()
        .find(|(name, _)| name.contains(pattern))
        .map(|(_, values)| values)
}

/// The apriori unit parameters of an inversion.
pub fn apriori(sections: &BTreeMap<String, Array2<f64>>) -> Option<&Array2<f64>> {
    sections
        .iter()
        .find(|(name, _)| name.contains("apriori") && !name.contains("aposteriori"))
        .map(|(_, values)| values)
}

/// The final aposteriori unit parameters of an inversion.
pub fn aposteriori(sections: &BTreeMap<String, Array2<f64>>) -> Option<&Array2<f64>> {
    sections
        .iter()
        .find(|(name, _)| name.contains("units (aposteriori)") && !name.contains("bcunits"))
        .map(|(_, values)| values)
}
