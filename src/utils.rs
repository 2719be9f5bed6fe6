use {
    anyhow::{ensure, Result},
    byteorder::{ByteOrder, LittleEndian},
    std::{
        fs::File,
        io::{Read, Write},
        path::Path,
    },
};

/// Reads a raw grid file: 8-byte header followed by little-endian f64 values.
pub fn read_r8<P: AsRef<Path>>(path: P) -> Result<Vec<f64>> {
    let mut bytes = Vec::new();
    File::open(path.as_ref())?.read_to_end(&mut bytes)?;

    ensure!(
        bytes.len() >= 8 && (bytes.len() - 8) % 8 == 0,
        "{}: not a valid r8 grid file ({} bytes)",
        path.as_ref().display(),
        bytes.len()
    );

    Ok(bytes
        .chunks(8)
        .skip(1)
        .map(LittleEndian::read_f64)
        .collect())
}

/// Writes a raw grid file with the 8-byte zero header.
pub fn write_r8<P: AsRef<Path>>(path: P, values: &[f64]) -> Result<()> {
    let mut f = File::create(path)?;
    let mut buf = [0u8; 8];
    f.write_all(&buf)?;
    for x in values {
        LittleEndian::write_f64(&mut buf, *x);
        f.write_all(&buf)?;
    }
    Ok(())
}

/// Min-max normalization of a sequence to [0, 1].
pub fn normalize(xs: &[f64]) -> Vec<f64> {
    let min = xs.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    xs.iter().map(|x| (x - min) / (max - min)).collect()
}

/// Index of the element closest to `value`.
pub fn find_nearest(xs: &[f64], value: f64) -> usize {
    let mut idx = 0;
    let mut best = f64::INFINITY;
    for (i, x) in xs.iter().enumerate() {
        let d = (x - value).abs();
        if d < best {
            best = d;
            idx = i;
        }
    }
    idx
}

pub fn median(xs: &[f64]) -> f64 {
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

pub fn harmonic_mean<I: IntoIterator<Item = f64>>(xs: I) -> f64 {
    let mut n = 0usize;
    let mut inv = 0.0;
    for x in xs {
        n += 1;
        inv += 1.0 / x;
    }
    n as f64 / inv
}

/// Formats a real for a SHEMAT-Suite deck: plain decimal with a trailing
/// point in mid range, exponent notation for very small or large values.
pub fn fortran_real(x: f64) -> String {
    if x == 0.0 {
        return "0.".to_string();
    }
    let mag = x.abs();
    if (1.0e-3..1.0e7).contains(&mag) {
        if x.fract() == 0.0 {
            format!("{}.", x as i64)
        } else {
            format!("{}", x)
        }
    } else {
        format!("{:e}", x)
    }
}

/// Fahrenheit to Celsius; `difference` converts a temperature difference instead.
pub fn fahrenheit_to_celsius(temp_fahrenheit: f64, difference: bool) -> f64 {
    if difference {
        temp_fahrenheit * 5.0 / 9.0
    } else {
        (temp_fahrenheit - 32.0) * 5.0 / 9.0
    }
}

#[cfg(test)]
pub(crate) fn assert_approx_eq_slice(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len());
    for (i, e) in a.iter().enumerate() {
        approx::assert_abs_diff_eq!(*e, b[i], epsilon = 1.0E-13);
    }
}

#[cfg(test)]
mod test {
    use {super::*, tempdir::TempDir};

    #[test]
    fn r8_roundtrip() {
        let tempdir = TempDir::new("openwf").unwrap();
        let path = tempdir.path().join("grid.r8");

        let values = vec![0.0, -1.5, 3.25, 6500.0];
        write_r8(&path, &values).unwrap();

        assert_eq!(read_r8(&path).unwrap(), values);
    }

    #[test]
    fn r8_rejects_truncated_file() {
        let tempdir = TempDir::new("openwf").unwrap();
        let path = tempdir.path().join("broken.r8");
        std::fs::write(&path, &[0u8; 13]).unwrap();

        assert!(read_r8(&path).is_err());
    }

    #[test]
    fn normalize_to_unit_interval() {
        assert_approx_eq_slice(&normalize(&[2.0, 4.0, 6.0]), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn nearest_index() {
        let zs = [-6000.0, -4000.0, -2000.0, 0.0];
        assert_eq!(find_nearest(&zs, -3800.0), 1);
        assert_eq!(find_nearest(&zs, 500.0), 3);
    }

    #[test]
    fn median_even_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
    }

    #[test]
    fn harmonic_mean_of_conductivities() {
        approx::assert_abs_diff_eq!(
            harmonic_mean(vec![2.0, 2.0, 2.0]),
            2.0,
            epsilon = 1.0E-13
        );
        approx::assert_abs_diff_eq!(
            harmonic_mean(vec![1.0, 2.0]),
            4.0 / 3.0,
            epsilon = 1.0E-13
        );
    }

    #[test]
    fn fortran_reals() {
        assert_eq!(fortran_real(0.0), "0.");
        assert_eq!(fortran_real(0.07), "0.07");
        assert_eq!(fortran_real(375.0), "375.");
        assert_eq!(fortran_real(3.74), "3.74");
        assert_eq!(fortran_real(2_077_074.0), "2077074.");
        assert_eq!(fortran_real(1.0e-10), "1e-10");
        assert_eq!(fortran_real(1.0e-22), "1e-22");
        assert_eq!(fortran_real(-2.5), "-2.5");
    }

    #[test]
    fn fahrenheit() {
        approx::assert_abs_diff_eq!(fahrenheit_to_celsius(212.0, false), 100.0);
        approx::assert_abs_diff_eq!(fahrenheit_to_celsius(9.0, true), 5.0);
    }
}
