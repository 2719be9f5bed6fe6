use {
    crate::{
        results::SimulationResults,
        utils::{find_nearest, harmonic_mean},
    },
    anyhow::{ensure, Result},
    ndarray::{Array2, Array3, Axis},
};

// Zyvoloski et al. (1997) rational-function approximation of the
// enthalpy of liquid water, FEHM report DOI 10.2172/565545.
const ENTHALPY_NUMERATOR: [f64; 10] = [
    0.25623465e-3,
    0.10184405e-2,
    0.22554970e-4,
    0.34836663e-7,
    0.41769866e-2,
    -0.21244879e-4,
    0.25493516e-7,
    0.89557885e-4,
    0.10855046e-6,
    -0.21720560e-6,
];
const ENTHALPY_DENOMINATOR: [f64; 10] = [
    0.10000000e+1,
    0.23513278e-1,
    0.48716386e-4,
    -0.19935046e-8,
    -0.50770309e-2,
    0.57780287e-5,
    0.90972916e-9,
    -0.58981537e-4,
    -0.12990752e-7,
    0.45872518e-8,
];

/// Second-order central differences with one-sided ends, matching
/// NumPy's gradient with unit spacing.
pub fn gradient_1d(xs: &[f64]) -> Vec<f64> {
    let n = xs.len();
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let mut out = Vec::with_capacity(n);
            out.push(xs[1] - xs[0]);
            for i in 1..n - 1 {
                out.push((xs[i + 1] - xs[i - 1]) / 2.0);
            }
            out.push(xs[n - 1] - xs[n - 2]);
            out
        }
    }
}

/// Gradient of a cube along one axis, unit spacing.
pub fn gradient_axis(arr: &Array3<f64>, axis: Axis) -> Array3<f64> {
    let n = arr.len_of(axis);
    let mut out = Array3::zeros(arr.raw_dim());
    if n < 2 {
        return out;
    }

    {
        let mut first = out.index_axis_mut(axis, 0);
        first.assign(&(&arr.index_axis(axis, 1) - &arr.index_axis(axis, 0)));
    }
    for i in 1..n - 1 {
        let centred = (&arr.index_axis(axis, i + 1) - &arr.index_axis(axis, i - 1)) / 2.0;
        out.index_axis_mut(axis, i).assign(&centred);
    }
    {
        let mut last = out.index_axis_mut(axis, n - 1);
        last.assign(&(&arr.index_axis(axis, n - 1) - &arr.index_axis(axis, n - 2)));
    }

    out
}

/// Conductive heat flow components for the whole model cube,
/// q = -lambda * dT/dl, on (nz, ny, nx) arrays.
pub struct HeatFlow {
    pub qx: Array3<f64>,
    pub qy: Array3<f64>,
    pub qz: Array3<f64>,
}

pub fn conductive_heat_flow(
    temp: &Array3<f64>,
    conductivity: (&Array3<f64>, &Array3<f64>, &Array3<f64>),
    spacing: (&Array3<f64>, &Array3<f64>, &Array3<f64>),
) -> HeatFlow {
    let (lx, ly, lz) = conductivity;
    let (dx, dy, dz) = spacing;

    let tdx = gradient_axis(temp, Axis(2)) / dx;
    let tdy = gradient_axis(temp, Axis(1)) / dy;
    let tdz = gradient_axis(temp, Axis(0)) / dz;

    HeatFlow {
        qx: -(lx * &tdx),
        qy: -(ly * &tdy),
        qz: -(lz * &tdz),
    }
}

/// Reads the fields needed for heat flow from a simulation file and
/// computes all three components.
pub fn heat_flow_from_results(results: &SimulationResults) -> Result<HeatFlow> {
    let temp = results.read("temp")?;
    let lx = results.read("lx")?;
    let ly = results.read("ly")?;
    let lz = results.read("lz")?;
    let dx = results.read("delx")?;
    let dy = results.read("dely")?;
    let dz = results.read("delz")?;
    Ok(conductive_heat_flow(&temp, (&lx, &ly, &lz), (&dx, &dy, &dz)))
}

/// Average vertical conductive heat flow over a depth interval
/// `[deeper, shallower]` in m a.s.l. `model_depth` is the depth of the
/// model base below sea level, used to shift the grid z axis.
pub fn heat_flow_interval(
    temp: &Array3<f64>,
    lz: &Array3<f64>,
    z: &[f64],
    model_depth: f64,
    interval: (f64, f64),
    signed: bool,
) -> Result<Array2<f64>> {
    ensure!(z.len() == temp.len_of(Axis(0)), "z axis does not match cube");

    let zasl: Vec<f64> = z.iter().map(|v| v - model_depth).collect();
    let upper = find_nearest(&zasl, interval.0);
    let lower = find_nearest(&zasl, interval.1);
    let (lo, hi) = if upper <= lower {
        (upper, lower)
    } else {
        (lower, upper)
    };
    ensure!(lo < hi, "depth interval collapses to a single cell layer");

    let temp_slab = temp.slice(ndarray::s![lo..=hi, .., ..]).to_owned();
    let temp_diff = gradient_axis(&temp_slab, Axis(0)).sum_axis(Axis(0));

    let lz_slab = lz.slice(ndarray::s![lo..=hi, .., ..]);
    let (_, ny, nx) = temp.dim();
    let tc_av = Array2::from_shape_fn((ny, nx), |(j, i)| {
        harmonic_mean(lz_slab.slice(ndarray::s![.., j, i]).iter().cloned())
    });

    let z_diff: f64 = gradient_1d(&zasl[lo..=hi]).iter().sum();

    let hf = -(tc_av * (temp_diff / z_diff));
    Ok(if signed { hf } else { hf.mapv(f64::abs) })
}

/// Vertical temperature gradient, positive downward by default.
pub fn temperature_gradient(temp: &Array3<f64>, z: &[f64], signed: bool) -> Array3<f64> {
    let dz = gradient_1d(z);
    let mut grad = gradient_axis(temp, Axis(0));
    for (k, mut layer) in grad.axis_iter_mut(Axis(0)).enumerate() {
        layer.mapv_inplace(|v| -v / dz[k]);
    }
    if signed {
        grad
    } else {
        grad.mapv(f64::abs)
    }
}

/// Specific isobaric heat capacity of water in J/(kg K) after
/// Zyvoloski (1997); temperature in Celsius, pressure in Pa.
pub fn water_heat_capacity_point(temp: f64, pressure: f64) -> f64 {
    let y = &ENTHALPY_NUMERATOR;
    let z = &ENTHALPY_DENOMINATOR;

    let t = temp;
    let p = pressure * 1.0e-6;

    let p2 = p * p;
    let p3 = p2 * p;
    let t2 = t * t;
    let t3 = t2 * t;
    let tp = p * t;
    let tp2 = t * p2;
    let t2p = t2 * p;

    let ta = y[0] + y[1] * p + y[2] * p2 + y[3] * p3 + y[4] * t
        + y[5] * t2
        + y[6] * t3
        + y[7] * tp
        + y[8] * tp2
        + y[9] * t2p;
    let tb = z[0] + z[1] * p + z[2] * p2 + z[3] * p3 + z[4] * t
        + z[5] * t2
        + z[6] * t3
        + z[7] * tp
        + z[8] * tp2
        + z[9] * t2p;

    // d(enthalpy)/dT via the quotient rule
    let da = y[4] + 2.0 * y[5] * t + 3.0 * y[6] * t2 + y[7] * p + y[8] * p2 + 2.0 * y[9] * tp;
    let db = z[4] + 2.0 * z[5] * t + 3.0 * z[6] * t2 + z[7] * p + z[8] * p2 + 2.0 * z[9] * tp;

    (da / tb - ta * db / (tb * tb)) * 1.0e6
}

/// Heat capacity of water over the whole cube from simulated
/// temperature and pressure fields.
pub fn water_heat_capacity(temp: &Array3<f64>, pressure: &Array3<f64>) -> Array3<f64> {
    let mut out = temp.clone();
    ndarray::Zip::from(&mut out)
        .and(pressure)
        .apply(|t, &p| *t = water_heat_capacity_point(*t, p));
    out
}
