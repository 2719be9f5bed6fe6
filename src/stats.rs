use anyhow::{ensure, Result};

/// Ordinary least-squares fit of y = slope * x + intercept, with the
/// coefficient of determination of the fit.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl LinearFit {
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self> {
        ensure!(
            x.len() == y.len() && x.len() >= 2,
            "linear fit needs two equally long series of at least 2 points"
        );

        let n = x.len() as f64;
        let mx = x.iter().sum::<f64>() / n;
        let my = y.iter().sum::<f64>() / n;

        let sxx: f64 = x.iter().map(|v| (v - mx) * (v - mx)).sum();
        let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
        ensure!(sxx > 0.0, "all x values are identical");

        let slope = sxy / sxx;
        let intercept = my - slope * mx;

        let ss_res: f64 = x
            .iter()
            .zip(y)
            .map(|(a, b)| {
                let e = b - (slope * a + intercept);
                e * e
            })
            .sum();
        let ss_tot: f64 = y.iter().map(|v| (v - my) * (v - my)).sum();
        let r_squared = if ss_tot == 0.0 {
            1.0
        } else {
            1.0 - ss_res / ss_tot
        };

        Ok(LinearFit {
            slope,
            intercept,
            r_squared,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Two-dimensional Gaussian kernel density estimate with Scott's-rule
/// bandwidth, for judging the distribution of temperature-depth data.
#[derive(Debug, Clone)]
pub struct GaussianKde {
    points: Vec<(f64, f64)>,
    /// Inverse of the bandwidth covariance matrix
    inv: [f64; 3],
    norm: f64,
}

impl GaussianKde {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self> {
        ensure!(
            x.len() == y.len() && x.len() >= 3,
            "kde needs two equally long series of at least 3 points"
        );

        let n = x.len() as f64;
        let mx = x.iter().sum::<f64>() / n;
        let my = y.iter().sum::<f64>() / n;

        // Sample covariance scaled by the squared Scott factor n^(-1/6)
        let factor2 = n.powf(-1.0 / 3.0);
        let cxx = x.iter().map(|v| (v - mx) * (v - mx)).sum::<f64>() / (n - 1.0) * factor2;
        let cyy = y.iter().map(|v| (v - my) * (v - my)).sum::<f64>() / (n - 1.0) * factor2;
        let cxy = x
            .iter()
            .zip(y)
            .map(|(a, b)| (a - mx) * (b - my))
            .sum::<f64>()
            / (n - 1.0)
            * factor2;

        let det = cxx * cyy - cxy * cxy;
        ensure!(det > 0.0, "singular data covariance, kde undefined");

        Ok(GaussianKde {
            points: x.iter().cloned().zip(y.iter().cloned()).collect(),
            inv: [cyy / det, -cxy / det, cxx / det],
            norm: 1.0 / (n * 2.0 * std::f64::consts::PI * det.sqrt()),
        })
    }

    /// Density estimate at one point.
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let [ixx, ixy, iyy] = self.inv;
        let sum: f64 = self
            .points
            .iter()
            .map(|(px, py)| {
                let dx = x - px;
                let dy = y - py;
                (-0.5 * (dx * (ixx * dx + ixy * dy) + dy * (ixy * dx + iyy * dy))).exp()
            })
            .sum();
        self.norm * sum
    }

    /// Density estimates at each input point, e.g. for coloring data by density.
    pub fn evaluate_points(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(y)
            .map(|(&px, &py)| self.evaluate(px, py))
            .collect()
    }
}
