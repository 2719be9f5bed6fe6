use {
    crate::{parameters::RejectionParams, utils::median},
    anyhow::{ensure, Result},
    log::info,
    rand::{rngs::StdRng, Rng, SeedableRng},
};

/// Root mean square error between simulated and observed values.
pub fn rmse(predicted: &[f64], observed: &[f64]) -> Result<f64> {
    ensure!(
        predicted.len() == observed.len() && !predicted.is_empty(),
        "rmse needs two equally long, non-empty series"
    );
    let sum: f64 = predicted
        .iter()
        .zip(observed)
        .map(|(p, o)| (p - o) * (p - o))
        .sum();
    Ok((sum / predicted.len() as f64).sqrt())
}

/// Rejection sampling over the per-realization RMSE of a Monte Carlo
/// ensemble. Realizations better than the running reference are always
/// accepted; worse ones with probability exp(-(rmse - ref)/u_g). The
/// reference follows the last accepted realization. Returns accepted
/// indices and the acceptance probabilities of the non-improving ones.
pub fn rejection_sample(
    rmse_series: &[f64],
    cfg: &RejectionParams,
) -> (Vec<usize>, Vec<f64>) {
    if rmse_series.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let (mut reference, start) = if cfg.median {
        (median(rmse_series), 0)
    } else {
        (rmse_series[0], 1)
    };

    let mut accepted = Vec::new();
    let mut probabilities = Vec::new();

    for (i, &value) in rmse_series.iter().enumerate().skip(start) {
        if value < reference {
            reference = value;
            accepted.push(i);
        } else {
            let p = (-(value - reference) / cfg.uncertainty).exp();
            if rng.gen::<f64>() < p {
                probabilities.push(p);
                reference = value;
                accepted.push(i);
            }
        }
    }

    info!("{} realizations were accepted.", accepted.len());

    (accepted, probabilities)
}
