use crate::{Dataset, RowMajorMatrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Piecewise constant target with some noise, over features taking few distinct values so the
/// split search sees duplicates.
pub(crate) fn synthetic_dataset(n_rows: usize, n_cols: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let values: Vec<f64> = (0..n_rows * n_cols)
        .map(|_| rng.gen_range(0..12) as f64 / 2.)
        .collect();
    let features = RowMajorMatrix::from_vec(n_rows, n_cols, values).expect("buffer size");
    let target = features
        .rows()
        .map(|row| {
            let step = if row[0] < 3. { -2. } else { 5. };
            let slope = row.get(1).map_or(0., |x| 0.5 * x);
            step + slope + rng.gen_range(-0.5..0.5)
        })
        .collect();
    Dataset { features, target }
}
