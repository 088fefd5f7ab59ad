use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rtree_boost::{parse_csv, rmse, Dataset, RegressionTree};
use std::error::Error;

/// A noisy sine, written as "target,feature" lines
fn make_csv(n_rows: usize, rng: &mut StdRng) -> String {
    let mut o = String::new();
    for _ in 0..n_rows {
        let x: f64 = rng.gen_range(0.0..6.0);
        let y = x.sin() + rng.gen_range(-0.2..0.2);
        o.push_str(&format!("{},{}\n", y, x));
    }
    o
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(42);
    let data: Dataset = parse_csv(&make_csv(500, &mut rng), ",")?;
    let mask: Vec<bool> = (0..data.n_rows()).map(|i| i % 5 != 0).collect();
    let (train, test) = data.split_by_mask(&mask)?;

    for max_depth in 0..8 {
        let mut tree = RegressionTree::new(train.features.n_cols(), max_depth)?;
        tree.fit(&train.features, &train.target)?;

        println!(
            "max_depth={} leaves={} RMSE train {:.8} RMSE test {:.8}",
            max_depth,
            tree.n_leaves(),
            rmse(&train.target, &tree.predict(&train.features)?),
            rmse(&test.target, &tree.predict(&test.features)?)
        );
    }

    Ok(())
}
