use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rtree_boost::{
    rmse, BoosterParams, Dataset, GradientBoostedEnsemble, ResidualSummary, RowMajorMatrix,
    TreeParams,
};
use std::error::Error;
use std::io;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn make_dataset(n_rows: usize, rng: &mut StdRng) -> Dataset {
    let features = RowMajorMatrix::from_function(n_rows, 3, |_, _| rng.gen_range(-2.0f64..2.0));
    let target = features
        .rows()
        .map(|row| row[0] * row[1] + row[2].abs() + rng.gen_range(-0.1..0.1))
        .collect();
    Dataset { features, target }
}

fn main() -> Result<(), Box<dyn Error>> {
    // RUST_LOG=debug shows every boosting round
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut rng = StdRng::seed_from_u64(7);
    let train = make_dataset(800, &mut rng);
    let test = make_dataset(200, &mut rng);

    let tree_params = TreeParams {
        num_features: 3,
        max_depth: 3,
    };
    let booster_params = BoosterParams {
        n_estimators: 50,
        shrinkage: 0.2,
    };
    println!(
        "Params booster={:?} tree={:?}",
        booster_params, tree_params
    );

    let train_start_time = Instant::now();
    let mut gbt = GradientBoostedEnsemble::from_params(&tree_params, &booster_params)?;
    gbt.fit_with_observer(
        &train.features,
        &train.target,
        &mut |iteration: usize, summary: &ResidualSummary| {
            if iteration % 10 == 0 {
                println!("Iter {}, train RMSE {:.8}", iteration, summary.rmse);
            }
        },
    )?;
    println!(
        "Training of {} trees finished. Elapsed: {:.2} secs",
        gbt.n_trees(),
        train_start_time.elapsed().as_secs_f64()
    );

    for (n_trees, yhat) in gbt.staged_predict(&test.features)?.iter().enumerate() {
        if (n_trees + 1) % 10 == 0 {
            println!("{} trees, RMSE test {:.8}", n_trees + 1, rmse(&test.target, yhat));
        }
    }

    // The model is plain data: it round trips through any serde format
    let serialized = serde_json::to_string(&gbt)?;
    let gbt: GradientBoostedEnsemble = serde_json::from_str(&serialized)?;
    println!("Serialized model: {} bytes", serialized.len());

    let yhat_test = gbt.predict(&test.features)?;
    let mut wtr = csv::Writer::from_writer(io::stdout());
    wtr.write_record(&["true_val", "yhat"])?;
    for (true_val, yhat) in test.target.iter().zip(yhat_test.iter()).take(10) {
        wtr.write_record(&[true_val.to_string(), yhat.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
