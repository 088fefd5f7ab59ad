use std::convert::TryFrom;
use std::time::Instant;

use crate::math::mean;
use crate::tree::{check_n_features, check_train_data};
use crate::{
    FitError, FitResult, RegressionTree, RowMajorMatrix, TreeParams, DEFAULT_N_ESTIMATORS,
    DEFAULT_SHRINKAGE,
};
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(try_from = "RawBoosterParams")]
pub struct BoosterParams {
    /// Number of trees in the chain.
    pub n_estimators: usize,
    /// Weight of every tree in the prediction, in (0, 1].
    pub shrinkage: f64,
}

#[derive(Deserialize)]
struct RawBoosterParams {
    n_estimators: usize,
    shrinkage: f64,
}

impl TryFrom<RawBoosterParams> for BoosterParams {
    type Error = FitError;

    fn try_from(raw: RawBoosterParams) -> FitResult<Self> {
        let params = BoosterParams {
            n_estimators: raw.n_estimators,
            shrinkage: raw.shrinkage,
        };
        params.validate()?;
        Ok(params)
    }
}

impl BoosterParams {
    pub fn new() -> Self {
        BoosterParams {
            n_estimators: DEFAULT_N_ESTIMATORS,
            shrinkage: DEFAULT_SHRINKAGE,
        }
    }

    pub(crate) fn validate(&self) -> FitResult<()> {
        // Written so NAN is rejected too
        if !(self.shrinkage > 0. && self.shrinkage <= 1.) {
            return Err(FitError::Configuration(format!(
                "shrinkage must be in (0, 1], got {}",
                self.shrinkage
            )));
        }
        Ok(())
    }
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of the residuals a boosting round is about to fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualSummary {
    pub mean: f64,
    /// Root of the mean of the squared residuals, ie the train RMSE before the round.
    pub rmse: f64,
    pub max_abs: f64,
}

impl ResidualSummary {
    fn new(residuals: &[f64]) -> Self {
        let n = residuals.len() as f64;
        ResidualSummary {
            mean: mean(residuals),
            rmse: (residuals.iter().map(|r| r.powi(2)).sum::<f64>() / n).sqrt(),
            max_abs: residuals.iter().fold(0., |acc: f64, r| acc.max(r.abs())),
        }
    }
}

/// Called once per boosting round, before the tree of the round is fitted.
///
/// Any `FnMut(usize, &ResidualSummary)` closure is an observer.
pub trait BoostingObserver {
    fn on_iteration(&mut self, iteration: usize, summary: &ResidualSummary);
}

impl<F: FnMut(usize, &ResidualSummary)> BoostingObserver for F {
    fn on_iteration(&mut self, iteration: usize, summary: &ResidualSummary) {
        self(iteration, summary)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Chain {
    /// Mean of the target, the prediction before any tree.
    base: f64,
    /// Trees in boosting order.
    trees: Vec<RegressionTree>,
}

/// Gradient boosting of regression trees on the squared error.
///
/// Every tree is fitted on the residuals of the cumulative prediction of the previous ones. The
/// prediction is `base + shrinkage * sum(tree predictions)`.
///
/// Deserialization validates the params and the chain. Use the `float_roundtrip` feature of
/// `serde_json` for a JSON round-trip to predict exactly like the original model.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(try_from = "RawGradientBoostedEnsemble")]
pub struct GradientBoostedEnsemble {
    tree_params: TreeParams,
    booster_params: BoosterParams,
    chain: Option<Chain>,
}

#[derive(Deserialize)]
struct RawGradientBoostedEnsemble {
    tree_params: TreeParams,
    booster_params: BoosterParams,
    chain: Option<Chain>,
}

impl TryFrom<RawGradientBoostedEnsemble> for GradientBoostedEnsemble {
    type Error = FitError;

    fn try_from(raw: RawGradientBoostedEnsemble) -> FitResult<Self> {
        if let Some(chain) = &raw.chain {
            if !chain.base.is_finite() {
                return Err(FitError::NonFinite { what: "base" });
            }
            for tree in &chain.trees {
                if !tree.is_fitted() || tree.params() != &raw.tree_params {
                    return Err(FitError::Configuration(
                        "every tree of the chain must be fitted with the ensemble params"
                            .to_string(),
                    ));
                }
            }
        }
        Ok(GradientBoostedEnsemble {
            tree_params: raw.tree_params,
            booster_params: raw.booster_params,
            chain: raw.chain,
        })
    }
}

impl GradientBoostedEnsemble {
    pub fn new(
        num_features: usize,
        max_depth: usize,
        n_estimators: usize,
        shrinkage: f64,
    ) -> FitResult<Self> {
        Self::from_params(
            &TreeParams {
                num_features,
                max_depth,
            },
            &BoosterParams {
                n_estimators,
                shrinkage,
            },
        )
    }

    pub fn from_params(
        tree_params: &TreeParams,
        booster_params: &BoosterParams,
    ) -> FitResult<Self> {
        tree_params.validate()?;
        booster_params.validate()?;
        Ok(GradientBoostedEnsemble {
            tree_params: tree_params.clone(),
            booster_params: booster_params.clone(),
            chain: None,
        })
    }

    pub fn fit(&mut self, features: &RowMajorMatrix<f64>, target: &[f64]) -> FitResult<()> {
        self.fit_with_observer(features, target, &mut |_: usize, _: &ResidualSummary| {})
    }

    /// Same as `fit`, reporting the residuals of every round to `observer`.
    ///
    /// The chain is replaced only once every tree is built: on error the model is left as it
    /// was before the call.
    pub fn fit_with_observer(
        &mut self,
        features: &RowMajorMatrix<f64>,
        target: &[f64],
        observer: &mut impl BoostingObserver,
    ) -> FitResult<()> {
        check_train_data(&self.tree_params, features, target)?;

        let train_start_time = Instant::now();
        let shrinkage = self.booster_params.shrinkage;
        let base = mean(target);
        let mut train_scores = vec![base; target.len()];
        let mut residuals = vec![0.; target.len()];
        let mut trees = Vec::with_capacity(self.booster_params.n_estimators);

        for iter_cnt in 0..self.booster_params.n_estimators {
            for ((residual, &y), &score) in residuals.iter_mut().zip(target).zip(&train_scores) {
                *residual = y - score;
            }
            let summary = ResidualSummary::new(&residuals);
            debug!(
                iteration = iter_cnt,
                residual_mean = summary.mean,
                residual_rmse = summary.rmse,
                residual_max_abs = summary.max_abs,
                "boosting round"
            );
            observer.on_iteration(iter_cnt, &summary);

            let mut tree = RegressionTree::from_params(&self.tree_params)?;
            tree.fit(features, &residuals)?;
            for (score, val) in train_scores.iter_mut().zip(tree.predict(features)?) {
                *score += shrinkage * val;
            }
            trees.push(tree);
        }

        info!(
            n_trees = trees.len(),
            elapsed_secs = train_start_time.elapsed().as_secs_f64(),
            "training of the ensemble finished"
        );
        self.chain = Some(Chain { base, trees });
        Ok(())
    }

    /// `base + shrinkage * sum(tree predictions)`, accumulated tree by tree in boosting order as
    /// during the training.
    pub fn predict(&self, features: &RowMajorMatrix<f64>) -> FitResult<Vec<f64>> {
        let chain = self.checked_chain(features)?;
        let mut predictions = vec![chain.base; features.n_rows()];
        for tree in &chain.trees {
            self.add_tree(tree, features, &mut predictions)?;
        }
        Ok(predictions)
    }

    /// The cumulative predictions after every tree of the chain: the last one is `predict`.
    pub fn staged_predict(&self, features: &RowMajorMatrix<f64>) -> FitResult<Vec<Vec<f64>>> {
        let chain = self.checked_chain(features)?;
        let mut predictions = vec![chain.base; features.n_rows()];
        let mut stages = Vec::with_capacity(chain.trees.len());
        for tree in &chain.trees {
            self.add_tree(tree, features, &mut predictions)?;
            stages.push(predictions.clone());
        }
        Ok(stages)
    }

    fn checked_chain(&self, features: &RowMajorMatrix<f64>) -> FitResult<&Chain> {
        let chain = self.chain.as_ref().ok_or(FitError::UntrainedModel)?;
        check_n_features(&self.tree_params, features)?;
        Ok(chain)
    }

    fn add_tree(
        &self,
        tree: &RegressionTree,
        features: &RowMajorMatrix<f64>,
        predictions: &mut [f64],
    ) -> FitResult<()> {
        let shrinkage = self.booster_params.shrinkage;
        for (prediction, val) in predictions.iter_mut().zip(tree.predict(features)?) {
            *prediction += shrinkage * val;
        }
        Ok(())
    }

    pub fn is_fitted(&self) -> bool {
        self.chain.is_some()
    }

    pub fn base(&self) -> Option<f64> {
        self.chain.as_ref().map(|chain| chain.base)
    }

    pub fn trees(&self) -> &[RegressionTree] {
        match &self.chain {
            Some(chain) => &chain.trees,
            None => &[],
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees().len()
    }

    pub fn tree_params(&self) -> &TreeParams {
        &self.tree_params
    }

    pub fn booster_params(&self) -> &BoosterParams {
        &self.booster_params
    }
}
