use crate::{FitError, FitResult, RowMajorMatrix};

/// Util for parsing a CSV without headers into a dataset.
///
/// The first column of the CSV must be the target, the others are the features.
pub fn parse_csv(data: &str, sep: &str) -> FitResult<Dataset> {
    let mut target: Vec<f64> = Vec::new();
    let mut features: Vec<Vec<f64>> = Vec::new();
    for (n_line, l) in data.lines().enumerate() {
        if l.trim().is_empty() {
            continue;
        }
        let mut items = l.split(sep).map(str::trim);
        let first = items
            .next()
            .ok_or_else(|| FitError::Parse(format!("no target on line {}", n_line + 1)))?;
        target.push(first.parse()?);
        features.push(items.map(|e| e.parse()).collect::<Result<_, _>>()?);
    }
    let features = RowMajorMatrix::from_rows(features)?;

    Ok(Dataset { features, target })
}

/// Store the raw data.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Predictor for the learning
    pub features: RowMajorMatrix<f64>,
    /// Target, used for the learning
    pub target: Vec<f64>,
}

impl Dataset {
    pub fn n_rows(&self) -> usize {
        self.target.len()
    }

    /// Split the rows in two datasets: the rows where `mask` is true, then the others.
    pub fn split_by_mask(&self, mask: &[bool]) -> FitResult<(Dataset, Dataset)> {
        let inverse: Vec<bool> = mask.iter().map(|&keep| !keep).collect();
        let pick = |mask: &[bool]| -> FitResult<Dataset> {
            let features = self.features.select_rows(mask)?;
            let target = self
                .target
                .iter()
                .zip(mask)
                .filter(|(_, &keep)| keep)
                .map(|(&y, _)| y)
                .collect();
            Ok(Dataset { features, target })
        };
        Ok((pick(mask)?, pick(&inverse)?))
    }
}
