//! The reference iris dataset (Fisher, 1936): 150 samples, 50 per species.
//!
//! Loaded from `linfa-datasets`. Features are
//! `[sepal_length, sepal_width, petal_length, petal_width]` in cm and targets
//! are class indices in [`CLASS_NAMES`](crate::species::CLASS_NAMES) order.

use linfa::dataset::Records;
use linfa::Dataset;
use ndarray::Ix1;

use crate::features::NUM_FEATURES;
use crate::species::{Species, NUM_CLASSES};

pub const SAMPLES_PER_CLASS: usize = 50;
pub const NUM_SAMPLES: usize = SAMPLES_PER_CLASS * NUM_CLASSES;
pub const DATASET_NAME: &str = "Iris flower dataset";

/// One labelled measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub features: [f64; NUM_FEATURES],
    pub species: Species,
}

/// The iris dataset as shipped by `linfa-datasets`.
pub fn iris() -> Dataset<f64, usize, Ix1> {
    linfa_datasets::iris()
}

/// All samples in dataset order. Rows with an unknown class index are skipped.
pub fn samples() -> Vec<Sample> {
    let dataset = iris();
    let records = dataset.records();
    debug_assert_eq!(records.ncols(), NUM_FEATURES);
    debug_assert_eq!(dataset.nsamples(), NUM_SAMPLES);

    records
        .rows()
        .into_iter()
        .zip(dataset.targets().iter())
        .filter_map(|(row, &target)| {
            let species = Species::from_index(target)?;
            let mut features = [0.0; NUM_FEATURES];
            for (slot, value) in features.iter_mut().zip(row.iter()) {
                *slot = *value;
            }
            Some(Sample { features, species })
        })
        .collect()
}
