//! Sample collections of gridded climate fields.
//!
//! Samples are (ensemble member, year) pairs stacked member-major into a
//! single sample axis. `GridFields` maps each variable name to a
//! `(sample, lat, lon)` array and `GridDataset` pairs those fields with the
//! binary threshold-exceedance labels.
use std::collections::BTreeMap;

use ndarray::{Array1, Array2, Array3, Array4, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Identifies one sample: an ensemble member and a simulated year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SampleId {
    pub member: usize,
    pub year: i32,
}

impl SampleId {
    pub fn new(member: usize, year: i32) -> Self {
        Self { member, year }
    }

    /// Sample ids for every (member, year) pair, member-major.
    ///
    /// This is the order produced by [`stack_ensemble`] and
    /// [`labels_from_table`].
    pub fn ensemble_grid(n_members: usize, years: &[i32]) -> Vec<SampleId> {
        (0..n_members)
            .flat_map(|member| years.iter().map(move |&year| SampleId::new(member, year)))
            .collect()
    }
}

/// Collapse an `(ens, time, lat, lon)` array into `(ens * time, lat, lon)`,
/// member-major.
pub fn stack_ensemble(values: &Array4<f64>) -> Array3<f64> {
    let (n_ens, n_time, n_lat, n_lon) = values.dim();
    Array3::from_shape_fn((n_ens * n_time, n_lat, n_lon), |(s, i, j)| {
        values[[s / n_time, s % n_time, i, j]]
    })
}

/// Flatten a `(year, member)` label table into one label per sample,
/// member-major, matching [`stack_ensemble`].
pub fn labels_from_table(table: &Array2<u8>) -> Array1<u8> {
    table.t().iter().copied().collect()
}

/// Check that every label is a binary indicator.
pub fn validate_labels(labels: &[u8]) -> Result<()> {
    match labels.iter().position(|&v| v > 1) {
        Some(index) => Err(PipelineError::InvalidLabel {
            index,
            value: labels[index],
        }),
        None => Ok(()),
    }
}

/// Mapping from variable name to a `(sample, lat, lon)` array.
///
/// All variables share the same sample axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridFields {
    fields: BTreeMap<String, Array3<f64>>,
}

impl GridFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a variable. Fails when its sample count or grid shape
    /// disagrees with the variables already present.
    pub fn insert(&mut self, name: impl Into<String>, values: Array3<f64>) -> Result<()> {
        let name = name.into();
        let other = self
            .fields
            .iter()
            .find(|(k, _)| **k != name)
            .map(|(_, v)| v.dim());
        if let Some((expected_rows, expected_lat, expected_lon)) = other {
            let (got_rows, got_lat, got_lon) = values.dim();
            if got_rows != expected_rows {
                return Err(PipelineError::LengthMismatch {
                    what: "field sample count",
                    expected: expected_rows,
                    got: got_rows,
                });
            }
            if (got_lat, got_lon) != (expected_lat, expected_lon) {
                return Err(PipelineError::GridShapeMismatch {
                    variable: name,
                    expected: (expected_lat, expected_lon),
                    got: (got_lat, got_lon),
                });
            }
        }
        self.fields.insert(name, values);
        Ok(())
    }

    /// Builder-style variant of [`GridFields::insert`].
    pub fn with_field(mut self, name: impl Into<String>, values: Array3<f64>) -> Result<Self> {
        self.insert(name, values)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Result<&Array3<f64>> {
        self.fields
            .get(name)
            .ok_or_else(|| PipelineError::MissingVariable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of samples; zero when no variable is present.
    pub fn n_samples(&self) -> usize {
        self.fields
            .values()
            .next()
            .map_or(0, |v| v.len_of(Axis(0)))
    }

    pub fn grid_shape(&self, name: &str) -> Result<(usize, usize)> {
        let (_, n_lat, n_lon) = self.get(name)?.dim();
        Ok((n_lat, n_lon))
    }

    /// Keep only the given samples, in the given order.
    pub fn select(&self, indices: &[usize]) -> Result<GridFields> {
        let len = self.n_samples();
        if self.is_empty() {
            return Ok(GridFields::new());
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(PipelineError::IndexOutOfBounds { index, len });
        }
        let fields = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.select(Axis(0), indices)))
            .collect();
        Ok(GridFields { fields })
    }
}

/// Labeled collection of gridded samples.
#[derive(Debug, Clone, PartialEq)]
pub struct GridDataset {
    pub fields: GridFields,
    /// 1 when the winter rainfall threshold was exceeded.
    pub labels: Array1<u8>,
    pub samples: Vec<SampleId>,
}

impl GridDataset {
    pub fn new(fields: GridFields, labels: Array1<u8>, samples: Vec<SampleId>) -> Result<Self> {
        if !fields.is_empty() && fields.n_samples() != labels.len() {
            return Err(PipelineError::LengthMismatch {
                what: "labels",
                expected: fields.n_samples(),
                got: labels.len(),
            });
        }
        if samples.len() != labels.len() {
            return Err(PipelineError::LengthMismatch {
                what: "sample ids",
                expected: labels.len(),
                got: samples.len(),
            });
        }
        validate_labels(&labels.to_vec())?;
        Ok(Self {
            fields,
            labels,
            samples,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn select(&self, indices: &[usize]) -> Result<GridDataset> {
        let len = self.n_samples();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(PipelineError::IndexOutOfBounds { index, len });
        }
        let fields = self.fields.select(indices)?;
        let labels = self.labels.select(Axis(0), indices);
        let samples = indices.iter().map(|&i| self.samples[i]).collect();
        Ok(GridDataset {
            fields,
            labels,
            samples,
        })
    }

    /// Fraction of samples labeled 1.
    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().filter(|&&v| v == 1).count() as f64 / self.labels.len() as f64
    }

    /// Distinct ensemble members, ascending.
    pub fn members(&self) -> Vec<usize> {
        let mut members: Vec<usize> = self.samples.iter().map(|s| s.member).collect();
        members.sort_unstable();
        members.dedup();
        members
    }

    pub fn log_input_data_summary(&self) {
        log::info!("----- Input Data Summary -----");
        log::info!(
            "{} samples from {} ensemble members ({} exceed the threshold, {:.1}%)",
            self.n_samples(),
            self.members().len(),
            self.labels.iter().filter(|&&v| v == 1).count(),
            self.positive_rate() * 100.0
        );
        for name in self.fields.variables() {
            if let Ok((n_lat, n_lon)) = self.fields.grid_shape(name) {
                log::info!("Variable {}: {} x {} grid", name, n_lat, n_lon);
            }
        }
        log::info!("-------------------------------");
    }
}

/// One train/test split of the sample axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub held_out_member: usize,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Leave-one-member-out splits: each fold holds out every sample of one
/// ensemble member. Members are visited in ascending order.
pub fn leave_one_member_out(samples: &[SampleId]) -> Vec<Fold> {
    let mut members: Vec<usize> = samples.iter().map(|s| s.member).collect();
    members.sort_unstable();
    members.dedup();

    members
        .into_iter()
        .map(|member| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..samples.len()).partition(|&i| samples[i].member == member);
            log::trace!(
                "Fold holding out member {}: {} train / {} test samples",
                member,
                train.len(),
                test.len()
            );
            Fold {
                held_out_member: member,
                train,
                test,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_stack_ensemble_is_member_major() {
        let values = Array4::from_shape_fn((2, 3, 1, 2), |(e, t, _, j)| {
            (e * 100 + t * 10 + j) as f64
        });
        let stacked = stack_ensemble(&values);
        assert_eq!(stacked.dim(), (6, 1, 2));
        assert_eq!(stacked[[0, 0, 1]], 1.0);
        assert_eq!(stacked[[2, 0, 0]], 20.0);
        assert_eq!(stacked[[3, 0, 0]], 100.0);
        assert_eq!(stacked[[5, 0, 1]], 121.0);
    }

    #[test]
    fn test_labels_from_table_concatenates_members() {
        // rows are years, columns are members
        let table = array![[1u8, 0], [0, 0], [1, 1]];
        let labels = labels_from_table(&table);
        assert_eq!(labels.to_vec(), vec![1, 0, 1, 0, 0, 1]);

        let ids = SampleId::ensemble_grid(2, &[1920, 1921, 1922]);
        assert_eq!(ids[3], SampleId::new(1, 1920));
    }

    #[test]
    fn test_insert_rejects_sample_count_mismatch() {
        let mut fields = GridFields::new();
        fields.insert("TS", Array3::zeros((4, 2, 2))).unwrap();
        let err = fields.insert("PSL", Array3::zeros((3, 2, 2))).unwrap_err();
        assert!(matches!(err, PipelineError::LengthMismatch { .. }));
        // replacing the only variable is allowed
        fields.insert("TS", Array3::zeros((5, 2, 2))).unwrap();
        assert_eq!(fields.n_samples(), 5);
    }

    #[test]
    fn test_select_out_of_bounds() {
        let fields = GridFields::new()
            .with_field("TS", Array3::zeros((3, 2, 2)))
            .unwrap();
        assert_eq!(fields.select(&[2, 0]).unwrap().n_samples(), 2);
        assert_eq!(
            fields.select(&[3]).unwrap_err(),
            PipelineError::IndexOutOfBounds { index: 3, len: 3 }
        );
    }
}
