//! In-memory similarity index over deployed-solution vectors.
//!
//! Brute-force L2 scan; the catalog is small (tens of entries) and
//! rebuilt from the store at startup, so nothing fancier is warranted.

use crate::types::SolutionRecord;

/// A query hit: the stored record plus its L2 distance from the query.
#[derive(Debug, Clone)]
pub struct IndexHit {
    pub record: SolutionRecord,
    pub distance: f64,
}

#[derive(Default)]
pub struct SimilarityIndex {
    entries: Vec<(Vec<f32>, SolutionRecord)>,
}

impl SimilarityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, vector: Vec<f32>, record: SolutionRecord) {
        self.entries.push((vector, record));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Up to `k` nearest entries, ascending by L2 distance.
    pub fn query(&self, vector: &[f32], k: usize) -> Vec<IndexHit> {
        let mut hits: Vec<IndexHit> = self
            .entries
            .iter()
            .map(|(v, record)| IndexHit {
                record: record.clone(),
                distance: l2_distance(vector, v),
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        hits
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Map an L2 distance to a [0, 1] similarity score.
pub fn similarity_from_distance(distance: f64) -> f64 {
    (1.0 - distance / 2.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> SolutionRecord {
        SolutionRecord {
            id: id.to_string(),
            title: id.to_string(),
            hospital: "Meridian General".to_string(),
            description: String::new(),
            status: "deployed".to_string(),
            contact: "ops@example.org".to_string(),
            roi: 1.0,
            value: 100_000,
        }
    }

    #[test]
    fn test_similarity_identity() {
        assert_eq!(similarity_from_distance(0.0), 1.0);
    }

    #[test]
    fn test_similarity_decreases_and_clamps() {
        assert!(similarity_from_distance(0.5) > similarity_from_distance(1.0));
        assert_eq!(similarity_from_distance(3.0), 0.0);
    }

    #[test]
    fn test_query_orders_nearest_first() {
        let mut index = SimilarityIndex::new();
        index.insert(vec![0.0, 0.0], record("origin"));
        index.insert(vec![1.0, 0.0], record("near"));
        index.insert(vec![5.0, 5.0], record("far"));

        let hits = index.query(&[0.1, 0.0], 3);
        assert_eq!(hits[0].record.id, "origin");
        assert_eq!(hits[1].record.id, "near");
        assert_eq!(hits[2].record.id, "far");
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[test]
    fn test_query_truncates_to_k() {
        let mut index = SimilarityIndex::new();
        for i in 0..5 {
            index.insert(vec![i as f32], record(&format!("s{}", i)));
        }
        assert_eq!(index.query(&[0.0], 2).len(), 2);
    }
}
