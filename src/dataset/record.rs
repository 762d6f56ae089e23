//! Sparse-vector record types
//!
//! Two record shapes come out of the dataset files: training rows to be
//! indexed, and query rows carrying ground-truth neighbors for recall
//! evaluation. Records are transient: built while their JSON object is
//! open, handed to the caller once when it closes.

/// Which parallel array of a record is currently open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayField {
    DimIds,
    Weights,
    Neighbors,
    Distances,
}

impl ArrayField {
    /// Index arrays hold u32 ids; the others hold f32 values
    pub fn holds_indices(self) -> bool {
        matches!(self, ArrayField::DimIds | ArrayField::Neighbors)
    }
}

/// A record shape assembled field-by-field from tokenizer events
pub trait RowShape: Default {
    /// JSON key carrying the record identifier
    const ID_KEY: &'static str;

    fn set_id(&mut self, id: u32);

    fn set_text(&mut self, text: String);

    /// Map a JSON key to the parallel array it opens, if recognized
    fn array_field(key: &str) -> Option<ArrayField>;

    /// Append an id to one of the shape's index arrays
    fn push_index(&mut self, field: ArrayField, value: u32);

    /// Append a value to one of the shape's float arrays
    fn push_value(&mut self, field: ArrayField, value: f32);
}

/// A document to be indexed: sparse vector plus source text
///
/// `dim_ids` and `weights` are parallel arrays; position `i` in both is one
/// sparse-vector term. The loader delivers them as found in the file, so a
/// malformed file can yield mismatched lengths (see [`TrainingRow::terms`]).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TrainingRow {
    pub row_id: u32,
    pub text: String,
    pub dim_ids: Vec<u32>,
    pub weights: Vec<f32>,
}

impl TrainingRow {
    /// Sparse-vector terms in (dimension id, weight) order, ready for the
    /// engine boundary. Pairs up to the shorter of the two arrays.
    pub fn terms(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.dim_ids.iter().copied().zip(self.weights.iter().copied())
    }
}

impl RowShape for TrainingRow {
    const ID_KEY: &'static str = "row_id";

    fn set_id(&mut self, id: u32) {
        self.row_id = id;
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
    }

    fn array_field(key: &str) -> Option<ArrayField> {
        match key {
            "dim_ids" => Some(ArrayField::DimIds),
            "weights" => Some(ArrayField::Weights),
            _ => None,
        }
    }

    fn push_index(&mut self, field: ArrayField, value: u32) {
        if field == ArrayField::DimIds {
            self.dim_ids.push(value);
        }
    }

    fn push_value(&mut self, field: ArrayField, value: f32) {
        if field == ArrayField::Weights {
            self.weights.push(value);
        }
    }
}

/// A search request plus precomputed ground-truth nearest neighbors
///
/// `neighbors` and `distances` are parallel arrays like the sparse-vector
/// pair; lengths are delivered as found in the file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct QueryRow {
    pub id: u32,
    pub text: String,
    pub dim_ids: Vec<u32>,
    pub weights: Vec<f32>,
    pub neighbors: Vec<u32>,
    pub distances: Vec<f32>,
}

impl QueryRow {
    /// Sparse-vector terms in (dimension id, weight) order
    pub fn terms(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.dim_ids.iter().copied().zip(self.weights.iter().copied())
    }
}

impl RowShape for QueryRow {
    const ID_KEY: &'static str = "id";

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
    }

    fn array_field(key: &str) -> Option<ArrayField> {
        match key {
            "dim_ids" => Some(ArrayField::DimIds),
            "weights" => Some(ArrayField::Weights),
            "neighbors" => Some(ArrayField::Neighbors),
            "distances" => Some(ArrayField::Distances),
            _ => None,
        }
    }

    fn push_index(&mut self, field: ArrayField, value: u32) {
        match field {
            ArrayField::DimIds => self.dim_ids.push(value),
            ArrayField::Neighbors => self.neighbors.push(value),
            _ => {}
        }
    }

    fn push_value(&mut self, field: ArrayField, value: f32) {
        match field {
            ArrayField::Weights => self.weights.push(value),
            ArrayField::Distances => self.distances.push(value),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_zips_parallel_arrays() {
        let row = TrainingRow {
            row_id: 7,
            text: "doc".to_string(),
            dim_ids: vec![3, 9, 12],
            weights: vec![0.5, 1.5, 2.5],
        };
        let terms: Vec<_> = row.terms().collect();
        assert_eq!(terms, vec![(3, 0.5), (9, 1.5), (12, 2.5)]);
    }

    #[test]
    fn test_terms_with_mismatched_lengths_pairs_shorter() {
        let row = TrainingRow {
            dim_ids: vec![1, 2, 3],
            weights: vec![0.1],
            ..Default::default()
        };
        assert_eq!(row.terms().count(), 1);
    }

    #[test]
    fn test_query_shape_recognizes_ground_truth_arrays() {
        assert_eq!(QueryRow::array_field("neighbors"), Some(ArrayField::Neighbors));
        assert_eq!(QueryRow::array_field("distances"), Some(ArrayField::Distances));
        assert_eq!(TrainingRow::array_field("neighbors"), None);
        assert_eq!(TrainingRow::array_field("unknown"), None);
    }
}
