//! Record builder state machine and row-limit gate
//!
//! Consumes tokenizer events and accumulates them into records. One record
//! lives at a time: allocated when its object opens, handed out when it
//! closes. The gate is consulted before a new record is allocated and turns
//! a reached limit into a clean stop rather than an error.

use super::record::{ArrayField, RowShape};
use super::tokenizer::JsonEvent;

/// Cap on rows emitted by a single iteration call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowLimit {
    #[default]
    Unlimited,
    AtMost(u64),
}

impl RowLimit {
    fn reached(self, completed: u64) -> bool {
        match self {
            RowLimit::Unlimited => false,
            RowLimit::AtMost(n) => completed >= n,
        }
    }
}

impl From<Option<u64>> for RowLimit {
    fn from(limit: Option<u64>) -> Self {
        match limit {
            Some(n) => RowLimit::AtMost(n),
            None => RowLimit::Unlimited,
        }
    }
}

/// Widen a signed integer token into an unsigned 32-bit id, saturating at
/// the bounds. Dataset writers occasionally serialize small ids as signed
/// tokens; out-of-range values clamp rather than wrap.
pub fn widen_i64_to_u32(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// Saturating widening for unsigned integer tokens
pub fn widen_u64_to_u32(value: u64) -> u32 {
    value.min(u64::from(u32::MAX)) as u32
}

/// Which recognized field of the active record the last key selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveField {
    None,
    Id,
    Text,
    Array(ArrayField),
}

enum BuilderState<T> {
    /// Between records
    Idle,
    /// Inside a record object
    InRecord {
        record: T,
        field: ActiveField,
        /// The parallel array currently open, if any (mutually exclusive)
        open_array: Option<ArrayField>,
        /// Nesting depth of an unrecognized container being skipped
        skip_depth: u32,
    },
}

/// Outcome of feeding one event to the builder
#[derive(Debug, PartialEq)]
pub enum Step<T> {
    /// Keep feeding events
    Continue,
    /// A record closed; hand it to the caller
    Emit(T),
    /// The row limit is reached; stop the pipeline cleanly
    Stop,
}

/// Event-driven builder for one record shape
pub struct RecordBuilder<T: RowShape> {
    state: BuilderState<T>,
    limit: RowLimit,
    completed: u64,
}

impl<T: RowShape> RecordBuilder<T> {
    pub fn new(limit: RowLimit) -> Self {
        Self {
            state: BuilderState::Idle,
            limit,
            completed: 0,
        }
    }

    /// Number of records completed so far
    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn feed(&mut self, event: JsonEvent) -> Step<T> {
        match self.state {
            BuilderState::Idle => match event {
                JsonEvent::ObjectStart => {
                    if self.limit.reached(self.completed) {
                        return Step::Stop;
                    }
                    self.state = BuilderState::InRecord {
                        record: T::default(),
                        field: ActiveField::None,
                        open_array: None,
                        skip_depth: 0,
                    };
                    Step::Continue
                }
                // The outer document array and anything else between records
                _ => Step::Continue,
            },
            BuilderState::InRecord { .. } => self.feed_in_record(event),
        }
    }

    fn feed_in_record(&mut self, event: JsonEvent) -> Step<T> {
        let BuilderState::InRecord {
            record,
            field,
            open_array,
            skip_depth,
        } = &mut self.state
        else {
            return Step::Continue;
        };

        if *skip_depth > 0 {
            match event {
                JsonEvent::ObjectStart | JsonEvent::ArrayStart => *skip_depth += 1,
                JsonEvent::ObjectEnd | JsonEvent::ArrayEnd => *skip_depth -= 1,
                _ => {}
            }
            return Step::Continue;
        }

        match event {
            JsonEvent::Key(name) => {
                *field = if name == T::ID_KEY {
                    ActiveField::Id
                } else if name == "text" {
                    ActiveField::Text
                } else {
                    match T::array_field(&name) {
                        Some(array) => ActiveField::Array(array),
                        // Unknown keys are ignored (forward compatible)
                        None => ActiveField::None,
                    }
                };
                Step::Continue
            }
            JsonEvent::ArrayStart => {
                match *field {
                    ActiveField::Array(array) if open_array.is_none() => *open_array = Some(array),
                    // Array under an unrecognized key, or nested inside an
                    // open parallel array: skip it wholesale
                    _ => *skip_depth = 1,
                }
                Step::Continue
            }
            JsonEvent::ArrayEnd => {
                *open_array = None;
                Step::Continue
            }
            JsonEvent::ObjectStart => {
                // Nested object under an unrecognized key
                *skip_depth = 1;
                Step::Continue
            }
            JsonEvent::ObjectEnd => {
                let done = std::mem::take(record);
                self.state = BuilderState::Idle;
                self.completed += 1;
                Step::Emit(done)
            }
            JsonEvent::UnsignedInt(value) => {
                match (*open_array, *field) {
                    (Some(array), _) => {
                        if array.holds_indices() {
                            record.push_index(array, widen_u64_to_u32(value));
                        } else {
                            record.push_value(array, value as f32);
                        }
                    }
                    (None, ActiveField::Id) => record.set_id(widen_u64_to_u32(value)),
                    _ => {}
                }
                Step::Continue
            }
            JsonEvent::SignedInt(value) => {
                match (*open_array, *field) {
                    (Some(array), _) => {
                        if array.holds_indices() {
                            record.push_index(array, widen_i64_to_u32(value));
                        } else {
                            record.push_value(array, value as f32);
                        }
                    }
                    (None, ActiveField::Id) => record.set_id(widen_i64_to_u32(value)),
                    _ => {}
                }
                Step::Continue
            }
            JsonEvent::Double(value) => {
                if let Some(array) = *open_array {
                    // Floats have no place in an index array; drop them
                    if !array.holds_indices() {
                        record.push_value(array, value as f32);
                    }
                }
                Step::Continue
            }
            JsonEvent::String(value) => {
                if open_array.is_none() && *field == ActiveField::Text {
                    record.set_text(value);
                }
                Step::Continue
            }
            JsonEvent::Bool(_) | JsonEvent::Null => Step::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::record::{QueryRow, TrainingRow};

    fn feed_all(builder: &mut RecordBuilder<TrainingRow>, events: Vec<JsonEvent>) -> Vec<TrainingRow> {
        let mut out = Vec::new();
        for event in events {
            match builder.feed(event) {
                Step::Emit(row) => out.push(row),
                Step::Stop => break,
                Step::Continue => {}
            }
        }
        out
    }

    fn training_record_events(row_id: u64) -> Vec<JsonEvent> {
        vec![
            JsonEvent::ObjectStart,
            JsonEvent::Key("row_id".into()),
            JsonEvent::UnsignedInt(row_id),
            JsonEvent::Key("text".into()),
            JsonEvent::String("doc".into()),
            JsonEvent::Key("dim_ids".into()),
            JsonEvent::ArrayStart,
            JsonEvent::UnsignedInt(4),
            JsonEvent::SignedInt(9),
            JsonEvent::ArrayEnd,
            JsonEvent::Key("weights".into()),
            JsonEvent::ArrayStart,
            JsonEvent::Double(0.25),
            JsonEvent::UnsignedInt(2),
            JsonEvent::ArrayEnd,
            JsonEvent::ObjectEnd,
        ]
    }

    #[test]
    fn test_builds_training_row() {
        let mut builder = RecordBuilder::new(RowLimit::Unlimited);
        let rows = feed_all(&mut builder, training_record_events(11));
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.row_id, 11);
        assert_eq!(row.text, "doc");
        assert_eq!(row.dim_ids, vec![4, 9]);
        // Integer tokens inside a float array widen to f32
        assert_eq!(row.weights, vec![0.25, 2.0]);
        assert_eq!(builder.completed(), 1);
    }

    #[test]
    fn test_limit_zero_stops_before_first_record() {
        let mut builder = RecordBuilder::<TrainingRow>::new(RowLimit::AtMost(0));
        assert_eq!(builder.feed(JsonEvent::ArrayStart), Step::Continue);
        assert_eq!(builder.feed(JsonEvent::ObjectStart), Step::Stop);
        assert_eq!(builder.completed(), 0);
    }

    #[test]
    fn test_limit_caps_emitted_records() {
        let mut builder = RecordBuilder::new(RowLimit::AtMost(2));
        let mut events = Vec::new();
        for id in 0..5 {
            events.extend(training_record_events(id));
        }
        let rows = feed_all(&mut builder, events);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_id, 0);
        assert_eq!(rows[1].row_id, 1);
    }

    #[test]
    fn test_unknown_key_scalar_ignored() {
        let mut builder = RecordBuilder::new(RowLimit::Unlimited);
        let rows = feed_all(
            &mut builder,
            vec![
                JsonEvent::ObjectStart,
                JsonEvent::Key("future_field".into()),
                JsonEvent::UnsignedInt(99),
                JsonEvent::Key("row_id".into()),
                JsonEvent::UnsignedInt(5),
                JsonEvent::ObjectEnd,
            ],
        );
        assert_eq!(rows[0].row_id, 5);
        assert!(rows[0].dim_ids.is_empty());
    }

    #[test]
    fn test_unknown_nested_container_skipped() {
        let mut builder = RecordBuilder::new(RowLimit::Unlimited);
        let rows = feed_all(
            &mut builder,
            vec![
                JsonEvent::ObjectStart,
                JsonEvent::Key("meta".into()),
                JsonEvent::ObjectStart,
                JsonEvent::Key("dim_ids".into()),
                JsonEvent::ArrayStart,
                JsonEvent::UnsignedInt(1),
                JsonEvent::ArrayEnd,
                JsonEvent::ObjectEnd,
                JsonEvent::Key("row_id".into()),
                JsonEvent::UnsignedInt(8),
                JsonEvent::ObjectEnd,
            ],
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_id, 8);
        assert!(rows[0].dim_ids.is_empty());
    }

    #[test]
    fn test_mismatched_array_lengths_delivered_as_is() {
        let mut builder = RecordBuilder::new(RowLimit::Unlimited);
        let rows = feed_all(
            &mut builder,
            vec![
                JsonEvent::ObjectStart,
                JsonEvent::Key("dim_ids".into()),
                JsonEvent::ArrayStart,
                JsonEvent::UnsignedInt(1),
                JsonEvent::UnsignedInt(2),
                JsonEvent::UnsignedInt(3),
                JsonEvent::ArrayEnd,
                JsonEvent::Key("weights".into()),
                JsonEvent::ArrayStart,
                JsonEvent::Double(0.5),
                JsonEvent::ArrayEnd,
                JsonEvent::ObjectEnd,
            ],
        );
        assert_eq!(rows[0].dim_ids.len(), 3);
        assert_eq!(rows[0].weights.len(), 1);
    }

    #[test]
    fn test_query_row_ground_truth_arrays() {
        let mut builder = RecordBuilder::<QueryRow>::new(RowLimit::Unlimited);
        let events = vec![
            JsonEvent::ObjectStart,
            JsonEvent::Key("id".into()),
            JsonEvent::UnsignedInt(42),
            JsonEvent::Key("neighbors".into()),
            JsonEvent::ArrayStart,
            JsonEvent::UnsignedInt(7),
            JsonEvent::UnsignedInt(3),
            JsonEvent::ArrayEnd,
            JsonEvent::Key("distances".into()),
            JsonEvent::ArrayStart,
            JsonEvent::Double(0.1),
            JsonEvent::Double(0.2),
            JsonEvent::ArrayEnd,
            JsonEvent::ObjectEnd,
        ];
        let mut rows = Vec::new();
        for event in events {
            if let Step::Emit(row) = builder.feed(event) {
                rows.push(row);
            }
        }
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 42);
        assert_eq!(rows[0].neighbors, vec![7, 3]);
        assert_eq!(rows[0].distances, vec![0.1, 0.2]);
    }

    #[test]
    fn test_widening_saturates() {
        assert_eq!(widen_i64_to_u32(-1), 0);
        assert_eq!(widen_i64_to_u32(1 << 40), u32::MAX);
        assert_eq!(widen_i64_to_u32(17), 17);
        assert_eq!(widen_u64_to_u32(u64::MAX), u32::MAX);
        assert_eq!(widen_u64_to_u32(17), 17);
    }
}
