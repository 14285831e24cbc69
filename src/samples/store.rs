use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::label::PostureLabel;
use super::sample::LabeledSample;
use crate::error::ImportError;

/// In-memory ordered collection of labelled samples.
#[derive(Debug, Clone, Default)]
pub struct SampleStore {
    samples: Vec<LabeledSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SampleCounts {
    pub good: usize,
    pub bad: usize,
    pub total: usize,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: LabeledSample) {
        self.samples.push(sample);
        debug!("Stored sample #{}", self.samples.len());
    }

    pub fn samples(&self) -> &[LabeledSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn count(&self, label: PostureLabel) -> usize {
        self.samples.iter().filter(|s| s.label == label).count()
    }

    pub fn counts(&self) -> SampleCounts {
        SampleCounts {
            good: self.count(PostureLabel::Good),
            bad: self.count(PostureLabel::Bad),
            total: self.samples.len(),
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Pretty-printed JSON array snapshot.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.samples)
    }

    /// Replace the store with a snapshot. Validation happens before any
    /// mutation; a single bad element rejects the whole file.
    pub fn import_json(&mut self, text: &str) -> Result<usize, ImportError> {
        let samples = Self::parse_snapshot(text)?;
        self.samples = samples;
        info!("Imported {} samples", self.samples.len());
        Ok(self.samples.len())
    }

    fn parse_snapshot(text: &str) -> Result<Vec<LabeledSample>, ImportError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Array(items) = value else {
            return Err(ImportError::NotAnArray);
        };

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<LabeledSample>(item).map_err(|e| {
                    ImportError::InvalidSample {
                        index,
                        reason: e.to_string(),
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::test_support::{collapsed_torso_pose, sample, store_with};

    #[test]
    fn counts_per_label() {
        let store = store_with(3, 2);
        assert_eq!(
            store.counts(),
            SampleCounts {
                good: 3,
                bad: 2,
                total: 5
            }
        );
    }

    #[test]
    fn export_import_round_trip() {
        let store = store_with(4, 3);
        let exported = store.export_json().unwrap();

        let mut restored = SampleStore::new();
        assert_eq!(restored.import_json(&exported).unwrap(), 7);
        assert_eq!(restored.export_json().unwrap(), exported);
        assert_eq!(restored.samples(), store.samples());
    }

    #[test]
    fn export_uses_wire_format() {
        let mut store = SampleStore::new();
        store.push(sample(PostureLabel::Bad, 0));
        let value: Value = serde_json::from_str(&store.export_json().unwrap()).unwrap();
        let item = &value[0];
        assert_eq!(item["label"], "slechte_houding");
        assert_eq!(item["pose"].as_array().unwrap().len(), 33);
        assert_eq!(item["pose"][0].as_array().unwrap().len(), 3);
        assert!(item["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn rejects_non_array_without_mutation() {
        let mut store = store_with(2, 2);
        let result = store.import_json(r#"{"label": "goede_houding"}"#);
        assert!(matches!(result, Err(ImportError::NotAnArray)));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn rejects_unknown_label_wholesale() {
        let mut store = store_with(1, 1);
        let mut value: Value = serde_json::from_str(&store_with(2, 2).export_json().unwrap()).unwrap();
        value[3]["label"] = Value::from("neutraal");

        let result = store.import_json(&value.to_string());
        assert!(matches!(
            result,
            Err(ImportError::InvalidSample { index: 3, .. })
        ));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn rejects_non_array_pose() {
        let mut store = SampleStore::new();
        let text = r#"[{"label": "goede_houding", "pose": "upright", "timestamp": "2024-01-01T00:00:00Z"}]"#;
        assert!(matches!(
            store.import_json(text),
            Err(ImportError::InvalidSample { index: 0, .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn rejects_invalid_json() {
        let mut store = SampleStore::new();
        assert!(matches!(
            store.import_json("not json"),
            Err(ImportError::Json(_))
        ));
    }

    #[test]
    fn missing_timestamp_is_filled_in() {
        let mut store = SampleStore::new();
        let pose = serde_json::to_string(&vec![[0.1f32, 0.2, 0.3]; 33]).unwrap();
        let text = format!(r#"[{{"label": "goede_houding", "pose": {pose}}}]"#);
        assert_eq!(store.import_json(&text).unwrap(), 1);
        assert_eq!(store.samples()[0].label, PostureLabel::Good);
    }

    #[test]
    fn unparseable_timestamp_falls_back_to_import_time() {
        let mut store = SampleStore::new();
        let pose = serde_json::to_string(&vec![[0.1f32, 0.2, 0.3]; 33]).unwrap();
        let text = format!(
            r#"[{{"label": "slechte_houding", "pose": {pose}, "timestamp": "gisteren"}},
                {{"label": "goede_houding", "pose": {pose}, "timestamp": 1700000000000}},
                {{"label": "goede_houding", "pose": {pose}, "timestamp": "2024-03-05T10:00:00+01:00"}}]"#
        );
        let before = Utc::now();
        assert_eq!(store.import_json(&text).unwrap(), 3);
        assert!(store.samples()[0].timestamp >= before);
        assert!(store.samples()[1].timestamp >= before);
        assert_eq!(
            store.samples()[2].timestamp.to_rfc3339(),
            "2024-03-05T09:00:00+00:00"
        );
    }

    #[test]
    fn collapsed_torso_capture_survives_round_trip() {
        let mut store = SampleStore::new();
        store.push(LabeledSample::capture(
            PostureLabel::Good,
            &collapsed_torso_pose(),
        ));
        let exported = store.export_json().unwrap();
        assert!(!exported.contains("null"));

        let mut restored = SampleStore::new();
        assert_eq!(restored.import_json(&exported).unwrap(), 1);
    }

    #[test]
    fn import_replaces_existing_samples() {
        let mut store = store_with(5, 5);
        let snapshot = store_with(1, 0).export_json().unwrap();
        store.import_json(&snapshot).unwrap();
        assert_eq!(store.counts().total, 1);
    }
}
