use quiz_core::model::{LandmarkSnapshot, PredictionCandidate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One prediction as returned by the recognition service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(default)]
    pub sign_id: Option<u64>,
    pub sign: String,
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchRequest<'a> {
    #[serde(rename = "allLandmarks")]
    pub all_landmarks: &'a [LandmarkSnapshot],
}

/// Streaming event carrying one landmark snapshot.
pub(crate) const LANDMARKS_EVENT: &str = "vocab-landmarkers";
/// Streaming event asking for a prediction over the accumulated snapshots.
pub(crate) const PREDICT_EVENT: &str = "vocab-predict";

/// Decodes a candidate array. `null` is accepted as an empty list and
/// records with an invalid confidence are dropped.
///
/// # Errors
///
/// Returns `serde_json::Error` if the payload is not a candidate array.
pub fn decode_candidates(payload: &str) -> Result<Vec<PredictionCandidate>, serde_json::Error> {
    let records: Option<Vec<PredictionRecord>> = serde_json::from_str(payload)?;
    Ok(into_candidates(records.unwrap_or_default()))
}

pub(crate) fn into_candidates(records: Vec<PredictionRecord>) -> Vec<PredictionCandidate> {
    records
        .into_iter()
        .filter_map(|record| {
            PredictionCandidate::new(record.sign, record.confidence)
                .inspect_err(|e| debug!(sign_id = ?record.sign_id, "dropping prediction: {e}"))
                .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::LandmarkFrame;

    #[test]
    fn decodes_service_payload_in_order() {
        let payload = r#"[
            {"sign_id": 3, "sign": "hello", "confidence": 0.82},
            {"sign_id": 9, "sign": "thanks", "confidence": 0.11}
        ]"#;
        let candidates = decode_candidates(payload).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].label(), "hello");
        assert!((candidates[1].confidence() - 0.11).abs() < 1e-6);
    }

    #[test]
    fn null_and_empty_payloads_are_no_candidates() {
        assert!(decode_candidates("null").unwrap().is_empty());
        assert!(decode_candidates("[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(decode_candidates(r#"{"error": "boom"}"#).is_err());
        assert!(decode_candidates("not json").is_err());
    }

    #[test]
    fn out_of_range_confidence_is_dropped() {
        let payload = r#"[{"sign": "a", "confidence": 2.0}, {"sign": "b", "confidence": 0.5}]"#;
        let candidates = decode_candidates(payload).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].label(), "b");
    }

    #[test]
    fn batch_body_wraps_snapshots() {
        let snapshots = vec![LandmarkSnapshot::new(0, 0, LandmarkFrame::default())];
        let body = serde_json::to_value(BatchRequest {
            all_landmarks: &snapshots,
        })
        .unwrap();
        assert_eq!(body["allLandmarks"].as_array().unwrap().len(), 1);
    }
}
