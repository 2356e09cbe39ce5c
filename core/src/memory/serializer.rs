//! Pluggable (de)serialization for checkpoint state payloads.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::memory::CheckpointError;

/// Converts a state value to and from bytes for storage. The default
/// [`JsonSerializer`] uses `serde_json`; a different format can be plugged in
/// without touching [`crate::memory::sqlite_saver::SqliteSaver`].
pub trait Serializer<S>: Send + Sync {
    fn serialize(&self, state: &S) -> Result<Vec<u8>, CheckpointError>;
    fn deserialize(&self, bytes: &[u8]) -> Result<S, CheckpointError>;
}

/// `serde_json`-backed serializer, stored as UTF-8 text.
#[derive(Debug, Default, Clone)]
pub struct JsonSerializer;

impl<S> Serializer<S> for JsonSerializer
where
    S: Serialize + DeserializeOwned,
{
    fn serialize(&self, state: &S) -> Result<Vec<u8>, CheckpointError> {
        serde_json::to_vec(state).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<S, CheckpointError> {
        serde_json::from_slice(bytes).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        n: i32,
    }

    #[test]
    fn round_trips_through_json() {
        let s = JsonSerializer;
        let bytes = Serializer::serialize(&s, &Sample { n: 42 }).unwrap();
        let back: Sample = Serializer::deserialize(&s, &bytes).unwrap();
        assert_eq!(back, Sample { n: 42 });
    }

    #[test]
    fn deserialize_rejects_invalid_json() {
        let s = JsonSerializer;
        let err = Serializer::<Sample>::deserialize(&s, b"not json").unwrap_err();
        assert!(matches!(err, CheckpointError::Serialization(_)));
    }
}
