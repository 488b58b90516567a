use super::record::Record;

/// Serialize records to a pretty-printed JSON string.
pub fn to_pretty_json(records: &[Record]) -> String {
    serde_json::to_string_pretty(records).expect("Record serialization cannot fail")
}
