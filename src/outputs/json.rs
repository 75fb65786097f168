//! JSON export.

use crate::error::ExportError;
use crate::models::PageResult;

/// Serialize results as a pretty-printed JSON array, in the order supplied.
pub fn write_json(results: &[PageResult]) -> Result<Vec<u8>, ExportError> {
    Ok(serde_json::to_vec_pretty(results)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_rows_keep_order_and_column_names() {
        let results = vec![
            PageResult::success("https://a.test/2", "second"),
            PageResult::success("https://a.test/1", "first"),
        ];
        let value: serde_json::Value = serde_json::from_slice(&write_json(&results).unwrap()).unwrap();

        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["URL"], "https://a.test/2");
        assert_eq!(rows[1]["Content"], "first");
        assert_eq!(rows[0].as_object().unwrap().len(), 2);
    }
}
