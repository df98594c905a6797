//! Catalog records and checksum lookup.
//!
//! The archive reports file checksums only through the parent resource's
//! catalog listing. Each record maps a file name to its checksum; the other
//! listing columns are not carried, so a file can never be confused with a
//! column that happens to share its name.

use serde::Deserialize;
use std::collections::BTreeMap;

/// One catalog entry: file name to checksum.
pub type CatalogRecord = BTreeMap<String, String>;

/// Value used when no record mentions the file.
pub const NO_CHECKSUM: &str = "0";

/// Finds the checksum recorded for `name`, scanning from the last record backwards.
///
/// Newly uploaded files are appended to the catalog, so the most recent entry
/// for a name wins. Returns [`NO_CHECKSUM`] when no record has the key.
pub fn remote_checksum<'a>(records: &'a [CatalogRecord], name: &str) -> &'a str {
    records
        .iter()
        .rev()
        .find_map(|r| r.get(name))
        .map(String::as_str)
        .unwrap_or(NO_CHECKSUM)
}

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(rename = "ResultSet")]
    result_set: ResultSet,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    #[serde(rename = "Result")]
    result: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(default)]
    digest: Option<String>,
}

/// Parses XNAT's JSON listing (`{"ResultSet":{"Result":[...]}}`) into records.
///
/// Only rows with a `Name` and a non-empty `digest` produce a record; rows
/// without a checksum are dropped so lookups for them fall back to [`NO_CHECKSUM`].
pub fn parse_result_set(body: &[u8]) -> anyhow::Result<Vec<CatalogRecord>> {
    let listing: Listing = serde_json::from_slice(body)
        .map_err(|e| anyhow::anyhow!("catalog response is not a ResultSet listing: {}", e))?;
    Ok(listing
        .result_set
        .result
        .into_iter()
        .filter_map(|row| match (row.name, row.digest) {
            (Some(name), Some(digest)) if !digest.is_empty() => {
                Some(CatalogRecord::from([(name, digest)]))
            }
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: &[(&str, &str)]) -> CatalogRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn last_matching_record_wins() {
        let records = vec![
            rec(&[("a.dcm", "old")]),
            rec(&[("b.dcm", "bbb")]),
            rec(&[("a.dcm", "new")]),
            rec(&[("c.dcm", "ccc")]),
        ];
        assert_eq!(remote_checksum(&records, "a.dcm"), "new");
        assert_eq!(remote_checksum(&records, "b.dcm"), "bbb");
    }

    #[test]
    fn missing_name_or_empty_list_yields_sentinel() {
        let records = vec![rec(&[("x", "1")])];
        assert_eq!(remote_checksum(&records, "y"), NO_CHECKSUM);
        assert_eq!(remote_checksum(&[], "y"), NO_CHECKSUM);
    }

    #[test]
    fn parse_result_set_maps_name_to_digest() {
        let body = br#"{"ResultSet":{"totalRecords":"2","Result":[
            {"Name":"a.nii","Size":"12","URI":"/data/x/files/a.nii","digest":"0cc175b9c0f1b6a831c399e269772661"},
            {"Name":"b.nii","Size":"3","digest":""}
        ]}}"#;
        let records = parse_result_set(body).unwrap();
        assert_eq!(records, vec![rec(&[("a.nii", "0cc175b9c0f1b6a831c399e269772661")])]);
        assert_eq!(remote_checksum(&records, "b.nii"), NO_CHECKSUM);
    }

    #[test]
    fn file_named_like_a_column_does_not_pick_up_column_values() {
        // No checksums recorded: a file called "digest" must not see the empty digest column.
        let body = br#"{"ResultSet":{"Result":[
            {"Name":"digest","Size":"5","digest":""},
            {"Name":"other.nii","Size":"7","digest":""}
        ]}}"#;
        let records = parse_result_set(body).unwrap();
        assert!(records.is_empty());
        assert_eq!(remote_checksum(&records, "digest"), NO_CHECKSUM);

        // A file called "Size" gets its own digest, not the last row's size.
        let body = br#"{"ResultSet":{"Result":[
            {"Name":"Size","Size":"5","digest":"0cc175b9c0f1b6a831c399e269772661"},
            {"Name":"other.nii","Size":"7","digest":"92eb5ffee6ae2fec3ad71c777531578f"}
        ]}}"#;
        let records = parse_result_set(body).unwrap();
        assert_eq!(remote_checksum(&records, "Size"), "0cc175b9c0f1b6a831c399e269772661");
        assert_eq!(remote_checksum(&records, "URI"), NO_CHECKSUM);
    }

    #[test]
    fn parse_result_set_rejects_other_shapes() {
        assert!(parse_result_set(br#"{"items":[]}"#).is_err());
        assert!(parse_result_set(b"<cat:Catalog/>").is_err());
    }
}
