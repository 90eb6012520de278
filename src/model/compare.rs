use super::MetadataRow;
use std::collections::BTreeMap;

/// One tag of a side-by-side comparison; a side is `None` when the instance
/// lacks the attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub tag: String,
    pub alias: String,
    pub left: Option<String>,
    pub right: Option<String>,
}

impl ComparisonRow {
    pub fn differs(&self) -> bool {
        self.left != self.right
    }
}

/// Aligns two metadata tables by tag, in tag order.
pub fn compare_metadata(left: &[MetadataRow], right: &[MetadataRow]) -> Vec<ComparisonRow> {
    let mut rows: BTreeMap<&str, ComparisonRow> = BTreeMap::new();

    for row in left {
        rows.insert(
            &row.tag,
            ComparisonRow {
                tag: row.tag.clone(),
                alias: row.alias.clone(),
                left: Some(row.value.clone()),
                right: None,
            },
        );
    }

    for row in right {
        rows.entry(&row.tag)
            .or_insert_with(|| ComparisonRow {
                tag: row.tag.clone(),
                alias: row.alias.clone(),
                left: None,
                right: None,
            })
            .right = Some(row.value.clone());
    }

    rows.into_values().collect()
}
