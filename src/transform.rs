use crate::data::{Field, Record};
use crate::error::{DashError, Result};
use std::collections::HashMap;

/// Rows sharing one value of a categorical field.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    pub key: &'a str,
    pub rows: Vec<&'a Record>,
}

/// Partition rows by a categorical field.
///
/// Groups come out in the order their key first appears in `rows`, and rows
/// keep their original order inside each group.
pub fn group_by(rows: &[Record], field: Field) -> Result<Vec<Group<'_>>> {
    if !field.is_categorical() {
        return Err(DashError::InvalidField(format!(
            "{} (not a categorical column)",
            field
        )));
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Group<'_>> = Vec::new();

    for row in rows {
        // is_categorical() above guarantees a value
        let Some(key) = row.category(field) else { continue };
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Group { key, rows: Vec::new() });
            groups.len() - 1
        });
        groups[slot].rows.push(row);
    }

    Ok(groups)
}

/// Distinct values of a categorical field in first-appearance order.
pub fn distinct_values(rows: &[Record], field: Field) -> Result<Vec<&str>> {
    Ok(group_by(rows, field)?.into_iter().map(|g| g.key).collect())
}
