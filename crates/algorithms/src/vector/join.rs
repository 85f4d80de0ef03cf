//! Joining zonal statistics onto features
//!
//! Values are matched by feature identifier, never by position, so the
//! order of the zonal records is irrelevant.

use standgis_core::vector::{AttributeValue, FeatureCollection};
use standgis_core::{Error, Result};
use tracing::debug;

use crate::statistics::ZonalTable;

/// Attribute name for a reducer label and product suffix (`mean_elev`)
pub fn field_name(label: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        label.to_string()
    } else {
        format!("{}_{}", label, suffix)
    }
}

/// Write every column of `table` onto the features as `{label}_{suffix}`
///
/// Every feature receives every field. A feature without a record, or a
/// record without a value, gets `Null`.
///
/// # Errors
/// `MissingFeatureId` if a feature has no identifier in `id_field`.
pub fn join_zonal(
    features: &mut FeatureCollection,
    table: &ZonalTable,
    id_field: &str,
    suffix: &str,
) -> Result<()> {
    let index = table.index();
    let fields: Vec<String> = table.labels.iter().map(|l| field_name(l, suffix)).collect();

    let mut unmatched = 0usize;
    for (position, feature) in features.iter_mut().enumerate() {
        let id = feature.feature_id(id_field).ok_or_else(|| Error::MissingFeatureId {
            field: id_field.to_string(),
            index: position,
        })?;

        let record = index.record(&id);
        if record.is_none() {
            unmatched += 1;
        }
        for (col, field) in fields.iter().enumerate() {
            let value = record.and_then(|r| r.values.get(col).copied().flatten());
            feature.set_property(field.clone(), AttributeValue::from(value));
        }
    }

    debug!(fields = ?fields, unmatched, "joined zonal statistics");
    Ok(())
}
