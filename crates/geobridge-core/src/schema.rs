//! Column type inference.
//!
//! Attribute bags coming from a host are dynamically typed per cell. The
//! inferencer resolves each column to one [`LogicalType`] once per
//! conversion, and every cell is then coerced to that type.

use geobridge_core_common::{FieldSchema, FieldValue, LogicalType};

/// Infer the logical type of one column from its values.
///
/// Rules, first match wins, considering non-null values only:
///
/// 1. all booleans → [`LogicalType::Boolean`]
/// 2. all integral (integers, or floats without a fractional part) →
///    [`LogicalType::Integer`]
/// 3. all numeric → [`LogicalType::Float`]
/// 4. all date-times or timestamp-like text → [`LogicalType::DateTime`]
/// 5. otherwise → [`LogicalType::Text`]
///
/// A column with no non-null value is Text.
#[must_use]
pub fn infer_column_type(values: &[FieldValue]) -> LogicalType {
    let mut present = values.iter().filter(|v| !v.is_null()).peekable();
    if present.peek().is_none() {
        return LogicalType::Text;
    }
    let present: Vec<&FieldValue> = present.collect();

    if present.iter().all(|v| matches!(v, FieldValue::Boolean(_))) {
        LogicalType::Boolean
    } else if present.iter().all(|v| v.as_integral().is_some()) {
        LogicalType::Integer
    } else if present.iter().all(|v| v.as_f64().is_some()) {
        LogicalType::Float
    } else if present.iter().all(|v| v.as_datetime().is_some()) {
        LogicalType::DateTime
    } else {
        LogicalType::Text
    }
}

/// Infer an ordered schema from named columns.
///
/// Column order is preserved. The function is pure: the same columns always
/// produce the same schema.
#[must_use]
pub fn infer_schema<S, V>(columns: &[(S, V)]) -> FieldSchema
where
    S: AsRef<str>,
    V: AsRef<[FieldValue]>,
{
    columns
        .iter()
        .map(|(name, values)| (name.as_ref(), infer_column_type(values.as_ref())))
        .collect()
}

/// Coerce every cell of a column to `target`; impossible coercions become null.
#[must_use]
pub fn coerce_column(values: &[FieldValue], target: LogicalType) -> Vec<FieldValue> {
    values
        .iter()
        .map(|value| value.coerce(target).unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn booleans_win_first() {
        let values = [FieldValue::Boolean(true), FieldValue::Null, false.into()];
        assert_eq!(infer_column_type(&values), LogicalType::Boolean);
    }

    #[test]
    fn integral_floats_are_integers() {
        let values = [1_i64.into(), 2.0_f64.into(), FieldValue::Null];
        assert_eq!(infer_column_type(&values), LogicalType::Integer);
    }

    #[test]
    fn fractional_floats_are_floats() {
        let values = [1_i64.into(), 2.5_f64.into()];
        assert_eq!(infer_column_type(&values), LogicalType::Float);
    }

    #[test]
    fn mixed_booleans_and_numbers_are_text() {
        let values = [true.into(), 1_i64.into()];
        assert_eq!(infer_column_type(&values), LogicalType::Text);
    }

    #[test]
    fn timestamp_text_is_datetime() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let values = [
            FieldValue::DateTime(dt),
            "2024-03-02 08:30:00".into(),
            "2024-03-03".into(),
        ];
        assert_eq!(infer_column_type(&values), LogicalType::DateTime);
    }

    #[test]
    fn all_null_and_empty_columns_are_text() {
        assert_eq!(infer_column_type(&[]), LogicalType::Text);
        assert_eq!(
            infer_column_type(&[FieldValue::Null, FieldValue::Null]),
            LogicalType::Text
        );
    }

    #[test]
    fn schema_keeps_column_order_and_is_deterministic() {
        let columns = vec![
            ("unitname", vec!["A".into(), "B".into()]),
            ("dip", vec![FieldValue::from(30.5), 45_i64.into()]),
            ("id", vec![1_i64.into(), 2_i64.into()]),
        ];
        let first = infer_schema(&columns);
        let second = infer_schema(&columns);
        assert_eq!(first, second);
        assert_eq!(first.names(), vec!["unitname", "dip", "id"]);
        assert_eq!(first.get("dip"), Some(LogicalType::Float));
        assert_eq!(first.get("id"), Some(LogicalType::Integer));
    }

    #[test]
    fn coercion_nulls_impossible_cells() {
        let values = [FieldValue::from("12"), "twelve".into(), FieldValue::Null];
        assert_eq!(
            coerce_column(&values, LogicalType::Integer),
            vec![FieldValue::Integer(12), FieldValue::Null, FieldValue::Null]
        );
    }
}
