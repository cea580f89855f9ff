//! Extension traits mapping logical field types onto Arrow types.

use arrow_schema::{DataType, TimeUnit};
use geobridge_core_common::LogicalType;

/// Extension trait relating [`LogicalType`] to Arrow [`DataType`].
///
/// # Examples
///
/// ```
/// use arrow_schema::DataType;
/// use geobridge_core::utils::LogicalTypeExt;
/// use geobridge_core_common::LogicalType;
///
/// assert_eq!(LogicalType::Integer.arrow_type(), DataType::Int64);
/// assert_eq!(LogicalType::from_arrow(&DataType::Utf8), Some(LogicalType::Text));
/// ```
pub trait LogicalTypeExt: Sized {
    /// The Arrow type a column of this logical type is written as.
    fn arrow_type(&self) -> DataType;

    /// The logical type an Arrow column is read as, `None` when unsupported.
    fn from_arrow(data_type: &DataType) -> Option<Self>;
}

impl LogicalTypeExt for LogicalType {
    fn arrow_type(&self) -> DataType {
        match self {
            LogicalType::Integer => DataType::Int64,
            LogicalType::Float => DataType::Float64,
            LogicalType::Boolean => DataType::Boolean,
            LogicalType::DateTime => DataType::Timestamp(TimeUnit::Millisecond, None),
            LogicalType::Text => DataType::Utf8,
        }
    }

    fn from_arrow(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Int32 | DataType::Int64 => Some(LogicalType::Integer),
            DataType::Float32 | DataType::Float64 => Some(LogicalType::Float),
            DataType::Boolean => Some(LogicalType::Boolean),
            DataType::Timestamp(TimeUnit::Millisecond, _) => Some(LogicalType::DateTime),
            DataType::Utf8 | DataType::LargeUtf8 => Some(LogicalType::Text),
            _ => None,
        }
    }
}

/// Extension trait for formatting Arrow [`DataType`] into human-readable strings.
pub trait ArrowDataTypeExt {
    /// Format the data type into a human-readable string.
    fn format(&self) -> String;
}

impl ArrowDataTypeExt for DataType {
    fn format(&self) -> String {
        match self {
            DataType::Utf8 => "String".to_string(),
            DataType::LargeUtf8 => "LargeString".to_string(),
            DataType::Timestamp(unit, tz) => {
                let tz_str = tz.as_ref().map_or("", |t| t.as_ref());
                format!("Timestamp({unit:?}, {tz_str})")
            },
            DataType::List(_) => "List".to_string(),
            DataType::LargeList(_) => "LargeList".to_string(),
            DataType::Struct(_) => "Struct".to_string(),
            DataType::Map(_, _) => "Map".to_string(),
            _ => format!("{self:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_logical_type_maps_back_to_itself() {
        for logical in [
            LogicalType::Integer,
            LogicalType::Float,
            LogicalType::Boolean,
            LogicalType::DateTime,
            LogicalType::Text,
        ] {
            assert_eq!(LogicalType::from_arrow(&logical.arrow_type()), Some(logical));
        }
    }

    #[test]
    fn narrow_numbers_widen() {
        assert_eq!(
            LogicalType::from_arrow(&DataType::Int32),
            Some(LogicalType::Integer)
        );
        assert_eq!(
            LogicalType::from_arrow(&DataType::Float32),
            Some(LogicalType::Float)
        );
    }

    #[test]
    fn unsupported_types_are_none() {
        assert_eq!(LogicalType::from_arrow(&DataType::Binary), None);
        assert_eq!(LogicalType::from_arrow(&DataType::UInt64), None);
    }

    #[test]
    fn test_format_strings() {
        assert_eq!(DataType::Utf8.format(), "String");
        assert_eq!(DataType::LargeUtf8.format(), "LargeString");
        assert_eq!(DataType::Binary.format(), "Binary");
    }

    #[test]
    fn test_format_timestamp_without_timezone() {
        let dt = DataType::Timestamp(TimeUnit::Millisecond, None);
        assert_eq!(dt.format(), "Timestamp(Millisecond, )");
    }
}
