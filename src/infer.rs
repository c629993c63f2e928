use crate::data::{Column, DType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vega-Lite measurement type of an encoded field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VegaType {
    Quantitative,
    Ordinal,
    Nominal,
    Temporal,
}

impl fmt::Display for VegaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VegaType::Quantitative => "quantitative",
            VegaType::Ordinal => "ordinal",
            VegaType::Nominal => "nominal",
            VegaType::Temporal => "temporal",
        };
        f.write_str(s)
    }
}

/// Map a column dtype to its Vega-Lite type.
///
/// Driven only by the declared dtype so that the same column always
/// produces the same encoding, whatever its values.
pub fn vegalite_type(dtype: DType) -> VegaType {
    match dtype {
        DType::Int | DType::Float => VegaType::Quantitative,
        DType::Bool | DType::Str | DType::Category => VegaType::Nominal,
        DType::DateTime => VegaType::Temporal,
    }
}

pub fn infer_vegalite_type(column: &Column) -> VegaType {
    vegalite_type(column.dtype())
}

/// Whether `vtype` is an acceptable encoding type for a column of `dtype`.
/// Any column may be treated as ordinal (categorical axes).
pub fn is_compatible(dtype: DType, vtype: VegaType) -> bool {
    vtype == VegaType::Ordinal || vegalite_type(dtype) == vtype
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use chrono::NaiveDate;

    #[test]
    fn test_infer_vegalite_type() {
        let day = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let cases = vec![
            (Column::float("f", [0.1, 0.7]), VegaType::Quantitative),
            (Column::int("i", 0..4), VegaType::Quantitative),
            (Column::string("s", ["A", "B", "C", "D"]), VegaType::Nominal),
            (Column::category("c", ["a", "b", "c"]), VegaType::Nominal),
            (Column::boolean("b", [true, false]), VegaType::Nominal),
            (Column::datetime("d", [day]), VegaType::Temporal),
        ];
        for (col, expected) in cases {
            assert_eq!(infer_vegalite_type(&col), expected, "column {}", col.name);
        }
    }

    #[test]
    fn test_type_ignores_values() {
        // An empty float column is still quantitative
        let col = Column::float("f", Vec::<f64>::new());
        assert_eq!(infer_vegalite_type(&col), VegaType::Quantitative);
    }

    #[test]
    fn test_compatibility() {
        assert!(is_compatible(DType::Int, VegaType::Quantitative));
        assert!(is_compatible(DType::Int, VegaType::Ordinal));
        assert!(is_compatible(DType::Str, VegaType::Ordinal));
        assert!(!is_compatible(DType::Str, VegaType::Quantitative));
        assert!(!is_compatible(DType::DateTime, VegaType::Nominal));
    }
}
