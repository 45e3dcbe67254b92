use crate::catalog::DataType;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// A single typed value. `None` is the unset placeholder produced by
/// `Tuple::empty`; it never survives a round trip through a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarValue {
    Int32(Option<i32>),
    Varchar(Option<String>),
}

impl ScalarValue {
    pub fn new_empty(data_type: DataType) -> Self {
        match data_type {
            DataType::Int32 => Self::Int32(None),
            DataType::Varchar(_) => Self::Varchar(None),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            ScalarValue::Int32(v) => v.is_none(),
            ScalarValue::Varchar(v) => v.is_none(),
        }
    }

    /// Whether this value can be stored in a column of `data_type`.
    pub fn matches_type(&self, data_type: &DataType) -> bool {
        match (self, data_type) {
            (ScalarValue::Int32(_), DataType::Int32) => true,
            (ScalarValue::Varchar(None), DataType::Varchar(_)) => true,
            (ScalarValue::Varchar(Some(s)), DataType::Varchar(max)) => s.len() <= *max,
            _ => false,
        }
    }
}

impl PartialOrd for ScalarValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (ScalarValue::Int32(l), ScalarValue::Int32(r)) => l.partial_cmp(r),
            (ScalarValue::Varchar(l), ScalarValue::Varchar(r)) => l.partial_cmp(r),
            _ => None,
        }
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int32(Some(value))
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Varchar(Some(value.to_string()))
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Varchar(Some(value))
    }
}

impl Display for ScalarValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Int32(Some(v)) => write!(f, "{v}"),
            ScalarValue::Varchar(Some(v)) => write!(f, "{v}"),
            _ => write!(f, "NULL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ScalarValue;
    use crate::catalog::DataType;
    use std::cmp::Ordering;

    #[test]
    fn scalar_compare() {
        let a: ScalarValue = 1.into();
        let b: ScalarValue = 2.into();
        assert_eq!(a.partial_cmp(&b), Some(Ordering::Less));
        assert_eq!(b.partial_cmp(&a), Some(Ordering::Greater));
        assert_eq!(a.partial_cmp(&a.clone()), Some(Ordering::Equal));

        let s1: ScalarValue = "abc".into();
        let s2: ScalarValue = "abd".into();
        assert_eq!(s1.partial_cmp(&s2), Some(Ordering::Less));

        // Mixed variants do not compare.
        assert_eq!(a.partial_cmp(&s1), None);
    }

    #[test]
    fn scalar_matches_type() {
        assert!(ScalarValue::from(7).matches_type(&DataType::Int32));
        assert!(ScalarValue::from("hello").matches_type(&DataType::Varchar(10)));
        assert!(!ScalarValue::from("hello world").matches_type(&DataType::Varchar(5)));
        assert!(!ScalarValue::from(7).matches_type(&DataType::Varchar(5)));
        assert!(ScalarValue::new_empty(DataType::Int32).is_null());
    }
}
