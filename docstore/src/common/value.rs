use crate::collection::Document;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

/// Compare two floats with a total order, NaN sorting after every number.
#[inline]
fn num_cmp_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// 2^63, the first float above every `i64`.
const I64_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Compares an integer with a float without rounding the integer.
fn num_cmp_int_float(a: i64, b: f64) -> Ordering {
    if b.is_nan() || b >= I64_UPPER_BOUND {
        return Ordering::Less;
    }
    if b < i64::MIN as f64 {
        return Ordering::Greater;
    }
    // b is within i64 range here, so truncation is exact
    match a.cmp(&(b.trunc() as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&b.fract()).unwrap_or(Ordering::Equal),
        ordering => ordering,
    }
}

/// Represents a [Document] field value.
///
/// A value is either a scalar ([Value::Bool], [Value::I64], [Value::F64],
/// [Value::String]), [Value::Null], or a composite ([Value::Document] for a
/// nested mapping, [Value::Array] for an ordered list).
///
/// # Characteristics
/// - **Numeric equality**: `I64(5) == F64(5.0)`; integers and floats compare
///   numerically with each other.
/// - **Total order**: values of different types order by type rank
///   `Null < Bool < number < String < Document < Array`, which lets any two
///   documents be sorted by any field deterministically.
/// - **Hash consistent with Eq**: integral floats hash like the matching
///   integer.
///
/// # Usage
/// ```text
/// let v1: Value = 42.into();
/// let v2 = Value::from("hello");
/// let doc = doc! { "Name": "RavenDB", "UnitsInStock": 10 };
/// ```
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// Represents a null value.
    #[default]
    Null,
    /// Represents a boolean value.
    Bool(bool),
    /// Represents an integer value.
    I64(i64),
    /// Represents a floating point value.
    F64(f64),
    /// Represents a string value.
    String(String),
    /// Represents a nested document.
    Document(Document),
    /// Represents an array of values.
    Array(Vec<Value>),
}

impl Value {
    /// Creates a new [Value] from anything convertible into one.
    pub fn from<T: Into<Value>>(value: T) -> Value {
        value.into()
    }

    /// Creates a [Value::Array] from a vector of convertible values.
    pub fn from_vec<T: Into<Value>>(values: Vec<T>) -> Value {
        Value::Array(values.into_iter().map(|v| v.into()).collect())
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::I64(_) | Value::F64(_))
    }

    #[inline]
    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Returns `true` for scalar values usable as filter bounds and index keys.
    #[inline]
    pub fn is_comparable(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::I64(_) | Value::F64(_) | Value::String(_)
        )
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the numeric value widened to f64 for both integers and floats.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I64(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_string(&self) -> Option<&String> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a short name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I64(_) => "integer",
            Value::F64(_) => "float",
            Value::String(_) => "string",
            Value::Document(_) => "document",
            Value::Array(_) => "array",
        }
    }

    /// Rough number of heap and inline bytes this value occupies.
    ///
    /// Used by the bulk loader to bound its buffer by size as well as count.
    pub fn estimated_size(&self) -> usize {
        let inline = std::mem::size_of::<Value>();
        match self {
            Value::String(s) => inline + s.len(),
            Value::Document(doc) => inline + doc.estimated_size(),
            Value::Array(items) => inline + items.iter().map(Value::estimated_size).sum::<usize>(),
            _ => inline,
        }
    }

    /// Returns `true` if both values belong to the same ordering class.
    /// Integers and floats form one class.
    #[inline]
    pub fn same_kind(&self, other: &Value) -> bool {
        self.type_rank() == other.type_rank()
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::I64(_) | Value::F64(_) => 2,
            Value::String(_) => 3,
            Value::Document(_) => 4,
            Value::Array(_) => 5,
        }
    }

    pub(crate) fn write_json(&self, out: &mut String) {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            Value::I64(v) => out.push_str(&v.to_string()),
            Value::F64(v) => {
                if v.is_finite() {
                    out.push_str(&v.to_string())
                } else {
                    out.push_str("null")
                }
            }
            Value::String(s) => write_json_string(s, out),
            Value::Document(doc) => doc.write_json(out),
            Value::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_json(out);
                }
                out.push(']');
            }
        }
    }
}

pub(crate) fn write_json_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        self.write_json(&mut out);
        f.write_str(&out)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::I64(a), Value::I64(b)) => a.cmp(b),
            (Value::F64(a), Value::F64(b)) => num_cmp_float(*a, *b),
            (Value::I64(a), Value::F64(b)) => num_cmp_int_float(*a, *b),
            (Value::F64(a), Value::I64(b)) => num_cmp_int_float(*b, *a).reverse(),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Document(a), Value::Document(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::I64(v) => v.hash(state),
            Value::F64(v) => {
                // integral floats must hash like the equal integer
                if v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < I64_UPPER_BOUND {
                    (*v as i64).hash(state)
                } else {
                    v.to_bits().hash(state)
                }
            }
            Value::String(v) => v.hash(state),
            Value::Document(v) => v.hash(state),
            Value::Array(v) => v.hash(state),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::I64(value as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(Value::I64)
            .unwrap_or(Value::F64(value as f64))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::from(value as u64)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F64(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::from_vec(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_numeric_cross_type_equality() {
        assert_eq!(Value::I64(5), Value::F64(5.0));
        assert_ne!(Value::I64(5), Value::F64(5.5));
        assert_eq!(hash_of(&Value::I64(5)), hash_of(&Value::F64(5.0)));
    }

    #[test]
    fn test_numeric_ordering() {
        assert!(Value::I64(5) < Value::F64(5.5));
        assert!(Value::F64(-1.0) < Value::I64(0));
        assert!(Value::F64(f64::NAN) > Value::F64(f64::INFINITY));
    }

    #[test]
    fn test_numeric_ordering_beyond_f64_precision() {
        let big = 1_i64 << 53;
        let float = big as f64;
        assert_eq!(Value::I64(big), Value::F64(float));
        assert!(Value::I64(big + 1) > Value::F64(float));
        assert!(Value::F64(float) < Value::I64(big + 1));
        assert_ne!(Value::I64(big + 1), Value::F64(float));

        assert!(Value::I64(i64::MAX) < Value::F64(I64_UPPER_BOUND));
        assert!(Value::I64(i64::MIN) == Value::F64(i64::MIN as f64));
        assert!(Value::I64(i64::MIN) > Value::F64(f64::NEG_INFINITY));
        assert!(Value::I64(-3) > Value::F64(-3.5));
        assert!(Value::I64(-3) < Value::F64(-2.5));
        assert!(Value::I64(0) < Value::F64(f64::NAN));
        assert_eq!(hash_of(&Value::I64(big)), hash_of(&Value::F64(float)));
    }

    #[test]
    fn test_same_kind() {
        assert!(Value::I64(1).same_kind(&Value::F64(2.5)));
        assert!(Value::from("a").same_kind(&Value::from("b")));
        assert!(!Value::from("a").same_kind(&Value::I64(1)));
        assert!(!Value::Null.same_kind(&Value::Bool(false)));
    }

    #[test]
    fn test_type_rank_ordering() {
        let mut values = vec![
            Value::from(vec![1]),
            Value::from("a"),
            Value::Null,
            Value::from(1),
            Value::from(true),
            Value::from(doc! { "a": 1 }),
        ];
        values.sort();
        assert!(values[0].is_null());
        assert_eq!(values[1], Value::Bool(true));
        assert_eq!(values[2], Value::I64(1));
        assert!(values[3].is_string());
        assert!(values[4].is_document());
        assert!(values[5].is_array());
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(10u8), Value::I64(10));
        assert_eq!(Value::from(u64::MAX), Value::F64(u64::MAX as f64));
        assert_eq!(Value::from(Some("x")), Value::String("x".to_string()));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(
            Value::from(vec!["a", "b"]),
            Value::Array(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from(3).as_f64(), Some(3.0));
        assert_eq!(Value::from(3).as_i64(), Some(3));
        assert_eq!(Value::from("s").as_str(), Some("s"));
        assert!(Value::from(1.5).is_number());
        assert!(!Value::Null.is_comparable());
        assert!(!Value::from(vec![1]).is_comparable());
        assert_eq!(Value::from(true).type_name(), "bool");
    }

    #[test]
    fn test_json_display() {
        let value = Value::from(vec![Value::from("a\"b"), Value::Null, Value::from(1.5)]);
        assert_eq!(value.to_string(), r#"["a\"b",null,1.5]"#);
    }

    #[test]
    fn test_estimated_size_grows_with_content() {
        let small = Value::from("a");
        let large = Value::from("a".repeat(1000));
        assert!(large.estimated_size() > small.estimated_size() + 900);
    }
}
