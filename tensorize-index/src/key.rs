use std::fmt;

use ordered_float::NotNan;

/// A typed key held by an index map.
///
/// This is the value a [`crate::KeyTransform`] produces from a raw field.
/// It is a simple tag enum that is `Eq + Ord + Hash`, so it can serve both
/// as a hash-map key and as a sort key. Floats are stored as
/// [`NotNan`] to keep the total order; a NaN-producing conversion is treated
/// as a transform failure upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypedKey {
    /// A 64-bit signed integer key.
    Int(i64),
    /// A finite, non-NaN floating point key.
    Float(NotNan<f64>),
    /// A verbatim string key.
    Str(String),
}

impl TypedKey {
    /// Build a float key, rejecting NaN.
    pub fn float(value: f64) -> Option<TypedKey> {
        NotNan::new(value).ok().map(TypedKey::Float)
    }
}

impl fmt::Display for TypedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedKey::Int(v) => write!(f, "{v}"),
            TypedKey::Float(v) => write!(f, "{}", display_float(v.into_inner())),
            TypedKey::Str(s) => f.write_str(s),
        }
    }
}

/// Render a float the way the key and tensor files expect: integral values
/// keep one decimal place (`2.0`, not `2`) so a float-typed token stays
/// recognizable as a float.
pub fn display_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_float_keeps_trailing_zero() {
        assert_eq!(display_float(2.0), "2.0");
        assert_eq!(display_float(-3.0), "-3.0");
        assert_eq!(display_float(2.5), "2.5");
    }

    #[test]
    fn typed_key_orders_numerically() {
        assert!(TypedKey::Int(9) < TypedKey::Int(10));
        assert!(TypedKey::float(2.1).unwrap() < TypedKey::float(2.5).unwrap());
        // String keys order lexicographically.
        assert!(TypedKey::Str("10".into()) < TypedKey::Str("9".into()));
    }
}
