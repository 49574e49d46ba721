//! Tuples are fixed-size strings of comma-separated attribute values.
//!
//! A query string has the same shape, with `?` standing for an attribute
//! that is not constrained.

pub const WILDCARD: &str = "?";
pub const SEPARATOR: char = ',';

/// Splits a tuple (or query string) into its attribute values.
pub fn tuple_vals(tuple: &str) -> Vec<&str> {
    tuple.split(SEPARATOR).collect()
}

pub fn is_wildcard(value: &str) -> bool {
    value == WILDCARD
}

/// Values of the attributes a query actually constrains.
pub fn bound_vals(tuple: &str) -> impl Iterator<Item = &str> {
    tuple.split(SEPARATOR).filter(|v| !is_wildcard(v))
}

/// Exact match of a stored tuple against a query: every bound query
/// attribute must equal the tuple's attribute at the same position.
pub fn tuple_matches(tuple: &str, query: &str) -> bool {
    let tvals = tuple_vals(tuple);
    let qvals = tuple_vals(query);
    tvals.len() == qvals.len()
        && tvals
            .iter()
            .zip(&qvals)
            .all(|(t, q)| is_wildcard(q) || t == q)
}
