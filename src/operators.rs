//! Boolean operators for building table filter expressions.

/// The And operator.
pub const AND: &str = "and";

/// The Not operator.
pub const NOT: &str = "not";

/// The Or operator.
pub const OR: &str = "or";

/// Combines two filter expressions with a boolean operator.
pub fn combine_filters(left: &str, operator: &str, right: &str) -> String {
    format!("({left}) {operator} ({right})")
}
