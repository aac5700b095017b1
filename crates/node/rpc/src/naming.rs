//! Wire method naming.

/// Converts a `CamelCase` handler name to its `snake_case` wire name.
///
/// An underscore is inserted before every uppercase ASCII letter except the
/// first character, so `NewEpoch` becomes `new_epoch` and `DKGInit` becomes
/// `d_k_g_init`.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}
