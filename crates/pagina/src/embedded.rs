//! Embedded-argument parsing for templated keyword aliases.
//!
//! An alias like `Search for ${term} in catalog` carries its arguments
//! inside the invocation text. Both the template and the invocation are
//! tokenized on whitespace and walked in lockstep: a placeholder absorbs
//! invocation tokens until the next literal anchor token matches (or the
//! input runs out). One placeholder is the common case; any number of
//! placeholders interleaved with anchors works the same way.

use crate::result::{PaginaError, PaginaResult};

/// Marker that starts a placeholder token inside an alias template.
pub const PLACEHOLDER_MARKER: &str = "${";

/// Extract the values bound to each placeholder of `alias` from the
/// literal `invocation` text, in template order.
///
/// A placeholder that absorbs no tokens is an error naming it; an alias
/// without placeholders yields no arguments.
pub fn parse_embedded_args(invocation: &str, alias: &str) -> PaginaResult<Vec<String>> {
    let mut args = Vec::new();
    if !alias.contains(PLACEHOLDER_MARKER) {
        return Ok(args);
    }
    let input: Vec<&str> = invocation.split_whitespace().collect();
    let template: Vec<&str> = alias.split_whitespace().collect();
    let mut input_index = 0;
    for (template_index, part) in template.iter().enumerate() {
        if part.contains(PLACEHOLDER_MARKER) {
            // The next template token anchors the end of this value; the
            // last placeholder runs to the end of the input.
            let terminator = template.get(template_index + 1).copied().unwrap_or("");
            let mut collected = String::new();
            while input_index < input.len() && input[input_index] != terminator {
                collected.push(' ');
                collected.push_str(input[input_index]);
                input_index += 1;
            }
            let value = collected.trim().to_string();
            if value.is_empty() {
                return Err(PaginaError::NoArgumentFound {
                    placeholder: (*part).to_string(),
                    alias: alias.to_string(),
                });
            }
            args.push(value);
        } else {
            input_index += 1;
        }
    }
    Ok(args)
}
