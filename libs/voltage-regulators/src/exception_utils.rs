//! Helpers for walking error cause chains

use std::error::Error as StdError;

/// Collect `error` and every nested cause, innermost first.
pub fn get_errors<'e>(error: &'e (dyn StdError + 'static)) -> Vec<&'e (dyn StdError + 'static)> {
    let mut errors = Vec::new();
    let mut current = Some(error);
    while let Some(err) = current {
        errors.push(err);
        current = err.source();
    }
    errors.reverse();
    errors
}

/// Flatten the cause chain of `error` into messages, innermost first.
///
/// The last element is always the message of `error` itself.
pub fn get_messages(error: &(dyn StdError + 'static)) -> Vec<String> {
    get_errors(error)
        .into_iter()
        .map(|err| err.to_string())
        .collect()
}
