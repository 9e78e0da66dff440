use thiserror::Error;
use yansi::{Condition, Paint};

use super::marker::MarkerError;

/// An invalid value given for a command line option
#[derive(Error, Debug)]
pub enum ArgumentError {
    #[error("{0}")]
    Marker(String),
}

/// Convert a [`MarkerError`] into a human-readable [`ArgumentError`] that
/// points at the offending part of the option value
pub trait IntoArgumentError {
    fn into_argument_error(self, option: &str, value: &str) -> ArgumentError;
}

impl IntoArgumentError for MarkerError {
    fn into_argument_error(self, option: &str, value: &str) -> ArgumentError {
        if self == MarkerError::Empty {
            return ArgumentError::Marker(format!("Value of `{option}' must not be empty"));
        }

        let (start, end) = self.span();
        let mut end = end.min(value.len());
        while !value.is_char_boundary(end) {
            end += 1;
        }
        let start = start.min(end);
        let msg = self.to_string();

        // format message
        let span_len = end - start;
        let center_prefix = ((span_len + 1) / 2).saturating_sub(1);
        let center_suffix = span_len / 2;
        ArgumentError::Marker(
            format!(
                "Invalid value of `{}'\n\n{}{}{}\n{}{}{}{}\n{}{}{}",
                option,
                &value[0..start],
                &value[start..end].red(),
                &value[end..],
                " ".repeat(start),
                "─".repeat(center_prefix).red(),
                (if end > start { "┬" } else { "│" }).red(),
                "─".repeat(center_suffix).red(),
                " ".repeat(start + center_prefix),
                "╰── ".red(),
                msg.red().bold()
            )
            .whenever(Condition::from(|| {
                Condition::stderr_is_tty() && Condition::clicolor() && Condition::no_color()
            }))
            .to_string(),
        )
    }
}
