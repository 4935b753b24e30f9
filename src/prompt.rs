//! Interactive strategy menu.
use anyhow::{Context as _, Result};
use std::io::{BufRead, Write};

use crate::error::SelectionError;
use crate::installer::Strategy;

const MENU: &[&str] = &[
    "Brew Bundle (fast - stops on first error)",
    "Loop Method (safe - continues on errors)",
    "Save Brewfile and Exit",
    "Cancel",
];

/// Print the strategy menu to `writer` and read one answer from `reader`.
///
/// # Errors
///
/// Returns [`SelectionError::NoInput`] at end of input and
/// [`SelectionError::Invalid`] for an answer outside the menu, both wrapped
/// in [`anyhow::Error`]. Also fails if either stream cannot be used.
pub fn prompt_strategy<R: BufRead, W: Write>(reader: &mut R, writer: &mut W) -> Result<Strategy> {
    for (i, label) in MENU.iter().enumerate() {
        writeln!(writer, "  \x1b[1m{}\x1b[0m. {label}", i + 1).context("writing menu")?;
    }
    write!(writer, "\nYour choice [1-{}]: ", MENU.len()).context("writing menu")?;
    writer.flush().context("flushing stdout")?;

    let mut input = String::new();
    let read = reader
        .read_line(&mut input)
        .context("reading strategy selection")?;
    if read == 0 {
        return Err(SelectionError::NoInput.into());
    }
    Ok(Strategy::from_choice(&input)?)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(input: &str) -> (Result<Strategy>, String) {
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        let mut out = Vec::new();
        let result = prompt_strategy(&mut reader, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn menu_lists_all_choices() {
        let (_, out) = answer("4\n");
        assert!(out.contains("\x1b[1m1\x1b[0m. Brew Bundle (fast - stops on first error)"));
        assert!(out.contains("Loop Method (safe - continues on errors)"));
        assert!(out.contains("Save Brewfile and Exit"));
        assert!(out.contains("\x1b[1m4\x1b[0m. Cancel"));
        assert!(out.ends_with("Your choice [1-4]: "));
    }

    #[test]
    fn valid_answers_map_to_strategies() {
        assert_eq!(answer("1\n").0.unwrap(), Strategy::Bulk);
        assert_eq!(answer("2\n").0.unwrap(), Strategy::Sequential);
        assert_eq!(answer("3").0.unwrap(), Strategy::Export);
        assert_eq!(answer("4\r\n").0.unwrap(), Strategy::Cancel);
    }

    #[test]
    fn invalid_answer_is_selection_error() {
        let err = answer("9\n").0.unwrap_err();
        assert_eq!(
            err.downcast_ref::<SelectionError>(),
            Some(&SelectionError::Invalid("9".to_string()))
        );
    }

    #[test]
    fn empty_line_is_invalid() {
        let err = answer("\n").0.unwrap_err();
        assert_eq!(
            err.downcast_ref::<SelectionError>(),
            Some(&SelectionError::Invalid(String::new()))
        );
    }

    #[test]
    fn end_of_input_is_no_input() {
        let err = answer("").0.unwrap_err();
        assert_eq!(
            err.downcast_ref::<SelectionError>(),
            Some(&SelectionError::NoInput)
        );
    }

    #[test]
    fn only_first_line_is_read() {
        assert_eq!(answer("2\n1\n").0.unwrap(), Strategy::Sequential);
    }
}
