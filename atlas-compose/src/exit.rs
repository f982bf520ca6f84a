//! Process exit codes.

use std::fmt::Display;

/// Returns 0 when there is no error and 1 otherwise.
#[must_use]
pub fn exit_code_from_error<E: Display + ?Sized>(err: Option<&E>) -> i32 {
    i32::from(err.is_some())
}

/// Returns 0 for `Ok` and 1 for `Err`.
#[must_use]
pub fn exit_code_from_result<T, E: Display>(result: &Result<T, E>) -> i32 {
    exit_code_from_error(result.as_ref().err())
}

/// Returns the first non-zero code, or 0 if every code is 0.
#[must_use]
pub fn propagate_exit_code<I>(codes: I) -> i32
where
    I: IntoIterator<Item = i32>,
{
    codes.into_iter().find(|&code| code != 0).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ComposeError;

    #[test]
    fn test_exit_code_from_error() {
        assert_eq!(exit_code_from_error::<ComposeError>(None), 0);
        assert_eq!(exit_code_from_error(Some(&ComposeError::EmptyInput)), 1);
        assert_eq!(exit_code_from_error(Some("boom")), 1);
    }

    #[test]
    fn test_exit_code_from_result() {
        let ok: Result<u8, String> = Ok(1);
        let err: Result<u8, String> = Err("failed".to_string());
        assert_eq!(exit_code_from_result(&ok), 0);
        assert_eq!(exit_code_from_result(&err), 1);
    }

    #[test]
    fn test_propagate_exit_code() {
        assert_eq!(propagate_exit_code([0, 0, 1, 0]), 1);
        assert_eq!(propagate_exit_code([0, 2, 1]), 2);
        assert_eq!(propagate_exit_code([0, 0, 0]), 0);
        assert_eq!(propagate_exit_code(Vec::new()), 0);
    }
}
