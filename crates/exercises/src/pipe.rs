//! Pipe-delimited list parsing (`klimmen|balans`).
//!
//! Tokens are split on `|` unless the pipe is preceded by a backslash. The
//! escape only suppresses the split; the backslash stays in the token. A
//! trailing pipe is ignored, an empty token anywhere else is an error.

use core::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid list token '{token}'")]
pub struct PipeParseError {
    pub token: String,
}

/// Split `input` into raw tokens.
pub fn split_pipes(input: &str) -> Vec<&str> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == b'|' && !(pos > 0 && bytes[pos - 1] == b'\\') {
            tokens.push(&input[start..pos]);
            start = pos + 1;
        }
        pos += 1;
    }
    if start < bytes.len() {
        tokens.push(&input[start..]);
    }
    tokens
}

/// Parse every token with `T::from_str`. The empty input yields an empty list.
pub fn parse_pipe_list<T: FromStr>(input: &str) -> Result<Vec<T>, PipeParseError> {
    split_pipes(input)
        .into_iter()
        .map(|token| {
            token.parse::<T>().map_err(|_| PipeParseError {
                token: token.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MovementForm;
    use proptest::prelude::*;

    #[test]
    fn splits_on_unescaped_pipes() {
        assert_eq!(split_pipes("a|b|c"), vec!["a", "b", "c"]);
        assert_eq!(split_pipes("a\\|b|c"), vec!["a\\|b", "c"]);
        assert_eq!(split_pipes("a|"), vec!["a"]);
        assert_eq!(split_pipes("|a"), vec!["", "a"]);
        assert_eq!(split_pipes("a||b"), vec!["a", "", "b"]);
        assert!(split_pipes("").is_empty());
    }

    #[test]
    fn parses_movement_forms() {
        let forms: Vec<MovementForm> = parse_pipe_list("klimmen|balans|").unwrap();
        assert_eq!(forms, vec![MovementForm::Klimmen, MovementForm::Balans]);

        let empty: Vec<MovementForm> = parse_pipe_list("").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn rejects_unknown_and_empty_tokens() {
        let err = parse_pipe_list::<MovementForm>("klimmen|Balans").unwrap_err();
        assert_eq!(err.token, "Balans");

        let err = parse_pipe_list::<MovementForm>("|klimmen").unwrap_err();
        assert_eq!(err.token, "");

        assert!(parse_pipe_list::<MovementForm>("klimmen||balans").is_err());
        assert!(parse_pipe_list::<MovementForm>("klimmen\\|balans").is_err());
    }

    proptest! {
        #[test]
        fn joined_forms_parse_back(idx in proptest::collection::vec(0usize..10, 1..8)) {
            let forms: Vec<MovementForm> = idx.iter().map(|i| MovementForm::ALL[*i]).collect();
            let joined = forms.iter().map(|f| f.as_str()).collect::<Vec<_>>().join("|");
            let parsed: Vec<MovementForm> = parse_pipe_list(&joined).unwrap();
            prop_assert_eq!(parsed, forms);
        }

        #[test]
        fn split_never_panics(s in "[a-z|\\\\]{0,20}") {
            let _ = split_pipes(&s);
        }
    }
}
