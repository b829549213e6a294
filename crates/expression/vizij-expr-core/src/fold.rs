//! Unary-fold pass: `3 neg` becomes `-3` before evaluation.

use crate::token::{Token, TokenStream};

/// Collapse each negation marker into the numeric literal immediately before it.
///
/// Single left-to-right pass. A literal produced by folding is not folded again, so
/// `--3` keeps one runtime negation (`-3 neg`). Markers after anything other than a
/// plain literal are left for the evaluator.
pub fn fold_unary(stream: TokenStream) -> TokenStream {
    let mut out: Vec<Token> = Vec::with_capacity(stream.len());
    let mut last_was_folded = false;

    for token in stream.into_vec() {
        if token == Token::Negate && !last_was_folded {
            if let Some(Token::Number(text)) = out.last_mut() {
                *text = negate_text(text);
                last_was_folded = true;
                continue;
            }
        }
        last_was_folded = false;
        out.push(token);
    }

    TokenStream::from(out)
}

fn negate_text(text: &str) -> String {
    match text.strip_prefix('-') {
        Some(positive) => positive.to_string(),
        None => format!("-{text}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn folded(input: &str) -> String {
        let stream = parse(input, 64).expect("parses").into_stream();
        fold_unary(stream).to_string()
    }

    #[test]
    fn folds_negated_literal() {
        assert_eq!(folded("-3"), "-3");
        assert_eq!(folded("2 * -1.5e2"), "2 -1.5e2 *");
    }

    #[test]
    fn leaves_identifier_negation_alone() {
        assert_eq!(folded("-x"), "x neg");
    }

    #[test]
    fn folds_at_most_once_per_literal() {
        assert_eq!(folded("--3"), "-3 neg");
    }

    #[test]
    fn only_the_immediately_preceding_entry_counts() {
        assert_eq!(folded("-(1 + 2)"), "1 2 + neg");
        assert_eq!(folded("-v.x"), "v (., x) neg");
    }

    #[test]
    fn folds_inside_assignment_streams() {
        assert_eq!(folded("dst = -4"), "-4 dst =");
    }
}
