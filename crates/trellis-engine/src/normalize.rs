//! Text normalization around decode requests.
//!
//! When normalization is enabled the pipeline is tokenize → decode →
//! detokenize. These are intentionally simple rule-based passes; production
//! deployments plug their language-specific filters in at the process
//! boundary instead.

/// Tokenize a raw input line: lowercase, split punctuation off word
/// boundaries, collapse whitespace.
#[must_use]
pub fn tokenize(line: &str) -> String {
    let mut tokens: Vec<String> = Vec::new();
    for word in line.split_whitespace() {
        let word = word.to_lowercase();
        let mut core = word.as_str();

        let mut leading: Vec<char> = Vec::new();
        while let Some(c) = core.chars().next() {
            if is_splittable(c) {
                leading.push(c);
                core = &core[c.len_utf8()..];
            } else {
                break;
            }
        }

        let mut trailing: Vec<char> = Vec::new();
        while let Some(c) = core.chars().next_back() {
            if is_splittable(c) {
                trailing.push(c);
                core = &core[..core.len() - c.len_utf8()];
            } else {
                break;
            }
        }

        tokens.extend(leading.iter().map(ToString::to_string));
        if !core.is_empty() {
            tokens.push(core.to_owned());
        }
        tokens.extend(trailing.iter().rev().map(ToString::to_string));
    }
    tokens.join(" ")
}

/// Reassemble a detokenized line from space-separated tokens: closing
/// punctuation attaches to the previous token, opening brackets to the next.
#[must_use]
pub fn detokenize(tokens: &str) -> String {
    let mut out = String::new();
    let mut glue_next = false;
    for token in tokens.split_whitespace() {
        let attach_prev = token.chars().all(|c| matches!(c, '.' | ',' | '!' | '?' | ';' | ':' | ')' | ']' | '}' | '»' | '%'));
        let attach_next = token.chars().all(|c| matches!(c, '(' | '[' | '{' | '«'));

        if out.is_empty() || attach_prev || glue_next {
            out.push_str(token);
        } else {
            out.push(' ');
            out.push_str(token);
        }
        glue_next = attach_next;
    }
    out
}

fn is_splittable(c: char) -> bool {
    c.is_ascii_punctuation() || matches!(c, '«' | '»' | '¿' | '¡')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_trailing_punctuation() {
        assert_eq!(tokenize("Hello, world!"), "hello , world !");
    }

    #[test]
    fn tokenize_splits_leading_punctuation() {
        assert_eq!(tokenize("(see below)"), "( see below )");
    }

    #[test]
    fn tokenize_lowercases() {
        assert_eq!(tokenize("HELLO World"), "hello world");
    }

    #[test]
    fn tokenize_collapses_whitespace() {
        assert_eq!(tokenize("  a \t b  "), "a b");
    }

    #[test]
    fn detokenize_attaches_punctuation() {
        assert_eq!(detokenize("hello , world !"), "hello, world!");
    }

    #[test]
    fn detokenize_opening_bracket_glues_forward() {
        assert_eq!(detokenize("a ( b ) c"), "a (b) c");
    }

    #[test]
    fn tokenize_detokenize_plain_text_roundtrip() {
        let line = "hello, world!";
        assert_eq!(detokenize(&tokenize(line)), line);
    }

    #[test]
    fn empty_line_stays_empty() {
        assert_eq!(tokenize(""), "");
        assert_eq!(detokenize(""), "");
    }

    #[test]
    fn punctuation_only_token() {
        assert_eq!(tokenize("..."), ". . .");
    }
}
