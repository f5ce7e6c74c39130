//! Parsing of `key: value` header lines supplied by the runner.

use crate::Headers;

/// Parses `key: value` lines into a header map.
///
/// Each line is split on its first `:` only, so `x-test: a:b` maps `x-test`
/// to `a:b`. Lines whose trimmed key or value is empty are skipped, and later
/// lines overwrite earlier ones with the same key.
///
/// Returns `None` when no input is given or no line yields a pair, so an
/// absent header set and an empty one are reported the same way.
pub fn parse_header_lines<I, S>(lines: Option<I>) -> Option<Headers>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut headers = Headers::new();

    for line in lines? {
        let Some((key, value)) = line.as_ref().split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if !key.is_empty() && !value.is_empty() {
            headers.insert(key.to_owned(), value.to_owned());
        }
    }

    if headers.is_empty() {
        None
    } else {
        Some(headers)
    }
}

/// Parses a multiline input block, one header per line.
///
/// Blank lines are ignored.
pub fn parse_header_block(block: &str) -> Option<Headers> {
    let lines = block.lines().filter(|line| !line.trim().is_empty());
    parse_header_lines(Some(lines))
}
