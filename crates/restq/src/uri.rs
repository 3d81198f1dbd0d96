//! Query-string assembly
//!
//! Builds the query part of a request URI from compiled parameters.
//! Values are percent-encoded byte by byte over their UTF-8 form.

use restq_compiler::{CompileResult, QueryNode, QueryParameters, print};
use std::fmt;

/// Bytes that pass through unescaped besides ASCII alphanumerics
const UNRESERVED: &[u8] = b"'.~-_()$";

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode a query-string key or value.
///
/// Space becomes `+`; every other byte outside the unreserved set becomes
/// `%XX` with uppercase hex digits.
pub fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b' ' => out.push('+'),
            b if b.is_ascii_alphanumeric() || UNRESERVED.contains(&b) => out.push(b as char),
            b => {
                out.push('%');
                out.push(HEX[usize::from(b >> 4)] as char);
                out.push(HEX[usize::from(b & 0x0f)] as char);
            }
        }
    }
    out
}

/// Accumulates `key=value` pairs joined by `&`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriQueryBuilder {
    query: String,
}

impl UriQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one pair, encoding both key and value
    pub fn append_parameter(&mut self, key: &str, value: &str) -> &mut Self {
        if !self.query.is_empty() {
            self.query.push('&');
        }
        self.query.push_str(&encode_query_value(key));
        self.query.push('=');
        self.query.push_str(&encode_query_value(value));
        self
    }

    /// Print a query tree and append it as the value of `key`.
    ///
    /// Fails with the tracked unsupported-construct error when the tree is
    /// not representable; the builder is left unchanged in that case.
    pub fn append_expression_parameter(&mut self, key: &str, node: &QueryNode) -> CompileResult<&mut Self> {
        let text = print(node)?;
        Ok(self.append_parameter(key, &text))
    }

    /// Append every set parameter in canonical order
    pub fn append_query(&mut self, params: &QueryParameters) -> &mut Self {
        for (key, value) in params.to_pairs() {
            self.append_parameter(key, &value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.query
    }

    pub fn build(self) -> String {
        log::trace!("built query string `{}`", self.query);
        self.query
    }
}

impl fmt::Display for UriQueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("jalla eq 'What'", "jalla+eq+'What'")]
    #[case("a/b?c=d&e", "a%2Fb%3Fc%3Dd%26e")]
    #[case("$filter", "$filter")]
    #[case("x.y~z-w_(v)", "x.y~z-w_(v)")]
    #[case("æ", "%C3%A6")]
    #[case("100%", "100%25")]
    fn test_encode(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(encode_query_value(input), expected);
    }

    #[test]
    fn test_pairs_join_with_ampersand() {
        let mut builder = UriQueryBuilder::new();
        assert!(builder.is_empty());
        builder.append_parameter("$top", "5").append_parameter("$skip", "10");
        assert_eq!(builder.to_string(), "$top=5&$skip=10");
        assert_eq!(builder.build(), "$top=5&$skip=10");
    }
}
