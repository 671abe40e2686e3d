//! Attribute-list tokenizer for HLS tag lines
//!
//! An attribute list is `KEY=value` pairs separated by commas, where a value
//! is either a double-quoted string (which may itself contain commas) or an
//! unquoted run of characters. The tokenizer splits on commas outside quotes,
//! then splits each token on its first `=`. Malformed tokens are skipped.

/// Iterator over the `(key, value)` pairs of one attribute list.
///
/// Quoted values are yielded with the quotes removed.
#[derive(Debug, Clone)]
pub struct AttributeList<'a> {
    rest: &'a str,
}

impl<'a> AttributeList<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    /// Cut the next top-level token off the front of the input
    fn next_token(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }

        let mut in_quotes = false;
        for (idx, ch) in self.rest.char_indices() {
            match ch {
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => {
                    let token = &self.rest[..idx];
                    self.rest = &self.rest[idx + 1..];
                    return Some(token);
                }
                _ => {}
            }
        }

        let token = self.rest;
        self.rest = "";
        Some(token)
    }
}

impl<'a> Iterator for AttributeList<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(token) = self.next_token() {
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if !is_attribute_name(key) {
                continue;
            }
            return Some((key, unquote(value.trim())));
        }
        None
    }
}

/// Attribute names are uppercase letters, digits and hyphens
fn is_attribute_name(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-')
}

fn unquote(value: &str) -> &str {
    match value.strip_prefix('"') {
        Some(inner) => match inner.find('"') {
            Some(end) => &inner[..end],
            // Unterminated quote: keep whatever follows it
            None => inner,
        },
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &str) -> Vec<(&str, &str)> {
        AttributeList::new(input).collect()
    }

    #[test]
    fn test_unquoted_values() {
        assert_eq!(
            collect("BANDWIDTH=2000000,RESOLUTION=1280x720"),
            vec![("BANDWIDTH", "2000000"), ("RESOLUTION", "1280x720")]
        );
    }

    #[test]
    fn test_quoted_value_keeps_inner_commas() {
        assert_eq!(
            collect(r#"CODECS="avc1.4d401f,mp4a.40.2",BANDWIDTH=1"#),
            vec![("CODECS", "avc1.4d401f,mp4a.40.2"), ("BANDWIDTH", "1")]
        );
    }

    #[test]
    fn test_skips_malformed_tokens() {
        assert_eq!(
            collect("garbage,lower=1,=2,BANDWIDTH=3,,FRAME-RATE="),
            vec![("BANDWIDTH", "3"), ("FRAME-RATE", "")]
        );
    }

    #[test]
    fn test_similar_names_stay_distinct() {
        let attrs = collect("AVERAGE-BANDWIDTH=900,BANDWIDTH=1000");
        assert_eq!(attrs, vec![("AVERAGE-BANDWIDTH", "900"), ("BANDWIDTH", "1000")]);
    }

    #[test]
    fn test_whitespace_and_unterminated_quote() {
        assert_eq!(
            collect(r#" BANDWIDTH = 10 , NAME="open"#),
            vec![("BANDWIDTH", "10"), ("NAME", "open")]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(collect("").is_empty());
    }
}
