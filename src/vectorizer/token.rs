use std::str::Split;

use indexmap::IndexSet;

/// Characters a description is split on.
/// Runs of them collapse into one break. `-` is deliberately absent so compound
/// words such as `chunky-feeling` stay one token.
pub const SEPARATORS: [char; 8] = [' ', ',', '.', '\t', ';', ':', '(', ')'];

#[inline]
fn is_separator(c: char) -> bool {
    matches!(c, ' ' | ',' | '.' | '\t' | ';' | ':' | '(' | ')')
}

/// Lazy lowercase token stream over one description.
///
/// # Examples
/// ```
/// use tfidf_landscape::vectorizer::token::tokenize;
/// let tokens: Vec<String> = tokenize(Some("Chunky-feeling, rich.")).collect();
/// assert_eq!(tokens, vec!["chunky-feeling", "rich"]);
/// assert_eq!(tokenize(None).count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    inner: Split<'a, fn(char) -> bool>,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = String;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let piece = self.inner.next()?;
            if !piece.is_empty() {
                return Some(piece.to_lowercase());
            }
        }
    }
}

/// Tokenize a description.
/// An absent description yields no tokens.
#[inline]
pub fn tokenize(text: Option<&str>) -> Tokens<'_> {
    Tokens {
        inner: text.unwrap_or("").split(is_separator as fn(char) -> bool),
    }
}

/// De-duplicated tokens of one description, first occurrence order.
pub fn token_set(text: Option<&str>) -> Vec<String> {
    let set: IndexSet<String> = tokenize(text).collect();
    set.into_iter().collect()
}
