//! Alternate phrasings of an ingredient name.
//!
//! "Turmeric Powder" rarely has its own encyclopedia article, "Turmeric" does.
//! [`query_variants`] yields the phrase itself, then the phrase with a trailing
//! qualifier removed, then a singular/plural toggle. Consumers stop at the
//! first variant that produces a hit.

/// Trailing qualifier words that are stripped, in the order they are tried.
pub const QUALIFIERS: &[&str] = &[
    "powder", "powdered", "flour", "meal", "extract", "oil", "crushed",
];

/// Lazily yields query variants for `phrase`, original first.
pub fn query_variants(phrase: &str) -> QueryVariants<'_> {
    QueryVariants {
        phrase: phrase.trim(),
        next: Step::Original,
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Original,
    Qualifier(usize),
    Plural,
    Done,
}

/// Iterator returned by [`query_variants`]. Holds only the input phrase, so
/// calling [`query_variants`] again starts over.
#[derive(Debug, Clone)]
pub struct QueryVariants<'a> {
    phrase: &'a str,
    next: Step,
}

impl Iterator for QueryVariants<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            match self.next {
                Step::Original => {
                    self.next = Step::Qualifier(0);
                    return Some(self.phrase.to_string());
                }
                Step::Qualifier(i) => {
                    let Some(qualifier) = QUALIFIERS.get(i) else {
                        self.next = Step::Plural;
                        continue;
                    };
                    self.next = Step::Qualifier(i + 1);
                    if let Some(stripped) = strip_qualifier(self.phrase, qualifier) {
                        return Some(stripped.to_string());
                    }
                }
                Step::Plural => {
                    self.next = Step::Done;
                    return Some(toggle_plural(self.phrase));
                }
                Step::Done => return None,
            }
        }
    }
}

/// `"Turmeric Powder"` minus `" powder"` (ASCII case-insensitive).
fn strip_qualifier<'a>(phrase: &'a str, qualifier: &str) -> Option<&'a str> {
    let suffix_len = qualifier.len() + 1;
    let split_at = phrase.len().checked_sub(suffix_len)?;
    let suffix = phrase.get(split_at..)?;
    let matches = suffix.starts_with(' ') && suffix[1..].eq_ignore_ascii_case(qualifier);
    matches.then(|| &phrase[..split_at])
}

fn toggle_plural(phrase: &str) -> String {
    match phrase.strip_suffix(['s', 'S']) {
        Some(singular) => singular.to_string(),
        None => format!("{phrase}s"),
    }
}
