// ABOUTME: Rolling-name parser: splits a process name into base, color, and index.
// ABOUTME: The rightmost valid color suffix wins; names with leftover text are flagged ambiguous.

use crate::types::{Color, ColorPair};

/// Index used when a name carries no numeric instance suffix.
pub const DEFAULT_INDEX: u32 = 0;

pub const SEPARATORS: [char; 2] = ['-', '_'];

/// Rolling identity extracted from a process name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingName {
    pub base: String,
    pub color: Option<Color>,
    pub index: u32,
    /// Set when the color match cannot be trusted: another valid color token
    /// appears in the name, or non-index text follows the matched token.
    pub ambiguous: bool,
}

impl RollingName {
    pub fn is_rolling(&self) -> bool {
        self.color.is_some() && !self.ambiguous
    }
}

struct ColorMatch<'a> {
    start: usize,
    end: usize,
    color: &'a Color,
}

pub fn parse_rolling_name(name: &str, colors: &ColorPair) -> RollingName {
    let mut found: Vec<ColorMatch<'_>> = Vec::new();

    for color in colors.iter() {
        for sep in SEPARATORS {
            let token = format!("{sep}{color}");
            let last_valid = name
                .rmatch_indices(token.as_str())
                .map(|(start, _)| start)
                .find(|&start| ends_at_boundary(name, start + token.len()));
            if let Some(start) = last_valid {
                found.push(ColorMatch {
                    start,
                    end: start + token.len(),
                    color,
                });
            }
        }
    }

    let valid_total = count_valid_matches(name, colors);

    let Some(best) = found.iter().max_by_key(|m| m.start) else {
        return RollingName {
            base: name.to_string(),
            color: None,
            index: DEFAULT_INDEX,
            ambiguous: false,
        };
    };

    let (index, rest) = split_index(&name[best.end..]);

    RollingName {
        base: name[..best.start].to_string(),
        color: Some(best.color.clone()),
        index: index.unwrap_or(DEFAULT_INDEX),
        ambiguous: !rest.is_empty() || valid_total > 1,
    }
}

fn ends_at_boundary(name: &str, end: usize) -> bool {
    match name[end..].chars().next() {
        None => true,
        Some(c) => SEPARATORS.contains(&c),
    }
}

fn count_valid_matches(name: &str, colors: &ColorPair) -> usize {
    colors
        .iter()
        .flat_map(|color| {
            SEPARATORS
                .iter()
                .map(move |sep| format!("{sep}{color}"))
                .collect::<Vec<_>>()
        })
        .map(|token| {
            name.match_indices(token.as_str())
                .filter(|(start, _)| ends_at_boundary(name, start + token.len()))
                .count()
        })
        .sum()
}

/// Split `<sep><digits>` off the text after a color token.
fn split_index(after: &str) -> (Option<u32>, &str) {
    let mut chars = after.char_indices();
    match chars.next() {
        Some((_, c)) if SEPARATORS.contains(&c) => {}
        _ => return (None, after),
    }

    let digits_end = after[1..]
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i + 1)
        .unwrap_or(after.len());

    if digits_end == 1 {
        return (None, after);
    }

    match after[1..digits_end].parse::<u32>() {
        Ok(index) => (Some(index), &after[digits_end..]),
        Err(_) => (None, after),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str) -> RollingName {
        parse_rolling_name(name, &ColorPair::default())
    }

    #[test]
    fn plain_suffix() {
        let n = parse("ingest-worker-blue");
        assert_eq!(n.base, "ingest-worker");
        assert_eq!(n.color.unwrap().as_str(), "blue");
        assert_eq!(n.index, DEFAULT_INDEX);
        assert!(!n.ambiguous);
    }

    #[test]
    fn underscore_separator_and_index() {
        let n = parse("ingest_worker_green_2");
        assert_eq!(n.base, "ingest_worker");
        assert_eq!(n.color.unwrap().as_str(), "green");
        assert_eq!(n.index, 2);
        assert!(!n.ambiguous);
    }

    #[test]
    fn no_color_keeps_full_name() {
        let n = parse("frappe-web");
        assert_eq!(n.base, "frappe-web");
        assert!(n.color.is_none());
        assert!(!n.is_rolling());
    }

    #[test]
    fn color_inside_longer_word_is_not_a_match() {
        let n = parse("worker-blueberry");
        assert!(n.color.is_none());

        let n = parse("worker-greenhouse-blue");
        assert_eq!(n.base, "worker-greenhouse");
        assert_eq!(n.color.unwrap().as_str(), "blue");
        assert!(!n.ambiguous);
    }

    #[test]
    fn rightmost_match_wins() {
        let n = parse("reports-green-worker-blue");
        assert_eq!(n.base, "reports-green-worker");
        assert_eq!(n.color.unwrap().as_str(), "blue");
    }

    #[test]
    fn base_carrying_a_color_is_flagged() {
        let n = parse("reports-green-worker-blue");
        assert!(n.ambiguous);
        assert!(!n.is_rolling());
    }

    #[test]
    fn trailing_text_after_color_is_flagged() {
        let n = parse("ingest-green-worker");
        assert_eq!(n.color.unwrap().as_str(), "green");
        assert!(n.ambiguous);
    }

    #[test]
    fn color_followed_by_separator_without_digits_is_flagged() {
        let n = parse("ingest-blue-");
        assert!(n.ambiguous);
    }

    #[test]
    fn oversized_index_is_not_an_index() {
        let n = parse("ingest-blue-99999999999");
        assert_eq!(n.index, DEFAULT_INDEX);
        assert!(n.ambiguous);
    }
}
