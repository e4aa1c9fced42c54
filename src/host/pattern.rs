//! Amiga-style wildcard patterns.
//!
//! Supported syntax: `?` (any single character), `#p` (zero or more
//! repetitions of the element `p`, so `#?` is "any string"), `*` (alias
//! for `#?`), `[...]` character classes with ranges and `~` negation,
//! `(a|b)` alternation, `~p` negation, and `'` to escape the next
//! character. Matching is case-insensitive, as on AmigaDOS.
//!
//! A pattern that compiles without any wildcard falls back to plain
//! case-insensitive equality, mirroring `ParsePattern`'s no-wildcard
//! result that the file operators branch on.

/// A single compiled pattern element.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Elem {
    /// Literal character, compared case-insensitively.
    Lit(char),
    /// `?`: any single character.
    Any,
    /// `[...]`: character class.
    Class { negated: bool, items: Vec<ClassItem> },
    /// `#p`: zero or more repetitions of the element.
    Repeat(Box<Elem>),
    /// `(a|b|c)`: alternation between sub-sequences.
    Alt(Vec<Vec<Elem>>),
    /// `~p`: matches input not matched by the element.
    Not(Box<Elem>),
    /// Parenthesized sub-sequence without alternation.
    Seq(Vec<Elem>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassItem {
    Char(char),
    Range(char, char),
}

/// Errors reported by [`Pattern::compile`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("unbalanced parenthesis in pattern")]
    UnbalancedParen,
    #[error("unterminated character class")]
    UnterminatedClass,
    #[error("dangling '{0}' at end of pattern")]
    DanglingOperator(char),
}

/// A compiled Amiga wildcard pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    elems: Vec<Elem>,
    literal: Option<String>,
}

impl Pattern {
    /// Compile `source` into a matchable pattern.
    pub fn compile(source: &str) -> Result<Pattern, PatternError> {
        let chars: Vec<char> = source.chars().collect();
        let mut pos = 0;
        let (elems, wild) = parse_alt(&chars, &mut pos)?;
        if pos != chars.len() {
            // A stray ')' stopped the parse early.
            return Err(PatternError::UnbalancedParen);
        }
        let literal = if wild {
            None
        } else {
            // All elements are literals; rebuild the string so escapes
            // compare by their unescaped character.
            Some(
                elems
                    .iter()
                    .map(|e| match e {
                        Elem::Lit(c) => c.to_ascii_lowercase(),
                        _ => unreachable!("wildcard-free pattern holds literals only"),
                    })
                    .collect(),
            )
        };
        Ok(Pattern { elems, literal })
    }

    /// True when the pattern contains no wildcard at all.
    pub fn is_literal(&self) -> bool {
        self.literal.is_some()
    }

    /// Match `input` against the whole pattern.
    pub fn matches(&self, input: &str) -> bool {
        if let Some(lit) = &self.literal {
            return lit == &input.to_ascii_lowercase();
        }
        let chars: Vec<char> = input.chars().collect();
        match_seq(&self.elems, &chars)
    }
}

fn eq_ci(a: char, b: char) -> bool {
    a.eq_ignore_ascii_case(&b)
}

/// Parse a sequence with `|` alternation, stopping at an unconsumed `)`.
/// Returns the elements and whether any wildcard was seen.
fn parse_alt(chars: &[char], pos: &mut usize) -> Result<(Vec<Elem>, bool), PatternError> {
    let mut branches: Vec<Vec<Elem>> = Vec::new();
    let mut wild = false;
    let (seq, w) = parse_seq(chars, pos)?;
    wild |= w;
    branches.push(seq);
    while *pos < chars.len() && chars[*pos] == '|' {
        *pos += 1;
        wild = true;
        let (seq, w) = parse_seq(chars, pos)?;
        wild |= w;
        branches.push(seq);
    }
    if branches.len() == 1 {
        Ok((branches.pop().unwrap_or_default(), wild))
    } else {
        Ok((vec![Elem::Alt(branches)], true))
    }
}

fn parse_seq(chars: &[char], pos: &mut usize) -> Result<(Vec<Elem>, bool), PatternError> {
    let mut out = Vec::new();
    let mut wild = false;
    while *pos < chars.len() {
        match chars[*pos] {
            ')' => break, // caller reports the imbalance when not nested
            '|' => break,
            _ => {
                let (e, w) = parse_elem(chars, pos)?;
                wild |= w;
                out.push(e);
            }
        }
    }
    Ok((out, wild))
}

fn parse_elem(chars: &[char], pos: &mut usize) -> Result<(Elem, bool), PatternError> {
    let c = chars[*pos];
    *pos += 1;
    match c {
        '?' => Ok((Elem::Any, true)),
        '*' => Ok((Elem::Repeat(Box::new(Elem::Any)), true)),
        '#' => {
            if *pos >= chars.len() {
                return Err(PatternError::DanglingOperator('#'));
            }
            let (inner, _) = parse_elem(chars, pos)?;
            Ok((Elem::Repeat(Box::new(inner)), true))
        }
        '~' => {
            if *pos >= chars.len() {
                return Err(PatternError::DanglingOperator('~'));
            }
            let (inner, _) = parse_elem(chars, pos)?;
            Ok((Elem::Not(Box::new(inner)), true))
        }
        '(' => {
            let (mut inner, _) = parse_alt(chars, pos)?;
            if *pos >= chars.len() || chars[*pos] != ')' {
                return Err(PatternError::UnbalancedParen);
            }
            *pos += 1;
            if inner.len() == 1 {
                Ok((inner.remove(0), true))
            } else {
                Ok((Elem::Seq(inner), true))
            }
        }
        '[' => {
            let mut items = Vec::new();
            let mut negated = false;
            if *pos < chars.len() && chars[*pos] == '~' {
                negated = true;
                *pos += 1;
            }
            while *pos < chars.len() && chars[*pos] != ']' {
                let lo = chars[*pos];
                *pos += 1;
                if *pos + 1 < chars.len() && chars[*pos] == '-' && chars[*pos + 1] != ']' {
                    let hi = chars[*pos + 1];
                    *pos += 2;
                    items.push(ClassItem::Range(lo, hi));
                } else {
                    items.push(ClassItem::Char(lo));
                }
            }
            if *pos >= chars.len() {
                return Err(PatternError::UnterminatedClass);
            }
            *pos += 1; // consume ']'
            Ok((Elem::Class { negated, items }, true))
        }
        '\'' => {
            if *pos >= chars.len() {
                return Err(PatternError::DanglingOperator('\''));
            }
            let lit = chars[*pos];
            *pos += 1;
            Ok((Elem::Lit(lit), false))
        }
        other => Ok((Elem::Lit(other), false)),
    }
}

fn class_matches(negated: bool, items: &[ClassItem], c: char) -> bool {
    let lower = c.to_ascii_lowercase();
    let hit = items.iter().any(|item| match item {
        ClassItem::Char(x) => eq_ci(*x, c),
        ClassItem::Range(lo, hi) => {
            let lo = lo.to_ascii_lowercase();
            let hi = hi.to_ascii_lowercase();
            lower >= lo && lower <= hi
        }
    });
    hit != negated
}

/// Match an element sequence against the entire input, with backtracking.
fn match_seq(elems: &[Elem], input: &[char]) -> bool {
    let Some((first, rest)) = elems.split_first() else {
        return input.is_empty();
    };
    match first {
        Elem::Lit(c) => input.first().is_some_and(|i| eq_ci(*c, *i)) && match_seq(rest, &input[1..]),
        Elem::Any => !input.is_empty() && match_seq(rest, &input[1..]),
        Elem::Class { negated, items } => {
            input.first().is_some_and(|i| class_matches(*negated, items, *i))
                && match_seq(rest, &input[1..])
        }
        Elem::Repeat(inner) => {
            // Zero repetitions first, then one repetition of the inner
            // element followed by the repeat again.
            if match_seq(rest, input) {
                return true;
            }
            let single = std::slice::from_ref(inner.as_ref());
            for k in 1..=input.len() {
                if match_seq(single, &input[..k]) && match_seq(elems, &input[k..]) {
                    return true;
                }
            }
            false
        }
        Elem::Alt(branches) => {
            for branch in branches {
                for k in 0..=input.len() {
                    if match_seq(branch, &input[..k]) && match_seq(rest, &input[k..]) {
                        return true;
                    }
                }
            }
            false
        }
        Elem::Seq(inner) => {
            for k in 0..=input.len() {
                if match_seq(inner, &input[..k]) && match_seq(rest, &input[k..]) {
                    return true;
                }
            }
            false
        }
        Elem::Not(inner) => {
            let single = std::slice::from_ref(inner.as_ref());
            for k in 0..=input.len() {
                if !match_seq(single, &input[..k]) && match_seq(rest, &input[k..]) {
                    return true;
                }
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn matches(pat: &str, input: &str) -> bool {
        Pattern::compile(pat).expect("pattern compiles").matches(input)
    }

    #[rstest]
    #[case("#?", "", true)]
    #[case("#?", "anything", true)]
    #[case("#?.info", "disk.info", true)]
    #[case("#?.info", "disk.inf", false)]
    #[case("*.library", "asl.library", true)]
    #[case("a?c", "abc", true)]
    #[case("a?c", "ac", false)]
    #[case("[a-c]x", "bx", true)]
    #[case("[a-c]x", "dx", false)]
    #[case("[~a-c]x", "dx", true)]
    #[case("(foo|bar)", "bar", true)]
    #[case("(foo|bar)", "baz", false)]
    #[case("#(ab)", "ababab", true)]
    #[case("#(ab)", "abab0", false)]
    fn test_wildcards(#[case] pat: &str, #[case] input: &str, #[case] expected: bool) {
        assert_eq!(matches(pat, input), expected, "{pat} vs {input}");
    }

    #[test]
    fn test_case_insensitive() {
        assert!(matches("READ.ME", "read.me"));
        assert!(matches("#?.INFO", "Disk.info"));
    }

    #[test]
    fn test_literal_fallback() {
        let p = Pattern::compile("plain.txt").unwrap();
        assert!(p.is_literal());
        assert!(p.matches("PLAIN.TXT"));
        assert!(!p.matches("plain.txt.bak"));
    }

    #[test]
    fn test_escape_disarms_wildcard() {
        let p = Pattern::compile("a'?b").unwrap();
        assert!(p.matches("a?b"));
        assert!(!p.matches("axb"));
    }

    #[test]
    fn test_negation() {
        assert!(matches("~(#?.info)", "readme"));
        assert!(!matches("~(#?.info)", "disk.info"));
    }

    #[test]
    fn test_compile_errors() {
        assert!(matches!(
            Pattern::compile("(ab"),
            Err(PatternError::UnbalancedParen)
        ));
        assert!(matches!(
            Pattern::compile("[ab"),
            Err(PatternError::UnterminatedClass)
        ));
        assert!(matches!(
            Pattern::compile("#"),
            Err(PatternError::DanglingOperator('#'))
        ));
    }
}
