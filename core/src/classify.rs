//! Full lexical classification of running text: HTML tags, calendar dates,
//! clock times, percentages, words, whitespace and everything else.
//!
//! Rules are tried in that order at every position and the first non-empty
//! match wins, so `July 4, 2021` is one date rather than a word and a number.
//! Context checks that a plain regex cannot express (what precedes or follows
//! a match) are done by hand around each rule.

use lazy_static::lazy_static;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    HtmlTag,
    Date,
    Time,
    Percent,
    Word,
    Space,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
}

/// Required surroundings of a match.
#[derive(Debug, Clone, Copy)]
enum Guard {
    None,
    /// Next char is not ASCII alphanumeric.
    NoAlnumAfter,
    /// Neither neighbouring char is ASCII alphanumeric.
    NoAlnumAround,
    /// Preceded by whitespace or `(`, followed by optional `,.:` then whitespace or end.
    PercentContext,
    /// Preceded by whitespace or start of text.
    WordStart,
}

struct Rule {
    kind: TokenKind,
    re: Regex,
    guard: Guard,
}

fn rule(kind: TokenKind, pattern: &str, guard: Guard) -> Rule {
    let re = Regex::new(&format!("^(?:{pattern})")).expect("valid regex");
    Rule { kind, re, guard }
}

fn date_pattern() -> String {
    let m31 = "January|Jan|March|Mar|May|July|Jul|August|Aug|October|Oct|December|Dec";
    let d31 = r"(?:[1-9]|3[10]|[12]\d)";
    let m30 = "April|Apr|June|Jun|September|Sep|November|Nov";
    let d30 = r"(?:[1-9]|30|[12]\d)";
    let m29 = "February|Feb";
    let d29 = r"(?:[1-9]|[12]\d)";
    let year = r"\d*";
    [(m31, d31), (m30, d30), (m29, d29)]
        .iter()
        .flat_map(|(m, d)| [format!(r"(?:{m})\s{d},\s{year}"), format!(r"{d}\s(?:{m})\s{year}")])
        .collect::<Vec<_>>()
        .join("|")
}

lazy_static! {
    static ref RULES: Vec<Rule> = {
        let secmin = r"[0-5]\d";
        vec![
            rule(TokenKind::HtmlTag, r"<[^<]+>", Guard::None),
            rule(TokenKind::Date, &format!("(?i){}", date_pattern()), Guard::None),
            rule(TokenKind::Time, &format!(r"(?i)[0-1]\d\.{secmin}(?:AM|PM)"), Guard::NoAlnumAfter),
            rule(TokenKind::Time, &format!(r"(?i)[0-1]\d{secmin}(?:p\.m\.|a\.m\.)"), Guard::NoAlnumAfter),
            rule(TokenKind::Time, &format!(r"[1-9]:{secmin}:{secmin}"), Guard::NoAlnumAround),
            rule(TokenKind::Time, &format!(r"1\d:{secmin}:{secmin}"), Guard::NoAlnumAround),
            rule(TokenKind::Time, &format!(r"2[0-3]:{secmin}:{secmin}"), Guard::NoAlnumAround),
            rule(TokenKind::Percent, r"[+\-]?\d{1,3}(?:,\d{3})*(?:\.\d+)?%", Guard::PercentContext),
            rule(TokenKind::Word, r"(?i)(?:(?:[a-z]+'*[a-z]*)+-*)*(?:[a-z]+'*[a-z]*)?", Guard::WordStart),
            rule(TokenKind::Space, r"\s+", Guard::None),
        ]
    };
}

fn accepts(guard: Guard, before: Option<char>, after: &str) -> bool {
    let next = after.chars().next();
    let alnum = |c: Option<char>| c.map_or(false, |c| c.is_ascii_alphanumeric());
    match guard {
        Guard::None => true,
        Guard::NoAlnumAfter => !alnum(next),
        Guard::NoAlnumAround => !alnum(before) && !alnum(next),
        Guard::PercentContext => {
            let opened = before.map_or(false, |c| c.is_whitespace() || c == '(');
            let rest = after.strip_prefix(|c: char| matches!(c, ',' | '.' | ':')).unwrap_or(after);
            opened && rest.chars().next().map_or(true, char::is_whitespace)
        }
        Guard::WordStart => before.map_or(true, char::is_whitespace),
    }
}

/// Split `text` into classified lexemes covering every byte of the input.
pub fn classify(text: &str) -> Vec<Lexeme<'_>> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let before = text[..pos].chars().next_back();
        let rest = &text[pos..];
        let hit = RULES.iter().find_map(|r| {
            let m = r.re.find(rest)?;
            (m.end() > 0 && accepts(r.guard, before, &rest[m.end()..])).then_some((r.kind, m.end()))
        });
        let (kind, len) = hit.unwrap_or_else(|| {
            let len = rest.chars().next().map_or(1, char::len_utf8);
            (TokenKind::Other, len)
        });
        out.push(Lexeme { kind, text: &rest[..len], start: pos });
        pos += len;
    }
    out
}

/// Lexemes of one kind, in order.
pub fn of_kind(text: &str, kind: TokenKind) -> Vec<&str> {
    classify(text).into_iter().filter(|l| l.kind == kind).map(|l| l.text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(TokenKind, &str)> {
        classify(text).into_iter().filter(|l| l.kind != TokenKind::Space).map(|l| (l.kind, l.text)).collect()
    }

    #[test]
    fn dates_win_over_words_and_numbers() {
        assert_eq!(of_kind("born July 4, 1776 in town", TokenKind::Date), vec!["July 4, 1776"]);
        assert_eq!(of_kind("on 30 april 2020", TokenKind::Date), vec!["30 april 2020"]);
        assert!(of_kind("Feb 30, 2020", TokenKind::Date).is_empty());
    }

    #[test]
    fn clock_times() {
        assert_eq!(of_kind("at 10.30AM sharp", TokenKind::Time), vec!["10.30AM"]);
        assert_eq!(of_kind("at 0945a.m. daily", TokenKind::Time), vec!["0945a.m."]);
        assert_eq!(of_kind("ends 23:59:59 tonight", TokenKind::Time), vec!["23:59:59"]);
        assert_eq!(of_kind("ends 7:05:00", TokenKind::Time), vec!["7:05:00"]);
        assert!(of_kind("x24:00:00", TokenKind::Time).is_empty());
    }

    #[test]
    fn percent_needs_context() {
        assert_eq!(of_kind("rose 12.5% today", TokenKind::Percent), vec!["12.5%"]);
        assert_eq!(of_kind("share (1,250%, est)", TokenKind::Percent), vec!["1,250%"]);
        assert!(of_kind("x12%", TokenKind::Percent).is_empty());
    }

    #[test]
    fn words_tags_and_other() {
        assert_eq!(
            kinds("<b>Hall-of-fame</b> don't!"),
            vec![
                (TokenKind::HtmlTag, "<b>"),
                (TokenKind::Other, "H"),
                (TokenKind::Other, "a"),
                (TokenKind::Other, "l"),
                (TokenKind::Other, "l"),
                (TokenKind::Other, "-"),
                (TokenKind::Other, "o"),
                (TokenKind::Other, "f"),
                (TokenKind::Other, "-"),
                (TokenKind::Other, "f"),
                (TokenKind::Other, "a"),
                (TokenKind::Other, "m"),
                (TokenKind::Other, "e"),
                (TokenKind::HtmlTag, "</b>"),
                (TokenKind::Word, "don't"),
                (TokenKind::Other, "!"),
            ]
        );
        assert_eq!(kinds("Hall-of-fame"), vec![(TokenKind::Word, "Hall-of-fame")]);
    }

    #[test]
    fn covers_whole_input() {
        let text = "Über 5 <i>x</i>\n\t9:15:00 — 42%";
        let joined: String = classify(text).iter().map(|l| l.text).collect();
        assert_eq!(joined, text);
    }
}
