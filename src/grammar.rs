//! Named-rule regex composition.
//!
//! A grammar is an ordered list of `(name, pattern)` rules. Patterns may pull
//! in other rules with `<<child>>` (spliced in without a capture) or
//! `<<label:child>>` (captured as `{rule}_{label}`). Rules whose name starts
//! with `!` are building blocks only and never become alternatives of the
//! compiled matcher.

use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;
use thiserror::Error;

static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<<([a-zA-Z_:]+)>>").unwrap());

/// Marker prefix for rules that are only expanded inline.
const INTERNAL_MARKER: char = '!';

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("rule `{rule}` references undefined pattern `{child}`")]
    UndefinedPattern { rule: String, child: String },

    #[error("pattern `{0}` references itself")]
    RecursivePattern(String),

    #[error("grammar alternative `{0}` has no token kind")]
    UnknownAlternative(String),

    #[error("invalid composite pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// One alternative of the compiled matcher and the sub-captures it owns.
#[derive(Debug)]
struct Alternative {
    name: String,
    /// (regex group name, label) pairs, e.g. ("property_type_name", "type_name")
    captures: Vec<(String, String)>,
}

/// A compiled grammar: one regex, one named group per public rule.
#[derive(Debug)]
pub struct Grammar {
    regex: Regex,
    alternatives: Vec<Alternative>,
}

/// A match of one grammar alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarMatch<'a> {
    /// Index into [`Grammar::alternatives`].
    pub alternative: usize,
    pub span: Range<usize>,
    /// Sub-captures keyed by label, in pattern order; unmatched ones are absent.
    pub captures: Vec<(&'a str, &'a str)>,
}

impl Grammar {
    /// Expand every rule and join the public ones into a single alternation.
    ///
    /// Rule order is the tie-break when two alternatives match at the same
    /// position.
    pub fn compile(rules: &[(&str, &str)]) -> Result<Self, GrammarError> {
        let patterns: HashMap<&str, &str> = rules
            .iter()
            .map(|(name, pattern)| (name.trim_start_matches(INTERNAL_MARKER), *pattern))
            .collect();

        let mut branches = Vec::new();
        let mut alternatives = Vec::new();

        for (name, pattern) in rules {
            if name.starts_with(INTERNAL_MARKER) {
                continue;
            }
            let mut stack = vec![name.to_string()];
            let mut captures = Vec::new();
            let expanded = expand(&patterns, pattern, Some(name), &mut stack, &mut captures)?;
            branches.push(format!("(?P<{}>{})", name, expanded));
            alternatives.push(Alternative {
                name: name.to_string(),
                captures,
            });
        }

        let regex = Regex::new(&branches.join("|"))?;
        Ok(Grammar {
            regex,
            alternatives,
        })
    }

    /// Names of the public alternatives, in rule order.
    pub fn alternatives(&self) -> impl Iterator<Item = &str> {
        self.alternatives.iter().map(|a| a.name.as_str())
    }

    /// Find the leftmost match starting at or after `start`.
    pub fn find_at<'a>(&'a self, text: &'a str, start: usize) -> Option<GrammarMatch<'a>> {
        let caps = self.regex.captures_at(text, start)?;
        let whole = caps.get(0)?;

        let (index, alt) = self
            .alternatives
            .iter()
            .enumerate()
            .find(|(_, alt)| caps.name(&alt.name).is_some())?;

        let captures = alt
            .captures
            .iter()
            .filter_map(|(group, label)| caps.name(group).map(|m| (label.as_str(), m.as_str())))
            .collect();

        Some(GrammarMatch {
            alternative: index,
            span: whole.range(),
            captures,
        })
    }
}

/// Substitute placeholders in `pattern`.
///
/// Only placeholders written directly in a public rule (`parent` is set)
/// become named groups; everything nested deeper is spliced in as a plain
/// non-capturing group so group names never repeat.
fn expand(
    patterns: &HashMap<&str, &str>,
    pattern: &str,
    parent: Option<&str>,
    stack: &mut Vec<String>,
    captures: &mut Vec<(String, String)>,
) -> Result<String, GrammarError> {
    let mut out = String::with_capacity(pattern.len());
    let mut last = 0;

    for caps in RE_PLACEHOLDER.captures_iter(pattern) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&pattern[last..whole.start()]);
        last = whole.end();

        let reference = &caps[1];
        let (label, child) = match reference.split_once(':') {
            Some((label, child)) => (Some(label), child),
            None => (None, reference),
        };

        let child_pattern = patterns.get(child).ok_or_else(|| GrammarError::UndefinedPattern {
            rule: stack.last().cloned().unwrap_or_default(),
            child: child.to_string(),
        })?;

        if stack.iter().any(|s| s == child) {
            return Err(GrammarError::RecursivePattern(child.to_string()));
        }
        stack.push(child.to_string());
        let inner = expand(patterns, child_pattern, None, stack, &mut Vec::new())?;
        stack.pop();

        match (label, parent) {
            (Some(label), Some(parent)) => {
                let group = format!("{}_{}", parent, label);
                out.push_str(&format!("(?P<{}>{})", group, inner));
                captures.push((group, label.to_string()));
            }
            _ => {
                out.push_str("(?:");
                out.push_str(&inner);
                out.push(')');
            }
        }
    }

    out.push_str(&pattern[last..]);
    Ok(out)
}
