//! Doc-comment tokenizer.
//!
//! Splits a gtk-doc style comment into typed tokens. Every byte of the input
//! ends up in exactly one token; text between markup is emitted as
//! [`TokenKind::Other`].

use crate::grammar::{Grammar, GrammarError};
use std::ops::Range;

/// Inline markup understood in doc strings, in match priority order.
const DOC_GRAMMAR: &[(&str, &str)] = &[
    ("!alpha", r"[a-zA-Z0-9_]+"),
    ("!alpha_dash", r"[a-zA-Z0-9_-]+"),
    ("!anything", r".*"),
    ("note", r">\s*<<note_contents:anything>>\s*\n"),
    ("new_paragraph", r"\n\n"),
    ("new_line", r"\n"),
    (
        "code_start_with_language",
        r#"\|\[<!--\s*language\s*=\s*"<<language_name:alpha>>"\s*-->"#,
    ),
    ("code_start", r"\|\["),
    ("code_end", r"\]\|"),
    ("property", r"#<<type_name:alpha>>:(<<property_name:alpha_dash>>)"),
    ("signal", r"#<<type_name:alpha>>::(<<signal_name:alpha_dash>>)"),
    ("type_name", r"#(<<type_name:alpha>>)"),
    ("enum_value", r"%(<<member_name:alpha>>)"),
    ("parameter", r"@<<param_name:alpha>>"),
    ("function_call", r"<<symbol_name:alpha>>\(\)"),
    ("include", r"\{\{\s*<<include_name:anything>>\s*\}\}"),
    ("heading", r"#+\s+<<heading:anything>>"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Other,
    Note,
    NewParagraph,
    NewLine,
    CodeStart,
    CodeStartWithLanguage,
    CodeEnd,
    Property,
    Signal,
    TypeName,
    EnumValue,
    Parameter,
    FunctionCall,
    Include,
    Heading,
}

impl TokenKind {
    /// Map a grammar alternative name to its token kind.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "other" => TokenKind::Other,
            "note" => TokenKind::Note,
            "new_paragraph" => TokenKind::NewParagraph,
            "new_line" => TokenKind::NewLine,
            "code_start" => TokenKind::CodeStart,
            "code_start_with_language" => TokenKind::CodeStartWithLanguage,
            "code_end" => TokenKind::CodeEnd,
            "property" => TokenKind::Property,
            "signal" => TokenKind::Signal,
            "type_name" => TokenKind::TypeName,
            "enum_value" => TokenKind::EnumValue,
            "parameter" => TokenKind::Parameter,
            "function_call" => TokenKind::FunctionCall,
            "include" => TokenKind::Include,
            "heading" => TokenKind::Heading,
            _ => return None,
        })
    }
}

/// A slice of a doc string tagged with what it means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw matched text.
    pub text: &'a str,
    pub span: Range<usize>,
    props: Vec<(&'a str, &'a str)>,
}

impl<'a> Token<'a> {
    fn other(text: &'a str, span: Range<usize>) -> Self {
        Token {
            kind: TokenKind::Other,
            text: &text[span.clone()],
            span,
            props: Vec::new(),
        }
    }

    /// Named sub-capture, e.g. `type_name` of a property reference.
    pub fn prop(&self, key: &str) -> Option<&'a str> {
        self.props.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

pub struct DocScanner {
    grammar: Grammar,
    /// Token kind of each grammar alternative, by alternative index.
    kinds: Vec<TokenKind>,
}

impl DocScanner {
    pub fn new() -> Result<Self, GrammarError> {
        let grammar = Grammar::compile(DOC_GRAMMAR)?;
        let kinds = grammar
            .alternatives()
            .map(|name| {
                TokenKind::from_name(name)
                    .ok_or_else(|| GrammarError::UnknownAlternative(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DocScanner { grammar, kinds })
    }

    /// Lazily tokenize `text`.
    pub fn scan<'a>(&'a self, text: &'a str) -> Tokens<'a> {
        Tokens {
            scanner: self,
            text,
            pos: 0,
            pending: None,
        }
    }

    /// Next non-empty match at or after `start`.
    fn next_match<'a>(&'a self, text: &'a str, mut start: usize) -> Option<Token<'a>> {
        while start <= text.len() {
            let m = self.grammar.find_at(text, start)?;
            if m.span.is_empty() {
                start = m.span.start + text[m.span.start..].chars().next()?.len_utf8();
                continue;
            }
            return Some(Token {
                kind: self.kinds[m.alternative],
                text: &text[m.span.clone()],
                span: m.span,
                props: m.captures,
            });
        }
        None
    }
}

/// Iterator returned by [`DocScanner::scan`].
pub struct Tokens<'a> {
    scanner: &'a DocScanner,
    text: &'a str,
    pos: usize,
    pending: Option<Token<'a>>,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if let Some(token) = self.pending.take() {
            return Some(token);
        }
        if self.pos >= self.text.len() {
            return None;
        }

        match self.scanner.next_match(self.text, self.pos) {
            Some(token) => {
                let start = self.pos;
                self.pos = token.span.end;
                if token.span.start > start {
                    let gap = start..token.span.start;
                    self.pending = Some(token);
                    Some(Token::other(self.text, gap))
                } else {
                    Some(token)
                }
            }
            None => {
                let rest = self.pos..self.text.len();
                self.pos = self.text.len();
                Some(Token::other(self.text, rest))
            }
        }
    }
}
