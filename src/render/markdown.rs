//! Markdown formatter.
//!
//! Two flavors share the page markup: plain markdown links pages by file
//! name, while the Slate flavor targets a single-page Slate site where every
//! page is pulled in through the index front matter and links are anchors.

use crate::model::{Annotation, Flag, ParamType, Parameter};
use crate::render::Formatter;

pub struct MarkdownFormatter {
    slate: bool,
}

impl MarkdownFormatter {
    pub fn plain() -> Self {
        MarkdownFormatter { slate: false }
    }

    /// Input format for https://github.com/slatedocs/slate
    pub fn slate() -> Self {
        MarkdownFormatter { slate: true }
    }

    fn link_target(&self, name: &str) -> String {
        if self.slate {
            format!("#{}", name)
        } else {
            format!("{}.{}", name, self.file_extension())
        }
    }

    fn link(&self, text: &str, name: &str) -> String {
        format!("[{}]({})", text, self.link_target(name))
    }

    fn title(&self, title: &str, level: usize) -> String {
        format!("{} {}{}", "#".repeat(level), title, self.render_new_paragraph())
    }

    fn line(&self, line: &str) -> String {
        format!("{}{}", line, self.render_new_line())
    }

    fn paragraph(&self, paragraph: &str) -> String {
        format!("{}{}", paragraph, self.render_new_paragraph())
    }

    /// ` _(transfer full) (nullable)_`
    fn annotations(&self, annotations: &[Annotation]) -> String {
        if annotations.is_empty() {
            return String::new();
        }
        let labels: Vec<_> = annotations
            .iter()
            .map(|a| format!("({})", a.label()))
            .collect();
        format!(" _{}_", labels.join(" "))
    }
}

impl Formatter for MarkdownFormatter {
    fn file_extension(&self) -> &str {
        "md"
    }

    fn start_namespace(&self, name: &str) -> String {
        self.title(name, 1)
    }

    fn end_namespace(&self) -> String {
        self.render_new_paragraph()
    }

    fn start_doc_section(&self, name: &str) -> String {
        self.title(name, 1)
    }

    fn end_doc_section(&self) -> String {
        self.render_new_paragraph()
    }

    fn start_class(&self, name: &str) -> String {
        self.title(name, 2)
    }

    fn render_hierarchy(&self, base: &str) -> String {
        self.paragraph(&format!("Extends: {}", base))
    }

    fn end_class(&self) -> String {
        self.render_new_paragraph()
    }

    fn start_enum(&self, name: &str) -> String {
        self.title(name, 2)
    }

    fn end_enum(&self) -> String {
        self.render_new_paragraph()
    }

    fn render_member(&self, name: &str, doc: &str) -> String {
        self.line(&format!("+ {}: {}", name, doc))
    }

    fn end_members(&self) -> String {
        self.render_new_line()
    }

    fn start_constant(&self, name: &str, value: Option<&str>) -> String {
        let mut out = self.title(name, 3);
        if let Some(value) = value {
            out.push_str(&self.paragraph(&format!("Value: `{}`", value)));
        }
        out
    }

    fn end_constant(&self) -> String {
        self.render_new_paragraph()
    }

    fn start_function(&self, name: &str, params: &[&str]) -> String {
        self.title(&format!("{} ({})", name, params.join(", ")), 3)
    }

    fn end_function(&self) -> String {
        self.render_new_paragraph()
    }

    fn start_virtual_function(&self, name: &str) -> String {
        self.title(name, 3)
    }

    fn end_virtual_function(&self) -> String {
        self.render_new_paragraph()
    }

    fn start_signal(&self, name: &str) -> String {
        self.title(name, 3)
    }

    fn end_signal(&self) -> String {
        self.render_new_paragraph()
    }

    fn start_property(&self, name: &str) -> String {
        self.title(name, 3)
    }

    fn end_property(&self) -> String {
        self.render_new_paragraph()
    }

    fn render_flags(&self, flags: &[Flag]) -> String {
        if flags.is_empty() {
            return String::new();
        }
        let labels: Vec<_> = flags.iter().map(|f| f.label()).collect();
        self.paragraph(&format!("_Flags: {}_", labels.join(", ")))
    }

    fn start_parameter(&self, name: &str, ty: Option<&str>, annotations: &[Annotation]) -> String {
        let ty = ty.map(|ty| format!(" ({})", ty)).unwrap_or_default();
        format!("+ {}{}{}: ", name, ty, self.annotations(annotations))
    }

    fn end_parameter(&self) -> String {
        self.render_new_line()
    }

    fn end_parameters(&self) -> String {
        self.render_new_line()
    }

    fn render_return_value(&self, ty: &str, annotations: &[Annotation], doc: &str) -> String {
        let mut line = format!("Returns ({}){}", ty, self.annotations(annotations));
        if !doc.is_empty() {
            line.push_str(": ");
            line.push_str(doc);
        }
        self.paragraph(&line)
    }

    fn render_section(&self, title: &str) -> String {
        self.title(&format!("{}:", title), 2)
    }

    fn render_other(&self, text: &str) -> String {
        text.to_string()
    }

    fn render_type_name(&self, name: &str) -> String {
        self.link(name, name)
    }

    fn render_property(&self, name: &str) -> String {
        self.link(name, name)
    }

    fn render_signal(&self, name: &str) -> String {
        self.link(name, name)
    }

    fn render_enum_value(&self, member: &str, enum_name: &str) -> String {
        self.link(member, enum_name)
    }

    fn render_parameter(&self, param: &Parameter) -> String {
        match param.ty {
            ParamType::Variadic => "*...*".to_string(),
            ParamType::Named(_) => format!("*{}*", param.argname),
        }
    }

    fn render_function_call(&self, name: &str) -> String {
        self.link(name, name)
    }

    fn render_code_start(&self) -> String {
        self.line("```")
    }

    fn render_code_start_with_language(&self, language: &str) -> String {
        self.line(&format!("```{}", language))
    }

    fn render_code_end(&self) -> String {
        self.line("```")
    }

    fn render_new_line(&self) -> String {
        "\n".to_string()
    }

    fn render_new_paragraph(&self) -> String {
        "\n\n".to_string()
    }

    fn render_note(&self, note: &str) -> String {
        self.paragraph(&format!("> {}", note))
    }

    fn render_heading(&self, title: &str, level: usize) -> String {
        format!("{} {}", "#".repeat(level.max(1)), title)
    }

    fn start_index(&self, library: &str) -> String {
        if !self.slate {
            return self.title(library, 1);
        }
        let mut out = String::new();
        out.push_str(&self.line("---"));
        out.push_str(&self.paragraph(&format!("title: {}", library)));
        out.push_str(&self.line("language_tabs:"));
        out.push_str(&self.paragraph("  - c"));
        out.push_str(&self.line("toc_footers:"));
        out.push_str(&self.paragraph(
            "  - <a href='https://github.com/slatedocs/slate'>Documentation Powered by Slate</a>",
        ));
        out.push_str(&self.line("includes:"));
        out
    }

    fn render_index(&self, pages: &[&str]) -> String {
        pages
            .iter()
            .map(|page| {
                if self.slate {
                    self.line(&format!("  - {}", page))
                } else {
                    self.line(&format!("* {}", self.link(page, page)))
                }
            })
            .collect()
    }

    fn end_index(&self) -> String {
        if !self.slate {
            return String::new();
        }
        let mut out = String::new();
        out.push_str(&self.line(""));
        out.push_str(&self.line("search: true"));
        out.push_str(&self.line("---"));
        out
    }
}
