//! HTML formatter: page fragments plus a standalone index page.

use crate::model::{Annotation, Flag, ParamType, Parameter};
use crate::render::Formatter;

pub struct HtmlFormatter;

impl HtmlFormatter {
    fn heading(level: usize, name: &str) -> String {
        format!(
            "<h{level} id=\"{}\">{}</h{level}>\n",
            html_escape(name),
            html_escape(name),
            level = level
        )
    }

    fn annotations(annotations: &[Annotation]) -> String {
        annotations
            .iter()
            .map(|a| format!(" <span class=\"tag\">{}</span>", html_escape(&a.label())))
            .collect()
    }

    fn link(text: &str, name: &str) -> String {
        format!(
            "<a href=\"{}.html\">{}</a>",
            html_escape(name),
            html_escape(text)
        )
    }
}

impl Formatter for HtmlFormatter {
    fn file_extension(&self) -> &str {
        "html"
    }

    fn start_namespace(&self, name: &str) -> String {
        Self::heading(1, name)
    }

    fn start_doc_section(&self, name: &str) -> String {
        Self::heading(1, name)
    }

    fn start_class(&self, name: &str) -> String {
        format!("<section class=\"class\">\n{}", Self::heading(2, name))
    }

    fn render_hierarchy(&self, base: &str) -> String {
        format!("<p>Extends: {}</p>\n", base)
    }

    fn end_class(&self) -> String {
        "\n</section>\n".to_string()
    }

    fn start_enum(&self, name: &str) -> String {
        format!("<section class=\"enum\">\n{}", Self::heading(2, name))
    }

    fn end_enum(&self) -> String {
        "\n</section>\n".to_string()
    }

    fn start_members(&self) -> String {
        "<dl>\n".to_string()
    }

    fn render_member(&self, name: &str, doc: &str) -> String {
        format!("  <dt><code>{}</code></dt>\n  <dd>{}</dd>\n", html_escape(name), doc)
    }

    fn end_members(&self) -> String {
        "</dl>\n".to_string()
    }

    fn start_constant(&self, name: &str, value: Option<&str>) -> String {
        let mut out = Self::heading(3, name);
        if let Some(value) = value {
            out.push_str(&format!("<p>Value: <code>{}</code></p>\n", html_escape(value)));
        }
        out
    }

    fn end_constant(&self) -> String {
        "\n".to_string()
    }

    fn start_function(&self, name: &str, params: &[&str]) -> String {
        format!(
            "<h3 id=\"{}\">{} ({})</h3>\n",
            html_escape(name),
            html_escape(name),
            html_escape(&params.join(", "))
        )
    }

    fn end_function(&self) -> String {
        "\n".to_string()
    }

    fn start_virtual_function(&self, name: &str) -> String {
        Self::heading(3, name)
    }

    fn end_virtual_function(&self) -> String {
        "\n".to_string()
    }

    fn start_signal(&self, name: &str) -> String {
        Self::heading(3, name)
    }

    fn end_signal(&self) -> String {
        "\n".to_string()
    }

    fn start_property(&self, name: &str) -> String {
        Self::heading(3, name)
    }

    fn end_property(&self) -> String {
        "\n".to_string()
    }

    fn render_flags(&self, flags: &[Flag]) -> String {
        if flags.is_empty() {
            return String::new();
        }
        let spans: Vec<_> = flags
            .iter()
            .map(|f| format!("<span class=\"tag\">{}</span>", f.label()))
            .collect();
        format!("<p class=\"flags\">{}</p>\n", spans.join(" "))
    }

    fn start_parameters(&self) -> String {
        "<dl>\n".to_string()
    }

    fn end_parameters(&self) -> String {
        "</dl>\n".to_string()
    }

    fn start_parameter(&self, name: &str, ty: Option<&str>, annotations: &[Annotation]) -> String {
        let ty = ty.map(|ty| format!(" ({})", ty)).unwrap_or_default();
        format!(
            "  <dt><code>{}</code>{}{}</dt>\n  <dd>",
            html_escape(name),
            ty,
            Self::annotations(annotations)
        )
    }

    fn end_parameter(&self) -> String {
        "</dd>\n".to_string()
    }

    fn render_return_value(&self, ty: &str, annotations: &[Annotation], doc: &str) -> String {
        let doc = if doc.is_empty() {
            String::new()
        } else {
            format!(": {}", doc)
        };
        format!(
            "<p class=\"returns\">Returns ({}){}{}</p>\n",
            ty,
            Self::annotations(annotations),
            doc
        )
    }

    fn render_section(&self, title: &str) -> String {
        format!("<h2>{}</h2>\n", html_escape(title))
    }

    fn render_other(&self, text: &str) -> String {
        html_escape(text)
    }

    fn render_type_name(&self, name: &str) -> String {
        Self::link(name, name)
    }

    fn render_property(&self, name: &str) -> String {
        Self::link(name, name)
    }

    fn render_signal(&self, name: &str) -> String {
        Self::link(name, name)
    }

    fn render_enum_value(&self, member: &str, enum_name: &str) -> String {
        format!("<code>{}</code>", Self::link(member, enum_name))
    }

    fn render_parameter(&self, param: &Parameter) -> String {
        match param.ty {
            ParamType::Variadic => "<em>...</em>".to_string(),
            ParamType::Named(_) => format!("<em>{}</em>", html_escape(&param.argname)),
        }
    }

    fn render_function_call(&self, name: &str) -> String {
        format!("<code>{}()</code>", Self::link(name, name))
    }

    fn render_code_start(&self) -> String {
        "<pre><code>".to_string()
    }

    fn render_code_start_with_language(&self, language: &str) -> String {
        format!("<pre><code class=\"language-{}\">", html_escape(language))
    }

    fn render_code_end(&self) -> String {
        "</code></pre>\n".to_string()
    }

    // Bare <br> so line structure survives inside <pre> as well.
    fn render_new_line(&self) -> String {
        "<br>".to_string()
    }

    fn render_new_paragraph(&self) -> String {
        "<br><br>".to_string()
    }

    fn render_note(&self, note: &str) -> String {
        format!("<blockquote>{}</blockquote>\n", html_escape(note))
    }

    fn render_heading(&self, title: &str, level: usize) -> String {
        let level = level.clamp(1, 6);
        format!("<h{level}>{}</h{level}>", html_escape(title), level = level)
    }

    fn start_index(&self, library: &str) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        out.push_str("<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{}</title>\n", html_escape(library)));
        out.push_str("<style>\n");
        out.push_str("body { font-family: system-ui, sans-serif; max-width: 48em; margin: 2em auto; padding: 0 1em; }\n");
        out.push_str("code { background: #f4f4f4; padding: 0.15em 0.3em; border-radius: 3px; }\n");
        out.push_str("pre { background: #f4f4f4; padding: 1em; border-radius: 5px; overflow-x: auto; }\n");
        out.push_str("dt { font-weight: bold; margin-top: 0.5em; }\n");
        out.push_str("dd { margin-left: 1.5em; }\n");
        out.push_str(".tag { display: inline-block; font-size: 0.75em; padding: 0.1em 0.4em; border-radius: 3px; background: #e8e8e8; }\n");
        out.push_str("</style>\n");
        out.push_str("</head>\n<body>\n");
        out.push_str(&format!("<h1>{}</h1>\n<ul>\n", html_escape(library)));
        out
    }

    fn render_index(&self, pages: &[&str]) -> String {
        pages
            .iter()
            .map(|page| format!("  <li>{}</li>\n", Self::link(page, page)))
            .collect()
    }

    fn end_index(&self) -> String {
        "</ul>\n</body>\n</html>\n".to_string()
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_text() {
        assert_eq!(
            HtmlFormatter.render_other("a < b && \"c\""),
            "a &lt; b &amp;&amp; &quot;c&quot;"
        );
    }

    #[test]
    fn links_point_at_pages() {
        assert_eq!(
            HtmlFormatter.render_type_name("Gtk.Button"),
            "<a href=\"Gtk.Button.html\">Gtk.Button</a>"
        );
    }

    #[test]
    fn parameters_carry_type_and_annotations() {
        let f = HtmlFormatter;
        assert_eq!(
            f.start_parameter("n", Some("guint"), &[Annotation::Out]),
            "  <dt><code>n</code> (guint) <span class=\"tag\">out</span></dt>\n  <dd>"
        );
        assert_eq!(
            f.render_return_value("utf8", &[Annotation::Nullable], "A &lt;name&gt;"),
            "<p class=\"returns\">Returns (utf8) <span class=\"tag\">nullable</span>: A &lt;name&gt;</p>\n"
        );
    }

    #[test]
    fn enum_members_are_listed() {
        let f = HtmlFormatter;
        assert!(f.start_enum("Gtk.Align").contains("<h2 id=\"Gtk.Align\">Gtk.Align</h2>"));
        assert_eq!(
            f.render_member("GTK_ALIGN_FILL", "Fill."),
            "  <dt><code>GTK_ALIGN_FILL</code></dt>\n  <dd>Fill.</dd>\n"
        );
    }

    #[test]
    fn heading_level_is_clamped() {
        assert_eq!(HtmlFormatter.render_heading("Deep", 9), "<h6>Deep</h6>");
    }

    #[test]
    fn index_is_a_full_document() {
        let f = HtmlFormatter;
        let out = format!(
            "{}{}{}",
            f.start_index("Gtk"),
            f.render_index(&["Gtk.Button"]),
            f.end_index()
        );
        assert!(out.starts_with("<!DOCTYPE html>"));
        assert!(out.contains("<li><a href=\"Gtk.Button.html\">Gtk.Button</a></li>"));
        assert!(out.ends_with("</html>\n"));
    }
}
