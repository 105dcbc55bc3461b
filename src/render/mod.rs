//! Output formats: trait-based dispatch.
//!
//! A formatter only supplies the markup around and inside pages; walking the
//! tree and resolving references happens in [`crate::pages`]. Every hook has
//! an empty default, so a format implements only what it emits.

pub mod html;
pub mod markdown;

use crate::model::{Annotation, Flag, Parameter};
use anyhow::{anyhow, Result};

#[allow(unused_variables)]
pub trait Formatter {
    fn file_extension(&self) -> &str;

    // -- page structure --

    fn start_namespace(&self, name: &str) -> String {
        String::new()
    }
    fn end_namespace(&self) -> String {
        String::new()
    }
    fn start_doc_section(&self, name: &str) -> String {
        String::new()
    }
    fn end_doc_section(&self) -> String {
        String::new()
    }
    fn start_class(&self, name: &str) -> String {
        String::new()
    }
    /// `base` is already rendered (link or literal text).
    fn render_hierarchy(&self, base: &str) -> String {
        String::new()
    }
    fn end_class(&self) -> String {
        String::new()
    }
    fn start_enum(&self, name: &str) -> String {
        String::new()
    }
    fn end_enum(&self) -> String {
        String::new()
    }
    fn start_members(&self) -> String {
        String::new()
    }
    /// `doc` is already rendered.
    fn render_member(&self, name: &str, doc: &str) -> String {
        String::new()
    }
    fn end_members(&self) -> String {
        String::new()
    }
    fn start_constant(&self, name: &str, value: Option<&str>) -> String {
        String::new()
    }
    fn end_constant(&self) -> String {
        String::new()
    }
    fn start_function(&self, name: &str, params: &[&str]) -> String {
        String::new()
    }
    fn end_function(&self) -> String {
        String::new()
    }
    fn start_virtual_function(&self, name: &str) -> String {
        String::new()
    }
    fn end_virtual_function(&self) -> String {
        String::new()
    }
    fn start_signal(&self, name: &str) -> String {
        String::new()
    }
    fn end_signal(&self) -> String {
        String::new()
    }
    fn start_property(&self, name: &str) -> String {
        String::new()
    }
    fn end_property(&self) -> String {
        String::new()
    }
    fn render_flags(&self, flags: &[Flag]) -> String {
        String::new()
    }
    fn start_parameters(&self) -> String {
        String::new()
    }
    fn end_parameters(&self) -> String {
        String::new()
    }
    /// `ty` is already rendered; variadic parameters have none.
    fn start_parameter(&self, name: &str, ty: Option<&str>, annotations: &[Annotation]) -> String {
        String::new()
    }
    fn end_parameter(&self) -> String {
        String::new()
    }
    /// `ty` and `doc` are already rendered.
    fn render_return_value(&self, ty: &str, annotations: &[Annotation], doc: &str) -> String {
        String::new()
    }
    /// Label placed before a group of merged class members.
    fn render_section(&self, title: &str) -> String {
        String::new()
    }

    // -- doc string tokens --

    fn render_other(&self, text: &str) -> String {
        String::new()
    }
    fn render_type_name(&self, name: &str) -> String {
        String::new()
    }
    fn render_property(&self, name: &str) -> String {
        String::new()
    }
    fn render_signal(&self, name: &str) -> String {
        String::new()
    }
    fn render_enum_value(&self, member: &str, enum_name: &str) -> String {
        String::new()
    }
    fn render_parameter(&self, param: &Parameter) -> String {
        String::new()
    }
    fn render_function_call(&self, name: &str) -> String {
        String::new()
    }
    fn render_code_start(&self) -> String {
        String::new()
    }
    fn render_code_start_with_language(&self, language: &str) -> String {
        String::new()
    }
    fn render_code_end(&self) -> String {
        String::new()
    }
    fn render_new_line(&self) -> String {
        String::new()
    }
    fn render_new_paragraph(&self) -> String {
        String::new()
    }
    fn render_note(&self, note: &str) -> String {
        String::new()
    }
    fn render_heading(&self, title: &str, level: usize) -> String {
        String::new()
    }

    // -- index --

    fn start_index(&self, library: &str) -> String {
        String::new()
    }
    /// `pages` are page names in section order.
    fn render_index(&self, pages: &[&str]) -> String {
        String::new()
    }
    fn end_index(&self) -> String {
        String::new()
    }
}

/// Create a formatter for the given format name.
pub fn create_formatter(format: &str) -> Result<Box<dyn Formatter>> {
    match format {
        "slate" => Ok(Box::new(markdown::MarkdownFormatter::slate())),
        "markdown" | "md" => Ok(Box::new(markdown::MarkdownFormatter::plain())),
        "html" => Ok(Box::new(html::HtmlFormatter)),
        _ => Err(anyhow!(
            "unknown format: {}. Use slate, markdown, or html",
            format
        )),
    }
}
