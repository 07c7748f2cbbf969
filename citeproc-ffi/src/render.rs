// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Evaluation of layout elements and serialisation to the output formats.

use std::fmt::Write as _;

use crate::{
    error::{FfiError, Result},
    locale::Locale,
    reference::Reference,
    style::{Display, Element, Layout, NameAnd, TextSource},
};

/// Intermediate rich text, independent of the output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Inline {
    Text(String),
    Styled {
        italic: bool,
        bold: bool,
        children: Vec<Inline>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Html,
    Rtf,
    Plain,
}

impl OutputFormat {
    pub(crate) fn from_raw(raw: citeproc_sys::OutputFormat) -> Result<Self> {
        match raw {
            citeproc_sys::CR_OUTPUT_FORMAT_HTML => Ok(Self::Html),
            citeproc_sys::CR_OUTPUT_FORMAT_RTF => Ok(Self::Rtf),
            citeproc_sys::CR_OUTPUT_FORMAT_PLAIN => Ok(Self::Plain),
            other => Err(FfiError::Indexing(format!("{other} is not an output format"))),
        }
    }

    pub(crate) fn serialize(self, inlines: &[Inline]) -> String {
        let mut out = String::new();
        for inline in inlines {
            self.write_inline(&mut out, inline);
        }
        out
    }

    fn write_inline(self, out: &mut String, inline: &Inline) {
        match inline {
            Inline::Text(text) => self.write_escaped(out, text),
            Inline::Styled {
                italic,
                bold,
                children,
            } => {
                let (open, close) = match (self, italic, bold) {
                    (Self::Plain, ..) | (_, false, false) => ("", ""),
                    (Self::Html, true, false) => ("<i>", "</i>"),
                    (Self::Html, false, true) => ("<b>", "</b>"),
                    (Self::Html, true, true) => ("<i><b>", "</b></i>"),
                    (Self::Rtf, true, false) => ("{\\i ", "}"),
                    (Self::Rtf, false, true) => ("{\\b ", "}"),
                    (Self::Rtf, true, true) => ("{\\i\\b ", "}"),
                };
                out.push_str(open);
                for child in children {
                    self.write_inline(out, child);
                }
                out.push_str(close);
            }
        }
    }

    fn write_escaped(self, out: &mut String, text: &str) {
        match self {
            Self::Plain => out.push_str(text),
            Self::Html => {
                for ch in text.chars() {
                    match ch {
                        '&' => out.push_str("&amp;"),
                        '<' => out.push_str("&lt;"),
                        '>' => out.push_str("&gt;"),
                        _ => out.push(ch),
                    }
                }
            }
            Self::Rtf => {
                for ch in text.chars() {
                    match ch {
                        '\\' | '{' | '}' => {
                            out.push('\\');
                            out.push(ch);
                        }
                        '\t' => out.push_str("\\tab "),
                        '\n' => out.push_str("\\line "),
                        ch if ch.is_ascii() => out.push(ch),
                        ch => {
                            let mut units = [0u16; 2];
                            for unit in ch.encode_utf16(&mut units) {
                                let _ = write!(out, "\\u{}?", *unit as i16);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// The locator attached to the cite being rendered.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Locator<'a> {
    pub value: &'a str,
    pub term: &'static str,
}

pub(crate) struct Context<'a> {
    pub reference: &'a Reference,
    pub locale: &'a Locale,
    pub locator: Option<Locator<'a>>,
}

/// Output of one element, with the variable bookkeeping groups need.
#[derive(Default)]
struct Rendered {
    inlines: Vec<Inline>,
    called: usize,
    rendered: usize,
}

impl Context<'_> {
    /// Renders the children of a layout, concatenated, without the layout's own display.
    pub(crate) fn render_layout(&self, layout: &Layout) -> Vec<Inline> {
        self.render_all(&layout.elements, "").inlines
    }

    fn render_all(&self, elements: &[Element], delimiter: &str) -> Rendered {
        let mut out = Rendered::default();
        for element in elements {
            let part = self.render(element);
            out.called += part.called;
            out.rendered += part.rendered;
            if part.inlines.is_empty() {
                continue;
            }
            if !out.inlines.is_empty() && !delimiter.is_empty() {
                out.inlines.push(Inline::Text(delimiter.to_string()));
            }
            out.inlines.extend(part.inlines);
        }
        out
    }

    fn render(&self, element: &Element) -> Rendered {
        match element {
            Element::Text { source, display } => {
                let mut out = match source {
                    TextSource::Variable { name, short } => {
                        let value = self.variable(name, *short);
                        Rendered {
                            rendered: value.is_some() as usize,
                            inlines: value.map(Inline::Text).into_iter().collect(),
                            called: 1,
                        }
                    }
                    TextSource::Value(value) => text(value),
                    TextSource::Term { name, form, plural } => {
                        text(self.locale.term(name, form, *plural).unwrap_or_default())
                    }
                    TextSource::Macro(children) => self.render_all(children, ""),
                };
                out.inlines = decorate(out.inlines, display);
                out
            }
            Element::Group {
                delimiter,
                children,
                display,
            } => {
                let mut out = self.render_all(children, delimiter);
                if out.called > 0 && out.rendered == 0 {
                    out.inlines.clear();
                }
                out.inlines = decorate(out.inlines, display);
                out
            }
            Element::Label {
                variable,
                form,
                display,
            } => {
                let label = if variable == "locator" {
                    self.locator
                        .and_then(|locator| self.locale.term(locator.term, form, is_plural(locator.value)))
                } else {
                    self.reference
                        .text(variable, false)
                        .and_then(|value| self.locale.term(variable, form, is_plural(&value)))
                };
                let mut out = text(label.unwrap_or_default());
                out.inlines = decorate(out.inlines, display);
                out
            }
            Element::Names {
                variables,
                delimiter,
                and,
                display,
            } => {
                let names = variables
                    .iter()
                    .map(|variable| self.reference.names(variable))
                    .find(|names| !names.is_empty())
                    .unwrap_or_default();
                let joined = self.join_names(&names, delimiter, and);
                Rendered {
                    rendered: !joined.is_empty() as usize,
                    inlines: decorate(text(&joined).inlines, display),
                    called: 1,
                }
            }
        }
    }

    fn variable(&self, name: &str, short: bool) -> Option<String> {
        if name == "locator" {
            return self.locator.map(|locator| locator.value.to_string());
        }
        self.reference.text(name, short)
    }

    fn join_names(&self, names: &[String], delimiter: &str, and: &NameAnd) -> String {
        let connector = match and {
            NameAnd::None => None,
            NameAnd::Text => Some(self.locale.term("and", "long", false).unwrap_or("and")),
            NameAnd::Symbol => Some("&"),
        };
        match (names, connector) {
            ([], _) => String::new(),
            ([only], _) => only.clone(),
            ([first, second], Some(connector)) => format!("{first} {connector} {second}"),
            ([init @ .., last], Some(connector)) => {
                format!("{}{delimiter}{connector} {last}", init.join(delimiter))
            }
            (names, None) => names.join(delimiter),
        }
    }
}

fn text(value: &str) -> Rendered {
    Rendered {
        inlines: if value.is_empty() {
            Vec::new()
        } else {
            vec![Inline::Text(value.to_string())]
        },
        ..Rendered::default()
    }
}

fn is_plural(value: &str) -> bool {
    value.contains(['-', '–', ',', '&'])
}

/// Wraps non-empty output in the element's styling and affixes.
pub(crate) fn decorate(inlines: Vec<Inline>, display: &Display) -> Vec<Inline> {
    if inlines.is_empty() {
        return inlines;
    }
    let mut out = Vec::with_capacity(3);
    if !display.prefix.is_empty() {
        out.push(Inline::Text(display.prefix.clone()));
    }
    if display.italic || display.bold {
        out.push(Inline::Styled {
            italic: display.italic,
            bold: display.bold,
            children: inlines,
        });
    } else {
        out.extend(inlines);
    }
    if !display.suffix.is_empty() {
        out.push(Inline::Text(display.suffix.clone()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Style;

    fn reference() -> Reference {
        Reference::from_json(
            br#"{"id": "a", "title": "A & B", "page": "3-5",
                "author": [{"given": "Ann", "family": "Ode"}, {"given": "Bo", "family": "Li"}, {"literal": "Cy"}]}"#,
        )
        .unwrap()
    }

    fn render_citation(layout: &str, locator: Option<Locator<'_>>, format: OutputFormat) -> String {
        let style = Style::parse(&format!("<style><citation><layout>{layout}</layout></citation></style>")).unwrap();
        let reference = reference();
        let locale = Locale::built_in();
        let context = Context {
            reference: &reference,
            locale: &locale,
            locator,
        };
        format.serialize(&context.render_layout(&style.citation))
    }

    #[test]
    fn formats_escape_their_specials() {
        let layout = r#"<text variable="title" font-style="italic"/>"#;
        assert_eq!(render_citation(layout, None, OutputFormat::Plain), "A & B");
        assert_eq!(render_citation(layout, None, OutputFormat::Html), "<i>A &amp; B</i>");
        assert_eq!(render_citation(layout, None, OutputFormat::Rtf), "{\\i A & B}");
    }

    #[test]
    fn rtf_encodes_non_ascii_as_unicode_escapes() {
        let inlines = vec![Inline::Text("é{𝄞}".to_string())];
        assert_eq!(
            OutputFormat::Rtf.serialize(&inlines),
            "\\u233?\\{\\u-10188?\\u-8930?\\}"
        );
    }

    #[test]
    fn groups_vanish_when_their_variables_are_empty() {
        let layout = r#"<group delimiter=" "><text value="vol."/><text variable="volume"/></group><group prefix="[" suffix="]"><text value="x"/></group>"#;
        assert_eq!(render_citation(layout, None, OutputFormat::Plain), "[x]");
    }

    #[test]
    fn locator_labels_pluralise() {
        let layout = r#"<group delimiter=" "><label variable="locator" form="short"/><text variable="locator"/></group>"#;
        let single = Some(Locator { value: "56", term: "page" });
        let range = Some(Locator { value: "56–60", term: "page" });
        assert_eq!(render_citation(layout, single, OutputFormat::Plain), "p. 56");
        assert_eq!(render_citation(layout, range, OutputFormat::Plain), "pp. 56–60");
        assert_eq!(render_citation(layout, None, OutputFormat::Plain), "");
    }

    #[test]
    fn numeric_variable_labels() {
        let layout = r#"<label variable="page" form="short" suffix=" "/><text variable="page"/>"#;
        assert_eq!(render_citation(layout, None, OutputFormat::Plain), "pp. 3-5");
    }

    #[test]
    fn names_join_with_the_and_term() {
        assert_eq!(
            render_citation(r#"<names variable="editor author"/>"#, None, OutputFormat::Plain),
            "Ann Ode, Bo Li, Cy"
        );
        assert_eq!(
            render_citation(
                r#"<names variable="author"><name and="text" delimiter=", "/></names>"#,
                None,
                OutputFormat::Plain
            ),
            "Ann Ode, Bo Li, and Cy"
        );
    }
}
