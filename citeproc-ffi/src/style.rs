// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! The subset of CSL style XML the engine understands.
//!
//! Macros are expanded while parsing, so the rendering side only ever sees
//! [`Element`] trees. Every validation error carries the byte range of the
//! offending node.

use std::{collections::HashMap, ops::Range};

use crate::{
    error::{FfiError, Result},
    locale::Locale,
};

/// Affixes and font styling shared by every rendering element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Display {
    pub prefix: String,
    pub suffix: String,
    pub italic: bool,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TextSource {
    Variable { name: String, short: bool },
    Value(String),
    Term { name: String, form: String, plural: bool },
    Macro(Vec<Element>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NameAnd {
    None,
    Text,
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Element {
    Text {
        source: TextSource,
        display: Display,
    },
    Group {
        delimiter: String,
        children: Vec<Element>,
        display: Display,
    },
    Label {
        variable: String,
        form: String,
        display: Display,
    },
    Names {
        variables: Vec<String>,
        delimiter: String,
        and: NameAnd,
        display: Display,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    pub delimiter: String,
    pub display: Display,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone)]
pub(crate) struct Style {
    pub default_locale: Option<String>,
    pub citation: Layout,
    pub bibliography: Option<Layout>,
    /// Inline `<locale>` blocks, untagged ones first.
    pub locales: Vec<Locale>,
}

fn invalid(range: Range<usize>, message: impl std::fmt::Display) -> FfiError {
    FfiError::InvalidStyle(format!(
        "invalid style: bytes {}..{} [Error] {}",
        range.start, range.end, message
    ))
}

/// Byte offset of a 1-based row / column position.
fn byte_offset(text: &str, row: u32, col: u32) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(row.saturating_sub(1) as usize)
        .map(str::len)
        .sum();
    let column = text[line_start..]
        .char_indices()
        .nth(col.saturating_sub(1) as usize)
        .map_or(text.len() - line_start, |(offset, _)| offset);
    line_start + column
}

impl Style {
    pub(crate) fn parse(text: &str) -> Result<Self> {
        let document = roxmltree::Document::parse(text).map_err(|err| {
            let pos = err.pos();
            let offset = byte_offset(text, pos.row, pos.col);
            invalid(offset..offset, err)
        })?;
        let root = document.root_element();
        if !root.has_tag_name("style") {
            return Err(invalid(root.range(), "Root element must be <style>"));
        }

        let mut macros = HashMap::new();
        for node in root.children().filter(|node| node.has_tag_name("macro")) {
            let name = node
                .attribute("name")
                .ok_or_else(|| invalid(node.range(), "<macro> requires a name"))?;
            if macros.insert(name, node).is_some() {
                return Err(invalid(node.range(), format!("Duplicate macro `{name}`")));
            }
        }
        let parser = Parser { macros };

        let citations: Vec<_> = root
            .children()
            .filter(|node| node.has_tag_name("citation"))
            .collect();
        let [citation] = citations.as_slice() else {
            return Err(invalid(root.range(), "Must have exactly one <citation>"));
        };
        let citation = parser.layout_of(*citation)?;

        let mut bibliography = None;
        for node in root.children().filter(|node| node.has_tag_name("bibliography")) {
            if bibliography.is_some() {
                return Err(invalid(node.range(), "Must have at most one <bibliography>"));
            }
            bibliography = Some(parser.layout_of(node)?);
        }

        let mut locales: Vec<Locale> = root
            .children()
            .filter(|node| node.has_tag_name("locale"))
            .map(Locale::from_node)
            .collect();
        locales.sort_by_key(|locale| locale.lang.is_some());

        Ok(Style {
            default_locale: root.attribute("default-locale").map(str::to_string),
            citation,
            bibliography,
            locales,
        })
    }
}

struct Parser<'a, 'input> {
    macros: HashMap<&'a str, roxmltree::Node<'a, 'input>>,
}

impl<'a, 'input> Parser<'a, 'input> {
    fn layout_of(&self, parent: roxmltree::Node<'a, 'input>) -> Result<Layout> {
        let layouts: Vec<_> = parent
            .children()
            .filter(|node| node.has_tag_name("layout"))
            .collect();
        let [layout] = layouts.as_slice() else {
            return Err(invalid(
                parent.range(),
                format!("<{}> must have exactly one <layout>", parent.tag_name().name()),
            ));
        };
        Ok(Layout {
            delimiter: layout.attribute("delimiter").unwrap_or_default().to_string(),
            display: display_of(*layout),
            elements: self.children_of(*layout, &mut Vec::new())?,
        })
    }

    fn children_of(
        &self,
        parent: roxmltree::Node<'a, 'input>,
        stack: &mut Vec<&'a str>,
    ) -> Result<Vec<Element>> {
        parent
            .children()
            .filter(roxmltree::Node::is_element)
            .map(|node| self.element(node, stack))
            .collect()
    }

    fn element(&self, node: roxmltree::Node<'a, 'input>, stack: &mut Vec<&'a str>) -> Result<Element> {
        let display = display_of(node);
        match node.tag_name().name() {
            "text" => Ok(Element::Text {
                source: self.text_source(node, stack)?,
                display,
            }),
            "group" => Ok(Element::Group {
                delimiter: node.attribute("delimiter").unwrap_or_default().to_string(),
                children: self.children_of(node, stack)?,
                display,
            }),
            "label" => Ok(Element::Label {
                variable: node
                    .attribute("variable")
                    .ok_or_else(|| invalid(node.range(), "<label> requires a variable"))?
                    .to_string(),
                form: node.attribute("form").unwrap_or("long").to_string(),
                display,
            }),
            "names" => {
                let variables: Vec<String> = node
                    .attribute("variable")
                    .unwrap_or_default()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                if variables.is_empty() {
                    return Err(invalid(node.range(), "<names> requires a variable"));
                }
                let name = node.children().find(|child| child.has_tag_name("name"));
                let and = match name.and_then(|name| name.attribute("and")) {
                    Some("text") => NameAnd::Text,
                    Some("symbol") => NameAnd::Symbol,
                    _ => NameAnd::None,
                };
                Ok(Element::Names {
                    variables,
                    delimiter: name
                        .and_then(|name| name.attribute("delimiter"))
                        .unwrap_or(", ")
                        .to_string(),
                    and,
                    display,
                })
            }
            other => Err(invalid(node.range(), format!("Unsupported element <{other}>"))),
        }
    }

    fn text_source(&self, node: roxmltree::Node<'a, 'input>, stack: &mut Vec<&'a str>) -> Result<TextSource> {
        let form = node.attribute("form").unwrap_or("long");
        if let Some(name) = node.attribute("variable") {
            return Ok(TextSource::Variable {
                name: name.to_string(),
                short: form == "short",
            });
        }
        if let Some(value) = node.attribute("value") {
            return Ok(TextSource::Value(value.to_string()));
        }
        if let Some(name) = node.attribute("term") {
            return Ok(TextSource::Term {
                name: name.to_string(),
                form: form.to_string(),
                plural: node.attribute("plural") == Some("true"),
            });
        }
        if let Some(name) = node.attribute("macro") {
            let Some((&name, definition)) = self.macros.get_key_value(name) else {
                return Err(invalid(node.range(), format!("Undefined macro `{name}`")));
            };
            if stack.contains(&name) {
                return Err(invalid(node.range(), format!("Macro `{name}` calls itself")));
            }
            stack.push(name);
            let children = self.children_of(*definition, stack);
            stack.pop();
            return Ok(TextSource::Macro(children?));
        }
        Err(invalid(
            node.range(),
            "<text> requires one of variable, value, term or macro",
        ))
    }
}

fn display_of(node: roxmltree::Node<'_, '_>) -> Display {
    Display {
        prefix: node.attribute("prefix").unwrap_or_default().to_string(),
        suffix: node.attribute("suffix").unwrap_or_default().to_string(),
        italic: node.attribute("font-style") == Some("italic"),
        bold: node.attribute("font-weight") == Some("bold"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style_error(xml: &str) -> String {
        match Style::parse(xml) {
            Err(FfiError::InvalidStyle(message)) => message,
            other => panic!("expected a style error, got {other:?}"),
        }
    }

    #[test]
    fn parses_layouts_and_macros() {
        let style = Style::parse(
            r#"<style xmlns="http://purl.org/net/xbiblio/csl" class="note" version="1.0" default-locale="de-AT">
  <macro name="title"><text variable="title" font-style="italic"/></macro>
  <citation><layout delimiter="; "><text macro="title"/></layout></citation>
  <bibliography><layout suffix="."><text variable="title"/></layout></bibliography>
</style>"#,
        )
        .unwrap();
        assert_eq!(style.default_locale.as_deref(), Some("de-AT"));
        assert_eq!(style.citation.delimiter, "; ");
        let Element::Text {
            source: TextSource::Macro(expanded),
            ..
        } = &style.citation.elements[0]
        else {
            panic!("expected an expanded macro");
        };
        assert!(matches!(
            &expanded[0],
            Element::Text { display: Display { italic: true, .. }, .. }
        ));
        assert_eq!(style.bibliography.unwrap().display.suffix, ".");
    }

    #[test]
    fn missing_citation_is_reported_with_a_range() {
        let xml = r#"<style xmlns="http://purl.org/net/xbiblio/csl" class="note" version="1.0"></style>"#;
        assert_eq!(
            style_error(xml),
            format!("invalid style: bytes 0..{} [Error] Must have exactly one <citation>", xml.len())
        );
    }

    #[test]
    fn unknown_layout_elements_are_rejected() {
        let message = style_error(
            r#"<style><citation><layout><choose/></layout></citation></style>"#,
        );
        assert_eq!(message, "invalid style: bytes 25..34 [Error] Unsupported element <choose>");
    }

    #[test]
    fn recursive_and_undefined_macros_are_rejected() {
        let recursive = style_error(
            r#"<style><macro name="a"><text macro="a"/></macro><citation><layout><text macro="a"/></layout></citation></style>"#,
        );
        assert!(recursive.ends_with("Macro `a` calls itself"), "{recursive}");

        let undefined = style_error(
            r#"<style><citation><layout><text macro="nope"/></layout></citation></style>"#,
        );
        assert!(undefined.ends_with("Undefined macro `nope`"), "{undefined}");
    }

    #[test]
    fn malformed_xml_reports_an_offset() {
        let message = style_error("<style>\n  <citation>\n</style>");
        assert!(message.starts_with("invalid style: bytes "), "{message}");
    }

    #[test]
    fn wrong_root_is_rejected() {
        let message = style_error("<locale/>");
        assert_eq!(message, "invalid style: bytes 0..9 [Error] Root element must be <style>");
    }

    #[test]
    fn byte_offsets_count_characters_per_line() {
        assert_eq!(byte_offset("ab\ncd", 2, 2), 4);
        assert_eq!(byte_offset("é\nx", 1, 2), 2);
    }
}
