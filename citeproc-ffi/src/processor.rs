// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Document state behind one driver: references, clusters and their order.

use std::collections::{HashMap, HashSet};

use citeproc_sys::{ClusterId, ClusterPosition};

use crate::{
    cluster::{Cite, ClusterBuilder},
    error::{FfiError, Result},
    locale::Locale,
    reference::Reference,
    render::{Context, Inline, Locator, OutputFormat, decorate},
    style::{Layout, Style},
};

/// First id handed out by `intern_cluster_id`, clear of small host-chosen ids.
pub(crate) const FIRST_INTERNED_ID: ClusterId = 0x8000_0000;

pub(crate) const NO_PRINTED_FORM: &str = "[CSL STYLE ERROR: reference with no printed form.]";

pub(crate) struct Processor {
    style: Style,
    locale: Locale,
    pub(crate) format: OutputFormat,
    references: HashMap<String, Reference>,
    interned: HashMap<String, ClusterId>,
    next_interned: ClusterId,
    clusters: HashMap<ClusterId, Vec<Cite>>,
    order: Vec<ClusterId>,
}

impl Processor {
    pub(crate) fn new(style: Style, locale: Locale, format: OutputFormat) -> Self {
        Self {
            style,
            locale,
            format,
            references: HashMap::new(),
            interned: HashMap::new(),
            next_interned: FIRST_INTERNED_ID,
            clusters: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub(crate) fn insert_reference(&mut self, reference: Reference) {
        tracing::trace!(id = %reference.id, "inserting reference");
        self.references.insert(reference.id.clone(), reference);
    }

    #[cfg(test)]
    pub(crate) fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub(crate) fn preview_reference(&self, reference: &Reference, format: OutputFormat) -> String {
        let layout = self.style.bibliography.as_ref().unwrap_or(&self.style.citation);
        let inlines = self.render_entry(layout, reference, None);
        if inlines.is_empty() {
            return NO_PRINTED_FORM.to_string();
        }
        format.serialize(&decorate(inlines, &layout.display))
    }

    pub(crate) fn intern_cluster_id(&mut self, name: &str) -> Result<ClusterId> {
        if let Some(id) = self.interned.get(name) {
            return Ok(*id);
        }
        let id = self.next_interned;
        self.next_interned = id
            .checked_add(1)
            .ok_or_else(|| FfiError::Indexing("interned cluster ids exhausted".to_string()))?;
        self.interned.insert(name.to_string(), id);
        Ok(id)
    }

    pub(crate) fn insert_cluster(&mut self, cluster: &ClusterBuilder) {
        tracing::trace!(id = cluster.id, cites = cluster.cites.len(), "inserting cluster");
        self.clusters.insert(cluster.id, cluster.cites.clone());
    }

    /// Replaces the document order. A rejected order leaves the previous one in place.
    pub(crate) fn set_cluster_order(&mut self, positions: &[ClusterPosition]) -> Result<()> {
        let mut seen = HashSet::new();
        let mut last_note = None;
        for position in positions {
            if position.is_preview_marker {
                return Err(FfiError::Reordering(
                    "preview markers cannot be part of the document order".to_string(),
                ));
            }
            if !self.clusters.contains_key(&position.id) {
                return Err(FfiError::Reordering(format!(
                    "cluster {} has not been inserted",
                    position.id
                )));
            }
            if !seen.insert(position.id) {
                return Err(FfiError::Reordering(format!(
                    "cluster {} appears more than once",
                    position.id
                )));
            }
            if position.is_note {
                if let Some(last) = last_note
                    && position.note_number < last
                {
                    return Err(FfiError::Reordering(format!(
                        "note number {} follows note number {last}",
                        position.note_number
                    )));
                }
                last_note = Some(position.note_number);
            }
        }
        self.order = positions.iter().map(|position| position.id).collect();
        Ok(())
    }

    pub(crate) fn format_cluster(&self, id: ClusterId) -> Result<String> {
        if !self.order.contains(&id) {
            return Err(FfiError::ClusterNotInFlow(id));
        }
        let layout = &self.style.citation;
        let cites = self.clusters.get(&id).map(Vec::as_slice).unwrap_or_default();
        let mut inlines = Vec::new();
        for cite in cites {
            let rendered = match self.references.get(&cite.ref_id) {
                Some(reference) => {
                    let locator = cite
                        .locator
                        .as_ref()
                        .map(|(value, term)| Locator { value, term: *term });
                    self.render_entry(layout, reference, locator)
                }
                None => {
                    tracing::debug!(ref_id = %cite.ref_id, "cite refers to an unknown reference");
                    vec![Inline::Text("???".to_string())]
                }
            };
            if rendered.is_empty() {
                continue;
            }
            if !inlines.is_empty() && !layout.delimiter.is_empty() {
                inlines.push(Inline::Text(layout.delimiter.clone()));
            }
            if !cite.prefix.is_empty() {
                inlines.push(Inline::Text(cite.prefix.clone()));
            }
            inlines.extend(rendered);
            if !cite.suffix.is_empty() {
                inlines.push(Inline::Text(cite.suffix.clone()));
            }
        }
        Ok(self.format.serialize(&decorate(inlines, &layout.display)))
    }

    pub(crate) fn format_bibliography(&self) -> String {
        let Some(layout) = &self.style.bibliography else {
            return String::new();
        };
        let mut seen = HashSet::new();
        let mut out = String::new();
        let cited = self
            .order
            .iter()
            .filter_map(|id| self.clusters.get(id))
            .flatten()
            .filter(|cite| seen.insert(cite.ref_id.as_str()));
        for cite in cited {
            let Some(reference) = self.references.get(&cite.ref_id) else {
                continue;
            };
            let inlines = self.render_entry(layout, reference, None);
            out.push_str(&self.format.serialize(&decorate(inlines, &layout.display)));
            out.push('\n');
        }
        out
    }

    fn render_entry(&self, layout: &Layout, reference: &Reference, locator: Option<Locator<'_>>) -> Vec<Inline> {
        Context {
            reference,
            locale: &self.locale,
            locator,
        }
        .render_layout(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLE: &str = r#"<style xmlns="http://purl.org/net/xbiblio/csl" class="note" version="1.0">
  <citation>
    <layout delimiter="; ">
      <group delimiter=", ">
        <text variable="title" form="short"/>
        <group delimiter=" "><label variable="locator" form="short"/><text variable="locator"/></group>
      </group>
    </layout>
  </citation>
  <bibliography>
    <layout><names variable="author" suffix=", "/><text variable="title" font-style="italic"/></layout>
  </bibliography>
</style>"#;

    fn processor() -> Processor {
        let mut processor = Processor::new(Style::parse(STYLE).unwrap(), Locale::built_in(), OutputFormat::Html);
        processor.insert_reference(
            Reference::from_json(
                br#"{"id": "sparrows", "title": "A Flight of Sparrows", "title-short": "Sparrows",
                    "author": [{"given": "John", "family": "Smith"}]}"#,
            )
            .unwrap(),
        );
        processor.insert_reference(Reference::from_json(br#"{"id": "owls", "title": "Owls"}"#).unwrap());
        processor
    }

    fn cluster(id: ClusterId, refs: &[&str]) -> ClusterBuilder {
        ClusterBuilder {
            id,
            cites: refs
                .iter()
                .map(|ref_id| Cite {
                    ref_id: ref_id.to_string(),
                    ..Cite::default()
                })
                .collect(),
        }
    }

    fn in_text(id: ClusterId) -> ClusterPosition {
        ClusterPosition {
            id,
            ..ClusterPosition::default()
        }
    }

    #[test]
    fn interned_ids_are_stable_and_distinct() {
        let mut processor = processor();
        let a = processor.intern_cluster_id("a").unwrap();
        let b = processor.intern_cluster_id("b").unwrap();
        assert_eq!(a, FIRST_INTERNED_ID);
        assert_ne!(a, b);
        assert_eq!(processor.intern_cluster_id("a").unwrap(), a);
    }

    #[test]
    fn formats_cites_with_affixes_and_locators() {
        let mut processor = processor();
        let mut builder = cluster(1, &["sparrows", "missing"]);
        builder.cites[0].prefix = "prefix: ".to_string();
        builder.cites[0].suffix = " :suffix".to_string();
        builder.cites[0].locator = Some(("56".to_string(), "page"));
        processor.insert_cluster(&builder);
        processor.set_cluster_order(&[in_text(1)]).unwrap();
        assert_eq!(
            processor.format_cluster(1).unwrap(),
            "prefix: Sparrows, p. 56 :suffix; ???"
        );
    }

    #[test]
    fn dropped_clusters_are_not_in_flow() {
        let mut processor = processor();
        processor.insert_cluster(&cluster(1, &["sparrows"]));
        processor.insert_cluster(&cluster(2, &["owls"]));
        processor.set_cluster_order(&[in_text(1), in_text(2)]).unwrap();
        assert_eq!(processor.format_cluster(2).unwrap(), "Owls");
        processor.set_cluster_order(&[in_text(1)]).unwrap();
        assert!(matches!(
            processor.format_cluster(2),
            Err(FfiError::ClusterNotInFlow(2))
        ));
    }

    #[test]
    fn invalid_orders_are_rejected_and_keep_the_old_order() {
        let mut processor = processor();
        processor.insert_cluster(&cluster(1, &["sparrows"]));
        processor.insert_cluster(&cluster(2, &["owls"]));
        processor.set_cluster_order(&[in_text(1)]).unwrap();

        let note = |id, note_number| ClusterPosition {
            id,
            is_note: true,
            note_number,
            ..ClusterPosition::default()
        };
        let preview = ClusterPosition {
            is_preview_marker: true,
            ..ClusterPosition::default()
        };
        for order in [
            vec![in_text(1), in_text(1)],
            vec![in_text(3)],
            vec![note(1, 2), note(2, 1)],
            vec![preview],
        ] {
            assert!(matches!(
                processor.set_cluster_order(&order),
                Err(FfiError::Reordering(_))
            ));
        }
        assert!(processor.format_cluster(1).is_ok());
        processor.set_cluster_order(&[note(1, 1), note(2, 1)]).unwrap();
    }

    #[test]
    fn bibliography_lists_cited_references_once() {
        let mut processor = processor();
        processor.insert_cluster(&cluster(1, &["sparrows", "owls"]));
        processor.insert_cluster(&cluster(2, &["sparrows"]));
        processor.set_cluster_order(&[in_text(2), in_text(1)]).unwrap();
        assert_eq!(
            processor.format_bibliography(),
            "John Smith, <i>A Flight of Sparrows</i>\n<i>Owls</i>\n"
        );
    }

    #[test]
    fn preview_does_not_store_the_reference() {
        let processor = processor();
        let reference = Reference::from_json(br#"{"id": "new", "title": "the title"}"#).unwrap();
        assert_eq!(
            processor.preview_reference(&reference, OutputFormat::Rtf),
            "{\\i the title}"
        );
        assert_eq!(processor.reference_count(), 2);

        let empty = Reference::from_json(br#"{"id": "blank"}"#).unwrap();
        assert_eq!(processor.preview_reference(&empty, OutputFormat::Plain), NO_PRINTED_FORM);
    }
}
