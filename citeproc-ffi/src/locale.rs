// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Locale terms, the fallback chain, and the write-once slot handed to the host.
//!
//! `en-US` terms are built in. Any other locale the style needs is requested
//! from the host's fetch callback, once per tag in the fallback chain, and
//! merged over the built-in terms with more specific locales taking priority.

use std::{
    collections::HashMap,
    ffi::CString,
    os::raw::{c_char, c_void},
};

use citeproc_sys::{ErrorCode, LocaleFetchCallback};

use crate::{
    args,
    error::{FfiError, Result, code_boundary},
};

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// The singular and plural text of one term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Term {
    pub single: String,
    pub multiple: String,
}

/// A set of terms keyed by `(name, form)`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Locale {
    pub lang: Option<String>,
    terms: HashMap<(String, String), Term>,
}

const EN_US_TERMS: &[(&str, &str, &str, &str)] = &[
    ("and", "long", "and", "and"),
    ("and", "symbol", "&", "&"),
    ("et-al", "long", "et al.", "et al."),
    ("no date", "long", "no date", "no date"),
    ("no date", "short", "n.d.", "n.d."),
    ("in", "long", "in", "in"),
    ("accessed", "long", "accessed", "accessed"),
    ("retrieved", "long", "retrieved", "retrieved"),
    ("anonymous", "long", "anonymous", "anonymous"),
    ("book", "long", "book", "books"),
    ("book", "short", "bk.", "bks."),
    ("chapter", "long", "chapter", "chapters"),
    ("chapter", "short", "chap.", "chaps."),
    ("column", "long", "column", "columns"),
    ("column", "short", "col.", "cols."),
    ("figure", "long", "figure", "figures"),
    ("figure", "short", "fig.", "figs."),
    ("folio", "long", "folio", "folios"),
    ("folio", "short", "fol.", "fols."),
    ("issue", "long", "number", "numbers"),
    ("issue", "short", "no.", "nos."),
    ("line", "long", "line", "lines"),
    ("line", "short", "l.", "ll."),
    ("note", "long", "note", "notes"),
    ("note", "short", "n.", "nn."),
    ("opus", "long", "opus", "opera"),
    ("opus", "short", "op.", "opp."),
    ("page", "long", "page", "pages"),
    ("page", "short", "p.", "pp."),
    ("paragraph", "long", "paragraph", "paragraphs"),
    ("paragraph", "short", "para.", "paras."),
    ("part", "long", "part", "parts"),
    ("part", "short", "pt.", "pts."),
    ("section", "long", "section", "sections"),
    ("section", "short", "sec.", "secs."),
    ("section", "symbol", "§", "§§"),
    ("sub-verbo", "long", "sub verbo", "sub verbis"),
    ("sub-verbo", "short", "s.v.", "s.vv."),
    ("verse", "long", "verse", "verses"),
    ("verse", "short", "v.", "vv."),
    ("volume", "long", "volume", "volumes"),
    ("volume", "short", "vol.", "vols."),
    ("act", "long", "act", "acts"),
    ("appendix", "long", "appendix", "appendices"),
    ("article-locator", "long", "article", "articles"),
    ("canon", "long", "canon", "canons"),
    ("elocation", "long", "location", "locations"),
    ("equation", "long", "equation", "equations"),
    ("rule", "long", "rule", "rules"),
    ("scene", "long", "scene", "scenes"),
    ("supplement", "long", "supplement", "supplements"),
    ("table", "long", "table", "tables"),
    ("timestamp", "long", "timestamp", "timestamps"),
    ("title-locator", "long", "title", "titles"),
    ("editor", "long", "editor", "editors"),
    ("editor", "short", "ed.", "eds."),
    ("translator", "long", "translator", "translators"),
    ("translator", "short", "tran.", "trans."),
];

/// The dialect a bare language resolves to when no region is given.
const PRIMARY_DIALECTS: &[(&str, &str)] = &[
    ("af", "af-ZA"),
    ("ar", "ar"),
    ("bg", "bg-BG"),
    ("ca", "ca-AD"),
    ("cs", "cs-CZ"),
    ("cy", "cy-GB"),
    ("da", "da-DK"),
    ("de", "de-DE"),
    ("el", "el-GR"),
    ("en", "en-US"),
    ("es", "es-ES"),
    ("et", "et-EE"),
    ("eu", "eu"),
    ("fa", "fa-IR"),
    ("fi", "fi-FI"),
    ("fr", "fr-FR"),
    ("he", "he-IL"),
    ("hr", "hr-HR"),
    ("hu", "hu-HU"),
    ("id", "id-ID"),
    ("is", "is-IS"),
    ("it", "it-IT"),
    ("ja", "ja-JP"),
    ("km", "km-KH"),
    ("ko", "ko-KR"),
    ("lt", "lt-LT"),
    ("lv", "lv-LV"),
    ("mn", "mn-MN"),
    ("nb", "nb-NO"),
    ("nl", "nl-NL"),
    ("nn", "nn-NO"),
    ("pl", "pl-PL"),
    ("pt", "pt-PT"),
    ("ro", "ro-RO"),
    ("ru", "ru-RU"),
    ("sk", "sk-SK"),
    ("sl", "sl-SI"),
    ("sr", "sr-RS"),
    ("sv", "sv-SE"),
    ("th", "th-TH"),
    ("tr", "tr-TR"),
    ("uk", "uk-UA"),
    ("vi", "vi-VN"),
    ("zh", "zh-CN"),
];

pub(crate) const BUILT_IN_LANG: &str = "en-US";

impl Locale {
    /// The `en-US` terms every driver starts from.
    pub(crate) fn built_in() -> Self {
        let terms = EN_US_TERMS
            .iter()
            .map(|&(name, form, single, multiple)| {
                (
                    (name.to_string(), form.to_string()),
                    Term {
                        single: single.to_string(),
                        multiple: multiple.to_string(),
                    },
                )
            })
            .collect();
        Self {
            lang: Some(BUILT_IN_LANG.to_string()),
            terms,
        }
    }

    /// Parses a standalone `<locale>` document.
    pub(crate) fn parse(xml: &str) -> std::result::Result<Self, String> {
        let document = roxmltree::Document::parse(xml).map_err(|err| err.to_string())?;
        let root = document.root_element();
        if root.tag_name().name() != "locale" {
            return Err(format!("expected <locale>, found <{}>", root.tag_name().name()));
        }
        Ok(Self::from_node(root))
    }

    /// Reads terms from a `<locale>` element, standalone or inline in a style.
    pub(crate) fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let mut locale = Locale {
            lang: node.attribute((XML_NS, "lang")).map(str::to_string),
            terms: HashMap::new(),
        };
        let terms = node
            .children()
            .filter(|child| child.has_tag_name("terms"))
            .flat_map(|terms| terms.children())
            .filter(|child| child.has_tag_name("term"));
        for term in terms {
            let Some(name) = term.attribute("name") else {
                continue;
            };
            let form = term.attribute("form").unwrap_or("long");
            let text_of = |tag: &str| {
                term.children()
                    .find(|child| child.has_tag_name(tag))
                    .map(|child| child.text().unwrap_or_default().to_string())
            };
            let value = match (text_of("single"), text_of("multiple")) {
                (Some(single), Some(multiple)) => Term { single, multiple },
                (Some(single), None) => Term {
                    multiple: single.clone(),
                    single,
                },
                (None, Some(multiple)) => Term {
                    single: multiple.clone(),
                    multiple,
                },
                (None, None) => {
                    let text = term.text().unwrap_or_default().to_string();
                    Term {
                        single: text.clone(),
                        multiple: text,
                    }
                }
            };
            locale.terms.insert((name.to_string(), form.to_string()), value);
        }
        locale
    }

    /// Overlays `other`'s terms on this locale.
    pub(crate) fn merge(&mut self, other: &Locale) {
        for (key, term) in &other.terms {
            self.terms.insert(key.clone(), term.clone());
        }
        if other.lang.is_some() {
            self.lang.clone_from(&other.lang);
        }
    }

    /// Looks up a term, falling back through the CSL form chain.
    pub(crate) fn term(&self, name: &str, form: &str, plural: bool) -> Option<&str> {
        let forms: &[&str] = match form {
            "symbol" => &["symbol", "short", "long"],
            "verb-short" => &["verb-short", "verb", "long"],
            "short" => &["short", "long"],
            "verb" => &["verb", "long"],
            _ => &["long"],
        };
        forms.iter().find_map(|form| {
            self.terms
                .get(&(name.to_string(), form.to_string()))
                .map(|term| if plural { term.multiple.as_str() } else { term.single.as_str() })
        })
    }
}

/// The tags to request for `tag`, most specific first. `en-US` is never requested.
pub(crate) fn fallback_chain(tag: &str) -> Vec<String> {
    let language = tag.split(['-', '_']).next().unwrap_or(tag);
    let generic = PRIMARY_DIALECTS
        .iter()
        .find(|(lang, _)| *lang == language)
        .map_or(language, |(_, dialect)| dialect);
    let mut chain = vec![tag.to_string()];
    if generic != tag {
        chain.push(generic.to_string());
    }
    chain.retain(|tag| tag != BUILT_IN_LANG && !tag.is_empty());
    chain
}

/// Receives the XML written by a fetch callback.
#[derive(Debug, Default)]
pub(crate) struct LocaleSlot {
    xml: Option<String>,
}

/// Host callback plus its context, captured from the init options.
pub(crate) struct LocaleFetcher {
    pub context: *mut c_void,
    pub callback: LocaleFetchCallback,
}

impl LocaleFetcher {
    /// Asks the host for one tag. `None` means the host had nothing to offer.
    pub(crate) fn fetch(&self, lang: &str) -> Result<Option<String>> {
        let lang = CString::new(lang)?;
        let mut slot = LocaleSlot::default();
        let slot_ptr = &mut slot as *mut LocaleSlot as *mut citeproc_sys::LocaleSlot;
        tracing::trace!(lang = ?lang, "fetching locale");
        // Safety: the slot outlives the call and `context` was provided for this callback.
        unsafe { (self.callback)(self.context, slot_ptr, lang.as_ptr()) };
        Ok(slot.xml)
    }

    /// Builds the merged locale for a style whose default locale is `tag`.
    pub(crate) fn resolve(&self, tag: &str) -> Result<Locale> {
        let mut fetched = Vec::new();
        for lang in fallback_chain(tag) {
            let Some(xml) = self.fetch(&lang)? else {
                tracing::debug!(%lang, "locale not available from host");
                continue;
            };
            match Locale::parse(&xml) {
                Ok(locale) => fetched.push(locale),
                Err(err) => tracing::warn!(%lang, "ignoring locale that failed to parse: {err}"),
            }
        }
        let mut merged = Locale::built_in();
        for locale in fetched.iter().rev() {
            merged.merge(locale);
        }
        Ok(merged)
    }
}

/// Stores locale XML in the slot handed to a locale fetch callback.
///
/// A slot accepts exactly one write; later writes fail with `CR_ERR_BUFFER_OPS`.
///
/// # Safety
///
/// `slot` must be the pointer the engine passed to the running fetch callback.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_locale_slot_write(
    slot: *mut citeproc_sys::LocaleSlot,
    locale_xml: *const c_char,
    locale_xml_len: usize,
) -> ErrorCode {
    code_boundary(|| {
        let slot = unsafe { (slot as *mut LocaleSlot).as_mut() }
            .ok_or(FfiError::NullPointer("locale slot"))?;
        let xml = unsafe { args::utf8(locale_xml, locale_xml_len, "locale xml")? };
        if slot.xml.is_some() {
            return Err(FfiError::BufferOps("locale slot already written"));
        }
        slot.xml = Some(xml.to_string());
        Ok(())
    })
}
