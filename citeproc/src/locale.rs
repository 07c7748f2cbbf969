// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Locale resolution through a host callback.
//!
//! While a driver is being created the engine asks for every locale the style
//! needs, one language tag at a time, falling back from a regional tag to the
//! language's primary dialect (`de-AT`, then `de-DE`). A [`LocaleFetcher`]
//! answers each request with locale XML or `None`.

use std::{
    ffi::CStr,
    io,
    os::raw::{c_char, c_void},
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
};

use crate::{api::CiteprocApiHandle, error::last_error, user_data::UserData};

/// Supplies locale XML by language tag.
///
/// Called synchronously on the thread creating a driver. Returning `None`
/// makes the engine fall back to the next tag and finally to its built-in
/// `en-US` terms. Implementations must not call back into the engine.
pub trait LocaleFetcher: Send + 'static {
    fn fetch(&self, lang: &str) -> Option<String>;
}

impl<F> LocaleFetcher for F
where
    F: Fn(&str) -> Option<String> + Send + 'static,
{
    fn fetch(&self, lang: &str) -> Option<String> {
        self(lang)
    }
}

/// Provides no locales, leaving the engine with its built-in `en-US` terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltInLocales;

impl LocaleFetcher for BuiltInLocales {
    fn fetch(&self, _lang: &str) -> Option<String> {
        None
    }
}

/// Reads `locales-<tag>.xml` files from a directory, the layout of the CSL locales repository.
#[derive(Debug, Clone)]
pub struct LocaleDirectory {
    dir: PathBuf,
}

impl LocaleDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl LocaleFetcher for LocaleDirectory {
    fn fetch(&self, lang: &str) -> Option<String> {
        let path = self.dir.join(format!("locales-{lang}.xml"));
        match std::fs::read_to_string(&path) {
            Ok(xml) => Some(xml),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::trace!("no locale file at \"{}\"", path.display());
                None
            }
            Err(err) => {
                tracing::warn!("Failed to read locale file \"{}\": {}", path.display(), err);
                None
            }
        }
    }
}

/// State behind the fetch callback's context pointer.
pub(crate) struct FetchContext {
    pub(crate) api: CiteprocApiHandle,
    pub(crate) fetcher: Box<dyn LocaleFetcher>,
}

impl FetchContext {
    pub(crate) fn new(api: CiteprocApiHandle, fetcher: impl LocaleFetcher) -> UserData<Self> {
        UserData::new(Self {
            api,
            fetcher: Box::new(fetcher),
        })
    }

    fn answer(&self, slot: *mut citeproc_sys::LocaleSlot, lang: &str) {
        let Some(xml) = self.fetcher.fetch(lang) else {
            tracing::debug!(lang, "locale not provided");
            return;
        };
        let code = unsafe { self.api.locale_slot_write(slot, xml.as_ptr() as *const c_char, xml.len()) };
        if code != citeproc_sys::CR_ERR_NONE {
            match last_error(&self.api) {
                Some(err) => tracing::warn!(lang, "Failed to hand locale to the engine: {}", err),
                None => tracing::warn!(lang, code, "Failed to hand locale to the engine"),
            }
        }
    }
}

/// Trampoline registered as the engine's locale fetch callback.
///
/// Never unwinds: a panicking fetcher is logged and treated as "not available".
pub(crate) unsafe extern "C" fn fetch_locale_callback(
    context: *mut c_void,
    slot: *mut citeproc_sys::LocaleSlot,
    lang: *const c_char,
) {
    if context.is_null() || lang.is_null() {
        tracing::warn!("locale fetch callback invoked without a context or tag");
        return;
    }
    let context = unsafe { UserData::<FetchContext>::reconstruct(context) };
    let lang = match unsafe { CStr::from_ptr(lang) }.to_str() {
        Ok(lang) => lang,
        Err(err) => {
            tracing::warn!("locale tag is not UTF-8: {}", err);
            return;
        }
    };
    if panic::catch_unwind(AssertUnwindSafe(|| context.answer(slot, lang))).is_err() {
        tracing::error!(lang, "locale fetcher panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_fetcher_reads_tagged_files() {
        let dir = std::env::temp_dir().join(format!("citeproc-locales-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("locales-fr-FR.xml"), "<locale/>").unwrap();

        let fetcher = LocaleDirectory::new(&dir);
        assert_eq!(fetcher.fetch("fr-FR").as_deref(), Some("<locale/>"));
        assert_eq!(fetcher.fetch("fr-CA"), None);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn closures_are_fetchers() {
        let fetcher = |lang: &str| (lang == "de-DE").then(|| "<locale/>".to_string());
        assert!(LocaleFetcher::fetch(&fetcher, "de-DE").is_some());
        assert!(LocaleFetcher::fetch(&fetcher, "de-AT").is_none());
    }
}
