// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Fixtures shared by the integration tests.
//!
//! Every test runs against the engine linked into the test binary, so no
//! shared library has to be built or located.

#![allow(dead_code)]

use citeproc::{CiteprocApiHandle, api_from_functions};

/// Ensures logging is initialized only once across all tests.
static LOG_ONCE: std::sync::Once = std::sync::Once::new();

pub const NOTE_STYLE: &str = r#"<style xmlns="http://purl.org/net/xbiblio/csl" class="note" version="1.0">
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

pub const GERMAN_STYLE: &str = r#"<style xmlns="http://purl.org/net/xbiblio/csl" class="in-text" version="1.0" default-locale="de-AT">
  <citation>
    <layout>
      <text variable="title"/>
      <group delimiter=" " prefix=" "><label variable="page" form="short"/><text variable="page"/></group>
    </layout>
  </citation>
</style>"#;

pub const GERMAN_LOCALE: &str = r#"<locale xmlns="http://purl.org/net/xbiblio/csl" version="1.0" xml:lang="de-DE">
  <terms>
    <term name="page" form="short">S.</term>
  </terms>
</locale>"#;

/// Initializes logging (respecting `RUST_LOG`) and returns the in-process engine.
pub fn setup() -> CiteprocApiHandle {
    LOG_ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .with_test_writer()
            .init();
    });
    api()
}

/// The in-process engine without touching logging.
pub fn api() -> CiteprocApiHandle {
    api_from_functions(citeproc_ffi::functions())
}

pub fn sparrows() -> serde_json::Value {
    serde_json::json!({
        "id": "sparrows",
        "type": "book",
        "title": "A Flight of Sparrows",
        "title-short": "Sparrows",
        "author": [{"given": "John", "family": "Smith"}]
    })
}

pub fn owls() -> serde_json::Value {
    serde_json::json!({"id": "owls", "type": "book", "title": "Owls"})
}
