// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! CSL-JSON builders accepted by the engine.

mod common;

use citeproc::{
    BuiltInLocales, Driver, OutputFormat,
    csl_json::{Date, Name, NumString, Reference, Title},
};
use common::setup;

const STYLE: &str = r#"<style xmlns="http://purl.org/net/xbiblio/csl" class="in-text" version="1.0">
  <citation><layout><text variable="title" form="short"/></layout></citation>
  <bibliography>
    <layout>
      <names variable="author" suffix=": "><name and="text"/></names>
      <text variable="title"/>
      <text variable="issued" prefix=" (" suffix=")"/>
      <group delimiter=" " prefix=", "><label variable="page" form="short"/><text variable="page"/></group>
    </layout>
  </bibliography>
</style>"#;

fn driver() -> Driver {
    Driver::new(setup(), STYLE, BuiltInLocales, OutputFormat::Plain).unwrap()
}

#[test]
fn structured_variables_render() {
    let mut beethoven = Name::person("Beethoven", "Ludwig");
    beethoven.non_dropping_particle = Some("van".to_string());
    let reference = Reference::new("owls", "book")
        .with("author", vec![beethoven, Name::literal("W.H.O.")])
        .with(
            "title",
            Title::Object {
                full: None,
                main: Some("Owls".to_string()),
                sub: vec!["A Study".to_string()],
                short: Some("Owls".to_string()),
            },
        )
        .with("issued", Date::range(&[2001, 5], &[2002]))
        .with("page", NumString::from("12-14"));

    assert_eq!(
        driver().preview_reference(&reference, None).unwrap(),
        "Ludwig van Beethoven and W.H.O.: Owls: A Study (2001), pp. 12-14"
    );
}

#[test]
fn raw_and_literal_dates_render_verbatim() {
    let mut driver = driver();
    let raw = Reference::new("a", "book")
        .with("title", "Almanac")
        .with("issued", Date::raw("Spring 1999"));
    assert_eq!(driver.preview_reference(&raw, None).unwrap(), "Almanac (Spring 1999)");

    let literal = Reference::new("b", "book")
        .with("title", "Codex")
        .with("issued", Date::literal("ca. 1200").circa());
    assert_eq!(driver.preview_reference(&literal, None).unwrap(), "Codex (ca. 1200)");
}

#[test]
fn id_variable_cannot_replace_the_record_id() {
    let mut driver = driver();
    let mut reference = Reference::new("real", "book").with("title", "Kept");
    assert!(reference.insert("id", "spoofed").is_none());
    driver.insert_reference(&reference).unwrap();

    let cluster = driver.cluster(1).unwrap();
    cluster.append_ref("real").unwrap();
    driver.insert_cluster(&cluster).unwrap();
    driver
        .set_cluster_order(&[citeproc::ClusterPosition::in_text(1)])
        .unwrap();
    assert_eq!(driver.format_cluster(1).unwrap(), "Kept");
}
