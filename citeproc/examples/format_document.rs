// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Formats a small document: two footnotes citing three references, then the bibliography.
//!
//! Runs against the engine linked into this binary. Pass `--style` to use your
//! own CSL file and `--locales` to resolve locales from a directory of
//! `locales-<tag>.xml` files.

mod common;

use std::path::PathBuf;

use citeproc::{
    Cite, ClusterPosition, Driver, LocaleDirectory, LocaleFetcher, LocatorType,
    OutputFormat, api_from_functions,
    csl_json::{Date, Name, Reference},
};
use clap::{Parser, ValueEnum};
use tracing::info;

const DEFAULT_STYLE: &str = r#"<style xmlns="http://purl.org/net/xbiblio/csl" class="note" version="1.0">
  <citation>
    <layout delimiter="; " suffix=".">
      <group delimiter=", ">
        <names variable="author"><name and="text"/></names>
        <text variable="title" form="short" font-style="italic"/>
        <group delimiter=" "><label variable="locator" form="short"/><text variable="locator"/></group>
      </group>
    </layout>
  </citation>
  <bibliography>
    <layout>
      <names variable="author" suffix=". "><name and="text"/></names>
      <text variable="title" font-style="italic"/>
      <text variable="issued" prefix=" (" suffix=")"/>
    </layout>
  </bibliography>
</style>"#;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Rtf,
    Plain,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Html => OutputFormat::Html,
            Format::Rtf => OutputFormat::Rtf,
            Format::Plain => OutputFormat::Plain,
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Opts {
    /// CSL style file. A small built-in note style is used when omitted.
    #[arg(long)]
    style: Option<PathBuf>,

    /// Directory containing `locales-<tag>.xml` files.
    #[arg(long)]
    locales: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Plain)]
    format: Format,
}

fn references() -> Vec<Reference> {
    vec![
        Reference::new("smith2001", "book")
            .with("title", "A Flight of Sparrows")
            .with("title-short", "Sparrows")
            .with("author", vec![Name::person("Smith", "John")])
            .with("issued", Date::year(2001)),
        Reference::new("doe2010", "article-journal")
            .with("title", "Owls at Night")
            .with("title-short", "Owls")
            .with("author", vec![Name::person("Doe", "Jane"), Name::person("Roe", "Richard")])
            .with("issued", Date::ymd(2010, 3, 14)),
        Reference::new("who1998", "report")
            .with("title", "Birds of the World")
            .with("author", vec![Name::literal("World Health Organization")])
            .with("issued", Date::raw("1998")),
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    common::setup_logging();
    let opts: Opts = Opts::parse();

    let style = match &opts.style {
        Some(path) => std::fs::read_to_string(path)?,
        None => DEFAULT_STYLE.to_string(),
    };
    let fetcher: Box<dyn Fn(&str) -> Option<String> + Send> = match opts.locales {
        Some(dir) => {
            let directory = LocaleDirectory::new(dir);
            Box::new(move |lang: &str| directory.fetch(lang))
        }
        None => Box::new(|_: &str| None),
    };

    let api = api_from_functions(citeproc_ffi::functions());
    let mut driver = Driver::new(api, &style, fetcher, opts.format.into())?;
    for reference in references() {
        driver.insert_reference(&reference)?;
    }

    let first = driver.cluster_named("note-1")?;
    first.append(&Cite::new("smith2001").with_locator("56", LocatorType::Page))?;
    first.append(&Cite::new("doe2010").with_prefix("see also "))?;
    let first = driver.insert_cluster(&first)?;

    let second = driver.cluster_named("note-2")?;
    second.append(&Cite::new("who1998").with_locator("4", LocatorType::Chapter))?;
    let second = driver.insert_cluster(&second)?;

    driver.set_cluster_order(&[ClusterPosition::note(first, 1), ClusterPosition::note(second, 2)])?;
    info!(format = ?driver.output_format(), "document ordered");

    for (number, id) in [first, second].into_iter().enumerate() {
        println!("[{}] {}", number + 1, driver.format_cluster(id)?);
    }
    println!();
    print!("{}", driver.format_bibliography()?);
    Ok(())
}
