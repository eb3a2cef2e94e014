// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTML extraction for sign info pages
//!
//! Pulls the sign description, picture, category title and name out of a
//! vodiy.ua sign page. Each field is looked up on its own so a change in one
//! block of markup only loses that field.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Fields scraped from a sign info page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignPage {
    pub description: Option<String>,
    /// Image path relative to the site root, without the leading `/`
    pub image_source: Option<String>,
    pub category: Option<String>,
    pub name: Option<String>,
}

/// Extract every known field from a sign page
pub fn extract_sign_page(html: &str) -> SignPage {
    let document = Html::parse_document(html);

    let description =
        first_within(&document, "div.mark_markpage_block", "p").map(|p| filter_markdown(&text_of(&p)));

    let image_source = first_within(&document, "div.contain_mar", "img")
        .and_then(|img| img.value().attr("src"))
        .map(|src| src.trim_start_matches('/').to_string());

    let category =
        first_within(&document, "div.title_pdr", "h1").map(|h1| filter_markdown(&text_of(&h1)));

    let name =
        first_within(&document, "div.mark-markpage", "h2").map(|h2| strip_sign_code(&text_of(&h2)));

    SignPage {
        description,
        image_source,
        category,
        name,
    }
}

/// First `child` element inside the first element matching `container`
fn first_within<'a>(document: &'a Html, container: &str, child: &str) -> Option<ElementRef<'a>> {
    let container_selector = Selector::parse(container).ok()?;
    let child_selector = Selector::parse(child).ok()?;

    document
        .select(&container_selector)
        .next()?
        .select(&child_selector)
        .next()
}

fn text_of(element: &ElementRef) -> String {
    element.text().collect::<String>()
}

/// Remove markdown leftovers (`[`, `]`, `*`, literal `\n`) and tidy whitespace
pub fn filter_markdown(text: &str) -> String {
    static MARKDOWN: OnceLock<Regex> = OnceLock::new();
    let markdown = MARKDOWN.get_or_init(|| Regex::new(r"[\[\]\*]").expect("valid regex"));

    markdown
        .replace_all(text, "")
        .replace("\\n", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove a leading sign code such as `5.1.2 ` or `1.1 ` from a title
pub fn strip_sign_code(text: &str) -> String {
    static SIGN_CODE: OnceLock<Regex> = OnceLock::new();
    let sign_code = SIGN_CODE.get_or_init(|| Regex::new(r"^\d+(\.\d+)*\s+").expect("valid regex"));

    let filtered = filter_markdown(text);
    sign_code.replace(&filtered, "").into_owned()
}
