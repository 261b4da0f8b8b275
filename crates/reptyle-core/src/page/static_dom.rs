//! [`PageDom`] over a saved HTML document.
//!
//! Clicks, navigations and history moves are recorded rather than performed;
//! confirmation prompts are answered from a scripted queue. Used by the
//! `scrape` command and by tests.

use super::dom::{Element, NodeKey, PageDom};
use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use url::Url;

pub struct StaticPage {
    html: Html,
    location: Url,
    /// Successive values returned by `title()`; the last one sticks.
    titles: RefCell<VecDeque<String>>,
    confirm_answers: VecDeque<bool>,
    default_answer: bool,
    clicks: Vec<Element>,
    navigations: Vec<String>,
    history_backs: usize,
    prompts: Vec<String>,
}

impl StaticPage {
    pub fn parse(html: &str, location: &str) -> Result<Self> {
        let location = Url::parse(location).with_context(|| format!("invalid page url {location:?}"))?;
        let html = Html::parse_document(html);
        let title = Selector::parse("title")
            .ok()
            .and_then(|sel| html.select(&sel).next().map(|t| t.text().collect::<String>()))
            .unwrap_or_default();
        Ok(Self {
            html,
            location,
            titles: RefCell::new(VecDeque::from([title])),
            confirm_answers: VecDeque::new(),
            default_answer: false,
            clicks: Vec::new(),
            navigations: Vec::new(),
            history_backs: 0,
            prompts: Vec::new(),
        })
    }

    /// Replaces the document title with a sequence, e.g. loading placeholders
    /// followed by the real title.
    pub fn with_titles<I, S>(self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let titles: VecDeque<String> = titles.into_iter().map(Into::into).collect();
        if !titles.is_empty() {
            *self.titles.borrow_mut() = titles;
        }
        self
    }

    /// Queues answers for `confirm`; once exhausted, `default_answer` is used.
    pub fn with_confirm_answers<I: IntoIterator<Item = bool>>(mut self, answers: I) -> Self {
        self.confirm_answers.extend(answers);
        self
    }

    pub fn with_default_answer(mut self, answer: bool) -> Self {
        self.default_answer = answer;
        self
    }

    pub fn clicks(&self) -> &[Element] {
        &self.clicks
    }

    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    pub fn history_backs(&self) -> usize {
        self.history_backs
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
    }

    fn parse_selector(selector: &str) -> Option<Selector> {
        match Selector::parse(selector) {
            Ok(sel) => Some(sel),
            Err(e) => {
                tracing::warn!(selector, "invalid selector: {:?}", e);
                None
            }
        }
    }

    fn resolve(&self, raw: &str) -> String {
        self.location
            .join(raw)
            .map(String::from)
            .unwrap_or_else(|_| raw.to_string())
    }

    fn snapshot(&self, el: ElementRef<'_>) -> Element {
        let key = self
            .elements()
            .position(|e| e.id() == el.id())
            .map(NodeKey)
            .unwrap_or(NodeKey(usize::MAX));
        let value = el.value();
        let tag = value.name().to_string();
        let attrs: BTreeMap<String, String> = value
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let href = if tag == "a" {
            value.attr("href").map(|h| self.resolve(h))
        } else {
            None
        };
        let src = value.attr("src").map(|s| self.resolve(s));
        Element {
            key,
            tag,
            text: el.text().collect::<String>(),
            attrs,
            href,
            src,
        }
    }

    fn element_ref(&self, key: NodeKey) -> Option<ElementRef<'_>> {
        self.elements().nth(key.0)
    }
}

impl PageDom for StaticPage {
    fn location(&self) -> String {
        self.location.to_string()
    }

    fn title(&self) -> String {
        let mut titles = self.titles.borrow_mut();
        if titles.len() > 1 {
            titles.pop_front().unwrap_or_default()
        } else {
            titles.front().cloned().unwrap_or_default()
        }
    }

    fn query(&self, selector: &str) -> Option<Element> {
        let sel = Self::parse_selector(selector)?;
        let found = self.html.select(&sel).next()?;
        Some(self.snapshot(found))
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Some(sel) = Self::parse_selector(selector) else {
            return Vec::new();
        };
        self.html.select(&sel).map(|el| self.snapshot(el)).collect()
    }

    fn closest(&self, element: &Element, selector: &str) -> Option<Element> {
        let sel = Self::parse_selector(selector)?;
        let start = self.element_ref(element.key)?;
        std::iter::once(start)
            .chain(start.ancestors().filter_map(ElementRef::wrap))
            .find(|e| sel.matches(e))
            .map(|e| self.snapshot(e))
    }

    fn click(&mut self, element: &Element) {
        tracing::debug!(element = %element.describe(), "click");
        self.clicks.push(element.clone());
    }

    fn navigate(&mut self, href: &str) {
        tracing::debug!(href, "navigate");
        self.navigations.push(href.to_string());
    }

    fn history_back(&mut self) {
        tracing::debug!("history back");
        self.history_backs += 1;
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.prompts.push(message.to_string());
        self.confirm_answers.pop_front().unwrap_or(self.default_answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head><title>Sample Title - Reptyle Members Area</title></head>
        <body>
          <a id="wrap" href="/movies/77"><img id="thumb" src="thumb.jpg"></a>
          <p>Two <b>parts</b></p>
        </body></html>
    "#;

    fn page() -> StaticPage {
        StaticPage::parse(PAGE, "https://members.example.com/movies/123").unwrap()
    }

    #[test]
    fn title_from_document() {
        assert_eq!(page().title(), "Sample Title - Reptyle Members Area");
    }

    #[test]
    fn title_sequence_sticks_on_last() {
        let p = page().with_titles(["a", "b"]);
        assert_eq!(p.title(), "a");
        assert_eq!(p.title(), "b");
        assert_eq!(p.title(), "b");
    }

    #[test]
    fn hrefs_and_srcs_resolve_against_location() {
        let p = page();
        let a = p.query("#wrap").unwrap();
        assert_eq!(a.href.as_deref(), Some("https://members.example.com/movies/77"));
        let img = p.query("#thumb").unwrap();
        assert_eq!(img.src.as_deref(), Some("https://members.example.com/movies/thumb.jpg"));
        assert!(img.href.is_none());
    }

    #[test]
    fn text_includes_descendants() {
        assert_eq!(page().query("p").unwrap().text, "Two parts");
    }

    #[test]
    fn closest_walks_up_from_self() {
        let p = page();
        let img = p.query("#thumb").unwrap();
        let link = p.closest(&img, r#"a[href*="/movies/"]"#).unwrap();
        assert_eq!(link.attr("id"), Some("wrap"));
        assert_eq!(p.closest(&link, "a").unwrap().key, link.key);
        assert!(p.closest(&img, "table").is_none());
    }

    #[test]
    fn invalid_selector_matches_nothing() {
        let p = page();
        assert!(p.query("a[[").is_none());
        assert!(p.query_all("a[[").is_empty());
    }

    #[test]
    fn confirm_uses_queue_then_default() {
        let mut p = page().with_confirm_answers([true]).with_default_answer(false);
        assert!(p.confirm("first?"));
        assert!(!p.confirm("second?"));
        assert_eq!(p.prompts(), ["first?".to_string(), "second?".to_string()]);
    }
}
