//! `ListingPage` over a parsed HTML document.
//!
//! The document is parsed with `scraper`; fragments are grafted into the
//! underlying `ego_tree` so the enriched page serializes back out as HTML.

use crate::core::page_profile::{AnchorRule, CompiledProfile, IdentifierPattern, IdentifierSource};
use crate::domain::model::{
    Identifier, PageType, RenderedFragment, FRAGMENT_MARKER_ATTR, FRAGMENT_TAG_SUFFIX,
};
use crate::domain::ports::ListingPage;
use crate::utils::error::{EnrichError, Result};
use ego_tree::{NodeId, NodeRef, Tree};
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Handle to one listing element in an `HtmlPage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HtmlListing(NodeId);

#[derive(Debug, Clone, Copy)]
enum Insertion {
    After(NodeId),
    Append(NodeId),
}

pub struct HtmlPage {
    document: Html,
    profile: CompiledProfile,
    pattern: IdentifierPattern,
    page_url: Option<Url>,
}

impl HtmlPage {
    pub fn parse(html: &str, profile: CompiledProfile) -> Self {
        Self {
            document: Html::parse_document(html),
            profile,
            pattern: IdentifierPattern::default(),
            page_url: None,
        }
    }

    pub fn with_pattern(mut self, pattern: IdentifierPattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_page_url(mut self, url: Url) -> Self {
        self.page_url = Some(url);
        self
    }

    /// Serializes the (possibly enriched) document.
    pub fn to_html(&self) -> String {
        self.document.html()
    }

    /// Number of price history fragments currently in the document.
    pub fn fragment_count(&self) -> usize {
        self.fragment_markers().len()
    }

    /// Marker values of every fragment, in document order.
    pub fn fragment_markers(&self) -> Vec<String> {
        self.document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter_map(|el| el.value().attr(FRAGMENT_MARKER_ATTR))
            .filter(|marker| marker.ends_with(FRAGMENT_TAG_SUFFIX))
            .map(str::to_string)
            .collect()
    }

    fn element(&self, listing: HtmlListing) -> Option<ElementRef<'_>> {
        self.document.tree.get(listing.0).and_then(ElementRef::wrap)
    }

    fn first_within<'a>(el: ElementRef<'a>, selector: Option<&Selector>) -> Option<ElementRef<'a>> {
        selector.and_then(|s| el.select(s).next())
    }

    fn insertion_point(&self, listing: HtmlListing) -> Option<Insertion> {
        let el = self.element(listing)?;
        match self.profile.anchor_rule {
            AnchorRule::AfterLink => {
                Self::first_within(el, self.profile.link.as_ref()).map(|link| Insertion::After(link.id()))
            }
            AnchorRule::AppendToContainer => Self::first_within(el, self.profile.container.as_ref())
                .map(|row| Insertion::Append(row.id())),
            AnchorRule::BetweenGalleryAndBody => {
                let gallery = Self::first_within(el, self.profile.gallery.as_ref())?;
                Self::first_within(el, self.profile.body.as_ref())?;
                Some(Insertion::After(gallery.id()))
            }
        }
    }
}

impl ListingPage for HtmlPage {
    type Listing = HtmlListing;

    fn page_type(&self) -> PageType {
        self.profile.page_type
    }

    fn full_width(&self) -> bool {
        self.profile.full_width
    }

    fn discover(&self) -> Vec<HtmlListing> {
        self.document
            .select(&self.profile.listing)
            .map(|el| HtmlListing(el.id()))
            .collect()
    }

    fn extract_identifier(&self, listing: HtmlListing) -> Option<Identifier> {
        let el = self.element(listing)?;

        let identifier = match self.profile.identifier_source {
            IdentifierSource::LinkHref => {
                let link = Self::first_within(el, self.profile.link.as_ref());
                let Some(href) = link.and_then(|a| a.value().attr("href")) else {
                    tracing::debug!("No price link found for a listing");
                    return None;
                };
                let found = self.pattern.find(href);
                if found.is_none() {
                    tracing::debug!("No identifier in link href: {}", href);
                }
                found
            }
            IdentifierSource::ElementId => el.value().id().and_then(|id| self.pattern.find(id)),
            IdentifierSource::PageUrl => self
                .page_url
                .as_ref()
                .and_then(|url| self.pattern.find(url.as_str())),
        }?;

        // 缺少插入位置所需的結構時跳過這筆刊登
        if self.insertion_point(listing).is_none() {
            tracing::debug!("Listing {} is missing its anchor structure, skipping", identifier);
            return None;
        }

        Some(identifier)
    }

    fn is_already_enriched(&self, listing: HtmlListing, identifier: &Identifier) -> bool {
        let Some(el) = self.element(listing) else {
            return false;
        };
        let tag = identifier.fragment_tag();
        el.descendants()
            .filter_map(ElementRef::wrap)
            .any(|child| child.value().attr(FRAGMENT_MARKER_ATTR) == Some(tag.as_str()))
    }

    fn attach(&mut self, listing: HtmlListing, fragment: &RenderedFragment) -> Result<()> {
        let insertion = self
            .insertion_point(listing)
            .ok_or_else(|| EnrichError::ParseError {
                message: format!("anchor for {} is no longer on the page", fragment.identifier),
            })?;

        let parsed = Html::parse_fragment(&fragment.to_html());
        let source = *parsed.root_element();
        let tree = &mut self.document.tree;

        match insertion {
            Insertion::Append(parent) => graft_children(tree, parent, source),
            Insertion::After(anchor) => {
                let mut cursor = anchor;
                for top in source.children() {
                    let Some(mut node) = tree.get_mut(cursor) else {
                        break;
                    };
                    let inserted = node.insert_after(top.value().clone()).id();
                    graft_children(tree, inserted, top);
                    cursor = inserted;
                }
            }
        }

        Ok(())
    }
}

/// Copies the children of `source` (from another document) under `parent`.
fn graft_children(tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<'_, Node>) {
    for child in source.children() {
        let Some(mut target) = tree.get_mut(parent) else {
            return;
        };
        let copied = target.append(child.value().clone()).id();
        graft_children(tree, copied, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::page_profile::PageProfile;

    fn fragment(id: &str) -> RenderedFragment {
        RenderedFragment {
            identifier: Identifier::new(id),
            full_width: false,
            entries: vec!["<strong>$1</strong> drop".to_string(), "1 Jan: $10".to_string()],
        }
    }

    fn page(html: &str, page_type: PageType) -> HtmlPage {
        HtmlPage::parse(html, PageProfile::default_for(page_type).compile().unwrap())
    }

    const SEARCH: &str = r#"<html><body>
        <div class="_listing-card_a1"><div class="price"><a href="/price-guide/SSE-AD-1">Price</a><span>tail</span></div></div>
        <div class="_listing-card_a1"><div class="price"><a href="/about">About</a></div></div>
        <div class="_listing-card_a1"><p>no link</p></div>
        <div class="_listing-card_a1"><div class="price"><a href="https://x/price-guide/?id=SSE-AD-2&s=1">Price</a></div></div>
    </body></html>"#;

    #[test]
    fn test_search_discovery_and_extraction() {
        let page = page(SEARCH, PageType::SearchResults);
        let listings = page.discover();
        assert_eq!(listings.len(), 4);

        let ids: Vec<Option<String>> = listings
            .iter()
            .map(|l| page.extract_identifier(*l).map(|i| i.to_string()))
            .collect();
        assert_eq!(
            ids,
            vec![
                Some("SSE-AD-1".to_string()),
                None,
                None,
                Some("SSE-AD-2".to_string())
            ]
        );
    }

    #[test]
    fn test_search_attach_inserts_after_link() {
        let mut page = page(SEARCH, PageType::SearchResults);
        let listing = page.discover()[0];
        let id = page.extract_identifier(listing).unwrap();
        assert!(!page.is_already_enriched(listing, &id));

        page.attach(listing, &fragment("SSE-AD-1")).unwrap();

        assert!(page.is_already_enriched(listing, &id));
        assert_eq!(page.fragment_count(), 1);
        let html = page.to_html();
        let link_end = html.find("Price</a>").unwrap();
        let frag = html.find(r#"data-sse-id="SSE-AD-1-price-history""#).unwrap();
        let tail = html.find("<span>tail</span>").unwrap();
        assert!(link_end < frag && frag < tail);
        assert!(html.contains("<li>1 Jan: $10</li>"));
    }

    #[test]
    fn test_marker_is_identifier_specific() {
        let mut page = page(SEARCH, PageType::SearchResults);
        let listing = page.discover()[0];
        page.attach(listing, &fragment("SSE-AD-1")).unwrap();
        assert!(!page.is_already_enriched(listing, &Identifier::new("SSE-AD-9")));
    }

    #[test]
    fn test_saved_items_appends_to_row() {
        let html = r#"<html><body>
            <div class="listing-item card topspot" id="SSE-AD-7"><div class="row"><div class="col">car</div></div></div>
            <div class="listing-item card topspot" id="SSE-AD-8"><div class="col">no row</div></div>
            <div class="listing-item card topspot"><div class="row"></div></div>
        </body></html>"#;
        let mut page = page(html, PageType::SavedItems);
        let listings = page.discover();
        assert_eq!(listings.len(), 3);
        assert_eq!(page.extract_identifier(listings[0]).unwrap().as_str(), "SSE-AD-7");
        assert!(page.extract_identifier(listings[1]).is_none());
        assert!(page.extract_identifier(listings[2]).is_none());

        page.attach(listings[0], &fragment("SSE-AD-7")).unwrap();
        let out = page.to_html();
        let col = out.find(r#"<div class="col">car</div>"#).unwrap();
        let frag = out.find("SSE-AD-7-price-history").unwrap();
        assert!(col < frag);
    }

    #[test]
    fn test_detail_requires_matching_url_and_structure() {
        let html = r#"<html><body>
            <div class="media-gallery">pics</div><div class="listing-details">specs</div>
        </body></html>"#;
        let profile = PageProfile::default_for(PageType::Detail).compile().unwrap();

        let without_url = HtmlPage::parse(html, profile.clone());
        let listing = without_url.discover()[0];
        assert!(without_url.extract_identifier(listing).is_none());

        let url = Url::parse("https://www.carsales.com.au/cars/details/ford/SSE-AD-55/").unwrap();
        let mut page = HtmlPage::parse(html, profile.clone()).with_page_url(url.clone());
        let listing = page.discover()[0];
        assert_eq!(page.extract_identifier(listing).unwrap().as_str(), "SSE-AD-55");

        page.attach(listing, &fragment("SSE-AD-55")).unwrap();
        let out = page.to_html();
        let gallery = out.find("pics</div>").unwrap();
        let frag = out.find("SSE-AD-55-price-history").unwrap();
        let body = out.find(r#"<div class="listing-details">"#).unwrap();
        assert!(gallery < frag && frag < body);

        let no_gallery = HtmlPage::parse(
            r#"<html><body><div class="listing-details">specs</div></body></html>"#,
            profile,
        )
        .with_page_url(url);
        let listing = no_gallery.discover()[0];
        assert!(no_gallery.extract_identifier(listing).is_none());
    }

    #[test]
    fn test_listing_marker_attribute_is_not_counted_as_fragment() {
        let html = r#"<html><body><div class="_listing-card" data-sse-id="SSE-AD-1">
            <a href="/price-guide/SSE-AD-1">p</a></div></body></html>"#;
        let page = page(html, PageType::SearchResults);
        assert_eq!(page.fragment_count(), 0);
    }
}
