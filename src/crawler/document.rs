//! Rendered page markup with pending in-place edits
//!
//! A [`MirrorDocument`] keeps the rendered markup plus a set of edits keyed
//! by DOM node: attribute overrides and whole-node replacements. The parsed
//! tree is rebuilt on demand inside synchronous methods only, so the
//! document itself stays `Send` and can be held across awaits while assets
//! are downloaded. Parsing the same markup always yields the same node ids.

use crate::output::AssetKind;
use ego_tree::NodeId;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;

const FONT_EXTENSIONS: &[&str] = &[".woff", ".woff2", ".ttf", ".otf", ".eot"];

/// A piece of work discovered in the markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetJob {
    /// Inline `<style>` or `<script>` content to move into its own file
    Inline {
        node: NodeId,
        kind: AssetKind,
        content: String,
        /// `type` attribute of an inline script, carried to its replacement
        script_type: Option<String>,
    },

    /// Attribute referencing an external resource
    External {
        node: NodeId,
        attr: &'static str,
        reference: String,
        kind: AssetKind,
    },
}

#[derive(Debug, Clone)]
enum NodeEdit {
    /// New values for existing attributes
    Attributes(Vec<(String, String)>),

    /// The whole node is replaced by this childless element
    Replace {
        name: &'static str,
        attrs: Vec<(String, String)>,
    },
}

/// Page markup plus pending edits
#[derive(Debug, Clone)]
pub struct MirrorDocument {
    markup: String,
    edits: HashMap<NodeId, NodeEdit>,
}

impl MirrorDocument {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            edits: HashMap::new(),
        }
    }

    fn parse(&self) -> Html {
        Html::parse_document(&self.markup)
    }

    /// Overrides the value of an existing, unprefixed attribute
    ///
    /// Has no effect on a node that was replaced.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let edit = self
            .edits
            .entry(node)
            .or_insert_with(|| NodeEdit::Attributes(Vec::new()));

        if let NodeEdit::Attributes(attrs) = edit {
            match attrs.iter_mut().find(|(n, _)| n == name) {
                Some(existing) => existing.1 = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    /// Replaces a node (and its children) with a childless element
    pub fn replace_with(&mut self, node: NodeId, name: &'static str, attrs: Vec<(String, String)>) {
        self.edits.insert(node, NodeEdit::Replace { name, attrs });
    }

    pub fn is_replaced(&self, node: NodeId) -> bool {
        matches!(self.edits.get(&node), Some(NodeEdit::Replace { .. }))
    }

    /// Lists the inline blocks and external references of the page
    ///
    /// Jobs come in processing order: inline styles, inline scripts,
    /// stylesheets, scripts, images, fonts; each group in document order.
    /// Script data blocks (`application/ld+json`, templates) stay inline.
    pub fn asset_jobs(&self) -> Vec<AssetJob> {
        let html = self.parse();
        let mut jobs = Vec::new();

        for element in select(&html, "style") {
            let content: String = element.text().collect();
            if !content.trim().is_empty() {
                jobs.push(AssetJob::Inline {
                    node: element.id(),
                    kind: AssetKind::Css,
                    content,
                    script_type: None,
                });
            }
        }

        for element in select(&html, "script") {
            let script_type = element.value().attr("type");
            if element.value().attr("src").is_some() || !is_executable_script(script_type) {
                continue;
            }
            let content: String = element.text().collect();
            if !content.trim().is_empty() {
                jobs.push(AssetJob::Inline {
                    node: element.id(),
                    kind: AssetKind::Js,
                    content,
                    script_type: script_type.map(|t| t.to_string()),
                });
            }
        }

        let links = select(&html, "link[href]");

        for link in &links {
            if is_stylesheet_link(link) {
                jobs.push(external(link, "href", AssetKind::Css));
            }
        }

        for script in select(&html, "script[src]") {
            jobs.push(external(&script, "src", AssetKind::Js));
        }

        for image in select(&html, "img[src], source[src]") {
            jobs.push(external(&image, "src", AssetKind::Image));
        }

        for link in &links {
            if !is_stylesheet_link(link) && is_font_link(link) {
                jobs.push(external(link, "href", AssetKind::Font));
            }
        }

        jobs
    }

    /// Returns the raw `href` of every `<a>` element, in document order
    pub fn link_targets(&self) -> Vec<String> {
        let html = self.parse();
        select(&html, "a[href]")
            .into_iter()
            .filter_map(|a| a.value().attr("href"))
            .map(|href| href.to_string())
            .collect()
    }

    /// Serializes the document with all edits applied
    pub fn to_html(&self) -> String {
        let mut html = self.parse();

        for (node, edit) in &self.edits {
            match edit {
                NodeEdit::Attributes(overrides) => set_attributes(&mut html, *node, overrides),
                NodeEdit::Replace { name, attrs } => replace_node(&mut html, *node, name, attrs),
            }
        }

        let mut out = html.html();
        restore_doctype_ids(&html, &mut out);
        out
    }
}

/// Elements matching `css`, in document order
fn select<'a>(html: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => html.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn set_attributes(html: &mut Html, node: NodeId, overrides: &[(String, String)]) {
    let Some(mut node) = html.tree.get_mut(node) else {
        return;
    };

    if let Node::Element(element) = node.value() {
        for (key, value) in element.attrs.iter_mut() {
            if key.prefix.is_some() {
                continue;
            }
            if let Some((_, new)) = overrides.iter().find(|(n, _)| n.as_str() == &*key.local) {
                *value = new.as_str().into();
            }
        }
    }
}

fn replace_node(html: &mut Html, node: NodeId, name: &str, attrs: &[(String, String)]) {
    let Some(replacement) = build_element(name, attrs) else {
        tracing::debug!("Could not build replacement <{}>", name);
        return;
    };

    if let Some(mut node) = html.tree.get_mut(node) {
        node.insert_before(Node::Element(replacement));
        node.detach();
    }
}

/// Builds an element by parsing a bare tag, then filling in the values
///
/// Only attribute names go through the parser, so values need no escaping.
fn build_element(name: &str, attrs: &[(String, String)]) -> Option<Element> {
    let names: String = attrs.iter().map(|(n, _)| format!(" {}", n)).collect();
    let fragment = Html::parse_fragment(&format!("<{0}{1}></{0}>", name, names));
    let mut element = select(&fragment, name).first()?.value().clone();

    for (key, value) in element.attrs.iter_mut() {
        if let Some((_, new)) = attrs.iter().find(|(n, _)| n.as_str() == &*key.local) {
            *value = new.as_str().into();
        }
    }

    Some(element)
}

/// Puts public/system identifiers back into the serialized doctype
///
/// The serializer writes only `<!DOCTYPE name>`, which would switch legacy
/// pages out of quirks mode.
fn restore_doctype_ids(html: &Html, out: &mut String) {
    let Some((name, public_id, system_id)) =
        html.tree.root().children().find_map(|child| match child.value() {
            Node::Doctype(doctype) => Some((doctype.name(), doctype.public_id(), doctype.system_id())),
            _ => None,
        })
    else {
        return;
    };

    if public_id.is_empty() && system_id.is_empty() {
        return;
    }

    let short = format!("<!DOCTYPE {}>", name);
    if !out.starts_with(&short) {
        return;
    }

    let full = match (public_id.is_empty(), system_id.is_empty()) {
        (false, true) => format!("<!DOCTYPE {} PUBLIC \"{}\">", name, public_id),
        (false, false) => format!("<!DOCTYPE {} PUBLIC \"{}\" \"{}\">", name, public_id, system_id),
        _ => format!("<!DOCTYPE {} SYSTEM \"{}\">", name, system_id),
    };
    out.replace_range(..short.len(), &full);
}

fn external(element: &ElementRef<'_>, attr: &'static str, kind: AssetKind) -> AssetJob {
    AssetJob::External {
        node: element.id(),
        attr,
        reference: element.value().attr(attr).unwrap_or_default().to_string(),
        kind,
    }
}

/// Classic scripts, modules and any JavaScript MIME type are executable;
/// other `type` values mark data blocks
fn is_executable_script(script_type: Option<&str>) -> bool {
    let Some(script_type) = script_type else {
        return true;
    };
    let lower = script_type.trim().to_ascii_lowercase();
    lower.is_empty()
        || lower == "module"
        || lower.contains("javascript")
        || lower.contains("ecmascript")
}

/// `<link>` pointing at a stylesheet: `rel` contains `stylesheet` or the
/// href path ends in `.css`
fn is_stylesheet_link(link: &ElementRef<'_>) -> bool {
    let element = link.value();
    let rel_stylesheet = element
        .attr("rel")
        .map(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("stylesheet"))
        })
        .unwrap_or(false);

    let href = element.attr("href").unwrap_or_default();
    let path = href.split(['?', '#']).next().unwrap_or_default();

    rel_stylesheet || path.to_ascii_lowercase().ends_with(".css")
}

fn is_font_link(link: &ElementRef<'_>) -> bool {
    let href = link.value().attr("href").unwrap_or_default().to_ascii_lowercase();
    FONT_EXTENSIONS.iter().any(|ext| href.contains(ext))
}
