//! Request envelopes and reply parsing for the XML control API.
//!
//! Requests look like:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <request type="GetAsset">
//!   <clientId>ops</clientId>
//!   <category>MUS</category>
//!   <cartId>0012</cartId>
//! </request>
//! ```
//!
//! and every reply carries a `<status>`, an optional `<description>` and, for
//! fetches, an `<asset>` element.

use cw_core::{AssetId, CartId, Category, Error, Result};

use crate::record::{DowHours, MediaAssetRecord, RawMetadataForm};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Status value the server uses for a successful request.
pub const STATUS_SUCCESS: &str = "Success";

/// A parsed reply envelope.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: String,
    pub description: Option<String>,
    pub asset: Option<MediaAssetRecord>,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_SUCCESS)
    }

    /// The description if present, otherwise the bare status.
    pub fn reason(&self) -> String {
        self.description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("status {}", self.status))
    }
}

/// Build the envelope that fetches one asset.
pub fn fetch_request(client_id: &str, id: &AssetId) -> String {
    format!(
        "{XML_DECL}<request type=\"GetAsset\"><clientId>{}</clientId><category>{}</category><cartId>{}</cartId></request>",
        escape_xml(client_id),
        escape_xml(id.category.as_str()),
        escape_xml(id.cart_id.as_str()),
    )
}

/// Build the envelope that replaces an asset record.
pub fn update_request(client_id: &str, record: &MediaAssetRecord) -> String {
    format!(
        "{XML_DECL}<request type=\"UpdateAsset\"><clientId>{}</clientId>{}</request>",
        escape_xml(client_id),
        asset_element(record),
    )
}

fn asset_element(record: &MediaAssetRecord) -> String {
    let mut xml = String::from("<asset>");
    push_text_element(&mut xml, "category", record.id.category.as_str());
    push_text_element(&mut xml, "cartId", record.id.cart_id.as_str());
    push_text_element(&mut xml, "title", &record.title);
    push_text_element(&mut xml, "artist", &record.artist);
    push_text_element(&mut xml, "location", &record.location);
    push_text_element(&mut xml, "gain", &record.gain);
    push_text_element(&mut xml, "speed", &record.speed);
    push_text_element(&mut xml, "assetType", &record.asset_type);
    push_text_element(&mut xml, "length", &record.length_ms.to_string());

    xml.push_str("<dowHours>");
    for dow in &record.dow_hours {
        xml.push_str(&format!(
            "<hours day=\"{}\">{}</hours>",
            escape_xml(&dow.day),
            escape_xml(&dow.hours)
        ));
    }
    xml.push_str("</dowHours>");

    match record.raw_metadata_form {
        RawMetadataForm::Text => push_text_element(&mut xml, "rawMetadata", &record.raw_metadata),
        RawMetadataForm::Markup => {
            xml.push_str(&format!("<rawMetadata>{}</rawMetadata>", record.raw_metadata))
        }
    }
    for extra in &record.extra {
        xml.push_str(extra);
    }
    xml.push_str("</asset>");
    xml
}

fn push_text_element(xml: &mut String, tag: &str, value: &str) {
    xml.push_str(&format!("<{tag}>{}</{tag}>", escape_xml(value)));
}

/// Parse a reply envelope.
pub fn parse_reply(xml: &str) -> Result<Reply> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| Error::Xml(format!("reply parse error: {e}")))?;

    let root = doc.root_element();
    let status = child_text(&root, "status")
        .ok_or_else(|| Error::Xml("reply has no <status>".into()))?;
    let description = child_text(&root, "description");
    let asset = match child(&root, "asset") {
        Some(node) => Some(parse_asset(xml, &node)?),
        None => None,
    };

    Ok(Reply {
        status,
        description,
        asset,
    })
}

fn parse_asset(source: &str, node: &roxmltree::Node) -> Result<MediaAssetRecord> {
    let category = child_text(node, "category")
        .ok_or_else(|| Error::Xml("asset has no <category>".into()))?;
    let cart_id = child_text(node, "cartId")
        .ok_or_else(|| Error::Xml("asset has no <cartId>".into()))?;
    let id = AssetId::new(Category::new(&category)?, CartId::new(&cart_id)?);

    let mut record = MediaAssetRecord::new(id);

    for el in node.children().filter(|n| n.is_element()) {
        let text = || el.text().map(|t| t.trim().to_string()).unwrap_or_default();
        match el.tag_name().name() {
            "category" | "cartId" => {}
            "title" => record.title = text(),
            "artist" => record.artist = text(),
            "location" => record.location = text(),
            "gain" => record.gain = text(),
            "speed" => record.speed = text(),
            "assetType" => record.asset_type = text(),
            "length" => {
                let raw = text();
                record.length_ms = raw
                    .parse()
                    .map_err(|_| Error::Xml(format!("asset <length> is not a number: {raw:?}")))?;
            }
            "dowHours" => {
                record.dow_hours = el
                    .children()
                    .filter(|n| n.is_element() && n.tag_name().name() == "hours")
                    .map(|h| DowHours {
                        day: h.attribute("day").unwrap_or_default().to_string(),
                        hours: h.text().map(|t| t.trim().to_string()).unwrap_or_default(),
                    })
                    .collect();
            }
            "rawMetadata" => {
                let (content, form) = inner_content(source, &el);
                record.raw_metadata = content;
                record.raw_metadata_form = form;
            }
            _ => record.extra.push(source[el.range()].to_string()),
        }
    }

    Ok(record)
}

/// Content of `node`: its unescaped text when it only holds text, or the
/// verbatim source between its tags when it holds markup.
fn inner_content(source: &str, node: &roxmltree::Node) -> (String, RawMetadataForm) {
    if !node.children().any(|n| n.is_element()) {
        let text = node.text().unwrap_or_default().to_string();
        return (text, RawMetadataForm::Text);
    }
    let content = match (node.first_child(), node.last_child()) {
        (Some(first), Some(last)) => source[first.range().start..last.range().end].to_string(),
        _ => String::new(),
    };
    (content, RawMetadataForm::Markup)
}

fn child<'a, 'input>(
    node: &roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text(node: &roxmltree::Node, name: &str) -> Option<String> {
    child(node, name).map(|n| n.text().map(|t| t.trim().to_string()).unwrap_or_default())
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
