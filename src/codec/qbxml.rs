//! `qbXML` rendition of the command codec
//!
//! Builds iterator query requests and decodes the matching `...QueryRs`
//! aggregates. Only the pagination contract is interpreted here; item
//! payloads are counted, not decoded.

use super::{CodecError, CommandCodec, CommandPlan};
use crate::state_machine::{PageDirective, PageView};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;

const DOCUMENT_PREAMBLE: &str =
    "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<?qbxml version=\"16.0\"?>\n";

/// Codec for the `qbXML` dialect the desktop connector executes.
#[derive(Debug, Clone, Copy, Default)]
pub struct QbxmlCodec;

impl QbxmlCodec {
    pub fn new() -> Self {
        Self
    }
}

impl CommandCodec for QbxmlCodec {
    fn build_command(&self, plan: &CommandPlan) -> Result<String, CodecError> {
        if plan.entity.is_empty() || !plan.entity.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CodecError::InvalidEntity(plan.entity.clone()));
        }

        let iterator = match &plan.directive {
            PageDirective::Start => String::from(r#"iterator="Start""#),
            PageDirective::Continue { cursor } => format!(
                r#"iterator="Continue" iteratorID="{}""#,
                escape(cursor.as_str())
            ),
        };

        Ok(format!(
            "{DOCUMENT_PREAMBLE}\
             <QBXML><QBXMLMsgsRq onError=\"stopOnError\">\
             <{entity}QueryRq {iterator}><MaxReturned>{page_size}</MaxReturned></{entity}QueryRq>\
             </QBXMLMsgsRq></QBXML>",
            entity = plan.entity,
            page_size = plan.page_size,
        ))
    }

    fn parse_page(&self, raw: &str) -> Result<PageView, CodecError> {
        let mut reader = Reader::from_str(raw);
        let mut page: Option<PageView> = None;
        let mut depth_in_result = 0usize;

        loop {
            match reader.read_event() {
                Ok(XmlEvent::Start(el)) => {
                    if let Some(page) = page.as_mut() {
                        if depth_in_result == 0 && is_item_element(el.local_name().as_ref()) {
                            page.item_count += 1;
                        }
                        depth_in_result += 1;
                    } else if is_result_element(el.local_name().as_ref()) {
                        page = Some(read_result_attributes(&el)?);
                    }
                }
                Ok(XmlEvent::Empty(el)) => {
                    if let Some(page) = page.as_mut() {
                        if depth_in_result == 0 && is_item_element(el.local_name().as_ref()) {
                            page.item_count += 1;
                        }
                    } else if is_result_element(el.local_name().as_ref()) {
                        // Childless result aggregate, e.g. an empty match set
                        page = Some(read_result_attributes(&el)?);
                        break;
                    }
                }
                Ok(XmlEvent::End(_)) if page.is_some() => {
                    if depth_in_result == 0 {
                        break;
                    }
                    depth_in_result -= 1;
                }
                Ok(XmlEvent::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(CodecError::Malformed(e.to_string())),
            }
        }

        page.ok_or(CodecError::MissingResult)
    }
}

/// The paginated aggregate, e.g. `CustomerQueryRs`.
fn is_result_element(name: &[u8]) -> bool {
    name.ends_with(b"QueryRs")
}

/// One returned item, e.g. `CustomerRet`.
fn is_item_element(name: &[u8]) -> bool {
    name.ends_with(b"Ret")
}

fn read_result_attributes(el: &BytesStart<'_>) -> Result<PageView, CodecError> {
    let mut status_code = String::new();
    let mut status_severity = String::new();
    let mut status_message = String::new();
    let mut remaining = 0u64;
    let mut cursor = None;

    for attr in el.attributes() {
        let attr = attr.map_err(|e| CodecError::Malformed(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| CodecError::Malformed(e.to_string()))?;
        match attr.key.as_ref() {
            b"statusCode" => status_code = value.into_owned(),
            b"statusSeverity" => status_severity = value.into_owned(),
            b"statusMessage" => status_message = value.into_owned(),
            b"iteratorRemainingCount" => {
                remaining = value.parse().map_err(|_| {
                    CodecError::Malformed(format!(
                        "iteratorRemainingCount {value:?} is not a count"
                    ))
                })?;
            }
            b"iteratorID" => cursor = Some(value.into_owned()),
            _ => {}
        }
    }

    if status_severity.eq_ignore_ascii_case("error") {
        return Err(CodecError::Status {
            code: status_code,
            message: status_message,
        });
    }

    Ok(PageView {
        item_count: 0,
        remaining,
        cursor,
    })
}
