//! Result-document attribute decoding
//!
//! Policy records mix two shapes inside one array: bare values (plain group
//! name strings) and structured `{attribute, op, value}` documents. The
//! decoder disambiguates per element, preserving array order among the
//! elements that survive.

use crate::error::Result;
use crate::types::{AttributeList, Operator, PolicyAttribute};
use serde_json::Value;
use tracing::{debug, error, warn};

/// Decode one array-typed result field into policy attributes, appending to
/// `out`.
///
/// Malformed individual elements are logged and dropped. The one escalation
/// is a failed attribute construction inside a structured element: that
/// aborts the whole decode with an error, keeping whatever was already
/// accumulated.
pub fn decode_policy_array(
    items: &[Value],
    default_attr: Option<&str>,
    out: &mut AttributeList,
) -> Result<()> {
    for item in items {
        let doc = match item {
            Value::Object(doc) => doc,
            other => {
                decode_bare_value(other, default_attr, out);
                continue;
            }
        };

        // Scan the string-valued fields; other keys and unexpected types are
        // ignored rather than erroring.
        let mut attribute = None;
        let mut op = None;
        let mut value = None;
        for (key, field) in doc {
            let Value::String(text) = field else { continue };
            match key.as_str() {
                "attribute" => attribute = Some(text.as_str()),
                "op" => op = Some(text.as_str()),
                "value" => value = Some(text.as_str()),
                _ => {}
            }
        }

        let Some(attribute) = attribute.filter(|name| !name.is_empty()) else {
            error!("the 'attribute' field is empty or missing, skipping");
            continue;
        };

        let operator = match op.filter(|token| !token.is_empty()) {
            Some(token) => match token.parse::<Operator>() {
                Ok(operator) => operator,
                Err(_) => {
                    error!(attribute, op = token, "invalid operator for attribute, skipping");
                    continue;
                }
            },
            None => {
                warn!(
                    attribute,
                    "the 'op' field is missing or empty, defaulting to '=='; \
                     fix the record if you want the configuration to behave as you expect"
                );
                Operator::CmpEq
            }
        };

        match PolicyAttribute::new(attribute, operator, value.unwrap_or("")) {
            Ok(pair) => out.push(pair),
            Err(err) => {
                error!(error = %err, "failed to create the pair");
                return Err(err);
            }
        }
    }
    Ok(())
}

/// A non-document array element carries a bare value. With a default
/// attribute name and a string value it becomes a `==` comparison pair;
/// anything else contributes nothing.
fn decode_bare_value(item: &Value, default_attr: Option<&str>, out: &mut AttributeList) {
    let Some(name) = default_attr else {
        debug!("bare value with no default attribute name, skipping");
        return;
    };
    match item {
        Value::String(text) => match PolicyAttribute::new(name, Operator::CmpEq, text.as_str()) {
            Ok(pair) => out.push(pair),
            Err(err) => error!(error = %err, "failed to create the pair"),
        },
        _ => error!(
            attribute = name,
            "unsupported non-string value outside an attribute-value document"
        ),
    }
}
