//! Typed parsing of host-element attributes.

use std::sync::Arc;

use serde_json::{json, Value};
use weft_core::{transform_fn, Transform, TransformError};

/// Type a transformer expects to parse out of a serialized attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    /// Carried through verbatim.
    String,
    /// Bare or `"true"`/`"false"`; an absent attribute parses as `false`.
    Bool,
    /// Parsed as `i64`.
    Int,
    /// Parsed as `f64`.
    Float,
}

/// Parse the declared subset of host attributes into props.
///
/// Attributes are the serialized form of a typed props surface; this stage
/// is the parse side of that contract. A declared attribute that is present
/// but does not parse as its declared type aborts the pass.
pub fn attrs<I, K>(schema: I) -> Arc<dyn Transform>
where
    I: IntoIterator<Item = (K, AttrType)>,
    K: Into<String>,
{
    let schema: Arc<Vec<(String, AttrType)>> = Arc::new(
        schema
            .into_iter()
            .map(|(name, ty)| (name.into(), ty))
            .collect(),
    );

    transform_fn(move |props| {
        let schema = Arc::clone(&schema);
        async move {
            let mut parsed = Vec::new();
            for (name, ty) in schema.iter() {
                match props.attrs().get(name) {
                    Some(raw) => parsed.push((name.clone(), parse_attr(name, raw, *ty)?)),
                    // Missing boolean attributes are false; anything else
                    // declared but absent is simply not contributed.
                    None if *ty == AttrType::Bool => parsed.push((name.clone(), json!(false))),
                    None => {}
                }
            }

            let mut props = props;
            for (name, value) in parsed {
                props.insert(name, value);
            }
            Ok(props)
        }
    })
}

fn parse_attr(name: &str, raw: &str, ty: AttrType) -> Result<Value, TransformError> {
    match ty {
        AttrType::String => Ok(json!(raw)),
        AttrType::Bool => match raw {
            "" | "true" => Ok(json!(true)),
            "false" => Ok(json!(false)),
            _ => Err(TransformError::new(format!(
                "attribute '{name}' is not a boolean: '{raw}'"
            ))),
        },
        AttrType::Int => raw.parse::<i64>().map(|n| json!(n)).map_err(|_| {
            TransformError::new(format!("attribute '{name}' is not an integer: '{raw}'"))
        }),
        AttrType::Float => raw.parse::<f64>().map(|n| json!(n)).map_err(|_| {
            TransformError::new(format!("attribute '{name}' is not a number: '{raw}'"))
        }),
    }
}
