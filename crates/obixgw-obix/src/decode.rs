//! Decoding of OBIX read replies.
//!
//! A read of `.../Present_Value/` returns a single OBIX object whose tag
//! gives the value type:
//!
//! ```xml
//! <real val="21.5" unit="obix:units/celsius" href="..."/>
//! <bool val="true"/>
//! <err is="obix:BadUriErr" display="Point not found"/>
//! ```
//!
//! Namespace prefixes are ignored.

use std::collections::HashMap;

use obixgw_core::{PointReading, PointValue};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::RemoteReadError;

/// Decode the first OBIX object of a reply body.
pub fn decode_reply(xml: &str) -> Result<PointReading, RemoteReadError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => return decode_object(&e),
            Ok(Event::Eof) => return Err(RemoteReadError::Decode("empty reply".to_string())),
            Ok(_) => {}
            Err(e) => return Err(RemoteReadError::Decode(e.to_string())),
        }
    }
}

fn decode_object(e: &BytesStart<'_>) -> Result<PointReading, RemoteReadError> {
    let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let attrs = attributes(e)?;

    let value = match tag.as_str() {
        "real" | "int" => {
            let raw = required(&attrs, &tag, "val")?;
            let n = raw.trim().parse::<f64>().map_err(|err| {
                RemoteReadError::Decode(format!("invalid <{tag}> value \"{raw}\": {err}"))
            })?;
            PointValue::Number(n)
        }
        "bool" => PointValue::Bool(required(&attrs, &tag, "val")?.eq_ignore_ascii_case("true")),
        "str" => PointValue::Text(required(&attrs, &tag, "val")?.to_string()),
        "enum" => PointValue::Enum(required(&attrs, &tag, "val")?.to_string()),
        "err" => return Err(RemoteReadError::Gateway(error_message(&attrs))),
        _ => return Err(RemoteReadError::UnexpectedTag(tag)),
    };

    let unit = attrs
        .get("unit")
        .and_then(|u| u.rsplit('/').next())
        .filter(|u| !u.is_empty())
        .map(str::to_string);

    Ok(PointReading { value, unit })
}

fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>, RemoteReadError> {
    let mut out = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| RemoteReadError::Decode(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| RemoteReadError::Decode(err.to_string()))?
            .into_owned();
        out.insert(key, value);
    }
    Ok(out)
}

fn required<'a>(
    attrs: &'a HashMap<String, String>,
    tag: &str,
    name: &str,
) -> Result<&'a str, RemoteReadError> {
    attrs
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| RemoteReadError::Decode(format!("<{tag}> has no {name} attribute")))
}

/// Human readable text of an `<err>` object: its `display` attribute,
/// else the last segment of its contract (`obix:BadUriErr` → `BadUriErr`).
fn error_message(attrs: &HashMap<String, String>) -> String {
    if let Some(display) = attrs.get("display") {
        return display.clone();
    }
    attrs
        .get("is")
        .and_then(|is| is.rsplit(':').next())
        .map_or_else(|| "unspecified error".to_string(), str::to_string)
}
