use serde_json::{Map, Value};
use voyager_document::version::DOCUMENT_MIME_TYPE;

/// Checks a parsed document before it is deserialized. The error is a
/// message for humans.
pub trait DocumentValidator {
    fn validate(&self, document: &Value) -> Result<(), String>;
}

impl<F: Fn(&Value) -> Result<(), String>> DocumentValidator for F {
    fn validate(&self, document: &Value) -> Result<(), String> {
        self(document)
    }
}

/// Structural checks for the document format. Errors name the offending
/// value by JSON pointer.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    /// Also reject documents whose `asset.type` is not the document MIME type.
    pub strict_mime_type: bool,
}

fn object<'a>(value: &'a Value, pointer: &str) -> Result<&'a Map<String, Value>, String> {
    value
        .as_object()
        .ok_or_else(|| format!("{} must be an object", display_pointer(pointer)))
}

fn array<'a>(value: &'a Value, pointer: &str) -> Result<&'a Vec<Value>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("{} must be an array", display_pointer(pointer)))
}

fn string<'a>(value: &'a Value, pointer: &str) -> Result<&'a str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("{} must be a string", display_pointer(pointer)))
}

fn optional_string(parent: &Map<String, Value>, key: &str, pointer: &str) -> Result<(), String> {
    match parent.get(key) {
        Some(value) => string(value, &format!("{}/{}", pointer, key)).map(|_| ()),
        None => Ok(()),
    }
}

fn display_pointer(pointer: &str) -> &str {
    if pointer.is_empty() {
        "document"
    } else {
        pointer
    }
}

impl SchemaValidator {
    fn validate_asset(&self, asset: &Value, pointer: &str) -> Result<(), String> {
        let asset = object(asset, pointer)?;
        let uri_pointer = format!("{}/uri", pointer);
        let uri = asset
            .get("uri")
            .ok_or_else(|| format!("{} is missing", uri_pointer))?;
        if string(uri, &uri_pointer)?.is_empty() {
            return Err(format!("{} must not be empty", uri_pointer));
        }
        string(
            asset
                .get("type")
                .ok_or_else(|| format!("{}/type is missing", pointer))?,
            &format!("{}/type", pointer),
        )?;
        optional_string(asset, "mapType", pointer)?;
        optional_string(asset, "mimeType", pointer)?;
        for key in ["byteSize", "numFaces", "imageSize"] {
            if let Some(value) = asset.get(key) {
                if !value.is_u64() {
                    return Err(format!(
                        "{}/{} must be a non-negative integer",
                        pointer, key
                    ));
                }
            }
        }
        Ok(())
    }

    fn validate_derivative(&self, derivative: &Value, pointer: &str) -> Result<(), String> {
        let derivative = object(derivative, pointer)?;
        optional_string(derivative, "usage", pointer)?;
        optional_string(derivative, "quality", pointer)?;
        if let Some(assets) = derivative.get("assets") {
            let assets_pointer = format!("{}/assets", pointer);
            for (index, asset) in array(assets, &assets_pointer)?.iter().enumerate() {
                self.validate_asset(asset, &format!("{}/{}", assets_pointer, index))?;
            }
        }
        Ok(())
    }

    fn validate_item(&self, item: &Value, pointer: &str) -> Result<(), String> {
        let item = object(item, pointer)?;
        optional_string(item, "id", pointer)?;
        optional_string(item, "name", pointer)?;
        optional_string(item, "units", pointer)?;
        if let Some(matrix) = item.get("matrix") {
            let matrix_pointer = format!("{}/matrix", pointer);
            let matrix = array(matrix, &matrix_pointer)?;
            if matrix.len() != 16 || !matrix.iter().all(Value::is_number) {
                return Err(format!("{} must be an array of 16 numbers", matrix_pointer));
            }
        }
        if let Some(derivatives) = item.get("derivatives") {
            let derivatives_pointer = format!("{}/derivatives", pointer);
            for (index, derivative) in array(derivatives, &derivatives_pointer)?.iter().enumerate()
            {
                self.validate_derivative(derivative, &format!("{}/{}", derivatives_pointer, index))?;
            }
        }
        Ok(())
    }
}

impl DocumentValidator for SchemaValidator {
    fn validate(&self, document: &Value) -> Result<(), String> {
        let root = object(document, "")?;

        let asset = root
            .get("asset")
            .ok_or_else(|| String::from("/asset is missing"))?;
        let asset = object(asset, "/asset")?;
        let mime_type = string(
            asset
                .get("type")
                .ok_or_else(|| String::from("/asset/type is missing"))?,
            "/asset/type",
        )?;
        string(
            asset
                .get("version")
                .ok_or_else(|| String::from("/asset/version is missing"))?,
            "/asset/version",
        )?;
        optional_string(asset, "generator", "/asset")?;
        if self.strict_mime_type && mime_type != DOCUMENT_MIME_TYPE {
            return Err(format!(
                "/asset/type must be {}, found {}",
                DOCUMENT_MIME_TYPE, mime_type
            ));
        }

        optional_string(root, "units", "")?;
        if let Some(items) = root.get("items") {
            for (index, item) in array(items, "/items")?.iter().enumerate() {
                self.validate_item(item, &format!("/items/{}", index))?;
            }
        }
        Ok(())
    }
}
