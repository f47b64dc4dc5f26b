use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A course as returned by the favourites endpoint (the fields we use).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
}

/// Canvas sends numeric ids; some proxies and tests send strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Num(u64),
        Str(String),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Num(n) => n.to_string(),
        Id::Str(s) => s,
    })
}

/// Phase-1 response: where to POST the file and which fields to echo back.
///
/// `upload_params` keeps the server's key order.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSession {
    pub upload_url: String,
    pub upload_params: Map<String, Value>,
}

impl UploadSession {
    /// The form fields to send ahead of the file, in server order.
    ///
    /// String values are sent verbatim; other JSON values use their JSON text
    /// and `null` becomes an empty field.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        self.upload_params
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect()
    }
}

/// Phase-2 response body describing the stored file, kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadedFile(Value);

impl UploadedFile {
    /// Stored file name: `name`, else `display_name`, else `filename`.
    pub fn name(&self) -> Option<&str> {
        ["name", "display_name", "filename"]
            .iter()
            .find_map(|key| self.0.get(key).and_then(Value::as_str))
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_json(self) -> Value {
        self.0
    }
}
