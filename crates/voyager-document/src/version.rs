use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

pub const DOCUMENT_MIME_TYPE: &str = "application/si-dpo-3d.document+json";
pub const DOCUMENT_VERSION: &str = "1.0";

/// Header identifying a persisted document and what wrote it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AssetInfo {
    #[serde(rename = "type")]
    pub mime_type: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
}

impl AssetInfo {
    pub fn current() -> Self {
        const VERSION: &str = env!("CARGO_PKG_VERSION");
        Self {
            mime_type: String::from(DOCUMENT_MIME_TYPE),
            version: String::from(DOCUMENT_VERSION),
            generator: Some(format!("voyager-rs {}", VERSION)),
        }
    }

    pub fn major_version(&self) -> Option<u32> {
        self.version.split('.').next()?.parse().ok()
    }
}

impl Default for AssetInfo {
    fn default() -> Self {
        Self::current()
    }
}

impl Display for AssetInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.mime_type, self.version)?;
        if let Some(generator) = &self.generator {
            write!(f, " ({})", generator)?;
        }
        Ok(())
    }
}
