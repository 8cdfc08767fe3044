//! Wire shape of a design as fetched from and uploaded to the game servers.
//!
//! ```json
//! {
//!   "mMeta": { "mMtUse": 99, "mMtDNm": "Flag", "mMtVNm": "Isle", "mMtPro": false },
//!   "mData": {
//!     "mPalette": { "0": 4278190335 },
//!     "mData": { "0": [0, 255, 15, ...] }
//!   },
//!   "author_id": 1234,
//!   "author_name": "Sam",
//!   "created_at": 1588291200,
//!   "updated_at": 1588291200
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Design metadata block (`mMeta`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Variant type code
    #[serde(rename = "mMtUse")]
    pub type_code: u32,
    #[serde(rename = "mMtDNm", default)]
    pub design_name: String,
    #[serde(rename = "mMtVNm", default)]
    pub island_name: String,
    #[serde(rename = "mMtPro", default)]
    pub pro: bool,
}

/// Pixel payload (`mData`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentData {
    /// Palette index → `0xRRGGBBAA`
    #[serde(rename = "mPalette", default)]
    pub palette: BTreeMap<String, u32>,
    /// Layer index → packed nibble bytes
    #[serde(rename = "mData", default)]
    pub layers: BTreeMap<String, Vec<u8>>,
}

/// A complete design document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDocument {
    #[serde(rename = "mMeta")]
    pub meta: DocumentMeta,
    #[serde(rename = "mData")]
    pub data: DocumentData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    /// Unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl DesignDocument {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
