use serde::{Deserialize, Serialize};

/// Client-side attribute used by remote config to target flag values
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientFeature {
    pub name: String,
    pub value: String,
}

impl ClientFeature {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
