use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Id of the `<script>` element carrying the serialised map.
pub const CHAR_MAP_SCRIPT_ID: &str = "char-map";

static EMBEDDED_MAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script type="application/json" id="char-map">(.*?)</script>"#)
        .expect("valid char map pattern")
});

/// Wrapper id → source char offset of each rendered character.
///
/// Offsets index the source line named by the wrapper's `data-src-line`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharMap(BTreeMap<String, Vec<usize>>);

impl CharMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, offsets: Vec<usize>) {
        self.0.insert(id.into(), offsets);
    }

    pub fn get(&self, id: &str) -> Option<&[usize]> {
        self.0.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The `<script>` element hosts read the map back from.
    pub fn to_script(&self) -> Result<String, serde_json::Error> {
        // `</` would end the script element early.
        let json = self.to_json()?.replace("</", "<\\/");
        Ok(format!(
            r#"<script type="application/json" id="{CHAR_MAP_SCRIPT_ID}">{json}</script>"#
        ))
    }

    /// Recovers a map embedded with [`CharMap::to_script`].
    ///
    /// Returns `Ok(None)` when the html carries no map.
    pub fn from_embedded(html: &str) -> Result<Option<Self>, serde_json::Error> {
        match EMBEDDED_MAP.captures(html).and_then(|c| c.get(1)) {
            Some(json) => serde_json::from_str(json.as_str()).map(Some),
            None => Ok(None),
        }
    }
}

/// Render-scoped counter producing `prefix-1`, `prefix-2`, ...
#[derive(Debug, Clone)]
pub struct IdSequence {
    prefix: &'static str,
    next: usize,
}

impl IdSequence {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, next: 1 }
    }

    pub fn wrappers() -> Self {
        Self::new("cw")
    }

    pub fn images() -> Self {
        Self::new("img")
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
