use serde::Deserialize;

/// One catalog item: a website listing. Immutable once loaded; the catalog
/// owns every entry for the lifetime of the process.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Entry {
    pub id: u32,               // Unique across the catalog
    pub name: String,          // Display name
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,          // Emoji glyph or an image path
    pub category: String,      // Machine slug (e.g. "search-engines")
    #[serde(rename = "categoryName")]
    pub category_name: String, // Display label (e.g. "Search Engines")
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Top-level shape of the catalog document.
#[derive(Debug, Deserialize)]
pub struct CatalogDoc {
    pub websites: Vec<Entry>,
}

impl Entry {
    /// Host part of the url, for the card footer. Good enough for display;
    /// never used for navigation.
    pub fn url_host(&self) -> &str {
        let rest = self
            .url
            .split_once("://")
            .map(|(_, r)| r)
            .unwrap_or(&self.url);
        rest.split(['/', '?', '#']).next().unwrap_or(rest)
    }

    /// Whether the icon string names an image file rather than a glyph.
    pub fn icon_is_image(&self) -> bool {
        let lower = self.icon.to_ascii_lowercase();
        lower.ends_with(".png")
            || lower.ends_with(".svg")
            || lower.ends_with(".jpg")
            || lower.ends_with(".jpeg")
            || lower.ends_with(".ico")
    }
}
