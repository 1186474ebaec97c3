//! Selectable puzzle images

/// Default image directory
pub const DEFAULT_BASE_PATH: &str = "assets/images";

const DEFAULT_MANIFEST: [&str; 16] = [
    "PUZZLE1.png",
    "PUZZLE2.png",
    "PUZZLE3.png",
    "PUZZLE4.png",
    "PUZZLE5.png",
    "PUZZLE6.png",
    "PUZZLE7.png",
    "PUZZLE8.png",
    "PUZZLE10.png",
    "PUZZLE11.png",
    "PUZZLE12.png",
    "PUZZLE13.png",
    "PUZZLE14.png",
    "PUZZLE15.png",
    "PUZZLE16.png",
    "PUZZLE79.png",
];

/// Ordered list of image identifiers; the engine never looks inside them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCatalog {
    base_path: String,
    files: Vec<String>,
}

impl Default for ImageCatalog {
    fn default() -> Self {
        Self::new(
            DEFAULT_BASE_PATH,
            DEFAULT_MANIFEST.iter().map(|f| f.to_string()).collect(),
        )
    }
}

impl ImageCatalog {
    pub fn new(base_path: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            base_path: base_path.into().trim_end_matches('/').to_string(),
            files,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Full image URL for an entry
    pub fn url(&self, index: usize) -> Option<String> {
        let file = self.files.get(index)?;
        if self.base_path.is_empty() {
            Some(file.clone())
        } else {
            Some(format!("{}/{}", self.base_path, file))
        }
    }

    /// Every image URL, in manifest order
    pub fn urls(&self) -> Vec<String> {
        (0..self.files.len()).filter_map(|i| self.url(i)).collect()
    }

    /// Bare file name of an entry
    pub fn name(&self, index: usize) -> Option<&str> {
        self.files.get(index).map(String::as_str)
    }

    /// Manifest position of an image URL
    pub fn index_of(&self, url: &str) -> Option<usize> {
        (0..self.files.len()).find(|&i| self.url(i).as_deref() == Some(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let catalog = ImageCatalog::default();
        assert_eq!(catalog.len(), 16);
        assert_eq!(catalog.url(0).as_deref(), Some("assets/images/PUZZLE1.png"));
        assert_eq!(catalog.name(15), Some("PUZZLE79.png"));
        assert_eq!(catalog.index_of("assets/images/PUZZLE10.png"), Some(8));
        assert!(catalog.url(16).is_none());
    }

    #[test]
    fn test_custom_base_path() {
        let catalog = ImageCatalog::new("img/", vec!["a.png".into()]);
        assert_eq!(catalog.urls(), vec!["img/a.png".to_string()]);

        let bare = ImageCatalog::new("", vec!["b.png".into()]);
        assert_eq!(bare.url(0).as_deref(), Some("b.png"));
    }
}
