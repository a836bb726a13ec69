//! The PackURI value type: a partname within an OPC package.
//!
//! PackURIs always begin with a forward slash and use forward slashes as path
//! separators. They expose the folder (base URI), filename, extension and
//! stem of a partname, and translate between absolute partnames and the
//! relative references stored in `.rels` files.

use crate::ooxml::opc::error::{OpcError, Result};

/// The package pseudo-partname, representing the package itself
pub const PACKAGE_URI: &str = "/";

/// The URI for the [Content_Types].xml part
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    uri: String,
}

impl PackURI {
    /// Create a new PackURI; the string must begin with a forward slash.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(OpcError::InvalidPackUri(format!(
                "PackURI must begin with slash, got '{uri}'"
            )));
        }
        Ok(Self { uri })
    }

    /// The package pseudo-partname `/`.
    pub fn package() -> Self {
        Self {
            uri: PACKAGE_URI.to_string(),
        }
    }

    /// Resolve a relative reference (as stored in a `.rels` file) against a base URI.
    ///
    /// `"../slideLayouts/slideLayout1.xml"` against `"/ppt/slides"` gives
    /// `"/ppt/slideLayouts/slideLayout1.xml"`. A reference that is already
    /// absolute ignores the base.
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self> {
        let joined = if relative_ref.starts_with('/') {
            relative_ref.to_string()
        } else if base_uri.ends_with('/') {
            format!("{base_uri}{relative_ref}")
        } else {
            format!("{base_uri}/{relative_ref}")
        };
        Self::new(normalize(&joined))
    }

    /// Build a partname from a template containing a single `%d`.
    pub fn from_template(template: &str, n: u32) -> Result<Self> {
        if !template.contains("%d") {
            return Err(OpcError::InvalidPackUri(format!(
                "partname template '{template}' has no %d placeholder"
            )));
        }
        Self::new(template.replacen("%d", &n.to_string(), 1))
    }

    pub fn is_package(&self) -> bool {
        self.uri == PACKAGE_URI
    }

    /// Folder portion, e.g. `/ppt/slides` for `/ppt/slides/slide1.xml`.
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Filename portion, e.g. `slide1.xml`. Empty for the package pseudo-partname.
    pub fn filename(&self) -> &str {
        self.uri
            .rfind('/')
            .map(|pos| &self.uri[pos + 1..])
            .unwrap_or("")
    }

    /// Extension without the leading period, e.g. `xml`.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        filename
            .rfind('.')
            .map(|pos| &filename[pos + 1..])
            .unwrap_or("")
    }

    /// Filename without extension and without a trailing numeric index.
    ///
    /// `slideLayout12` for `/ppt/slideLayouts/slideLayout12.xml`.
    pub fn stem(&self) -> &str {
        let filename = self.filename();
        let name = filename
            .rfind('.')
            .map(|pos| &filename[..pos])
            .unwrap_or(filename);
        name.trim_end_matches(|c: char| c.is_ascii_digit())
    }

    /// ZIP member name: the URI without its leading slash.
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// The reference from `base_uri` to this partname, as written in `.rels` files.
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == PACKAGE_URI {
            return self.membername().to_string();
        }

        let from: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();
        let common = from
            .iter()
            .zip(to.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut segments: Vec<&str> = Vec::with_capacity(from.len() - common + to.len() - common);
        segments.extend(std::iter::repeat_n("..", from.len() - common));
        segments.extend(&to[common..]);
        segments.join("/")
    }

    /// Partname of the `.rels` part holding this part's relationships.
    ///
    /// `/ppt/slides/_rels/slide1.xml.rels` for `/ppt/slides/slide1.xml`.
    pub fn rels_uri(&self) -> Result<PackURI> {
        let base_uri = self.base_uri();
        let filename = self.filename();
        if base_uri == PACKAGE_URI {
            Self::new(format!("/_rels/{filename}.rels"))
        } else {
            Self::new(format!("{base_uri}/_rels/{filename}.rels"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

/// Resolve `.` and `..` segments of an absolute path.
fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packuri_new() {
        assert!(PackURI::new("/ppt/presentation.xml").is_ok());
        assert!(PackURI::new("ppt/presentation.xml").is_err());
    }

    #[test]
    fn test_components() {
        let uri = PackURI::new("/ppt/slideLayouts/slideLayout12.xml").unwrap();
        assert_eq!(uri.base_uri(), "/ppt/slideLayouts");
        assert_eq!(uri.filename(), "slideLayout12.xml");
        assert_eq!(uri.ext(), "xml");
        assert_eq!(uri.stem(), "slideLayout");
        assert_eq!(uri.membername(), "ppt/slideLayouts/slideLayout12.xml");

        let single = PackURI::new("/ppt/presentation.xml").unwrap();
        assert_eq!(single.stem(), "presentation");
        assert_eq!(PackURI::package().base_uri(), "/");
        assert_eq!(PackURI::package().filename(), "");
    }

    #[test]
    fn test_rel_ref_round_trip() {
        let resolved =
            PackURI::from_rel_ref("/ppt/slides", "../slideLayouts/slideLayout1.xml").unwrap();
        assert_eq!(resolved.as_str(), "/ppt/slideLayouts/slideLayout1.xml");
        assert_eq!(
            resolved.relative_ref("/ppt/slides"),
            "../slideLayouts/slideLayout1.xml"
        );

        let sibling = PackURI::new("/ppt/slides/slide2.xml").unwrap();
        assert_eq!(sibling.relative_ref("/ppt/slides"), "slide2.xml");

        let top = PackURI::new("/ppt/presentation.xml").unwrap();
        assert_eq!(top.relative_ref("/"), "ppt/presentation.xml");
    }

    #[test]
    fn test_absolute_reference_ignores_base() {
        let resolved = PackURI::from_rel_ref("/ppt/slides", "/ppt/media/image1.png").unwrap();
        assert_eq!(resolved.as_str(), "/ppt/media/image1.png");
    }

    #[test]
    fn test_rels_uri() {
        let uri = PackURI::new("/ppt/slides/slide1.xml").unwrap();
        assert_eq!(
            uri.rels_uri().unwrap().as_str(),
            "/ppt/slides/_rels/slide1.xml.rels"
        );
        assert_eq!(PackURI::package().rels_uri().unwrap().as_str(), "/_rels/.rels");
    }

    #[test]
    fn test_from_template() {
        let uri = PackURI::from_template("/ppt/media/image%d.png", 3).unwrap();
        assert_eq!(uri.as_str(), "/ppt/media/image3.png");
        assert!(PackURI::from_template("/ppt/media/image.png", 3).is_err());
    }
}
