use lambda_http::http::Uri;
use std::fmt;

use super::model::ProjectImage;

/// Path component that precedes the escaped object key in a public
/// download url, e.g. `/v0/b/{bucket}/o/project-images%2F42%2Fa.webp`.
const OBJECT_MARKER: &str = "/o/";

/// Outcome of resolving the object key behind an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetPath {
    Resolved(String),
    Unresolvable(Unresolvable),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolvable {
    InvalidUrl,
    MissingMarker,
    EmptyPath,
    BadEscape,
}

impl fmt::Display for Unresolvable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unresolvable::InvalidUrl => write!(f, "url does not parse"),
            Unresolvable::MissingMarker => write!(f, "url path has no object segment"),
            Unresolvable::EmptyPath => write!(f, "object segment is empty"),
            Unresolvable::BadEscape => write!(f, "object segment is not validly escaped"),
        }
    }
}

/// Object key to delete for `image`.
///
/// A stored `storage_path` wins unconditionally. Otherwise the key is
/// recovered from the download url; anything that cannot be recovered is
/// reported as [`AssetPath::Unresolvable`] rather than an error.
pub fn resolve_asset_path(image: &ProjectImage) -> AssetPath {
    if !image.storage_path.is_empty() {
        return AssetPath::Resolved(image.storage_path.clone());
    }

    match path_from_url(&image.url) {
        Ok(path) => AssetPath::Resolved(path),
        Err(reason) => AssetPath::Unresolvable(reason),
    }
}

fn path_from_url(url: &str) -> Result<String, Unresolvable> {
    let uri: Uri = url.parse().map_err(|_| Unresolvable::InvalidUrl)?;

    let (_, escaped) = uri
        .path()
        .split_once(OBJECT_MARKER)
        .ok_or(Unresolvable::MissingMarker)?;

    if escaped.is_empty() {
        return Err(Unresolvable::EmptyPath);
    }

    let path = unescape(escaped).ok_or(Unresolvable::BadEscape)?;
    if path.is_empty() {
        return Err(Unresolvable::EmptyPath);
    }
    Ok(path)
}

/// Query-style unescape: `%XX` becomes the byte, `+` becomes a space.
fn unescape(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes.get(i + 1..i + 3)?;
                if !hex.iter().all(u8::is_ascii_hexdigit) {
                    return None;
                }
                let hex = std::str::from_utf8(hex).ok()?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).ok()
}
