use std::fmt::{self, Display, Formatter};

/// True for `scheme:` prefixed URIs. Single letters are treated as drive
/// letters, not schemes.
pub fn has_scheme(uri: &str) -> bool {
    let Some((scheme, _)) = uri.split_once(':') else {
        return false;
    };
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn split_suffix(url: &str) -> (&str, &str) {
    match url.find(|c| c == '?' || c == '#') {
        Some(index) => url.split_at(index),
        None => (url, ""),
    }
}

/// Splits `scheme://authority` from the path.
fn split_origin(url: &str) -> (&str, &str) {
    if let Some(index) = url.find("://") {
        let authority_start = index + 3;
        let path_start = url[authority_start..]
            .find('/')
            .map_or(url.len(), |offset| authority_start + offset);
        url.split_at(path_start)
    } else {
        ("", url)
    }
}

fn directory(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..=index],
        None => "",
    }
}

/// Collapses `.`, `..` and empty segments.
fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let trailing = path.ends_with('/')
        || path.ends_with("/.")
        || path.ends_with("/..")
        || path == "."
        || path == "..";

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ if !absolute => segments.push(".."),
                _ => {}
            },
            segment => segments.push(segment),
        }
    }

    let mut normalized = String::new();
    if absolute {
        normalized.push('/');
    }
    normalized.push_str(&segments.join("/"));
    if trailing && !segments.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Resolves `reference` against `base` the way a browser resolves a link
/// against the page it appears on.
pub fn resolve_reference(base: &str, reference: &str) -> String {
    if has_scheme(reference) {
        return reference.to_string();
    }
    if reference.is_empty() {
        return base.to_string();
    }
    if let Some(authority) = reference.strip_prefix("//") {
        let scheme = base.split_once(':').map_or("", |(scheme, _)| scheme);
        return format!("{}://{}", scheme, authority);
    }

    let (base, _) = split_suffix(base);
    let (origin, base_path) = split_origin(base);
    let (reference_path, suffix) = split_suffix(reference);

    let mut path = if reference_path.starts_with('/') {
        reference_path.to_string()
    } else {
        format!("{}{}", directory(base_path), reference_path)
    };
    if !origin.is_empty() && !path.starts_with('/') {
        path.insert(0, '/');
    }

    format!("{}{}{}", origin, normalize(&path), suffix)
}

/// Appends an asset URI to a derivative base path. URIs with a scheme and
/// rooted URIs are returned unchanged.
pub fn join_path(base_path: &str, uri: &str) -> String {
    if base_path.is_empty() || has_scheme(uri) || uri.starts_with('/') {
        uri.to_string()
    } else if base_path.ends_with('/') {
        format!("{}{}", base_path, uri)
    } else {
        format!("{}/{}", base_path, uri)
    }
}

/// Absolute URL all relative asset paths are resolved against. Always ends
/// with a slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootUrl(String);

impl RootUrl {
    pub fn new(root: &str) -> Self {
        let mut root = root.to_string();
        if !root.ends_with('/') {
            root.push('/');
        }
        Self(root)
    }

    /// Root derived from a page location: the directory of the page, without
    /// query or fragment.
    pub fn from_location(location: &str) -> Self {
        let (location, _) = split_suffix(location);
        let (origin, path) = split_origin(location);
        Self::new(&format!("{}{}", origin, directory(path)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn resolve(&self, path: &str) -> String {
        resolve_reference(&self.0, path)
    }
}

impl Display for RootUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}
