use std::{
    cell::RefCell,
    collections::HashMap,
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Fetches raw bytes for an absolute URL.
#[allow(async_fn_in_trait)]
pub trait AssetSource {
    type Error: Error;

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound(pub String);

impl Display for NotFound {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Resource {} not found", self.0)
    }
}

impl Error for NotFound {}

/// In-memory files keyed by URL.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(url, data);
        self
    }

    pub fn insert(&self, url: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.files.borrow_mut().insert(url.into(), data.into());
    }

    pub fn remove(&self, url: &str) -> bool {
        self.files.borrow_mut().remove(url).is_some()
    }
}

impl AssetSource for MemorySource {
    type Error = NotFound;

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, NotFound> {
        self.files
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| NotFound(url.to_string()))
    }
}

#[cfg(feature = "fs")]
pub use file::FileSource;

#[cfg(feature = "fs")]
mod file {
    use std::{
        io,
        path::{Component, Path, PathBuf},
    };

    use log::trace;

    use super::AssetSource;

    /// Reads `file://` URLs and plain paths from the local file system.
    #[derive(Debug, Clone, Default)]
    pub struct FileSource;

    impl FileSource {
        /// Local path of a `file://` URL, percent-decoded. Anything else is
        /// taken as a path verbatim.
        pub fn path(url: &str) -> PathBuf {
            let Some(path) = url.strip_prefix("file://") else {
                return PathBuf::from(url);
            };
            let path = path.strip_prefix("localhost").unwrap_or(path);
            let path = path
                .split(|c| c == '?' || c == '#')
                .next()
                .unwrap_or(path);
            let decoded = urlencoding::decode_binary(path.as_bytes());
            PathBuf::from(String::from_utf8_lossy(&decoded).into_owned())
        }

        /// `file://` URL of an absolute path, each segment percent-encoded.
        pub fn url(path: &Path) -> String {
            let mut url = String::from("file://");
            for component in path.components() {
                match component {
                    Component::Prefix(prefix) => {
                        url.push('/');
                        url.push_str(&prefix.as_os_str().to_string_lossy());
                    }
                    Component::RootDir | Component::CurDir => {}
                    Component::ParentDir => url.push_str("/.."),
                    Component::Normal(segment) => {
                        url.push('/');
                        url.push_str(&urlencoding::encode(&segment.to_string_lossy()));
                    }
                }
            }
            if url.len() == "file://".len() {
                url.push('/');
            }
            url
        }
    }

    impl AssetSource for FileSource {
        type Error = io::Error;

        async fn fetch(&self, url: &str) -> Result<Vec<u8>, io::Error> {
            let path = Self::path(url);
            trace!("Read {}", path.display());
            tokio::fs::read(path).await
        }
    }
}

#[cfg(test)]
mod test {
    use super::{AssetSource, MemorySource, NotFound};

    #[test]
    fn memory_source() {
        let source = MemorySource::new().with("https://x/a.bin", vec![1, 2, 3]);
        assert_eq!(
            pollster::block_on(source.fetch("https://x/a.bin")),
            Ok(vec![1, 2, 3])
        );
        assert!(source.remove("https://x/a.bin"));
        assert_eq!(
            pollster::block_on(source.fetch("https://x/a.bin")),
            Err(NotFound(String::from("https://x/a.bin")))
        );
    }

    #[cfg(feature = "fs")]
    #[tokio::test]
    async fn file_source_reads_file_urls() {
        use super::FileSource;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.obj");
        tokio::fs::write(&path, b"v 0 0 0\n").await.unwrap();

        let url = FileSource::url(&path);
        let data = FileSource.fetch(&url).await.unwrap();
        assert_eq!(data, b"v 0 0 0\n");

        let plain = FileSource.fetch(&path.display().to_string()).await.unwrap();
        assert_eq!(plain, data);

        assert!(FileSource.fetch(&format!("{}.missing", url)).await.is_err());
    }

    #[cfg(feature = "fs")]
    #[test]
    fn file_urls_to_paths() {
        use std::path::PathBuf;

        use super::FileSource;

        assert_eq!(FileSource::path("file:///srv/a.obj"), PathBuf::from("/srv/a.obj"));
        assert_eq!(
            FileSource::path("file://localhost/srv/my%20model.glb?x=1"),
            PathBuf::from("/srv/my model.glb")
        );
        assert_eq!(FileSource::path("models/a.obj"), PathBuf::from("models/a.obj"));
        assert_eq!(
            FileSource::path("file:///srv/scan%231/100%2520off.obj"),
            PathBuf::from("/srv/scan#1/100%20off.obj")
        );
        assert_eq!(FileSource::path("models/100%20off.obj"), PathBuf::from("models/100%20off.obj"));
    }

    #[cfg(feature = "fs")]
    #[test]
    fn paths_to_file_urls() {
        use std::path::Path;

        use super::FileSource;

        assert_eq!(
            FileSource::url(Path::new("/srv/scan#1/my model?.glb")),
            "file:///srv/scan%231/my%20model%3F.glb"
        );
        assert_eq!(FileSource::url(Path::new("/")), "file:///");
    }

    #[cfg(feature = "fs")]
    #[tokio::test]
    async fn reserved_characters_in_file_names() {
        use super::FileSource;
        use crate::loader::url::RootUrl;

        let dir = tempfile::tempdir().unwrap();
        let item = dir.path().join("scan#1");
        tokio::fs::create_dir(&item).await.unwrap();
        tokio::fs::write(item.join("doc.json"), b"{}").await.unwrap();
        tokio::fs::write(item.join("100%20off.obj"), b"v 1 2 3\n").await.unwrap();
        tokio::fs::write(item.join("100 off.obj"), b"v 0 0 0\n").await.unwrap();

        let document = FileSource::url(&item.join("doc.json"));
        let root = RootUrl::from_location(&document);
        assert!(root.as_str().ends_with("/scan%231/"), "{}", root);
        assert_eq!(FileSource.fetch(&document).await.unwrap(), b"{}");

        let literal = FileSource.fetch(&root.resolve("100%2520off.obj")).await.unwrap();
        assert_eq!(literal, b"v 1 2 3\n");
        let spaced = FileSource.fetch(&root.resolve("100%20off.obj")).await.unwrap();
        assert_eq!(spaced, b"v 0 0 0\n");
    }
}
