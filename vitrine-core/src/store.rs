use std::path::{Path, PathBuf};
use tokio::fs;

/// Probe order for source files. The first existing one wins.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Read-only view over the shop's digit-sharded image tree, where image 123
/// lives at `<root>/1/2/3/123.<ext>`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub path: PathBuf,
    pub extension: &'static str,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the files for `image_id`: one level per decimal digit.
    ///
    /// Panics on `0`, which has no place in the shard tree.
    pub fn shard_dir(&self, image_id: u64) -> PathBuf {
        assert!(image_id > 0, "image id must be positive, got {}", image_id);

        let mut dir = self.root.clone();
        dir.extend(image_id.to_string().chars().map(String::from));
        dir
    }

    /// Every candidate path for `image_id`, in probe order.
    pub fn candidates(&self, image_id: u64) -> Vec<(&'static str, PathBuf)> {
        let dir = self.shard_dir(image_id);
        IMAGE_EXTENSIONS
            .iter()
            .map(|ext| (*ext, dir.join(format!("{}.{}", image_id, ext))))
            .collect()
    }

    /// Finds the source file for `image_id`. A missing image is `None`, not an error.
    pub async fn resolve(&self, image_id: u64) -> Option<ResolvedImage> {
        for (extension, path) in self.candidates(image_id) {
            match fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {
                    tracing::debug!("Resolved image {} -> {}", image_id, path.display());
                    return Some(ResolvedImage { path, extension });
                }
                _ => continue,
            }
        }
        tracing::debug!("No source file for image {} under {}", image_id, self.root.display());
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(path, b"img").await.unwrap();
    }

    #[test]
    fn test_shard_dir_splits_digits() {
        let store = ImageStore::new("/shop/img/p");
        assert_eq!(store.shard_dir(123), PathBuf::from("/shop/img/p/1/2/3"));
        assert_eq!(store.shard_dir(5), PathBuf::from("/shop/img/p/5"));
        assert_eq!(store.shard_dir(1002), PathBuf::from("/shop/img/p/1/0/0/2"));
    }

    #[test]
    fn test_candidates_follow_extension_order() {
        let store = ImageStore::new("/shop/img/p");
        let candidates = store.candidates(42);
        let names: Vec<_> = candidates
            .iter()
            .map(|(_, p)| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["42.jpg", "42.jpeg", "42.png", "42.gif", "42.webp"]);
        assert!(candidates
            .iter()
            .all(|(_, p)| p.parent() == Some(Path::new("/shop/img/p/4/2"))));
    }

    #[test]
    #[should_panic(expected = "image id must be positive")]
    fn test_zero_id_is_rejected() {
        ImageStore::new("/shop/img/p").shard_dir(0);
    }

    #[tokio::test]
    async fn test_resolve_prefers_earlier_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ImageStore::new(tmp.path());
        touch(&tmp.path().join("4/2/42.png")).await;
        touch(&tmp.path().join("4/2/42.webp")).await;

        let resolved = store.resolve(42).await.unwrap();
        assert_eq!(resolved.extension, "png");
        assert_eq!(resolved.path, tmp.path().join("4/2/42.png"));

        touch(&tmp.path().join("4/2/42.jpg")).await;
        assert_eq!(store.resolve(42).await.unwrap().extension, "jpg");
    }

    #[tokio::test]
    async fn test_resolve_missing_and_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ImageStore::new(tmp.path());
        assert_eq!(store.resolve(7).await, None);

        // A directory that happens to carry the file name is not an image.
        fs::create_dir_all(tmp.path().join("7/7.jpg")).await.unwrap();
        assert_eq!(store.resolve(7).await, None);

        touch(&tmp.path().join("7/7.gif")).await;
        assert_eq!(store.resolve(7).await.unwrap().extension, "gif");
    }
}
