//! Resolution of mesh and texture references to filesystem paths

use std::path::{Path, PathBuf};

const PACKAGE_PREFIX: &str = "package://";
const FILE_PREFIX: &str = "file://";

/// Turns `package://`, `file://` and relative references into paths
#[derive(Debug, Clone, Default)]
pub struct PackageResolver {
    /// Directory substituted for `package://`
    share_root: Option<PathBuf>,
    /// Directory of the URDF file, for relative references
    base_dir: Option<PathBuf>,
}

impl PackageResolver {
    pub fn new(share_root: Option<PathBuf>, base_dir: Option<PathBuf>) -> Self {
        Self {
            share_root,
            base_dir,
        }
    }

    /// Resolve a reference from a URDF file.
    ///
    /// `package://pkg/file` becomes `<share_root>/pkg/file`. Without a share
    /// root the package path is taken relative to the URDF directory.
    pub fn resolve(&self, reference: &str) -> PathBuf {
        if let Some(rest) = reference.strip_prefix(PACKAGE_PREFIX) {
            let rest = rest.trim_start_matches('/');
            return match (&self.share_root, &self.base_dir) {
                (Some(root), _) => root.join(rest),
                (None, Some(base)) => {
                    tracing::warn!("No share root configured, resolving {} next to the URDF", reference);
                    base.join(rest)
                }
                (None, None) => {
                    tracing::warn!("No share root configured for {}", reference);
                    PathBuf::from(rest)
                }
            };
        }

        let path = Path::new(reference.strip_prefix(FILE_PREFIX).unwrap_or(reference));
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_uri_uses_share_root() {
        let resolver = PackageResolver::new(Some("/opt/ros/share".into()), Some("/robots".into()));
        assert_eq!(
            resolver.resolve("package://pr2_description/meshes/base.dae"),
            PathBuf::from("/opt/ros/share/pr2_description/meshes/base.dae")
        );
    }

    #[test]
    fn test_package_uri_without_share_root() {
        let resolver = PackageResolver::new(None, Some("/robots".into()));
        assert_eq!(
            resolver.resolve("package://arm/meshes/link.stl"),
            PathBuf::from("/robots/arm/meshes/link.stl")
        );
    }

    #[test]
    fn test_file_uri_and_absolute_paths() {
        let resolver = PackageResolver::new(None, Some("/robots".into()));
        assert_eq!(
            resolver.resolve("file:///data/link.stl"),
            PathBuf::from("/data/link.stl")
        );
        assert_eq!(resolver.resolve("/data/link.stl"), PathBuf::from("/data/link.stl"));
    }

    #[test]
    fn test_relative_path_uses_urdf_dir() {
        let resolver = PackageResolver::new(Some("/share".into()), Some("/robots/arm".into()));
        assert_eq!(
            resolver.resolve("meshes/link.stl"),
            PathBuf::from("/robots/arm/meshes/link.stl")
        );

        let bare = PackageResolver::default();
        assert_eq!(bare.resolve("meshes/link.stl"), PathBuf::from("meshes/link.stl"));
    }
}
