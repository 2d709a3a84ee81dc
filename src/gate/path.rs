//! Request path extraction and document-root resolution

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Where a resolved path lands relative to the canonical document root
#[derive(Debug, PartialEq, Eq)]
pub enum Confinement {
    /// Canonical path under the root
    Inside(PathBuf),
    /// Exists, but resolves outside the root
    Outside(PathBuf),
    /// Cannot be canonicalized (usually missing)
    Unresolved,
}

/// Path component of a raw request URI
///
/// Drops the fragment, the query string and an absolute-form
/// `scheme://authority` prefix. No percent-decoding is applied.
pub fn request_path(raw_uri: &str) -> &str {
    let end = raw_uri.find(['?', '#']).unwrap_or(raw_uri.len());
    let mut path = &raw_uri[..end];

    if !path.starts_with('/') {
        if let Some(scheme_end) = path.find("://") {
            let rest = &path[scheme_end + 3..];
            path = rest.find('/').map_or("", |i| &rest[i..]);
        }
    }

    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// Concatenate the document root and a request path
///
/// This is plain concatenation: `..` segments and symlinks are left as-is.
pub fn resolve(document_root: &Path, request_path: &str) -> PathBuf {
    let mut joined = OsString::from(document_root.as_os_str());
    let root_has_slash = joined.to_string_lossy().ends_with('/');
    let path = if root_has_slash {
        request_path.strip_prefix('/').unwrap_or(request_path)
    } else {
        request_path
    };
    joined.push(path);
    PathBuf::from(joined)
}

/// Whether the path ends in one of the script extensions, ignoring case
///
/// Extensions are given without the leading dot and in lower case.
pub fn has_script_extension(path: &Path, extensions: &[String]) -> bool {
    let lossy = path.to_string_lossy().to_lowercase();
    extensions.iter().any(|ext| {
        lossy
            .strip_suffix(ext.as_str())
            .is_some_and(|stem| stem.ends_with('.'))
    })
}

/// Canonicalize `path` and check it stays under `canonical_root`
pub fn confine(path: &Path, canonical_root: &Path) -> Confinement {
    match path.canonicalize() {
        Ok(canonical) if canonical.starts_with(canonical_root) => Confinement::Inside(canonical),
        Ok(canonical) => Confinement::Outside(canonical),
        Err(_) => Confinement::Unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path_strips_query_and_fragment() {
        assert_eq!(request_path("/assets/logo.png"), "/assets/logo.png");
        assert_eq!(request_path("/model.json?v=3"), "/model.json");
        assert_eq!(request_path("/page.html#top"), "/page.html");
        assert_eq!(request_path("/a?b=c#d"), "/a");
        assert_eq!(request_path("/a?next=http://x/y"), "/a");
    }

    #[test]
    fn test_request_path_absolute_form() {
        assert_eq!(request_path("http://example.com/x/y.txt?q"), "/x/y.txt");
        assert_eq!(request_path("http://example.com"), "/");
    }

    #[test]
    fn test_request_path_empty() {
        assert_eq!(request_path(""), "/");
        assert_eq!(request_path("?only=query"), "/");
    }

    #[test]
    fn test_request_path_keeps_encoding() {
        assert_eq!(request_path("/my%20file.txt"), "/my%20file.txt");
    }

    #[test]
    fn test_resolve_concatenates() {
        assert_eq!(
            resolve(Path::new("/srv/www"), "/assets/logo.png"),
            PathBuf::from("/srv/www/assets/logo.png")
        );
        assert_eq!(
            resolve(Path::new("/srv/www/"), "/assets/logo.png"),
            PathBuf::from("/srv/www/assets/logo.png")
        );
        // No normalization
        assert_eq!(
            resolve(Path::new("/srv/www"), "/../etc/passwd"),
            PathBuf::from("/srv/www/../etc/passwd")
        );
    }

    #[test]
    fn test_script_extension_any_case() {
        let php = vec!["php".to_string()];
        assert!(has_script_extension(Path::new("/srv/admin/secrets.php"), &php));
        assert!(has_script_extension(Path::new("/srv/INDEX.PHP"), &php));
        assert!(has_script_extension(Path::new("/srv/x.Php"), &php));
        assert!(has_script_extension(Path::new("/srv/.php"), &php));
    }

    #[test]
    fn test_script_extension_is_narrow() {
        let php = vec!["php".to_string()];
        assert!(!has_script_extension(Path::new("/srv/x.phtml"), &php));
        assert!(!has_script_extension(Path::new("/srv/x.php5"), &php));
        assert!(!has_script_extension(Path::new("/srv/x.php/"), &php));
        assert!(!has_script_extension(Path::new("/srv/notphp"), &php));
        assert!(!has_script_extension(Path::new("/srv/run.cgi"), &php));
    }

    #[test]
    fn test_script_extension_custom_set() {
        let set = vec!["php".to_string(), "cgi".to_string()];
        assert!(has_script_extension(Path::new("/srv/run.CGI"), &set));
    }

    #[test]
    fn test_confine() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("www");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("ok.txt"), b"ok").unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();
        let canonical_root = root.canonicalize().unwrap();

        assert!(matches!(
            confine(&resolve(&root, "/ok.txt"), &canonical_root),
            Confinement::Inside(_)
        ));
        assert!(matches!(
            confine(&resolve(&root, "/../secret.txt"), &canonical_root),
            Confinement::Outside(_)
        ));
        assert_eq!(
            confine(&resolve(&root, "/missing.txt"), &canonical_root),
            Confinement::Unresolved
        );
    }
}
