mod common;

use common::{Site, is_within};
use fileserver::files::{PathResolver, Rejection};
use fileserver::http::error::ServeError;
use fileserver::http::mime::{OCTET_STREAM, TEXT_HTML};

#[test]
fn test_root_maps_to_index() {
    let site = Site::new();
    let resolver = PathResolver::new(&site.root).unwrap();

    for raw in ["/", "", "/?lang=en"] {
        let file = resolver.resolve(raw).unwrap();
        assert!(file.path.ends_with("index.html"), "{raw:?}");
        assert_eq!(file.content_type, TEXT_HTML);
        assert!(is_within(&file.path, &site.root));
    }
}

#[test]
fn test_traversal_and_protocol_relative_rejected() {
    let site = Site::new();
    let resolver = PathResolver::new(&site.root).unwrap();

    for raw in ["/../../etc/passwd", "/a/../index.html", "//evil", "//evil/index.html", "/..%2fetc"] {
        assert!(
            matches!(resolver.resolve(raw), Err(Rejection::Traversal(_))),
            "{raw:?}"
        );
    }
}

#[test]
fn test_encoded_dots_do_not_escape() {
    let site = Site::new();
    let resolver = PathResolver::new(&site.root).unwrap();

    // Not decoded: looked up literally and not found.
    assert!(matches!(
        resolver.resolve("/%2e%2e/%2e%2e/etc/passwd.html"),
        Err(Rejection::NotFound(_))
    ));
}

#[test]
fn test_unsupported_extension_even_if_missing() {
    let site = Site::new();
    site.write("style.css", "body {}");
    let resolver = PathResolver::new(&site.root).unwrap();

    assert!(matches!(resolver.resolve("/style.css"), Err(Rejection::UnsupportedType(_))));
    assert!(matches!(resolver.resolve("/script.js"), Err(Rejection::UnsupportedType(_))));
    assert!(matches!(resolver.resolve("/docs/"), Err(Rejection::UnsupportedType(_))));
}

#[test]
fn test_missing_file_and_directory_are_not_found() {
    let site = Site::new();
    site.write("dir.html/inner.txt", "x");
    let resolver = PathResolver::new(&site.root).unwrap();

    assert!(matches!(resolver.resolve("/missing.html"), Err(Rejection::NotFound(_))));
    assert!(matches!(resolver.resolve("/dir.html"), Err(Rejection::NotFound(_))));
}

#[test]
fn test_nested_octet_stream_file() {
    let site = Site::new();
    site.write("docs/readme.txt", "read me");
    let resolver = PathResolver::new(&site.root).unwrap();

    let file = resolver.resolve("/docs/readme.txt").unwrap();
    assert_eq!(file.content_type, OCTET_STREAM);
    assert_eq!(file.file_name(), "readme.txt");
    assert!(is_within(&file.path, &site.root));
}

#[cfg(unix)]
#[test]
fn test_symlink_escape_rejected() {
    let site = Site::new();
    let outside = Site::new();
    let target = outside.write("page.html", "outside");
    std::os::unix::fs::symlink(&target, site.root.join("link.html")).unwrap();
    let resolver = PathResolver::new(&site.root).unwrap();

    assert!(matches!(resolver.resolve("/link.html"), Err(Rejection::Escape(_))));
}

#[test]
fn test_rejections_map_to_statuses() {
    let status = |r: Rejection| ServeError::from(r).status().as_u16();

    assert_eq!(status(Rejection::Traversal("/..".into())), 403);
    assert_eq!(status(Rejection::Escape("/link.html".into())), 403);
    assert_eq!(status(Rejection::NotFound("/missing.html".into())), 404);
    assert_eq!(status(Rejection::UnsupportedType("/style.css".into())), 415);
}

#[test]
fn test_missing_root_is_an_error() {
    let missing = std::env::temp_dir().join(format!("fileserver-missing-{}", uuid::Uuid::new_v4()));
    assert!(PathResolver::new(missing).is_err());
}
