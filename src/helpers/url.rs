//! URL helper functions

use crate::config::SiteConfig;

/// Route prefix for post detail pages
pub const POST_ROUTE: &str = "post";

/// Path of a post detail page
///
/// # Examples
/// ```ignore
/// post_path("hello-world") // -> "/post/hello-world/"
/// ```
pub fn post_path(uid: &str) -> String {
    format!("/{}/{}/", POST_ROUTE, uid)
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/post/hello/") // -> "https://example.com/post/hello/"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    format!(
        "{}/{}",
        config.url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Whether a UID can be used as a route segment and an output directory name
pub fn is_valid_uid(uid: &str) -> bool {
    !uid.is_empty() && slug::slugify(uid) == uid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_path() {
        assert_eq!(post_path("como-utilizar-hooks"), "/post/como-utilizar-hooks/");
    }

    #[test]
    fn test_full_url_for() {
        let config = SiteConfig {
            url: "https://example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            full_url_for(&config, "/post/a/"),
            "https://example.com/post/a/"
        );
    }

    #[test]
    fn test_valid_uid() {
        assert!(is_valid_uid("criando-um-app-cra-do-zero"));
        assert!(!is_valid_uid(""));
        assert!(!is_valid_uid("../etc/passwd"));
        assert!(!is_valid_uid("Upper Case"));
    }
}
