//! Helper functions for naming downloaded files
//!
//! # Examples
//!
//! ```
//! use mangapark_dl::helpers::{derive_chapter_name, page_filename};
//!
//! let name = derive_chapter_name("https://mangapark.io/title/87295-en-eleceed/8945341-en-ch.1");
//! assert_eq!(name, "8945341-en-ch.1");
//!
//! let file = page_filename("eleceed_ch1", 7, "https://cdn.mangapark.net/pages/7.png");
//! assert_eq!(file, "eleceed_ch1_007.png");
//! ```

/// Sanitize a chapter name by replacing characters invalid in filenames
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Default chapter name: the last non-empty path segment of the chapter URL
pub fn derive_chapter_name(url: &str) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .trim_end_matches('/');

    let segment = path.rsplit('/').next().unwrap_or("");
    let name = sanitize_filename(segment);
    if name.is_empty() {
        "chapter".to_string()
    } else {
        name
    }
}

/// File extension from an image URL, defaulting to jpg
pub fn image_extension(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty()
                && ext.len() <= 4
                && !ext.contains('/')
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext
        }
        _ => "jpg",
    }
}

/// Output filename for one page: base name plus zero-padded page index
pub fn page_filename(name: &str, index: usize, url: &str) -> String {
    format!("{}_{:03}.{}", name, index, image_extension(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("ch.1: the beginning"), "ch.1_ the beginning");
        assert_eq!(sanitize_filename("a/b\\c|d"), "a_b_c_d");
        assert_eq!(sanitize_filename("normal-name"), "normal-name");
    }

    #[test]
    fn test_derive_chapter_name() {
        assert_eq!(
            derive_chapter_name("https://mangapark.io/title/87295-en-eleceed/8945341-en-ch.1"),
            "8945341-en-ch.1"
        );
        assert_eq!(
            derive_chapter_name("https://mangapark.io/title/x/ch-2/?lang=en"),
            "ch-2"
        );
        assert_eq!(derive_chapter_name("https://mangapark.io/"), "mangapark.io");
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("https://cdn.example.net/p/1.png"), "png");
        assert_eq!(image_extension("https://cdn.example.net/p/1.webp?v=2"), "webp");
        assert_eq!(image_extension("https://cdn.example.net/p/raw"), "jpg");
        assert_eq!(image_extension("https://cdn.example.net/p.dir/raw"), "jpg");
    }

    #[test]
    fn test_page_filename_is_zero_padded() {
        assert_eq!(
            page_filename("eleceed_ch1", 1, "https://cdn.example.net/1.jpg"),
            "eleceed_ch1_001.jpg"
        );
        assert_eq!(
            page_filename("eleceed_ch1", 12, "https://cdn.example.net/12.png"),
            "eleceed_ch1_012.png"
        );
    }
}
