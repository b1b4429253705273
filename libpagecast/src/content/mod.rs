//! Post content files
//!
//! A content file is plain lines. Any line whose trimmed, case-insensitive
//! form starts with `IMAGE:` names an image file; every other line is part
//! of the message body.
//!
//! ```text
//! IMAGE: cover.jpg
//!
//! Opening hours change next week.
//! IMAGE: map.png
//! ```

#[cfg(feature = "docx")]
pub mod docx;
pub mod loader;

pub use loader::{docx_support, list_post_files, load_post, load_posts};

/// Directive prefix, matched case-insensitively
const IMAGE_DIRECTIVE: &str = "IMAGE:";

/// Body text and image references split out of a content file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedContent {
    pub text: String,
    pub images: Vec<String>,
}

/// Split raw content into message body and image references
///
/// Directive lines are removed from the body wherever they appear. The body
/// is the remaining lines joined with `\n`, trimmed at both ends; an empty
/// body is returned as-is and rejected by the caller.
pub fn parse_post_content(content: &str) -> ParsedContent {
    let mut images = Vec::new();
    let mut text_lines = Vec::new();

    for line in content.split('\n') {
        match image_directive(line) {
            Some(filename) => images.push(filename.to_string()),
            None => text_lines.push(line),
        }
    }

    ParsedContent {
        text: text_lines.join("\n").trim().to_string(),
        images,
    }
}

fn image_directive(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let prefix = trimmed.get(..IMAGE_DIRECTIVE.len())?;
    if prefix.eq_ignore_ascii_case(IMAGE_DIRECTIVE) {
        Some(trimmed[IMAGE_DIRECTIVE.len()..].trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_content_has_no_images() {
        let content = "\n  Hello world\nSecond line  \n\n";
        let parsed = parse_post_content(content);
        assert!(parsed.images.is_empty());
        assert_eq!(parsed.text, content.trim());
    }

    #[test]
    fn test_directives_interleaved_with_text() {
        let content = "Intro\nIMAGE: a.jpg\nMiddle\n  image:   b.png  \nOutro";
        let parsed = parse_post_content(content);
        assert_eq!(parsed.images, vec!["a.jpg", "b.png"]);
        assert_eq!(parsed.text, "Intro\nMiddle\nOutro");
    }

    #[test]
    fn test_directives_at_top() {
        let content = "IMAGE: cover.jpg\nIMAGE: map.png\n\nOpening hours change next week.";
        let parsed = parse_post_content(content);
        assert_eq!(parsed.images, vec!["cover.jpg", "map.png"]);
        assert_eq!(parsed.text, "Opening hours change next week.");
    }

    #[test]
    fn test_only_directives_gives_empty_body() {
        let parsed = parse_post_content("IMAGE: a.jpg\n\n");
        assert_eq!(parsed.images, vec!["a.jpg"]);
        assert!(parsed.text.is_empty());
    }

    #[test]
    fn test_body_lines_keep_inner_whitespace() {
        let parsed = parse_post_content("  indented\n\ttabbed\nIMAGE:x.gif");
        assert_eq!(parsed.text, "indented\n\ttabbed");
        assert_eq!(parsed.images, vec!["x.gif"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let parsed = parse_post_content("First\r\nIMAGE: a.jpg\r\nSecond\r\n");
        assert_eq!(parsed.images, vec!["a.jpg"]);
        // Body lines are kept as written; only the ends of the body are trimmed
        assert_eq!(parsed.text, "First\r\nSecond");
    }

    #[test]
    fn test_mixed_case_directive() {
        let parsed = parse_post_content("Image: photo.JPG\ntext");
        assert_eq!(parsed.images, vec!["photo.JPG"]);
        assert_eq!(parsed.text, "text");
    }

    #[test]
    fn test_word_containing_image_is_body_text() {
        let parsed = parse_post_content("IMAGES are coming\nMy image: later");
        assert!(parsed.images.is_empty());
        assert_eq!(parsed.text, "IMAGES are coming\nMy image: later");
    }

    #[test]
    fn test_empty_filename_is_recorded() {
        let parsed = parse_post_content("IMAGE:\nbody");
        assert_eq!(parsed.images, vec![""]);
        assert_eq!(parsed.text, "body");
    }

    #[test]
    fn test_non_ascii_body() {
        let parsed = parse_post_content("Xin chào các bạn!\nIMAGE: ảnh.jpg");
        assert_eq!(parsed.text, "Xin chào các bạn!");
        assert_eq!(parsed.images, vec!["ảnh.jpg"]);
    }
}
