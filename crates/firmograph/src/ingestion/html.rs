//! Markup-to-text extraction for scraped pages

use scraper::Html;

/// Strip tags from rendered markup and collapse every whitespace run to a
/// single space, trimming the ends.
///
/// An explicit success with no textual content yields an empty string.
pub fn extract_text(markup: &str) -> String {
    let document = Html::parse_document(markup);
    let mut text = String::new();
    for node in document.root_element().text() {
        for word in node.split_whitespace() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(word);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let markup = "<html><body><h1>Acme\n  Corp</h1><p>We   make\tthings.</p></body></html>";
        assert_eq!(extract_text(markup), "Acme Corp We make things.");
    }

    #[test]
    fn nested_elements_are_separated() {
        let markup = "<div><span>alpha</span><span>beta</span></div>";
        assert_eq!(extract_text(markup), "alpha beta");
    }

    #[test]
    fn empty_page_yields_empty_text() {
        assert_eq!(extract_text("<html><body></body></html>"), "");
    }
}
