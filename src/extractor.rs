//! Readable-text extraction from raw page markup.
//!
//! The markup is parsed with `scraper` and every element is classified into
//! a closed set of kinds ([`ElementKind`]). Boilerplate elements (`script`,
//! `style`, `header`, `footer`, `nav`) are [`ElementKind::Removed`]: neither
//! they nor anything inside them can reach the output.
//!
//! The `body` subtree (or the whole document when there is none) is then
//! walked depth-first in document order, producing [`ContentFragment`]s:
//!
//! | Element | Fragment | Rendered as |
//! |---------|----------|-------------|
//! | `h1` `h2` `h3` | [`ContentFragment::Heading`] | `"\n# text\n"` |
//! | `p` with more than 3 words | [`ContentFragment::Paragraph`] | `text` |
//! | each non-empty `li` under `ul` / `ol` | [`ContentFragment::ListItem`] | `"• text"` |
//!
//! A matched element consumes its subtree, so a `p` inside a list item or a
//! nested `ul` is emitted once, through the outer list's items.
//!
//! Heading and paragraph text is the element's text with whitespace runs
//! collapsed. List-item text is its text nodes, each trimmed, joined with
//! single spaces, so `<li><a>Home</a><a>About</a></li>` reads `Home About`.
//!
//! All walks use explicit work-lists, so nesting depth only costs heap.
//! Rendered fragments are joined with a blank line and the result trimmed.
//! Extraction is pure and never fails; unusual markup only yields less text.

use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

/// Paragraphs need strictly more words than this to be kept.
const MIN_PARAGRAPH_WORDS: usize = 3;

static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// The element kinds extraction cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Heading1,
    Heading2,
    Heading3,
    Paragraph,
    List,
    ListItem,
    Other,
    /// Boilerplate, dropped along with its descendants.
    Removed,
}

impl ElementKind {
    pub fn from_tag(name: &str) -> Self {
        match name {
            "h1" => Self::Heading1,
            "h2" => Self::Heading2,
            "h3" => Self::Heading3,
            "p" => Self::Paragraph,
            "ul" | "ol" => Self::List,
            "li" => Self::ListItem,
            "script" | "style" | "header" | "footer" | "nav" => Self::Removed,
            _ => Self::Other,
        }
    }

    pub fn of(element: ElementRef<'_>) -> Self {
        Self::from_tag(element.value().name())
    }
}

/// One unit of readable text, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentFragment {
    Heading(String),
    Paragraph(String),
    ListItem(String),
}

impl ContentFragment {
    pub fn render(&self) -> String {
        match self {
            Self::Heading(text) => format!("\n# {text}\n"),
            Self::Paragraph(text) => text.clone(),
            Self::ListItem(text) => format!("• {text}"),
        }
    }
}

/// Extract readable text from `raw_html`.
pub fn extract(raw_html: &str) -> String {
    extract_fragments(raw_html)
        .iter()
        .map(ContentFragment::render)
        .join("\n\n")
        .trim()
        .to_string()
}

/// Extract the ordered fragments without rendering them.
pub fn extract_fragments(raw_html: &str) -> Vec<ContentFragment> {
    let document = Html::parse_document(raw_html);
    let root = document
        .select(&BODY_SELECTOR)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut fragments = Vec::new();
    let mut pending = vec![root];
    while let Some(element) = pending.pop() {
        match ElementKind::of(element) {
            ElementKind::Heading1 | ElementKind::Heading2 | ElementKind::Heading3 => {
                fragments.push(ContentFragment::Heading(collapsed_text(element)));
            }
            ElementKind::Paragraph => {
                let text = collapsed_text(element);
                if text.split_whitespace().count() > MIN_PARAGRAPH_WORDS {
                    fragments.push(ContentFragment::Paragraph(text));
                }
            }
            ElementKind::List => collect_list_items(element, &mut fragments),
            ElementKind::ListItem | ElementKind::Other => {
                pending.extend(child_elements_reversed(element));
            }
            ElementKind::Removed => {}
        }
    }
    fragments
}

/// Every `li` beneath `list`, nested lists included, in document order.
fn collect_list_items(list: ElementRef<'_>, out: &mut Vec<ContentFragment>) {
    let mut pending: Vec<_> = child_elements_reversed(list).collect();
    while let Some(element) = pending.pop() {
        match ElementKind::of(element) {
            ElementKind::Removed => continue,
            ElementKind::ListItem => {
                // Separate text nodes so adjacent inline elements keep a gap.
                let text = text_nodes(element).join(" ").split_whitespace().join(" ");
                if !text.is_empty() {
                    out.push(ContentFragment::ListItem(text));
                }
            }
            _ => {}
        }
        pending.extend(child_elements_reversed(element));
    }
}

/// Element text with surrounding whitespace trimmed and inner runs collapsed.
fn collapsed_text(element: ElementRef<'_>) -> String {
    text_nodes(element).concat().split_whitespace().join(" ")
}

/// Text nodes beneath `element` in document order, boilerplate excluded.
fn text_nodes<'a>(element: ElementRef<'a>) -> Vec<&'a str> {
    let mut texts = Vec::new();
    let mut pending: Vec<_> = element.children().rev().collect();
    while let Some(node) = pending.pop() {
        match node.value() {
            Node::Text(text) => texts.push(&**text),
            Node::Element(el) => {
                if ElementKind::from_tag(el.name()) != ElementKind::Removed {
                    pending.extend(node.children().rev());
                }
            }
            _ => {}
        }
    }
    texts
}

/// Child elements, last first, ready to push onto a work-list.
fn child_elements_reversed<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().rev().filter_map(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_kinds() {
        assert_eq!(ElementKind::from_tag("h2"), ElementKind::Heading2);
        assert_eq!(ElementKind::from_tag("ol"), ElementKind::List);
        assert_eq!(ElementKind::from_tag("nav"), ElementKind::Removed);
        assert_eq!(ElementKind::from_tag("div"), ElementKind::Other);
    }

    #[test]
    fn test_extract_renders_fragments_in_order() {
        let html = r#"<html><body>
            <h1> Welcome </h1>
            <p>This is the   first
               paragraph of text.</p>
            <ul><li>One</li><li>  Two  items </li><li>   </li></ul>
            <h2>Details</h2>
        </body></html>"#;

        assert_eq!(
            extract(html),
            "# Welcome\n\n\nThis is the first paragraph of text.\n\n• One\n\n• Two items\n\n\n# Details"
        );
    }

    #[test]
    fn test_short_paragraphs_are_dropped() {
        let html = "<body><p>Read more here</p><p>Four words are enough</p></body>";
        assert_eq!(extract(html), "Four words are enough");
    }

    #[test]
    fn test_boilerplate_never_reaches_output() {
        let html = r#"<html><head><style>p { color: red; }</style></head><body>
            <header><h1>Site header title</h1></header>
            <nav><ul><li>Home</li><li>About</li></ul></nav>
            <script>var p = "<p>script paragraph with many words</p>";</script>
            <main><article><div><h3>Kept heading</h3>
              <p>This paragraph is nested deeply inside containers.</p></div></article></main>
            <footer><p>Copyright notice for this whole site.</p></footer>
        </body></html>"#;

        let text = extract(html);
        assert_eq!(
            text,
            "# Kept heading\n\n\nThis paragraph is nested deeply inside containers."
        );
        for hidden in ["Site header", "Home", "About", "script", "Copyright", "color"] {
            assert!(!text.contains(hidden), "{hidden} leaked into {text:?}");
        }
    }

    #[test]
    fn test_list_items_are_not_duplicated() {
        let html = r#"<body><ul>
            <li><p>A paragraph inside a list item.</p></li>
            <li>Parent<ol><li>Child</li></ol></li>
        </ul></body>"#;

        assert_eq!(
            extract_fragments(html),
            vec![
                ContentFragment::ListItem("A paragraph inside a list item.".into()),
                ContentFragment::ListItem("Parent Child".into()),
                ContentFragment::ListItem("Child".into()),
            ]
        );
    }

    #[test]
    fn test_list_item_inline_elements_are_space_separated() {
        let html = r#"<body><ul>
            <li><a>Home</a><a>About</a></li>
            <li><strong>Price:</strong>$5</li>
            <li>  Spread <em> out </em>  words </li>
        </ul></body>"#;

        assert_eq!(extract(html), "• Home About\n\n• Price: $5\n\n• Spread out words");
    }

    #[test]
    fn test_list_item_skips_boilerplate_inside_items() {
        let html = "<body><ol><li>Visible<script>hidden()</script><nav>menu</nav> text</li></ol></body>";
        assert_eq!(extract(html), "• Visible text");
    }

    #[test]
    fn test_deeply_nested_markup_is_extracted() {
        let depth = 10_000;
        let html = format!(
            "<body>{}<p>four words right here</p><ul><li>deep item</li></ul>{}</body>",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );

        // Run on a thread with a small stack: the walk must not grow with depth.
        let text = std::thread::Builder::new()
            .stack_size(1024 * 1024)
            .spawn(move || extract(&html))
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(text, "four words right here\n\n• deep item");
    }

    #[test]
    fn test_inline_markup_keeps_word_spacing() {
        let html = "<body><p>Some <b>bold</b> and <a href='#'>linked</a> words.</p></body>";
        assert_eq!(extract(html), "Some bold and linked words.");
    }

    #[test]
    fn test_empty_and_fragmentary_input() {
        assert_eq!(extract(""), "");
        assert_eq!(extract("not even <markup"), "");
        assert_eq!(extract("<h1>Loose heading</h1>"), "# Loose heading");
    }

    #[test]
    fn test_extract_is_deterministic() {
        let html = "<body><h1>T</h1><p>one two three four</p><ol><li>x</li></ol></body>";
        assert_eq!(extract(html), extract(html));
    }
}
