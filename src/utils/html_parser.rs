use ego_tree::NodeRef;
use scraper::{Html, Node};

/// Converts a work item's HTML description to plain text.
///
/// `<p>` and `<div>` start a new line unless nothing has been written yet.
/// `<br>` always emits a line break. Every `<li>` becomes its own `- ` line
/// and whitespace-only text is dropped. Entities are decoded by the parser.
pub fn html_to_plain_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let document = Html::parse_fragment(html);
    let mut converter = PlainTextConverter::default();
    converter.process_node(document.tree.root());
    converter.output
}

/// How an element affects the text layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    /// `br`
    LineBreak,
    /// `p`, `div`
    Block,
    /// `li`
    ListItem,
    /// `ul`, `ol`
    List,
    Other,
}

impl Tag {
    fn classify(name: &str) -> Self {
        match name {
            "br" => Tag::LineBreak,
            "p" | "div" => Tag::Block,
            "li" => Tag::ListItem,
            "ul" | "ol" => Tag::List,
            _ => Tag::Other,
        }
    }
}

#[derive(Default)]
struct PlainTextConverter {
    output: String,
}

impl PlainTextConverter {
    fn line_break(&mut self) {
        if !self.output.is_empty() {
            self.output.push('\n');
        }
    }

    fn process_children(&mut self, node: NodeRef<Node>) {
        for child in node.children() {
            self.process_node(child);
        }
    }

    fn process_node(&mut self, node: NodeRef<Node>) {
        match node.value() {
            Node::Document | Node::Fragment => self.process_children(node),
            Node::Element(element) => match Tag::classify(element.name()) {
                Tag::LineBreak => self.output.push('\n'),
                Tag::Block => {
                    self.line_break();
                    self.process_children(node);
                }
                Tag::ListItem => {
                    if !self.output.ends_with('\n') {
                        self.line_break();
                    }
                    self.output.push_str("- ");
                    self.process_children(node);
                }
                Tag::List | Tag::Other => self.process_children(node),
            },
            Node::Text(text) => {
                if !text.trim().is_empty() {
                    self.output.push_str(text);
                }
            }
            Node::Comment(_) | Node::Doctype(_) | Node::ProcessingInstruction(_) => {}
        }
    }
}
