/// Nodes examined, counting the click target itself.
pub const MAX_ANCESTOR_LEVELS: usize = 5;
/// A node with at least this much rendered text is taken as the question block.
pub const MIN_BLOCK_CHARS: usize = 30;
pub const MIN_QUERY_CHARS: usize = 5;
pub const MAX_QUERY_CHARS: usize = 4000;

/// Read-only view of a page node.
pub trait TextNode: Sized {
    /// Rendered text (`innerText`, falling back to `textContent`).
    fn rendered_text(&self) -> String;

    fn parent(&self) -> Option<Self>;
}

impl TextNode for &str {
    fn rendered_text(&self) -> String {
        (*self).to_string()
    }

    fn parent(&self) -> Option<Self> {
        None
    }
}

impl TextNode for String {
    fn rendered_text(&self) -> String {
        self.clone()
    }

    fn parent(&self) -> Option<Self> {
        None
    }
}

/// Climbs from the click target towards the root looking for a block of text
/// rather than the tiny inline span that was hit.
pub fn extract_text<N: TextNode>(target: &N) -> String {
    let mut ancestor: Option<N> = None;
    for _ in 0..MAX_ANCESTOR_LEVELS {
        let node = ancestor.as_ref().unwrap_or(target);
        let text = node.rendered_text();
        let text = text.trim();
        if text.chars().count() >= MIN_BLOCK_CHARS {
            return text.to_string();
        }
        match node.parent() {
            Some(parent) => ancestor = Some(parent),
            None => break,
        }
    }
    target.rendered_text().trim().to_string()
}

/// Trims and truncates extracted text; `None` means nothing worth sending.
pub fn prepare_text(raw: &str) -> Option<String> {
    let text: String = raw.trim().chars().take(MAX_QUERY_CHARS).collect();
    if text.chars().count() < MIN_QUERY_CHARS {
        return None;
    }
    Some(text)
}
