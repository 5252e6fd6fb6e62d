use std::collections::HashSet;

/// Strips all markup from a free-text comment using ammonia and returns
/// plain text.
///
/// Comments are echoed into admin views and notification emails, so no tag
/// survives. `<script>` and `<style>` are removed together with their content.
pub fn clean_comment(input: &str) -> String {
    let cleaned = ammonia::Builder::default()
        .tags(HashSet::<&str>::new())
        .clean(input)
        .to_string();

    unescape_text(&cleaned).trim().to_string()
}

/// Reverts the escapes the HTML serializer applies to text nodes.
/// `&amp;` goes last so an escaped entity such as `&amp;lt;` stays literal.
fn unescape_text(html: &str) -> String {
    html.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
