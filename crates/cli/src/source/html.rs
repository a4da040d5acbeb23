//! HTML extraction for the client table and its pagination links.
//!
//! A small tag scanner, not a parser: it matches tag and attribute names
//! case-insensitively, tracks nesting of same-named elements, and ignores
//! comments, doctype and closing-tag omission.

use url::Url;

/// Header and data cells scraped from one `<table>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One `<a>` inside the pagination element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub href: Option<String>,
    pub text: String,
}

impl PageLink {
    /// URL of the page this link leads to.
    ///
    /// A real `href` is resolved against `base`. Script-driven links
    /// (`#`, empty, `javascript:`) fall back to `base?page=<text>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the href cannot be resolved.
    pub fn resolve(&self, base: &Url) -> Result<Url, url::ParseError> {
        match self.href.as_deref().map(str::trim) {
            Some(href)
                if !href.is_empty()
                    && !href.starts_with('#')
                    && !href.to_ascii_lowercase().starts_with("javascript:") =>
            {
                base.join(href)
            }
            _ => {
                let mut url = base.clone();
                url.query_pairs_mut().append_pair("page", self.text.trim());
                Ok(url)
            }
        }
    }
}

/// Extract the table whose `id` attribute is `id`.
///
/// Headers come from the first row holding `<th>` cells; every row holding
/// `<td>` cells is a data row. Returns `None` if no such table exists.
#[must_use]
pub fn parse_table(html: &str, id: &str) -> Option<ScrapedTable> {
    let doc = Document::new(html);
    let table = doc.find_by_id(id).filter(|el| el.name == "table")?;

    let mut scraped = ScrapedTable::default();
    for row in doc.elements(table.inner.clone(), "tr") {
        let headers = doc.elements(row.inner.clone(), "th");
        if scraped.headers.is_empty() && !headers.is_empty() {
            scraped.headers = headers.iter().map(|c| doc.text(c)).collect();
            continue;
        }
        let cells = doc.elements(row.inner.clone(), "td");
        if !cells.is_empty() {
            scraped.rows.push(cells.iter().map(|c| doc.text(c)).collect());
        }
    }
    Some(scraped)
}

/// Collect the `<a>` links inside the element whose `id` is `id`.
#[must_use]
pub fn pagination_links(html: &str, id: &str) -> Vec<PageLink> {
    let doc = Document::new(html);
    let Some(container) = doc.find_by_id(id) else {
        return Vec::new();
    };
    doc.elements(container.inner.clone(), "a")
        .iter()
        .map(|a| PageLink {
            href: attr_value(doc.attrs(a), "href"),
            text: doc.text(a),
        })
        .collect()
}

// =============================================================================
// Tag scanning
// =============================================================================

#[derive(Debug, Clone)]
struct Element {
    /// Lowercase tag name.
    name: String,
    /// Byte range of the attribute text inside the opening tag.
    attrs: std::ops::Range<usize>,
    /// Byte range between the opening and closing tags.
    inner: std::ops::Range<usize>,
    /// Byte offset just past the closing tag.
    end: usize,
}

struct Document<'a> {
    raw: &'a str,
    /// ASCII-lowercased copy; byte offsets match `raw`.
    lower: String,
}

impl<'a> Document<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            raw,
            lower: raw.to_ascii_lowercase(),
        }
    }

    fn attrs(&self, el: &Element) -> &'a str {
        self.raw.get(el.attrs.clone()).unwrap_or("")
    }

    /// Visible text of an element: tags stripped, entities decoded,
    /// whitespace collapsed.
    fn text(&self, el: &Element) -> String {
        let inner = self.raw.get(el.inner.clone()).unwrap_or("");
        normalize_ws(&decode_entities(&strip_tags(inner)))
    }

    /// Next opening tag at or after `from`, as (name, attrs range, offset past `>`).
    fn next_open_tag(&self, from: usize) -> Option<(usize, String, std::ops::Range<usize>, usize)> {
        let mut pos = from;
        loop {
            let start = pos + self.lower.get(pos..)?.find('<')?;
            let after = start + 1;
            let name_len = self
                .lower
                .get(after..)?
                .find(|c: char| !c.is_ascii_alphanumeric())
                .unwrap_or(self.lower.len() - after);
            if name_len == 0 {
                // closing tag, comment or stray '<'
                pos = after;
                continue;
            }
            let name_end = after + name_len;
            let close = name_end + self.lower.get(name_end..)?.find('>')?;
            let attrs_end = if self.lower.get(close - 1..close) == Some("/") && close > name_end {
                close - 1
            } else {
                close
            };
            let name = self.lower.get(after..name_end)?.to_string();
            return Some((start, name, name_end..attrs_end, close + 1));
        }
    }

    /// Complete element whose opening tag starts at or after `from`.
    fn element_from(&self, from: usize, name: Option<&str>, limit: usize) -> Option<Element> {
        let mut pos = from;
        loop {
            let (start, tag, attrs, open_end) = self.next_open_tag(pos)?;
            if start >= limit {
                return None;
            }
            if name.is_some_and(|n| n != tag) {
                pos = open_end;
                continue;
            }
            let (inner_end, end) = self.matching_close(&tag, open_end)?;
            return Some(Element {
                name: tag,
                attrs,
                inner: open_end..inner_end,
                end,
            });
        }
    }

    /// Find `</name>` balancing nested `<name>` openings after `from`.
    /// Returns (start of closing tag, offset past it).
    fn matching_close(&self, name: &str, from: usize) -> Option<(usize, usize)> {
        let open_pat = format!("<{name}");
        let close_pat = format!("</{name}");
        let mut depth = 1_usize;
        let mut pos = from;
        loop {
            let rest = self.lower.get(pos..)?;
            let next_close = rest.find(&close_pat)?;
            let next_open = rest
                .match_indices(&open_pat)
                .map(|(i, _)| i)
                .find(|&i| is_tag_boundary(rest, i + open_pat.len()));
            match next_open {
                Some(open) if open < next_close => {
                    depth += 1;
                    pos += open + open_pat.len();
                }
                _ => {
                    let close_start = pos + next_close;
                    let close_end = close_start + rest.get(next_close..)?.find('>')? + 1;
                    if !is_tag_boundary(rest, next_close + close_pat.len()) {
                        pos = close_end;
                        continue;
                    }
                    depth -= 1;
                    if depth == 0 {
                        return Some((close_start, close_end));
                    }
                    pos = close_end;
                }
            }
        }
    }

    /// Element carrying `id="<id>"`, compared case-insensitively.
    fn find_by_id(&self, id: &str) -> Option<Element> {
        let mut pos = 0;
        loop {
            let (start, _, attrs, open_end) = self.next_open_tag(pos)?;
            let matches = self
                .raw
                .get(attrs)
                .and_then(|a| attr_value(a, "id"))
                .is_some_and(|v| v.eq_ignore_ascii_case(id));
            if matches {
                return self.element_from(start, None, start + 1);
            }
            pos = open_end;
        }
    }

    /// `name` elements inside `range`, in document order, not descending
    /// into a match once found.
    fn elements(&self, range: std::ops::Range<usize>, name: &str) -> Vec<Element> {
        let mut found = Vec::new();
        let mut pos = range.start;
        while let Some(el) = self.element_from(pos, Some(name), range.end) {
            if el.end > range.end {
                break;
            }
            pos = el.end;
            found.push(el);
        }
        found
    }
}

/// Whether the byte at `idx` ends a tag name (`>`, `/`, whitespace or end).
fn is_tag_boundary(s: &str, idx: usize) -> bool {
    s.as_bytes()
        .get(idx)
        .is_none_or(|b| *b == b'>' || *b == b'/' || b.is_ascii_whitespace())
}

/// Value of attribute `name` in the text of an opening tag. Bare
/// attributes yield an empty string.
fn attr_value(attrs: &str, name: &str) -> Option<String> {
    let mut rest = attrs;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return None;
        }
        let key_end = rest
            .find(|c: char| c == '=' || c == '/' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = rest.get(..key_end).unwrap_or("");
        rest = rest.get(key_end..).unwrap_or("").trim_start();

        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (value, remaining) = match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = after_eq.get(1..).unwrap_or("");
                    let end = body.find(quote).unwrap_or(body.len());
                    (
                        body.get(..end).unwrap_or(""),
                        body.get(end + 1..).unwrap_or(""),
                    )
                }
                _ => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    (
                        after_eq.get(..end).unwrap_or(""),
                        after_eq.get(end..).unwrap_or(""),
                    )
                }
            };
            if key.eq_ignore_ascii_case(name) {
                return Some(decode_entities(value));
            }
            rest = remaining;
        } else if key.eq_ignore_ascii_case(name) {
            return Some(String::new());
        } else if key_end == 0 {
            // stray '/'
            rest = rest.get(1..).unwrap_or("");
        }
    }
}

/// Remove every `<...>` tag.
fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Decode the handful of entities that appear in table cells.
fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Collapse whitespace runs to one space and trim.
fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<!DOCTYPE html>
<html>
<body>
  <TABLE class="data" ID="userTable">
    <thead>
      <tr><th>ID</th><th>Age</th><th>Occupation</th><th>Account Status</th><th>Last Login</th><th>Account Balance</th></tr>
    </thead>
    <tbody>
      <tr><td>1</td><td>34</td><td><b>Engineer</b></td><td>Active</td><td>2024-01-05</td><td>1,200.50</td></tr>
      <tr>
        <td> 2 </td><td>29</td><td>Sales&nbsp;&amp;&nbsp;Marketing</td><td>Closed</td><td>2023-11-30</td><td>0</td>
      </tr>
    </tbody>
  </TABLE>
  <div id="pagination">
    <a href="#" class="active">1</a>
    <a href="?page=2">2</a>
    <a href='javascript:void(0)'>3</a>
    <div class="spacer"><span>...</span></div>
    <a>4</a>
  </div>
</body>
</html>"##;

    #[test]
    fn test_parse_table() {
        let table = parse_table(PAGE, "userTable").unwrap();
        assert_eq!(
            table.headers,
            [
                "ID",
                "Age",
                "Occupation",
                "Account Status",
                "Last Login",
                "Account Balance"
            ]
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][2], "Engineer");
        assert_eq!(table.rows[1][0], "2");
        assert_eq!(table.rows[1][2], "Sales & Marketing");
    }

    #[test]
    fn test_missing_table() {
        assert!(parse_table(PAGE, "otherTable").is_none());
        assert!(parse_table("<div id=\"userTable\"></div>", "userTable").is_none());
    }

    #[test]
    fn test_nested_table_does_not_end_outer() {
        let html = "<table id=t><tr><th>A</th><th>B</th></tr>\
                    <tr><td><table><tr><td>x</td></tr></table></td><td>y</td></tr>\
                    <tr><td>1</td><td>2</td></tr></table>";
        let table = parse_table(html, "t").unwrap();
        assert_eq!(table.headers, ["A", "B"]);
        assert_eq!(table.rows, vec![vec!["x", "y"], vec!["1", "2"]]);
    }

    #[test]
    fn test_pagination_links() {
        let links = pagination_links(PAGE, "pagination");
        let texts: Vec<&str> = links.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["1", "2", "3", "4"]);
        assert_eq!(links[1].href.as_deref(), Some("?page=2"));
        assert_eq!(links[3].href, None);
    }

    #[test]
    fn test_pagination_missing() {
        assert!(pagination_links("<p>nothing</p>", "pagination").is_empty());
    }

    #[test]
    fn test_resolve_links() {
        let base = Url::parse("https://example.com/data/").unwrap();
        let links = pagination_links(PAGE, "pagination");

        assert_eq!(
            links[1].resolve(&base).unwrap().as_str(),
            "https://example.com/data/?page=2"
        );
        assert_eq!(
            links[2].resolve(&base).unwrap().as_str(),
            "https://example.com/data/?page=3"
        );
        assert_eq!(
            links[3].resolve(&base).unwrap().as_str(),
            "https://example.com/data/?page=4"
        );

        let absolute = PageLink {
            href: Some("/other/page.html".into()),
            text: "5".into(),
        };
        assert_eq!(
            absolute.resolve(&base).unwrap().as_str(),
            "https://example.com/other/page.html"
        );
    }

    #[test]
    fn test_attr_value() {
        assert_eq!(attr_value(r#" class="a b" id='x'"#, "id").as_deref(), Some("x"));
        assert_eq!(attr_value(" ID=Main disabled", "id").as_deref(), Some("Main"));
        assert_eq!(attr_value(" disabled", "disabled").as_deref(), Some(""));
        assert_eq!(attr_value(r#" href="?a=1&amp;b=2""#, "href").as_deref(), Some("?a=1&b=2"));
        assert_eq!(attr_value(" class=x", "id"), None);
    }
}
