//! Public site URLs, `sitemap.xml` and `robots.txt` rendering.

use crate::types::{DbId, Timestamp};

/// Static pages listed in the sitemap: path, change frequency, priority.
const STATIC_PAGES: &[(&str, &str, &str)] = &[
    ("/", "weekly", "0.9"),
    ("/campos", "weekly", "0.8"),
    ("/comprar", "weekly", "0.8"),
    ("/alquilar", "weekly", "0.8"),
    ("/nosotros", "monthly", "0.6"),
    ("/publicar", "monthly", "0.6"),
];

/// A property as listed in the sitemap.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub id: DbId,
    pub slug: Option<String>,
    pub last_modified: Timestamp,
}

/// Strip trailing slashes from a configured site origin.
pub fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

/// Canonical public URL of a property: `<base>/properties/<id>[/<slug>]`.
pub fn property_url(base: &str, id: DbId, slug: Option<&str>) -> String {
    match slug.filter(|s| !s.is_empty()) {
        Some(slug) => format!("{base}/properties/{id}/{slug}"),
        None => format!("{base}/properties/{id}"),
    }
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn url_element(loc: &str, lastmod: Option<&str>, changefreq: &str, priority: &str) -> String {
    let lastmod = lastmod
        .map(|d| format!("<lastmod>{d}</lastmod>"))
        .unwrap_or_default();
    format!(
        "<url><loc>{}</loc>{lastmod}<changefreq>{changefreq}</changefreq><priority>{priority}</priority></url>",
        escape_xml(loc)
    )
}

/// Render `sitemap.xml` with the static pages followed by every property.
pub fn render_sitemap(base: &str, entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#,
    );

    for (path, changefreq, priority) in STATIC_PAGES {
        xml.push_str(&url_element(&format!("{base}{path}"), None, changefreq, priority));
    }

    for entry in entries {
        let loc = property_url(base, entry.id, entry.slug.as_deref());
        let lastmod = entry.last_modified.format("%Y-%m-%d").to_string();
        xml.push_str(&url_element(&loc, Some(&lastmod), "weekly", "0.7"));
    }

    xml.push_str("</urlset>");
    xml
}

/// Render `robots.txt`, keeping crawlers out of the admin area.
pub fn render_robots(base: &str) -> String {
    let sitemap = format!("Sitemap: {base}/sitemap.xml");
    [
        "User-agent: *",
        "Allow: /",
        "Disallow: /admin/",
        "Disallow: /admin/login",
        "Disallow: /admin/dashboard",
        "",
        sitemap.as_str(),
        "",
    ]
    .join("\n")
}
