//! Rewrite manual pages for the sandboxed viewer.
//!
//! The viewer cannot load `file:` resources or follow relative links, so
//! before a page is displayed:
//! - `<link href>`, `<script src>` and `<img src>` are mapped through
//!   [`UriMapper`] relative to the page's directory
//! - `<a href>` becomes an inert command URI (see [`crate::protocol`])
//! - a click handler and an optional theme style are appended
//!
//! Only the first matching attribute of each tag is rewritten, and only
//! double-quoted values are recognised. External URLs go through the same
//! replacement as relative ones: an absolute `https://` stylesheet is
//! joined onto the page directory like any other value.

use crate::commands::OPEN_DOCUMENTATION;
use crate::host::{Theme, UriMapper};
use crate::protocol::{encode_command, encode_component, normalize_path, COMMAND_SCHEME};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::path::Path;

lazy_static! {
    static ref LINK_HREF: Regex = attribute_pattern("link", "href");
    static ref SCRIPT_SRC: Regex = attribute_pattern("script", "src");
    static ref IMG_SRC: Regex = attribute_pattern("img", "src");
    static ref ANCHOR_HREF: Regex = attribute_pattern("a", "href");
}

const CLICK_SCRIPT: &str = r#"
<script>
    (function() {
        const host = acquireVsCodeApi();
        const originalPath = "__ORIGINAL_PATH__";
        document.addEventListener('click', function(event) {
            const anchor = event.target.closest('a');
            if (!anchor) {
                return;
            }
            const href = anchor.getAttribute('href') || '';
            if (href.startsWith('__COMMAND_PREFIX__')) {
                event.preventDefault();
                host.postMessage({
                    command: href.substring('__SCHEME__'.length),
                    originalPath: originalPath
                });
            }
        });
    })();
</script>
"#;

/// Options for [`rewrite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Append the click-forwarding script
    pub inject_script: bool,

    /// Bake colors for this theme into the page
    pub theme: Option<Theme>,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            inject_script: true,
            theme: None,
        }
    }
}

impl RewriteOptions {
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }
}

/// Rewrite a manual page so it can be displayed in the viewer.
///
/// `source_file` is the page's own path; resource references are resolved
/// against its directory.
pub fn rewrite<M: UriMapper + ?Sized>(
    html: &str,
    source_file: &Path,
    mapper: &M,
    options: &RewriteOptions,
) -> String {
    let base = source_file.parent().unwrap_or_else(|| Path::new(""));
    let to_viewer = |value: &str| {
        let resource = normalize_path(&base.join(crate::types::normalize_separators(value)));
        mapper.to_viewer_uri(&resource)
    };

    let html = replace_attribute(html, &LINK_HREF, &to_viewer);
    let html = replace_attribute(&html, &SCRIPT_SRC, &to_viewer);
    let html = replace_attribute(&html, &IMG_SRC, &to_viewer);
    let mut html = replace_attribute(&html, &ANCHOR_HREF, &encode_command);

    if let Some(theme) = options.theme {
        html.push_str(&theme_style(theme));
    }
    if options.inject_script {
        html.push_str(&click_script(base));
    }
    html
}

/// The script that forwards clicks on rewritten anchors to the host.
pub fn click_script(page_dir: &Path) -> String {
    CLICK_SCRIPT
        .replace("__ORIGINAL_PATH__", &encode_component(&page_dir.to_string_lossy()))
        .replace(
            "__COMMAND_PREFIX__",
            &format!("{}{}", COMMAND_SCHEME, OPEN_DOCUMENTATION),
        )
        .replace("__SCHEME__", COMMAND_SCHEME)
}

/// A static style block for the host theme.
pub fn theme_style(theme: Theme) -> String {
    let (background, foreground, link) = match theme {
        Theme::Light => ("#ffffff", "#1f1f1f", "#005fb8"),
        Theme::Dark => ("#1f1f1f", "#cccccc", "#4daafc"),
        Theme::HighContrast => ("#000000", "#ffffff", "#ffff00"),
    };
    format!(
        "\n<style>\n    body {{ background-color: {background}; color: {foreground}; }}\n    a, a:visited {{ color: {link}; }}\n</style>\n"
    )
}

fn attribute_pattern(tag: &str, attribute: &str) -> Regex {
    // Lazy `[^>]*?` keeps the match inside one tag and stops at the first
    // occurrence of the attribute.
    Regex::new(&format!(
        r#"(?i)<{tag}\s(?:[^>]*?\s)??{attribute}\s*=\s*"([^"]*)""#
    ))
    .unwrap()
}

fn replace_attribute<F>(html: &str, pattern: &Regex, replace: F) -> String
where
    F: Fn(&str) -> String,
{
    pattern
        .replace_all(html, |caps: &Captures| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            match (caps.get(0), caps.get(1)) {
                (Some(tag), Some(value)) => {
                    let start = value.start() - tag.start();
                    let end = value.end() - tag.start();
                    format!(
                        "{}{}{}",
                        &whole[..start],
                        replace(value.as_str()),
                        &whole[end..]
                    )
                }
                _ => whole.to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::NavigationMessage;
    use std::path::PathBuf;

    struct FakeMapper;

    impl UriMapper for FakeMapper {
        fn to_viewer_uri(&self, path: &Path) -> String {
            format!("viewer://{}", path.display())
        }
    }

    fn source() -> PathBuf {
        PathBuf::from("/docs/2020.10/IMEX/Content/well.htm")
    }

    fn plain() -> RewriteOptions {
        RewriteOptions {
            inject_script: false,
            theme: None,
        }
    }

    #[test]
    fn test_rewrite_stylesheet() {
        let html = r#"<link rel="stylesheet" href="../Skins/style.css" />"#;
        let out = rewrite(html, &source(), &FakeMapper, &plain());
        assert_eq!(
            out,
            r#"<link rel="stylesheet" href="viewer:///docs/2020.10/IMEX/Skins/style.css" />"#
        );
    }

    #[test]
    fn test_rewrite_script_and_image() {
        let html = r#"<script src="js/a.js"></script><img class="x" src="img/b.svg">"#;
        let out = rewrite(html, &source(), &FakeMapper, &plain());
        assert!(out.contains(r#"src="viewer:///docs/2020.10/IMEX/Content/js/a.js""#));
        assert!(out.contains(r#"src="viewer:///docs/2020.10/IMEX/Content/img/b.svg""#));
    }

    #[test]
    fn test_image_without_src_is_untouched() {
        let html = r#"<img alt="no source"><p>text</p>"#;
        let out = rewrite(html, &source(), &FakeMapper, &plain());
        assert_eq!(out, html);
    }

    #[test]
    fn test_anchor_becomes_command() {
        let html = r#"<p>See <a class="k" href="WELL.htm">WELL</a></p>"#;
        let out = rewrite(html, &source(), &FakeMapper, &plain());
        assert_eq!(
            out,
            r#"<p>See <a class="k" href="command:cmg-help.openDocumentation?%22WELL.htm%22">WELL</a></p>"#
        );
    }

    #[test]
    fn test_only_first_attribute_per_tag() {
        let html = r#"<img src="a.png" src="b.png">"#;
        let out = rewrite(html, &source(), &FakeMapper, &plain());
        assert!(out.contains(r#"src="b.png""#));
        assert!(!out.contains(r#"src="a.png""#));
    }

    #[test]
    fn test_abbr_is_not_an_anchor() {
        let html = r#"<abbr href="x.htm">x</abbr>"#;
        let out = rewrite(html, &source(), &FakeMapper, &plain());
        assert_eq!(out, html);
    }

    #[test]
    fn test_external_urls_are_not_special_cased() {
        let html = r#"<a href="https://example.com/">ext</a>"#;
        let out = rewrite(html, &source(), &FakeMapper, &plain());
        assert!(out.contains("command:cmg-help.openDocumentation?"));
    }

    #[test]
    fn test_rewrite_is_pure() {
        let html = r#"<link href="s.css"><a href="x.htm">x</a><img src="i.png">"#;
        let options = RewriteOptions::default().with_theme(Theme::Dark);
        let first = rewrite(html, &source(), &FakeMapper, &options);
        let second = rewrite(html, &source(), &FakeMapper, &options);
        assert_eq!(first, second);
    }

    #[test]
    fn test_script_is_appended() {
        let html = "<html><body>x</body></html>";
        let out = rewrite(html, &source(), &FakeMapper, &RewriteOptions::default());
        assert!(out.starts_with(html));
        assert!(out.contains("acquireVsCodeApi"));
        assert!(out.contains("%2Fdocs%2F2020.10%2FIMEX%2FContent"));
        assert!(out.contains("'command:cmg-help.openDocumentation'"));
    }

    #[test]
    fn test_theme_style() {
        let out = rewrite("x", &source(), &FakeMapper, &plain().with_theme(Theme::Dark));
        assert!(out.contains("background-color: #1f1f1f"));
    }

    #[test]
    fn test_click_round_trip() {
        let html = r#"<a href="WELL.htm">WELL</a>"#;
        let out = rewrite(html, &source(), &FakeMapper, &plain());

        let start = out.find("href=\"").unwrap() + "href=\"".len();
        let end = start + out[start..].find('"').unwrap();
        let href = &out[start..end];

        let message = NavigationMessage::from_click(href, source().parent().unwrap());
        assert_eq!(
            message.resolve_target().unwrap(),
            PathBuf::from("/docs/2020.10/IMEX/Content/WELL.htm")
        );
    }
}
