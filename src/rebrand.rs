//! Branded `phpinfo()`.
//!
//! After startup the interpreter's own `phpinfo` handler is swapped for one
//! that renders the stock report into a buffer, injects [`TORO_CSS`] at the
//! first `</style>`, and writes the result back out through PHP's output
//! layer. A report without `</style>` is written back untouched.

#[cfg(feature = "php")]
mod handler;

#[cfg(feature = "php")]
pub use handler::{install, zif_phptoro_phpinfo, Installed};

/// Splice point in the stock report.
pub const SPLICE_MARKER: &[u8] = b"</style>";

/// Embedder stylesheet.
///
/// Opens by closing the stock `<style>` block and ends inside a fresh one,
/// so the report's own `</style>` closes it.
pub const TORO_CSS: &str = concat!(
    "</style>\n<style>\n",
    ":root { --toro: #a20009; --toro-light: #f5d0d2; --toro-dark: #6b0006; }\n",
    "body { background-color: #fff; color: #222; font-family: sans-serif; }\n",
    "pre { margin: 0; font-family: monospace; }\n",
    "a { color: var(--toro); }\n",
    "a:hover { text-decoration: none; }\n",
    "table { border-collapse: collapse; border: 0; width: 934px; box-shadow: 1px 2px 3px rgba(0,0,0,.2); }\n",
    ".center { text-align: center; }\n",
    ".center table { margin: 1em auto; text-align: left; }\n",
    ".center th { text-align: center !important; }\n",
    "td, th { border: 1px solid #999; font-size: 75%; vertical-align: baseline; padding: 4px 5px; }\n",
    "th { position: sticky; top: 0; background: inherit; }\n",
    "h1 { font-size: 150%; color: var(--toro); }\n",
    "h2 { font-size: 125%; color: var(--toro); }\n",
    "h2 > a { text-decoration: none; }\n",
    "h2 > a:hover { text-decoration: underline; }\n",
    ".p { text-align: left; }\n",
    ".e { background-color: var(--toro-light); width: 300px; font-weight: bold; }\n",
    ".h { background-color: var(--toro); color: #fff; font-weight: bold; }\n",
    ".v { background-color: #f0f0f0; max-width: 300px; overflow-x: auto; word-wrap: break-word; }\n",
    ".v i { color: #999; }\n",
    "img { float: right; border: 0; }\n",
    "hr { width: 934px; background-color: #ddd; border: 0; height: 1px; }\n",
    "@media (prefers-color-scheme: dark) {\n",
    "  body { background: #1a1a1a; color: #e0e0e0; }\n",
    "  .h td, td.e, th { border-color: #555; }\n",
    "  td { border-color: #444; }\n",
    "  .e { background-color: #3d1012; color: var(--toro-light); }\n",
    "  .h { background-color: var(--toro-dark); color: #fff; }\n",
    "  .v { background-color: #1a1a1a; }\n",
    "  hr { background-color: #444; }\n",
    "  h1, h2, a { color: #e05060; }\n",
    "}\n",
);

/// The stock report cut at the splice point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Splice<'a> {
    /// `head` ends just before the first `</style>`, `tail` starts with it.
    Injected { head: &'a [u8], tail: &'a [u8] },
    /// No `</style>` in the report.
    Untouched(&'a [u8]),
}

impl<'a> Splice<'a> {
    /// Byte slices in emission order.
    pub fn chunks(&self) -> Vec<&'a [u8]> {
        match *self {
            Splice::Injected { head, tail } => vec![head, TORO_CSS.as_bytes(), tail],
            Splice::Untouched(all) => vec![all],
        }
    }

    /// Concatenated output.
    pub fn to_vec(&self) -> Vec<u8> {
        self.chunks().concat()
    }

    pub fn is_injected(&self) -> bool {
        matches!(self, Splice::Injected { .. })
    }
}

/// Cut `stock` at the first `</style>`.
pub fn splice(stock: &[u8]) -> Splice<'_> {
    match find(stock, SPLICE_MARKER) {
        Some(k) => Splice::Injected {
            head: &stock[..k],
            tail: &stock[k..],
        },
        None => Splice::Untouched(stock),
    }
}

/// First offset of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STOCK: &[u8] = b"<html><head><style type=\"text/css\">\nbody {}\n</style>\n<title>PHP</title></head><body>x</body></html>";

    #[test]
    fn test_css_shape() {
        assert!(TORO_CSS.starts_with("</style>\n<style>\n"));
        assert!(TORO_CSS.ends_with("}\n"));
        assert!(TORO_CSS.contains("--toro:"));
    }

    #[test]
    fn test_splice_at_first_marker() {
        let k = find(STOCK, SPLICE_MARKER).unwrap();
        let out = splice(STOCK).to_vec();

        let mut expected = STOCK[..k].to_vec();
        expected.extend_from_slice(TORO_CSS.as_bytes());
        expected.extend_from_slice(&STOCK[k..]);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_splice_uses_least_offset() {
        let stock = b"a</style>b</style>c";
        match splice(stock) {
            Splice::Injected { head, tail } => {
                assert_eq!(head, b"a");
                assert_eq!(tail, b"</style>b</style>c");
            }
            other => panic!("expected injection, got {:?}", other),
        }
    }

    #[test]
    fn test_no_marker_untouched() {
        let stock = b"phpinfo()\nPHP Version => 8.4.0\n";
        let s = splice(stock);
        assert!(!s.is_injected());
        assert_eq!(s.to_vec(), stock.to_vec());
    }

    #[test]
    fn test_empty_and_short_inputs() {
        assert_eq!(splice(b""), Splice::Untouched(b""));
        assert_eq!(splice(b"</sty"), Splice::Untouched(b"</sty"));
    }

    #[test]
    fn test_marker_at_start() {
        let s = splice(b"</style>rest");
        assert_eq!(
            s,
            Splice::Injected {
                head: b"",
                tail: b"</style>rest"
            }
        );
    }

    #[test]
    fn test_style_closed_before_toro_vars() {
        let out = String::from_utf8(splice(STOCK).to_vec()).unwrap();
        let first_close = out.find("</style>").unwrap();
        let toro = out.find("--toro:").unwrap();
        assert!(first_close < toro);

        // Balanced: every <style opens exactly one block
        assert_eq!(out.matches("<style").count(), out.matches("</style>").count());
    }
}
