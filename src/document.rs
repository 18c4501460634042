//! Field extraction from the portal's HTML pages.
//!
//! Pages are located by stable ids and input names. A missing field means the
//! page layout changed and surfaces as [`Error::Parse`].

use crate::{Error, Result};
use scraper::{ElementRef, Html, Node, Selector};

const ERROR_PANEL: &str = r#"form#form-error-confirmation p[role="alert"]"#;

pub struct Document {
    html: Html,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::parse(format!("invalid selector {css}: {e:?}")))
}

/// Text content of `element`, `<br>` rendered as a newline.
fn text_with_breaks(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(chunk) => text.push_str(chunk),
            Node::Element(e) if e.name() == "br" => text.push('\n'),
            _ => {}
        }
    }
    text
}

impl Document {
    #[must_use]
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    fn first(&self, css: &str) -> Result<Option<ElementRef<'_>>> {
        let selector = selector(css)?;
        Ok(self.html.select(&selector).next())
    }

    /// # Errors
    /// Returns an error only for an invalid selector.
    pub fn has(&self, css: &str) -> Result<bool> {
        Ok(self.first(css)?.is_some())
    }

    /// Trimmed attribute of the first element matching `css`.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] if no element matches or it lacks `attr`.
    pub fn attr(&self, css: &str, attr: &str) -> Result<String> {
        self.first(css)?
            .and_then(|element| element.value().attr(attr))
            .map(|value| value.trim().to_string())
            .ok_or_else(|| Error::parse(format!("{css}[{attr}] not found")))
    }

    /// Trimmed text content of the first element matching `css`.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] if no element matches.
    pub fn text(&self, css: &str) -> Result<String> {
        self.first(css)?
            .map(|element| element.text().collect::<String>().trim().to_string())
            .ok_or_else(|| Error::parse(format!("{css} not found")))
    }

    /// Value of `<input name="...">`.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] if the input is absent.
    pub fn input(&self, name: &str) -> Result<String> {
        self.attr(&format!(r#"input[name="{name}"]"#), "value")
    }

    /// Message of the portal's error confirmation panel, if the page shows one.
    #[must_use]
    pub fn error_panel(&self) -> Option<String> {
        let selector = selector(ERROR_PANEL).ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|panel| text_with_breaks(panel).trim().to_string())
    }

    /// # Errors
    /// Returns [`Error::Portal`] carrying the panel text when present.
    pub fn check_error(&self) -> Result<()> {
        match self.error_panel() {
            Some(message) => Err(Error::Portal { message }),
            None => Ok(()),
        }
    }

    /// Cell texts of every data row of the tables inside `container`.
    ///
    /// Rows without `<td>` cells (headers) are skipped.
    ///
    /// # Errors
    /// Returns an error only for an invalid selector.
    pub fn table_rows(&self, container: &str) -> Result<Vec<Vec<String>>> {
        let rows = selector(&format!("{container} table tr"))?;
        let cells = selector("td")?;

        Ok(self
            .html
            .select(&rows)
            .map(|row| {
                row.select(&cells)
                    .map(|cell| cell.text().collect::<String>().trim().to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|row| !row.is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <form id="login"><input name="token" value="  abc123  "></form>
          <dl id="content-expiration-date"><dt>Exp</dt><dd> 12/27 </dd></dl>
          <div id="tables">
            <table>
              <tr><th>Date</th><th>Shop</th></tr>
              <tr><td> 01/02/2024 </td><td>Shop</td></tr>
            </table>
          </div>
        </body></html>
    "#;

    #[test]
    fn input_value_is_trimmed() {
        let doc = Document::parse(PAGE);
        assert_eq!(doc.input("token").ok().as_deref(), Some("abc123"));
    }

    #[test]
    fn missing_field_is_a_parse_error() {
        let doc = Document::parse(PAGE);
        assert!(matches!(doc.input("PaReq"), Err(Error::Parse(_))));
        assert!(matches!(doc.text("#nowhere"), Err(Error::Parse(_))));
    }

    #[test]
    fn has_detects_nodes() {
        let doc = Document::parse(PAGE);
        assert!(matches!(doc.has("form#login"), Ok(true)));
        assert!(matches!(doc.has("form#form-3ds-authentificate"), Ok(false)));
    }

    #[test]
    fn text_is_trimmed() {
        let doc = Document::parse(PAGE);
        assert_eq!(
            doc.text("dl#content-expiration-date dd").ok().as_deref(),
            Some("12/27")
        );
    }

    #[test]
    fn table_rows_skip_headers() {
        let doc = Document::parse(PAGE);
        let rows = doc.table_rows("div#tables").unwrap_or_default();
        assert_eq!(rows, vec![vec!["01/02/2024".to_string(), "Shop".to_string()]]);
    }

    #[test]
    fn error_panel_turns_breaks_into_newlines() {
        let doc = Document::parse(
            r#"<form id="form-error-confirmation">
                 <p role="alert">
                   Votre session a expir&eacute;.<br>Veuillez vous reconnecter.
                 </p>
               </form>"#,
        );
        assert_eq!(
            doc.error_panel().as_deref(),
            Some("Votre session a expiré.\nVeuillez vous reconnecter.")
        );
        assert!(matches!(doc.check_error(), Err(Error::Portal { .. })));
    }

    #[test]
    fn no_panel_no_error() {
        let doc = Document::parse(PAGE);
        assert!(doc.error_panel().is_none());
        assert!(doc.check_error().is_ok());
    }
}
