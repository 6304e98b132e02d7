//! Builds the pokedex table from an HTML document

use scraper::{Html, Selector};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use super::Pokedex;

/// Cells holding the numeric ids
const ID_SELECTOR: &str = "tr .infocard-cell-data";
/// Cells holding the names
const NAME_SELECTOR: &str = "tr .ent-name";

/// Errors that can occur while building the pokedex
#[derive(Debug, Error)]
pub enum LoaderError {
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("failed to read pokedex document: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid selector '{selector}': {reason}")]
  Selector { selector: &'static str, reason: String },

  #[error("no pokedex entries found in document")]
  Empty,
}

/// Location of the pokedex document
#[derive(Debug, Clone, PartialEq)]
pub enum PokedexSource {
  /// Fetch the page over HTTP
  Url(String),
  /// Read a saved copy of the page
  File(PathBuf),
}

impl std::fmt::Display for PokedexSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      PokedexSource::Url(url) => write!(f, "{}", url),
      PokedexSource::File(path) => write!(f, "{}", path.display()),
    }
  }
}

/// Fetch the document from `source` and build the table.
///
/// Runs once before the server accepts requests. Any failure is fatal to
/// startup; there is no retry.
pub async fn load_pokedex(source: &PokedexSource) -> Result<Pokedex, LoaderError> {
  info!("Loading pokedex from {}", source);

  let document = match source {
    PokedexSource::Url(url) => {
      let response = reqwest::get(url.as_str()).await?.error_for_status()?;
      response.text().await?
    }
    PokedexSource::File(path) => tokio::fs::read_to_string(path).await?,
  };
  debug!("Fetched pokedex document, {} bytes", document.len());

  let pokedex = parse_pokedex(&document)?;
  info!("Pokedex loaded with {} entries", pokedex.len());
  Ok(pokedex)
}

/// Extract ids and names from the document and zip them into a table
pub fn parse_pokedex(document: &str) -> Result<Pokedex, LoaderError> {
  let html = Html::parse_document(document);
  let ids = select_tokens(&html, ID_SELECTOR)?;
  let names = select_tokens(&html, NAME_SELECTOR)?;

  if ids.len() != names.len() {
    debug!(
      "Pokedex column length mismatch: {} ids, {} names",
      ids.len(),
      names.len()
    );
  }

  let pokedex = Pokedex::from_pairs(ids.into_iter().zip(names));
  if pokedex.is_empty() {
    return Err(LoaderError::Empty);
  }
  Ok(pokedex)
}

/// Text of every match joined by a space, then split on whitespace
fn select_tokens(html: &Html, selector: &'static str) -> Result<Vec<String>, LoaderError> {
  let parsed = Selector::parse(selector).map_err(|e| LoaderError::Selector {
    selector,
    reason: e.to_string(),
  })?;

  let text = html
    .select(&parsed)
    .map(|element| element.text().collect::<String>())
    .collect::<Vec<_>>()
    .join(" ");

  Ok(text.split_whitespace().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"
<html><body>
<table id="pokedex">
  <thead><tr><th>#</th><th>Name</th></tr></thead>
  <tbody>
    <tr>
      <td class="cell-num cell-fixed"><span class="infocard-cell-data">0001</span></td>
      <td class="cell-name"><a class="ent-name" href="/pokedex/bulbasaur">Bulbasaur</a></td>
    </tr>
    <tr>
      <td class="cell-num cell-fixed"><span class="infocard-cell-data">0004</span></td>
      <td class="cell-name"><a class="ent-name" href="/pokedex/charmander">Charmander</a></td>
    </tr>
  </tbody>
</table>
</body></html>
"#;

  fn row(id: &str, name: &str) -> String {
    format!(
      r#"<tr><td><span class="infocard-cell-data">{}</span></td><td><a class="ent-name">{}</a></td></tr>"#,
      id, name
    )
  }

  fn table(rows: &[String]) -> String {
    format!("<html><body><table>{}</table></body></html>", rows.concat())
  }

  #[test]
  fn test_parse_sample() {
    let pokedex = parse_pokedex(SAMPLE).unwrap();
    assert_eq!(pokedex.len(), 2);
    assert_eq!(pokedex.get("0001"), Some("Bulbasaur"));
    assert_eq!(pokedex.get("0004"), Some("Charmander"));
  }

  #[test]
  fn test_parse_three_digit_ids() {
    let doc = table(&[row("001", "Bulbasaur"), row("002", "Ivysaur"), row("003", "Venusaur")]);
    let pokedex = parse_pokedex(&doc).unwrap();
    assert_eq!(pokedex.lookup(2), Ok(("002", "Ivysaur")));
  }

  #[test]
  fn test_parse_duplicate_id_keeps_last() {
    let doc = table(&[row("003", "Venusaur"), row("003", "Mega")]);
    let pokedex = parse_pokedex(&doc).unwrap();
    assert_eq!(pokedex.len(), 1);
    assert_eq!(pokedex.get("003"), Some("Mega"));
  }

  #[test]
  fn test_parse_splits_on_whitespace() {
    // Multi-word names are split like every other blob, shifting later pairs
    let doc = table(&[row("122", "Mr. Mime"), row("123", "Scyther")]);
    let pokedex = parse_pokedex(&doc).unwrap();
    assert_eq!(pokedex.get("122"), Some("Mr."));
    assert_eq!(pokedex.get("123"), Some("Mime"));
  }

  #[test]
  fn test_parse_empty_document() {
    let result = parse_pokedex("<html><body><p>maintenance</p></body></html>");
    assert!(matches!(result, Err(LoaderError::Empty)));
  }

  #[tokio::test]
  async fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pokedex.html");
    std::fs::write(&path, table(&[row("001", "Bulbasaur")])).unwrap();

    let pokedex = load_pokedex(&PokedexSource::File(path)).await.unwrap();
    assert_eq!(pokedex.get("001"), Some("Bulbasaur"));
  }

  /// Serve `status` and `body` at /pokedex on an ephemeral port
  async fn serve_document(status: axum::http::StatusCode, body: String) -> String {
    let app = axum::Router::new().route(
      "/pokedex",
      axum::routing::get(move || async move { (status, body) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      let _ = axum::serve(listener, app).await;
    });
    format!("http://{}/pokedex", addr)
  }

  #[tokio::test]
  async fn test_load_from_url() {
    let url = serve_document(axum::http::StatusCode::OK, table(&[row("025", "Pikachu")])).await;

    let pokedex = load_pokedex(&PokedexSource::Url(url)).await.unwrap();
    assert_eq!(pokedex.get("025"), Some("Pikachu"));
  }

  #[tokio::test]
  async fn test_load_from_url_error_status() {
    let url = serve_document(axum::http::StatusCode::NOT_FOUND, "gone".to_string()).await;

    let result = load_pokedex(&PokedexSource::Url(url)).await;
    match result {
      Err(LoaderError::Http(e)) => assert_eq!(e.status(), Some(reqwest::StatusCode::NOT_FOUND)),
      other => panic!("expected Http error, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_load_from_unreachable_url() {
    // Bind then drop to get a port with nothing listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = PokedexSource::Url(format!("http://{}/pokedex", addr));
    assert!(matches!(load_pokedex(&source).await, Err(LoaderError::Http(_))));
  }

  #[tokio::test]
  async fn test_load_missing_file() {
    let source = PokedexSource::File(PathBuf::from("/nonexistent/pokedex.html"));
    let result = load_pokedex(&source).await;
    assert!(matches!(result, Err(LoaderError::Io(_))));
  }
}
