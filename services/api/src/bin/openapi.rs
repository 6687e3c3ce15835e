//! services/api/src/bin/openapi.rs
//!
//! Dumps the bookshelf OpenAPI document for client generators.
//!
//! Usage: `openapi [PATH]`. PATH defaults to `openapi.json`; `-` prints to stdout.

use api_lib::web::rest::ApiDoc;
use std::io::Write;
use std::path::PathBuf;
use utoipa::OpenApi;

const DEFAULT_PATH: &str = "openapi.json";

enum Target {
    Stdout,
    File(PathBuf),
}

impl Target {
    fn from_arg(arg: Option<String>) -> Self {
        match arg.as_deref() {
            Some("-") => Target::Stdout,
            Some(path) => Target::File(PathBuf::from(path)),
            None => Target::File(PathBuf::from(DEFAULT_PATH)),
        }
    }
}

/// The API document as pretty-printed JSON, newline-terminated.
fn render() -> Result<String, serde_json::Error> {
    let mut document = ApiDoc::openapi().to_pretty_json()?;
    document.push('\n');
    Ok(document)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let document = render()?;
    match Target::from_arg(std::env::args().nth(1)) {
        Target::Stdout => std::io::stdout().lock().write_all(document.as_bytes())?,
        Target::File(path) => {
            let bytes = document.len();
            std::fs::write(&path, document)?;
            eprintln!("wrote {} bytes to {}", bytes, path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let document: serde_json::Value = serde_json::from_str(&render().unwrap()).unwrap();
        let paths = document["paths"].as_object().unwrap();
        for path in ["/api/v1/users", "/api/v1/authors", "/api/v1/books/{id}"] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn dash_means_stdout() {
        assert!(matches!(Target::from_arg(Some("-".into())), Target::Stdout));
        assert!(matches!(
            Target::from_arg(None),
            Target::File(p) if p == PathBuf::from(DEFAULT_PATH)
        ));
    }
}
