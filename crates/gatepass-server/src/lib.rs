//! Server assembly for gate entry: configuration, storage selection and the
//! outer router.
//!
//! The binary in `main.rs` is a thin shell over [`load_config`] and
//! [`build_router`].

pub mod error;

pub use error::{Error, Result};

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use gatepass_core::{
  photo::{DEFAULT_PHOTO_CEILING, PhotoGuard},
  pipeline::VisitorPipeline,
  store::VisitorRepository,
};
use gatepass_store_local::LocalStore;
use gatepass_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Which backend visitor records are written to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
  /// The relational backend; records are written storage-shape.
  #[default]
  Sqlite,
  /// The JSON document fallback; records are kept domain-shape.
  Local,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `GATEPASS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub storage:          StorageMode,
  /// Defaults to `gatepass.db` or `gatepass.json` depending on `storage`.
  pub store_path:       Option<PathBuf>,
  /// Photo payloads longer than this many characters draw a warning.
  pub photo_warn_chars: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "127.0.0.1".to_owned(),
      port:             8080,
      storage:          StorageMode::default(),
      store_path:       None,
      photo_warn_chars: DEFAULT_PHOTO_CEILING,
    }
  }
}

impl ServerConfig {
  /// The configured store path with `~/` expanded.
  pub fn store_path(&self) -> PathBuf {
    match &self.store_path {
      Some(path) => expand_tilde(path),
      None => match self.storage {
        StorageMode::Sqlite => PathBuf::from("gatepass.db"),
        StorageMode::Local => PathBuf::from("gatepass.json"),
      },
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Layer the TOML file at `path` (optional) under `GATEPASS_*` variables.
pub fn load_config(path: &Path) -> Result<ServerConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("GATEPASS"))
    .build()?;
  Ok(settings.try_deserialize()?)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Wrap the API router for `repo` with request tracing.
pub fn router<R>(repo: R, guard: PhotoGuard) -> Router
where
  R: VisitorRepository + 'static,
{
  let pipeline = VisitorPipeline::new(Arc::new(repo)).with_photo_guard(guard);
  gatepass_api::api_router(pipeline).layer(TraceLayer::new_for_http())
}

/// Open the configured backend and build the full application router.
pub async fn build_router(cfg: &ServerConfig) -> Result<Router> {
  let path = cfg.store_path();
  let guard = PhotoGuard::with_ceiling(cfg.photo_warn_chars);

  let app = match cfg.storage {
    StorageMode::Sqlite => router(SqliteStore::open(&path).await?, guard),
    StorageMode::Local => router(LocalStore::open(&path).await?, guard),
  };

  tracing::info!(
    storage = ?cfg.storage,
    path = %path.display(),
    photo_warn_chars = cfg.photo_warn_chars,
    "store opened"
  );
  Ok(app)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tower::ServiceExt;

  use super::*;

  fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
      .join(format!("gatepass-server-{}-{name}", std::process::id()))
  }

  #[test]
  fn missing_config_file_gives_defaults() {
    let cfg = load_config(Path::new("/nonexistent/gatepass.toml")).unwrap();
    assert_eq!(cfg.storage, StorageMode::Sqlite);
    assert_eq!(cfg.photo_warn_chars, DEFAULT_PHOTO_CEILING);
    assert_eq!(cfg.store_path(), PathBuf::from("gatepass.db"));
  }

  #[test]
  fn config_file_overrides_defaults() {
    let path = temp_path("overrides.toml");
    std::fs::write(
      &path,
      "host = \"0.0.0.0\"\nport = 9000\nstorage = \"local\"\nphoto_warn_chars \
       = 2048\n",
    )
    .unwrap();

    let cfg = load_config(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(cfg.address(), "0.0.0.0:9000");
    assert_eq!(cfg.storage, StorageMode::Local);
    assert_eq!(cfg.photo_warn_chars, 2048);
    assert_eq!(cfg.store_path(), PathBuf::from("gatepass.json"));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/gate/visitors.db")),
      PathBuf::from(home).join("gate/visitors.db")
    );
    assert_eq!(
      expand_tilde(Path::new("/var/lib/gatepass.db")),
      PathBuf::from("/var/lib/gatepass.db")
    );
  }

  async fn post_visitor(app: Router, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
      .method("POST")
      .uri("/visitors")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn built_router_serves_both_storage_modes() {
    let modes = [
      (StorageMode::Sqlite, "serve.db"),
      (StorageMode::Local, "serve.json"),
    ];
    for (storage, name) in modes {
      let path = temp_path(name);
      let cfg = ServerConfig {
        storage,
        store_path: Some(path.clone()),
        photo_warn_chars: 8,
        ..Default::default()
      };

      let app = build_router(&cfg).await.unwrap();
      let (status, body) = post_visitor(
        app,
        json!({
          "name": "Ravi Kumar",
          "residentId": "r1",
          "societyId": "s1",
          "photo": "data:image/jpeg;base64,AAAAAAAA",
        }),
      )
      .await;

      assert_eq!(status, StatusCode::CREATED, "{storage:?}");
      assert_eq!(body["visitor"]["residentId"], json!("r1"));
      assert!(
        body["warnings"][0]
          .as_str()
          .unwrap()
          .contains("character ceiling"),
        "{storage:?}"
      );

      let _ = std::fs::remove_file(&path);
    }
  }
}
