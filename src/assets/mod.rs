//! Asynchronous model and skybox loading.
//!
//! Every load returns a [`LoadHandle`] the caller polls once per frame.
//! Natively each load runs on its own worker thread and reads from disk; in
//! the browser it runs as a future on the main thread and fetches over HTTP.

mod gltf_model;
mod handle;
mod skybox;
#[cfg(target_arch = "wasm32")]
mod web;

pub use gltf_model::{parse_model, ModelData};
pub use handle::{LoadHandle, LoadStatus};
pub use skybox::{decode_cube_faces, CubeFaces};

use cfg_if::cfg_if;

use crate::config::ModelPlacement;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("{url} responded with HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("invalid glTF in {label}: {source}")]
    Gltf {
        label: String,
        #[source]
        source: gltf::Error,
    },
    #[error("{label} contains no triangle geometry")]
    EmptyModel { label: String },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("skybox face {path} is {width}x{height}, expected {expected}x{expected}")]
    FaceSize { path: String, width: u32, height: u32, expected: u32 },
    #[error("load of {label} stopped before reporting a result")]
    Abandoned { label: String },
    #[error("failed to start loader for {label}: {source}")]
    Spawn {
        label: String,
        #[source]
        source: std::io::Error,
    },
}

/// Starts loads for files below an asset root (a directory natively, a URL
/// prefix in the browser)
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: String,
}

impl AssetLoader {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    /// Join `relative` onto the asset root
    pub fn resolve(&self, relative: &str) -> String {
        let relative = relative.trim_start_matches("./").trim_start_matches('/');
        let root = self.root.trim_end_matches('/');
        if root.is_empty() {
            relative.to_string()
        } else {
            format!("{root}/{relative}")
        }
    }

    pub fn load_model(&self, placement: &ModelPlacement) -> LoadHandle<ModelData> {
        let label = placement.path.clone();
        let source = self.resolve(&placement.path);
        tracing::info!(model = %label, %source, "loading model");

        cfg_if! {
            if #[cfg(target_arch = "wasm32")] {
                spawn_job(label.clone(), async move {
                    let bytes = web::fetch_bytes(&source).await?;
                    parse_model(&label, &bytes)
                })
            } else {
                spawn_job(label.clone(), move || {
                    let bytes = read_file(&source)?;
                    parse_model(&label, &bytes)
                })
            }
        }
    }

    pub fn load_skybox(&self, faces: &[String; 6]) -> LoadHandle<CubeFaces> {
        let sources: [String; 6] = std::array::from_fn(|i| self.resolve(&faces[i]));
        tracing::info!(first = %sources[0], "loading skybox");

        cfg_if! {
            if #[cfg(target_arch = "wasm32")] {
                spawn_job("skybox".to_string(), async move {
                    let mut encoded: [(String, Vec<u8>); 6] = Default::default();
                    for (slot, source) in encoded.iter_mut().zip(sources) {
                        let bytes = web::fetch_bytes(&source).await?;
                        *slot = (source, bytes);
                    }
                    decode_cube_faces(encoded)
                })
            } else {
                spawn_job("skybox".to_string(), move || {
                    let mut encoded: [(String, Vec<u8>); 6] = Default::default();
                    for (slot, source) in encoded.iter_mut().zip(sources) {
                        let bytes = read_file(&source)?;
                        *slot = (source, bytes);
                    }
                    decode_cube_faces(encoded)
                })
            }
        }
    }
}

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        fn spawn_job<T, F>(label: String, job: F) -> LoadHandle<T>
        where
            T: 'static,
            F: std::future::Future<Output = Result<T, AssetError>> + 'static,
        {
            let (tx, handle) = LoadHandle::channel(label);
            wasm_bindgen_futures::spawn_local(async move {
                let _ = tx.send(job.await);
            });
            handle
        }
    } else {
        fn spawn_job<T, F>(label: String, job: F) -> LoadHandle<T>
        where
            T: Send + 'static,
            F: FnOnce() -> Result<T, AssetError> + Send + 'static,
        {
            let (tx, handle) = LoadHandle::channel(label.clone());
            let spawned = std::thread::Builder::new()
                .name(format!("load {label}"))
                .spawn(move || {
                    // receiver gone means nobody is waiting for this any more
                    let _ = tx.send(job());
                });
            match spawned {
                Ok(_) => handle,
                Err(source) => LoadHandle::resolved(label.clone(), Err(AssetError::Spawn { label, source })),
            }
        }

        fn read_file(path: &str) -> Result<Vec<u8>, AssetError> {
            std::fs::read(path).map_err(|source| AssetError::Io { path: path.to_string(), source })
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn resolves_relative_paths() {
        let loader = AssetLoader::new("resources/");
        assert_eq!(loader.resolve("./cat_lowpoly.glb"), "resources/cat_lowpoly.glb");
        assert_eq!(loader.resolve("/posx.jpg"), "resources/posx.jpg");
        assert_eq!(AssetLoader::new("").resolve("dome.glb"), "dome.glb");
    }

    #[test]
    fn loads_model_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tri.glb"), gltf_model::tests::triangle_glb()).unwrap();

        let loader = AssetLoader::new(dir.path().to_string_lossy());
        let placement = ModelPlacement::new("tri.glb", 1.0, Vec3::ZERO);
        let model = loader.load_model(&placement).wait().unwrap();
        assert_eq!(model.label, "tri.glb");
        assert_eq!(model.mesh.vertices.len(), 3);
    }

    #[test]
    fn missing_model_fails_with_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(dir.path().to_string_lossy());
        let placement = ModelPlacement::new("nope.glb", 1.0, Vec3::ZERO);
        match loader.load_model(&placement).wait() {
            Err(AssetError::Io { path, .. }) => assert!(path.ends_with("nope.glb")),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn skybox_with_missing_face_fails() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(dir.path().to_string_lossy());
        let faces = crate::config::SkyboxConfig::default().faces;
        assert!(matches!(loader.load_skybox(&faces).wait(), Err(AssetError::Io { .. })));
    }
}
