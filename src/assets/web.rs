use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use super::AssetError;

fn fetch_error(url: &str, err: JsValue) -> AssetError {
    AssetError::Fetch {
        url: url.to_string(),
        reason: err.as_string().unwrap_or_else(|| format!("{err:?}")),
    }
}

/// GET `url` and return the body
pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, AssetError> {
    let window = web_sys::window().ok_or_else(|| AssetError::Fetch {
        url: url.to_string(),
        reason: "no global `window`".to_string(),
    })?;

    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| fetch_error(url, e))?;
    let response: Response = response.dyn_into().map_err(|e| fetch_error(url, e))?;
    if !response.ok() {
        return Err(AssetError::HttpStatus { url: url.to_string(), status: response.status() });
    }

    let body = response.array_buffer().map_err(|e| fetch_error(url, e))?;
    let body = JsFuture::from(body).await.map_err(|e| fetch_error(url, e))?;
    Ok(js_sys::Uint8Array::new(&body).to_vec())
}
