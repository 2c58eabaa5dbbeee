//! timeline-wasm — WebAssembly worker bindings for timeline-core
//!
//! Meant to run inside a dedicated Web Worker. The page posts a load
//! request, the worker answers with `progress` messages and exactly one
//! `done` or `error` message.
//!
//! What it provides
//! ----------------
//! - Automatic panic hook on module load (via `#[wasm_bindgen(start)]`)
//! - `handle_message(data, postMessage)`: the whole load protocol
//! - `detect_format(json)`: which export schema a document is
//! - `analyze_json(json, options)`: one-shot analysis of an in-memory document
//!
//! Quick start (worker)
//! --------------------
//! ```javascript
//! import init, { handle_message } from 'timeline-wasm';
//!
//! const ready = init();
//! self.onmessage = async (e) => {
//!   await ready;
//!   handle_message(e.data, (msg) => self.postMessage(msg));
//! };
//! ```
//!
//! Page side:
//! ```javascript
//! worker.postMessage({ type: 'load', source: { files: input.files }, options: { previewLimit: 200 } });
//! worker.onmessage = (e) => {
//!   if (e.data.type === 'progress') status.textContent = e.data.message;
//!   if (e.data.type === 'done') render(e.data.data);
//!   if (e.data.type === 'error') alert(e.data.error);
//! };
//! ```
//!
//! Notes
//! -----
//! - Files are read with `FileReaderSync` and URLs with a synchronous
//!   `XMLHttpRequest`. Both are only available in workers.
//! - Responses are plain JSON-compatible objects (maps become objects).
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, FileReaderSync, XmlHttpRequest};

use timeline_core::job::{analyze, parse_document, Job, LOAD_REQUEST};
use timeline_core::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"Initializing timeline WASM worker...".into());
}

/* --------------------------------------------------------------------------
   Acquisition
-------------------------------------------------------------------------- */

/// Worker-side acquirer: `File`/`Blob` inputs and same-origin or CORS URLs.
#[derive(Debug, Default)]
pub struct WorkerSource;

fn js_err(value: JsValue) -> TimelineError {
    TimelineError::Acquisition(
        value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}")),
    )
}

impl Acquire for WorkerSource {
    type File = Blob;

    fn fetch_url(&mut self, url: &str) -> Result<String> {
        let xhr = XmlHttpRequest::new().map_err(js_err)?;
        xhr.open_with_async("GET", url, false).map_err(js_err)?;
        xhr.send().map_err(js_err)?;

        let status = xhr.status().map_err(js_err)?;
        if !(200..300).contains(&status) {
            return Err(TimelineError::Fetch { status });
        }
        Ok(xhr.response_text().map_err(js_err)?.unwrap_or_default())
    }

    fn read_file(&mut self, file: &Blob) -> Result<String> {
        FileReaderSync::new()
            .map_err(js_err)?
            .read_as_text(file)
            .map_err(js_err)
    }
}

/* --------------------------------------------------------------------------
   Message protocol
-------------------------------------------------------------------------- */

fn post_message(post: &js_sys::Function, message: &WorkerMessage) {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    match message.serialize(&serializer) {
        Ok(value) => {
            if let Err(e) = post.call1(&JsValue::NULL, &value) {
                web_sys::console::error_1(&e);
            }
        }
        Err(e) => web_sys::console::error_1(&e.into()),
    }
}

fn get(target: &JsValue, key: &str) -> JsValue {
    js_sys::Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

fn is_absent(value: &JsValue) -> bool {
    value.is_undefined() || value.is_null()
}

/// A non-empty `url` wins over `files`; `files` may be an array or a `FileList`.
fn read_source(data: &JsValue) -> Result<Option<Source<Blob>>> {
    let source = get(data, "source");
    if is_absent(&source) {
        return Ok(None);
    }

    if let Some(url) = get(&source, "url").as_string().filter(|u| !u.is_empty()) {
        return Ok(Some(Source::url(url)));
    }

    let files = get(&source, "files");
    if is_absent(&files) {
        return Ok(Some(Source::files(Vec::new())));
    }
    if !js_sys::Array::is_array(&files) && get(&files, "length").as_f64().is_none() {
        return Err(TimelineError::InvalidRequest(
            "source.files must be a list of files".into(),
        ));
    }

    js_sys::Array::from(&files)
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.dyn_into::<Blob>().map_err(|_| {
                TimelineError::InvalidRequest(format!("source.files[{i}] is not a File"))
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(|files| Some(Source::files(files)))
}

fn read_options(value: JsValue) -> Result<JobOptions> {
    if is_absent(&value) {
        return Ok(JobOptions::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| TimelineError::InvalidRequest(e.to_string()))
}

fn read_request(data: &JsValue) -> Result<LoadRequest<Blob>> {
    Ok(LoadRequest {
        kind: LOAD_REQUEST.to_owned(),
        source: read_source(data)?,
        options: read_options(get(data, "options"))?,
    })
}

/// Runs one worker request, posting every message through `post`.
///
/// Returns the terminal job state, or `undefined` when the message was not a
/// load request and was ignored.
#[wasm_bindgen]
pub fn handle_message(data: JsValue, post: &js_sys::Function) -> Option<String> {
    if get(&data, "type").as_string().as_deref() != Some(LOAD_REQUEST) {
        return None;
    }

    let mut sink = |message: WorkerMessage| post_message(post, &message);
    let state = match read_request(&data) {
        Ok(request) => run_job(&request, &mut WorkerSource, &mut sink),
        Err(e) => Job::new(&mut sink).finish(Err(e)),
    };
    Some(state.to_string())
}

/* --------------------------------------------------------------------------
   One-shot helpers
-------------------------------------------------------------------------- */

/// Schema tag of a JSON document (`"unknown"` when it does not parse).
#[wasm_bindgen]
pub fn detect_format(json: &str) -> String {
    parse_document(json)
        .map(|doc| detect_type(&doc))
        .unwrap_or(DataType::Unknown)
        .as_str()
        .to_owned()
}

/// Analyzes one in-memory document and returns the `done` payload.
#[wasm_bindgen]
pub fn analyze_json(json: &str, options: JsValue) -> std::result::Result<JsValue, JsValue> {
    let to_js = |e: TimelineError| JsValue::from_str(&e.to_string());

    let options = read_options(options).map_err(to_js)?;
    let doc = parse_document(json).map_err(to_js)?;

    let mut quiet = |_: WorkerMessage| {};
    let mut job = Job::new(&mut quiet);
    let data = analyze(std::slice::from_ref(&doc), &options, &mut job).map_err(to_js)?;

    data.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(Into::into)
}
