//! WASM bindings for the figure node view.
//!
//! Exposes a resizable, alignable, captionable image node view to a
//! JavaScript rich-text editor. The host editor is described by a plain JS
//! object (see the `FigureHost` TypeScript interface); the extension hands
//! back node views plus commands and parse/render/input rules.

mod extension;
mod host;
mod types;
mod view;

pub use extension::*;
pub use host::JsHost;
pub use types::*;
pub use view::*;

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Route `tracing` output to the browser console. Debug builds log at
/// DEBUG, release builds at INFO. Calling it again is harmless.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let _ = set_global_default(Registry::default().with(wasm_layer));
}
