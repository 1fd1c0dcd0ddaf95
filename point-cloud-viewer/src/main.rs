mod engine;
mod rpc;
mod tools;

use engine::core::app_setup::create_app;
use engine::core::config::load_viewer_config;

fn main() {
    let config = load_viewer_config();
    let mut app = create_app(&config);

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.run();
    }
}
