// Re-export all public modules so they can be used from main.rs
pub mod assets;
pub mod config;
pub mod error;
pub mod logging;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

#[cfg(target_arch = "wasm32")]
pub use web_entry::start;

#[cfg(target_arch = "wasm32")]
mod web_entry {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
    use web_sys::{Document, Event, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window};

    use crate::assets::AssetLoader;
    use crate::config::ViewerConfig;
    use crate::controller::input::{wasm as dom, InputEvent, KeyBindings};
    use crate::controller::Viewer;
    use crate::error::ViewerError;
    use crate::logging;
    use crate::ui;
    use crate::view::{GpuContext, Overlay, Renderer};

    #[wasm_bindgen(start)]
    pub async fn start() -> Result<(), JsValue> {
        logging::init();
        let (window, document, canvas) = init_canvas()?;

        let mut config = ViewerConfig::default();
        let query = window.location().search().unwrap_or_default();
        config.apply_query(&query).map_err(|e| js_error(e.to_string()))?;
        tracing::info!(variant = %config.variant, assets = %config.asset_root, "starting viewer");

        setup_app(window, document, canvas, config)
            .await
            .map_err(|e| js_error(format!("viewer setup failed: {e}")))
    }

    /// Main application setup for WASM
    async fn setup_app(
        window: Window,
        document: Document,
        canvas: HtmlCanvasElement,
        config: ViewerConfig,
    ) -> Result<(), ViewerError> {
        let (width, height) = (canvas.width(), canvas.height());
        let gpu = GpuContext::new(&canvas, width, height, config.render.msaa_samples).await?;

        let viewer = Rc::new(RefCell::new(Viewer::new(&config, width, height)));
        let mut renderer = Renderer::new(gpu, &viewer.borrow().lights, &config.render);
        viewer.borrow_mut().start_loads(&AssetLoader::new(config.asset_root.clone()));

        setup_input_listeners(&document, &window, &canvas, viewer.clone(), config.movement.bindings.clone())
            .map_err(|e| ViewerError::Window(format!("{e:?}")))?;

        let egui_ctx = egui::Context::default();
        let window_for_loop = window.clone();

        // Continuous redraw using requestAnimationFrame
        let frame = RcCellCallback::new(window, move || {
            let dpr = window_for_loop.device_pixel_ratio();
            if let Some((w, h)) = window_pixel_size(&window_for_loop) {
                if (w, h) != (canvas.width(), canvas.height()) {
                    canvas.set_width(w);
                    canvas.set_height(h);
                    renderer.resize(w, h);
                    viewer.borrow_mut().resize(w, h);
                }
            }

            let mut viewer = viewer.borrow_mut();
            viewer.tick();
            renderer.sync_scene(&mut viewer.scene);
            renderer.update_camera(&viewer.camera);

            let (w, h) = renderer.size();
            let now = window_for_loop.performance().map(|p| p.now()).unwrap_or(0.0);
            let raw_input = ui::raw_input_for_canvas(w, h, dpr as f32, now);
            let output = ui::build_ui(&egui_ctx, raw_input, &viewer.readout);
            let overlay = Overlay::new(&egui_ctx, output.shapes, output.textures_delta, output.pixels_per_point);

            if let Err(e) = renderer.draw_frame(overlay) {
                tracing::error!(error = %e, "failed to draw frame");
            }
        });
        frame.start();

        Ok(())
    }

    /// Forward DOM events to the viewer as platform-independent input events
    fn setup_input_listeners(
        document: &Document,
        window: &Window,
        canvas: &HtmlCanvasElement,
        viewer: Rc<RefCell<Viewer>>,
        bindings: KeyBindings,
    ) -> Result<(), JsValue> {
        // Keyboard down
        {
            let viewer = viewer.clone();
            let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
                // keep space/shift from scrolling the page
                if bindings.is_movement_key(&e.key()) {
                    e.prevent_default();
                }
                viewer.borrow_mut().handle_event(&dom::keyboard_event_to_input(&e, true));
            }) as Box<dyn FnMut(KeyboardEvent)>);
            window.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
            keydown.forget();
        }

        // Keyboard up
        {
            let viewer = viewer.clone();
            let keyup = Closure::wrap(Box::new(move |e: KeyboardEvent| {
                viewer.borrow_mut().handle_event(&dom::keyboard_event_to_input(&e, false));
            }) as Box<dyn FnMut(KeyboardEvent)>);
            window.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
            keyup.forget();
        }

        // Focus loss - clear all keys
        {
            let viewer = viewer.clone();
            let blur = Closure::wrap(Box::new(move |_e: Event| {
                viewer.borrow_mut().handle_event(&InputEvent::FocusLost);
            }) as Box<dyn FnMut(Event)>);
            window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
            blur.forget();
        }

        // Visibility change - clear all keys
        {
            let viewer = viewer.clone();
            let doc = document.clone();
            let visibility = Closure::wrap(Box::new(move |_e: Event| {
                let visible = !doc.hidden();
                viewer.borrow_mut().handle_event(&InputEvent::VisibilityChanged { visible });
            }) as Box<dyn FnMut(Event)>);
            document.add_event_listener_with_callback("visibilitychange", visibility.as_ref().unchecked_ref())?;
            visibility.forget();
        }

        // Mouse down on the canvas starts a drag
        {
            let viewer = viewer.clone();
            let mousedown = Closure::wrap(Box::new(move |e: MouseEvent| {
                if let Some(event) = dom::mouse_button_to_input(&e, true) {
                    viewer.borrow_mut().handle_event(&event);
                    e.prevent_default();
                }
            }) as Box<dyn FnMut(MouseEvent)>);
            canvas.add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref())?;
            mousedown.forget();
        }

        // Mouse up anywhere ends it
        {
            let viewer = viewer.clone();
            let mouseup = Closure::wrap(Box::new(move |e: MouseEvent| {
                if let Some(event) = dom::mouse_button_to_input(&e, false) {
                    viewer.borrow_mut().handle_event(&event);
                }
            }) as Box<dyn FnMut(MouseEvent)>);
            window.add_event_listener_with_callback("mouseup", mouseup.as_ref().unchecked_ref())?;
            mouseup.forget();
        }

        // Mouse move
        {
            let viewer = viewer.clone();
            let win = window.clone();
            let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
                let event = dom::mouse_move_to_input(&e, win.device_pixel_ratio());
                viewer.borrow_mut().handle_event(&event);
            }) as Box<dyn FnMut(MouseEvent)>);
            window.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
            mm.forget();
        }

        // Mouse wheel
        {
            let viewer = viewer.clone();
            let wheel = Closure::wrap(Box::new(move |e: WheelEvent| {
                viewer.borrow_mut().handle_event(&dom::wheel_to_input(&e));
                e.prevent_default();
            }) as Box<dyn FnMut(WheelEvent)>);
            canvas.add_event_listener_with_callback("wheel", wheel.as_ref().unchecked_ref())?;
            wheel.forget();
        }

        // Context menu prevention
        {
            let contextmenu = Closure::wrap(Box::new(move |e: MouseEvent| {
                e.prevent_default();
            }) as Box<dyn FnMut(MouseEvent)>);
            canvas.add_event_listener_with_callback("contextmenu", contextmenu.as_ref().unchecked_ref())?;
            contextmenu.forget();
        }

        Ok(())
    }

    /// Window size in physical pixels
    fn window_pixel_size(window: &Window) -> Option<(u32, u32)> {
        let dpr = window.device_pixel_ratio();
        let w = window.inner_width().ok()?.as_f64()?;
        let h = window.inner_height().ok()?.as_f64()?;
        let (w, h) = ((w * dpr).round() as u32, (h * dpr).round() as u32);
        (w > 0 && h > 0).then_some((w, h))
    }

    fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
        let window = web_sys::window().ok_or(js_error("no global `window`"))?;
        let document = window.document().ok_or(js_error("no document on window"))?;
        let body = document.body().ok_or(js_error("no body on document"))?;
        let canvas_el = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| js_error("failed to create canvas"))?;
        let (width, height) = window_pixel_size(&window).unwrap_or((800, 600));
        canvas_el.set_width(width);
        canvas_el.set_height(height);
        canvas_el.set_attribute("style", "display: block; width: 100vw; height: 100vh;")?;
        body.set_attribute("style", "margin: 0; overflow: hidden;")?;
        body.append_child(&canvas_el)?;
        Ok((window, document, canvas_el))
    }

    fn js_error<E: Into<String>>(msg: E) -> JsValue {
        JsValue::from_str(&msg.into())
    }

    struct RcCellCallback {
        inner: Rc<RefCell<Box<dyn FnMut()>>>,
        window: Window,
    }

    impl RcCellCallback {
        fn new(window: Window, f: impl FnMut() + 'static) -> Self {
            Self {
                inner: Rc::new(RefCell::new(Box::new(f))),
                window,
            }
        }

        fn start(self) {
            let inner = self.inner.clone();
            let window = self.window.clone();

            let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
            let callback_clone = callback.clone();

            *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                inner.borrow_mut().as_mut()();

                // Recursively schedule next frame
                if let Some(cb) = callback_clone.borrow().as_ref() {
                    if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                        tracing::error!(error = ?e, "requestAnimationFrame failed");
                    }
                }
            }) as Box<dyn FnMut()>));

            if let Some(cb) = callback.borrow().as_ref() {
                if let Err(e) = self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    tracing::error!(error = ?e, "requestAnimationFrame failed");
                }
            }

            // Leak the closure to keep it alive
            std::mem::forget(callback);
        }
    }
}
