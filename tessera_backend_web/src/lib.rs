// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for tessera.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`DomBackend`]: DOM element management, capability probing, controls
//!   and raw listeners
//! - [`TimerLoop`]: the `setTimeout` animation timer
//! - [`WebScene`]: a mounted scene with the timer, the event inbox and the
//!   window resize listener wired up
//!
//! DOM listeners never touch the scene directly. They post [`RawEvent`]s to
//! an [`EventInbox`], and the inbox is drained whenever the scene is not
//! already borrowed. Event callbacks therefore run with the scene borrowed
//! and must not call back into [`WebScene::with`]; queue the follow-up work
//! instead.
//!
//! [`RawEvent`]: tessera_core::input::RawEvent

mod dom;
mod timer;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;

pub use dom::{DomBackend, EventInbox, dom_event_type, element_tag};
pub use tessera_core::backend::Backend;
pub use timer::{TimerLoop, timeout_millis};

use tessera_core::time::HostTime;
use tessera_core::{Scene, SceneConfig, SceneError};

/// Returns the current host time from `performance.now()`.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis_f64(timer::performance_now())
}

/// A scene rendered into a DOM container.
pub struct WebScene {
    scene: Rc<RefCell<Scene<DomBackend>>>,
    inbox: EventInbox,
    resize: Option<Closure<dyn FnMut()>>,
}

impl WebScene {
    /// Builds a scene under `container` and wires the timer, the event inbox
    /// and viewport resizing to it.
    ///
    /// # Errors
    ///
    /// Fails if the container has no document or the window size cannot be
    /// read.
    pub fn mount(container: web_sys::HtmlElement, config: SceneConfig) -> Result<Self, SceneError> {
        let inbox = EventInbox::new();
        let backend = DomBackend::new(container, inbox.clone());
        let scene = Rc::new(RefCell::new(Scene::new(backend, config)?));
        let weak = Rc::downgrade(&scene);

        {
            let weak = Weak::clone(&weak);
            let inbox = inbox.clone();
            scene.borrow().backend().timer().set_callback(move |now| {
                let Some(scene) = weak.upgrade() else {
                    return;
                };
                if let Ok(mut scene) = scene.try_borrow_mut() {
                    scene.tick(now);
                }
                inbox.pump();
            });
        }

        {
            let weak = Weak::clone(&weak);
            let queue = inbox.clone();
            inbox.set_pump(move || {
                let Some(scene) = weak.upgrade() else {
                    return;
                };
                while let Some(raw) = queue.pop() {
                    let Ok(mut scene) = scene.try_borrow_mut() else {
                        queue.push_front(raw);
                        break;
                    };
                    scene.dispatch(raw);
                }
            });
        }

        let resize = Closure::wrap(Box::new(move || {
            let Some(scene) = weak.upgrade() else {
                return;
            };
            let Ok(mut scene) = scene.try_borrow_mut() else {
                return;
            };
            if let Some(size) = scene.backend().viewport() {
                scene.resize_viewport(size);
            }
        }) as Box<dyn FnMut()>);
        let resize = web_sys::window().and_then(|window| {
            window
                .add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())
                .ok()
                .map(|()| resize)
        });

        Ok(Self {
            scene,
            inbox,
            resize,
        })
    }

    /// Runs `f` on the scene, then dispatches any events it produced.
    ///
    /// Returns `None` if the scene is already borrowed, which only happens
    /// when called from inside an event callback.
    pub fn with<R>(&self, f: impl FnOnce(&mut Scene<DomBackend>) -> R) -> Option<R> {
        let result = {
            let mut scene = self.scene.try_borrow_mut().ok()?;
            f(&mut scene)
        };
        self.inbox.pump();
        Some(result)
    }

    /// The shared scene.
    #[must_use]
    pub fn scene(&self) -> &Rc<RefCell<Scene<DomBackend>>> {
        &self.scene
    }
}

impl Drop for WebScene {
    fn drop(&mut self) {
        // The pump holds a handle to the inbox it drains.
        self.inbox.clear_pump();
        if let (Some(window), Some(resize)) = (web_sys::window(), self.resize.take()) {
            let _ = window
                .remove_event_listener_with_callback("resize", resize.as_ref().unchecked_ref());
        }
    }
}

impl core::fmt::Debug for WebScene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebScene")
            .field("inbox", &self.inbox)
            .field("resize", &self.resize.is_some())
            .finish_non_exhaustive()
    }
}
