use std::time::Instant;

use anyhow::Context;
use log::{debug, info, warn};
use mandelbrot_zoom::{Config, EscapeEngine, SelectionOverlay, Viewport};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

mod render;
mod uniform;

use render::Renderer;

fn is_quit_key(keycode: VirtualKeyCode) -> bool {
    matches!(keycode, VirtualKeyCode::Escape | VirtualKeyCode::Return)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_env()?;
    let size = config.size;
    let batch_size = config.batch_size;
    info!(
        "{}x{} grid, {} threads, {} iterations per batch",
        size.width, size.height, config.threads, batch_size
    );

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("Mandelbrot")
        .with_inner_size(PhysicalSize::new(size.width, size.height))
        .with_resizable(false)
        .build(&event_loop)
        .context("failed to create window")?;

    let mut engine = EscapeEngine::new(config, Viewport::default())?;
    let mut overlay = SelectionOverlay::new(size);
    let mut renderer = Renderer::new(&window, size, overlay.rect())?;
    renderer.upload(engine.colours());

    let mut started = Instant::now();

    event_loop.run(move |event, _, control_flow| match event {
        Event::MainEventsCleared => {
            if engine.is_complete() {
                *control_flow = ControlFlow::Wait;
            } else {
                engine.advance(batch_size);
                renderer.upload(engine.colours());
                window.request_redraw();
                if engine.is_complete() {
                    info!(
                        "rendered {:?} at {} iterations in {:?}",
                        engine.viewport(),
                        engine.budget(),
                        started.elapsed()
                    );
                }
                *control_flow = ControlFlow::Poll;
            }
        }
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested => {
                *control_flow = ControlFlow::Exit;
            }
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state: ElementState::Pressed,
                        virtual_keycode: Some(keycode),
                        ..
                    },
                ..
            } if is_quit_key(keycode) => {
                *control_flow = ControlFlow::Exit;
            }
            WindowEvent::CursorMoved { position, .. } => {
                let inner = window.inner_size();
                overlay.move_to(
                    position.x * size.width as f64 / inner.width.max(1) as f64,
                    position.y * size.height as f64 / inner.height.max(1) as f64,
                );
                renderer.set_selection(overlay.rect());
                window.request_redraw();
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button,
                ..
            } => {
                match button {
                    MouseButton::Left => engine.zoom_in(overlay.rect()),
                    MouseButton::Right => engine.zoom_out(),
                    _ => return,
                }
                debug!("zoomed to {:?}", engine.viewport());
                started = Instant::now();
                renderer.upload(engine.colours());
                window.request_redraw();
                *control_flow = ControlFlow::Poll;
            }
            _ => {}
        },
        Event::RedrawRequested(window_id) if window_id == window.id() => {
            match renderer.render() {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let inner = window.inner_size();
                    renderer.reconfigure(inner.width, inner.height);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    warn!("out of memory, exiting");
                    *control_flow = ControlFlow::ExitWithCode(1);
                }
                Err(err) => warn!("skipped frame: {}", err),
            }
        }
        _ => {}
    });
}
