use winit::event::WindowEvent;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
///
/// Returning `Exit` is the only way to stop the frame loop; there is no
/// global "running" flag to flip.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by the hosting shell.
///
/// The runtime drives one [`on_frame`](Self::on_frame) call per displayed
/// frame; everything the core needs per frame (GPU handles, timing, window
/// metadata) arrives through the context.
pub trait App {
    /// Called for raw window events the runtime does not consume itself.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
