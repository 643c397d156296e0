//! The pipeline controller: owns the producer thread, turns UI intents into
//! capture commands and runs the pick gesture on the 3D view.

use crate::control::{CaptureCommand, CaptureControl, SaveKind};
use crate::dispatch::{FrameReceiver, UiDispatcher};
use crate::display::DisplayMode;
use crate::errors::AppError;
use crate::model::{DetectorSlot, PipelineModel};
use crate::pick::{
    EventResult, GestureState, PointerEvent, PointerEventKind, RectangleTool, resolve_pick,
};
use crate::view::{PipelineView, RenderSurface};
use glam::Vec2;
use prism_capture::RgbdSource;
use prism_data::ViewPreset;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// User intents delivered to the controller by the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiEvent {
    ToggleCapture(bool),
    ToggleRecord(bool),
    SavePointCloud,
    SaveRgbd,
    ToggleNormals(bool),
    ToggleModelInit(bool),
    SetEditMode(bool),
    SetDisplayMode(DisplayMode),
    CycleDisplayMode,
    ViewPreset(ViewPreset),
    Pointer(PointerEvent),
    Close,
}

/// UI-thread half of the pipeline.
pub struct PipelineController<V: PipelineView> {
    view: V,
    control: Arc<CaptureControl>,
    detector: DetectorSlot,
    dispatcher: UiDispatcher<V>,
    gesture: GestureState,
    rectangle_tool: Option<Box<dyn RectangleTool>>,
    ui_tick: Duration,
}

impl<V: PipelineView> PipelineController<V> {
    pub fn new(mut view: V, control: Arc<CaptureControl>, detector: DetectorSlot) -> Self {
        let capturing = control.flags().capture;
        view.set_capturing(capturing);
        view.surface_mut().set_pick_handler(!capturing);
        Self {
            view,
            control,
            detector,
            dispatcher: UiDispatcher::new(),
            gesture: GestureState::Idle,
            rectangle_tool: None,
            ui_tick: Duration::from_millis(16),
        }
    }

    /// Install the geometry handler for Shift + drag rectangles.
    pub fn with_rectangle_tool(mut self, tool: Box<dyn RectangleTool>) -> Self {
        self.rectangle_tool = Some(tool);
        self
    }

    pub fn with_ui_tick(mut self, tick: Duration) -> Self {
        self.ui_tick = tick;
        self
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn gesture(&self) -> GestureState {
        self.gesture
    }

    /// Spawn the producer thread, run the UI loop on the calling thread until
    /// the window closes, then join the producer.
    pub fn start<S>(
        mut self,
        model: PipelineModel<S>,
        frames: FrameReceiver,
        events: Receiver<UiEvent>,
    ) -> Result<(), AppError>
    where
        S: RgbdSource + 'static,
    {
        let producer = thread::Builder::new()
            .name("PipelineModel".to_string())
            .spawn(move || model.run())?;

        self.run_ui_loop(&frames, &events, &producer);

        match producer.join() {
            Ok(Ok(())) => {
                info!("Pipeline shut down");
                Ok(())
            }
            Ok(Err(e)) => {
                error!("Producer failed: {}", e);
                Err(e)
            }
            Err(_) => {
                error!("Producer thread panicked");
                Err(AppError::ProducerPanicked)
            }
        }
    }

    fn run_ui_loop(
        &mut self,
        frames: &FrameReceiver,
        events: &Receiver<UiEvent>,
        producer: &JoinHandle<Result<(), AppError>>,
    ) {
        let mut producer_reported = false;
        loop {
            self.tick(frames);

            if !producer_reported && producer.is_finished() && !self.control.exit_requested() {
                warn!("Producer stopped; no further frames will arrive");
                self.view.set_status("Producer stopped".to_string());
                producer_reported = true;
            }

            match events.recv_timeout(self.ui_tick) {
                Ok(event) => {
                    if !self.handle_event(event) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Event source closed");
                    self.on_window_close();
                    break;
                }
            }
        }
        self.dispatcher.drain(&mut self.view);
    }

    /// One redraw tick: run posted callbacks, show the newest frame and pick
    /// up capture state changed by the producer.
    pub fn tick(&mut self, frames: &FrameReceiver) {
        self.dispatcher.drain(&mut self.view);

        for status in frames.statuses() {
            self.view.set_status(status);
        }
        if let Some(frame) = frames.latest() {
            self.view.update(frame);
        }

        // The producer turns capture off itself when its source runs dry.
        if self.view.capturing() && !self.control.flags().capture {
            info!("Capture stopped by producer");
            self.on_toggle_capture(false);
        }
    }

    /// Apply one UI event. Returns `false` once the window may close.
    pub fn handle_event(&mut self, event: UiEvent) -> bool {
        match event {
            UiEvent::ToggleCapture(enabled) => self.on_toggle_capture(enabled),
            UiEvent::ToggleRecord(enabled) => self.on_toggle_record(enabled),
            UiEvent::SavePointCloud => self.on_save_pcd(),
            UiEvent::SaveRgbd => self.on_save_rgbd(),
            UiEvent::ToggleNormals(enabled) => self.on_toggle_normals(enabled),
            UiEvent::ToggleModelInit(enabled) => self.on_toggle_model_init(enabled),
            UiEvent::SetEditMode(enabled) => {
                self.view.set_edit_mode(enabled);
                if !enabled {
                    self.gesture = GestureState::Idle;
                }
            }
            UiEvent::SetDisplayMode(mode) => self.view.set_display_mode(mode),
            UiEvent::CycleDisplayMode => {
                let mode = self.view.display_mode().next();
                self.view.set_display_mode(mode);
            }
            UiEvent::ViewPreset(preset) => self.view.apply_view_preset(preset),
            UiEvent::Pointer(pointer) => {
                self.handle_pointer_event(pointer);
            }
            UiEvent::Close => return !self.on_window_close(),
        }
        true
    }

    pub fn on_toggle_capture(&mut self, enabled: bool) {
        self.view.set_capturing(enabled);
        if enabled {
            self.control.apply(CaptureCommand::Start);
        } else {
            self.control.apply(CaptureCommand::Stop);
            // Recording cannot outlive capture.
            self.control.apply(CaptureCommand::Record(false));
            self.view.set_record_toggle(false);
            self.gesture = GestureState::Idle;
        }
        // The view owns the pointer while capturing.
        self.view.surface_mut().set_pick_handler(!enabled);
        info!("Capture {}", if enabled { "started" } else { "stopped" });
    }

    pub fn on_toggle_record(&mut self, enabled: bool) {
        self.control.apply(CaptureCommand::Record(enabled));
    }

    /// Request shutdown. Always agrees to close.
    pub fn on_window_close(&mut self) -> bool {
        info!("Window closing");
        self.control.apply(CaptureCommand::Exit);
        true
    }

    pub fn on_save_pcd(&mut self) {
        self.control.apply(CaptureCommand::SaveOnce(SaveKind::PointCloud));
    }

    pub fn on_save_rgbd(&mut self) {
        self.control.apply(CaptureCommand::SaveOnce(SaveKind::Rgbd));
    }

    pub fn on_toggle_normals(&mut self, enabled: bool) {
        self.control.apply(CaptureCommand::Normals(enabled));
        self.view.set_normals(enabled);
    }

    /// Both edges rebuild the detector, so switching segmentation off and on
    /// again picks up a fresh model. A failed initialization leaves
    /// segmentation off.
    pub fn on_toggle_model_init(&mut self, enabled: bool) {
        if let Err(e) = self.detector.initialize() {
            warn!("Detector initialization failed: {}", e);
            if enabled {
                self.view.set_status(format!("Model initialization failed: {e}"));
            }
            self.control.apply(CaptureCommand::ModelInit(false));
            return;
        }
        self.control.apply(CaptureCommand::ModelInit(enabled));
    }

    /// Pointer events on the 3D view while the pick handler is installed.
    ///
    /// Ctrl + primary click picks a point. Shift + primary drag draws a
    /// rectangle when a [`RectangleTool`] is installed.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) -> EventResult {
        if self.view.capturing()
            || !self.view.edit_mode()
            || !self.view.surface().pick_handler_enabled()
        {
            return EventResult::Ignored;
        }

        let viewport = self.view.surface().viewport();
        let local = event.position - Vec2::new(viewport.x, viewport.y);

        match self.gesture {
            GestureState::Idle if event.is_primary_down() && event.modifiers.ctrl => {
                let Some(pixel) = viewport.to_local(event.position.x, event.position.y) else {
                    return EventResult::Ignored;
                };
                self.request_pick(pixel, (viewport.width, viewport.height));
                EventResult::Handled
            }
            GestureState::Idle if event.is_primary_down() && event.modifiers.shift => {
                let Some(tool) = self.rectangle_tool.as_mut() else {
                    return EventResult::Ignored;
                };
                if viewport.to_local(event.position.x, event.position.y).is_none() {
                    return EventResult::Ignored;
                }
                tool.begin(local);
                self.gesture = GestureState::Drawing { anchor: local };
                EventResult::Handled
            }
            GestureState::Drawing { anchor } => match event.kind {
                PointerEventKind::Drag => {
                    if let Some(tool) = self.rectangle_tool.as_mut() {
                        tool.update(anchor, local);
                    }
                    EventResult::Handled
                }
                PointerEventKind::ButtonUp => {
                    if let Some(tool) = self.rectangle_tool.as_mut() {
                        tool.finish(anchor, local);
                    }
                    self.gesture = GestureState::Idle;
                    EventResult::Handled
                }
                _ => EventResult::Ignored,
            },
            _ => EventResult::Ignored,
        }
    }

    fn request_pick(&self, pixel: (u32, u32), size: (u32, u32)) {
        let surface = self.view.surface();
        let camera = surface.view_camera();
        let poster = self.dispatcher.poster();
        debug!("Pick requested at {:?}", pixel);

        surface.request_depth_image(
            camera,
            Box::new(move |depth| {
                let result = resolve_pick(&depth, pixel, &camera, size);
                poster.post(move |view: &mut V| view.set_pick_text(result.to_string()));
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::GateOutcome;
    use crate::dispatch::frame_channel;
    use crate::model::ModelSettings;
    use crate::pick::{Modifiers, PointerButton};
    use crate::view::{DepthBuffer, DepthCallback, FrameElements, Viewport};
    use glam::Vec3;
    use image::Luma;
    use prism_capture::SyntheticSource;
    use prism_data::{FAR_PLANE_DEPTH, ViewCamera};
    use prism_fusion::{Detector, FusionError, NullDetector};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Instant;

    type PendingPick = (ViewCamera, DepthCallback);

    struct FakeSurface {
        viewport: Viewport,
        pick_handler: bool,
        camera: ViewCamera,
        pending: RefCell<Vec<PendingPick>>,
    }

    impl RenderSurface for FakeSurface {
        fn viewport(&self) -> Viewport {
            self.viewport
        }
        fn set_pick_handler(&mut self, enabled: bool) {
            self.pick_handler = enabled;
        }
        fn pick_handler_enabled(&self) -> bool {
            self.pick_handler
        }
        fn view_camera(&self) -> ViewCamera {
            self.camera
        }
        fn request_depth_image(&self, camera: ViewCamera, callback: DepthCallback) {
            self.pending.borrow_mut().push((camera, callback));
        }
    }

    #[derive(Default)]
    struct FakeView {
        frames: Vec<u64>,
        capturing: bool,
        edit_mode: bool,
        record_toggle: Option<bool>,
        normals: bool,
        display_mode: DisplayMode,
        pick_text: Option<String>,
        status: Option<String>,
        surface: Option<FakeSurface>,
    }

    impl PipelineView for FakeView {
        type Surface = FakeSurface;

        fn update(&mut self, frame: FrameElements) {
            self.frames.push(frame.frame_number);
        }
        fn capturing(&self) -> bool {
            self.capturing
        }
        fn set_capturing(&mut self, capturing: bool) {
            self.capturing = capturing;
        }
        fn edit_mode(&self) -> bool {
            self.edit_mode
        }
        fn set_edit_mode(&mut self, enabled: bool) {
            self.edit_mode = enabled;
        }
        fn set_record_toggle(&mut self, on: bool) {
            self.record_toggle = Some(on);
        }
        fn set_normals(&mut self, enabled: bool) {
            self.normals = enabled;
        }
        fn display_mode(&self) -> DisplayMode {
            self.display_mode
        }
        fn set_display_mode(&mut self, mode: DisplayMode) {
            self.display_mode = mode;
        }
        fn apply_view_preset(&mut self, _preset: ViewPreset) {}
        fn set_pick_text(&mut self, text: String) {
            self.pick_text = Some(text);
        }
        fn set_status(&mut self, text: String) {
            self.status = Some(text);
        }
        fn surface(&self) -> &FakeSurface {
            self.surface.as_ref().unwrap()
        }
        fn surface_mut(&mut self) -> &mut FakeSurface {
            self.surface.as_mut().unwrap()
        }
    }

    fn test_camera() -> ViewCamera {
        ViewCamera::look_at(Vec3::ZERO, Vec3::Z, Vec3::NEG_Y, 1.0, 4.0 / 3.0)
    }

    fn null_slot() -> DetectorSlot {
        DetectorSlot::new(|| Ok(Box::new(NullDetector) as Box<dyn Detector>))
    }

    fn controller() -> PipelineController<FakeView> {
        let view = FakeView {
            edit_mode: true,
            surface: Some(FakeSurface {
                viewport: Viewport::new(100.0, 50.0, 64, 48),
                pick_handler: false,
                camera: test_camera(),
                pending: RefCell::new(Vec::new()),
            }),
            ..Default::default()
        };
        PipelineController::new(view, Arc::new(CaptureControl::new()), null_slot())
    }

    fn complete_picks(controller: &mut PipelineController<FakeView>, depth: &DepthBuffer) {
        let pending: Vec<_> = controller.view.surface().pending.borrow_mut().drain(..).collect();
        for (_, callback) in pending {
            let depth = depth.clone();
            thread::spawn(move || callback(depth)).join().unwrap();
        }
        controller.dispatcher.drain(&mut controller.view);
    }

    #[test]
    fn test_stopping_capture_forces_record_off() {
        let mut controller = controller();
        controller.on_toggle_capture(true);
        controller.on_toggle_record(true);
        assert!(controller.control.flags().record);
        assert!(!controller.view.surface().pick_handler_enabled());

        controller.on_toggle_capture(false);
        let flags = controller.control.flags();
        assert!(!flags.capture);
        assert!(!flags.record);
        assert_eq!(controller.view.record_toggle, Some(false));
        assert!(controller.view.surface().pick_handler_enabled());
    }

    #[test]
    fn test_starting_capture_wakes_parked_producer() {
        let mut controller = controller();
        let control = controller.control.clone();
        let (tx, rx) = mpsc::channel();
        let waiter = thread::spawn(move || {
            let outcome = control.wait_for_capture();
            tx.send(outcome).unwrap();
        });
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        controller.on_toggle_capture(true);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), GateOutcome::Capture);
        waiter.join().unwrap();
    }

    #[test]
    fn test_close_wakes_every_waiter() {
        let mut controller = controller();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let control = controller.control.clone();
                thread::spawn(move || control.wait_for_capture())
            })
            .collect();
        thread::sleep(Duration::from_millis(20));

        assert!(!controller.handle_event(UiEvent::Close));
        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), GateOutcome::Exit);
        }
    }

    #[test]
    fn test_pointer_ignored_while_capturing_or_not_editing() {
        let mut controller = controller();
        let click = PointerEvent::pick_click(Vec2::new(120.0, 60.0));

        controller.on_toggle_capture(true);
        assert_eq!(controller.handle_pointer_event(click), EventResult::Ignored);

        controller.on_toggle_capture(false);
        controller.view.edit_mode = false;
        assert_eq!(controller.handle_pointer_event(click), EventResult::Ignored);
        assert!(controller.view.surface().pending.borrow().is_empty());
    }

    #[test]
    fn test_click_outside_viewport_is_ignored() {
        let mut controller = controller();
        let click = PointerEvent::pick_click(Vec2::new(10.0, 10.0));
        assert_eq!(controller.handle_pointer_event(click), EventResult::Ignored);
        let plain = PointerEvent::new(PointerEventKind::ButtonDown, Vec2::new(120.0, 60.0))
            .with_button(PointerButton::Primary);
        assert_eq!(controller.handle_pointer_event(plain), EventResult::Ignored);
    }

    #[test]
    fn test_pick_on_empty_depth_reports_no_hit() {
        let mut controller = controller();
        let click = PointerEvent::pick_click(Vec2::new(132.0, 74.0));
        assert_eq!(controller.handle_pointer_event(click), EventResult::Handled);
        assert!(controller.view.pick_text.is_none());

        let depth = DepthBuffer::from_pixel(64, 48, Luma([FAR_PLANE_DEPTH]));
        complete_picks(&mut controller, &depth);
        assert_eq!(
            controller.view.pick_text.as_deref(),
            Some("Mouse Coord: Clicked on nothing")
        );
    }

    #[test]
    fn test_pick_uses_camera_at_click_time() {
        let mut controller = controller();
        let camera = test_camera();
        let world = Vec3::new(0.0, 0.0, 2.0);
        let screen = camera.project(world, 64, 48).unwrap();

        // Window position of the viewport center.
        let click = PointerEvent::pick_click(Vec2::new(100.0 + 32.0, 50.0 + 24.0));
        assert_eq!(controller.handle_pointer_event(click), EventResult::Handled);

        // The view moves before the depth render completes.
        controller.view.surface_mut().camera =
            ViewCamera::look_at(Vec3::new(5.0, 0.0, 0.0), Vec3::X, Vec3::NEG_Y, 1.0, 4.0 / 3.0);

        let depth = DepthBuffer::from_pixel(64, 48, Luma([screen.z]));
        complete_picks(&mut controller, &depth);
        let text = controller.view.pick_text.clone().unwrap();
        let coords: Vec<f32> = text
            .trim_start_matches("Mouse Coord: (")
            .trim_end_matches(')')
            .split(", ")
            .map(|c| c.parse().unwrap())
            .collect();
        assert_eq!(coords.len(), 3, "got {text}");
        assert!((Vec3::from_slice(&coords) - world).length() < 1e-2, "got {text}");
    }

    #[derive(Default)]
    struct RecordingTool {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl RectangleTool for RecordingTool {
        fn begin(&mut self, anchor: Vec2) {
            self.log.borrow_mut().push(format!("begin {} {}", anchor.x, anchor.y));
        }
        fn update(&mut self, _anchor: Vec2, current: Vec2) {
            self.log.borrow_mut().push(format!("update {} {}", current.x, current.y));
        }
        fn finish(&mut self, _anchor: Vec2, end: Vec2) {
            self.log.borrow_mut().push(format!("finish {} {}", end.x, end.y));
        }
    }

    #[test]
    fn test_rectangle_gesture() {
        let tool = RecordingTool::default();
        let log = tool.log.clone();
        let mut controller = controller().with_rectangle_tool(Box::new(tool));
        let shift = Modifiers {
            shift: true,
            ..Default::default()
        };

        let down = PointerEvent::new(PointerEventKind::ButtonDown, Vec2::new(110.0, 60.0))
            .with_button(PointerButton::Primary)
            .with_modifiers(shift);
        assert_eq!(controller.handle_pointer_event(down), EventResult::Handled);
        assert_eq!(
            controller.gesture(),
            GestureState::Drawing {
                anchor: Vec2::new(10.0, 10.0)
            }
        );

        let drag = PointerEvent::new(PointerEventKind::Drag, Vec2::new(120.0, 70.0));
        assert_eq!(controller.handle_pointer_event(drag), EventResult::Handled);
        let wheel = PointerEvent::new(PointerEventKind::Wheel, Vec2::new(120.0, 70.0));
        assert_eq!(controller.handle_pointer_event(wheel), EventResult::Ignored);

        let up = PointerEvent::new(PointerEventKind::ButtonUp, Vec2::new(130.0, 80.0))
            .with_button(PointerButton::Primary);
        assert_eq!(controller.handle_pointer_event(up), EventResult::Handled);
        assert_eq!(controller.gesture(), GestureState::Idle);
        assert_eq!(
            *log.borrow(),
            vec!["begin 10 10", "update 20 20", "finish 30 30"]
        );
    }

    #[test]
    fn test_rectangle_gesture_needs_a_tool() {
        let mut controller = controller();
        let down = PointerEvent::new(PointerEventKind::ButtonDown, Vec2::new(110.0, 60.0))
            .with_button(PointerButton::Primary)
            .with_modifiers(Modifiers {
                shift: true,
                ..Default::default()
            });
        assert_eq!(controller.handle_pointer_event(down), EventResult::Ignored);
        assert_eq!(controller.gesture(), GestureState::Idle);
    }

    #[test]
    fn test_failed_model_init_keeps_segmentation_off() {
        let mut controller = controller();
        controller.detector =
            DetectorSlot::new(|| Err(FusionError::DetectorFailed("no weights".to_string())));
        controller.on_toggle_model_init(true);
        assert!(!controller.control.flags().model_init);
        assert!(controller.view.status.as_deref().unwrap().contains("no weights"));

        controller.detector = null_slot();
        controller.on_toggle_model_init(true);
        assert!(controller.control.flags().model_init);
        assert!(controller.detector.is_initialized());
    }

    #[test]
    fn test_model_toggle_reinitializes_on_both_edges() {
        let mut controller = controller();
        let builds = Arc::new(AtomicUsize::new(0));
        controller.detector = {
            let builds = builds.clone();
            DetectorSlot::new(move || {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(NullDetector) as Box<dyn Detector>)
            })
        };

        controller.handle_event(UiEvent::ToggleModelInit(true));
        assert!(controller.control.flags().model_init);
        controller.handle_event(UiEvent::ToggleModelInit(false));
        assert!(!controller.control.flags().model_init);
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_mode_next_cycles_display_mode() {
        let mut controller = controller();
        controller.handle_event(UiEvent::CycleDisplayMode);
        assert_eq!(controller.view.display_mode, DisplayMode::Segmentation);
        controller.handle_event(UiEvent::CycleDisplayMode);
        controller.handle_event(UiEvent::CycleDisplayMode);
        assert_eq!(controller.view.display_mode, DisplayMode::Colors);
    }

    #[test]
    fn test_tick_shows_status_of_skipped_frames() {
        let mut controller = controller();
        let (mut poster, frames) = frame_channel(2);
        poster.post_status("Saving point cloud failed: disk full".to_string());
        poster.deliver_frame(FrameElements::empty(0));
        poster.deliver_frame(FrameElements::empty(1));

        controller.tick(&frames);
        assert_eq!(controller.view.frames, vec![1]);
        assert_eq!(
            controller.view.status.as_deref(),
            Some("Saving point cloud failed: disk full")
        );
    }

    #[test]
    fn test_save_requests_set_one_shot_flags() {
        let mut controller = controller();
        controller.handle_event(UiEvent::SavePointCloud);
        controller.handle_event(UiEvent::SaveRgbd);
        let flags = controller.control.flags();
        assert!(flags.save_pcd && flags.save_rgbd);
        let tick = controller.control.begin_tick().unwrap();
        assert!(tick.save_pcd && tick.save_rgbd);
        assert!(!controller.control.flags().save_pcd);
    }

    #[test]
    fn test_start_runs_until_close() {
        let controller = controller().with_ui_tick(Duration::from_millis(2));
        let control = controller.control.clone();
        let (poster, frames) = frame_channel(2);
        let settings = ModelSettings {
            output_dir: std::env::temp_dir().join("prism-app-controller-start"),
            pace: false,
            ..Default::default()
        };
        let model = PipelineModel::new(
            SyntheticSource::new(16, 12),
            control.clone(),
            controller.detector.clone(),
            poster,
            settings,
        );
        let (events, event_rx) = mpsc::channel();
        events.send(UiEvent::ToggleCapture(true)).unwrap();

        let closer = thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(5);
            while !control.flags().capture && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(2));
            }
            thread::sleep(Duration::from_millis(30));
            events.send(UiEvent::Close).unwrap();
        });

        controller.start(model, frames, event_rx).unwrap();
        closer.join().unwrap();
    }
}
