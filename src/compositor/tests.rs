use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::time::{Duration, sleep};

use super::{CompositeCanvas, CompositorError, FrameCompositor};
use crate::annotate::{AnnotationSurface, StrokeLayer};
use crate::config::CompositorConfig;
use crate::media::{SyntheticCapture, TrackHealth, TrackSettings, VideoFrame, VideoTrack};

const OPAQUE_BLUE: u32 = 0xFF00_00FF;
const OPAQUE_RED: u32 = 0xFFFF_0000;

/// Fills a fixed rectangle with opaque red.
struct FillRect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl AnnotationSurface for FillRect {
    fn paint(&self, ctx: &cairo::Context) -> Result<(), cairo::Error> {
        ctx.set_source_rgba(1.0, 0.0, 0.0, 1.0);
        ctx.rectangle(self.x, self.y, self.w, self.h);
        ctx.fill()
    }
}

fn solid_frame(width: u32, height: u32, argb: u32) -> VideoFrame {
    let data: Vec<u8> = (0..width * height)
        .flat_map(|_| argb.to_ne_bytes())
        .collect();
    VideoFrame::from_argb32(width, height, width * 4, data).unwrap()
}

fn capture_720p() -> SyntheticCapture {
    SyntheticCapture::new(TrackSettings::new(1280, 720, 30.0)).unwrap()
}

fn compositor() -> FrameCompositor {
    FrameCompositor::new(Handle::current(), CompositorConfig::default())
}

#[test]
fn draw_tick_paints_annotations_over_video() {
    let mut canvas = CompositeCanvas::new(8, 8).unwrap();
    let video = solid_frame(8, 8, OPAQUE_BLUE);
    let left_half = FillRect {
        x: 0.0,
        y: 0.0,
        w: 4.0,
        h: 8.0,
    };

    canvas.draw_tick(Some(&video), &left_half).unwrap();
    let frame = canvas.snapshot().unwrap();

    assert_eq!(frame.pixel(1, 4), Some(OPAQUE_RED));
    assert_eq!(frame.pixel(6, 4), Some(OPAQUE_BLUE));
    assert_eq!(canvas.mutations(), 1);
}

#[test]
fn draw_tick_scales_video_to_canvas() {
    let mut canvas = CompositeCanvas::new(16, 16).unwrap();
    let video = solid_frame(4, 4, OPAQUE_BLUE);

    canvas.draw_tick(Some(&video), &StrokeLayer::new()).unwrap();
    let frame = canvas.snapshot().unwrap();

    assert_eq!(frame.pixel(8, 8), Some(OPAQUE_BLUE));
    assert_eq!(frame.pixel(12, 12), Some(OPAQUE_BLUE));
}

#[test]
fn draw_tick_clears_previous_contents() {
    let mut canvas = CompositeCanvas::new(8, 8).unwrap();
    let everywhere = FillRect {
        x: 0.0,
        y: 0.0,
        w: 8.0,
        h: 8.0,
    };

    canvas.draw_tick(None, &everywhere).unwrap();
    assert_eq!(canvas.snapshot().unwrap().pixel(4, 4), Some(OPAQUE_RED));

    canvas.draw_tick(None, &StrokeLayer::new()).unwrap();
    assert_eq!(canvas.snapshot().unwrap().pixel(4, 4), Some(0));
    assert_eq!(canvas.mutations(), 2);
}

#[test]
fn zero_sized_canvas_is_rejected() {
    assert!(matches!(
        CompositeCanvas::new(0, 720),
        Err(CompositorError::InvalidSize {
            width: 0,
            height: 720
        })
    ));
}

#[tokio::test]
async fn canvas_matches_source_settings() {
    let capture = capture_720p();
    let source = capture.stream().active_video_track().unwrap();
    let mut compositor = compositor();

    let stream = compositor
        .activate(source, Arc::new(StrokeLayer::new()))
        .unwrap();

    assert_eq!(compositor.canvas_size(), Some((1280, 720)));
    let settings = stream.active_video_track().unwrap().settings().unwrap();
    assert_eq!((settings.width, settings.height), (1280, 720));
    assert_eq!(settings.frame_rate, CompositorConfig::default().frame_rate);
    assert_eq!(compositor.composite_settings(), Some(settings));
    assert_eq!(stream.video_tracks().len(), 1);
}

#[tokio::test]
async fn activate_while_active_reuses_stream() {
    let capture = capture_720p();
    let source = capture.stream().active_video_track().unwrap();
    let layer: Arc<dyn AnnotationSurface> = Arc::new(StrokeLayer::new());
    let mut compositor = compositor();

    let first = compositor
        .activate(Arc::clone(&source), Arc::clone(&layer))
        .unwrap();
    let second = compositor.activate(source, layer).unwrap();

    assert!(first.same_stream(&second));
    assert_eq!(compositor.running_draw_loops(), 1);
}

#[tokio::test]
async fn activate_rejects_ended_source() {
    let capture = capture_720p();
    let source = capture.stream().active_video_track().unwrap();
    source.stop();
    let mut compositor = compositor();

    let result = compositor.activate(source, Arc::new(StrokeLayer::new()));

    assert!(matches!(result, Err(CompositorError::SourceEnded(_))));
    assert!(!compositor.is_active());
    assert_eq!(compositor.running_draw_loops(), 0);
}

#[tokio::test]
async fn activate_requires_source_settings() {
    let capture = SyntheticCapture::without_settings();
    let source = capture.stream().active_video_track().unwrap();
    let mut compositor = compositor();

    let result = compositor.activate(source, Arc::new(StrokeLayer::new()));

    assert!(matches!(result, Err(CompositorError::MissingSettings(_))));
    assert_eq!(compositor.canvas_size(), None);
}

#[tokio::test(start_paused = true)]
async fn draw_loop_ticks_and_stops_on_deactivate() {
    let capture = capture_720p();
    let source = capture.stream().active_video_track().unwrap();
    let mut compositor = compositor();
    let stream = compositor
        .activate(source, Arc::new(StrokeLayer::new()))
        .unwrap();

    sleep(Duration::from_millis(100)).await;
    assert!(compositor.canvas_mutations() > 0);
    assert_eq!(
        compositor.snapshot().unwrap().pixel(0, 0),
        capture.pattern().unwrap().pixel(0, 0)
    );

    assert!(compositor.deactivate());
    let drawn = compositor.canvas_mutations();
    assert!(!compositor.deactivate());
    assert_eq!(compositor.running_draw_loops(), 0);
    assert!(
        stream
            .video_tracks()
            .iter()
            .all(|track| track.health() == TrackHealth::Ended)
    );

    sleep(Duration::from_millis(200)).await;
    assert_eq!(compositor.canvas_mutations(), drawn);
}

#[test]
fn retired_canvas_ignores_draw_ticks() {
    let mut canvas = CompositeCanvas::new(8, 8).unwrap();
    let video = solid_frame(8, 8, OPAQUE_BLUE);
    let layer = StrokeLayer::new();
    canvas.draw_tick(Some(&video), &layer).unwrap();

    canvas.retire();
    let everything = FillRect {
        x: 0.0,
        y: 0.0,
        w: 8.0,
        h: 8.0,
    };
    canvas.draw_tick(Some(&video), &everything).unwrap();

    assert_eq!(canvas.mutations(), 1);
    assert_eq!(canvas.snapshot().unwrap().pixel(3, 3), Some(OPAQUE_BLUE));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn no_draws_land_after_deactivate_on_worker_threads() {
    let capture = capture_720p();
    let source = capture.stream().active_video_track().unwrap();
    let config = CompositorConfig {
        tick_interval_ms: 5,
        ..CompositorConfig::default()
    };
    let mut compositor = FrameCompositor::new(Handle::current(), config);

    for _ in 0..5 {
        compositor
            .activate(Arc::clone(&source), Arc::new(StrokeLayer::new()))
            .unwrap();
        sleep(Duration::from_millis(30)).await;
        compositor.deactivate();
        let drawn = compositor.canvas_mutations();

        sleep(Duration::from_millis(30)).await;
        assert_eq!(compositor.canvas_mutations(), drawn);
    }
    assert!(compositor.canvas_mutations() > 0);
}

#[tokio::test(start_paused = true)]
async fn deactivate_before_first_tick_draws_nothing() {
    let capture = capture_720p();
    let source = capture.stream().active_video_track().unwrap();
    let mut compositor = compositor();

    compositor
        .activate(source, Arc::new(StrokeLayer::new()))
        .unwrap();
    assert!(compositor.draw_loop_running());
    compositor.deactivate();

    sleep(Duration::from_millis(200)).await;
    assert_eq!(compositor.canvas_mutations(), 0);
    assert_eq!(compositor.running_draw_loops(), 0);
}

#[tokio::test(start_paused = true)]
async fn reactivation_runs_a_single_loop() {
    let capture = capture_720p();
    let source = capture.stream().active_video_track().unwrap();
    let layer: Arc<dyn AnnotationSurface> = Arc::new(StrokeLayer::new());
    let mut compositor = compositor();

    for _ in 0..3 {
        compositor
            .activate(Arc::clone(&source), Arc::clone(&layer))
            .unwrap();
        sleep(Duration::from_millis(40)).await;
        compositor.deactivate();
    }
    compositor
        .activate(Arc::clone(&source), Arc::clone(&layer))
        .unwrap();

    assert_eq!(compositor.running_draw_loops(), 1);
}
