//! `sharescribe demo`: a full annotated share without a real capture or SFU.

use std::{
    fs::File,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Args;
use log::{info, warn};
use tokio::runtime::{Handle, Runtime};

use sharescribe::{
    AnnotationSessionController, Config,
    annotate::{Pen, Stroke, StrokeLayer, color},
    media::{MediaStream, SyntheticCapture, TrackSettings},
    session::{SessionDependencies, SessionState},
    uplink::{LoggingUplink, ShareHost, UplinkDependencies, UplinkError},
};

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Capture width in pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Capture height in pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Capture frame rate
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// How long to keep annotating before closing the preview
    #[arg(long, value_name = "MS", default_value_t = 300)]
    duration_ms: u64,

    /// Save the last composited frame as PNG
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Simulate the OS ending the capture while annotating
    #[arg(long)]
    end_capture: bool,
}

/// Screen share backed by a synthetic capture.
struct DemoHost {
    capture: SyntheticCapture,
    sharing: AtomicBool,
}

#[async_trait]
impl ShareHost for DemoHost {
    fn capture_stream(&self) -> Option<MediaStream> {
        Some(self.capture.stream())
    }

    fn is_sharing(&self) -> bool {
        self.sharing.load(Ordering::SeqCst)
    }

    async fn stop_sharing(&self) -> Result<(), UplinkError> {
        info!("Screen share stopped");
        self.sharing.store(false, Ordering::SeqCst);
        Ok(())
    }
}

pub fn run(args: DemoArgs, config: Config) -> Result<()> {
    let runtime = Runtime::new().context("Failed to start tokio runtime")?;
    let handle = runtime.handle().clone();
    runtime.block_on(run_session(&handle, args, config))
}

async fn run_session(runtime: &Handle, args: DemoArgs, config: Config) -> Result<()> {
    let capture = SyntheticCapture::new(TrackSettings::new(args.width, args.height, args.fps))
        .context("Failed to create synthetic capture")?;
    let host = Arc::new(DemoHost {
        capture,
        sharing: AtomicBool::new(true),
    });
    let uplink = Arc::new(LoggingUplink::new());
    let layer = Arc::new(StrokeLayer::new());
    for stroke in sample_strokes(args.width as i32, args.height as i32) {
        layer.push(stroke);
    }

    let controller = AnnotationSessionController::new(
        runtime,
        SessionDependencies {
            uplink: UplinkDependencies::new(uplink.clone(), uplink.clone(), host.clone()),
            annotations: layer,
        },
        &config,
    );

    controller.on_annotation_flag_changed(true).await;
    controller.toggle(true).await;

    let state = controller.composite_stream_state().await;
    match state.canvas_size {
        Some((width, height)) => println!("Composite canvas: {}x{}", width, height),
        None => println!("Annotation inactive; previewing the plain capture"),
    }

    tokio::time::sleep(Duration::from_millis(args.duration_ms)).await;
    let frame = controller.composite_snapshot().await;

    if args.end_capture {
        let ended = host.capture.terminate();
        info!("Simulated capture end ({} track(s))", ended);
        let mut waited = 0;
        while controller.state() == SessionState::PreviewingAnnotated && waited < 1000 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += 10;
        }
        println!("Session after capture end: {:?}", controller.state());
    }

    controller.toggle(false).await;
    println!("Session closed: {:?}", controller.state());
    println!(
        "Uplink operations: {}, presence republished: {}",
        uplink.operations(),
        uplink.republishes()
    );

    if let Some(path) = args.output {
        let Some(frame) = frame else {
            anyhow::bail!("No composite frame to save; annotation never became active");
        };
        let mut file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        frame
            .write_png(&mut file)
            .with_context(|| format!("Failed to write PNG to {}", path.display()))?;
        println!("Saved composite frame to {}", path.display());
    } else if frame.is_none() {
        warn!("No composite frame was produced");
    }

    Ok(())
}

fn sample_strokes(width: i32, height: i32) -> Vec<Stroke> {
    let thick = Pen::new(color::RED, 6.0);
    let thin = Pen::new(color::YELLOW, 3.0);
    vec![
        Stroke::Rect {
            x: width / 8,
            y: height / 8,
            w: width / 3,
            h: height / 4,
            pen: thick,
        },
        Stroke::Ellipse {
            cx: width * 3 / 4,
            cy: height / 3,
            rx: width / 10,
            ry: height / 10,
            pen: Pen::new(color::GREEN, 4.0),
        },
        Stroke::Arrow {
            tip: (width / 2, height / 2),
            tail: (width * 3 / 4, height * 3 / 4),
            pen: thick,
            head_length: 24.0,
            head_angle_degrees: 30.0,
        },
        Stroke::Freehand {
            points: (0..=20)
                .map(|i| {
                    let x = width / 8 + i * width / 40;
                    let y = height * 5 / 6 + if i % 2 == 0 { -10 } else { 10 };
                    (x, y)
                })
                .collect(),
            pen: thin,
        },
    ]
}
