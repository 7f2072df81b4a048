//! Integration tests for concurrent exchanges.
//!
//! A transport typically serves each device request on its own task.  The
//! server holds no per-exchange state, so parallel exchanges against one
//! shared `Server` must produce identical bytes.

use std::sync::Arc;
use std::time::Duration;

use eink_core::graphics::SEVEN_COLOR;
use eink_core::protocol::Request;
use eink_server::{ContentProvider, Quantization, ScheduleIntent, Server, ServerSettings};
use image::{DynamicImage, Rgb, RgbImage};
use tracing_subscriber::EnvFilter;

struct Gradient;

impl ContentProvider for Gradient {
    fn render(&self) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(64, 48, |x, y| {
            Rgb([(x * 4) as u8, (y * 5) as u8, ((x * y) % 256) as u8])
        }))
    }

    fn timing_intents(&self) -> ScheduleIntent {
        ScheduleIntent::new()
            .with_update_time(Duration::from_secs(600))
            .with_screensaver_time(Duration::from_secs(3600))
    }
}

fn init_tracing() {
    // Other tests in this binary may have installed a subscriber already.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

async fn run_parallel(server: Arc<Server<Gradient>>, tasks: usize) -> anyhow::Result<Vec<Vec<u8>>> {
    let request = Request::new().to_bytes()?;
    let handles: Vec<_> = (0..tasks)
        .map(|_| {
            let server = Arc::clone(&server);
            let request = request.clone();
            tokio::task::spawn_blocking(move || server.exec(&request))
        })
        .collect();

    let mut outputs = Vec::with_capacity(tasks);
    for handle in handles {
        outputs.push(handle.await??);
    }
    Ok(outputs)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_round_exchanges_are_identical() -> anyhow::Result<()> {
    // Arrange
    init_tracing();
    let server = Arc::new(Server::new(Gradient, ServerSettings::default()));

    // Act
    let outputs = run_parallel(server, 16).await?;

    // Assert
    assert!(outputs.windows(2).all(|pair| pair[0] == pair[1]));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_dither_exchanges_are_identical() -> anyhow::Result<()> {
    // Arrange
    init_tracing();
    let settings = ServerSettings {
        palette: SEVEN_COLOR.clone(),
        quantization: Quantization::Dither,
        ..ServerSettings::default()
    };
    let server = Arc::new(Server::new(Gradient, settings));

    // Act
    let outputs = run_parallel(server, 8).await?;

    // Assert
    assert_eq!(outputs.len(), 8);
    assert!(outputs.windows(2).all(|pair| pair[0] == pair[1]));
    Ok(())
}
