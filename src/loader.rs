use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::{Context, Result};
use image::DynamicImage;
use tracing::warn;

/// A finished decode attempt, tagged with the request generation.
pub enum LoadEvent {
    Loaded {
        generation: u64,
        path: PathBuf,
        image: DynamicImage,
    },
    Failed {
        generation: u64,
        path: PathBuf,
        message: String,
    },
}

struct Job {
    generation: u64,
    path: PathBuf,
}

/// Decodes plan images off the UI thread. Each request bumps a generation
/// counter; results from superseded requests are dropped on receipt, so
/// rapid re-opens settle on the last pick (last-write-wins).
pub struct ImageLoader {
    jobs: Sender<Job>,
    events: Receiver<LoadEvent>,
    generation: u64,
    pending: bool,
    _worker: thread::JoinHandle<()>,
}

impl ImageLoader {
    pub fn new() -> Self {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (event_tx, event_rx) = mpsc::channel::<LoadEvent>();

        let worker = thread::spawn(move || {
            while let Ok(job) = job_rx.recv() {
                let event = match decode(&job.path) {
                    Ok(image) => LoadEvent::Loaded {
                        generation: job.generation,
                        path: job.path,
                        image,
                    },
                    Err(err) => LoadEvent::Failed {
                        generation: job.generation,
                        path: job.path,
                        message: format!("{err:#}"),
                    },
                };
                if event_tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self {
            jobs: job_tx,
            events: event_rx,
            generation: 0,
            pending: false,
            _worker: worker,
        }
    }

    pub fn request(&mut self, path: PathBuf) -> u64 {
        self.generation += 1;
        self.pending = true;
        if self
            .jobs
            .send(Job {
                generation: self.generation,
                path,
            })
            .is_err()
        {
            warn!("image loader worker is gone");
        }
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.pending
    }

    /// Latest current event, if any. Stale generations are discarded.
    pub fn try_recv(&mut self) -> Option<LoadEvent> {
        while let Ok(event) = self.events.try_recv() {
            let generation = match &event {
                LoadEvent::Loaded { generation, .. } | LoadEvent::Failed { generation, .. } => {
                    *generation
                }
            };
            if generation == self.generation {
                self.pending = false;
                return Some(event);
            }
        }
        None
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(path: &PathBuf) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("cannot decode {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    use image::{DynamicImage, RgbaImage};

    use super::{ImageLoader, LoadEvent};

    fn temp_png(name: &str, width: u32, height: u32) -> PathBuf {
        let path = std::env::temp_dir().join(format!("planmark_loader_{name}_{}.png", std::process::id()));
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([10, 20, 30, 255]),
        ));
        image.save(&path).expect("write temp png");
        path
    }

    fn wait_for_event(loader: &mut ImageLoader) -> Option<LoadEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(event) = loader.try_recv() {
                return Some(event);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        None
    }

    #[test]
    fn decodes_in_the_background() {
        let path = temp_png("single", 32, 16);
        let mut loader = ImageLoader::new();
        loader.request(path.clone());

        match wait_for_event(&mut loader) {
            Some(LoadEvent::Loaded { image, .. }) => {
                assert_eq!((image.width(), image.height()), (32, 16));
            }
            other => panic!("expected a loaded image, got {:?}", other.is_some()),
        }
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn reports_decode_failures() {
        let mut loader = ImageLoader::new();
        loader.request(PathBuf::from("/nonexistent/plan.png"));

        match wait_for_event(&mut loader) {
            Some(LoadEvent::Failed { message, .. }) => {
                assert!(message.contains("cannot decode"));
            }
            _ => panic!("expected a failure event"),
        }
    }

    #[test]
    fn newer_request_supersedes_older() {
        let slow = temp_png("old", 8, 8);
        let fast = temp_png("new", 64, 64);
        let mut loader = ImageLoader::new();
        loader.request(slow.clone());
        loader.request(fast.clone());

        // Jobs run in order on one worker, so the first result arrives
        // first and must be discarded as stale.
        match wait_for_event(&mut loader) {
            Some(LoadEvent::Loaded { image, .. }) => {
                assert_eq!((image.width(), image.height()), (64, 64));
            }
            _ => panic!("expected the newer image"),
        }
        assert!(loader.try_recv().is_none());
        let _ = std::fs::remove_file(slow);
        let _ = std::fs::remove_file(fast);
    }
}
