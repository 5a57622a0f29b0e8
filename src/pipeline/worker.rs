use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use log::debug;

use crate::error::Result;
use crate::pipeline::policy::{Scheme, Theme};
use crate::pipeline::{extract_scheme, ExtractSettings};

/// One requested extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub path: PathBuf,
    pub theme: Theme,
}

/// A finished extraction, tagged with the generation it was requested under.
#[derive(Debug)]
pub struct Extraction {
    pub generation: u64,
    pub job: Job,
    pub result: Result<Scheme>,
}

/// Runs extractions on a background thread.
///
/// Every [`Extractor::request`] supersedes the previous ones: the worker skips
/// queued requests that are already stale, and results arriving for an older
/// generation are dropped instead of being handed to the caller.
///
/// Dropping the extractor does not wait for a running extraction. The worker
/// thread exits once it finds both channels closed.
pub struct Extractor {
    requests: Sender<(u64, Job)>,
    responses: Receiver<Extraction>,
    generation: u64,
}

impl Extractor {
    /// Worker that decodes the image and runs the theme cascade.
    pub fn spawn(settings: ExtractSettings) -> Self {
        Self::with_handler(move |job: &Job| extract_scheme(&job.path, job.theme, &settings))
    }

    /// Worker running an arbitrary extraction function.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Job) -> Result<Scheme> + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel::<(u64, Job)>();
        let (response_tx, response_rx) = mpsc::channel();

        std::thread::spawn(move || {
            while let Ok(mut next) = request_rx.recv() {
                // Only the newest queued request matters.
                while let Ok(newer) = request_rx.try_recv() {
                    debug!("skipping superseded request {}", next.0);
                    next = newer;
                }
                let (generation, job) = next;
                let result = handler(&job);
                let extraction = Extraction {
                    generation,
                    job,
                    result,
                };
                if response_tx.send(extraction).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: request_tx,
            responses: response_rx,
            generation: 0,
        }
    }

    /// Queue an extraction and return its generation token.
    pub fn request(&mut self, job: Job) -> u64 {
        self.generation += 1;
        debug!(
            "requesting {} ({}) as generation {}",
            job.path.display(),
            job.theme,
            self.generation
        );
        // A dead worker shows up as no response ever arriving.
        let _ = self.requests.send((self.generation, job));
        self.generation
    }

    /// Generation of the most recent request, 0 before the first one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current result if one has arrived, without blocking.
    pub fn try_recv(&mut self) -> Option<Extraction> {
        while let Ok(extraction) = self.responses.try_recv() {
            if let Some(current) = self.accept(extraction) {
                return Some(current);
            }
        }
        None
    }

    /// Wait up to `timeout` for the current result.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<Extraction> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.responses.recv_timeout(remaining) {
                Ok(extraction) => {
                    if let Some(current) = self.accept(extraction) {
                        return Some(current);
                    }
                }
                Err(_) => return None,
            }
        }
    }

    fn accept(&self, extraction: Extraction) -> Option<Extraction> {
        if extraction.generation == self.generation {
            Some(extraction)
        } else {
            debug!(
                "discarding stale result for generation {} (current {})",
                extraction.generation, self.generation
            );
            None
        }
    }
}
