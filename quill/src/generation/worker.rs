//! Background thread that owns the generation backend for its lifetime.
//!
//! All communication is via channels: `GenerationJob` in, `AppEvent::Generation`
//! out. Jobs run one at a time in arrival order.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use quill_core::generation::Generator;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::event::AppEvent;
use crate::generation::types::{GenerationEvent, GenerationJob, JobKind};

/// Spawns the worker thread and returns the job sender.
///
/// The thread exits when the returned sender is dropped.
pub fn spawn_generation_worker(
    generator: Box<dyn Generator>,
    chunk_delay: Duration,
    event_tx: UnboundedSender<AppEvent>,
) -> std::io::Result<Sender<GenerationJob>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::Builder::new()
        .name("quill-generation".to_owned())
        .spawn(move || generation_worker_loop(generator, rx, event_tx, chunk_delay))?;
    Ok(tx)
}

/// Loops over incoming jobs until the channel closes.
pub fn generation_worker_loop(
    generator: Box<dyn Generator>,
    rx: Receiver<GenerationJob>,
    event_tx: UnboundedSender<AppEvent>,
    chunk_delay: Duration,
) {
    for job in rx {
        debug!(job = job.id, "generation job started");
        for event in run_job(generator.as_ref(), &job, chunk_delay) {
            if event_tx.send(AppEvent::Generation(event)).is_err() {
                // UI loop is gone; nothing left to deliver to.
                return;
            }
        }
    }
    debug!("generation worker exiting");
}

/// Runs one job, yielding its events lazily so pacing happens between sends.
fn run_job<'a>(
    generator: &'a dyn Generator,
    job: &'a GenerationJob,
    chunk_delay: Duration,
) -> Box<dyn Iterator<Item = GenerationEvent> + 'a> {
    let id = job.id;
    match &job.kind {
        JobKind::Outline(request) => {
            let event = match generator.outline(request) {
                Ok(items) => GenerationEvent::Outline { job: id, items },
                Err(e) => {
                    warn!(job = id, error = %e, "outline failed");
                    GenerationEvent::Failed { job: id, error: e.to_string() }
                }
            };
            Box::new(std::iter::once(event))
        }
        JobKind::Stream(request) => {
            let chunks = match generator.stream(request) {
                Ok(chunks) => chunks,
                Err(e) => {
                    warn!(job = id, error = %e, "generation failed");
                    return Box::new(std::iter::once(GenerationEvent::Failed {
                        job: id,
                        error: e.to_string(),
                    }));
                }
            };
            let cancel = job.cancel.clone();
            let mut chunks = chunks.into_iter();
            let mut done = false;
            Box::new(std::iter::from_fn(move || {
                if done {
                    return None;
                }
                if !chunk_delay.is_zero() {
                    thread::sleep(chunk_delay);
                }
                if cancel.is_cancelled() {
                    done = true;
                    return Some(GenerationEvent::Cancelled { job: id });
                }
                match chunks.next() {
                    Some(text) => Some(GenerationEvent::Chunk { job: id, text }),
                    None => {
                        done = true;
                        Some(GenerationEvent::Finished { job: id })
                    }
                }
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::types::CancelFlag;
    use quill_core::generation::{
        GenerationError, GenerationKind, GenerationRequest, OutlineItem, OutlineRequest,
        ScriptedGenerator, StudentLevel, Tone,
    };
    use tokio::sync::mpsc;

    struct FixedGenerator(Vec<&'static str>);

    impl Generator for FixedGenerator {
        fn stream(&self, _: &GenerationRequest) -> Result<Vec<String>, GenerationError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }

        fn outline(&self, _: &OutlineRequest) -> Result<Vec<OutlineItem>, GenerationError> {
            Err(GenerationError::Backend("offline".into()))
        }
    }

    fn stream_job(id: u64) -> GenerationJob {
        GenerationJob {
            id,
            kind: JobKind::Stream(GenerationRequest::new(
                GenerationKind::Generate { topic: "t".into(), requirements: String::new() },
                StudentLevel::Junior,
                Tone::default(),
            )),
            cancel: CancelFlag::default(),
        }
    }

    fn drain(mut rx: mpsc::UnboundedReceiver<AppEvent>) -> Vec<GenerationEvent> {
        let mut out = Vec::new();
        while let Ok(AppEvent::Generation(ev)) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn delivers_chunks_then_finished() {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (job_tx, job_rx) = crossbeam_channel::unbounded();
        job_tx.send(stream_job(7)).unwrap();
        drop(job_tx);

        generation_worker_loop(
            Box::new(FixedGenerator(vec!["a", "b"])),
            job_rx,
            event_tx,
            Duration::ZERO,
        );

        assert_eq!(
            drain(event_rx),
            vec![
                GenerationEvent::Chunk { job: 7, text: "a".into() },
                GenerationEvent::Chunk { job: 7, text: "b".into() },
                GenerationEvent::Finished { job: 7 },
            ]
        );
    }

    #[test]
    fn cancelled_job_stops_before_next_chunk() {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (job_tx, job_rx) = crossbeam_channel::unbounded();
        let job = stream_job(1);
        job.cancel.cancel();
        job_tx.send(job).unwrap();
        job_tx.send(stream_job(2)).unwrap();
        drop(job_tx);

        generation_worker_loop(Box::new(ScriptedGenerator), job_rx, event_tx, Duration::ZERO);

        let events = drain(event_rx);
        assert_eq!(events[0], GenerationEvent::Cancelled { job: 1 });
        // The next job is unaffected.
        assert!(events[1..].iter().all(|e| e.job() == 2));
        assert_eq!(events.last(), Some(&GenerationEvent::Finished { job: 2 }));
    }

    #[test]
    fn outline_failure_is_reported() {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (job_tx, job_rx) = crossbeam_channel::unbounded();
        job_tx
            .send(GenerationJob {
                id: 3,
                kind: JobKind::Outline(OutlineRequest {
                    topic: "x".into(),
                    requirements: String::new(),
                    level: StudentLevel::Grad,
                }),
                cancel: CancelFlag::default(),
            })
            .unwrap();
        drop(job_tx);

        generation_worker_loop(Box::new(FixedGenerator(vec![])), job_rx, event_tx, Duration::ZERO);

        assert!(matches!(
            drain(event_rx).as_slice(),
            [GenerationEvent::Failed { job: 3, error }] if error.contains("offline")
        ));
    }

    #[test]
    fn spawned_worker_exits_when_sender_dropped() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let tx = spawn_generation_worker(
            Box::new(FixedGenerator(vec!["x"])),
            Duration::from_millis(1),
            event_tx,
        )
        .unwrap();
        tx.send(stream_job(9)).unwrap();
        drop(tx);

        let mut seen = Vec::new();
        while let Some(AppEvent::Generation(ev)) = event_rx.blocking_recv() {
            seen.push(ev);
        }
        assert_eq!(seen.last(), Some(&GenerationEvent::Finished { job: 9 }));
    }
}
