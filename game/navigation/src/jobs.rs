use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use common::*;

use crate::graph::NavigationGraph;
use crate::owner::{OwnerHandle, OwnerRegistry};
use crate::params::JobQueueParams;
use crate::route::RouteError;
use crate::waypoints::Waypoints;

pub type PathResult = Result<Waypoints, RouteError>;

/// Runs on the thread that calls [PathJobQueue::dispatch]
pub type PathCallback = Box<dyn FnOnce(PathResult)>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct JobId(u64);

#[derive(Debug, Error)]
pub enum JobQueueError {
    #[error("Failed to spawn navigation worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Outcome of a single [PathJobQueue::dispatch]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Dispatched {
    /// No completed job was waiting
    Nothing,
    Invoked(JobId),
    /// The job's owner was released while it was in flight, so its callback was dropped
    Skipped(JobId),
}

struct PathRequest {
    id: JobId,
    src: Point2,
    dst: Point2,
}

struct PathResponse {
    id: JobId,
    result: PathResult,
}

struct PendingJob {
    callback: PathCallback,
    owner: Option<OwnerHandle>,
}

/// Computes routes on a single background worker that owns the graph. Results are handed back
/// one per [dispatch](Self::dispatch), which never blocks
pub struct PathJobQueue {
    /// None after shutdown
    requests: Option<Sender<PathRequest>>,
    results: Option<Receiver<PathResponse>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,

    pending: HashMap<JobId, PendingJob>,
    owners: OwnerRegistry,
    next_id: u64,
}

slog_value_debug!(JobId);

impl PathJobQueue {
    /// Moves the graph onto a new `nav-worker` thread
    pub fn start(graph: NavigationGraph, params: &JobQueueParams) -> Result<Self, JobQueueError> {
        let (requests_tx, requests_rx) = unbounded();
        let (results_tx, results_rx) = bounded(params.result_capacity.max(1));
        let stop = Arc::new(AtomicBool::new(false));

        let worker = {
            let stop = stop.clone();
            let poll = params.worker_poll;
            thread::Builder::new()
                .name("nav-worker".to_owned())
                .spawn(move || run_worker(graph, requests_rx, results_tx, stop, poll))?
        };

        Ok(Self {
            requests: Some(requests_tx),
            results: Some(results_rx),
            stop,
            worker: Some(worker),
            pending: HashMap::new(),
            owners: OwnerRegistry::default(),
            next_id: 0,
        })
    }

    /// The callback is only invoked by [dispatch](Self::dispatch), and never if `owner` is
    /// released first. After shutdown the job is dropped
    pub fn submit(
        &mut self,
        src: Point2,
        dst: Point2,
        callback: impl FnOnce(PathResult) + 'static,
        owner: Option<OwnerHandle>,
    ) -> JobId {
        let id = JobId(self.next_id);
        self.next_id += 1;

        let requests = match self.requests.as_ref() {
            Some(tx) => tx,
            None => {
                warn!("path job submitted after shutdown, dropping"; "job" => id);
                return id;
            }
        };

        if let Err(e) = requests.send(PathRequest { id, src, dst }) {
            error!("failed to send path request to worker"; "job" => id, "error" => %e);
            return id;
        }

        trace!("submitted path job"; "job" => id, "src" => ?src, "dst" => ?dst, "owner" => ?owner);
        self.pending.insert(
            id,
            PendingJob {
                callback: Box::new(callback),
                owner,
            },
        );
        id
    }

    /// Handles at most one completed job without blocking
    pub fn dispatch(&mut self) -> Dispatched {
        let response = match self.results.as_ref().map(Receiver::try_recv) {
            Some(Ok(response)) => response,
            Some(Err(TryRecvError::Disconnected)) if self.worker.is_some() => {
                self.worker_gone();
                return Dispatched::Nothing;
            }
            _ => return Dispatched::Nothing,
        };

        self.complete(response)
    }

    /// Waits up to `timeout` for a completed job. Not for use in the tick
    pub fn dispatch_blocking(&mut self, timeout: Duration) -> Dispatched {
        let response = match self.results.as_ref().map(|rx| rx.recv_timeout(timeout)) {
            Some(Ok(response)) => response,
            Some(Err(RecvTimeoutError::Disconnected)) if self.worker.is_some() => {
                self.worker_gone();
                return Dispatched::Nothing;
            }
            _ => return Dispatched::Nothing,
        };

        self.complete(response)
    }

    /// Reported once, then the queue behaves as if shut down
    fn worker_gone(&mut self) {
        error!("navigation worker has gone away"; "pending" => self.pending.len());
        self.shutdown();
    }

    fn complete(&mut self, response: PathResponse) -> Dispatched {
        let id = response.id;
        let job = match self.pending.remove(&id) {
            Some(job) => job,
            None => {
                warn!("completed path job is not pending"; "job" => id);
                return Dispatched::Nothing;
            }
        };

        if let Some(owner) = job.owner {
            if !self.owners.is_alive(owner) {
                debug!("owner of path job no longer exists, skipping callback"; "job" => id, "owner" => owner);
                return Dispatched::Skipped(id);
            }
        }

        debug!("dispatching path job"; "job" => id, "found" => response.result.is_ok());
        (job.callback)(response.result);
        Dispatched::Invoked(id)
    }

    /// Callbacks still awaiting a result
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn owners(&self) -> &OwnerRegistry {
        &self.owners
    }

    pub fn owners_mut(&mut self) -> &mut OwnerRegistry {
        &mut self.owners
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Stops and joins the worker. Queued requests and pending callbacks are dropped without
    /// being invoked. Does nothing if already shut down
    pub fn shutdown(&mut self) {
        let worker = match self.worker.take() {
            Some(worker) => worker,
            None => return,
        };

        self.stop.store(true, Ordering::Relaxed);

        // wakes the worker whether it's waiting for a request or blocked on a full result channel
        self.requests = None;
        self.results = None;

        if worker.join().is_err() {
            error!("navigation worker panicked");
        }

        let dropped = self.pending.len();
        self.pending.clear();
        info!("path job queue shut down"; "dropped_jobs" => dropped);
    }
}

impl Drop for PathJobQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    graph: NavigationGraph,
    requests: Receiver<PathRequest>,
    results: Sender<PathResponse>,
    stop: Arc<AtomicBool>,
    poll: Duration,
) {
    info!("navigation worker started"; "areas" => graph.area_count(), "poll" => ?poll);
    let context = graph.search_context();

    while !stop.load(Ordering::Relaxed) {
        let PathRequest { id, src, dst } = match requests.recv_timeout(poll) {
            Ok(request) => request,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        if stop.load(Ordering::Relaxed) {
            break;
        }

        let result = graph
            .compute_route_with(&context, src, dst)
            .map(|route| Waypoints::new(route, src, dst));

        match &result {
            Ok(waypoints) => trace!("path job complete"; "job" => id, "areas" => waypoints.route().len()),
            Err(e) => trace!("path job failed"; "job" => id, "error" => e),
        }

        if results.send(PathResponse { id, result }).is_err() {
            debug!("path job results are no longer received"; "job" => id);
            break;
        }
    }

    info!("navigation worker exiting");
}

impl Debug for PathJobQueue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PathJobQueue")
            .field("running", &self.is_running())
            .field("pending", &self.pending.len())
            .field("owners", &self.owners)
            .finish()
    }
}
