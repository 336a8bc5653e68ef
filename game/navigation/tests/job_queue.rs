use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use common::*;
use navigation::{
    Dispatched, HeightMap, JobQueueParams, NavigationGraph, ObstructionRaster, PathJobQueue,
    PathResult, RouteError, TravellerBuilder, TravellerParams,
};

const TIMEOUT: Duration = Duration::from_secs(10);

type Results = Rc<RefCell<Vec<(usize, PathResult)>>>;

fn params() -> JobQueueParams {
    JobQueueParams {
        worker_poll: Duration::from_millis(10),
        result_capacity: 2,
    }
}

/// Wall down x=8 with a gap at the bottom
fn walled_graph() -> NavigationGraph {
    let raster = ObstructionRaster::from_fn([16, 16], |x, y| x == 8 && y < 12).expect("valid");
    NavigationGraph::from_raster(raster, 4, Some(Point2::new(1.0, 1.0))).expect("valid")
}

fn recorder(results: &Results, tag: usize) -> impl FnOnce(PathResult) + 'static {
    let results = results.clone();
    move |result| results.borrow_mut().push((tag, result))
}

fn drain(queue: &mut PathJobQueue, n: usize) -> Vec<Dispatched> {
    (0..n).map(|_| queue.dispatch_blocking(TIMEOUT)).collect()
}

#[test]
fn routes_around_wall() {
    logging::for_tests();

    let mut queue = PathJobQueue::start(walled_graph(), &params()).expect("started");
    let results = Results::default();

    let src = Point2::new(2.0, 2.0);
    let dst = Point2::new(14.0, 2.0);
    queue.submit(src, dst, recorder(&results, 0), None);

    assert!(matches!(drain(&mut queue, 1)[..], [Dispatched::Invoked(_)]));

    let (_, result) = results.borrow_mut().pop().expect("invoked");
    let points = result.expect("found").collect_vec();
    assert_eq!(points.first(), Some(&src));
    assert_eq!(points.last(), Some(&dst));

    // must have dipped below the wall to get round it
    assert!(points.iter().any(|p| p.y >= 12.0));
}

#[test]
fn many_jobs_through_small_result_channel() {
    let mut queue = PathJobQueue::start(walled_graph(), &params()).expect("started");
    let results = Results::default();

    let src = Point2::new(2.0, 2.0);
    let n = 10;
    for i in 0..n {
        let dst = Point2::new(10.0 + (i % 5) as F, 13.0);
        queue.submit(src, dst, recorder(&results, i), None);
    }
    assert_eq!(queue.pending_count(), n);

    let dispatched = drain(&mut queue, n);
    assert!(dispatched.iter().all(|d| matches!(d, Dispatched::Invoked(_))));
    assert_eq!(queue.pending_count(), 0);

    // a single worker handles requests in order
    let results = results.borrow();
    assert_eq!(results.iter().map(|(tag, _)| *tag).collect_vec(), (0..n).collect_vec());
    assert!(results.iter().all(|(_, r)| r.is_ok()));
}

#[test]
fn released_owner_is_skipped() {
    let mut queue = PathJobQueue::start(walled_graph(), &params()).expect("started");
    let results = Results::default();

    let alive = queue.owners_mut().register();
    let dead = queue.owners_mut().register();

    let p = Point2::new(2.0, 2.0);
    let skipped = queue.submit(p, p, recorder(&results, 0), Some(dead));
    let invoked = queue.submit(p, p, recorder(&results, 1), Some(alive));
    assert!(queue.owners_mut().release(dead));

    assert_eq!(
        drain(&mut queue, 2),
        vec![Dispatched::Skipped(skipped), Dispatched::Invoked(invoked)]
    );

    let tags = results.borrow().iter().map(|(tag, _)| *tag).collect_vec();
    assert_eq!(tags, vec![1]);
    assert_eq!(queue.pending_count(), 0);
}

#[test]
fn failures_reach_the_callback() {
    let mut queue = PathJobQueue::start(walled_graph(), &params()).expect("started");
    let results = Results::default();

    // on the wall, and off the map
    queue.submit(Point2::new(8.5, 2.0), Point2::new(2.0, 2.0), recorder(&results, 0), None);
    queue.submit(Point2::new(2.0, 2.0), Point2::new(40.0, 2.0), recorder(&results, 1), None);
    drain(&mut queue, 2);

    let results = results.borrow();
    assert!(matches!(results[0].1, Err(RouteError::UnresolvedSource(_))));
    assert!(matches!(results[1].1, Err(RouteError::UnresolvedDestination(_))));
}

#[test]
fn shutdown_drops_pending() {
    let mut queue = PathJobQueue::start(walled_graph(), &params()).expect("started");
    let results = Results::default();

    let p = Point2::new(2.0, 2.0);
    for i in 0..50 {
        queue.submit(p, Point2::new(14.0, 2.0), recorder(&results, i), None);
    }

    queue.shutdown();
    assert!(!queue.is_running());
    assert_eq!(queue.pending_count(), 0);
    assert_eq!(queue.dispatch(), Dispatched::Nothing);
    assert!(results.borrow().is_empty());

    // dropped, not queued
    queue.submit(p, p, recorder(&results, 99), None);
    assert_eq!(queue.pending_count(), 0);
    assert_eq!(queue.dispatch_blocking(Duration::from_millis(50)), Dispatched::Nothing);
    assert!(results.borrow().is_empty());

    queue.shutdown();
}

#[test]
fn traveller_follows_job_result() {
    let map = HeightMap::flat([16, 16], 2.0).expect("valid");
    let mut queue = PathJobQueue::start(walled_graph(), &params()).expect("started");
    let results = Results::default();

    let dst = Point2::new(14.0, 2.0);
    queue.submit(Point2::new(2.0, 2.0), dst, recorder(&results, 0), None);
    drain(&mut queue, 1);

    let (_, result) = results.borrow_mut().pop().expect("invoked");
    let tparams = TravellerParams {
        speed: 4.0,
        cruise_height: 1.0,
    };
    let mut traveller = TravellerBuilder::new(result.expect("found"), &tparams)
        .build(&map)
        .expect("not empty");

    let mut ticks = 0;
    while traveller.advance(0.1).is_some() {
        ticks += 1;
        assert!(ticks < 1000, "never arrived");
        assert!(traveller.position().z >= 2.0);
    }

    let end = traveller.position();
    assert_eq!((end.x, end.y), (dst.x, dst.y));
    assert!(approx_eq(end.z, 3.0));
}
