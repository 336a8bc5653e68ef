use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use structopt::StructOpt;

use common::*;
use config::ConfigType;
use navigation::{
    Dispatched, GraphParams, JobQueueParams, NavigationGraph, PathJobQueue, PathResult,
    TravellerBuilder, TravellerParams,
};

use crate::render::Render;

mod render;
mod terrain;

/// Builds a navigation graph, finds a path across it and renders the lot
#[derive(Debug, StructOpt)]
#[structopt(rename_all = "kebab-case")]
struct Args {
    /// Heightmap image, brighter is higher. Terrain is generated from noise if not specified
    #[structopt(long)]
    heightmap: Option<PathBuf>,

    /// Width and height of generated terrain
    #[structopt(long, default_value = "128")]
    size: usize,

    /// Random if not specified
    #[structopt(long)]
    seed: Option<u64>,

    /// Watched for changes, but only read once
    #[structopt(long)]
    config: Option<PathBuf>,

    /// Only cells reachable from here are kept, as "x,y"
    #[structopt(long, parse(try_from_str = parse_point))]
    walkable: Option<Point2>,

    /// Random area if not specified
    #[structopt(long, parse(try_from_str = parse_point))]
    from: Option<Point2>,

    /// Random area if not specified
    #[structopt(long, parse(try_from_str = parse_point))]
    to: Option<Point2>,

    /// Max ticks to follow the path for
    #[structopt(long, default_value = "5000")]
    ticks: usize,

    /// Pixels per cell
    #[structopt(long, default_value = "4")]
    scale: u32,

    #[structopt(long, default_value = "navmesh.png")]
    out: PathBuf,
}

const TICK: F = 1.0 / 30.0;
const JOB_TIMEOUT: Duration = Duration::from_secs(30);

fn main() {
    let args = Args::from_args();

    let _logging = match logging::LoggerBuilder::with_env().and_then(|b| b.init_with_uptime()) {
        Err(e) => {
            eprintln!("failed to setup logging: {}", e);
            std::process::exit(1);
        }
        Ok(l) => l,
    };
    info!("initialized logging"; "level" => ?_logging.level());

    if let Err(e) = run(args) {
        error!("failed"; "error" => %e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> BoxedResult<()> {
    if let Some(path) = args.config.as_ref() {
        config::init(ConfigType::WatchedFile(path))?;
    }

    let cfg = config::get().navigation.clone();
    let seed = args.seed.unwrap_or_else(|| thread_rng().gen());
    let mut rng = seeded_rng(Some(seed));

    let map = match args.heightmap.as_ref() {
        Some(path) => terrain::from_image(path)?,
        None => terrain::from_noise(args.size, seed)?,
    };

    let [w, h] = navigation::HeightSurface::dimensions(&map);
    let walkable = args
        .walkable
        .unwrap_or_else(|| Point2::new(w as F / 2.0, h as F / 2.0));

    let graph = NavigationGraph::build(&map, &GraphParams::from(&cfg), Some(walkable))?;
    info!("graph"; "graph" => ?graph, "seed" => seed);

    let mut render = Render::with_terrain(&map, &graph, args.scale);
    render.draw_areas(&graph);

    let mut random_point = || {
        graph
            .areas()
            .choose(&mut rng)
            .map(|area| area.center())
            .unwrap_or(walkable)
    };
    let from = args.from.unwrap_or_else(&mut random_point);
    let to = args.to.unwrap_or_else(&mut random_point);

    // the worker takes its own copy, this one is kept for drawing the route
    let mut queue = PathJobQueue::start(graph.clone(), &JobQueueParams::from(&cfg))?;
    let found: Rc<RefCell<Option<PathResult>>> = Rc::default();
    {
        let found = found.clone();
        queue.submit(from, to, move |result| *found.borrow_mut() = Some(result), None);
    }

    let dispatched = queue.dispatch_blocking(JOB_TIMEOUT);
    queue.shutdown();

    let result = match (dispatched, found.borrow_mut().take()) {
        (Dispatched::Invoked(_), Some(result)) => result,
        (dispatched, _) => {
            warn!("path job didn't complete"; "dispatched" => ?dispatched);
            render.save(&args.out)?;
            return Ok(());
        }
    };

    match result {
        Ok(waypoints) => {
            info!("found path"; "from" => ?from, "to" => ?to, "areas" => waypoints.route().len());
            render.draw_route(&graph, waypoints.route());

            let points = waypoints.clone().collect_vec();
            let trace = follow(waypoints, &map, &TravellerParams::from(&cfg), args.ticks);
            render.draw_trace(&trace);
            render.draw_waypoints(&points);
        }
        Err(e) => warn!("no path"; "from" => ?from, "to" => ?to, "error" => %e),
    }

    render.save(&args.out)
}

fn follow(
    waypoints: navigation::Waypoints,
    map: &navigation::HeightMap,
    params: &TravellerParams,
    ticks: usize,
) -> Vec<Point3> {
    let mut traveller = match TravellerBuilder::new(waypoints, params).build(map) {
        Some(t) => t,
        None => return Vec::new(),
    };

    let mut trace = vec![traveller.position()];
    trace.extend((0..ticks).map_while(|_| traveller.advance(TICK)));

    if !traveller.is_done() {
        warn!("traveller didn't arrive"; "ticks" => ticks, "pos" => ?traveller.position());
    }
    trace
}

fn parse_point(s: &str) -> Result<Point2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {:?}", s))?;

    let parse = |v: &str| v.trim().parse::<F>().map_err(|e| format!("bad coordinate {:?}: {}", v, e));
    Ok(Point2::new(parse(x)?, parse(y)?))
}
