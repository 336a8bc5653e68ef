use std::path::Path;

use common::*;
use navigation::HeightMap;
use noise::{Fbm, MultiFractal, NoiseFn, Seedable};

/// Max height of generated terrain
const NOISE_AMPLITUDE: f64 = 12.0;
const NOISE_FREQUENCY: f64 = 0.03;
const NOISE_OCTAVES: usize = 4;

/// Brighter is higher, using the sum of all channels
pub fn from_image(path: &Path) -> BoxedResult<HeightMap> {
    let image = image::open(path)?.to_rgb8();
    let dims = [image.width() as usize, image.height() as usize];

    let heights = image
        .pixels()
        .map(|px| {
            let [r, g, b] = px.0;
            let sum = (r as u32 + g as u32 + b as u32) as F;
            (sum * 0.006).powi(2)
        })
        .collect_vec();

    debug!("loaded heightmap"; "path" => %path.display(), "width" => dims[0], "height" => dims[1]);
    Ok(HeightMap::from_heights(dims, heights)?)
}

pub fn from_noise(size: usize, seed: u64) -> BoxedResult<HeightMap> {
    let noise = Fbm::new()
        .set_seed(seed as u32)
        .set_octaves(NOISE_OCTAVES)
        .set_frequency(NOISE_FREQUENCY);

    debug!("generating terrain"; "size" => size, "seed" => seed);
    let map = HeightMap::from_fn([size, size], |x, y| {
        let val = noise.get([x as f64, y as f64]);
        ((val + 1.0) * 0.5 * NOISE_AMPLITUDE) as F
    })?;

    Ok(map)
}
