//! Face detection collaborator.
//!
//! [`RtenFaceDetector`] runs an UltraFace-style model (`scores` `[1, N, 2]`,
//! `boxes` `[1, N, 4]` with normalised corners) over an image pyramid and
//! groups the raw anchors the way Haar cascades group their windows, so the
//! familiar `scale_factor` / `min_neighbors` / `min_size` knobs keep their
//! meaning.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context};
use image::imageops::{self, FilterType};
use image::RgbImage;
use rten::{Model, NodeId};
use rten_tensor::prelude::*;
use rten_tensor::NdTensor;
use tracing::debug;

use crate::error::{RedactError, Result};
use crate::words::PixelRect;

const MAX_PYRAMID_LEVELS: i32 = 3;

/// Similarity tolerance used when clustering candidate boxes.
const GROUP_EPS: f32 = 0.2;

pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &RgbImage) -> anyhow::Result<Vec<PixelRect>>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceDetectorParams {
    /// Ratio between consecutive pyramid levels. Must be > 1.
    pub scale_factor: f32,
    /// A face is kept only if more than this many candidates agree on it.
    /// 0 disables grouping.
    pub min_neighbors: usize,
    /// Minimum face width and height in pixels.
    pub min_size: u32,
    /// Minimum face probability for a raw candidate.
    pub score_threshold: f32,
}

impl Default for FaceDetectorParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_size: 60,
            score_threshold: 0.7,
        }
    }
}

impl FaceDetectorParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.scale_factor > 1.0) {
            return Err(RedactError::Config(format!(
                "scale_factor must be greater than 1.0, got {}",
                self.scale_factor
            )));
        }
        if self.min_size == 0 {
            return Err(RedactError::Config("min_size must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(RedactError::Config(format!(
                "score_threshold must be within 0..=1, got {}",
                self.score_threshold
            )));
        }
        Ok(())
    }
}

/// Windows of the image the model is run on: the whole image, then
/// overlapping tiles shrinking by `scale_factor` per level.
pub fn pyramid_tiles(width: u32, height: u32, params: &FaceDetectorParams) -> Vec<PixelRect> {
    let mut tiles = Vec::new();
    if width == 0 || height == 0 {
        return tiles;
    }

    for level in 0..MAX_PYRAMID_LEVELS {
        let shrink = params.scale_factor.powi(level);
        let tile_w = ((width as f32 / shrink).round() as u32).clamp(1, width);
        let tile_h = ((height as f32 / shrink).round() as u32).clamp(1, height);
        if level > 0 && tile_w.min(tile_h) < params.min_size {
            break;
        }
        for y in axis_origins(height, tile_h) {
            for x in axis_origins(width, tile_w) {
                tiles.push(PixelRect::new(x as i32, y as i32, tile_w, tile_h));
            }
        }
    }
    tiles
}

fn axis_origins(len: u32, tile: u32) -> Vec<u32> {
    if tile >= len {
        return vec![0];
    }
    let stride = (tile / 2).max(1);
    let mut origins = Vec::new();
    let mut pos = 0;
    while pos + tile < len {
        origins.push(pos);
        pos += stride;
    }
    origins.push(len - tile);
    origins
}

fn similar(a: &PixelRect, b: &PixelRect, eps: f32) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) as f32 * 0.5;
    let close = |p: i32, q: i32| ((p - q).abs() as f32) <= delta;
    close(a.x, b.x) && close(a.y, b.y) && close(a.right(), b.right()) && close(a.bottom(), b.bottom())
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Clusters similar rectangles and returns the average of every cluster with
/// more than `min_neighbors` members.
pub fn group_rectangles(candidates: &[PixelRect], min_neighbors: usize, eps: f32) -> Vec<PixelRect> {
    if min_neighbors == 0 {
        return candidates.to_vec();
    }

    let mut parent: Vec<usize> = (0..candidates.len()).collect();
    for i in 0..candidates.len() {
        for j in i + 1..candidates.len() {
            if similar(&candidates[i], &candidates[j], eps) {
                let (ri, rj) = (find_root(&mut parent, i), find_root(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut clusters: BTreeMap<usize, (usize, [f64; 4])> = BTreeMap::new();
    for (i, rect) in candidates.iter().enumerate() {
        let root = find_root(&mut parent, i);
        let entry = clusters.entry(root).or_insert((0, [0.0; 4]));
        entry.0 += 1;
        entry.1[0] += rect.x as f64;
        entry.1[1] += rect.y as f64;
        entry.1[2] += rect.right() as f64;
        entry.1[3] += rect.bottom() as f64;
    }

    clusters
        .into_values()
        .filter(|(count, _)| *count > min_neighbors)
        .map(|(count, sums)| {
            let n = count as f64;
            let [x, y, r, b] = sums.map(|s| (s / n).round() as i32);
            PixelRect::new(x, y, (r - x).max(0) as u32, (b - y).max(0) as u32)
        })
        .collect()
}

/// Face detector backed by an `rten` model.
pub struct RtenFaceDetector {
    model: Model,
    input_id: NodeId,
    scores_id: NodeId,
    boxes_id: NodeId,
    input_width: u32,
    input_height: u32,
    params: FaceDetectorParams,
}

impl RtenFaceDetector {
    pub fn load(
        path: &Path,
        input_size: (u32, u32),
        params: FaceDetectorParams,
    ) -> anyhow::Result<Self> {
        params.validate()?;
        let model = Model::load_file(path)
            .with_context(|| format!("Failed to load face model {}", path.display()))?;
        let input_id = *model
            .input_ids()
            .first()
            .context("Face model has no inputs")?;
        let scores_id = model
            .find_node("scores")
            .context("Face model has no `scores` output")?;
        let boxes_id = model
            .find_node("boxes")
            .context("Face model has no `boxes` output")?;

        Ok(Self {
            model,
            input_id,
            scores_id,
            boxes_id,
            input_width: input_size.0,
            input_height: input_size.1,
            params,
        })
    }

    fn tile_input(&self, image: &RgbImage, tile: &PixelRect) -> NdTensor<f32, 4> {
        let crop = imageops::crop_imm(image, tile.x as u32, tile.y as u32, tile.width, tile.height)
            .to_image();
        let resized = imageops::resize(&crop, self.input_width, self.input_height, FilterType::Triangle);

        let (w, h) = (self.input_width as usize, self.input_height as usize);
        let mut input = NdTensor::zeros([1, 3, h, w]);
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                input[[0, c, y as usize, x as usize]] = (pixel.0[c] as f32 - 127.0) / 128.0;
            }
        }
        input
    }

    fn detect_tile(&self, image: &RgbImage, tile: &PixelRect) -> anyhow::Result<Vec<PixelRect>> {
        let input = self.tile_input(image, tile);
        let mut outputs = self.model.run(
            vec![(self.input_id, input.view().into())],
            &[self.scores_id, self.boxes_id],
            None,
        )?;
        let boxes: NdTensor<f32, 3> = outputs.pop().context("missing `boxes` output")?.try_into()?;
        let scores: NdTensor<f32, 3> = outputs.pop().context("missing `scores` output")?.try_into()?;
        if scores.size(1) != boxes.size(1) || scores.size(2) < 2 || boxes.size(2) < 4 {
            bail!("Unexpected face model output shapes");
        }

        let (tw, th) = (tile.width as f32, tile.height as f32);
        let mut found = Vec::new();
        for i in 0..scores.size(1) {
            if scores[[0, i, 1]] < self.params.score_threshold {
                continue;
            }
            let corner = |k: usize| boxes[[0, i, k]].clamp(0.0, 1.0);
            let x1 = tile.x + (corner(0) * tw).round() as i32;
            let y1 = tile.y + (corner(1) * th).round() as i32;
            let x2 = tile.x + (corner(2) * tw).round() as i32;
            let y2 = tile.y + (corner(3) * th).round() as i32;
            if x2 > x1 && y2 > y1 {
                found.push(PixelRect::new(x1, y1, (x2 - x1) as u32, (y2 - y1) as u32));
            }
        }
        Ok(found)
    }
}

impl FaceDetector for RtenFaceDetector {
    fn detect(&self, image: &RgbImage) -> anyhow::Result<Vec<PixelRect>> {
        let tiles = pyramid_tiles(image.width(), image.height(), &self.params);
        let mut candidates = Vec::new();
        for tile in &tiles {
            candidates.extend(self.detect_tile(image, tile)?);
        }

        let min_size = self.params.min_size;
        let faces: Vec<PixelRect> = group_rectangles(&candidates, self.params.min_neighbors, GROUP_EPS)
            .into_iter()
            .filter(|r| r.width >= min_size && r.height >= min_size)
            .collect();
        debug!(
            tiles = tiles.len(),
            candidates = candidates.len(),
            faces = faces.len(),
            "Face detection finished"
        );
        Ok(faces)
    }
}
