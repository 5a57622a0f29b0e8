use log::debug;

use crate::color::Color;
use crate::error::{ExtractError, Result};
use crate::pipeline::source::PixelSource;

pub const DEFAULT_RESOLUTION: usize = 8;
pub const MAX_RESOLUTION: usize = 64;

/// Tuning for cube construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeConfig {
    /// Levels per channel; the cube has `resolution³` buckets.
    pub resolution: usize,
    /// Sample every `stride`-th pixel in both directions. 1 scans everything.
    pub stride: u32,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            stride: 1,
        }
    }
}

impl CubeConfig {
    pub fn validate(&self) -> Result<()> {
        if !(2..=MAX_RESOLUTION).contains(&self.resolution) {
            return Err(ExtractError::invalid_config(format!(
                "resolution must be between 2 and {MAX_RESOLUTION}, got {}",
                self.resolution
            )));
        }
        if self.stride == 0 {
            return Err(ExtractError::invalid_config("stride must be at least 1"));
        }
        Ok(())
    }
}

/// One cell of the cube: running channel sums and the pixel count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bucket {
    /// Level index per channel (r, g, b).
    pub coords: [u8; 3],
    pub sum: [u64; 3],
    pub count: u64,
}

impl Bucket {
    /// Average color of the pixels in this bucket, rounded to nearest.
    /// `None` for an empty bucket.
    pub fn representative(&self) -> Option<Color> {
        if self.count == 0 {
            return None;
        }
        let avg = |sum: u64| ((sum + self.count / 2) / self.count) as u8;
        Some(Color::new(avg(self.sum[0]), avg(self.sum[1]), avg(self.sum[2])))
    }
}

/// A non-empty bucket seen as a palette candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteEntry {
    pub color: Color,
    /// Pixel count of the originating bucket.
    pub population: u64,
    pub luminance: f32,
    /// Linear index of the originating bucket.
    pub index: usize,
}

/// Quantized RGB histogram.
///
/// Every channel is split into `resolution` levels (`level = c * N / 256`).
/// Each sampled pixel lands in exactly one bucket, so the bucket counts always
/// sum to the number of sampled pixels. The cube is never modified after
/// [`ColorCube::build`] returns, so it can be queried from several threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorCube {
    resolution: usize,
    buckets: Vec<Bucket>,
    samples: u64,
}

impl ColorCube {
    /// Scan `source` once and accumulate every sampled pixel.
    ///
    /// With the `threads` feature the rows are split across the rayon pool;
    /// the result is identical to [`ColorCube::build_sequential`].
    pub fn build<S: PixelSource + ?Sized>(source: &S, config: &CubeConfig) -> Result<Self> {
        config.validate()?;
        source.validate()?;

        #[cfg(feature = "threads")]
        let cube = Self::scan_parallel(source, config);
        #[cfg(not(feature = "threads"))]
        let cube = Self::scan(source, config);

        debug!(
            "built {}³ cube from {}x{} image: {} samples in {} buckets",
            cube.resolution,
            source.width(),
            source.height(),
            cube.samples,
            cube.buckets.iter().filter(|b| b.count > 0).count()
        );
        Ok(cube)
    }

    /// Single-threaded build.
    pub fn build_sequential<S: PixelSource + ?Sized>(
        source: &S,
        config: &CubeConfig,
    ) -> Result<Self> {
        config.validate()?;
        source.validate()?;
        Ok(Self::scan(source, config))
    }

    fn empty(resolution: usize) -> Self {
        let mut buckets = Vec::with_capacity(resolution.pow(3));
        for b in 0..resolution {
            for g in 0..resolution {
                for r in 0..resolution {
                    buckets.push(Bucket {
                        coords: [r as u8, g as u8, b as u8],
                        ..Bucket::default()
                    });
                }
            }
        }
        Self {
            resolution,
            buckets,
            samples: 0,
        }
    }

    fn scan<S: PixelSource + ?Sized>(source: &S, config: &CubeConfig) -> Self {
        let mut cube = Self::empty(config.resolution);
        let rows = (0..source.height()).step_by(config.stride as usize);
        cube.accumulate_rows(source, rows, config.stride);
        cube
    }

    #[cfg(feature = "threads")]
    fn scan_parallel<S: PixelSource + ?Sized>(source: &S, config: &CubeConfig) -> Self {
        use rayon::prelude::*;

        let rows: Vec<u32> = (0..source.height())
            .step_by(config.stride as usize)
            .collect();
        let chunk_size = rows.len().div_ceil(rayon::current_num_threads()).max(1);

        rows.par_chunks(chunk_size)
            .map(|chunk| {
                let mut partial = Self::empty(config.resolution);
                partial.accumulate_rows(source, chunk.iter().copied(), config.stride);
                partial
            })
            .reduce_with(Self::merge)
            .unwrap_or_else(|| Self::empty(config.resolution))
    }

    /// Element-wise sum of two partial cubes of the same resolution.
    fn merge(mut self, other: Self) -> Self {
        for (dst, src) in self.buckets.iter_mut().zip(&other.buckets) {
            dst.sum[0] += src.sum[0];
            dst.sum[1] += src.sum[1];
            dst.sum[2] += src.sum[2];
            dst.count += src.count;
        }
        self.samples += other.samples;
        self
    }

    fn accumulate_rows<S: PixelSource + ?Sized>(
        &mut self,
        source: &S,
        rows: impl Iterator<Item = u32>,
        stride: u32,
    ) {
        let width = source.width();
        for y in rows {
            for x in (0..width).step_by(stride as usize) {
                let [r, g, b, a] = source.pixel(x, y);
                self.add(premultiply(r, a), premultiply(g, a), premultiply(b, a));
            }
        }
    }

    fn add(&mut self, r: u8, g: u8, b: u8) {
        let n = self.resolution;
        let level = |c: u8| c as usize * n / 256;
        let index = self.linear_index(level(r), level(g), level(b));
        let bucket = &mut self.buckets[index];
        bucket.sum[0] += r as u64;
        bucket.sum[1] += g as u64;
        bucket.sum[2] += b as u64;
        bucket.count += 1;
        self.samples += 1;
    }

    fn linear_index(&self, r: usize, g: usize, b: usize) -> usize {
        r + g * self.resolution + b * self.resolution * self.resolution
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Number of pixels scanned during construction.
    pub fn sample_count(&self) -> u64 {
        self.samples
    }

    /// Sum of all bucket counts. Always equal to [`ColorCube::sample_count`].
    pub fn total_count(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn bucket(&self, r: usize, g: usize, b: usize) -> Option<&Bucket> {
        let n = self.resolution;
        if r >= n || g >= n || b >= n {
            return None;
        }
        Some(&self.buckets[self.linear_index(r, g, b)])
    }

    /// Non-empty buckets in linear index order.
    pub fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter().filter(|b| b.count > 0)
    }

    /// Every non-empty bucket as a palette candidate.
    pub fn entries(&self) -> Vec<PaletteEntry> {
        (0..self.buckets.len())
            .filter_map(|i| self.entry(i))
            .collect()
    }

    /// Non-empty buckets with no neighbour (of up to 26) holding strictly more
    /// pixels.
    pub fn local_maxima(&self) -> Vec<PaletteEntry> {
        (0..self.buckets.len())
            .filter(|&i| self.is_local_maximum(i))
            .filter_map(|i| self.entry(i))
            .collect()
    }

    fn entry(&self, index: usize) -> Option<PaletteEntry> {
        let bucket = &self.buckets[index];
        bucket.representative().map(|color| PaletteEntry {
            color,
            population: bucket.count,
            luminance: color.luminance(),
            index,
        })
    }

    fn is_local_maximum(&self, index: usize) -> bool {
        let bucket = &self.buckets[index];
        if bucket.count == 0 {
            return false;
        }
        let [r, g, b] = bucket.coords.map(|c| c as isize);
        let n = self.resolution as isize;
        for dr in -1..=1 {
            for dg in -1..=1 {
                for db in -1..=1 {
                    let (nr, ng, nb) = (r + dr, g + dg, b + db);
                    if nr < 0 || ng < 0 || nb < 0 || nr >= n || ng >= n || nb >= n {
                        continue;
                    }
                    let neighbour = self.linear_index(nr as usize, ng as usize, nb as usize);
                    if self.buckets[neighbour].count > bucket.count {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// Weight a channel by alpha. Opaque pixels are unchanged.
fn premultiply(c: u8, a: u8) -> u8 {
    if a == 255 {
        return c;
    }
    ((c as u32 * a as u32 + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::source::RgbaBuffer;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbaBuffer {
        RgbaBuffer::from_fn(width, height, |_, _| [rgb[0], rgb[1], rgb[2], 255]).unwrap()
    }

    fn gradient(width: u32, height: u32) -> RgbaBuffer {
        RgbaBuffer::from_fn(width, height, |x, y| {
            [
                ((x * 255) / width.max(1)) as u8,
                ((y * 255) / height.max(1)) as u8,
                ((x + y) % 256) as u8,
                255,
            ]
        })
        .unwrap()
    }

    #[test]
    fn solid_image_fills_one_bucket() {
        let cube = ColorCube::build(&solid(10, 10, [200, 40, 90]), &CubeConfig::default()).unwrap();
        let buckets: Vec<_> = cube.buckets().collect();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 100);
        assert_eq!(buckets[0].coords, [6, 1, 2]);
        assert_eq!(buckets[0].representative(), Some(Color::new(200, 40, 90)));
    }

    #[test]
    fn representative_rounds_to_nearest() {
        // 10 and 11 average to 10.5 and round up; both share level 0.
        let buffer = RgbaBuffer::from_rgb(2, 1, &[[10, 0, 0], [11, 0, 0]]).unwrap();
        let cube = ColorCube::build(&buffer, &CubeConfig::default()).unwrap();
        let bucket = cube.bucket(0, 0, 0).unwrap();
        assert_eq!(bucket.representative(), Some(Color::new(11, 0, 0)));
    }

    #[test]
    fn empty_bucket_has_no_representative() {
        assert_eq!(Bucket::default().representative(), None);
    }

    #[test]
    fn level_mapping_uses_integer_division() {
        let buffer = RgbaBuffer::from_rgb(3, 1, &[[31, 0, 0], [32, 0, 0], [255, 0, 0]]).unwrap();
        let cube = ColorCube::build(&buffer, &CubeConfig::default()).unwrap();
        assert_eq!(cube.bucket(0, 0, 0).unwrap().count, 1);
        assert_eq!(cube.bucket(1, 0, 0).unwrap().count, 1);
        assert_eq!(cube.bucket(7, 0, 0).unwrap().count, 1);
        assert!(cube.bucket(8, 0, 0).is_none());
    }

    #[test]
    fn total_count_matches_samples() {
        let cube = ColorCube::build(&gradient(37, 23), &CubeConfig::default()).unwrap();
        assert_eq!(cube.sample_count(), 37 * 23);
        assert_eq!(cube.total_count(), cube.sample_count());
    }

    #[test]
    fn stride_subsamples_deterministically() {
        let config = CubeConfig {
            stride: 3,
            ..CubeConfig::default()
        };
        let a = ColorCube::build(&gradient(10, 7), &config).unwrap();
        let b = ColorCube::build(&gradient(10, 7), &config).unwrap();
        // ceil(10 / 3) * ceil(7 / 3)
        assert_eq!(a.sample_count(), 4 * 3);
        assert_eq!(a, b);
    }

    #[test]
    fn parallel_build_matches_sequential() {
        let source = gradient(128, 97);
        let config = CubeConfig {
            resolution: 16,
            stride: 1,
        };
        let par = ColorCube::build(&source, &config).unwrap();
        let seq = ColorCube::build_sequential(&source, &config).unwrap();
        assert_eq!(par, seq);
    }

    #[test]
    fn zero_dimension_is_invalid_image() {
        let empty = RgbaBuffer::new(0, 0, Vec::new()).unwrap();
        let err = ColorCube::build(&empty, &CubeConfig::default()).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidImage(_)), "got {err:?}");
    }

    #[test]
    fn max_resolution_is_accepted() {
        let config = CubeConfig {
            resolution: MAX_RESOLUTION,
            stride: 1,
        };
        let cube = ColorCube::build(&solid(2, 2, [255, 255, 255]), &config).unwrap();
        assert_eq!(cube.resolution(), 64);
        assert_eq!(cube.bucket(63, 63, 63).unwrap().count, 4);
    }

    #[test]
    fn premultiply_rounds_to_nearest() {
        assert_eq!(premultiply(1, 128), 1);
        assert_eq!(premultiply(1, 127), 0);
        assert_eq!(premultiply(200, 255), 200);
        assert_eq!(premultiply(255, 0), 0);
        assert_eq!(premultiply(255, 128), 128);
    }

    #[test]
    fn out_of_range_resolution_is_rejected() {
        for resolution in [0, 1, MAX_RESOLUTION + 1, 128, 256] {
            let config = CubeConfig {
                resolution,
                stride: 1,
            };
            assert!(matches!(
                ColorCube::build(&solid(2, 2, [0, 0, 0]), &config),
                Err(ExtractError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn transparent_pixels_are_weighted_by_alpha() {
        let buffer = RgbaBuffer::from_fn(2, 1, |x, _| {
            if x == 0 {
                [255, 255, 255, 0]
            } else {
                [200, 100, 50, 255]
            }
        })
        .unwrap();
        let cube = ColorCube::build(&buffer, &CubeConfig::default()).unwrap();
        assert_eq!(cube.bucket(0, 0, 0).unwrap().count, 1);
        assert_eq!(cube.total_count(), 2);
    }

    #[test]
    fn local_maxima_skip_dominated_neighbours() {
        // Two adjacent buckets: the larger one wins; a distant one stays a maximum.
        let mut pixels = vec![[10, 10, 10]; 5];
        pixels.extend(vec![[40, 10, 10]; 2]);
        pixels.extend(vec![[250, 250, 250]; 1]);
        let buffer = RgbaBuffer::from_rgb(8, 1, &pixels).unwrap();
        let cube = ColorCube::build(&buffer, &CubeConfig::default()).unwrap();

        let maxima: Vec<Color> = cube.local_maxima().iter().map(|e| e.color).collect();
        assert_eq!(maxima, vec![Color::new(10, 10, 10), Color::new(250, 250, 250)]);
        assert_eq!(cube.entries().len(), 3);
    }

    #[test]
    fn higher_resolution_keeps_every_pixel() {
        let source = gradient(50, 50);
        let mut previous = 0;
        for resolution in [2, 4, 8, 16, 32] {
            let config = CubeConfig {
                resolution,
                stride: 1,
            };
            let cube = ColorCube::build(&source, &config).unwrap();
            let represented: u64 = cube.buckets().map(|b| b.count).sum();
            assert!(represented >= previous);
            previous = represented;
        }
        assert_eq!(previous, 2500);
    }
}
