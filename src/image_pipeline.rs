use dicom::object::DefaultDicomObject;
use dicom::pixeldata::{
    DecodedPixelData, PhotometricInterpretation, PixelDecoder, PlanarConfiguration,
};

use crate::error::{PipelineError, Result};

/// VOI window applied to monochrome frames, in modality units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLevel {
    pub center: f64,
    pub width: f64,
}

impl WindowLevel {
    pub fn new(center: f64, width: f64) -> Self {
        Self {
            center,
            width: width.max(1.0),
        }
    }

    pub fn adjusted(self, d_center: f64, d_width: f64) -> Self {
        Self::new(self.center + d_center, self.width + d_width)
    }

    /// Linear VOI function: maps a modality value to an 8-bit display value.
    pub fn apply(&self, value: f64) -> u8 {
        let lower = self.center - 0.5 - (self.width - 1.0) / 2.0;
        let upper = self.center - 0.5 + (self.width - 1.0) / 2.0;
        if value <= lower {
            0
        } else if value > upper {
            255
        } else if self.width <= 1.0 {
            255
        } else {
            let scaled = ((value - (self.center - 0.5)) / (self.width - 1.0) + 0.5) * 255.0;
            scaled.clamp(0.0, 255.0).round() as u8
        }
    }
}

/// One decoded, windowed frame as packed RGBA8.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for RenderedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

pub struct FramePipeline;

impl FramePipeline {
    /// Decodes a single frame of `object` and converts it for display.
    pub fn render(
        object: &DefaultDicomObject,
        frame_idx: u32,
        window: Option<WindowLevel>,
    ) -> Result<RenderedFrame> {
        let decoded = object
            .decode_pixel_data_frame(frame_idx)
            .map_err(|err| PipelineError::Decode(err.to_string()))?;

        // The single-frame decode yields a buffer holding just that frame.
        Self::frame_to_rgba(&decoded, 0, window)
    }

    pub fn frame_to_rgba(
        decoded: &DecodedPixelData<'_>,
        frame_idx: u32,
        window: Option<WindowLevel>,
    ) -> Result<RenderedFrame> {
        if frame_idx >= decoded.number_of_frames() {
            return Err(PipelineError::FrameOutOfRange {
                requested: frame_idx,
                available: decoded.number_of_frames(),
            });
        }

        match decoded.photometric_interpretation() {
            photometric if photometric.is_monochrome() => {
                Self::monochrome_to_rgba(decoded, frame_idx, window)
            }
            PhotometricInterpretation::Rgb => Self::rgb_to_rgba(decoded, frame_idx),
            other => Self::fallback_to_dynamic(decoded, frame_idx, other.as_str()),
        }
    }

    fn monochrome_to_rgba(
        decoded: &DecodedPixelData<'_>,
        frame_idx: u32,
        window: Option<WindowLevel>,
    ) -> Result<RenderedFrame> {
        let invert = matches!(
            decoded.photometric_interpretation(),
            PhotometricInterpretation::Monochrome1
        );

        // Modality LUT (rescale slope/intercept) is applied by the conversion.
        let samples = decoded
            .to_vec_frame::<f32>(frame_idx)
            .map_err(|err| PipelineError::Materialize(err.to_string()))?;

        let gray = grayscale_to_display(&samples, window, invert);
        Ok(RenderedFrame {
            width: decoded.columns(),
            height: decoded.rows(),
            rgba: expand_gray(&gray),
        })
    }

    fn rgb_to_rgba(decoded: &DecodedPixelData<'_>, frame_idx: u32) -> Result<RenderedFrame> {
        let width = decoded.columns();
        let height = decoded.rows();
        let pixel_count = (width * height) as usize;
        let planar = matches!(
            decoded.planar_configuration(),
            PlanarConfiguration::PixelFirst
        );

        let rgba = if decoded.bits_allocated() <= 8 {
            let samples = decoded
                .to_vec_frame::<u8>(frame_idx)
                .map_err(|err| PipelineError::Materialize(err.to_string()))?;
            pack_rgb(&samples, pixel_count, planar, |_, value| value)?
        } else {
            let samples = decoded
                .to_vec_frame::<u16>(frame_idx)
                .map_err(|err| PipelineError::Materialize(err.to_string()))?;
            let ranges = channel_ranges(&samples, pixel_count, planar);
            pack_rgb(&samples, pixel_count, planar, |channel, value| {
                let (min, max) = ranges[channel];
                normalize(f64::from(value), f64::from(min), f64::from(max))
            })?
        };

        Ok(RenderedFrame {
            width,
            height,
            rgba,
        })
    }

    fn fallback_to_dynamic(
        decoded: &DecodedPixelData<'_>,
        frame_idx: u32,
        interpretation: &str,
    ) -> Result<RenderedFrame> {
        let image = decoded
            .to_dynamic_image(frame_idx)
            .map_err(|err| PipelineError::Unsupported {
                interpretation: interpretation.to_string(),
                reason: err.to_string(),
            })?;
        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(RenderedFrame {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }
}

/// Maps modality values to display grays: through `window` when present,
/// otherwise by stretching the frame's own min..max range.
pub fn grayscale_to_display(samples: &[f32], window: Option<WindowLevel>, invert: bool) -> Vec<u8> {
    let mapper: Box<dyn Fn(f64) -> u8> = match window {
        Some(window) => Box::new(move |value| window.apply(value)),
        None => {
            let (min, max) = min_max(samples).unwrap_or((0.0, 0.0));
            Box::new(move |value| normalize(value, min, max))
        }
    };

    samples
        .iter()
        .map(|&sample| {
            let gray = mapper(f64::from(sample));
            if invert {
                255 - gray
            } else {
                gray
            }
        })
        .collect()
}

fn expand_gray(gray: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(gray.len() * 4);
    for &value in gray {
        rgba.extend_from_slice(&[value, value, value, 255]);
    }
    rgba
}

/// Packs three colour samples per pixel into RGBA. `planar` selects the
/// RRR..GGG..BBB layout over interleaved RGBRGB.
fn pack_rgb<T: Copy>(
    samples: &[T],
    pixel_count: usize,
    planar: bool,
    map: impl Fn(usize, T) -> u8,
) -> Result<Vec<u8>> {
    if samples.len() < pixel_count * 3 {
        return Err(PipelineError::Buffer(format!(
            "RGB buffer length {} is too small for {pixel_count} pixels",
            samples.len()
        )));
    }

    let sample_at = |pixel: usize, channel: usize| {
        if planar {
            samples[channel * pixel_count + pixel]
        } else {
            samples[pixel * 3 + channel]
        }
    };

    let mut rgba = Vec::with_capacity(pixel_count * 4);
    for pixel in 0..pixel_count {
        rgba.extend_from_slice(&[
            map(0, sample_at(pixel, 0)),
            map(1, sample_at(pixel, 1)),
            map(2, sample_at(pixel, 2)),
            255,
        ]);
    }
    Ok(rgba)
}

fn channel_ranges(samples: &[u16], pixel_count: usize, planar: bool) -> [(u16, u16); 3] {
    let mut ranges = [(u16::MAX, u16::MIN); 3];
    for (idx, &value) in samples.iter().take(pixel_count * 3).enumerate() {
        let channel = if planar { idx / pixel_count.max(1) } else { idx % 3 };
        let (min, max) = &mut ranges[channel.min(2)];
        *min = (*min).min(value);
        *max = (*max).max(value);
    }
    ranges
}

fn min_max(values: &[f32]) -> Option<(f64, f64)> {
    values.iter().copied().fold(None, |acc, value| {
        let value = f64::from(value);
        match acc {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        }
    })
}

fn normalize(value: f64, min: f64, max: f64) -> u8 {
    if max <= min {
        return 0;
    }

    let normalized = (value - min).max(0.0) / (max - min);
    (normalized * 255.0).clamp(0.0, 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_maps_below_and_above_to_extremes() {
        let window = WindowLevel::new(40.0, 400.0);
        assert_eq!(window.apply(-1000.0), 0);
        assert_eq!(window.apply(1000.0), 255);
        let mid = window.apply(40.0);
        assert!((127..=128).contains(&mid), "mid gray was {mid}");
    }

    #[test]
    fn window_width_is_at_least_one() {
        let window = WindowLevel::new(10.0, -5.0);
        assert_eq!(window.width, 1.0);
        assert_eq!(window.apply(9.0), 0);
        assert_eq!(window.apply(11.0), 255);
    }

    #[test]
    fn unwindowed_frames_stretch_to_full_range() {
        let gray = grayscale_to_display(&[100.0, 150.0, 200.0], None, false);
        assert_eq!(gray, vec![0, 128, 255]);
    }

    #[test]
    fn monochrome1_is_inverted() {
        let gray = grayscale_to_display(&[0.0, 10.0], None, true);
        assert_eq!(gray, vec![255, 0]);
    }

    #[test]
    fn planar_and_interleaved_pack_identically() {
        let interleaved = [1u8, 2, 3, 4, 5, 6];
        let planar = [1u8, 4, 2, 5, 3, 6];
        let a = pack_rgb(&interleaved, 2, false, |_, v| v).unwrap();
        let b = pack_rgb(&planar, 2, true, |_, v| v).unwrap();
        assert_eq!(a, vec![1, 2, 3, 255, 4, 5, 6, 255]);
        assert_eq!(a, b);
    }

    #[test]
    fn short_rgb_buffer_is_rejected() {
        let result = pack_rgb(&[1u8, 2, 3], 2, false, |_, v| v);
        assert!(matches!(result, Err(PipelineError::Buffer(_))));
    }

    #[test]
    fn sixteen_bit_channels_normalize_independently() {
        let samples = [0u16, 100, 1000, 10, 200, 3000];
        let ranges = channel_ranges(&samples, 2, false);
        assert_eq!(ranges, [(0, 10), (100, 200), (1000, 3000)]);
    }
}
