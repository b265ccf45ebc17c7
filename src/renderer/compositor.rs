//! Layered sphere composition
//!
//! Describes the ball as five fixed layers (shadow, base, highlight, shine,
//! rim light) with canvas-style radial gradients. The GPU pipeline evaluates
//! the same description per pixel; [`SphereFrame::shade`] is the CPU
//! reference of that shader.

use glam::Vec2;

use crate::sim::Body;

/// Straight-alpha colour, channels in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour from `0xRRGGBB`
    pub const fn hex(rgb: u32) -> Self {
        Self::rgba8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 1.0)
    }

    pub const fn rgba8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a)
    }

    pub fn premultiplied(self) -> [f32; 4] {
        [self.r * self.a, self.g * self.a, self.b * self.a, self.a]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

const fn stop(offset: f32, color: Rgba) -> ColorStop {
    ColorStop { offset, color }
}

/// Layer gradient stops
pub mod palette {
    use super::{ColorStop, Rgba, stop};

    pub const SHADOW: Rgba = Rgba::rgba8(0, 0, 0, 0.5);

    pub const BASE: [ColorStop; 4] = [
        stop(0.0, Rgba::hex(0xff6b6b)),
        stop(0.3, Rgba::hex(0xff3333)),
        stop(0.7, Rgba::hex(0xcc0000)),
        stop(1.0, Rgba::hex(0x8b0000)),
    ];

    pub const HIGHLIGHT: [ColorStop; 4] = [
        stop(0.0, Rgba::rgba8(255, 255, 255, 0.9)),
        stop(0.3, Rgba::rgba8(255, 255, 255, 0.6)),
        stop(0.5, Rgba::rgba8(255, 255, 255, 0.2)),
        stop(1.0, Rgba::rgba8(255, 255, 255, 0.0)),
    ];

    pub const SHINE: [ColorStop; 2] = [
        stop(0.0, Rgba::rgba8(255, 255, 255, 0.5)),
        stop(1.0, Rgba::rgba8(255, 255, 255, 0.0)),
    ];

    pub const RIM: [ColorStop; 3] = [
        stop(0.0, Rgba::rgba8(255, 150, 150, 0.0)),
        stop(0.5, Rgba::rgba8(255, 100, 100, 0.3)),
        stop(1.0, Rgba::rgba8(255, 0, 0, 0.0)),
    ];
}

/// Shadow geometry (px)
pub const SHADOW_OFFSET: Vec2 = Vec2::new(8.0, 8.0);
pub const SHADOW_BLUR: f32 = 25.0;

/// Two-point conical gradient, as in a 2D canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialGradient {
    pub start: Vec2,
    pub start_radius: f32,
    pub end: Vec2,
    pub end_radius: f32,
    pub stops: &'static [ColorStop],
}

impl RadialGradient {
    /// Gradient between two circles sharing a centre
    pub fn concentric(center: Vec2, inner: f32, outer: f32, stops: &'static [ColorStop]) -> Self {
        Self {
            start: center,
            start_radius: inner,
            end: center,
            end_radius: outer,
            stops,
        }
    }

    /// Gradient parameter at `p`: the largest `t` whose interpolated circle
    /// passes through `p` with a non-negative radius.
    pub fn parameter_at(&self, p: Vec2) -> Option<f32> {
        let cd = self.end - self.start;
        let dr = self.end_radius - self.start_radius;
        let pd = p - self.start;
        let r0 = self.start_radius;

        let a = cd.dot(cd) - dr * dr;
        let b = pd.dot(cd) + r0 * dr;
        let c = pd.dot(pd) - r0 * r0;
        let radius_ok = |t: f32| r0 + t * dr >= 0.0;

        if a.abs() < 1e-6 {
            if b.abs() < 1e-6 {
                return None;
            }
            let t = c / (2.0 * b);
            return radius_ok(t).then_some(t);
        }

        let disc = b * b - a * c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        let (t1, t2) = ((b + root) / a, (b - root) / a);
        let (hi, lo) = if t1 > t2 { (t1, t2) } else { (t2, t1) };

        if radius_ok(hi) {
            Some(hi)
        } else if radius_ok(lo) {
            Some(lo)
        } else {
            None
        }
    }

    /// Premultiplied colour at `p`; transparent where the gradient is undefined
    pub fn color_at(&self, p: Vec2) -> [f32; 4] {
        match self.parameter_at(p) {
            Some(t) => sample_stops(self.stops, t),
            None => [0.0; 4],
        }
    }
}

/// Interpolate stops in premultiplied space, padding outside [0, 1]
pub fn sample_stops(stops: &[ColorStop], t: f32) -> [f32; 4] {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return [0.0; 4];
    };
    if t <= first.offset {
        return first.color.premultiplied();
    }
    if t >= last.offset {
        return last.color.premultiplied();
    }

    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.offset {
            let span = (hi.offset - lo.offset).max(f32::EPSILON);
            let f = (t - lo.offset) / span;
            let (a, b) = (lo.color.premultiplied(), hi.color.premultiplied());
            return std::array::from_fn(|i| a[i] + (b[i] - a[i]) * f);
        }
    }
    last.color.premultiplied()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Solid(Rgba),
    Radial(RadialGradient),
}

/// Depth cue a layer provides, bottom to top
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Shadow,
    Base,
    Highlight,
    Shine,
    Rim,
}

/// A filled circle, optionally blurred
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub center: Vec2,
    pub radius: f32,
    /// Edge softness in px; 0 means a crisp anti-aliased edge
    pub blur: f32,
    pub fill: Fill,
}

impl Layer {
    /// Fraction of the pixel at `p` inside the circle
    pub fn coverage(&self, p: Vec2) -> f32 {
        let d = p.distance(self.center);
        if self.blur > 0.0 {
            1.0 - smoothstep(self.radius - self.blur, self.radius + self.blur, d)
        } else {
            (self.radius + 0.5 - d).clamp(0.0, 1.0)
        }
    }

    /// Premultiplied contribution of this layer at `p`
    pub fn shade(&self, p: Vec2) -> [f32; 4] {
        let coverage = self.coverage(p);
        if coverage <= 0.0 {
            return [0.0; 4];
        }
        let color = match self.fill {
            Fill::Solid(c) => c.premultiplied(),
            Fill::Radial(g) => g.color_at(p),
        };
        color.map(|c| c * coverage)
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub const LAYER_COUNT: usize = 5;

/// Everything painted for one frame, in z-order
#[derive(Debug, Clone, PartialEq)]
pub struct SphereFrame {
    pub layers: [Layer; LAYER_COUNT],
}

impl SphereFrame {
    /// Source-over composite of all layers at `p` (premultiplied)
    pub fn shade(&self, p: Vec2) -> [f32; 4] {
        self.layers.iter().fold([0.0; 4], |dst, layer| {
            let src = layer.shade(p);
            std::array::from_fn(|i| src[i] + dst[i] * (1.0 - src[3]))
        })
    }
}

/// Builds the shaded sphere for the ball's current position
#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor;

impl Compositor {
    pub fn compose(&self, body: &Body) -> SphereFrame {
        sphere_layers(body.pos, body.radius())
    }
}

/// Layer stack for a sphere of radius `r` centred at `c`
pub fn sphere_layers(c: Vec2, r: f32) -> SphereFrame {
    let highlight_center = c - Vec2::splat(r * 0.35);
    let shine_center = c + Vec2::new(-0.2, -0.5) * r;
    let rim_center = c + Vec2::splat(r * 0.4);

    SphereFrame {
        layers: [
            Layer {
                kind: LayerKind::Shadow,
                center: c + SHADOW_OFFSET,
                radius: r,
                blur: SHADOW_BLUR,
                fill: Fill::Solid(palette::SHADOW),
            },
            Layer {
                kind: LayerKind::Base,
                center: c,
                radius: r,
                blur: 0.0,
                fill: Fill::Radial(RadialGradient {
                    start: c - Vec2::splat(r * 0.3),
                    start_radius: r * 0.1,
                    end: c,
                    end_radius: r,
                    stops: &palette::BASE,
                }),
            },
            Layer {
                kind: LayerKind::Highlight,
                center: highlight_center,
                radius: r * 0.5,
                blur: 0.0,
                fill: Fill::Radial(RadialGradient::concentric(
                    highlight_center,
                    0.0,
                    r * 0.5,
                    &palette::HIGHLIGHT,
                )),
            },
            Layer {
                kind: LayerKind::Shine,
                center: shine_center,
                radius: r * 0.25,
                blur: 0.0,
                fill: Fill::Radial(RadialGradient::concentric(
                    shine_center,
                    0.0,
                    r * 0.25,
                    &palette::SHINE,
                )),
            },
            Layer {
                kind: LayerKind::Rim,
                center: c,
                radius: r,
                blur: 0.0,
                fill: Fill::Radial(RadialGradient::concentric(
                    rim_center,
                    r * 0.3,
                    r * 0.6,
                    &palette::RIM,
                )),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C: Vec2 = Vec2::new(500.0, 500.0);
    const R: f32 = 40.0;

    fn close(a: [f32; 4], b: [f32; 4]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-3)
    }

    #[test]
    fn test_layer_order() {
        let frame = sphere_layers(C, R);
        let kinds: Vec<_> = frame.layers.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LayerKind::Shadow,
                LayerKind::Base,
                LayerKind::Highlight,
                LayerKind::Shine,
                LayerKind::Rim
            ]
        );
    }

    #[test]
    fn test_hex_colors() {
        let c = Rgba::hex(0xff6b6b);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 107.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn test_concentric_parameter_is_normalised_distance() {
        let g = RadialGradient::concentric(C, 10.0, 30.0, &palette::SHINE);
        assert!((g.parameter_at(C + Vec2::new(20.0, 0.0)).unwrap() - 0.5).abs() < 1e-5);
        assert!((g.parameter_at(C + Vec2::new(0.0, 30.0)).unwrap() - 1.0).abs() < 1e-5);
        assert!(g.parameter_at(C).unwrap() < 0.0);
    }

    #[test]
    fn test_base_gradient_light_source_and_rim() {
        let frame = sphere_layers(C, R);
        let Fill::Radial(base) = frame.layers[1].fill else {
            panic!("base layer should be a gradient");
        };

        // Inside the small start circle the first stop pads
        let light = base.color_at(C - Vec2::splat(R * 0.3));
        assert!(close(light, Rgba::hex(0xff6b6b).premultiplied()));

        // On the outer circle the last stop applies
        let edge = base.color_at(C + Vec2::new(R, 0.0));
        assert!(close(edge, Rgba::hex(0x8b0000).premultiplied()));
    }

    #[test]
    fn test_sample_stops_interpolates_premultiplied() {
        let mid = sample_stops(&palette::SHINE, 0.5);
        assert!(close(mid, [0.25, 0.25, 0.25, 0.25]));
        assert!(close(sample_stops(&palette::SHINE, -1.0), [0.5, 0.5, 0.5, 0.5]));
        assert!(close(sample_stops(&palette::SHINE, 2.0), [0.0; 4]));
    }

    #[test]
    fn test_sphere_is_opaque_inside_and_clear_far_away() {
        let frame = sphere_layers(C, R);
        assert!((frame.shade(C)[3] - 1.0).abs() < 1e-4);
        assert_eq!(frame.shade(C + Vec2::new(200.0, 200.0)), [0.0; 4]);
    }

    #[test]
    fn test_shadow_falls_bottom_right() {
        let frame = sphere_layers(C, R);
        let below_right = frame.shade(C + SHADOW_OFFSET + Vec2::new(R + 5.0, 0.0));
        let above_left = frame.shade(C - SHADOW_OFFSET - Vec2::new(R + 5.0, 0.0));

        assert!(below_right[3] > 0.0);
        assert_eq!(&below_right[..3], &[0.0, 0.0, 0.0]);
        assert!(below_right[3] > above_left[3]);
    }

    #[test]
    fn test_highlight_brightens_upper_left() {
        let frame = sphere_layers(C, R);
        let spot = C - Vec2::splat(R * 0.35);
        let base_only = frame.layers[1].shade(spot);
        let composed = frame.shade(spot);
        assert!(composed[1] > base_only[1] + 0.4);
    }

    #[test]
    fn test_compositor_follows_body() {
        use crate::sim::{Body, Material};
        let body = Body::new(
            Vec2::new(100.0, 200.0),
            R,
            Material {
                restitution: 0.8,
                friction_air: 0.01,
            },
        );
        let frame = Compositor.compose(&body);
        assert_eq!(frame.layers[1].center, body.pos);
        assert_eq!(frame.layers[0].center, body.pos + SHADOW_OFFSET);
    }
}
