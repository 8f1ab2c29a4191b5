// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `pulse`: a slowly cycling background with breathing vertical bars.
//!
//! Uses nothing but clears and scissor rectangles, so it runs on any GL
//! context and allocates no GL objects of its own.

#![expect(unsafe_code, reason = "raw GL calls")]

use core::f64::consts::TAU;

use layerhack_core::hack::{Drawable, Hack, HackContext, HackFactory};
use layerhack_core::options::OptionSpec;
use tracing::debug;

const DEFAULTS: &[&str] = &["*delay: 16000", "*speed: 1.0", "*bars: 6"];

const OPTIONS: &[OptionSpec] = &[
    OptionSpec::value("-delay", "delay", "usecs"),
    OptionSpec::value("-speed", "speed", "float"),
    OptionSpec::value("-bars", "bars", "count"),
];

/// Phase advance per frame at speed `1.0`.
const STEP: f64 = 0.002;

/// Creates [`Pulse`] instances.
#[derive(Debug, Default)]
pub(crate) struct PulseFactory;

impl HackFactory for PulseFactory {
    fn progclass(&self) -> &str {
        "Pulse"
    }

    fn defaults(&self) -> &[&'static str] {
        DEFAULTS
    }

    fn options(&self) -> &[OptionSpec] {
        OPTIONS
    }

    fn init(&self, ctx: &HackContext<'_>, drawable: &Drawable) -> Box<dyn Hack> {
        let pulse = Pulse::from_context(ctx, drawable);
        debug!(output = ?ctx.output_name, ?pulse, "pulse init");
        Box::new(pulse)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Pulse {
    delay_us: u64,
    speed: f64,
    bars: u32,
    mono: bool,
    phase: f64,
    width: u32,
    height: u32,
}

impl Pulse {
    fn from_context(ctx: &HackContext<'_>, drawable: &Drawable) -> Self {
        let size = drawable.size();
        let speed = ctx.resources.float("speed");
        Self {
            delay_us: u64::try_from(ctx.resources.integer("delay")).unwrap_or(0),
            speed: if speed > 0.0 { speed } else { 1.0 },
            bars: u32::try_from(ctx.resources.integer("bars"))
                .unwrap_or(0)
                .min(64),
            mono: ctx.mono,
            phase: 0.0,
            width: size.width,
            height: size.height,
        }
    }

    fn background(&self) -> [f32; 3] {
        if self.mono {
            let level = 0.5 + 0.5 * (self.phase * TAU).sin();
            [to_channel(level); 3]
        } else {
            hue_to_rgb(self.phase)
        }
    }

    /// Scissor rectangle `(x, y, width, height)` of bar `index`.
    fn bar(&self, index: u32) -> (i32, i32, i32, i32) {
        let bars = self.bars.max(1);
        let left = u64::from(self.width) * u64::from(index) / u64::from(bars);
        let right = u64::from(self.width) * u64::from(index + 1) / u64::from(bars);
        let swing = 0.5 + 0.5 * (self.phase * TAU * 3.0 + f64::from(index)).sin();
        let height = scale(self.height, 0.2 + 0.6 * swing);
        (
            gl_int(left),
            0,
            gl_int(right.saturating_sub(left)),
            gl_int(u64::from(height)),
        )
    }
}

impl Hack for Pulse {
    fn draw(&mut self, _ctx: &HackContext<'_>, _drawable: &Drawable) -> u64 {
        self.phase = (self.phase + STEP * self.speed).fract();
        let [r, g, b] = self.background();
        let [br, bg, bb] = [1.0 - r, 1.0 - g, 1.0 - b];

        // SAFETY: called with this session's context current and GL loaded.
        unsafe {
            gl::Disable(gl::SCISSOR_TEST);
            gl::ClearColor(r, g, b, 1.0);
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);

            gl::Enable(gl::SCISSOR_TEST);
            gl::ClearColor(br, bg, bb, 1.0);
            for index in 0..self.bars {
                let (x, y, width, height) = self.bar(index);
                gl::Scissor(x, y, width, height);
                gl::Clear(gl::COLOR_BUFFER_BIT);
            }
            gl::Disable(gl::SCISSOR_TEST);
        }
        self.delay_us
    }

    fn reshape(&mut self, ctx: &HackContext<'_>, _drawable: &Drawable, width: u32, height: u32) {
        debug!(output = ?ctx.output_name, width, height, "pulse reshape");
        self.width = width;
        self.height = height;
    }

    fn free(self: Box<Self>, ctx: &HackContext<'_>, _drawable: &Drawable) {
        debug!(output = ?ctx.output_name, "pulse free");
    }
}

/// Fully saturated color at `hue` turns around the wheel.
fn hue_to_rgb(hue: f64) -> [f32; 3] {
    let h = hue.rem_euclid(1.0) * 6.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let (r, g, b) = match h {
        h if h < 1.0 => (1.0, x, 0.0),
        h if h < 2.0 => (x, 1.0, 0.0),
        h if h < 3.0 => (0.0, 1.0, x),
        h if h < 4.0 => (0.0, x, 1.0),
        h if h < 5.0 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    [to_channel(r), to_channel(g), to_channel(b)]
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "clamped to 0..=1 before narrowing"
)]
fn to_channel(value: f64) -> f32 {
    value.clamp(0.0, 1.0) as f32
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "fraction is clamped to 0..=1, so the result is within 0..=extent"
)]
fn scale(extent: u32, fraction: f64) -> u32 {
    (f64::from(extent) * fraction.clamp(0.0, 1.0)) as u32
}

fn gl_int(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{DEFAULTS, Pulse, PulseFactory, hue_to_rgb};
    use layerhack_core::hack::{Drawable, HackContext, HackFactory, View};
    use layerhack_core::resources::ResourceDb;
    use layerhack_core::session::{SessionStore, Size};

    fn window(width: u32, height: u32) -> Drawable {
        let mut store = SessionStore::new();
        Drawable::Window {
            session: store.insert(()),
            view: View::covering(Size::new(width, height)),
        }
    }

    fn db() -> ResourceDb {
        let mut db = ResourceDb::new("pulse", PulseFactory.progclass());
        db.load_lines(DEFAULTS.iter().copied());
        db
    }

    #[test]
    fn defaults_are_read_from_resources() {
        let db = db();
        let ctx = HackContext {
            resources: &db,
            output_name: Some("DP-1"),
            mono: false,
        };
        let pulse = Pulse::from_context(&ctx, &window(800, 600));
        assert_eq!(pulse.delay_us, 16_000);
        assert_eq!(pulse.bars, 6);
        assert!((pulse.speed - 1.0).abs() < f64::EPSILON);
        assert_eq!((pulse.width, pulse.height), (800, 600));
    }

    #[test]
    fn bad_speed_falls_back_to_one() {
        let mut db = db();
        db.set("speed", "fast");
        let ctx = HackContext {
            resources: &db,
            output_name: None,
            mono: true,
        };
        let pulse = Pulse::from_context(&ctx, &window(10, 10));
        assert!((pulse.speed - 1.0).abs() < f64::EPSILON, "unparsable speed");
        assert!(pulse.mono);
    }

    #[test]
    fn hue_wheel_hits_primaries() {
        assert_eq!(hue_to_rgb(0.0), [1.0, 0.0, 0.0], "red");
        assert_eq!(hue_to_rgb(0.25), [0.5, 1.0, 0.0], "chartreuse");
        assert_eq!(hue_to_rgb(0.5), [0.0, 1.0, 1.0], "cyan");
        assert_eq!(hue_to_rgb(1.0), hue_to_rgb(0.0), "hue wraps");
        assert_eq!(hue_to_rgb(-0.5), hue_to_rgb(0.5), "negative hue wraps");
    }

    #[test]
    fn bars_tile_the_width() {
        let db = db();
        let ctx = HackContext {
            resources: &db,
            output_name: None,
            mono: false,
        };
        let pulse = Pulse::from_context(&ctx, &window(1000, 500));
        let mut covered = 0;
        for index in 0..pulse.bars {
            let (x, _, width, height) = pulse.bar(index);
            assert_eq!(x, covered, "bar {index} starts where the last ended");
            assert!(height > 0 && height <= 500, "bar {index} height {height}");
            covered += width;
        }
        assert_eq!(covered, 1000);
    }
}
