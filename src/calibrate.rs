//! Three-point affine calibration for resistive panels.
//!
//! A resistive panel's raw readings relate to screen position through an
//! affine map (scale, rotation/shear, offset). Three well-separated
//! reference points determine the map exactly; the solver below runs
//! Cramer's rule over the two 3x3 systems, which share one determinant:
//!
//! ```text
//! screen_x = (raw_x * ax + raw_y * bx + dx) / det
//! screen_y = (raw_x * ay + raw_y * by + dy) / det
//! ```
//!
//! Division truncates toward zero. All arithmetic is 64-bit: the offset
//! cofactors are triple products of raw and screen coordinates and do not
//! fit 32 bits for full-scale 12-bit readings.

use heapless::Vec;
use log::{debug, warn};

use crate::{
    config::{CALIBRATION_SETTLE_DISCARD, CALIBRATION_TARGET_COUNT},
    types::{RawSample, ScreenPoint},
};

/// The affine raw-to-screen transform, seven signed coefficients.
///
/// Usually produced by [`solve`] during a calibration pass and then stored
/// by the integrator; [`CalibrationMatrix::from_coefficients`] reloads a
/// stored matrix. [`Orientation`] provides factory presets for the stock
/// panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalibrationMatrix {
    pub ax: i64,
    pub bx: i64,
    pub dx: i64,
    pub ay: i64,
    pub by: i64,
    pub dy: i64,
    pub det: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationError {
    /// The three calibration points are collinear in raw-sample space, so
    /// the affine system has no solution (zero determinant).
    Degenerate,
    /// Fewer than three reference points have been captured.
    Incomplete,
}

impl core::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Degenerate => f.write_str("calibration points are collinear"),
            Self::Incomplete => f.write_str("calibration session is incomplete"),
        }
    }
}

impl CalibrationMatrix {
    /// Builds a matrix from stored coefficients, in the order
    /// `[ax, bx, dx, ay, by, dy, det]`. A zero determinant is rejected
    /// here rather than dividing by it on every later sample.
    pub fn from_coefficients(m: [i64; 7]) -> Result<Self, CalibrationError> {
        if m[6] == 0 {
            return Err(CalibrationError::Degenerate);
        }
        Ok(Self {
            ax: m[0],
            bx: m[1],
            dx: m[2],
            ay: m[3],
            by: m[4],
            dy: m[5],
            det: m[6],
        })
    }

    pub fn coefficients(&self) -> [i64; 7] {
        [
            self.ax, self.bx, self.dx, self.ay, self.by, self.dy, self.det,
        ]
    }

    /// Maps a raw pair onto screen coordinates.
    pub fn transform(&self, raw: RawSample) -> ScreenPoint {
        let rx = raw.x as i64;
        let ry = raw.y as i64;
        ScreenPoint {
            x: ((rx * self.ax + ry * self.bx + self.dx) / self.det) as i16,
            y: ((rx * self.ay + ry * self.by + self.dy) / self.det) as i16,
        }
    }
}

/// One reference point of a calibration pass: the on-screen target and the
/// averaged raw reading taken while it was held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CalibrationPoint {
    pub screen: ScreenPoint,
    pub raw: RawSample,
}

/// Solves the affine transform from three reference points.
///
/// Exact at the three points (up to the truncating division); linear
/// everywhere else. Raw points that are collinear, for example from a user
/// tapping along one panel edge, yield [`CalibrationError::Degenerate`].
pub fn solve(points: &[CalibrationPoint; 3]) -> Result<CalibrationMatrix, CalibrationError> {
    let [p0, p1, p2] = points;
    let (x0, y0) = (p0.screen.x as i64, p0.screen.y as i64);
    let (x1, y1) = (p1.screen.x as i64, p1.screen.y as i64);
    let (x2, y2) = (p2.screen.x as i64, p2.screen.y as i64);
    let (rx0, ry0) = (p0.raw.x as i64, p0.raw.y as i64);
    let (rx1, ry1) = (p1.raw.x as i64, p1.raw.y as i64);
    let (rx2, ry2) = (p2.raw.x as i64, p2.raw.y as i64);

    let det = (rx0 - rx2) * (ry1 - ry2) - (rx1 - rx2) * (ry0 - ry2);
    if det == 0 {
        warn!("degenerate calibration: raw points are collinear");
        return Err(CalibrationError::Degenerate);
    }

    let ax = (x0 - x2) * (ry1 - ry2) - (x1 - x2) * (ry0 - ry2);
    let bx = (rx0 - rx2) * (x1 - x2) - (x0 - x2) * (rx1 - rx2);
    let dx = (rx2 * x1 - rx1 * x2) * ry0
        + (rx0 * x2 - rx2 * x0) * ry1
        + (rx1 * x0 - rx0 * x1) * ry2;
    let ay = (y0 - y2) * (ry1 - ry2) - (y1 - y2) * (ry0 - ry2);
    let by = (rx0 - rx2) * (y1 - y2) - (y0 - y2) * (rx1 - rx2);
    let dy = (rx2 * y1 - rx1 * y2) * ry0
        + (rx0 * y2 - rx2 * y0) * ry1
        + (rx1 * y0 - rx0 * y1) * ry2;

    debug!("calibration solved: ax={ax} bx={bx} dx={dx} ay={ay} by={by} dy={dy} det={det}");

    Ok(CalibrationMatrix {
        ax,
        bx,
        dx,
        ay,
        by,
        dy,
        det,
    })
}

/// On-screen targets for one calibration pass, spread across the display
/// (upper left, lower center, middle right) so the raw points cannot end
/// up collinear on a sane panel.
pub fn calibration_targets(width: i16, height: i16) -> [ScreenPoint; 3] {
    let w = width as i32;
    let h = height as i32;
    [
        ScreenPoint {
            x: (w / 10) as i16,
            y: (h * 2 / 10) as i16,
        },
        ScreenPoint {
            x: (w / 2) as i16,
            y: (h * 9 / 10) as i16,
        },
        ScreenPoint {
            x: (w * 9 / 10) as i16,
            y: (h / 2) as i16,
        },
    ]
}

/// Accumulates raw readings while one calibration target is held.
///
/// The first [`CALIBRATION_SETTLE_DISCARD`] samples after contact are
/// dropped so electrode settling does not skew the result; the remainder
/// are averaged and returned once the pen lifts. Contact lost before any
/// sample was accepted just resets the accumulator, so a bouncing first
/// touch starts over cleanly.
#[derive(Clone, Copy, Debug)]
pub struct TargetSampler {
    sum_x: i32,
    sum_y: i32,
    count: i32,
}

impl Default for TargetSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetSampler {
    pub fn new() -> Self {
        Self {
            sum_x: 0,
            sum_y: 0,
            count: -CALIBRATION_SETTLE_DISCARD,
        }
    }

    /// Feeds one raw pair with the caller's threshold verdict. Returns the
    /// averaged raw reading once the pen lifts after a valid hold.
    pub fn feed(&mut self, raw: RawSample, touched: bool) -> Option<RawSample> {
        if !touched {
            let done = if self.count > 0 {
                Some(RawSample {
                    x: (self.sum_x / self.count) as i16,
                    y: (self.sum_y / self.count) as i16,
                })
            } else {
                None
            };
            *self = Self::new();
            return done;
        }

        self.count += 1;
        if self.count > 0 {
            self.sum_x += raw.x as i32;
            self.sum_y += raw.y as i32;
        }
        None
    }
}

/// Collects the reference points of a calibration pass and solves the
/// matrix once all three are captured.
#[derive(Debug, Default)]
pub struct CalibrationSession {
    points: Vec<CalibrationPoint, CALIBRATION_TARGET_COUNT>,
}

impl CalibrationSession {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn captured(&self) -> usize {
        self.points.len()
    }

    pub fn is_complete(&self) -> bool {
        self.points.is_full()
    }

    /// Records the averaged raw reading for the next target. Returns false
    /// once all targets have been captured.
    pub fn record(&mut self, screen: ScreenPoint, raw: RawSample) -> bool {
        self.points.push(CalibrationPoint { screen, raw }).is_ok()
    }

    pub fn solve(&self) -> Result<CalibrationMatrix, CalibrationError> {
        match <&[CalibrationPoint; CALIBRATION_TARGET_COUNT]>::try_from(self.points.as_slice()) {
            Ok(points) => solve(points),
            Err(_) => Err(CalibrationError::Incomplete),
        }
    }
}

/// Panel orientation, with the factory calibration for the stock display
/// in each position. Flipped variants are rotated by 180 degrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
    PortraitFlipped,
    LandscapeFlipped,
}

impl Default for Orientation {
    fn default() -> Self {
        Self::LandscapeFlipped
    }
}

impl Orientation {
    /// Factory calibration matrix for the stock panel in this orientation.
    /// A panel that deviates noticeably should be recalibrated with
    /// [`solve`] instead.
    pub fn matrix(self) -> CalibrationMatrix {
        let m = match self {
            Self::Portrait => [3_840, 318_720, -297_763_200, 328_576, -8_896, -164_591_232, 3_100_080],
            Self::Landscape => [328_192, -4_352, -178_717_056, 1_488, -314_592, 1_012_670_064, 3_055_164],
            Self::PortraitFlipped => {
                [1_728, -321_696, 1_034_304_336, -325_440, 1_600, 1_161_009_600, 3_098_070]
            }
            Self::LandscapeFlipped => {
                [-326_400, -1_024, 1_155_718_720, 3_768, 312_024, -299_081_088, 3_013_754]
            }
        };
        CalibrationMatrix {
            ax: m[0],
            bx: m[1],
            dx: m[2],
            ay: m[3],
            by: m[4],
            dy: m[5],
            det: m[6],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(sx: i16, sy: i16, rx: i16, ry: i16) -> CalibrationPoint {
        CalibrationPoint {
            screen: ScreenPoint { x: sx, y: sy },
            raw: RawSample { x: rx, y: ry },
        }
    }

    fn reference_points() -> [CalibrationPoint; 3] {
        [
            point(32, 48, 200, 300),
            point(160, 216, 2800, 3500),
            point(288, 120, 3600, 900),
        ]
    }

    #[test]
    fn solver_round_trips_the_reference_points() {
        let points = reference_points();
        let matrix = solve(&points).unwrap();
        assert_ne!(matrix.det, 0);

        for p in &points {
            let mapped = matrix.transform(p.raw);
            assert_eq!(mapped, p.screen);
        }
    }

    #[test]
    fn solver_is_exact_for_an_axis_aligned_panel() {
        // Raw 0..4000 maps linearly onto 0..400 on both axes.
        let points = [
            point(0, 0, 0, 0),
            point(100, 300, 1000, 3000),
            point(400, 50, 4000, 500),
        ];
        let matrix = solve(&points).unwrap();

        assert_eq!(
            matrix.transform(RawSample { x: 2000, y: 1000 }),
            ScreenPoint { x: 200, y: 100 }
        );
    }

    #[test]
    fn collinear_raw_points_are_rejected() {
        let points = [
            point(32, 48, 100, 100),
            point(160, 216, 200, 200),
            point(288, 120, 300, 300),
        ];
        assert_eq!(solve(&points), Err(CalibrationError::Degenerate));
    }

    #[test]
    fn zero_determinant_coefficients_are_rejected() {
        assert_eq!(
            CalibrationMatrix::from_coefficients([1, 0, 0, 0, 1, 0, 0]),
            Err(CalibrationError::Degenerate)
        );
    }

    #[test]
    fn coefficients_round_trip_through_storage() {
        let matrix = solve(&reference_points()).unwrap();
        let restored = CalibrationMatrix::from_coefficients(matrix.coefficients()).unwrap();
        assert_eq!(restored, matrix);
    }

    #[test]
    fn targets_span_a_320x240_display() {
        assert_eq!(
            calibration_targets(320, 240),
            [
                ScreenPoint { x: 32, y: 48 },
                ScreenPoint { x: 160, y: 216 },
                ScreenPoint { x: 288, y: 120 },
            ]
        );
    }

    #[test]
    fn targets_match_the_reference_calibration_scenario() {
        let targets = calibration_targets(320, 240);
        let points = reference_points();
        for (target, p) in targets.iter().zip(points.iter()) {
            assert_eq!(*target, p.screen);
        }
    }

    #[test]
    fn landscape_preset_centers_mid_scale_readings() {
        let matrix = Orientation::Landscape.matrix();
        let center = matrix.transform(RawSample { x: 2048, y: 2048 });
        // Stock panel is 320x240; mid-scale raw lands near the middle.
        assert_eq!(center, ScreenPoint { x: 158, y: 121 });
    }

    #[test]
    fn all_presets_have_nonzero_determinants() {
        for orientation in [
            Orientation::Portrait,
            Orientation::Landscape,
            Orientation::PortraitFlipped,
            Orientation::LandscapeFlipped,
        ] {
            assert_ne!(orientation.matrix().det, 0);
        }
    }

    #[test]
    fn sampler_discards_settling_samples_and_averages_the_rest() {
        let mut sampler = TargetSampler::new();

        // Five settling samples with a wild transient.
        for _ in 0..5 {
            assert_eq!(sampler.feed(RawSample { x: 4000, y: 10 }, true), None);
        }
        // Four stable samples.
        for _ in 0..4 {
            assert_eq!(sampler.feed(RawSample { x: 2000, y: 1500 }, true), None);
        }

        let avg = sampler.feed(RawSample { x: 0, y: 0 }, false).unwrap();
        assert_eq!(avg, RawSample { x: 2000, y: 1500 });
    }

    #[test]
    fn sampler_averages_partial_disagreement() {
        let mut sampler = TargetSampler::new();

        for _ in 0..5 {
            sampler.feed(RawSample { x: 1000, y: 1000 }, true);
        }
        sampler.feed(RawSample { x: 1000, y: 2000 }, true);
        sampler.feed(RawSample { x: 1002, y: 2002 }, true);

        let avg = sampler.feed(RawSample { x: 0, y: 0 }, false).unwrap();
        assert_eq!(avg, RawSample { x: 1001, y: 2001 });
    }

    #[test]
    fn sampler_resets_after_an_early_bounce() {
        let mut sampler = TargetSampler::new();

        // Contact lost during the settling window: no reading, clean reset.
        for _ in 0..3 {
            sampler.feed(RawSample { x: 900, y: 900 }, true);
        }
        assert_eq!(sampler.feed(RawSample { x: 0, y: 0 }, false), None);

        // A fresh hold still discards its own settling samples.
        for _ in 0..5 {
            assert_eq!(sampler.feed(RawSample { x: 4000, y: 4000 }, true), None);
        }
        sampler.feed(RawSample { x: 1200, y: 800 }, true);
        let avg = sampler.feed(RawSample { x: 0, y: 0 }, false).unwrap();
        assert_eq!(avg, RawSample { x: 1200, y: 800 });
    }

    #[test]
    fn session_solves_once_all_targets_are_captured() {
        let mut session = CalibrationSession::new();
        let points = reference_points();

        assert_eq!(session.solve(), Err(CalibrationError::Incomplete));
        for p in &points {
            assert!(!session.is_complete());
            assert!(session.record(p.screen, p.raw));
        }
        assert!(session.is_complete());
        assert_eq!(session.captured(), 3);
        // Extra recordings are refused rather than shifting earlier points.
        assert!(!session.record(ScreenPoint { x: 1, y: 1 }, RawSample { x: 1, y: 1 }));

        let matrix = session.solve().unwrap();
        assert_eq!(
            matrix.transform(RawSample { x: 200, y: 300 }),
            ScreenPoint { x: 32, y: 48 }
        );
    }
}
