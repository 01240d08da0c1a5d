pub mod debug;

pub use debug::{DebugSink, DebugSnapshot, LoadSnapshot, ThrottleSnapshot};

/// Two-axis throttle correction lookup: `(tps_from, tps_to) -> extra fuel ms`.
pub trait CorrectionTable {
    fn lookup(&self, from: f32, to: f32) -> f32;
}

/// One-axis taper lookup: samples elapsed since the detected jump -> multiplier.
pub trait TaperCurve {
    fn lookup(&self, distance: f32) -> f32;
}

impl<T: CorrectionTable + ?Sized> CorrectionTable for &T {
    fn lookup(&self, from: f32, to: f32) -> f32 {
        (**self).lookup(from, to)
    }
}

impl<T: TaperCurve + ?Sized> TaperCurve for &T {
    fn lookup(&self, distance: f32) -> f32 {
        (**self).lookup(distance)
    }
}

impl<T: CorrectionTable + ?Sized> CorrectionTable for Box<T> {
    fn lookup(&self, from: f32, to: f32) -> f32 {
        (**self).lookup(from, to)
    }
}

impl<T: TaperCurve + ?Sized> TaperCurve for Box<T> {
    fn lookup(&self, distance: f32) -> f32 {
        (**self).lookup(distance)
    }
}
