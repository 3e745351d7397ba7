//! The 2D axis pair backing the offscreen-rendered plot.
//!
//! The dynamic surface tile overwrites these ranges every frame so that the
//! offscreen content's coordinate space matches the geographic area it is
//! draped onto. Plain value types; painters read them, the tile writes them.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn set(&mut self, min: f64, max: f64) {
        self.min = min;
        self.max = max;
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis2 {
    pub x: AxisRange,
    pub y: AxisRange,
}

impl Axis2 {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            x: AxisRange::new(min_x, max_x),
            y: AxisRange::new(min_y, max_y),
        }
    }

    pub fn set(&mut self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) {
        self.x.set(min_x, max_x);
        self.y.set(min_y, max_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_both_ranges() {
        let mut axes = Axis2::new(0.0, 1.0, 0.0, 1.0);
        axes.set(-10.0, 10.0, -5.0, 5.0);

        assert_eq!(axes.x, AxisRange::new(-10.0, 10.0));
        assert_eq!(axes.y, AxisRange::new(-5.0, 5.0));
        assert_eq!(axes.x.span(), 20.0);
    }
}
