
//! Small value types shared by the attribute readers and the block geometry.

use std::fmt;


/// A pair of values, used for positions, sizes and sampling rates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Vec2<T> (pub T, pub T);

impl<T> Vec2<T> {

    /// Horizontal component.
    #[inline] pub fn x(self) -> T { self.0 }

    /// Vertical component.
    #[inline] pub fn y(self) -> T { self.1 }

    /// Horizontal component, for sizes.
    #[inline] pub fn width(self) -> T { self.0 }

    /// Vertical component, for sizes.
    #[inline] pub fn height(self) -> T { self.1 }
}

impl<T> From<(T, T)> for Vec2<T> {
    fn from((x, y): (T, T)) -> Self { Vec2(x, y) }
}

impl<T: fmt::Display> fmt::Display for Vec2<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[{}, {}]", self.0, self.1)
    }
}


/// Round up or down in specific calculations.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum RoundingMode {

    /// Round down.
    Down,

    /// Round up.
    Up,
}

impl RoundingMode {

    /// Divide two positive numbers, rounding the quotient as specified.
    /// The divisor must not be zero.
    pub(crate) fn divide(self, dividend: usize, divisor: usize) -> usize {
        match self {
            RoundingMode::Up => dividend / divisor + usize::from(dividend % divisor != 0),
            RoundingMode::Down => dividend / divisor,
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rounding_up(){
        let round_up = RoundingMode::Up;
        assert_eq!(round_up.divide(10, 10), 1, "divide equal");
        assert_eq!(round_up.divide(10, 2), 5, "divide even");
        assert_eq!(round_up.divide(100, 16), 7, "divide odd");
        assert_eq!(round_up.divide(0, 16), 0, "divide zero");
    }

    #[test]
    fn rounding_down(){
        let round_down = RoundingMode::Down;
        assert_eq!(round_down.divide(8, 2), 4);
        assert_eq!(round_down.divide(100, 16), 6);
    }

    #[test]
    fn display(){
        assert_eq!(Vec2(3, -4).to_string(), "[3, -4]");
    }
}
