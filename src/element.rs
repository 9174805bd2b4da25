//! Element types that can be deformed.
use num_traits::{Bounded, NumCast, ToPrimitive};

/// A numeric array element.
///
/// Elements are promoted to `f64` for filtering and sampling, and converted
/// back when written to the output. Floats are cast; integers are rounded
/// to the nearest value (half away from zero) and saturated to their range,
/// so label masks interpolated at order 0 keep their exact labels.
pub trait Element: Copy + Send + Sync {
    /// Promote to a double-precision sample.
    fn to_sample(self) -> f64;

    /// Convert a double-precision result back to this element type.
    fn from_sample(v: f64) -> Self;
}

macro_rules! element_float_impl {
    ($T:ty) => {
        impl Element for $T {
            #[inline]
            fn to_sample(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_sample(v: f64) -> Self {
                v as $T
            }
        }
    };
}

macro_rules! element_int_impl {
    ($T:ty) => {
        impl Element for $T {
            #[inline]
            fn to_sample(self) -> f64 {
                self.to_f64().unwrap_or(0.0)
            }

            #[inline]
            fn from_sample(v: f64) -> Self {
                if v.is_nan() {
                    return 0;
                }
                let r = v.round();
                <$T as NumCast>::from(r).unwrap_or(if r < 0.0 {
                    <$T as Bounded>::min_value()
                } else {
                    <$T as Bounded>::max_value()
                })
            }
        }
    };
}

element_float_impl!(f32);
element_float_impl!(f64);
element_int_impl!(i8);
element_int_impl!(i16);
element_int_impl!(i32);
element_int_impl!(i64);
element_int_impl!(isize);
element_int_impl!(u8);
element_int_impl!(u16);
element_int_impl!(u32);
element_int_impl!(u64);
element_int_impl!(usize);

#[cfg(test)]
mod test {
    use super::Element;

    #[test]
    fn test_float_roundtrip() {
        assert_eq!(f32::from_sample(1.5_f32.to_sample()), 1.5);
        assert_eq!(f64::from_sample(-0.25), -0.25);
    }

    #[test]
    fn test_int_rounding_and_saturation() {
        assert_eq!(u8::from_sample(2.5), 3);
        assert_eq!(u8::from_sample(2.49), 2);
        assert_eq!(i16::from_sample(-2.5), -3);
        assert_eq!(u8::from_sample(-4.0), 0);
        assert_eq!(u8::from_sample(300.0), 255);
        assert_eq!(i8::from_sample(-1e9), -128);
        assert_eq!(i32::from_sample(f64::NAN), 0);
        assert_eq!(u16::from_sample(f64::INFINITY), u16::MAX);
    }
}
