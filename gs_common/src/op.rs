//! Boilerplate generator for arithmetic operators on single-field newtypes.
//!
//! ```rust,ignore
//! op!(binary MinorUnits, Add, add);
//! op!(inplace MinorUnits, AddAssign, add_assign);
//! op!(unary MinorUnits, Neg, neg);
//! ```
#[macro_export]
macro_rules! op {
    (binary $type:ty, $trait:ident, $fn:ident) => {
        impl std::ops::$trait for $type {
            type Output = Self;

            fn $fn(self, rhs: Self) -> Self::Output {
                Self(std::ops::$trait::$fn(self.0, rhs.0))
            }
        }
    };

    (inplace $type:ty, $trait:ident, $fn:ident) => {
        impl std::ops::$trait for $type {
            fn $fn(&mut self, rhs: Self) {
                std::ops::$trait::$fn(&mut self.0, rhs.0)
            }
        }
    };

    (unary $type:ty, $trait:ident, $fn:ident) => {
        impl std::ops::$trait for $type {
            type Output = Self;

            fn $fn(self) -> Self::Output {
                Self(std::ops::$trait::$fn(self.0))
            }
        }
    };
}
