//! Declarative macros for reducing score type boilerplate.
//!
//! These macros generate the trait implementations shared by all field-based
//! score types: arithmetic ops, ordering, scaling and slash-separated parsing.

/// Generates `PartialOrd`, `Add`, `Sub`, and `Neg` for a field-based score type.
///
/// The constructor must accept fields in the order they are listed.
macro_rules! impl_score_ops {
    ($type:ident { $($field:ident),+ } => $ctor:ident) => {
        impl PartialOrd for $type {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $type {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                std::cmp::Ordering::Equal
                    $(.then_with(|| self.$field.cmp(&other.$field)))+
            }
        }

        impl std::ops::Add for $type {
            type Output = Self;

            fn add(self, other: Self) -> Self {
                $type::$ctor( $(self.$field + other.$field),+ )
            }
        }

        impl std::ops::Sub for $type {
            type Output = Self;

            fn sub(self, other: Self) -> Self {
                $type::$ctor( $(self.$field - other.$field),+ )
            }
        }

        impl std::ops::Neg for $type {
            type Output = Self;

            fn neg(self) -> Self {
                $type::$ctor( $(-self.$field),+ )
            }
        }
    };
}

/// Generates `multiply`, `multiply_decimal`, and `abs` inside an `impl Score` block.
///
/// `int` levels saturate on overflow; `decimal` levels multiply exactly.
macro_rules! impl_score_scale {
    (int $type:ident { $($field:ident),+ } => $ctor:ident) => {
        fn multiply(&self, multiplicand: i64) -> Self {
            $type::$ctor( $( self.$field.saturating_mul(multiplicand) ),+ )
        }

        fn multiply_decimal(&self, multiplicand: rust_decimal::Decimal) -> Self {
            $type::$ctor( $(
                $crate::score::round_to_i64(rust_decimal::Decimal::from(self.$field) * multiplicand)
            ),+ )
        }

        fn abs(&self) -> Self {
            $type::$ctor( $( self.$field.abs() ),+ )
        }
    };
    (decimal $type:ident { $($field:ident),+ } => $ctor:ident) => {
        fn multiply(&self, multiplicand: i64) -> Self {
            $type::$ctor( $( self.$field.saturating_mul(rust_decimal::Decimal::from(multiplicand)) ),+ )
        }

        fn multiply_decimal(&self, multiplicand: rust_decimal::Decimal) -> Self {
            $type::$ctor( $( self.$field.saturating_mul(multiplicand) ),+ )
        }

        fn abs(&self) -> Self {
            $type::$ctor( $( self.$field.abs() ),+ )
        }
    };
}

/// Generates `ParseableScore` for scores using the `"Xsuffix/Ysuffix"` format.
///
/// Each field maps to a suffix label and is parsed as `$num`.
macro_rules! impl_score_parse {
    ($type:ident { $($field:ident => $suffix:literal),+ } : $num:ty => $ctor:ident) => {
        impl $crate::score::ParseableScore for $type {
            fn parse(s: &str) -> Result<Self, $crate::score::ScoreParseError> {
                let s = s.trim();
                let parts: Vec<&str> = s.split('/').collect();
                let suffixes: &[&str] = &[ $($suffix),+ ];
                let count = suffixes.len();

                if parts.len() != count {
                    return Err($crate::score::ScoreParseError {
                        message: format!(
                            "Invalid {} format '{}': expected {} parts separated by '/'",
                            stringify!($type), s, count
                        ),
                    });
                }

                let mut _idx = 0usize;
                $(
                    let $field = {
                        let part = parts[_idx].trim();
                        let num_str = part.strip_suffix($suffix).ok_or_else(|| {
                            $crate::score::ScoreParseError {
                                message: format!(
                                    "{} part '{}' must end with '{}'",
                                    stringify!($field), part, $suffix
                                ),
                            }
                        })?;
                        let val = num_str.parse::<$num>().map_err(|e| {
                            $crate::score::ScoreParseError {
                                message: format!("Invalid {} score '{}': {}", $suffix, num_str, e),
                            }
                        })?;
                        _idx += 1;
                        val
                    };
                )+

                Ok($type::$ctor( $($field),+ ))
            }

            fn to_string_repr(&self) -> String {
                self.to_string()
            }
        }
    };
}
