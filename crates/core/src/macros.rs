// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boilerplate generators shared across the herald crates.

/// Give a unit-only enum its wire names: an `as_str()` returning the name and
/// a `Display` impl that writes it.
///
/// ```ignore
/// herald_core::wire_names! {
///     Status {
///         Started => "started",
///         Failed => "failed",
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_names {
    ($enum:ident { $( $variant:ident => $name:literal ),+ $(,)? }) => {
        impl $enum {
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )+
                }
            }
        }

        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Builder-style setters, expanded inside an `impl` block.
///
/// `into` setters accept `impl Into<T>` and `set` setters take `T` as-is.
/// For `Option` fields, `option` setters store `Some(value.into())` and
/// `some` setters store `Some(value)`, which lets integer literals infer.
#[macro_export]
macro_rules! setters {
    (
        $(into { $( $a:ident : $a_ty:ty ),* $(,)? })?
        $(set { $( $b:ident : $b_ty:ty ),* $(,)? })?
        $(option { $( $c:ident : $c_ty:ty ),* $(,)? })?
        $(some { $( $d:ident : $d_ty:ty ),* $(,)? })?
    ) => {
        $($(
            pub fn $a(self, value: impl Into<$a_ty>) -> Self {
                Self { $a: value.into(), ..self }
            }
        )*)?
        $($(
            pub fn $b(self, value: $b_ty) -> Self {
                Self { $b: value, ..self }
            }
        )*)?
        $($(
            pub fn $c(self, value: impl Into<$c_ty>) -> Self {
                Self { $c: Some(value.into()), ..self }
            }
        )*)?
        $($(
            pub fn $d(self, value: $d_ty) -> Self {
                Self { $d: Some(value), ..self }
            }
        )*)?
    };
}
