//! Function composition for building callback pipelines out of unary steps.
//!
//! ```rust
//! use rxfield::{Pipe, compose};
//!
//! let trimmed_len = compose(|s: String| s.trim().to_string(), |s: String| s.len());
//! assert_eq!(trimmed_len("  abc ".to_string()), 3);
//!
//! let shout = (|s: String| s.to_uppercase()).pipe(|s: String| format!("{s}!"));
//! assert_eq!(shout("hey".to_string()), "HEY!");
//! ```

/// Returns a function that applies `f`, then `g` to its result.
pub fn compose<A, B, C, F, G>(f: F, g: G) -> impl Fn(A) -> C
where
    F: Fn(A) -> B,
    G: Fn(B) -> C,
{
    move |a| g(f(a))
}

/// Like [`compose`], but `g` is a terminal sink whose result is discarded.
pub fn sink<A, B, F, G>(f: F, g: G) -> impl Fn(A)
where
    F: Fn(A) -> B,
    G: Fn(B),
{
    move |a| g(f(a))
}

/// A pass-through step
pub fn identity<A>() -> impl Fn(A) -> A + Clone { |a| a }

/// Method syntax for [`compose`] and [`sink`], reading left to right
pub trait Pipe<A, B>: Fn(A) -> B + Sized {
    fn pipe<C, G>(self, g: G) -> impl Fn(A) -> C
    where G: Fn(B) -> C {
        compose(self, g)
    }

    fn pipe_into<G>(self, g: G) -> impl Fn(A)
    where G: Fn(B) {
        sink(self, g)
    }
}

impl<A, B, F> Pipe<A, B> for F where F: Fn(A) -> B {}
