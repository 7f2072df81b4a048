//! # eink-core
//!
//! Shared library for the e-ink content server: palette reduction, lossless
//! image encoding, and the binary Request/Response protocol spoken by the
//! device firmware.
//!
//! This crate performs no I/O.  Every function takes bytes or images in and
//! hands bytes or images back, so it can be used from a server, a test
//! harness, or a preview tool alike.
//!
//! # Architecture overview (for beginners)
//!
//! An e-ink device wakes up, sends a tiny Request, and receives a Response
//! containing one image and a schedule telling it when to ask again.  Between
//! requests it sleeps, which is how it runs for months on one battery.
//!
//! This crate is the shared foundation.  It defines:
//!
//! - **`graphics`** – How arbitrary images become something the panel can
//!   show.  A [`Palette`] lists the exact colors a panel has; [`round`] and
//!   [`dither`] reduce an image to those colors; [`encode`] packs the result
//!   into the smallest lossless PNG.
//!
//! - **`protocol`** – How bytes travel between server and device.  A fixed
//!   12-byte magic header guards every message; integers are 4-byte
//!   little-endian; status images are referenced by a 32-byte [`ContentId`]
//!   (the SHA-256 of their name).

pub mod graphics;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `eink_core::Palette` instead of `eink_core::graphics::palette::Palette`.
pub use graphics::{
    decode, dither, encode, render_jpeg, round, EncodedImage, EncodingKind, ImageError, Palette,
    PaletteError,
};
pub use protocol::{content_id, ContentId, ProtocolError, Request, Response};
